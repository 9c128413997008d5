//! Collections and libraries

use serde::{Deserialize, Serialize};

use super::LibraryId;

/// A collection (folder) in a library
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub key: String,
    pub name: String,
    /// Names from the root collection down to this one
    pub path: Vec<String>,
    pub library_id: LibraryId,
}

impl Collection {
    /// Path joined for display, e.g. "Thesis / Chapter 2"
    pub fn display_path(&self) -> String {
        self.path.join(" / ")
    }
}

/// A library known to the mirror
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub library_id: LibraryId,
    pub group_id: Option<i64>,
    pub name: String,
}

impl Library {
    /// The user's personal library
    pub fn personal(library_id: LibraryId) -> Self {
        Self {
            library_id,
            group_id: None,
            name: "My Library".to_string(),
        }
    }
}
