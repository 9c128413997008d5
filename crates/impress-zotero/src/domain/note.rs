//! Note child items

use serde::{Deserialize, Serialize};

use super::LibraryId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub key: String,
    pub library_id: LibraryId,
    pub group_id: Option<i64>,
    /// Parent regular item or attachment; standalone notes have none
    pub parent_item: Option<String>,
    /// Raw HTML body
    pub note: String,
    pub title: Option<String>,
}
