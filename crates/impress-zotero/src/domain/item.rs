//! Regular (bibliographic) item

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Collection, Creator, LibraryId, Tag};

/// Item types that are children of a regular item, never regular items themselves
const CHILD_ITEM_TYPES: &[&str] = &["attachment", "annotation", "note"];

/// Whether `item_type` names a regular (bibliographic) item
pub fn is_regular_item_type(item_type: &str) -> bool {
    !CHILD_ITEM_TYPES.contains(&item_type)
}

/// A bibliographic record
///
/// `(key, library_id)` is the identity. Bibliographic metadata that has no
/// dedicated field (title, date, publicationTitle, ...) lives in `fields`
/// under its remote name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegularItem {
    pub key: String,
    pub library_id: LibraryId,
    pub group_id: Option<i64>,
    pub item_type: String,
    pub creators: Vec<Creator>,
    pub citekey: Option<String>,
    pub collections: Vec<Collection>,
    pub tags: Vec<Tag>,
    pub date_added: Option<DateTime<Utc>>,
    /// Access date if recorded, otherwise the date the item was added
    pub date_accessed: Option<DateTime<Utc>>,
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl RegularItem {
    pub fn new(key: impl Into<String>, library_id: LibraryId, item_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            library_id,
            group_id: None,
            item_type: item_type.into(),
            creators: Vec::new(),
            citekey: None,
            collections: Vec::new(),
            tags: Vec::new(),
            date_added: None,
            date_accessed: None,
            fields: BTreeMap::new(),
        }
    }

    /// Builder method to set a metadata field
    pub fn with_field(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Builder method to set the citekey
    pub fn with_citekey(mut self, citekey: impl Into<String>) -> Self {
        self.citekey = Some(citekey.into());
        self
    }

    /// Text of a metadata field; numbers and booleans are rendered, empty strings are `None`
    pub fn field_text(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn title(&self) -> Option<String> {
        self.field_text("title")
    }
}
