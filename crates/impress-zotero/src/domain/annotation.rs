//! Annotation child items

use serde::{Deserialize, Serialize};

use super::LibraryId;

/// Annotation kind, numbered as in the reference manager's database
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationType {
    Highlight = 1,
    Note = 2,
    Image = 3,
    Underline = 4,
    Ink = 5,
}

impl AnnotationType {
    /// Map the API's string type; anything unrecognized is treated as a highlight
    pub fn from_api(value: &str) -> Self {
        match value {
            "highlight" => AnnotationType::Highlight,
            "note" => AnnotationType::Note,
            "image" => AnnotationType::Image,
            "underline" => AnnotationType::Underline,
            "ink" => AnnotationType::Ink,
            _ => AnnotationType::Highlight,
        }
    }

    pub fn as_number(self) -> u8 {
        self as u8
    }
}

/// In-document ordering key: `page|offset|top`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SortIndex(pub [u32; 3]);

impl SortIndex {
    /// Parse `"00001|000123|00045"`; unparseable or missing parts become 0
    pub fn parse(raw: &str) -> Self {
        let mut parts = [0u32; 3];
        for (slot, segment) in parts.iter_mut().zip(raw.split('|')) {
            *slot = segment.trim().parse().unwrap_or(0);
        }
        SortIndex(parts)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub key: String,
    pub library_id: LibraryId,
    pub group_id: Option<i64>,
    /// Key of the attachment the annotation belongs to
    pub parent_item: String,
    pub annotation_type: AnnotationType,
    pub text: Option<String>,
    pub comment: Option<String>,
    pub color: Option<String>,
    pub page_label: Option<String>,
    pub sort_index: SortIndex,
    /// Reader-specific position payload; an empty object when the source was malformed
    pub position: serde_json::Value,
}
