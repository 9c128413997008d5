//! Attachment child items

use serde::{Deserialize, Serialize};

/// Content types the reader can annotate
pub const ANNOTATABLE_CONTENT_TYPES: &[&str] =
    &["application/pdf", "text/html", "application/epub+zip"];

/// How the attachment's file is stored
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkMode {
    ImportedFile,
    ImportedUrl,
    LinkedFile,
    LinkedUrl,
}

impl LinkMode {
    pub fn from_api(value: &str) -> Option<Self> {
        match value {
            "imported_file" => Some(LinkMode::ImportedFile),
            "imported_url" => Some(LinkMode::ImportedUrl),
            "linked_file" => Some(LinkMode::LinkedFile),
            "linked_url" => Some(LinkMode::LinkedUrl),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub key: String,
    pub parent_item: Option<String>,
    pub title: Option<String>,
    pub path: Option<String>,
    pub content_type: Option<String>,
    pub link_mode: Option<LinkMode>,
    /// Number of annotations on the attachment
    pub annot_count: u32,
}

impl Attachment {
    /// Only attachments with a file and an annotatable content type carry annotations
    pub fn is_annotatable(&self) -> bool {
        let has_path = self.path.as_deref().is_some_and(|p| !p.is_empty());
        let annotatable_type = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ANNOTATABLE_CONTENT_TYPES.contains(&ct));
        has_path && annotatable_type
    }
}
