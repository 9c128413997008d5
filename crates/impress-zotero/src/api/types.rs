//! Zotero local HTTP API response types
//!
//! Fields the mirror does not strictly need default when missing, so a
//! sparse record still decodes. A record that cannot decode at all is
//! skipped by the client rather than failing its whole page.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiLibraryKind {
    User,
    Group,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiLibrary {
    #[serde(rename = "type")]
    pub kind: ApiLibraryKind,
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

impl ApiLibrary {
    /// Group id, for group libraries only
    pub fn group_id(&self) -> Option<i64> {
        match self.kind {
            ApiLibraryKind::Group => Some(self.id),
            ApiLibraryKind::User => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiItemMeta {
    pub num_children: Option<u32>,
    pub creator_summary: Option<String>,
    pub parsed_date: Option<String>,
}

/// Envelope shared by every item record
#[derive(Debug, Clone, Deserialize)]
pub struct ApiItem<T> {
    pub key: String,
    #[serde(default)]
    pub version: i64,
    pub library: ApiLibrary,
    #[serde(default)]
    pub meta: ApiItemMeta,
    pub data: T,
}

/// An item of not-yet-known type, as returned by single-item fetches
pub type RawItem = ApiItem<serde_json::Value>;

impl RawItem {
    pub fn item_type(&self) -> &str {
        self.data
            .get("itemType")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }

    /// Decode the `data` payload into a concrete record shape
    pub fn decode<T: DeserializeOwned>(self) -> Result<ApiItem<T>, serde_json::Error> {
        let (envelope, data) = self.split();
        Ok(envelope.with_data(serde_json::from_value(data)?))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCreator {
    #[serde(default)]
    pub creator_type: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Single-field name
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTag {
    pub tag: String,
    #[serde(rename = "type", default)]
    pub tag_type: i32,
}

/// Data fields for a regular item
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegularItemData {
    pub key: String,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub item_type: String,
    #[serde(default)]
    pub creators: Vec<ApiCreator>,
    pub citation_key: Option<String>,
    #[serde(default)]
    pub collections: Vec<String>,
    #[serde(default)]
    pub tags: Vec<ApiTag>,
    pub date_added: Option<String>,
    pub date_modified: Option<String>,
    pub access_date: Option<String>,
    /// Every other metadata field (title, date, publicationTitle, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Data fields for an annotation item
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationData {
    pub key: String,
    #[serde(default)]
    pub parent_item: String,
    #[serde(default)]
    pub annotation_type: String,
    pub annotation_text: Option<String>,
    pub annotation_comment: Option<String>,
    pub annotation_color: Option<String>,
    pub annotation_page_label: Option<String>,
    pub annotation_sort_index: Option<String>,
    /// JSON encoded as a string
    pub annotation_position: Option<String>,
    #[serde(default)]
    pub tags: Vec<ApiTag>,
}

/// Data fields for a note item
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteData {
    pub key: String,
    pub parent_item: Option<String>,
    #[serde(default)]
    pub note: String,
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<ApiTag>,
}

/// Data fields for an attachment item
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentData {
    pub key: String,
    pub parent_item: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub link_mode: String,
    pub content_type: Option<String>,
    pub path: Option<String>,
    pub url: Option<String>,
    pub filename: Option<String>,
    #[serde(default)]
    pub tags: Vec<ApiTag>,
}

/// A child item, discriminated by `itemType`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "itemType", rename_all = "lowercase")]
pub enum ChildData {
    Annotation(AnnotationData),
    Note(NoteData),
    Attachment(AttachmentData),
}

pub type ApiRegularItem = ApiItem<RegularItemData>;
pub type ApiChildItem = ApiItem<ChildData>;
pub type ApiAnnotationItem = ApiItem<AnnotationData>;
pub type ApiNoteItem = ApiItem<NoteData>;
pub type ApiAttachmentItem = ApiItem<AttachmentData>;

impl ApiChildItem {
    pub fn into_annotation(self) -> Option<ApiAnnotationItem> {
        let (envelope, data) = self.split();
        match data {
            ChildData::Annotation(data) => Some(envelope.with_data(data)),
            _ => None,
        }
    }

    pub fn into_note(self) -> Option<ApiNoteItem> {
        let (envelope, data) = self.split();
        match data {
            ChildData::Note(data) => Some(envelope.with_data(data)),
            _ => None,
        }
    }

    pub fn into_attachment(self) -> Option<ApiAttachmentItem> {
        let (envelope, data) = self.split();
        match data {
            ChildData::Attachment(data) => Some(envelope.with_data(data)),
            _ => None,
        }
    }
}

impl<T> ApiItem<T> {
    /// Separate the envelope from its payload
    pub fn split(self) -> (ApiItem<()>, T) {
        let envelope = ApiItem {
            key: self.key,
            version: self.version,
            library: self.library,
            meta: self.meta,
            data: (),
        };
        (envelope, self.data)
    }
}

impl ApiItem<()> {
    pub fn with_data<T>(self, data: T) -> ApiItem<T> {
        ApiItem {
            key: self.key,
            version: self.version,
            library: self.library,
            meta: self.meta,
            data,
        }
    }
}

/// Accepts a collection key or `false` (top-level collection)
fn deserialize_parent_collection<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(key)) if !key.is_empty() => Some(key),
        _ => None,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionData {
    pub key: String,
    #[serde(default)]
    pub version: i64,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_parent_collection")]
    pub parent_collection: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCollection {
    pub key: String,
    #[serde(default)]
    pub version: i64,
    pub library: ApiLibrary,
    pub data: CollectionData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn library() -> serde_json::Value {
        json!({"type": "user", "id": 0, "name": "My Library"})
    }

    #[test]
    fn test_regular_item_extra_fields() {
        let raw = json!({
            "key": "ABCD1234",
            "version": 12,
            "library": library(),
            "meta": {"numChildren": 2},
            "data": {
                "key": "ABCD1234",
                "version": 12,
                "itemType": "journalArticle",
                "title": "Deep Learning",
                "creators": [{"creatorType": "author", "firstName": "Yann", "lastName": "LeCun"}],
                "citationKey": "lecun2015deep",
                "publicationTitle": "Nature",
                "collections": ["COLL0001"],
                "tags": [{"tag": "ml"}, {"tag": "auto", "type": 1}]
            }
        });
        let item: ApiRegularItem = serde_json::from_value(raw).unwrap();
        assert_eq!(item.data.citation_key.as_deref(), Some("lecun2015deep"));
        assert_eq!(item.data.tags[1].tag_type, 1);
        assert_eq!(item.data.extra["title"], "Deep Learning");
        assert_eq!(item.data.extra["publicationTitle"], "Nature");
        assert!(!item.data.extra.contains_key("citationKey"));
        assert_eq!(item.meta.num_children, Some(2));
    }

    #[test]
    fn test_parent_collection_false_or_key() {
        let top: CollectionData =
            serde_json::from_value(json!({"key": "A", "name": "Top", "parentCollection": false}))
                .unwrap();
        assert_eq!(top.parent_collection, None);

        let child: CollectionData =
            serde_json::from_value(json!({"key": "B", "name": "Child", "parentCollection": "A"}))
                .unwrap();
        assert_eq!(child.parent_collection.as_deref(), Some("A"));

        let missing: CollectionData =
            serde_json::from_value(json!({"key": "C", "name": "Loose"})).unwrap();
        assert_eq!(missing.parent_collection, None);
    }

    #[test]
    fn test_child_data_dispatch() {
        let raw = json!({
            "key": "NOTE0001",
            "library": library(),
            "data": {"key": "NOTE0001", "itemType": "note", "parentItem": "ABCD1234", "note": "<p>hi</p>"}
        });
        let child: ApiChildItem = serde_json::from_value(raw).unwrap();
        assert!(child.clone().into_annotation().is_none());
        let note = child.into_note().unwrap();
        assert_eq!(note.data.note, "<p>hi</p>");
    }

    #[test]
    fn test_raw_item_type_and_decode() {
        let raw: RawItem = serde_json::from_value(json!({
            "key": "ATT00001",
            "library": {"type": "group", "id": 7},
            "data": {"key": "ATT00001", "itemType": "attachment", "linkMode": "imported_file"}
        }))
        .unwrap();
        assert_eq!(raw.item_type(), "attachment");
        assert_eq!(raw.library.group_id(), Some(7));
        let att: ApiAttachmentItem = raw.decode().unwrap();
        assert_eq!(att.data.link_mode, "imported_file");
    }
}
