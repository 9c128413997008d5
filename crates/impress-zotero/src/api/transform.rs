//! Pure mappings from raw API records to mirror entities
//!
//! None of these fail: malformed or missing pieces degrade to defaults so
//! one bad record never blocks the batch it arrived in.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDateTime, Utc};

use super::types::{
    ApiAnnotationItem, ApiAttachmentItem, ApiCollection, ApiCreator, ApiNoteItem, ApiRegularItem,
    ApiTag, CollectionData,
};
use crate::domain::{
    Annotation, AnnotationType, Attachment, Collection, Creator, CreatorFieldMode, LibraryId,
    LinkMode, Note, RegularItem, SortIndex, Tag,
};

const DEFAULT_SORT_INDEX: &str = "00000|000000|00000";

/// Auxiliary state needed to map regular items
pub struct TransformContext<'a> {
    /// Library the items are being loaded into
    pub library_id: LibraryId,
    /// Collection key → resolved collection
    pub collections: &'a HashMap<String, Collection>,
}

pub fn creator_from_api(creator: &ApiCreator, order_index: usize) -> Creator {
    match &creator.name {
        Some(name) => Creator {
            first_name: None,
            last_name: Some(name.clone()),
            field_mode: CreatorFieldMode::NameOnly,
            creator_type: creator.creator_type.clone(),
            order_index,
        },
        None => Creator {
            first_name: creator.first_name.clone(),
            last_name: creator.last_name.clone(),
            field_mode: CreatorFieldMode::FullName,
            creator_type: creator.creator_type.clone(),
            order_index,
        },
    }
}

pub fn tags_from_api(tags: &[ApiTag]) -> Vec<Tag> {
    tags.iter()
        .map(|t| Tag {
            name: t.tag.clone(),
            tag_type: t.tag_type,
        })
        .collect()
}

/// Parse RFC 3339 or SQL-style `YYYY-MM-DD HH:MM:SS` (UTC) timestamps
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn regular_item_from_api(api: ApiRegularItem, ctx: &TransformContext<'_>) -> RegularItem {
    let group_id = api.library.group_id();
    let data = api.data;

    let creators = data
        .creators
        .iter()
        .enumerate()
        .map(|(i, c)| creator_from_api(c, i))
        .collect();

    let collections = data
        .collections
        .iter()
        .filter_map(|key| ctx.collections.get(key).cloned())
        .collect();

    let date_added = data.date_added.as_deref().and_then(parse_timestamp);
    let date_accessed = data
        .access_date
        .as_deref()
        .and_then(parse_timestamp)
        .or(date_added);

    RegularItem {
        key: data.key,
        library_id: ctx.library_id,
        group_id,
        item_type: data.item_type,
        creators,
        citekey: data.citation_key.filter(|ck| !ck.is_empty()),
        collections,
        tags: tags_from_api(&data.tags),
        date_added,
        date_accessed,
        fields: data.extra.into_iter().collect(),
    }
}

/// Resolve every collection's root-to-leaf path
pub fn collections_from_api(
    records: &[ApiCollection],
    library_id: LibraryId,
) -> HashMap<String, Collection> {
    let by_key: HashMap<&str, &CollectionData> = records
        .iter()
        .map(|c| (c.data.key.as_str(), &c.data))
        .collect();

    records
        .iter()
        .map(|c| {
            let collection = Collection {
                key: c.data.key.clone(),
                name: c.data.name.clone(),
                path: collection_path(&c.data.key, &by_key),
                library_id,
            };
            (c.data.key.clone(), collection)
        })
        .collect()
}

/// Walk `parentCollection` links up to the root
///
/// A key that is not in the map yields `[key]`. A parent chain that loops
/// stops at the first repeated collection.
pub fn collection_path(key: &str, by_key: &HashMap<&str, &CollectionData>) -> Vec<String> {
    let Some(start) = by_key.get(key) else {
        return vec![key.to_string()];
    };

    let mut path = vec![start.name.clone()];
    let mut seen: HashSet<&str> = HashSet::from([key]);
    let mut parent = start.parent_collection.as_deref();

    while let Some(parent_key) = parent {
        if !seen.insert(parent_key) {
            break;
        }
        match by_key.get(parent_key) {
            Some(col) => {
                path.push(col.name.clone());
                parent = col.parent_collection.as_deref();
            }
            None => {
                path.push(parent_key.to_string());
                break;
            }
        }
    }

    path.reverse();
    path
}

pub fn attachment_from_api(api: ApiAttachmentItem) -> Attachment {
    let annot_count = api.meta.num_children.unwrap_or(0);
    let data = api.data;
    Attachment {
        key: data.key,
        parent_item: data.parent_item,
        title: data.title,
        path: data.path.or(data.filename),
        content_type: data.content_type,
        link_mode: LinkMode::from_api(&data.link_mode),
        annot_count,
    }
}

/// Map an annotation record and return its tags alongside it
pub fn annotation_from_api(api: ApiAnnotationItem) -> (Annotation, Vec<Tag>) {
    let group_id = api.library.group_id();
    let library_id = api.library.id;
    let data = api.data;

    let sort_index = SortIndex::parse(
        data.annotation_sort_index
            .as_deref()
            .unwrap_or(DEFAULT_SORT_INDEX),
    );
    let position = parse_position(data.annotation_position.as_deref());
    let tags = tags_from_api(&data.tags);

    let annotation = Annotation {
        key: data.key,
        library_id,
        group_id,
        parent_item: data.parent_item,
        annotation_type: AnnotationType::from_api(&data.annotation_type),
        text: data.annotation_text,
        comment: data.annotation_comment,
        color: data.annotation_color,
        page_label: data.annotation_page_label,
        sort_index,
        position,
    };
    (annotation, tags)
}

/// Decode the JSON-in-a-string position payload; anything malformed becomes `{}`
pub fn parse_position(raw: Option<&str>) -> serde_json::Value {
    let empty = || serde_json::Value::Object(serde_json::Map::new());
    match raw {
        Some(raw) => match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value @ serde_json::Value::Object(_)) => value,
            Ok(_) | Err(_) => {
                tracing::debug!("Discarding malformed annotation position: {}", raw);
                empty()
            }
        },
        None => empty(),
    }
}

pub fn note_from_api(api: ApiNoteItem) -> Note {
    let group_id = api.library.group_id();
    let library_id = api.library.id;
    let data = api.data;
    Note {
        key: data.key,
        library_id,
        group_id,
        parent_item: data.parent_item.filter(|p| !p.is_empty()),
        note: data.note,
        title: data.title,
    }
}
