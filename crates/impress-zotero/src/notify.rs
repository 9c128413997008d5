//! Change notifications pushed by the reference manager
//!
//! Wire format, one JSON object per notification:
//!
//! ```json
//! {"event": "regular-item/update",
//!  "add": [[12, 1, "ABCD1234"]], "modify": [], "trash": [[7, 1, "WXYZ9876"]]}
//! ```
//!
//! Each triple is `(item id, library id, item key)`.

use serde::{Deserialize, Serialize};

use crate::debounce::{Coalesce, KeyedQueue};
use crate::domain::{KeyLibId, LibraryId};

/// `(item id, library id, item key)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef(pub i64, pub LibraryId, pub String);

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegularItemUpdate {
    #[serde(default)]
    pub add: Vec<ItemRef>,
    #[serde(default)]
    pub modify: Vec<ItemRef>,
    #[serde(default)]
    pub trash: Vec<ItemRef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ItemNotification {
    #[serde(rename = "regular-item/update")]
    RegularItemUpdate(RegularItemUpdate),
    /// Reader and selection events carry nothing the mirror uses
    #[serde(other)]
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Modify,
    Trash,
}

/// One item-level change, the unit the update debouncer collapses on
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemChange {
    pub id: i64,
    pub library_id: LibraryId,
    pub key: String,
    pub kind: ChangeKind,
}

impl RegularItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.modify.is_empty() && self.trash.is_empty()
    }

    pub fn changes(self) -> Vec<ItemChange> {
        let tagged = |refs: Vec<ItemRef>, kind: ChangeKind| {
            refs.into_iter()
                .map(move |ItemRef(id, library_id, key)| ItemChange {
                    id,
                    library_id,
                    key,
                    kind,
                })
        };
        tagged(self.add, ChangeKind::Add)
            .chain(tagged(self.modify, ChangeKind::Modify))
            .chain(tagged(self.trash, ChangeKind::Trash))
            .collect()
    }
}

impl ItemNotification {
    /// Item changes carried by the notification; empty for other events
    pub fn into_changes(self) -> Vec<ItemChange> {
        match self {
            ItemNotification::RegularItemUpdate(update) => update.changes(),
            ItemNotification::Other => Vec::new(),
        }
    }
}

/// A flushed batch, partitioned by change kind
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemChanges {
    pub add: Vec<KeyLibId>,
    pub modify: Vec<KeyLibId>,
    pub trash: Vec<KeyLibId>,
}

impl ItemChanges {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.modify.is_empty() && self.trash.is_empty()
    }

    pub fn len(&self) -> usize {
        self.add.len() + self.modify.len() + self.trash.len()
    }
}

/// Debounce queue for item changes: the last change per item id wins
#[derive(Debug, Default)]
pub struct ChangeQueue {
    entries: KeyedQueue<i64, (LibraryId, String, ChangeKind)>,
}

impl ChangeQueue {
    pub fn into_changes(self) -> ItemChanges {
        let mut changes = ItemChanges::default();
        for (_id, (library_id, key, kind)) in self.entries.into_entries() {
            let target = match kind {
                ChangeKind::Add => &mut changes.add,
                ChangeKind::Modify => &mut changes.modify,
                ChangeKind::Trash => &mut changes.trash,
            };
            target.push((key, library_id));
        }
        changes
    }
}

impl Coalesce for ChangeQueue {
    type Event = ItemChange;

    fn push(&mut self, change: ItemChange) {
        self.entries
            .insert(change.id, (change.library_id, change.key, change.kind));
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
