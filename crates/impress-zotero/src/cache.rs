//! In-memory mirror state
//!
//! One [`LibrarySnapshot`] per loaded library (key → item, citekey → key),
//! the resolved collection map, the annotation tag cache and the list of
//! known libraries. Locks are never held across an `.await`: every method
//! takes the lock, copies out or swaps in, and returns.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::{Collection, LibraryId, Library, RegularItem, Tag};

/// Items and citekeys of one library
#[derive(Debug, Clone, Default)]
pub struct LibrarySnapshot {
    items: HashMap<String, Arc<RegularItem>>,
    citekeys: HashMap<String, String>,
}

impl LibrarySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Arc<RegularItem>> {
        self.items.get(key)
    }

    pub fn items(&self) -> impl Iterator<Item = &Arc<RegularItem>> {
        self.items.values()
    }

    pub fn key_for_citekey(&self, citekey: &str) -> Option<&str> {
        self.citekeys.get(citekey).map(String::as_str)
    }

    /// Insert or replace an item.
    ///
    /// The newest writer of a citekey owns it. A citekey the replaced
    /// version carried is released if it still points at this item.
    pub fn insert(&mut self, item: Arc<RegularItem>) {
        if let Some(previous) = self.items.get(&item.key) {
            if previous.citekey != item.citekey {
                if let Some(old) = previous.citekey.clone() {
                    self.release_citekey(&old, &item.key);
                }
            }
        }
        if let Some(citekey) = &item.citekey {
            self.citekeys.insert(citekey.clone(), item.key.clone());
        }
        self.items.insert(item.key.clone(), item);
    }

    pub fn remove(&mut self, key: &str) -> Option<Arc<RegularItem>> {
        let removed = self.items.remove(key)?;
        if let Some(citekey) = &removed.citekey {
            self.release_citekey(citekey, key);
        }
        Some(removed)
    }

    fn release_citekey(&mut self, citekey: &str, key: &str) {
        if self.citekeys.get(citekey).is_some_and(|owner| owner == key) {
            self.citekeys.remove(citekey);
        }
    }

    /// Most recently accessed first; undated items last. `limit == 0` means all.
    pub fn recent(&self, limit: usize) -> Vec<Arc<RegularItem>> {
        let mut items: Vec<Arc<RegularItem>> = self.items.values().cloned().collect();
        items.sort_by(|a, b| match (a.date_accessed, b.date_accessed) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        if limit > 0 {
            items.truncate(limit);
        }
        items
    }
}

impl FromIterator<RegularItem> for LibrarySnapshot {
    fn from_iter<I: IntoIterator<Item = RegularItem>>(iter: I) -> Self {
        let mut snapshot = LibrarySnapshot::new();
        for item in iter {
            snapshot.insert(Arc::new(item));
        }
        snapshot
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Shared mirror state, safe to read from any task
#[derive(Debug, Default)]
pub struct MirrorCache {
    libraries: RwLock<HashMap<LibraryId, LibrarySnapshot>>,
    collections: RwLock<Arc<HashMap<String, Collection>>>,
    annotation_tags: RwLock<HashMap<String, Vec<Tag>>>,
    known_libraries: RwLock<Vec<Library>>,
}

impl MirrorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a library's snapshot wholesale
    pub fn install_snapshot(&self, library_id: LibraryId, snapshot: LibrarySnapshot) {
        write(&self.libraries).insert(library_id, snapshot);
    }

    pub fn has_snapshot(&self, library_id: LibraryId) -> bool {
        read(&self.libraries).contains_key(&library_id)
    }

    pub fn item_count(&self, library_id: LibraryId) -> usize {
        read(&self.libraries)
            .get(&library_id)
            .map_or(0, LibrarySnapshot::len)
    }

    /// All items of a library, or `None` if it was never loaded
    pub fn items(&self, library_id: LibraryId) -> Option<Vec<Arc<RegularItem>>> {
        read(&self.libraries)
            .get(&library_id)
            .map(|snapshot| snapshot.items().cloned().collect())
    }

    pub fn get_item(&self, library_id: LibraryId, key: &str) -> Option<Arc<RegularItem>> {
        read(&self.libraries)
            .get(&library_id)
            .and_then(|snapshot| snapshot.get(key).cloned())
    }

    /// Store an item in its library's snapshot, if that library is loaded.
    ///
    /// Returns whether the item was stored.
    pub fn upsert_item(&self, item: Arc<RegularItem>) -> bool {
        match write(&self.libraries).get_mut(&item.library_id) {
            Some(snapshot) => {
                snapshot.insert(item);
                true
            }
            None => false,
        }
    }

    pub fn remove_item(&self, library_id: LibraryId, key: &str) -> Option<Arc<RegularItem>> {
        write(&self.libraries)
            .get_mut(&library_id)
            .and_then(|snapshot| snapshot.remove(key))
    }

    pub fn key_for_citekey(&self, library_id: LibraryId, citekey: &str) -> Option<String> {
        read(&self.libraries)
            .get(&library_id)
            .and_then(|snapshot| snapshot.key_for_citekey(citekey).map(str::to_string))
    }

    pub fn recent(&self, library_id: LibraryId, limit: usize) -> Vec<Arc<RegularItem>> {
        read(&self.libraries)
            .get(&library_id)
            .map(|snapshot| snapshot.recent(limit))
            .unwrap_or_default()
    }

    pub fn set_collections(&self, collections: HashMap<String, Collection>) {
        *write(&self.collections) = Arc::new(collections);
    }

    pub fn collections(&self) -> Arc<HashMap<String, Collection>> {
        Arc::clone(&read(&self.collections))
    }

    pub fn set_annotation_tags(&self, annotation_key: &str, tags: Vec<Tag>) {
        write(&self.annotation_tags).insert(annotation_key.to_string(), tags);
    }

    /// Tags for a key: annotation tag cache first, then the item snapshot, else empty
    pub fn tags_for(&self, library_id: LibraryId, key: &str) -> Vec<Tag> {
        if let Some(tags) = read(&self.annotation_tags).get(key) {
            return tags.clone();
        }
        self.get_item(library_id, key)
            .map(|item| item.tags.clone())
            .unwrap_or_default()
    }

    /// Record a loaded library; a library already known is replaced
    pub fn register_library(&self, library: Library) {
        let mut libraries = write(&self.known_libraries);
        match libraries
            .iter()
            .position(|l| l.library_id == library.library_id)
        {
            Some(i) => libraries[i] = library,
            None => libraries.push(library),
        }
    }

    pub fn libraries(&self) -> Vec<Library> {
        read(&self.known_libraries).clone()
    }

    /// Drop everything
    pub fn clear(&self) {
        write(&self.libraries).clear();
        *write(&self.collections) = Arc::new(HashMap::new());
        write(&self.annotation_tags).clear();
        write(&self.known_libraries).clear();
    }
}
