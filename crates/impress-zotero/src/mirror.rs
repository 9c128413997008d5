//! The mirror service
//!
//! [`Mirror`] ties the API client, the cache and the search index together
//! behind the refresh state machine. Full reloads and index rebuilds only
//! run as refresh tasks; incremental updates and refresh tasks take the
//! same write gate, so their network phases never overlap.
//!
//! ```no_run
//! # async fn demo() -> impress_zotero::Result<()> {
//! use impress_zotero::{Mirror, MirrorConfig};
//!
//! let mirror = Mirror::new(MirrorConfig::default())?;
//! mirror.initialize().await?;
//! for hit in mirror.search(1, "electrodynamics", 10)? {
//!     println!("{} {:.1}", hit.item.key, hit.score);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use futures::future::{self, BoxFuture, FutureExt, Shared};
use tokio::sync::broadcast;
use tokio::task::AbortHandle;

use crate::api::transform::{
    annotation_from_api, attachment_from_api, collections_from_api, note_from_api,
    regular_item_from_api,
};
use crate::api::types::{
    AnnotationData, ApiChildItem, ApiRegularItem, NoteData, RawItem,
};
use crate::api::{TransformContext, ZoteroApiClient};
use crate::cache::{LibrarySnapshot, MirrorCache};
use crate::config::MirrorConfig;
use crate::debounce::Debouncer;
use crate::domain::{
    is_regular_item_type, Annotation, Attachment, KeyLibId, Library, LibraryId, Note,
    RegularItem, Tag,
};
use crate::error::{MirrorError, Result};
use crate::events::{EventBus, MirrorEvent};
use crate::http::HttpError;
use crate::notify::{ChangeQueue, ItemChanges, ItemNotification};
use crate::refresh::{Admission, MirrorStatus, RefreshState, RefreshTask};
use crate::search::{rank, SearchHit, SearchIndex, SearchIndexError};

/// Result count used when the caller has no preference
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

type SharedRefresh = Shared<BoxFuture<'static, Result<()>>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Job {
    Initialize,
    Refresh(RefreshTask),
}

#[derive(Default)]
struct RefreshSlot {
    state: RefreshState,
    running: Option<SharedRefresh>,
    abort: Option<AbortHandle>,
    /// Bumped by every start and by shutdown; a run only touches the slot
    /// while its generation is current
    generation: u64,
}

struct Inner {
    config: MirrorConfig,
    client: ZoteroApiClient,
    cache: MirrorCache,
    index: RwLock<Option<Arc<SearchIndex>>>,
    target_library: AtomicI64,
    refresh: Mutex<RefreshSlot>,
    write_gate: tokio::sync::Mutex<()>,
    events: EventBus,
    updates: Debouncer<ChangeQueue>,
}

/// Local mirror of one Zotero installation
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct Mirror {
    inner: Arc<Inner>,
}

impl Mirror {
    /// Build an uninitialized mirror.
    ///
    /// Must be called within a tokio runtime: the update debouncer is
    /// spawned here.
    pub fn new(config: MirrorConfig) -> Result<Self> {
        let client = ZoteroApiClient::new(&config)?;
        let window = config.debounce();

        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let weak = weak.clone();
            let updates = Debouncer::spawn(window, move |queue: ChangeQueue| {
                let weak = weak.clone();
                async move {
                    match weak.upgrade() {
                        Some(inner) => Mirror { inner }.apply_changes(queue.into_changes()).await,
                        None => Ok(()),
                    }
                }
            });

            Inner {
                target_library: AtomicI64::new(config.library_id),
                config,
                client,
                cache: MirrorCache::new(),
                index: RwLock::new(None),
                refresh: Mutex::new(RefreshSlot::default()),
                write_gate: tokio::sync::Mutex::new(()),
                events: EventBus::new(),
                updates,
            }
        });

        Ok(Self { inner })
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &ZoteroApiClient {
        &self.inner.client
    }

    pub fn status(&self) -> MirrorStatus {
        self.inner.slot().state.status()
    }

    /// Library that refreshes load and index
    pub fn target_library(&self) -> LibraryId {
        self.inner.target_library()
    }

    /// Library the search index currently belongs to
    pub fn indexed_library(&self) -> Option<LibraryId> {
        self.inner.current_index().map(|index| index.library_id())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MirrorEvent> {
        self.inner.events.subscribe()
    }

    // ===== Lifecycle =====

    /// Connect, load the target library and build its index.
    ///
    /// Only legal once, from `NotInitialized`. An unreachable API leaves the
    /// mirror `NotInitialized`.
    pub async fn initialize(&self) -> Result<()> {
        let running = {
            let mut slot = self.inner.slot();
            slot.state.begin_initialize()?;
            tracing::info!("Initializing Zotero mirror at {}", self.inner.client.base_url());
            self.start(&mut slot, Job::Initialize)
        };
        running.await
    }

    /// Run a refresh task, or fold it into the one already running.
    ///
    /// Resolves once the running task and every follow-up queued behind it
    /// have finished. Every caller riding the same run sees its first error.
    pub async fn refresh(&self, task: RefreshTask) -> Result<()> {
        let running = {
            let mut slot = self.inner.slot();
            match slot.state.request(task)? {
                Admission::Start(task) => {
                    tracing::info!("Starting refresh ({})", task);
                    self.start(&mut slot, Job::Refresh(task))
                }
                Admission::Queued => {
                    tracing::debug!("Refresh ({}) queued behind running refresh", task);
                    slot.running.clone().ok_or_else(|| {
                        MirrorError::InvalidState("pending without a running refresh".into())
                    })?
                }
            }
        };
        running.await
    }

    fn start(&self, slot: &mut RefreshSlot, job: Job) -> SharedRefresh {
        slot.generation += 1;
        let handle = tokio::spawn(run_jobs(Arc::clone(&self.inner), job, slot.generation));
        let abort = handle.abort_handle();
        let shared = async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancelled() => Err(MirrorError::InvalidState(
                    "refresh cancelled by shutdown".into(),
                )),
                Err(e) => Err(MirrorError::InvalidState(format!("refresh task failed: {}", e))),
            }
        }
        .boxed()
        .shared();

        slot.running = Some(shared.clone());
        slot.abort = Some(abort);
        shared
    }

    /// Switch the target library and force an index rebuild for it
    pub async fn set_library(&self, library_id: LibraryId) -> Result<()> {
        self.inner.target_library.store(library_id, Ordering::SeqCst);
        self.refresh(RefreshTask::SearchIndex { force: true }).await
    }

    /// Full reload of one library, serialized with every other writer
    pub async fn load_all_items(&self, library_id: LibraryId) -> Result<()> {
        let _gate = self.inner.write_gate.lock().await;
        self.inner.load_library(library_id).await
    }

    /// Tear down: back to `NotInitialized` with an empty mirror.
    ///
    /// A running refresh is cancelled, the queued task dropped and pending
    /// debounced updates discarded without being applied.
    pub async fn shutdown(&self) {
        {
            let mut slot = self.inner.slot();
            slot.generation += 1;
            slot.state.reset();
            slot.running = None;
            if let Some(abort) = slot.abort.take() {
                abort.abort();
            }
        }
        self.inner.updates.clear();

        let _gate = self.inner.write_gate.lock().await;
        self.inner.cache.clear();
        *self.inner.index_mut() = None;
        tracing::info!("Zotero mirror shut down");
    }

    // ===== Incremental updates =====

    /// Re-fetch one item and replace it in the cache and index.
    ///
    /// An item that is gone, or is now a child item, is removed instead and
    /// `None` is returned.
    pub async fn update_item(&self, key: &str, library_id: LibraryId) -> Result<Option<Arc<RegularItem>>> {
        let _gate = self.inner.write_gate.lock().await;
        let item = self.inner.stage_update(key, library_id).await?;
        self.inner.commit_index().await?;
        Ok(item)
    }

    pub async fn remove_item(&self, key: &str, library_id: LibraryId) -> Result<()> {
        let _gate = self.inner.write_gate.lock().await;
        self.inner.stage_removal(key, library_id)?;
        self.inner.commit_index().await
    }

    /// Feed a change notification into the update debouncer
    pub fn handle_notification(&self, notification: ItemNotification) {
        for change in notification.into_changes() {
            self.inner.updates.request(change);
        }
    }

    /// Apply a batch of changes under one write gate and one index commit.
    ///
    /// Failures are logged per item and the first one is returned after the
    /// whole batch ran.
    pub async fn apply_changes(&self, changes: ItemChanges) -> Result<()> {
        if self.status() == MirrorStatus::NotInitialized {
            tracing::debug!("Ignoring {} item changes before initialization", changes.len());
            return Ok(());
        }

        let mut updated: Vec<KeyLibId> = Vec::new();
        let mut removed: Vec<KeyLibId> = Vec::new();
        let mut first_error: Option<MirrorError> = None;

        let _gate = self.inner.write_gate.lock().await;
        for (key, library_id) in changes.add.iter().chain(changes.modify.iter()) {
            match self.inner.stage_update(key, *library_id).await {
                Ok(Some(_)) => updated.push((key.clone(), *library_id)),
                Ok(None) => removed.push((key.clone(), *library_id)),
                Err(e) => {
                    tracing::warn!("Failed to update item {}: {}", key, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        for (key, library_id) in &changes.trash {
            match self.inner.stage_removal(key, *library_id) {
                Ok(()) => removed.push((key.clone(), *library_id)),
                Err(e) => {
                    tracing::warn!("Failed to remove item {}: {}", key, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Err(e) = self.inner.commit_index().await {
            tracing::error!("Failed to commit item changes to the search index: {}", e);
            first_error.get_or_insert(e);
        }

        tracing::debug!("Applied item changes: {} updated, {} removed", updated.len(), removed.len());
        self.inner
            .events
            .emit(MirrorEvent::ItemsUpdated { updated, removed });

        first_error.map_or(Ok(()), Err)
    }

    // ===== Consumer API =====

    /// Ranked search over the library's index
    pub fn search(&self, library_id: LibraryId, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let index = self
            .inner
            .index_for(library_id)
            .ok_or(MirrorError::NotIndexed { library_id })?;

        let matches = index.search(query, limit)?;
        let hits = rank(&matches)
            .into_iter()
            .filter_map(|ranked| match self.inner.cache.get_item(library_id, &ranked.key) {
                Some(item) => Some(SearchHit {
                    item,
                    score: ranked.score,
                    fields: ranked.fields.into_iter().collect(),
                }),
                None => {
                    tracing::warn!("Indexed item {} missing from cache", ranked.key);
                    None
                }
            })
            .collect();
        Ok(hits)
    }

    /// Items by `(key, library)`, from the cache unless `force_update`.
    ///
    /// Misses are fetched; a slot is `None` when the item does not exist.
    pub async fn get_items(
        &self,
        items: &[KeyLibId],
        force_update: bool,
    ) -> Result<Vec<Option<Arc<RegularItem>>>> {
        let mut results = Vec::with_capacity(items.len());
        for (key, library_id) in items {
            if !force_update {
                if let Some(item) = self.inner.cache.get_item(*library_id, key) {
                    results.push(Some(item));
                    continue;
                }
            }
            results.push(self.update_item(key, *library_id).await?);
        }
        Ok(results)
    }

    /// Cached items, most recently accessed first; `limit == 0` returns all
    pub fn get_items_from_cache(&self, limit: usize, library_id: LibraryId) -> Vec<Arc<RegularItem>> {
        self.inner.cache.recent(library_id, limit)
    }

    /// Cached items as unranked hits (score `-1`), most recently accessed first.
    ///
    /// Fails with `NoSnapshot` until the library has been loaded.
    pub fn get_items_of(&self, limit: usize, library_id: LibraryId) -> Result<Vec<SearchHit>> {
        if !self.inner.cache.has_snapshot(library_id) {
            return Err(MirrorError::NoSnapshot { library_id });
        }
        Ok(self
            .inner
            .cache
            .recent(library_id, limit)
            .into_iter()
            .map(SearchHit::unranked)
            .collect())
    }

    pub fn get_libs(&self) -> Vec<Library> {
        self.inner.cache.libraries()
    }

    /// Annotations on an attachment, fetched fresh; refreshes their tags
    pub async fn get_annotations(
        &self,
        attachment_key: &str,
        library_id: LibraryId,
    ) -> Result<Vec<Annotation>> {
        tracing::debug!("Fetching annotations of {} (library {})", attachment_key, library_id);
        let children = self
            .inner
            .client
            .get_children(attachment_key, Some("annotation"))
            .await?;

        Ok(children
            .into_iter()
            .filter_map(ApiChildItem::into_annotation)
            .map(|api| {
                let (annotation, tags) = annotation_from_api(api);
                self.inner.cache.set_annotation_tags(&annotation.key, tags);
                annotation
            })
            .collect())
    }

    /// Annotations by key; missing keys and non-annotations are left out
    pub async fn get_annotations_by_key<S: AsRef<str>>(
        &self,
        keys: &[S],
        library_id: LibraryId,
    ) -> Result<HashMap<String, Annotation>> {
        let fetched = self.fetch_by_key(keys, "annotation").await?;
        let mut result = HashMap::new();
        for raw in fetched {
            match raw.decode::<AnnotationData>() {
                Ok(api) => {
                    let (annotation, tags) = annotation_from_api(api);
                    self.inner.cache.set_annotation_tags(&annotation.key, tags);
                    result.insert(annotation.key.clone(), annotation);
                }
                Err(e) => tracing::warn!("Skipping malformed annotation in library {}: {}", library_id, e),
            }
        }
        Ok(result)
    }

    pub async fn get_attachments(&self, doc_key: &str, library_id: LibraryId) -> Result<Vec<Attachment>> {
        tracing::debug!("Fetching attachments of {} (library {})", doc_key, library_id);
        let children = self
            .inner
            .client
            .get_children(doc_key, Some("attachment"))
            .await?;
        Ok(children
            .into_iter()
            .filter_map(ApiChildItem::into_attachment)
            .map(attachment_from_api)
            .collect())
    }

    /// Attachments that can carry annotations (a file of a readable type)
    pub async fn get_annotatable_attachments(
        &self,
        doc_key: &str,
        library_id: LibraryId,
    ) -> Result<Vec<Attachment>> {
        let mut attachments = self.get_attachments(doc_key, library_id).await?;
        attachments.retain(Attachment::is_annotatable);
        Ok(attachments)
    }

    pub async fn get_notes(&self, item_key: &str, library_id: LibraryId) -> Result<Vec<Note>> {
        tracing::debug!("Fetching notes of {} (library {})", item_key, library_id);
        let children = self.inner.client.get_children(item_key, Some("note")).await?;
        Ok(children
            .into_iter()
            .filter_map(ApiChildItem::into_note)
            .map(note_from_api)
            .collect())
    }

    pub async fn get_notes_by_key<S: AsRef<str>>(
        &self,
        keys: &[S],
        library_id: LibraryId,
    ) -> Result<HashMap<String, Note>> {
        let fetched = self.fetch_by_key(keys, "note").await?;
        let mut result = HashMap::new();
        for raw in fetched {
            match raw.decode::<NoteData>() {
                Ok(api) => {
                    let note = note_from_api(api);
                    result.insert(note.key.clone(), note);
                }
                Err(e) => tracing::warn!("Skipping malformed note in library {}: {}", library_id, e),
            }
        }
        Ok(result)
    }

    /// Fetch keys concurrently, keeping only records of `item_type`
    async fn fetch_by_key<S: AsRef<str>>(&self, keys: &[S], item_type: &str) -> Result<Vec<RawItem>> {
        let client = &self.inner.client;
        let fetched = future::try_join_all(keys.iter().map(|key| client.get_item(key.as_ref()))).await?;
        Ok(fetched
            .into_iter()
            .flatten()
            .filter(|raw| raw.item_type() == item_type)
            .collect())
    }

    /// Tags per key; annotations answer from the tag cache, regular items
    /// from their snapshot, anything else with an empty list
    pub fn get_tags(&self, items: &[KeyLibId]) -> HashMap<String, Vec<Tag>> {
        items
            .iter()
            .map(|(key, library_id)| (key.clone(), self.inner.cache.tags_for(*library_id, key)))
            .collect()
    }

    /// Citekey → item key for the citekeys that are known
    pub fn get_item_key_from_citekey<S: AsRef<str>>(
        &self,
        citekeys: &[S],
        library_id: LibraryId,
    ) -> HashMap<String, String> {
        citekeys
            .iter()
            .filter_map(|ck| {
                let ck = ck.as_ref();
                self.inner
                    .cache
                    .key_for_citekey(library_id, ck)
                    .map(|key| (ck.to_string(), key))
            })
            .collect()
    }
}

impl std::fmt::Debug for Mirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mirror")
            .field("status", &self.status())
            .field("target_library", &self.target_library())
            .field("indexed_library", &self.indexed_library())
            .finish_non_exhaustive()
    }
}

/// Run `first`, then every follow-up queued behind it.
///
/// Once shutdown or a later start has moved the slot past `generation`, the
/// run finishes with its own outcome and leaves the slot alone.
async fn run_jobs(inner: Arc<Inner>, first: Job, generation: u64) -> Result<()> {
    let mut job = first;
    let mut first_error: Option<MirrorError> = None;

    loop {
        let outcome = match job {
            Job::Initialize => inner.initialize().await,
            Job::Refresh(task) => inner.execute(task).await,
        };

        let next = {
            let mut slot = inner.slot();
            if slot.generation != generation {
                tracing::debug!("Refresh run {} superseded; leaving state untouched", generation);
                return match (outcome, first_error) {
                    (_, Some(e)) | (Err(e), None) => Err(e),
                    (Ok(()), None) => Ok(()),
                };
            }
            match outcome {
                Ok(()) if job == Job::Initialize => {
                    tracing::info!("Zotero mirror initialized");
                    inner.events.emit(MirrorEvent::Ready);
                }
                Ok(()) => {}
                Err(e) if job == Job::Initialize => {
                    tracing::error!("Initialization failed: {}", e);
                    slot.state.reset();
                    slot.running = None;
                    slot.abort = None;
                    return Err(e);
                }
                Err(e) => {
                    tracing::error!("Refresh failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }

            let next = slot.state.finish();
            if next.is_none() {
                slot.running = None;
                slot.abort = None;
            }
            next
        };

        match next {
            Some(task) => {
                tracing::info!("Running queued refresh ({})", task);
                job = Job::Refresh(task);
            }
            None => break,
        }
    }

    first_error.map_or(Ok(()), Err)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
    fn slot(&self) -> MutexGuard<'_, RefreshSlot> {
        lock(&self.refresh)
    }

    fn target_library(&self) -> LibraryId {
        self.target_library.load(Ordering::SeqCst)
    }

    fn current_index(&self) -> Option<Arc<SearchIndex>> {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn index_mut(&self) -> std::sync::RwLockWriteGuard<'_, Option<Arc<SearchIndex>>> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The index, if it was built for `library_id`
    fn index_for(&self, library_id: LibraryId) -> Option<Arc<SearchIndex>> {
        self.current_index()
            .filter(|index| index.library_id() == library_id)
    }

    async fn initialize(&self) -> Result<()> {
        if !self.client.ping().await {
            return Err(MirrorError::Unreachable {
                url: self.client.base_url().to_string(),
            });
        }
        self.execute(RefreshTask::Full).await
    }

    async fn execute(&self, task: RefreshTask) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let library_id = self.target_library();

        match task {
            RefreshTask::Full => self.load_library(library_id).await?,
            RefreshTask::SearchIndex { force } => {
                if !force && self.index_for(library_id).is_some() {
                    tracing::debug!("Search index already built for library {}", library_id);
                    return Ok(());
                }
                match self.cache.items(library_id) {
                    Some(items) => self.rebuild_index(library_id, &items)?,
                    None => self.load_library(library_id).await?,
                }
            }
        }

        self.events.emit(MirrorEvent::SearchRefreshed { library_id });
        Ok(())
    }

    /// Load collections and items into fresh structures, then swap them in.
    ///
    /// Callers must hold the write gate. On error the previous snapshot and
    /// index stay in place.
    async fn load_library(&self, library_id: LibraryId) -> Result<()> {
        tracing::info!("Loading all items for library {}", library_id);

        let api_collections = self.client.get_collections().await?;
        let collections = collections_from_api(&api_collections, library_id);

        let index = SearchIndex::in_memory(library_id, self.config.index_heap_bytes)?;
        let mut snapshot = LibrarySnapshot::new();
        let mut index_error = None;
        let mut loaded = 0usize;

        let ctx = TransformContext {
            library_id,
            collections: &collections,
        };
        self.client
            .get_all_items(|batch: &[ApiRegularItem]| {
                for record in batch {
                    if !is_regular_item_type(&record.data.item_type) {
                        continue;
                    }
                    let item = regular_item_from_api(record.clone(), &ctx);
                    if index_error.is_none() {
                        if let Err(e) = index.add_item(&item) {
                            index_error = Some(e);
                        }
                    }
                    snapshot.insert(Arc::new(item));
                }
                loaded += batch.len();
                self.events
                    .emit(MirrorEvent::BatchLoaded { library_id, loaded });
            })
            .await?;

        if let Some(e) = index_error {
            return Err(e.into());
        }
        index.commit()?;

        tracing::info!(
            "Loaded {} items and {} collections for library {}",
            snapshot.len(),
            collections.len(),
            library_id
        );

        self.cache.set_collections(collections);
        self.cache.install_snapshot(library_id, snapshot);
        self.cache.register_library(Library::personal(library_id));
        *self.index_mut() = Some(Arc::new(index));
        Ok(())
    }

    fn rebuild_index(&self, library_id: LibraryId, items: &[Arc<RegularItem>]) -> Result<()> {
        tracing::debug!("Building search index for library {}", library_id);
        let index = SearchIndex::build(
            library_id,
            self.config.index_heap_bytes,
            items.iter().map(|item| &**item),
        )?;
        *self.index_mut() = Some(Arc::new(index));
        tracing::info!("Search index built for library {} ({} items)", library_id, items.len());
        Ok(())
    }

    /// Re-fetch one item into the cache and stage it in the index.
    ///
    /// Callers must hold the write gate and finish with [`Inner::commit_index`].
    async fn stage_update(&self, key: &str, library_id: LibraryId) -> Result<Option<Arc<RegularItem>>> {
        let raw = match self.client.get_item(key).await? {
            Some(raw) if is_regular_item_type(raw.item_type()) => raw,
            Some(raw) => {
                tracing::debug!("Item {} is now a {}; removing", key, raw.item_type());
                self.stage_removal(key, library_id)?;
                return Ok(None);
            }
            None => {
                tracing::debug!("Item {} no longer exists; removing", key);
                self.stage_removal(key, library_id)?;
                return Ok(None);
            }
        };

        let api: ApiRegularItem = raw.decode().map_err(|e| HttpError::ParseError {
            message: format!("item {}: {}", key, e),
        })?;
        let collections = self.cache.collections();
        let ctx = TransformContext {
            library_id,
            collections: &collections,
        };
        let item = Arc::new(regular_item_from_api(api, &ctx));

        self.cache.upsert_item(Arc::clone(&item));
        if let Some(index) = self.index_for(library_id) {
            index.add_item(&item)?;
        }
        Ok(Some(item))
    }

    /// Callers must hold the write gate and finish with [`Inner::commit_index`]
    fn stage_removal(&self, key: &str, library_id: LibraryId) -> Result<()> {
        self.cache.remove_item(library_id, key);
        if let Some(index) = self.index_for(library_id) {
            index.delete_item(key)?;
        }
        Ok(())
    }

    /// Make staged index changes searchable, off the async workers
    async fn commit_index(&self) -> Result<()> {
        let Some(index) = self.current_index() else {
            return Ok(());
        };
        tokio::task::spawn_blocking(move || index.commit())
            .await
            .map_err(|e| SearchIndexError::IndexError(format!("commit task failed: {}", e)))??;
        Ok(())
    }
}
