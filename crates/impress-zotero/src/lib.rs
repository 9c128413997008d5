//! impress-zotero: local mirror of a Zotero library
//!
//! This library keeps an in-memory, queryable copy of the library served by
//! the Zotero local HTTP API:
//! - Paginated, concurrency-bounded fetching of items and collections
//! - Item cache with a citekey index and annotation tag cache
//! - Full-text search over bibliographic fields (tantivy, in RAM)
//! - A refresh state machine that serializes and coalesces reloads
//! - Debounced incremental updates driven by change notifications
//!
//! Entry point is [`Mirror`].

pub mod api;
pub mod cache;
pub mod config;
pub mod debounce;
pub mod domain;
pub mod error;
pub mod events;
pub mod http;
pub mod mirror;
pub mod notify;
pub mod refresh;
pub mod search;

// Re-export main types for convenience
pub use api::{Page, ZoteroApiClient};
pub use cache::{LibrarySnapshot, MirrorCache};
pub use config::MirrorConfig;
pub use debounce::{Coalesce, Debouncer, KeyedQueue};
pub use domain::{
    Annotation, AnnotationType, Attachment, Collection, Creator, CreatorFieldMode, KeyLibId,
    Library, LibraryId, LinkMode, Note, RegularItem, Tag,
};
pub use error::{MirrorError, Result};
pub use events::MirrorEvent;
pub use http::HttpError;
pub use mirror::{Mirror, DEFAULT_SEARCH_LIMIT};
pub use notify::{ChangeKind, ItemChange, ItemChanges, ItemNotification, RegularItemUpdate};
pub use refresh::{MirrorStatus, RefreshTask};
pub use search::{SearchHit, SearchIndex, SearchIndexError};
