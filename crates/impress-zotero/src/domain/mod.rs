//! Domain models for the Zotero mirror
//!
//! Every entity is an immutable value snapshot. Updates replace a snapshot,
//! they never mutate one in place; the cache hands out `Arc`s so readers
//! keep a consistent view while a refresh swaps the maps underneath.

pub mod annotation;
pub mod attachment;
pub mod collection;
pub mod creator;
pub mod item;
pub mod note;
pub mod tag;

pub use annotation::{Annotation, AnnotationType, SortIndex};
pub use attachment::{Attachment, LinkMode, ANNOTATABLE_CONTENT_TYPES};
pub use collection::{Collection, Library};
pub use creator::{Creator, CreatorFieldMode};
pub use item::{is_regular_item_type, RegularItem};
pub use note::Note;
pub use tag::Tag;

/// Numeric library identifier (the user library is 1)
pub type LibraryId = i64;

/// `(item key, library)` pair, the primary identity of a regular item
pub type KeyLibId = (String, LibraryId);
