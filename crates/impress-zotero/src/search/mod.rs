//! Search module
//!
//! Provides:
//! - Full-text search over one library's items with Tantivy
//! - Merging of per-field matches into a single weighted ranking

pub mod index;
pub mod rank;
pub mod schema;

pub use index::*;
pub use rank::{field_weight, normalize_field, rank, RankedKey, SearchHit};
pub use schema::*;
