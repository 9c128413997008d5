//! Zotero local API access
//!
//! - [`client`]: paginated fetch client over the local HTTP API
//! - [`types`]: raw record shapes as the API returns them
//! - [`transform`]: mapping from raw records to mirror entities

pub mod client;
pub mod transform;
pub mod types;

pub use client::{Page, ZoteroApiClient, TOTAL_RESULTS_HEADER};
pub use transform::TransformContext;
pub use types::*;
