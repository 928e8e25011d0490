//! Torrent search abstraction.
//!
//! This module provides a `Searcher` trait for querying a Torznab
//! metasearch provider (Jackett) across a caller-selected set of indexers,
//! a tolerant Torznab XML extractor, and post-aggregation refinement
//! (filter, sort, limit).

mod jackett;
mod refine;
pub mod torznab;
mod types;

pub use jackett::JackettClient;
pub(crate) use jackett::merge_tracker_results;
pub use refine::{publish_timestamp, SearchOptions, SortOrder};
pub use types::*;
