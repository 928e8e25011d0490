//! Debrid service integration.
//!
//! This module provides a `DebridService` trait for the remote unlocking
//! service (AllDebrid), the multi-strategy submission pipeline that
//! registers a search result with it, and the file resolver and link
//! unlocker that turn a registered item into direct download links.

mod alldebrid;
pub mod files;
mod source;
pub mod submission;
pub mod torrent_file;
mod types;

pub use alldebrid::AllDebridClient;
pub use files::{resolve_and_unlock, resolve_video_files, unlock_all};
pub use source::{FetchedSource, HttpSourceFetcher, SourceFetcher};
pub use submission::{SubmissionPipeline, SubmissionState};
pub use torrent_file::{magnet_from_torrent, ExtractedMagnet};
pub use types::*;
