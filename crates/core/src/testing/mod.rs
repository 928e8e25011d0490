//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external service traits
//! (`Searcher`, `DebridService`, `SourceFetcher`), allowing the pipeline and
//! the HTTP gateway to be exercised without Jackett or AllDebrid.
//!
//! # Example
//!
//! ```rust,ignore
//! use debridge_core::testing::{MockDebridService, MockSearcher, MockSourceFetcher};
//!
//! let searcher = MockSearcher::new();
//! let service = MockDebridService::new();
//! let fetcher = MockSourceFetcher::new();
//!
//! // Configure mock responses
//! searcher.set_items("1337x", vec![fixtures::raw_item("Ubuntu", 10)]).await;
//! service.set_unlock("opaque-link", "https://direct/ubuntu.iso").await;
//!
//! // Use in AppState...
//! ```

mod mock_debrid;
mod mock_fetcher;
mod mock_searcher;

pub use mock_debrid::MockDebridService;
pub use mock_fetcher::MockSourceFetcher;
pub use mock_searcher::{MockSearcher, RecordedSearch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::debrid::{DebridFile, FetchedSource};
    use crate::searcher::RawItem;

    /// A titled item with a magnet and the given seeders.
    pub fn raw_item(title: &str, seeders: u32) -> RawItem {
        RawItem {
            title: Some(title.to_string()),
            magnet: Some(format!(
                "magnet:?xt=urn:btih:{}",
                title.to_lowercase().replace(' ', "")
            )),
            seeders: Some(seeders),
            size: Some(1024 * 1024 * 100), // 100 MB
            ..Default::default()
        }
    }

    /// A titled item that only carries a `.torrent` URL.
    pub fn torrent_url_item(title: &str, url: &str) -> RawItem {
        RawItem {
            title: Some(title.to_string()),
            torrent_url: Some(url.to_string()),
            ..Default::default()
        }
    }

    /// A file entry of a debrid item.
    pub fn debrid_file(name: &str, link: &str) -> DebridFile {
        DebridFile {
            name: name.to_string(),
            link: link.to_string(),
        }
    }

    /// Minimal single-file `.torrent` with one announce URL repeated in a
    /// two-tier announce list.
    pub fn torrent_bytes(name: &str) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(
            b"d8:announce21:udp://tracker.one:80113:announce-listll21:udp://tracker.one:801el21:udp://tracker.two:802ee",
        );
        out.extend_from_slice(b"4:infod6:lengthi1024e");
        out.extend_from_slice(format!("4:name{}:{}", name.len(), name).as_bytes());
        out.extend_from_slice(b"12:piece lengthi16384e6:pieces20:");
        out.extend_from_slice(&[0u8; 20]);
        out.extend_from_slice(b"ee");
        out
    }

    /// A download served as `application/x-bittorrent`.
    pub fn torrent_source(name: &str) -> FetchedSource {
        FetchedSource {
            content_type: "application/x-bittorrent".to_string(),
            body: torrent_bytes(name),
        }
    }

    /// A download served as HTML.
    pub fn html_source(body: &str) -> FetchedSource {
        FetchedSource {
            content_type: "text/html; charset=utf-8".to_string(),
            body: body.as_bytes().to_vec(),
        }
    }
}
