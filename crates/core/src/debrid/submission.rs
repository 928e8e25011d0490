//! Submission of a search result to the debrid service.
//!
//! A result is registered through the first strategy its provenance allows:
//!
//! ```text
//! MagnetDirect ──────────────────────────────────────────────► Submitted
//!      (no magnet)
//! ResolveTorrentSource ─► FetchCandidate ─► Classify ─┬─► BodyMagnetUpload ─► Submitted
//!                                                     └─► UploadFile ───────► Submitted
//! ```
//!
//! Every state may also move to `Failed`. Each state is visited at most
//! once, so a candidate is never submitted twice.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::{debug, info, warn};

use crate::metrics::SUBMISSIONS;
use crate::searcher::{normalize_url, RawItem};

use super::source::{FetchedSource, SourceFetcher};
use super::types::{DebridError, DebridService, Submission, SubmitStrategy};

/// A magnet URI embedded in arbitrary text.
static BODY_MAGNET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(magnet:\?[^"'<>\s]+)"#).unwrap());

/// Body characters quoted in the "not a usable torrent" error.
const BODY_PREVIEW_CHARS: usize = 120;

/// One step of the submission ladder.
#[derive(Debug)]
pub enum SubmissionState {
    /// Submit the item's own magnet.
    MagnetDirect { magnet: String },
    /// Pick the best download URL from the item.
    ResolveTorrentSource,
    /// Download the resolved URL.
    FetchCandidate { url: String },
    /// Decide what the download contains.
    Classify { url: String, source: FetchedSource },
    /// Submit a magnet found in the download (or the URL itself).
    BodyMagnetUpload { magnet: String },
    /// Upload raw `.torrent` bytes.
    UploadFile { data: Vec<u8> },
    Submitted(Submission),
    Failed(DebridError),
}

impl SubmissionState {
    /// Entry state for an item.
    pub fn start(raw: &RawItem) -> Self {
        match raw.magnet.as_deref().map(str::trim) {
            Some(magnet) if !magnet.is_empty() => SubmissionState::MagnetDirect {
                magnet: magnet.to_string(),
            },
            _ => SubmissionState::ResolveTorrentSource,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::MagnetDirect { .. } => "magnet_direct",
            SubmissionState::ResolveTorrentSource => "resolve_torrent_source",
            SubmissionState::FetchCandidate { .. } => "fetch_candidate",
            SubmissionState::Classify { .. } => "classify",
            SubmissionState::BodyMagnetUpload { .. } => "body_magnet_upload",
            SubmissionState::UploadFile { .. } => "upload_file",
            SubmissionState::Submitted(_) => "submitted",
            SubmissionState::Failed(_) => "failed",
        }
    }
}

/// Registers search results with a debrid service.
pub struct SubmissionPipeline {
    service: Arc<dyn DebridService>,
    fetcher: Arc<dyn SourceFetcher>,
    scratch_dir: Option<PathBuf>,
}

impl SubmissionPipeline {
    pub fn new(service: Arc<dyn DebridService>, fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self {
            service,
            fetcher,
            scratch_dir: None,
        }
    }

    /// Also write every uploaded `.torrent` into `dir`.
    pub fn with_scratch_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.scratch_dir = dir;
        self
    }

    /// Run the ladder for `raw` until it submits or fails.
    pub async fn submit(&self, raw: &RawItem) -> Result<Submission, DebridError> {
        let mut state = SubmissionState::start(raw);
        let mut stage = state.name();

        loop {
            state = match state {
                SubmissionState::Submitted(submission) => {
                    info!(
                        service = %self.service.name(),
                        strategy = submission.strategy.as_str(),
                        "Submitted to debrid service"
                    );
                    SUBMISSIONS
                        .with_label_values(&[submission.strategy.as_str(), "submitted"])
                        .inc();
                    return Ok(submission);
                }
                SubmissionState::Failed(error) => {
                    warn!(stage = stage, error = %error, "Debrid submission failed");
                    SUBMISSIONS.with_label_values(&[stage, "failed"]).inc();
                    return Err(error);
                }
                current => {
                    stage = current.name();
                    debug!(stage = stage, "Submission step");
                    self.step(current, raw).await
                }
            };
        }
    }

    /// Apply one transition.
    pub async fn step(&self, state: SubmissionState, raw: &RawItem) -> SubmissionState {
        match state {
            SubmissionState::MagnetDirect { magnet } => {
                self.upload_magnet(&magnet, SubmitStrategy::MagnetDirect).await
            }
            SubmissionState::ResolveTorrentSource => resolve_torrent_source(raw),
            SubmissionState::FetchCandidate { url } => self.fetch_candidate(url).await,
            SubmissionState::Classify { url, source } => classify(&url, source),
            SubmissionState::BodyMagnetUpload { magnet } => {
                self.upload_magnet(&magnet, SubmitStrategy::BodyMagnet).await
            }
            SubmissionState::UploadFile { data } => self.upload_file(data).await,
            terminal => terminal,
        }
    }

    async fn upload_magnet(&self, magnet: &str, strategy: SubmitStrategy) -> SubmissionState {
        match self.service.upload_magnet(&normalize_url(magnet)).await {
            Ok(response) => SubmissionState::Submitted(Submission { strategy, response }),
            Err(e) => SubmissionState::Failed(e),
        }
    }

    async fn fetch_candidate(&self, url: String) -> SubmissionState {
        match self.fetcher.fetch(&url).await {
            Ok(source) => SubmissionState::Classify { url, source },
            Err(e) => SubmissionState::Failed(e),
        }
    }

    async fn upload_file(&self, data: Vec<u8>) -> SubmissionState {
        if let Some(dir) = &self.scratch_dir {
            persist_scratch(dir, &data).await;
        }

        match self.service.upload_torrent_file(data).await {
            Ok(response) => SubmissionState::Submitted(Submission {
                strategy: SubmitStrategy::TorrentFile,
                response,
            }),
            Err(e) => SubmissionState::Failed(e),
        }
    }
}

fn resolve_torrent_source(raw: &RawItem) -> SubmissionState {
    match raw.download_url() {
        Some(url) => SubmissionState::FetchCandidate { url },
        None => SubmissionState::Failed(DebridError::NoUsableSource(
            "no magnet and no torrent source".to_string(),
        )),
    }
}

fn classify(url: &str, source: FetchedSource) -> SubmissionState {
    if source.is_torrent() {
        return SubmissionState::UploadFile { data: source.body };
    }

    let text = source.text();
    if let Some(magnet) = find_body_magnet(&text) {
        return SubmissionState::BodyMagnetUpload { magnet };
    }
    if url.starts_with("magnet:") {
        return SubmissionState::BodyMagnetUpload {
            magnet: url.to_string(),
        };
    }

    SubmissionState::Failed(DebridError::NoUsableSource(format!(
        "indexer did not return a usable torrent or magnet (content-type={}): {}",
        source.content_type,
        text.chars().take(BODY_PREVIEW_CHARS).collect::<String>()
    )))
}

/// First magnet URI in `text`.
pub fn find_body_magnet(text: &str) -> Option<String> {
    BODY_MAGNET
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Write `data` to `<dir>/upload-<epoch-ms>.torrent`. Failures are logged only.
async fn persist_scratch(dir: &Path, data: &[u8]) -> Option<PathBuf> {
    let path = dir.join(format!(
        "upload-{}.torrent",
        chrono::Utc::now().timestamp_millis()
    ));

    let result = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, data).await
    }
    .await;

    match result {
        Ok(()) => {
            debug!(path = %path.display(), "Saved torrent for inspection");
            Some(path)
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Could not save torrent locally");
            None
        }
    }
}
