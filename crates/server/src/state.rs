use std::path::PathBuf;
use std::sync::Arc;

use debridge_core::{
    Config, DebridService, SanitizedConfig, Searcher, SourceFetcher, SubmissionPipeline,
};

/// Shared application state
pub struct AppState {
    config: Config,
    searcher: Option<Arc<dyn Searcher>>,
    debrid: Option<Arc<dyn DebridService>>,
    fetcher: Arc<dyn SourceFetcher>,
}

impl AppState {
    pub fn new(
        config: Config,
        searcher: Option<Arc<dyn Searcher>>,
        debrid: Option<Arc<dyn DebridService>>,
        fetcher: Arc<dyn SourceFetcher>,
    ) -> Self {
        Self {
            config,
            searcher,
            debrid,
            fetcher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn searcher(&self) -> Option<&Arc<dyn Searcher>> {
        self.searcher.as_ref()
    }

    pub fn debrid(&self) -> Option<&Arc<dyn DebridService>> {
        self.debrid.as_ref()
    }

    pub fn fetcher(&self) -> &Arc<dyn SourceFetcher> {
        &self.fetcher
    }

    /// Directory receiving a copy of each uploaded `.torrent`, if any.
    pub fn torrent_dir(&self) -> Option<PathBuf> {
        self.config.debug.torrent_dir.clone()
    }

    /// Submission pipeline bound to the configured debrid service.
    pub fn pipeline(&self) -> Option<SubmissionPipeline> {
        self.debrid.as_ref().map(|service| {
            SubmissionPipeline::new(Arc::clone(service), Arc::clone(&self.fetcher))
                .with_scratch_dir(self.torrent_dir())
        })
    }
}
