pub mod config;
pub mod debrid;
pub mod metrics;
pub mod searcher;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, AllDebridConfig, Config, ConfigError,
    DebugConfig, JackettConfig, SanitizedConfig, ServerConfig,
};
pub use debrid::{
    magnet_from_torrent, resolve_and_unlock, AllDebridClient, DebridError, DebridItem,
    DebridService, ExtractedMagnet, FetchedSource, HttpSourceFetcher, SourceFetcher, Submission,
    SubmissionPipeline, SubmitStrategy, UnlockedLink, VideoFile,
};
pub use searcher::{
    Indexer, JackettClient, RawItem, SearchError, SearchOptions, SearchResult, Searcher, SortOrder,
};
