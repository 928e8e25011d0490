//! Post-processing of merged search results: filter, sort, limit.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use super::SearchResult;

/// Result ordering requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Indexer/feed arrival order.
    #[default]
    Relevance,
    /// Seeders, highest first.
    Seeders,
    /// Size, largest first.
    Size,
    /// Publish date, newest first.
    Date,
}

impl SortOrder {
    /// Parse a query-string value. Unknown values fall back to relevance.
    pub fn from_param(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "seeders" => SortOrder::Seeders,
            "size" => SortOrder::Size,
            "date" => SortOrder::Date,
            _ => SortOrder::Relevance,
        }
    }
}

/// Caller-specified refinements applied after aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(default)]
    pub sort: SortOrder,
    /// Keep only results with at least one known seeder.
    #[serde(default)]
    pub only_seeded: bool,
    /// Truncate to this many results after filtering and sorting.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchOptions {
    /// Filter, then stable-sort, then truncate.
    pub fn apply(&self, mut results: Vec<SearchResult>) -> Vec<SearchResult> {
        if self.only_seeded {
            results.retain(|r| r.seeders.is_some_and(|s| s > 0));
        }

        // `Option` orders `None` below every `Some`, so unknown values sink
        // to the end of a descending sort.
        match self.sort {
            SortOrder::Relevance => {}
            SortOrder::Seeders => results.sort_by(|a, b| b.seeders.cmp(&a.seeders)),
            SortOrder::Size => results.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes)),
            SortOrder::Date => results.sort_by_key(|r| {
                std::cmp::Reverse(publish_timestamp(r.raw.pub_date.as_deref()))
            }),
        }

        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            results.truncate(limit);
        }

        results
    }
}

/// Milliseconds since the epoch for an RSS publish date; 0 when absent or
/// unparsable.
pub fn publish_timestamp(date: Option<&str>) -> i64 {
    let Some(date) = date.map(str::trim).filter(|d| !d.is_empty()) else {
        return 0;
    };

    DateTime::parse_from_rfc2822(date)
        .or_else(|_| DateTime::parse_from_rfc3339(date))
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}
