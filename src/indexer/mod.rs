//! Torrent Indexer Module
//!
//! Per-site indexers translate a unified Torznab query into a site request
//! and normalize what the site returns into [`ReleaseInfo`] records.
//!
//! # Architecture
//!
//! - `categories`: the unified Torznab taxonomy
//! - `mapping`: tracker category <-> Torznab category tables
//! - `Indexer` trait: core abstraction for all indexer implementations
//! - `SiteClient` trait: fetches and scrapes a site; supplied by the host
//! - `IndexerManager`: registry and orchestration for configured indexers
//! - `definitions`: YAML-defined and native indexer implementations
//! - `torznab`: Torznab request parsing and XML rendering
//!
//! # Example
//!
//! ```ignore
//! use indexarr::indexer::{IndexerManager, TorznabQuery};
//!
//! let manager = IndexerManager::new(2);
//! manager.register(indexer);
//! let query = TorznabQuery::tv_search("Breaking Bad").with_season_episode(1, Some("01"));
//! let results = manager.search_all(&query).await;
//! ```

pub mod categories;
pub mod client;
pub mod definitions;
pub mod manager;
pub mod mapping;
pub mod normalize;
pub mod torznab;
pub mod types;

pub use client::{RawCategory, RawRelease, SearchRequest, SiteClient};
pub use manager::IndexerManager;
pub use mapping::{CategoryError, CategoryMap, CategoryMapBuilder, CategoryMapping, CategoryRef};
pub use types::{
    IndexerType, MovieSearchParam, QueryType, ReleaseInfo, TorznabCapabilities, TorznabQuery,
    TvSearchParam,
};

use anyhow::Result;
use async_trait::async_trait;

/// Core trait for all indexer implementations
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Unique identifier for this indexer (e.g., "iptorrents")
    fn id(&self) -> &str;

    /// Display name for the indexer
    fn name(&self) -> &str;

    /// Description of the indexer
    fn description(&self) -> &str;

    /// The type of indexer (native or definition based)
    fn indexer_type(&self) -> IndexerType;

    /// The site URL
    fn site_link(&self) -> &str;

    /// Whether this is a private, public, or semi-private tracker
    fn tracker_type(&self) -> TrackerType;

    /// Language of the indexer (e.g., "en-US")
    fn language(&self) -> &str;

    /// Get the capabilities of this indexer
    fn capabilities(&self) -> &TorznabCapabilities;

    /// Perform a search query
    async fn search(&self, query: &TorznabQuery) -> Result<Vec<ReleaseInfo>>;

    /// Check if this indexer can handle the given query
    fn can_handle_query(&self, query: &TorznabQuery) -> bool {
        let caps = self.capabilities();
        caps.supports_query_type(query.query_type)
            && caps.can_handle_categories(&query.categories)
    }
}

/// Type of tracker (affects how releases are handled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackerType {
    /// Private tracker - requires account, don't share magnets
    #[default]
    Private,
    /// Public tracker - no account needed
    Public,
    /// Semi-private - may require registration but is open
    SemiPrivate,
}

impl std::fmt::Display for TrackerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerType::Private => write!(f, "private"),
            TrackerType::Public => write!(f, "public"),
            TrackerType::SemiPrivate => write!(f, "semi-private"),
        }
    }
}

impl std::str::FromStr for TrackerType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "private" => Ok(TrackerType::Private),
            "public" => Ok(TrackerType::Public),
            "semi-private" | "semiprivate" | "semi" => Ok(TrackerType::SemiPrivate),
            _ => Err(anyhow::anyhow!("Unknown tracker type: {}", s)),
        }
    }
}

/// Result from an indexer search operation
#[derive(Debug, Clone, serde::Serialize)]
pub struct IndexerSearchResult {
    /// The indexer that produced these results
    pub indexer_id: String,
    pub indexer_name: String,
    /// The releases found
    pub releases: Vec<ReleaseInfo>,
    /// Time taken to search (milliseconds)
    pub elapsed_ms: u64,
    /// Any error that occurred
    pub error: Option<String>,
}
