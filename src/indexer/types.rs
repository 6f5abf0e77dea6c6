//! Core types for the indexer system
//!
//! These types are modeled after the Torznab specification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mapping::{CategoryMap, CategoryMapping, CategoryRef};

/// How an indexer is implemented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexerType {
    /// Native Rust implementation with an inline category table
    #[default]
    Native,
    /// Built from a YAML definition
    Definition,
}

impl std::fmt::Display for IndexerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexerType::Native => write!(f, "native"),
            IndexerType::Definition => write!(f, "definition"),
        }
    }
}

/// Type of search query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// General text search
    #[default]
    Search,
    /// TV show search (supports season/episode)
    TvSearch,
    /// Movie search
    MovieSearch,
    /// Music search
    MusicSearch,
    /// Book search
    BookSearch,
    /// Capabilities request
    Caps,
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryType::Search => write!(f, "search"),
            QueryType::TvSearch => write!(f, "tvsearch"),
            QueryType::MovieSearch => write!(f, "movie"),
            QueryType::MusicSearch => write!(f, "music"),
            QueryType::BookSearch => write!(f, "book"),
            QueryType::Caps => write!(f, "caps"),
        }
    }
}

impl std::str::FromStr for QueryType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "search" | "q" => Ok(QueryType::Search),
            "tvsearch" | "tv-search" | "tv" => Ok(QueryType::TvSearch),
            "movie" | "movie-search" | "moviesearch" => Ok(QueryType::MovieSearch),
            "music" | "music-search" | "musicsearch" | "audio" => Ok(QueryType::MusicSearch),
            "book" | "book-search" | "booksearch" => Ok(QueryType::BookSearch),
            "caps" | "capabilities" => Ok(QueryType::Caps),
            _ => Err(anyhow::anyhow!("Unknown query type: {}", s)),
        }
    }
}

/// TV search parameters supported by an indexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TvSearchParam {
    Q,
    Season,
    Ep,
    ImdbId,
    TvdbId,
    TmdbId,
    Year,
    Genre,
}

impl TvSearchParam {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "q" => Some(Self::Q),
            "season" => Some(Self::Season),
            "ep" => Some(Self::Ep),
            "imdbid" => Some(Self::ImdbId),
            "tvdbid" => Some(Self::TvdbId),
            "tmdbid" => Some(Self::TmdbId),
            "year" => Some(Self::Year),
            "genre" => Some(Self::Genre),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Q => "q",
            Self::Season => "season",
            Self::Ep => "ep",
            Self::ImdbId => "imdbid",
            Self::TvdbId => "tvdbid",
            Self::TmdbId => "tmdbid",
            Self::Year => "year",
            Self::Genre => "genre",
        }
    }
}

/// Movie search parameters supported by an indexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovieSearchParam {
    Q,
    ImdbId,
    TmdbId,
    Year,
    Genre,
}

impl MovieSearchParam {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "q" => Some(Self::Q),
            "imdbid" => Some(Self::ImdbId),
            "tmdbid" => Some(Self::TmdbId),
            "year" => Some(Self::Year),
            "genre" => Some(Self::Genre),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Q => "q",
            Self::ImdbId => "imdbid",
            Self::TmdbId => "tmdbid",
            Self::Year => "year",
            Self::Genre => "genre",
        }
    }
}

/// Capabilities of a torrent indexer (Torznab-compatible)
#[derive(Debug, Clone, Default, Serialize)]
pub struct TorznabCapabilities {
    /// Maximum results per page
    pub limits_max: Option<i32>,
    /// Default results per page
    pub limits_default: Option<i32>,

    /// Whether basic search is available
    pub search_available: bool,

    /// TV search parameters supported
    pub tv_search_params: Vec<TvSearchParam>,

    /// Movie search parameters supported
    pub movie_search_params: Vec<MovieSearchParam>,

    /// Music search is answered with a plain keyword search
    pub music_search_available: bool,

    /// Book search is answered with a plain keyword search
    pub book_search_available: bool,

    /// Tracker category <-> Torznab category table
    pub categories: CategoryMap,
}

impl TorznabCapabilities {
    /// Create default capabilities (search only)
    pub fn new(categories: CategoryMap) -> Self {
        Self {
            search_available: true,
            limits_default: Some(100),
            limits_max: Some(100),
            categories,
            ..Default::default()
        }
    }

    /// Whether TV search is available
    pub fn tv_search_available(&self) -> bool {
        !self.tv_search_params.is_empty()
    }

    /// Whether movie search is available
    pub fn movie_search_available(&self) -> bool {
        !self.movie_search_params.is_empty()
    }

    /// Check if a specific TV search param is supported
    pub fn has_tv_param(&self, param: TvSearchParam) -> bool {
        self.tv_search_params.contains(&param)
    }

    /// Check if a specific movie search param is supported
    pub fn has_movie_param(&self, param: MovieSearchParam) -> bool {
        self.movie_search_params.contains(&param)
    }

    /// Whether the query type can be answered at all
    pub fn supports_query_type(&self, query_type: QueryType) -> bool {
        match query_type {
            QueryType::Search => self.search_available,
            QueryType::TvSearch => self.tv_search_available(),
            QueryType::MovieSearch => self.movie_search_available(),
            QueryType::MusicSearch => self.music_search_available,
            QueryType::BookSearch => self.book_search_available,
            QueryType::Caps => true,
        }
    }

    /// Whether any of the requested categories can be searched.
    /// An empty request searches everything and is always allowed.
    pub fn can_handle_categories(&self, cats: &[i32]) -> bool {
        cats.is_empty() || cats.iter().any(|&cat| self.categories.supports(cat))
    }

    /// Map Torznab categories to tracker categories (parents include their subcategories)
    pub fn map_torznab_to_tracker(&self, cats: &[i32]) -> Vec<String> {
        self.categories.resolve_request_categories_expanded(cats)
    }

    /// Map a tracker category token to Torznab categories
    pub fn map_tracker_to_torznab(&self, tracker_id: &str) -> Vec<i32> {
        self.categories.resolve_token(tracker_id)
    }

    /// Map a tracker category description to Torznab categories
    pub fn map_tracker_desc_to_torznab(&self, description: &str) -> Vec<i32> {
        self.categories.resolve_label(description)
    }

    /// Resolve a scraped category, defaulting to `Other` when it is unknown
    pub fn result_categories(&self, category: Option<CategoryRef<'_>>) -> Vec<i32> {
        match category {
            Some(category) => self.categories.resolve_result_categories_or_other(category),
            None => vec![super::categories::cats::OTHER],
        }
    }

    /// Declarative mapping entries
    pub fn category_mappings(&self) -> &[CategoryMapping] {
        self.categories.entries()
    }
}

/// A search query in Torznab format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TorznabQuery {
    /// The type of search
    pub query_type: QueryType,

    /// Free-text search term
    pub search_term: Option<String>,

    /// Categories to search in (Torznab category IDs)
    pub categories: Vec<i32>,

    /// Maximum number of results
    pub limit: Option<i32>,

    /// Offset for pagination
    pub offset: Option<i32>,

    /// Whether to use caching
    pub cache: bool,

    /// Season number
    pub season: Option<i32>,
    /// Episode number/identifier
    pub episode: Option<String>,
    /// IMDB ID (e.g., "tt1234567")
    pub imdb_id: Option<String>,
    /// TVDB ID
    pub tvdb_id: Option<i32>,
    /// TMDB ID
    pub tmdb_id: Option<i32>,

    /// Release year
    pub year: Option<i32>,
    /// Genre
    pub genre: Option<String>,
}

impl TorznabQuery {
    /// Create a new search query
    pub fn search(term: &str) -> Self {
        Self {
            query_type: QueryType::Search,
            search_term: Some(term.to_string()),
            cache: true,
            ..Default::default()
        }
    }

    /// Create a TV search query
    pub fn tv_search(term: &str) -> Self {
        Self {
            query_type: QueryType::TvSearch,
            search_term: Some(term.to_string()),
            cache: true,
            ..Default::default()
        }
    }

    /// Create a movie search query
    pub fn movie_search(term: &str) -> Self {
        Self {
            query_type: QueryType::MovieSearch,
            search_term: Some(term.to_string()),
            cache: true,
            ..Default::default()
        }
    }

    /// Add season/episode to a TV search
    pub fn with_season_episode(mut self, season: i32, episode: Option<&str>) -> Self {
        self.season = Some(season);
        self.episode = episode.map(|s| s.to_string());
        self
    }

    /// Add IMDB ID to the query
    pub fn with_imdb(mut self, imdb_id: &str) -> Self {
        self.imdb_id = Some(imdb_id.to_string());
        self
    }

    /// Add categories to the query
    pub fn with_categories(mut self, cats: Vec<i32>) -> Self {
        self.categories = cats;
        self
    }

    /// Get the episode search string (e.g., "S01E05")
    pub fn get_episode_string(&self) -> Option<String> {
        self.season.map(|s| {
            if let Some(ref ep) = self.episode {
                format!("S{:02}E{}", s, ep)
            } else {
                format!("S{:02}", s)
            }
        })
    }

    /// Keywords to send to a site: the search term plus the episode string
    pub fn keywords(&self) -> String {
        let mut parts = vec![];

        if let Some(ref term) = self.search_term {
            if !term.trim().is_empty() {
                parts.push(term.trim().to_string());
            }
        }

        if let Some(ep) = self.get_episode_string() {
            parts.push(ep);
        }

        parts.join(" ")
    }

    /// Check if this is an ID-based search (IMDB, TVDB, etc.)
    pub fn is_id_search(&self) -> bool {
        self.imdb_id.is_some() || self.tvdb_id.is_some() || self.tmdb_id.is_some()
    }

    /// Create a cache key hash for this query
    pub fn cache_key(&self) -> String {
        use sha2::{Digest, Sha256};
        let json = serde_json::to_string(self).unwrap_or_default();
        let hash = Sha256::digest(json.as_bytes());
        format!("{:x}", hash)
    }
}

/// Information about a torrent release (Torznab-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// Release title
    pub title: String,

    /// Unique identifier (usually the details URL)
    pub guid: String,

    /// Download link (torrent file)
    pub link: Option<String>,

    /// Magnet URI
    pub magnet_uri: Option<String>,

    /// Details page URL
    pub details: Option<String>,

    /// Publication date
    pub publish_date: DateTime<Utc>,

    /// Torznab category IDs
    pub categories: Vec<i32>,

    /// File size in bytes
    pub size: Option<i64>,

    /// Number of times snatched/downloaded
    pub grabs: Option<i32>,

    /// Description
    pub description: Option<String>,

    /// Number of seeders
    pub seeders: Option<i32>,
    /// Number of peers (seeders + leechers)
    pub peers: Option<i32>,

    /// Download volume factor (0 = freeleech, 1 = normal)
    pub download_volume_factor: f64,
    /// Upload volume factor (usually 1, can be 2 for double upload)
    pub upload_volume_factor: f64,

    /// Minimum ratio required
    pub minimum_ratio: Option<f64>,
    /// Minimum seed time in seconds
    pub minimum_seed_time: Option<i64>,

    /// The indexer that found this release
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexer_name: Option<String>,
}

impl ReleaseInfo {
    /// Create a new release with minimal info
    pub fn new(title: String, guid: String, publish_date: DateTime<Utc>) -> Self {
        Self {
            title,
            guid,
            publish_date,
            link: None,
            magnet_uri: None,
            details: None,
            categories: vec![],
            size: None,
            grabs: None,
            description: None,
            seeders: None,
            peers: None,
            download_volume_factor: 1.0,
            upload_volume_factor: 1.0,
            minimum_ratio: None,
            minimum_seed_time: None,
            indexer_id: None,
            indexer_name: None,
        }
    }

    /// Check if this is a freeleech release
    pub fn is_freeleech(&self) -> bool {
        self.download_volume_factor == 0.0
    }

    /// Get the number of leechers
    pub fn leechers(&self) -> Option<i32> {
        match (self.peers, self.seeders) {
            (Some(peers), Some(seeders)) => Some(peers - seeders),
            _ => None,
        }
    }
}

impl Default for ReleaseInfo {
    fn default() -> Self {
        Self::new(String::new(), String::new(), Utc::now())
    }
}
