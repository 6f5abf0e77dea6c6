//! Torznab request parsing
//!
//! Parses query parameters into TorznabQuery structs.

use anyhow::{Result, anyhow};
use serde::Deserialize;

use crate::indexer::{QueryType, TorznabQuery};

/// Torznab API request parameters
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct TorznabRequest {
    /// Query type: search, tvsearch, movie, music, book, caps
    pub t: Option<String>,
    /// Search query
    pub q: Option<String>,
    /// API key
    pub apikey: Option<String>,
    /// Categories (comma-separated)
    pub cat: Option<String>,
    /// Result limit
    pub limit: Option<String>,
    /// Result offset
    pub offset: Option<String>,
    /// Whether to use cache
    pub cache: Option<String>,

    // TV-specific
    /// Season number
    pub season: Option<String>,
    /// Episode number
    pub ep: Option<String>,
    /// IMDB ID
    pub imdbid: Option<String>,
    /// TVDB ID
    pub tvdbid: Option<String>,
    /// TMDB ID
    pub tmdbid: Option<String>,

    // Common
    pub year: Option<String>,
    pub genre: Option<String>,
}

impl TorznabRequest {
    /// Parse a raw query string (`t=search&q=dune&cat=2000,5040`).
    ///
    /// Unknown keys are ignored. A repeated key is an error.
    pub fn from_query_string(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str(query.trim_start_matches('?'))
    }

    /// Requested Torznab category ids, in request order
    pub fn categories(&self) -> Vec<i32> {
        self.cat
            .as_ref()
            .map(|c| c.split(',').filter_map(|s| s.trim().parse().ok()).collect())
            .unwrap_or_default()
    }

    /// Convert to a TorznabQuery
    pub fn to_query(&self) -> Result<TorznabQuery> {
        let query_type = match self.t.as_deref() {
            None => QueryType::Search,
            Some(t) => t
                .parse()
                .map_err(|_| anyhow!("Unknown query type: {}", t))?,
        };

        // Parse limit/offset
        let limit = self.limit.as_ref().and_then(|s| s.parse().ok());
        let offset = self.offset.as_ref().and_then(|s| s.parse().ok());

        // Parse cache flag
        let cache = self
            .cache
            .as_ref()
            .map(|s| s.to_lowercase() != "false" && s != "0")
            .unwrap_or(true);

        Ok(TorznabQuery {
            query_type,
            search_term: self.q.clone().filter(|q| !q.trim().is_empty()),
            categories: self.categories(),
            limit,
            offset,
            cache,

            // TV-specific
            season: self.season.as_ref().and_then(|s| s.parse().ok()),
            episode: self.ep.clone(),
            imdb_id: self.normalize_imdb_id(),
            tvdb_id: self.tvdbid.as_ref().and_then(|s| s.parse().ok()),
            tmdb_id: self.tmdbid.as_ref().and_then(|s| s.parse().ok()),

            // Common
            year: self.year.as_ref().and_then(|s| s.parse().ok()),
            genre: self.genre.clone(),
        })
    }

    /// Normalize IMDB ID to include "tt" prefix
    fn normalize_imdb_id(&self) -> Option<String> {
        self.imdbid.as_ref().map(|id| {
            let id = id.trim();
            if id.starts_with("tt") {
                id.to_string()
            } else {
                format!("tt{:0>7}", id.trim_start_matches('0'))
            }
        })
    }
}
