//! Boundary between indexers and the code that talks to a site
//!
//! Indexers build a [`SearchRequest`] and hand it to a [`SiteClient`]. The
//! client owns everything site-transport related (HTTP, cookies, login,
//! HTML or JSON extraction) and returns one [`RawRelease`] per result row,
//! with values still in the site's own format. The indexer then normalizes
//! those rows.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::mapping::CategoryRef;

/// A fully built site search request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    /// Id of the indexer that built the request
    pub indexer_id: String,
    /// Absolute URL including the query string
    pub url: String,
    /// Keywords that went into the URL
    pub keywords: String,
    /// Tracker category tokens that went into the URL, in URL order
    pub category_tokens: Vec<String>,
    /// Referer header the site expects, if any
    pub referer: Option<String>,
}

/// Category value scraped from a result row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawCategory {
    /// The site's category id or parameter string
    Token(String),
    /// The category text as displayed by the site
    Label(String),
}

impl RawCategory {
    pub fn as_category_ref(&self) -> CategoryRef<'_> {
        match self {
            RawCategory::Token(token) => CategoryRef::Token(token),
            RawCategory::Label(label) => CategoryRef::Label(label),
        }
    }
}

/// One result row as extracted from a site, before normalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRelease {
    pub title: String,
    /// Details page, absolute or relative to the site link
    pub details: Option<String>,
    /// Download link, absolute or relative to the site link
    pub download: Option<String>,
    pub magnet: Option<String>,
    pub category: Option<RawCategory>,
    /// Size text, e.g. "1.4 GB"
    pub size: Option<String>,
    /// Absolute date or "3 hours ago"
    pub published: Option<String>,
    pub seeders: Option<String>,
    pub leechers: Option<String>,
    pub grabs: Option<String>,
    pub description: Option<String>,
    pub freeleech: bool,
    /// Upload multiplier shown by the site (2.0 for double upload)
    pub upload_factor: Option<f64>,
}

/// Performs site requests on behalf of an indexer
#[async_trait]
pub trait SiteClient: Send + Sync {
    /// Execute the request and return the extracted rows
    async fn fetch(&self, request: &SearchRequest) -> Result<Vec<RawRelease>>;
}
