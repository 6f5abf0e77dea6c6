//! YAML-defined indexers
//!
//! Most sites differ only in data: where the search page lives, how the
//! keywords and categories are passed, and which site categories map to
//! which Torznab categories. A definition captures that data; the
//! [`DefinitionIndexer`] supplies the behavior.
//!
//! # YAML Definition Format
//!
//! ```yaml
//! id: example-tracker
//! name: Example Tracker
//! description: "An example private tracker"
//! language: en-US
//! type: private
//! links:
//!   - https://example-tracker.com/
//!
//! caps:
//!   categorymappings:
//!     - {id: "cat[]=1", cat: Movies/HD, desc: "HD Movies"}
//!     - {id: "cat[]=2", cat: TV/HD, desc: "HD TV Shows"}
//!   modes:
//!     search: [q]
//!     tv-search: [q, season, ep]
//!     movie-search: [q, imdbid]
//!
//! search:
//!   path: browse.php
//!   keywordsparam: search
//!   inputs:
//!     incldead: "1"
//! ```
//!
//! Category ids are opaque tokens. Without `categoryparam` they are
//! appended to the query string verbatim (`cat[]=1`); with
//! `categoryparam: c` each becomes `c=<token>`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::indexer::categories;
use crate::indexer::mapping::{CategoryError, CategoryMapBuilder};
use crate::indexer::normalize::normalize_release;
use crate::indexer::{
    Indexer, IndexerType, MovieSearchParam, ReleaseInfo, SearchRequest, SiteClient,
    TorznabCapabilities, TorznabQuery, TrackerType, TvSearchParam,
};

/// Errors raised while loading a definition
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to parse definition: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("definition '{id}' has an invalid category table: {source}")]
    Category {
        id: String,
        #[source]
        source: CategoryError,
    },

    #[error("definition '{0}' has no links")]
    NoLinks(String),

    #[error("failed to read definition {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// YAML indexer definition
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerDefinition {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(rename = "type")]
    pub tracker_type: Option<String>,
    pub links: Vec<String>,
    pub caps: Option<CapabilitiesBlock>,
    pub search: Option<SearchBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CapabilitiesBlock {
    #[serde(default)]
    pub categorymappings: Vec<CategoryMappingDef>,
    pub modes: Option<HashMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryMappingDef {
    /// Tracker token
    pub id: String,
    /// Torznab category name (`Movies/HD`) or numeric id
    pub cat: String,
    pub desc: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchBlock {
    pub path: Option<String>,
    pub keywordsparam: Option<String>,
    pub categoryparam: Option<String>,
    /// Fixed query parameters, emitted in key order
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
    #[serde(default)]
    pub freeleech: bool,
    pub minimumratio: Option<f64>,
    pub minimumseedtime: Option<i64>,
}

impl IndexerDefinition {
    /// Parse a definition from YAML content
    pub fn from_yaml(yaml_content: &str) -> Result<Self, DefinitionError> {
        let definition: IndexerDefinition = serde_yaml::from_str(yaml_content)?;
        if definition.links.is_empty() {
            return Err(DefinitionError::NoLinks(definition.id));
        }
        Ok(definition)
    }

    /// Read and parse a definition file
    pub fn from_file(path: &Path) -> Result<Self, DefinitionError> {
        let content = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Build capabilities, failing on any category the taxonomy lacks
    pub fn build_capabilities(&self) -> Result<TorznabCapabilities, DefinitionError> {
        let mut builder = CategoryMapBuilder::new();

        if let Some(ref caps_block) = self.caps {
            for mapping in &caps_block.categorymappings {
                let category = categories::find_by_name(&mapping.cat).ok_or_else(|| {
                    DefinitionError::Category {
                        id: self.id.clone(),
                        source: CategoryError::UnknownCategoryName(mapping.cat.clone()),
                    }
                })?;

                builder
                    .add_mapping(mapping.id.as_str(), category.id, mapping.desc.as_deref())
                    .map_err(|source| DefinitionError::Category {
                        id: self.id.clone(),
                        source,
                    })?;
            }
        }

        let mut caps = TorznabCapabilities::new(builder.build());

        if let Some(modes) = self.caps.as_ref().and_then(|c| c.modes.as_ref()) {
            caps.search_available = modes.contains_key("search") || modes.is_empty();
            if let Some(params) = modes.get("tv-search") {
                caps.tv_search_params = parse_params(params, TvSearchParam::Q, TvSearchParam::parse);
            }
            if let Some(params) = modes.get("movie-search") {
                caps.movie_search_params =
                    parse_params(params, MovieSearchParam::Q, MovieSearchParam::parse);
            }
            caps.music_search_available = modes.contains_key("music-search");
            caps.book_search_available = modes.contains_key("book-search");
        }

        Ok(caps)
    }
}

fn parse_params<P: PartialEq>(params: &[String], q: P, parse: fn(&str) -> Option<P>) -> Vec<P> {
    let mut result = vec![q];
    for param in params.iter().filter_map(|p| parse(p)) {
        if !result.contains(&param) {
            result.push(param);
        }
    }
    result
}

/// Indexer driven by an [`IndexerDefinition`]
pub struct DefinitionIndexer {
    definition: IndexerDefinition,
    search: SearchBlock,
    capabilities: TorznabCapabilities,
    site_link: String,
    client: Arc<dyn SiteClient>,
}

impl DefinitionIndexer {
    /// Create a new indexer from a parsed definition
    pub fn new(
        definition: IndexerDefinition,
        client: Arc<dyn SiteClient>,
    ) -> Result<Self, DefinitionError> {
        let site_link = definition
            .links
            .first()
            .cloned()
            .ok_or_else(|| DefinitionError::NoLinks(definition.id.clone()))?;

        let capabilities = definition.build_capabilities()?;
        let search = definition.search.clone().unwrap_or_default();

        tracing::debug!(
            indexer_id = %definition.id,
            categories = capabilities.categories.len(),
            "Created definition indexer"
        );

        Ok(Self {
            definition,
            search,
            capabilities,
            site_link,
            client,
        })
    }

    /// Build the site request for a query
    pub fn build_search_request(&self, query: &TorznabQuery) -> SearchRequest {
        let mut url = format!(
            "{}/{}",
            self.site_link.trim_end_matches('/'),
            self.search.path.as_deref().unwrap_or("").trim_start_matches('/')
        );

        let mut params: Vec<String> = self
            .search
            .inputs
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();

        let category_tokens = self
            .capabilities
            .map_torznab_to_tracker(&query.categories);
        for token in &category_tokens {
            match self.search.categoryparam {
                Some(ref param) => params.push(format!("{}={}", param, urlencoding::encode(token))),
                None => params.push(token.clone()),
            }
        }

        let mut keywords = query.keywords();
        if keywords.is_empty() {
            if let Some(ref imdb_id) = query.imdb_id {
                keywords = imdb_id.clone();
            }
        }
        if !keywords.is_empty() {
            let param = self.search.keywordsparam.as_deref().unwrap_or("q");
            params.push(format!("{}={}", param, urlencoding::encode(&keywords)));
        }

        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }

        SearchRequest {
            indexer_id: self.definition.id.clone(),
            url,
            keywords,
            category_tokens,
            referer: Some(self.site_link.clone()),
        }
    }
}

#[async_trait]
impl Indexer for DefinitionIndexer {
    fn id(&self) -> &str {
        &self.definition.id
    }

    fn name(&self) -> &str {
        &self.definition.name
    }

    fn description(&self) -> &str {
        self.definition.description.as_deref().unwrap_or("")
    }

    fn indexer_type(&self) -> IndexerType {
        IndexerType::Definition
    }

    fn site_link(&self) -> &str {
        &self.site_link
    }

    fn tracker_type(&self) -> TrackerType {
        self.definition
            .tracker_type
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or_default()
    }

    fn language(&self) -> &str {
        self.definition.language.as_deref().unwrap_or("en-US")
    }

    fn capabilities(&self) -> &TorznabCapabilities {
        &self.capabilities
    }

    async fn search(&self, query: &TorznabQuery) -> Result<Vec<ReleaseInfo>> {
        let request = self.build_search_request(query);
        tracing::debug!(indexer_id = %self.definition.id, url = %request.url, "Searching");

        let rows = self.client.fetch(&request).await?;

        let releases = rows
            .iter()
            .filter_map(|row| normalize_release(row, &self.site_link, &self.capabilities))
            .map(|mut release| {
                if self.search.freeleech {
                    release.download_volume_factor = 0.0;
                }
                release.minimum_ratio = self.search.minimumratio;
                release.minimum_seed_time = self.search.minimumseedtime;
                release
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            indexer_id = %self.definition.id,
            rows = rows.len(),
            releases = releases.len(),
            "Search finished"
        );

        Ok(releases)
    }
}
