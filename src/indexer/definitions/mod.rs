//! Indexer definitions and implementations
//!
//! This module contains native Rust implementations of torrent indexers
//! as well as the YAML definition engine.
//!
//! # Adding a new indexer
//!
//! Sites that only need a category table and a search URL get a YAML file
//! in `definitions/` and a line in `BUNDLED_DEFINITIONS`. Sites that need
//! custom request logic get a native implementation:
//!
//! 1. Create a new file in this directory (e.g., `myindexer.rs`)
//! 2. Implement the `Indexer` trait for your indexer
//! 3. Add it to the `AVAILABLE_INDEXERS` list
//! 4. Construct it in `IndexerRegistry::create`

pub mod definition;
pub mod iptorrents;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use once_cell::sync::Lazy;

pub use definition::{DefinitionError, DefinitionIndexer, IndexerDefinition};
pub use iptorrents::IPTorrentsIndexer;

use super::{Indexer, IndexerType, SiteClient};

/// Definitions compiled into the binary
static BUNDLED_DEFINITIONS: &[(&str, &str)] = &[
    ("pretome", include_str!("../../../definitions/pretome.yml")),
    ("scenetime", include_str!("../../../definitions/scenetime.yml")),
    ("zonaq", include_str!("../../../definitions/zonaq.yml")),
];

/// Information about an available indexer type
#[derive(Debug, Clone, serde::Serialize)]
pub struct IndexerTypeInfo {
    /// Unique identifier for this indexer type (e.g., "iptorrents")
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Type: "private", "public", "semi-private"
    pub tracker_type: String,
    /// Language code
    pub language: String,
    /// Primary site URL
    pub site_link: String,
    /// Optional settings
    pub optional_settings: &'static [SettingDefinition],
    pub indexer_type: IndexerType,
}

/// Definition of a configurable setting
#[derive(Debug, Clone, serde::Serialize)]
pub struct SettingDefinition {
    pub key: &'static str,
    pub label: &'static str,
    pub default_value: Option<&'static str>,
    pub options: Option<&'static [(&'static str, &'static str)]>,
}

/// List of all available native indexer types
pub static AVAILABLE_INDEXERS: Lazy<Vec<IndexerTypeInfo>> = Lazy::new(|| {
    vec![IndexerTypeInfo {
        id: "iptorrents".to_string(),
        name: "IPTorrents".to_string(),
        description: "IPTorrents is a Private site. Always a step ahead.".to_string(),
        tracker_type: "private".to_string(),
        language: "en-US".to_string(),
        site_link: "https://iptorrents.com/".to_string(),
        optional_settings: &[
            SettingDefinition {
                key: "freeleech",
                label: "Search freeleech only",
                default_value: Some("false"),
                options: None,
            },
            SettingDefinition {
                key: "sort",
                label: "Sort requested from site",
                default_value: Some("time"),
                options: Some(&[
                    ("time", "Created"),
                    ("size", "Size"),
                    ("seeders", "Seeders"),
                    ("name", "Title"),
                ]),
            },
        ],
        indexer_type: IndexerType::Native,
    }]
});

/// Parse every bundled definition.
///
/// Bundled files ship with the crate, so any failure here is a bug and is
/// returned instead of skipped.
pub fn bundled_definitions() -> Result<Vec<IndexerDefinition>, DefinitionError> {
    BUNDLED_DEFINITIONS
        .iter()
        .map(|(_, yaml)| IndexerDefinition::from_yaml(yaml))
        .collect()
}

/// Load `*.yml` / `*.yaml` definitions from a directory.
///
/// Files that fail to parse are logged and skipped; only an unreadable
/// directory is an error. Files are read in name order.
pub fn load_definitions_dir(path: &Path) -> Result<Vec<IndexerDefinition>, DefinitionError> {
    let read_dir = std::fs::read_dir(path).map_err(|source| DefinitionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut files: Vec<_> = read_dir
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext == "yml" || ext == "yaml")
        })
        .collect();
    files.sort();

    let mut definitions = Vec::with_capacity(files.len());
    for file in files {
        match IndexerDefinition::from_file(&file).and_then(|def| {
            // Validate the category table now rather than on first use
            def.build_capabilities().map(|_| def)
        }) {
            Ok(definition) => definitions.push(definition),
            Err(e) => {
                tracing::warn!(
                    path = %file.display(),
                    error = %e,
                    "Skipping invalid indexer definition"
                );
            }
        }
    }

    tracing::info!(
        path = %path.display(),
        count = definitions.len(),
        "Loaded indexer definitions"
    );

    Ok(definitions)
}

/// Every indexer type that can be created, keyed by id
pub struct IndexerRegistry {
    definitions: BTreeMap<String, IndexerDefinition>,
}

impl IndexerRegistry {
    /// Registry with the bundled definitions only
    pub fn bundled() -> Result<Self, DefinitionError> {
        let mut registry = Self {
            definitions: BTreeMap::new(),
        };
        for definition in bundled_definitions()? {
            registry.add_definition(definition);
        }
        Ok(registry)
    }

    /// Registry with the bundled definitions plus those found in `path`.
    /// A user definition replaces a bundled one with the same id.
    pub fn load(path: Option<&Path>) -> Result<Self, DefinitionError> {
        let mut registry = Self::bundled()?;
        if let Some(path) = path {
            for definition in load_definitions_dir(path)? {
                registry.add_definition(definition);
            }
        }
        Ok(registry)
    }

    pub fn add_definition(&mut self, definition: IndexerDefinition) {
        if AVAILABLE_INDEXERS.iter().any(|i| i.id == definition.id) {
            tracing::warn!(
                indexer_id = %definition.id,
                "Definition id is taken by a native indexer, ignoring"
            );
            return;
        }
        self.definitions.insert(definition.id.clone(), definition);
    }

    /// Information about all available indexer types, natives first
    pub fn available(&self) -> Vec<IndexerTypeInfo> {
        let definitions = self.definitions.values().map(|def| IndexerTypeInfo {
            id: def.id.clone(),
            name: def.name.clone(),
            description: def.description.clone().unwrap_or_default(),
            tracker_type: def
                .tracker_type
                .clone()
                .unwrap_or_else(|| "private".to_string()),
            language: def.language.clone().unwrap_or_else(|| "en-US".to_string()),
            site_link: def.links.first().cloned().unwrap_or_default(),
            optional_settings: &[],
            indexer_type: IndexerType::Definition,
        });

        AVAILABLE_INDEXERS.iter().cloned().chain(definitions).collect()
    }

    /// Get information about a specific indexer type
    pub fn info(&self, id: &str) -> Option<IndexerTypeInfo> {
        self.available().into_iter().find(|i| i.id == id)
    }

    pub fn definition(&self, id: &str) -> Option<&IndexerDefinition> {
        self.definitions.get(id)
    }

    /// Create an indexer instance by type id
    pub fn create(
        &self,
        id: &str,
        client: Arc<dyn SiteClient>,
        settings: HashMap<String, String>,
    ) -> Result<Arc<dyn Indexer>> {
        let indexer: Arc<dyn Indexer> = match id {
            "iptorrents" => Arc::new(IPTorrentsIndexer::new(
                settings.get("site_url").cloned(),
                settings,
                client,
            )?),
            _ => {
                let definition = self
                    .definitions
                    .get(id)
                    .cloned()
                    .ok_or_else(|| anyhow!("Unknown indexer type: {}", id))?;
                Arc::new(DefinitionIndexer::new(definition, client)?)
            }
        };

        tracing::info!(
            indexer_id = %indexer.id(),
            indexer_type = %indexer.indexer_type(),
            "Created indexer"
        );

        Ok(indexer)
    }
}
