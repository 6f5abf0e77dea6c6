//! Indexarr CLI
//!
//! Inspects the available indexers and their category tables.

mod cli;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use indexarr::config::{Config, LogFormat};
use indexarr::indexer::definitions::IndexerRegistry;
use indexarr::indexer::torznab::capabilities_xml;
use indexarr::indexer::{
    CategoryRef, Indexer, IndexerManager, RawRelease, SearchRequest, SiteClient, categories,
};

use crate::cli::{CliOptions, Command, USAGE};

/// Site client for a host without network access configured
struct OfflineClient;

#[async_trait]
impl SiteClient for OfflineClient {
    async fn fetch(&self, request: &SearchRequest) -> Result<Vec<RawRelease>> {
        Err(anyhow!(
            "No site client configured for {}",
            request.indexer_id
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed(),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "indexarr=info".into()),
        )
        .with(fmt_layer)
        .init();

    let options = CliOptions::from_args()?;

    let registry = IndexerRegistry::load(config.definitions_path.as_deref())?;
    let manager = IndexerManager::new(config.max_concurrent_searches)
        .with_timeout(config.search_timeout);

    let client: Arc<dyn SiteClient> = Arc::new(OfflineClient);
    for info in registry.available() {
        match registry.create(&info.id, client.clone(), HashMap::new()) {
            Ok(indexer) => manager.register(indexer),
            Err(e) => {
                tracing::warn!(indexer_id = %info.id, error = %e, "Failed to create indexer");
            }
        }
    }

    match options.command {
        Command::Help => println!("{}", USAGE),
        Command::List => {
            for info in registry.available() {
                let categories = manager
                    .get(&info.id)
                    .map(|i| i.capabilities().categories.len())
                    .unwrap_or_default();
                println!(
                    "{:<12} {:<10} {:<12} {:>4} categories  {}",
                    info.id,
                    info.indexer_type.to_string(),
                    info.tracker_type,
                    categories,
                    info.site_link
                );
            }
        }
        Command::Caps { indexer } => {
            let indexer = manager
                .get(&indexer)
                .ok_or_else(|| anyhow!("Unknown indexer: {}", indexer))?;
            println!("{}", capabilities_xml(indexer.name(), indexer.capabilities()));
        }
        Command::Resolve {
            indexer,
            categories,
            exact,
        } => {
            let indexer = manager
                .get(&indexer)
                .ok_or_else(|| anyhow!("Unknown indexer: {}", indexer))?;
            let caps = indexer.capabilities();
            let tokens = if exact {
                caps.categories.resolve_request_categories(&categories)
            } else {
                caps.map_torznab_to_tracker(&categories)
            };
            for token in tokens {
                println!("{}", token);
            }
        }
        Command::Lookup { indexer, value } => {
            let indexer = manager
                .get(&indexer)
                .ok_or_else(|| anyhow!("Unknown indexer: {}", indexer))?;
            let map = &indexer.capabilities().categories;

            let mut ids = map.resolve_result_categories(CategoryRef::Token(&value));
            if ids.is_empty() {
                ids = map.resolve_result_categories(CategoryRef::Label(&value));
            }
            for id in ids {
                let name = categories::get_category(id).map(|c| c.name).unwrap_or("?");
                println!("{} {}", id, name);
            }
        }
    }

    Ok(())
}
