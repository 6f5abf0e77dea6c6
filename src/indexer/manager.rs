//! Indexer Manager
//!
//! The IndexerManager is responsible for:
//! - Keeping the set of configured indexer instances
//! - Orchestrating searches across multiple indexers
//! - Rate limiting to avoid tracker bans

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use parking_lot::RwLock;
use tokio::sync::Semaphore;

use super::{Indexer, IndexerSearchResult, TorznabQuery};

/// Default maximum concurrent searches per indexer
pub const MAX_CONCURRENT_SEARCHES: usize = 2;

/// Manages all configured indexer instances
pub struct IndexerManager {
    /// Indexer instances in registration order
    indexers: RwLock<Vec<Arc<dyn Indexer>>>,
    /// Rate limiting semaphores per indexer
    rate_limiters: RwLock<HashMap<String, Arc<Semaphore>>>,
    max_concurrent: usize,
    timeout: Option<Duration>,
}

impl Default for IndexerManager {
    fn default() -> Self {
        Self::new(MAX_CONCURRENT_SEARCHES)
    }
}

impl IndexerManager {
    /// Create a new IndexerManager
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            indexers: RwLock::new(Vec::new()),
            rate_limiters: RwLock::new(HashMap::new()),
            max_concurrent: max_concurrent.max(1),
            timeout: None,
        }
    }

    /// Give up on an indexer that takes longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add an indexer, replacing any indexer with the same id
    pub fn register(&self, indexer: Arc<dyn Indexer>) {
        let id = indexer.id().to_string();

        {
            let mut indexers = self.indexers.write();
            match indexers.iter().position(|i| i.id() == id) {
                Some(pos) => indexers[pos] = indexer.clone(),
                None => indexers.push(indexer.clone()),
            }
        }

        self.rate_limiters
            .write()
            .insert(id.clone(), Arc::new(Semaphore::new(self.max_concurrent)));

        tracing::info!(
            indexer_id = %id,
            indexer_name = %indexer.name(),
            indexer_type = %indexer.indexer_type(),
            categories = indexer.capabilities().categories.len(),
            "Registered indexer"
        );
    }

    /// Remove an indexer
    pub fn unregister(&self, id: &str) -> bool {
        let removed = {
            let mut indexers = self.indexers.write();
            let before = indexers.len();
            indexers.retain(|i| i.id() != id);
            indexers.len() != before
        };
        self.rate_limiters.write().remove(id);
        removed
    }

    /// Get a registered indexer by id
    pub fn get(&self, id: &str) -> Option<Arc<dyn Indexer>> {
        self.indexers.read().iter().find(|i| i.id() == id).cloned()
    }

    /// Get all registered indexers
    pub fn list(&self) -> Vec<Arc<dyn Indexer>> {
        self.indexers.read().clone()
    }

    /// Search across all indexers that can handle the query.
    ///
    /// Returns one result per searched indexer, in registration order.
    pub async fn search_all(&self, query: &TorznabQuery) -> Vec<IndexerSearchResult> {
        let ids: Vec<String> = self.indexers.read().iter().map(|i| i.id().to_string()).collect();
        self.search_indexers(&ids, query).await
    }

    /// Search specific indexers
    pub async fn search_indexers(
        &self,
        indexer_ids: &[String],
        query: &TorznabQuery,
    ) -> Vec<IndexerSearchResult> {
        let indexers: Vec<_> = self
            .indexers
            .read()
            .iter()
            .filter(|idx| indexer_ids.iter().any(|id| id == idx.id()))
            .filter(|idx| {
                let handles = idx.can_handle_query(query);
                if !handles {
                    tracing::debug!(
                        indexer_id = %idx.id(),
                        query_type = %query.query_type,
                        categories = ?query.categories,
                        "Indexer cannot handle query, skipping"
                    );
                }
                handles
            })
            .cloned()
            .collect();

        let searches = indexers.into_iter().map(|indexer| {
            let rate_limiter = self.rate_limiters.read().get(indexer.id()).cloned();
            Self::search_single(indexer, query, rate_limiter, self.timeout)
        });

        join_all(searches).await
    }

    /// Search a single indexer
    async fn search_single(
        indexer: Arc<dyn Indexer>,
        query: &TorznabQuery,
        rate_limiter: Option<Arc<Semaphore>>,
        timeout: Option<Duration>,
    ) -> IndexerSearchResult {
        let start = Instant::now();

        // Acquire rate limit permit
        let _permit = match rate_limiter {
            Some(ref limiter) => limiter.acquire().await.ok(),
            None => None,
        };

        let outcome = match timeout {
            Some(limit) => match tokio::time::timeout(limit, indexer.search(query)).await {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!("Search timed out after {:?}", limit)),
            },
            None => indexer.search(query).await,
        };

        match outcome {
            Ok(mut releases) => {
                // Add indexer info to releases
                for release in &mut releases {
                    release.indexer_id = Some(indexer.id().to_string());
                    release.indexer_name = Some(indexer.name().to_string());
                }

                IndexerSearchResult {
                    indexer_id: indexer.id().to_string(),
                    indexer_name: indexer.name().to_string(),
                    releases,
                    elapsed_ms: start.elapsed().as_millis() as u64,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(
                    indexer_id = indexer.id(),
                    indexer_name = indexer.name(),
                    error = %e,
                    "Search failed"
                );

                IndexerSearchResult {
                    indexer_id: indexer.id().to_string(),
                    indexer_name: indexer.name().to_string(),
                    releases: vec![],
                    elapsed_ms: start.elapsed().as_millis() as u64,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;

    use super::*;
    use crate::indexer::categories::cats;
    use crate::indexer::mapping::{CategoryMap, CategoryMapping};
    use crate::indexer::{IndexerType, ReleaseInfo, TorznabCapabilities, TrackerType};

    struct StubIndexer {
        id: &'static str,
        capabilities: TorznabCapabilities,
        fail: bool,
        delay: Option<Duration>,
    }

    impl StubIndexer {
        fn new(id: &'static str, cat: i32) -> Self {
            let map = CategoryMap::from_entries(&[CategoryMapping::without_description("1", cat)])
                .unwrap();
            Self {
                id,
                capabilities: TorznabCapabilities::new(map),
                fail: false,
                delay: None,
            }
        }
    }

    #[async_trait]
    impl Indexer for StubIndexer {
        fn id(&self) -> &str {
            self.id
        }
        fn name(&self) -> &str {
            self.id
        }
        fn description(&self) -> &str {
            ""
        }
        fn indexer_type(&self) -> IndexerType {
            IndexerType::Native
        }
        fn site_link(&self) -> &str {
            "https://stub.example/"
        }
        fn tracker_type(&self) -> TrackerType {
            TrackerType::Public
        }
        fn language(&self) -> &str {
            "en-US"
        }
        fn capabilities(&self) -> &TorznabCapabilities {
            &self.capabilities
        }

        async fn search(&self, _query: &TorznabQuery) -> Result<Vec<ReleaseInfo>> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                anyhow::bail!("site unreachable");
            }
            Ok(vec![ReleaseInfo::new(
                format!("{} release", self.id),
                format!("{}-1", self.id),
                chrono::Utc::now(),
            )])
        }
    }

    #[test]
    fn test_register_replaces_same_id() {
        let manager = IndexerManager::default();
        manager.register(Arc::new(StubIndexer::new("a", cats::MOVIES)));
        manager.register(Arc::new(StubIndexer::new("b", cats::TV)));
        manager.register(Arc::new(StubIndexer::new("a", cats::AUDIO)));

        let ids: Vec<_> = manager.list().iter().map(|i| i.id().to_string()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(manager.get("a").unwrap().capabilities().categories.supports(cats::AUDIO));

        assert!(manager.unregister("a"));
        assert!(!manager.unregister("a"));
        assert!(manager.get("a").is_none());
    }

    #[tokio::test]
    async fn test_search_all_skips_indexers_without_matching_categories() {
        let manager = IndexerManager::default();
        manager.register(Arc::new(StubIndexer::new("movies", cats::MOVIES_HD)));
        manager.register(Arc::new(StubIndexer::new("tv", cats::TV_HD)));

        let query = TorznabQuery::search("x").with_categories(vec![cats::TV]);
        let results = manager.search_all(&query).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].indexer_id, "tv");
        assert_eq!(results[0].releases[0].indexer_id.as_deref(), Some("tv"));
    }

    #[tokio::test]
    async fn test_search_all_reports_failures() {
        let manager = IndexerManager::default();
        manager.register(Arc::new(StubIndexer {
            fail: true,
            ..StubIndexer::new("broken", cats::MOVIES)
        }));
        manager.register(Arc::new(StubIndexer::new("ok", cats::MOVIES)));

        let results = manager.search_all(&TorznabQuery::search("x")).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].error.as_deref(), Some("site unreachable"));
        assert!(results[0].releases.is_empty());
        assert!(results[1].error.is_none());
        assert_eq!(results[1].releases.len(), 1);
    }

    #[tokio::test]
    async fn test_search_timeout() {
        let manager = IndexerManager::default().with_timeout(Duration::from_millis(20));
        manager.register(Arc::new(StubIndexer {
            delay: Some(Duration::from_secs(60)),
            ..StubIndexer::new("slow", cats::MOVIES)
        }));

        let results = manager.search_all(&TorznabQuery::search("x")).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].error.as_deref(), Some("Search timed out after 20ms"));
    }
}
