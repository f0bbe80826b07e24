//! Time-boxed memo of search results.
//!
//! Entries are keyed by the exact [`SearchParams`] and expire after the
//! configured TTL (one hour by default) or when the capacity is exceeded.
//! Errors and searches where any query failed are never cached, and
//! concurrent identical searches share one set of requests.

use crate::config::Config;
use crate::error::Result;
use crate::paper::Paper;
use crate::search::{SearchParams, Searcher};
use moka::future::Cache;
use std::sync::Arc;
use tracing::{debug, warn};

/// Results of a search with failed queries; handed back but not stored.
struct Incomplete(Arc<Vec<Paper>>);

/// [`Searcher`] wrapped with a memo cache.
#[derive(Clone)]
pub struct CachedSearcher {
    searcher: Searcher,
    cache: Cache<SearchParams, Arc<Vec<Paper>>>,
}

impl CachedSearcher {
    pub fn new(config: &Config) -> Result<Self> {
        let cache = Cache::builder()
            .max_capacity(config.cache_max_entries)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            searcher: Searcher::new(config)?,
            cache,
        })
    }

    /// Cached search; a hit returns the stored `Arc` without a network call.
    ///
    /// # Errors
    ///
    /// Validation errors are returned before the cache is consulted.
    pub async fn search(&self, params: &SearchParams) -> Result<Arc<Vec<Paper>>> {
        let plan = self.searcher.plan(params)?;

        let result = self
            .cache
            .try_get_with(params.clone(), async {
                debug!(keywords = %params.keywords, "Search cache miss");
                let outcome = self.searcher.execute(&plan, params.sort).await;
                let complete = outcome.is_complete();
                let papers = Arc::new(outcome.papers);
                if complete {
                    Ok(papers)
                } else {
                    Err(Incomplete(papers))
                }
            })
            .await;

        match result {
            Ok(papers) => Ok(papers),
            Err(incomplete) => {
                warn!(keywords = %params.keywords, "Search had failed queries, not caching");
                Ok(Arc::clone(&incomplete.0))
            }
        }
    }
}
