//! In-memory caching using moka
//!
//! Each generated proposal costs one external model call, so rendered
//! content is cached per quote id. A "new quote" action invalidates
//! everything.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use tracing::info;

use crate::proposal::ProposalContent;

/// Application cache holding generated proposal content
#[derive(Clone)]
pub struct ProposalCache {
    /// Proposal content (quote id -> content)
    proposals: Cache<String, Arc<ProposalContent>>,
}

impl ProposalCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Proposals: 100 entries, 1 hour TTL, 20 min idle
            proposals: Cache::builder()
                .max_capacity(100)
                .time_to_live(Duration::from_secs(60 * 60))
                .time_to_idle(Duration::from_secs(20 * 60))
                .build(),
        }
    }

    pub async fn get(&self, quote_id: &str) -> Option<Arc<ProposalContent>> {
        self.proposals.get(quote_id).await
    }

    pub async fn insert(&self, quote_id: String, content: Arc<ProposalContent>) {
        self.proposals.insert(quote_id, content).await;
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            proposals_cached: self.proposals.entry_count(),
        }
    }

    /// Invalidate all cached proposal content
    pub fn invalidate_all(&self) {
        self.proposals.invalidate_all();
        info!("Proposal cache invalidated");
    }
}

impl Default for ProposalCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub proposals_cached: u64,
}
