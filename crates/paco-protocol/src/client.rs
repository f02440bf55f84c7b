//! Session client wiring the cache, transport and services together

use paco_cache::{CacheKeyBuilder, CacheStats, Invalidator, ResultCache};
use std::sync::Arc;
use tracing::info;

use crate::config::ClientConfig;
use crate::data::DataService;
use crate::error::Result;
use crate::experiment::ExperimentService;
use crate::transport::HttpTransport;

/// One client session.
///
/// The result cache lives as long as the client and is shared by the
/// transport and the experiment service's invalidator.
pub struct PacoClient {
    config: ClientConfig,
    cache: Arc<ResultCache>,
    experiments: ExperimentService<HttpTransport>,
    data: DataService<HttpTransport>,
}

impl PacoClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let cache = Arc::new(ResultCache::new(&config.cache)?);
        let transport = Arc::new(HttpTransport::new(&config, Arc::clone(&cache))?);
        let invalidator = Invalidator::new(
            Arc::clone(&cache),
            CacheKeyBuilder::new(config.list_page_size),
        );

        info!("PACO client for {}", transport.base_url());

        Ok(Self {
            experiments: ExperimentService::new(
                Arc::clone(&transport),
                invalidator,
                config.app_id.clone(),
            ),
            data: DataService::new(transport, config.poll, config.data_page_size),
            cache,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn experiments(&self) -> &ExperimentService<HttpTransport> {
        &self.experiments
    }

    pub fn data(&self) -> &DataService<HttpTransport> {
        &self.data
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// End the session, dropping every cached response
    pub fn shutdown(self) -> CacheStats {
        let stats = self.cache.stats();
        self.cache.clear();
        info!(
            "Session closed: {} hits, {} misses ({:.1}% hit rate)",
            stats.hits,
            stats.misses,
            stats.hit_rate()
        );
        stats
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::PollConfig;
    use paco_cache::CacheConfig;

    #[test]
    fn test_new_rejects_invalid_cache_config() {
        let config = ClientConfig::default().with_cache(CacheConfig::default().with_max_entries(0));
        assert!(matches!(
            PacoClient::new(config),
            Err(crate::error::ProtocolError::Cache(_))
        ));
    }

    #[test]
    fn test_key_builder_uses_list_page_size() {
        let config = ClientConfig {
            list_page_size: 20,
            ..ClientConfig::default()
        };
        let client = PacoClient::new(config).unwrap();
        assert_eq!(client.experiments().key_builder().list_page_size(), 20);
        assert_eq!(client.cache_stats().entries, 0);
        assert_eq!(client.data().poll_config(), &PollConfig::default());
    }
}
