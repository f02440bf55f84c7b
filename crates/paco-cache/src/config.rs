//! Result cache configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CacheError, CacheResult};

/// Store-level limits for the result cache
///
/// Both limits are off by default: entries live until they are invalidated
/// or the session ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached responses; the oldest insert is evicted first
    pub max_entries: Option<usize>,

    /// Time after which an entry is treated as absent
    pub ttl: Option<Duration>,
}

impl CacheConfig {
    /// Create cache configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            max_entries: std::env::var("PACO_CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|s| s.parse().ok()),
            ttl: std::env::var("PACO_CACHE_TTL")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
        }
    }

    /// Cap the number of cached responses
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Expire entries after `ttl`
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Reject zero limits
    pub fn validate(&self) -> CacheResult<()> {
        if self.max_entries == Some(0) {
            return Err(CacheError::InvalidConfiguration(
                "max_entries must be greater than zero".to_string(),
            ));
        }
        if self.ttl == Some(Duration::ZERO) {
            return Err(CacheError::InvalidConfiguration(
                "ttl must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
