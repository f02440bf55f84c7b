//! Configuration structures for the platform client

use paco_cache::CacheConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default platform base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Value of the `pacoProtocol` header sent with every request
pub const DEFAULT_PROTOCOL_VERSION: u32 = 4;

/// Page size appended as `limit=` to limited list reads
pub const DEFAULT_LIST_PAGE_SIZE: u32 = 50;

/// Page size appended as `limit=` to event reads
pub const DEFAULT_DATA_PAGE_SIZE: u32 = 100;

/// `appId` reported in join events
pub const DEFAULT_APP_ID: &str = "webform";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Platform base URL; endpoints are appended verbatim
    pub base_url: String,

    /// Protocol version header value
    pub protocol_version: u32,

    pub list_page_size: u32,

    pub data_page_size: u32,

    pub app_id: String,

    /// Per-request timeout; `None` leaves requests unbounded
    pub request_timeout: Option<Duration>,

    /// Report job polling
    pub poll: PollConfig,

    /// Result cache limits
    pub cache: CacheConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
            data_page_size: DEFAULT_DATA_PAGE_SIZE,
            app_id: DEFAULT_APP_ID.to_string(),
            request_timeout: None,
            poll: PollConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Unset or unparseable variables fall back to their defaults.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("PACO_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            protocol_version: std::env::var("PACO_PROTOCOL_VERSION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PROTOCOL_VERSION),
            list_page_size: std::env::var("PACO_LIST_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_LIST_PAGE_SIZE),
            data_page_size: std::env::var("PACO_DATA_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DATA_PAGE_SIZE),
            app_id: DEFAULT_APP_ID.to_string(),
            request_timeout: std::env::var("PACO_REQUEST_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            poll: PollConfig::from_env(),
            cache: CacheConfig::from_env(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

/// Report job polling schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Fixed delay between status polls
    pub interval: Duration,

    /// Status polls issued before giving up
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            max_attempts: 1000,
        }
    }
}

impl PollConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            interval: std::env::var("PACO_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(defaults.interval, Duration::from_millis),
            max_attempts: std::env::var("PACO_POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_attempts),
        }
    }

    /// Upper bound on time spent waiting between polls; `None` on overflow
    pub fn max_wait(&self) -> Option<Duration> {
        self.interval.checked_mul(self.max_attempts)
    }
}
