//! Request-shaped response caching for the PACO experiment platform client
//!
//! Read responses are cached under the exact endpoint string used to fetch
//! them. This crate owns three pieces of that arrangement:
//!
//! - **Key building** ([`CacheKeyBuilder`], [`QueryBuilder`]): turns a logical
//!   read ([`LogicalRequest`]) into the byte-exact endpoint string. Query
//!   parameters are emitted in a fixed order so equal requests always produce
//!   equal keys.
//! - **Storage** ([`ResultCache`]): a session-scoped keyed store shared by
//!   every component that reads or invalidates cached responses.
//! - **Invalidation** ([`InvalidationPolicy`], [`Invalidator`]): maps each
//!   mutating operation to the finite set of keys that must be purged before
//!   the mutation is sent.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   LogicalRequest   ┌──────────────────┐
//! │ CacheKeyBuilder  │ ─────────────────▶ │ CacheKey         │
//! └──────────────────┘                    └────────┬─────────┘
//!                                                  │
//! ┌──────────────────┐   MutationEvent    ┌────────▼─────────┐
//! │ Invalidator      │ ─────────────────▶ │ ResultCache      │
//! │ (policy + keys)  │      remove        │ (DashMap store)  │
//! └──────────────────┘                    └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use paco_cache::{
//!     CacheConfig, CacheKeyBuilder, Invalidator, ListType, LogicalRequest, MutationEvent,
//!     ResultCache,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = Arc::new(ResultCache::new(&CacheConfig::default())?);
//! let keys = CacheKeyBuilder::new(50);
//!
//! let admin = LogicalRequest::list(ListType::Admin, true, None);
//! let key = keys.build(&admin);
//! assert_eq!(key.as_str(), "/experiments?admin&limit=50");
//!
//! cache.put(key.clone(), Bytes::from_static(b"[]"));
//!
//! // Creating an experiment purges the limited admin list.
//! let invalidator = Invalidator::new(Arc::clone(&cache), keys);
//! invalidator.apply(&MutationEvent::Create);
//! assert!(!cache.contains(key.as_str()));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod invalidation;
pub mod key;
pub mod stats;
pub mod store;

pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use invalidation::{InvalidationPolicy, Invalidator, MutationEvent};
pub use key::{
    CacheKey, CacheKeyBuilder, DetailRequest, EXPERIMENTS_PATH, ExperimentId, ListRequest, ListType,
    LogicalRequest, QueryBuilder,
};
pub use stats::CacheStats;
pub use store::ResultCache;
