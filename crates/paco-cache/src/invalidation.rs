//! Invalidation policy for mutating operations
//!
//! Only the keys needed to keep the create and delete paths correct are
//! purged:
//!
//! | Mutation              | Purged keys                                   |
//! |-----------------------|-----------------------------------------------|
//! | create (no id)        | admin list, limited                           |
//! | update (has id)       | `id=<id>` detail                              |
//! | delete                | admin limited, joined unlimited, mine limited |
//! | join                  | nothing                                       |
//!
//! An update that renames an experiment leaves every list view stale, and a
//! create does not purge the joined or mine lists. Deleting leaves the detail
//! entry in place. These gaps are accepted and must stay as they are; callers
//! rely on the exact set of purged keys.

use std::sync::Arc;
use tracing::debug;

use crate::key::{CacheKey, CacheKeyBuilder, ExperimentId, ListType, LogicalRequest};
use crate::store::ResultCache;

/// A mutating operation that may require cache invalidation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationEvent {
    /// Save of an experiment without an identifier
    Create,
    /// Save of an experiment that already has an identifier
    Update {
        /// Experiment being saved
        id: ExperimentId,
    },
    /// Deletion of an experiment
    Delete {
        /// Experiment being deleted
        id: ExperimentId,
    },
    /// The current user joining an experiment
    Join {
        /// Experiment being joined
        experiment_id: ExperimentId,
    },
}

impl MutationEvent {
    /// Classify a save by whether the entity already carries an id
    pub fn for_save(id: Option<ExperimentId>) -> Self {
        match id {
            Some(id) => Self::Update { id },
            None => Self::Create,
        }
    }
}

/// Maps mutations to the logical reads whose cache entries must be purged
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidationPolicy;

impl InvalidationPolicy {
    /// The three canonical list views purged together on delete
    pub fn standard_lists() -> [LogicalRequest; 3] {
        [
            LogicalRequest::list(ListType::Admin, true, None),
            LogicalRequest::list(ListType::Joined, false, None),
            LogicalRequest::list(ListType::Mine, true, None),
        ]
    }

    /// Logical reads purged for `event`
    pub fn targets(event: &MutationEvent) -> Vec<LogicalRequest> {
        match *event {
            MutationEvent::Create => vec![LogicalRequest::list(ListType::Admin, true, None)],
            MutationEvent::Update { id } => vec![LogicalRequest::detail(id)],
            MutationEvent::Delete { .. } => Self::standard_lists().to_vec(),
            MutationEvent::Join { .. } => Vec::new(),
        }
    }
}

/// Applies the invalidation policy to a shared result cache
#[derive(Debug, Clone)]
pub struct Invalidator {
    cache: Arc<ResultCache>,
    keys: CacheKeyBuilder,
}

impl Invalidator {
    /// Invalidator over `cache`, deriving keys with `keys`
    pub fn new(cache: Arc<ResultCache>, keys: CacheKeyBuilder) -> Self {
        Self { cache, keys }
    }

    /// The shared cache
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Key builder shared with the read path
    pub fn key_builder(&self) -> &CacheKeyBuilder {
        &self.keys
    }

    /// Remove exactly the entry at the request's derived key.
    ///
    /// Returns whether an entry was present.
    pub fn invalidate(&self, request: &LogicalRequest) -> bool {
        let key = self.keys.build(request);
        let removed = self.cache.remove(key.as_str());
        debug!("Invalidated {} (present: {})", key, removed);
        removed
    }

    /// Remove the admin-limited, joined-unlimited and mine-limited lists.
    ///
    /// Returns the number of entries that were present.
    pub fn invalidate_standard_lists(&self) -> usize {
        InvalidationPolicy::standard_lists()
            .iter()
            .filter(|request| self.invalidate(request))
            .count()
    }

    /// Purge the keys the policy assigns to `event`.
    ///
    /// Returns the targeted keys whether or not they were cached.
    pub fn apply(&self, event: &MutationEvent) -> Vec<CacheKey> {
        let targets = InvalidationPolicy::targets(event);
        if targets.is_empty() {
            debug!("No invalidation for {:?}", event);
        }

        targets
            .iter()
            .map(|request| {
                self.invalidate(request);
                self.keys.build(request)
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use bytes::Bytes;

    fn invalidator() -> Invalidator {
        let cache = Arc::new(ResultCache::new(&CacheConfig::default()).expect("valid config"));
        Invalidator::new(cache, CacheKeyBuilder::new(50))
    }

    fn fill_key_space(invalidator: &Invalidator) {
        let keys = invalidator.key_builder();
        for list_type in ListType::ALL {
            for limit in [true, false] {
                invalidator.cache().put(
                    keys.build(&LogicalRequest::list(list_type, limit, None)),
                    Bytes::from_static(b"[]"),
                );
            }
        }
        for id in [1, 2] {
            invalidator.cache().put(
                keys.build(&LogicalRequest::detail(id)),
                Bytes::from_static(b"{}"),
            );
        }
    }

    fn remaining(invalidator: &Invalidator) -> Vec<String> {
        let mut keys: Vec<String> = invalidator
            .cache()
            .keys()
            .into_iter()
            .map(CacheKey::into_string)
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_standard_lists_are_three_fixed_keys() {
        let invalidator = invalidator();
        fill_key_space(&invalidator);

        assert_eq!(invalidator.invalidate_standard_lists(), 3);
        assert_eq!(
            remaining(&invalidator),
            vec![
                "/experiments?admin",
                "/experiments?id=1",
                "/experiments?id=2",
                "/experiments?joined&limit=50",
                "/experiments?mine",
            ]
        );
    }

    #[test]
    fn test_create_purges_only_admin_limited() {
        let invalidator = invalidator();
        fill_key_space(&invalidator);

        let purged = invalidator.apply(&MutationEvent::for_save(None));
        assert_eq!(purged, vec![CacheKey::from("/experiments?admin&limit=50")]);
        assert_eq!(invalidator.cache().len(), 7);
        assert!(!invalidator.cache().contains("/experiments?admin&limit=50"));
    }

    #[test]
    fn test_update_purges_only_detail() {
        let invalidator = invalidator();
        fill_key_space(&invalidator);

        let purged = invalidator.apply(&MutationEvent::for_save(Some(2)));
        assert_eq!(purged, vec![CacheKey::from("/experiments?id=2")]);
        assert_eq!(invalidator.cache().len(), 7);
        assert!(invalidator.cache().contains("/experiments?id=1"));
    }

    #[test]
    fn test_delete_ignores_id() {
        for id in [1, 2, 999] {
            let invalidator = invalidator();
            fill_key_space(&invalidator);

            let purged = invalidator.apply(&MutationEvent::Delete { id });
            assert_eq!(
                purged,
                vec![
                    CacheKey::from("/experiments?admin&limit=50"),
                    CacheKey::from("/experiments?joined"),
                    CacheKey::from("/experiments?mine&limit=50"),
                ]
            );
            assert!(invalidator.cache().contains("/experiments?id=1"));
            assert!(invalidator.cache().contains("/experiments?id=2"));
            assert_eq!(invalidator.cache().len(), 5);
        }
    }

    #[test]
    fn test_join_purges_nothing() {
        let invalidator = invalidator();
        fill_key_space(&invalidator);

        assert!(
            invalidator
                .apply(&MutationEvent::Join { experiment_id: 1 })
                .is_empty()
        );
        assert_eq!(invalidator.cache().len(), 8);
    }

    #[test]
    fn test_invalidate_absent_key_is_noop() {
        let invalidator = invalidator();
        assert!(!invalidator.invalidate(&LogicalRequest::detail(5)));
        assert_eq!(invalidator.invalidate_standard_lists(), 0);
    }

    #[test]
    fn test_targets_stay_inside_key_space() {
        let events = [
            MutationEvent::Create,
            MutationEvent::Update { id: 3 },
            MutationEvent::Delete { id: 3 },
            MutationEvent::Join { experiment_id: 3 },
        ];
        for event in events {
            for target in InvalidationPolicy::targets(&event) {
                match target {
                    LogicalRequest::List(list) => assert!(list.cursor.is_none()),
                    LogicalRequest::Detail(_) => {}
                }
            }
        }
    }
}
