//! Experiment reads and mutations
//!
//! Reads are cached under the key the [`CacheKeyBuilder`] derives for the
//! logical request. Mutations invalidate synchronously before the write is
//! sent, so a read issued after the mutation resolves cannot be served the
//! purged entry.

use chrono::Local;
use paco_cache::{
    CacheKeyBuilder, ExperimentId, Invalidator, ListType, LogicalRequest, MutationEvent,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::endpoint;
use crate::error::Result;
use crate::model::{Experiment, JoinEvent};
use crate::transport::{Transport, TransportResponse};

pub struct ExperimentService<T: ?Sized> {
    transport: Arc<T>,
    invalidator: Invalidator,
    app_id: String,
}

impl<T: Transport + ?Sized> ExperimentService<T> {
    pub fn new(transport: Arc<T>, invalidator: Invalidator, app_id: impl Into<String>) -> Self {
        Self {
            transport,
            invalidator,
            app_id: app_id.into(),
        }
    }

    pub fn key_builder(&self) -> &CacheKeyBuilder {
        self.invalidator.key_builder()
    }

    /// Fetch a logical read through the cache
    pub async fn read(&self, request: &LogicalRequest) -> Result<TransportResponse> {
        let key = self.key_builder().build(request);
        self.transport.get(key.as_str(), true).await
    }

    /// One page of experiments of the given list type.
    ///
    /// With `limit` set the configured page size is requested.
    pub async fn list(
        &self,
        list_type: ListType,
        limit: bool,
        cursor: Option<&str>,
    ) -> Result<Value> {
        let request = LogicalRequest::list(list_type, limit, cursor.map(str::to_string));
        self.read(&request).await?.json()
    }

    pub async fn get(&self, id: ExperimentId) -> Result<Value> {
        self.read(&LogicalRequest::detail(id)).await?.json()
    }

    /// Create or update an experiment.
    ///
    /// An experiment without an id purges the limited admin list; one with an
    /// id purges only its own detail entry.
    pub async fn save(&self, experiment: &Experiment) -> Result<TransportResponse> {
        let event = MutationEvent::for_save(experiment.saved_id());
        self.invalidator.apply(&event);
        info!("Saving experiment {:?}", experiment.id);

        let body = serde_json::to_value(experiment)?;
        self.transport.post(&endpoint::save(), Some(body)).await
    }

    /// Delete an experiment; the standard lists are purged whatever the id.
    pub async fn delete(&self, id: ExperimentId) -> Result<TransportResponse> {
        self.invalidator.apply(&MutationEvent::Delete { id });
        info!("Deleting experiment {}", id);

        self.transport.post(&endpoint::delete(id), None).await
    }

    /// Post a join event for the current user. The cache is left untouched.
    pub async fn join(&self, experiment: &Experiment) -> Result<TransportResponse> {
        let event = JoinEvent::new(experiment, &self.app_id, &Local::now());
        if let Some(experiment_id) = experiment.id {
            self.invalidator
                .apply(&MutationEvent::Join { experiment_id });
        }
        debug!("Joining experiment {:?}", experiment.id);

        let body = serde_json::to_value(&event)?;
        self.transport.post(&endpoint::join(), Some(body)).await
    }

    /// Drop the cached first page of one list view
    pub fn invalidate_list(&self, list_type: ListType, limit: bool) -> bool {
        self.invalidator
            .invalidate(&LogicalRequest::list(list_type, limit, None))
    }

    /// Drop the admin-limited, joined-unlimited and mine-limited lists
    pub fn invalidate_lists(&self) -> usize {
        self.invalidator.invalidate_standard_lists()
    }
}
