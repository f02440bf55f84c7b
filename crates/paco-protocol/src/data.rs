//! Event data, reports and participant statistics
//!
//! None of these reads are cached.

use paco_cache::ExperimentId;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::config::PollConfig;
use crate::endpoint;
use crate::error::Result;
use crate::model::ParticipantStats;
use crate::poller::{ReportPoller, Scheduler, TokioScheduler};
use crate::report::{ReportOutcome, ReportRequest};
use crate::transport::Transport;

pub struct DataService<T: ?Sized, S = TokioScheduler> {
    transport: Arc<T>,
    scheduler: S,
    poll: PollConfig,
    data_page_size: u32,
}

impl<T: Transport + ?Sized> DataService<T> {
    pub fn new(transport: Arc<T>, poll: PollConfig, data_page_size: u32) -> Self {
        Self::with_scheduler(transport, TokioScheduler, poll, data_page_size)
    }
}

impl<T, S> DataService<T, S>
where
    T: Transport + ?Sized,
    S: Scheduler,
{
    pub fn with_scheduler(
        transport: Arc<T>,
        scheduler: S,
        poll: PollConfig,
        data_page_size: u32,
    ) -> Self {
        Self {
            transport,
            scheduler,
            poll,
            data_page_size,
        }
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// One page of raw events as JSON
    pub async fn events(
        &self,
        experiment_id: ExperimentId,
        user: Option<&str>,
        anonymized: bool,
        cursor: Option<&str>,
    ) -> Result<Value> {
        let endpoint = endpoint::events(
            experiment_id,
            user,
            anonymized,
            self.data_page_size,
            cursor,
        );
        self.transport.get(&endpoint, false).await?.json()
    }

    /// Generate a report, polling the job until it completes.
    ///
    /// Each call runs its own poller; concurrent calls for the same experiment
    /// are not merged.
    pub async fn report(&self, request: ReportRequest) -> Result<ReportOutcome> {
        debug!(
            "Report {} for experiment {}",
            request.format, request.experiment_id
        );
        ReportPoller::new(
            self.transport.as_ref(),
            &self.scheduler,
            self.poll,
            request,
        )
        .run()
        .await
    }

    /// Participant statistics with today/total participant counts filled in
    pub async fn participant_stats(
        &self,
        experiment_id: ExperimentId,
        user: Option<&str>,
    ) -> Result<ParticipantStats> {
        let endpoint = endpoint::participant_stats(experiment_id, user);
        let stats: ParticipantStats = self.transport.get(&endpoint, false).await?.json()?;
        Ok(stats.with_counts())
    }
}
