//! Report generation poller
//!
//! A report request runs through an explicit state machine:
//!
//! ```text
//! Submitted ──json──────────────────────────────► Done
//!     │
//!     └─job id──► Polling{0} ──"pending\n"──► Polling{n+1} ──payload──► Done
//!                      │                           │
//!                      └────── n ≥ max_attempts ───┴─────────────────► Exceeded
//! ```
//!
//! Delays between polls go through a [`Scheduler`], so the attempt ceiling
//! and terminal states can be driven in tests without wall-clock waits.
//! [`ReportPoller::run`] consumes the poller and resolves exactly once.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::PollConfig;
use crate::endpoint;
use crate::error::{ProtocolError, Result};
use crate::report::{ReportOutcome, ReportRequest};
use crate::transport::Transport;

/// Body returned by the job status endpoint while a job is still running
pub const PENDING_SENTINEL: &[u8] = b"pending\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Done,
    Error,
}

/// A server-side report job, owned by the poller that created it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    pub result_payload: Option<String>,
}

impl Job {
    fn new(job_id: String) -> Self {
        Self {
            job_id,
            status: JobStatus::Pending,
            result_payload: None,
        }
    }
}

/// A status request issued for a job.
///
/// `attempt_number` runs from 1 to the configured maximum; the first poll is
/// issued without delay, later ones after the poll interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollAttempt {
    pub job_id: String,
    pub attempt_number: u32,
    pub scheduled_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Submitted,
    /// `attempt` status requests have been issued so far
    Polling { attempt: u32 },
    Done(String),
    Exceeded,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Exceeded)
    }
}

/// Timer used between status polls
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Wait out `delay` before the next poll. Dropping the future cancels the wait.
    async fn wait(&self, delay: Duration);
}

/// Scheduler backed by `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn wait(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Extract a job id from a submit response.
///
/// The server answers with the bare id, kept verbatim after trimming. Only a
/// quoted JSON string is unwrapped.
fn parse_job_id(body: &str) -> Result<String> {
    let trimmed = body.trim();
    let job_id = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::String(id)) => id,
        _ => trimmed.to_string(),
    };

    if job_id.is_empty() {
        return Err(ProtocolError::Parse("empty job id".to_string()));
    }
    Ok(job_id)
}

/// Drives one report request to completion
pub struct ReportPoller<'a, T: ?Sized, S: ?Sized> {
    transport: &'a T,
    scheduler: &'a S,
    config: PollConfig,
    request: ReportRequest,
    state: PollState,
    job: Option<Job>,
    attempts: Vec<PollAttempt>,
}

impl<'a, T, S> ReportPoller<'a, T, S>
where
    T: Transport + ?Sized,
    S: Scheduler + ?Sized,
{
    pub fn new(
        transport: &'a T,
        scheduler: &'a S,
        config: PollConfig,
        request: ReportRequest,
    ) -> Self {
        Self {
            transport,
            scheduler,
            config,
            request,
            state: PollState::Submitted,
            job: None,
            attempts: Vec::new(),
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// The job created by submission; `None` for inline reports
    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    /// Status requests issued so far, oldest first
    pub fn attempts(&self) -> &[PollAttempt] {
        &self.attempts
    }

    /// Advance the machine by one transition.
    ///
    /// A transport error leaves the state unchanged and is returned as is;
    /// nothing is retried. Stepping a terminal state is a no-op.
    pub async fn step(&mut self) -> Result<&PollState> {
        match self.state {
            PollState::Submitted => self.submit().await?,
            PollState::Polling { attempt } => self.poll(attempt).await?,
            PollState::Done(_) | PollState::Exceeded => {}
        }
        Ok(&self.state)
    }

    /// Step until a terminal state and resolve the outcome
    pub async fn run(mut self) -> Result<ReportOutcome> {
        while !self.state.is_terminal() {
            self.step().await?;
        }

        Ok(match self.state {
            PollState::Done(payload) => ReportOutcome::Data(payload),
            _ => ReportOutcome::exceeded(),
        })
    }

    async fn submit(&mut self) -> Result<()> {
        let submit = endpoint::report(&self.request);
        let response = self.transport.get(&submit, false).await?;

        if !self.request.format.is_job() {
            let body: serde_json::Value = response.json()?;
            let events = body
                .get("events")
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            debug!(
                "Inline report for experiment {}",
                self.request.experiment_id
            );
            self.state = PollState::Done(serde_json::to_string(&events)?);
            return Ok(());
        }

        let job_id = parse_job_id(&response.text()?)?;
        info!(
            "Report job {} submitted for experiment {}",
            job_id, self.request.experiment_id
        );
        self.job = Some(Job::new(job_id));
        self.state = PollState::Polling { attempt: 0 };
        Ok(())
    }

    async fn poll(&mut self, attempt: u32) -> Result<()> {
        let Some(job) = self.job.as_mut() else {
            return Err(ProtocolError::Parse("polling without a job".to_string()));
        };

        if attempt >= self.config.max_attempts {
            warn!("Report job {} exceeded {} polls", job.job_id, attempt);
            job.status = JobStatus::Error;
            self.state = PollState::Exceeded;
            return Ok(());
        }

        let attempt = attempt + 1;
        self.attempts.push(PollAttempt {
            job_id: job.job_id.clone(),
            attempt_number: attempt,
            scheduled_delay: if attempt == 1 {
                Duration::ZERO
            } else {
                self.config.interval
            },
        });
        let response = self
            .transport
            .get(&endpoint::job_status(&job.job_id), false)
            .await?;

        if response.body.as_ref() == PENDING_SENTINEL {
            debug!("Report job {} pending after poll {}", job.job_id, attempt);
            self.state = PollState::Polling { attempt };
            self.scheduler.wait(self.config.interval).await;
            return Ok(());
        }

        let payload = response.text()?.trim().to_string();
        info!("Report job {} done after {} polls", job.job_id, attempt);
        job.status = JobStatus::Done;
        job.result_payload = Some(payload.clone());
        self.state = PollState::Done(payload);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::report::ReportFormat;
    use crate::transport::TransportResponse;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use reqwest::StatusCode;
    use std::collections::VecDeque;

    /// Answers GETs from a script and records every endpoint requested
    #[derive(Default)]
    struct ScriptedTransport {
        submit: Mutex<Option<Bytes>>,
        statuses: Mutex<VecDeque<Bytes>>,
        repeat_pending: bool,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(submit: &'static [u8], statuses: &[&'static [u8]]) -> Self {
            Self {
                submit: Mutex::new(Some(Bytes::from_static(submit))),
                statuses: Mutex::new(statuses.iter().map(|s| Bytes::from_static(*s)).collect()),
                ..Self::default()
            }
        }

        fn always_pending(submit: &'static [u8]) -> Self {
            Self {
                submit: Mutex::new(Some(Bytes::from_static(submit))),
                repeat_pending: true,
                ..Self::default()
            }
        }

        fn status_requests(&self) -> usize {
            self.requests
                .lock()
                .iter()
                .filter(|endpoint| endpoint.starts_with("/jobStatus"))
                .count()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, endpoint: &str, cacheable: bool) -> Result<TransportResponse> {
            assert!(!cacheable, "report requests are never cached");
            self.requests.lock().push(endpoint.to_string());

            let body = if endpoint.starts_with("/events") {
                self.submit.lock().take()
            } else if self.repeat_pending {
                Some(Bytes::from_static(PENDING_SENTINEL))
            } else {
                self.statuses.lock().pop_front()
            };

            body.map(|body| TransportResponse::new(StatusCode::OK, body))
                .ok_or(ProtocolError::HttpStatus(StatusCode::NOT_FOUND))
        }

        async fn post(
            &self,
            _endpoint: &str,
            _body: Option<serde_json::Value>,
        ) -> Result<TransportResponse> {
            unreachable!("reports never post")
        }
    }

    /// Records requested delays and returns immediately
    #[derive(Default)]
    struct RecordingScheduler {
        scheduled: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Scheduler for RecordingScheduler {
        async fn wait(&self, delay: Duration) {
            self.scheduled.lock().push(delay);
        }
    }

    fn csv_request() -> ReportRequest {
        ReportRequest::new(7, ReportFormat::Csv)
    }

    #[tokio::test]
    async fn test_json_report_resolves_without_polling() {
        let transport = ScriptedTransport::new(br#"{"events":[{"a":1}],"cursor":"x"}"#, &[]);
        let scheduler = RecordingScheduler::default();
        let request = ReportRequest::new(7, ReportFormat::Json);

        let outcome = ReportPoller::new(&transport, &scheduler, PollConfig::default(), request)
            .run()
            .await
            .unwrap();

        assert_eq!(outcome, ReportOutcome::Data(r#"[{"a":1}]"#.to_string()));
        assert_eq!(transport.status_requests(), 0);
        assert!(scheduler.scheduled.lock().is_empty());
    }

    #[tokio::test]
    async fn test_pending_then_done() {
        let transport = ScriptedTransport::new(b"J1", &[PENDING_SENTINEL, b"42.0,1\n"]);
        let scheduler = RecordingScheduler::default();
        let mut poller =
            ReportPoller::new(&transport, &scheduler, PollConfig::default(), csv_request());

        assert_eq!(poller.step().await.unwrap(), &PollState::Polling { attempt: 0 });
        assert_eq!(poller.job().unwrap().job_id, "J1");

        assert_eq!(poller.step().await.unwrap(), &PollState::Polling { attempt: 1 });
        assert_eq!(
            scheduler.scheduled.lock().as_slice(),
            &[Duration::from_millis(3000)]
        );

        assert_eq!(
            poller.step().await.unwrap(),
            &PollState::Done("42.0,1".to_string())
        );
        assert_eq!(
            poller.attempts(),
            &[
                PollAttempt {
                    job_id: "J1".to_string(),
                    attempt_number: 1,
                    scheduled_delay: Duration::ZERO,
                },
                PollAttempt {
                    job_id: "J1".to_string(),
                    attempt_number: 2,
                    scheduled_delay: Duration::from_millis(3000),
                },
            ]
        );
        let job = poller.job().unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.result_payload.as_deref(), Some("42.0,1"));

        assert_eq!(
            poller.run().await.unwrap(),
            ReportOutcome::Data("42.0,1".to_string())
        );
        assert_eq!(
            transport.requests.lock().as_slice(),
            &[
                "/events?q='experimentId=7'&csv&cmdline=1".to_string(),
                "/jobStatus?jobId=J1&cmdline=1".to_string(),
                "/jobStatus?jobId=J1&cmdline=1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_ceiling_stops_after_max_attempts() {
        let transport = ScriptedTransport::always_pending(b"J2\n");
        let scheduler = RecordingScheduler::default();
        let mut poller =
            ReportPoller::new(&transport, &scheduler, PollConfig::default(), csv_request());

        while !poller.state().is_terminal() {
            poller.step().await.unwrap();
        }

        assert_eq!(poller.state(), &PollState::Exceeded);
        assert_eq!(poller.job().unwrap().status, JobStatus::Error);
        assert_eq!(transport.status_requests(), 1000);
        assert_eq!(scheduler.scheduled.lock().len(), 1000);

        let attempts = poller.attempts();
        assert_eq!(attempts.len(), 1000);
        assert!(attempts.iter().all(|a| (1..=1000).contains(&a.attempt_number)));
        assert_eq!(attempts.last().unwrap().attempt_number, 1000);

        assert_eq!(
            poller.run().await.unwrap(),
            ReportOutcome::Error("Exceeded max tries".to_string())
        );
    }

    #[tokio::test]
    async fn test_pending_sentinel_is_exact() {
        let transport = ScriptedTransport::new(b"J3", &[b"pending"]);
        let scheduler = RecordingScheduler::default();

        let outcome =
            ReportPoller::new(&transport, &scheduler, PollConfig::default(), csv_request())
                .run()
                .await
                .unwrap();

        assert_eq!(outcome, ReportOutcome::Data("pending".to_string()));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let transport = ScriptedTransport::new(b"J4", &[PENDING_SENTINEL]);
        let scheduler = RecordingScheduler::default();
        let mut poller =
            ReportPoller::new(&transport, &scheduler, PollConfig::default(), csv_request());

        poller.step().await.unwrap();
        poller.step().await.unwrap();
        let err = poller.step().await.unwrap_err();

        assert!(err.is_transport());
        assert_eq!(poller.state(), &PollState::Polling { attempt: 1 });
    }

    #[tokio::test]
    async fn test_terminal_step_is_noop() {
        let transport = ScriptedTransport::new(b"J5", &[b"done"]);
        let scheduler = RecordingScheduler::default();
        let mut poller =
            ReportPoller::new(&transport, &scheduler, PollConfig::default(), csv_request());

        while !poller.state().is_terminal() {
            poller.step().await.unwrap();
        }
        let requests = transport.requests.lock().len();
        poller.step().await.unwrap();
        assert_eq!(transport.requests.lock().len(), requests);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_waits_interval() {
        let start = tokio::time::Instant::now();
        TokioScheduler.wait(Duration::from_millis(3000)).await;
        assert!(start.elapsed() >= Duration::from_millis(3000));
    }

    #[test]
    fn test_parse_job_id() {
        assert_eq!(parse_job_id("J1\n").unwrap(), "J1");
        assert_eq!(parse_job_id("\"abc\"").unwrap(), "abc");
        assert_eq!(parse_job_id("12345").unwrap(), "12345");
        assert!(parse_job_id("  ").is_err());
    }

    #[test]
    fn test_numeric_job_ids_kept_verbatim() {
        assert_eq!(parse_job_id("1e5").unwrap(), "1e5");
        assert_eq!(
            parse_job_id("123456789012345678901234\n").unwrap(),
            "123456789012345678901234"
        );
        assert_eq!(parse_job_id("10.50").unwrap(), "10.50");
        assert_eq!(
            endpoint::job_status(&parse_job_id("1e5").unwrap()),
            "/jobStatus?jobId=1e5&cmdline=1"
        );
    }
}
