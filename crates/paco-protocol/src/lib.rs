//! # paco-protocol - Client for the PACO experiment platform
//!
//! Talks to a PACO server over HTTP: experiment listing and detail reads,
//! experiment saves, deletes and joins, paged event data, report generation
//! and participant statistics.
//!
//! ## Architecture Overview
//!
//! 1. **Transport** ([`Transport`], [`HttpTransport`]): reqwest client that
//!    sends the `pacoProtocol` header and serves cacheable GETs from the
//!    session [`ResultCache`](paco_cache::ResultCache)
//! 2. **Experiment Service** ([`ExperimentService`]): cached reads plus
//!    mutations that apply the invalidation policy before writing
//! 3. **Data Service** ([`DataService`]): uncached event, report and
//!    participant statistics reads
//! 4. **Report Poller** ([`ReportPoller`]): the submit/poll state machine for
//!    background report jobs
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use paco_cache::ListType;
//! use paco_protocol::{ClientConfig, PacoClient, ReportFormat, ReportRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PacoClient::new(ClientConfig::from_env())?;
//!
//! let admin = client.experiments().list(ListType::Admin, true, None).await?;
//! println!("{admin}");
//!
//! let outcome = client
//!     .data()
//!     .report(ReportRequest::new(42, ReportFormat::Csv))
//!     .await?;
//! println!("{outcome:?}");
//!
//! client.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Transport failures surface as [`ProtocolError`] from the single call that
//! issued the request; nothing is retried. A report job that never finishes
//! is not an error: it resolves to [`ReportOutcome::Error`] with
//! `"Exceeded max tries"`.

pub mod client;
pub mod config;
pub mod data;
pub mod endpoint;
pub mod error;
pub mod experiment;
pub mod model;
pub mod poller;
pub mod report;
pub mod stats;
pub mod transport;

pub use client::PacoClient;
pub use config::{ClientConfig, PollConfig};
pub use data::DataService;
pub use error::{ProtocolError, Result};
pub use experiment::ExperimentService;
pub use model::{EventResponse, Experiment, JoinEvent, ParticipantRecord, ParticipantStats};
pub use poller::{
    Job, JobStatus, PENDING_SENTINEL, PollAttempt, PollState, ReportPoller, Scheduler,
    TokioScheduler,
};
pub use report::{EXCEEDED_MESSAGE, ReportFormat, ReportOutcome, ReportRequest};
pub use stats::{ParticipantCounts, aggregate_participants};
pub use transport::{HttpTransport, Transport, TransportResponse};
