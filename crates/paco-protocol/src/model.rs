//! Wire entities exchanged with the platform

use chrono::{DateTime, TimeZone};
use paco_cache::ExperimentId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Format of `responseTime` on submitted events
pub const RESPONSE_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S%z";

/// An experiment definition.
///
/// Only the fields the client acts on are typed; everything else the server
/// sends is kept in `fields` and written back unchanged on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ExperimentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Experiment {
    /// The id a save should treat as an update; zero counts as unsaved.
    pub fn saved_id(&self) -> Option<ExperimentId> {
        self.id.filter(|id| *id != 0)
    }
}

/// One answered input within an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventResponse {
    pub name: String,
    pub answer: Value,
}

/// Event posted when the current user joins an experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<ExperimentId>,
    pub app_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment_version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment_name: Option<String>,
    pub responses: Vec<EventResponse>,
    pub response_time: String,
}

impl JoinEvent {
    pub fn new<Tz>(experiment: &Experiment, app_id: &str, now: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            experiment_id: experiment.id,
            app_id: app_id.to_string(),
            experiment_version: experiment.version,
            experiment_name: experiment.title.clone(),
            responses: vec![EventResponse {
                name: "joined".to_string(),
                answer: Value::Bool(true),
            }],
            response_time: format_response_time(now),
        }
    }
}

pub fn format_response_time<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    time.format(RESPONSE_TIME_FORMAT).to_string()
}

/// Per-participant signal counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecord {
    #[serde(default)]
    pub today_signal_response_count: i64,

    #[serde(default)]
    pub total_signal_response_count: i64,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Participant statistics payload with derived participant counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantStats {
    #[serde(default)]
    pub participants: Vec<ParticipantRecord>,

    #[serde(default)]
    pub today_participant_count: usize,

    #[serde(default)]
    pub total_participant_count: usize,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}
