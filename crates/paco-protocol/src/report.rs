//! Report requests and outcomes

use paco_cache::ExperimentId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Message carried by the outcome of a job that never completed
pub const EXCEEDED_MESSAGE: &str = "Exceeded max tries";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Answered inline on submission
    Json,
    /// Produced by a server-side job
    Csv,
    /// Produced by a server-side job
    Html,
}

impl ReportFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Html => "html",
        }
    }

    /// Whether the report is produced asynchronously and must be polled
    pub const fn is_job(self) -> bool {
        !matches!(self, Self::Json)
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "html" => Ok(Self::Html),
            other => Err(format!("unknown report format: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub experiment_id: ExperimentId,
    /// Restrict the report to one participant
    pub user: Option<String>,
    pub anonymized: bool,
    pub include_photos: bool,
    pub format: ReportFormat,
}

impl ReportRequest {
    pub fn new(experiment_id: ExperimentId, format: ReportFormat) -> Self {
        Self {
            experiment_id,
            user: None,
            anonymized: false,
            include_photos: false,
            format,
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    #[must_use]
    pub fn with_anonymized(mut self, anonymized: bool) -> Self {
        self.anonymized = anonymized;
        self
    }

    #[must_use]
    pub fn with_photos(mut self, include_photos: bool) -> Self {
        self.include_photos = include_photos;
        self
    }
}

/// Final result of a report request.
///
/// Serializes as `{"data": ...}` or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportOutcome {
    Data(String),
    Error(String),
}

impl ReportOutcome {
    pub fn exceeded() -> Self {
        Self::Error(EXCEEDED_MESSAGE.to_string())
    }

    pub fn data(&self) -> Option<&str> {
        match self {
            Self::Data(data) => Some(data),
            Self::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}
