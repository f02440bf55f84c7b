//! Endpoint strings for writes, reports and participant data
//!
//! Experiment reads go through [`paco_cache::CacheKeyBuilder`] so that the
//! read path and the invalidation path derive byte-identical keys.

use paco_cache::{EXPERIMENTS_PATH, ExperimentId, QueryBuilder};

use crate::report::ReportRequest;

pub const EVENTS_PATH: &str = "/events";
pub const JOB_STATUS_PATH: &str = "/jobStatus";
pub const PARTICIPANT_STATS_PATH: &str = "/participantStats";

/// Save target; the entity travels in the body
pub fn save() -> String {
    EXPERIMENTS_PATH.to_string()
}

pub fn delete(id: ExperimentId) -> String {
    QueryBuilder::new(EXPERIMENTS_PATH)
        .param("delete", 1)
        .param("id", id)
        .build()
}

/// Join target; the join event travels in the body
pub fn join() -> String {
    EVENTS_PATH.to_string()
}

/// The `q` filter for event queries: `'experimentId=<id>[:who=<user>]'`
fn event_filter(experiment_id: ExperimentId, user: Option<&str>) -> String {
    match user {
        Some(user) => format!("'experimentId={experiment_id}:who={user}'"),
        None => format!("'experimentId={experiment_id}'"),
    }
}

/// Report job submission
pub fn report(request: &ReportRequest) -> String {
    QueryBuilder::new(EVENTS_PATH)
        .param(
            "q",
            event_filter(request.experiment_id, request.user.as_deref()),
        )
        .flag(request.format.as_str())
        .param("cmdline", 1)
        .param_if(request.anonymized, "anon", true)
        .param_if(request.include_photos, "includePhotos", true)
        .build()
}

pub fn job_status(job_id: &str) -> String {
    QueryBuilder::new(JOB_STATUS_PATH)
        .param("jobId", job_id)
        .param("cmdline", 1)
        .build()
}

/// One page of raw events in JSON
pub fn events(
    experiment_id: ExperimentId,
    user: Option<&str>,
    anonymized: bool,
    page_size: u32,
    cursor: Option<&str>,
) -> String {
    QueryBuilder::new(EVENTS_PATH)
        .param("q", event_filter(experiment_id, user))
        .flag("json")
        .param("includePhotos", true)
        .param_if(anonymized, "anon", true)
        .param("limit", page_size)
        .param_opt("cursor", cursor)
        .build()
}

pub fn participant_stats(experiment_id: ExperimentId, user: Option<&str>) -> String {
    QueryBuilder::new(PARTICIPANT_STATS_PATH)
        .param("experimentId", experiment_id)
        .param_opt("who", user)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportFormat;

    #[test]
    fn test_write_endpoints() {
        assert_eq!(save(), "/experiments");
        assert_eq!(delete(42), "/experiments?delete=1&id=42");
        assert_eq!(join(), "/events");
    }

    #[test]
    fn test_report_endpoint() {
        let request = ReportRequest::new(7, ReportFormat::Csv)
            .with_user("a@b.c")
            .with_anonymized(true)
            .with_photos(true);
        assert_eq!(
            report(&request),
            "/events?q='experimentId=7:who=a@b.c'&csv&cmdline=1&anon=true&includePhotos=true"
        );

        let plain = ReportRequest::new(7, ReportFormat::Json);
        assert_eq!(report(&plain), "/events?q='experimentId=7'&json&cmdline=1");
    }

    #[test]
    fn test_job_status_endpoint() {
        assert_eq!(job_status("J1"), "/jobStatus?jobId=J1&cmdline=1");
    }

    #[test]
    fn test_events_endpoint() {
        assert_eq!(
            events(3, None, false, 100, None),
            "/events?q='experimentId=3'&json&includePhotos=true&limit=100"
        );
        assert_eq!(
            events(3, Some("u@x.y"), true, 100, Some("abc")),
            "/events?q='experimentId=3:who=u@x.y'&json&includePhotos=true&anon=true&limit=100&cursor=abc"
        );
    }

    #[test]
    fn test_participant_stats_endpoint() {
        assert_eq!(
            participant_stats(5, None),
            "/participantStats?experimentId=5"
        );
        assert_eq!(
            participant_stats(5, Some("u@x.y")),
            "/participantStats?experimentId=5&who=u@x.y"
        );
    }
}
