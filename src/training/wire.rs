//! Training endpoint paths and response bodies.

use serde::{Deserialize, Serialize};

pub const START_PATH: &str = "/train/start";
pub const CANCEL_PATH: &str = "/train/cancel";
pub const STATUS_PATH: &str = "/train/status";

const STARTED_STATUS: &str = "training_started_async";
const CANCELLED_STATUS: &str = "cancelled";

/// Path of the server-sent log stream for a job.
pub fn log_stream_path(job_id: &str) -> String {
    format!("/train/logs/{job_id}")
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Transport(String),
    #[error("Server returned {code}: {message}")]
    Status { code: u16, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StartResponse {
    pub fn started(job_id: impl Into<String>) -> Self {
        Self {
            status: STARTED_STATUS.to_string(),
            job_id: Some(job_id.into()),
            message: None,
        }
    }

    /// Job id when the server accepted the submission.
    pub fn accepted_job(&self) -> Option<&str> {
        if self.status != STARTED_STATUS {
            return None;
        }
        self.job_id.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl CancelResponse {
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self {
            status: CANCELLED_STATUS.to_string(),
            message: Some(message.into()),
        }
    }

    pub fn accepted(&self) -> bool {
        self.status == CANCELLED_STATUS
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

pub fn parse_start_response(body: &str) -> Result<StartResponse, BackendError> {
    parse_body(body)
}

pub fn parse_cancel_response(body: &str) -> Result<CancelResponse, BackendError> {
    parse_body(body)
}

pub fn parse_status_response(body: &str) -> Result<StatusResponse, BackendError> {
    parse_body(body)
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(BackendError::InvalidResponse("Empty response body".to_string()));
    }
    serde_json::from_str(trimmed)
        .map_err(|err| BackendError::InvalidResponse(format!("{err}: {trimmed}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_response_requires_async_status_and_job() {
        let ok = parse_start_response(r#"{"status":"training_started_async","job_id":"j-1"}"#)
            .unwrap();
        assert_eq!(ok.accepted_job(), Some("j-1"));

        let refused = parse_start_response(r#"{"status":"error","message":"busy"}"#).unwrap();
        assert_eq!(refused.accepted_job(), None);
        assert_eq!(refused.message.as_deref(), Some("busy"));

        let no_id = parse_start_response(r#"{"status":"training_started_async"}"#).unwrap();
        assert_eq!(no_id.accepted_job(), None);
    }

    #[test]
    fn cancel_and_status_bodies_parse() {
        let cancel = parse_cancel_response(r#"{"status":"cancelled","message":"stopping"}"#).unwrap();
        assert!(cancel.accepted());
        let status =
            parse_status_response(r#"{"is_active":true,"job_id":"j-9","status":"running"}"#)
                .unwrap();
        assert!(status.is_active);
        assert_eq!(status.job_id.as_deref(), Some("j-9"));
    }

    #[test]
    fn empty_or_garbled_bodies_are_errors() {
        assert!(matches!(
            parse_status_response("  "),
            Err(BackendError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_cancel_response("<html>"),
            Err(BackendError::InvalidResponse(_))
        ));
    }

    #[test]
    fn log_path_embeds_job() {
        assert_eq!(log_stream_path("exp-1"), "/train/logs/exp-1");
    }
}
