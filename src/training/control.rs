use std::io::BufRead;

use crate::payload::TrainingPayload;

use super::logs::{LogConsumer, Terminal};
use super::sse::SseReader;
use super::wire::{BackendError, CancelResponse, StartResponse, StatusResponse};

/// Remote side of training: submission, cancellation and status.
pub trait TrainingBackend {
    fn start(&self, payload: &TrainingPayload) -> Result<StartResponse, BackendError>;
    fn cancel(&self) -> Result<CancelResponse, BackendError>;
    fn status(&self) -> Result<StatusResponse, BackendError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("Training job {0} is already active")]
    AlreadyActive(String),
    #[error("No training job is active")]
    NotActive,
    #[error("Training was not started: {0}")]
    Rejected(String),
    #[error("Cancellation refused: {0}")]
    CancelRejected(String),
    #[error("Training backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("Log stream interrupted: {source}")]
    Stream {
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingPhase {
    Idle,
    Active {
        job_id: String,
        /// A cancel was accepted and the stream has not ended yet.
        cancel_pending: bool,
    },
}

/// How [`TrainingControl::follow_logs`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    Terminal(Terminal),
    /// Input ended before any sentinel arrived.
    Interrupted,
}

const INTERRUPTED_NOTE: &str = "[ERROR] Log connection interrupted.";

/// Idle/active state machine for one training job at a time.
pub struct TrainingControl<B> {
    backend: B,
    phase: TrainingPhase,
    logs: LogConsumer,
}

impl<B: TrainingBackend> TrainingControl<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            phase: TrainingPhase::Idle,
            logs: LogConsumer::new(),
        }
    }

    pub fn phase(&self) -> &TrainingPhase {
        &self.phase
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, TrainingPhase::Active { .. })
    }

    pub fn job_id(&self) -> Option<&str> {
        match &self.phase {
            TrainingPhase::Active { job_id, .. } => Some(job_id),
            TrainingPhase::Idle => None,
        }
    }

    pub fn logs(&self) -> &LogConsumer {
        &self.logs
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Ask the backend whether a job is already running and adopt it.
    pub fn check_initial_status(&mut self) -> Result<Option<&str>, TrainingError> {
        match self.backend.status() {
            Ok(status) => match status.job_id.filter(|_| status.is_active) {
                Some(job_id) => {
                    let state = status.status.unwrap_or_else(|| "unknown".to_string());
                    self.logs.panel_mut().notice(format!(
                        "Active training detected: {job_id} ({state}). Reconnecting to log..."
                    ));
                    self.activate(job_id);
                    Ok(self.job_id())
                }
                None => {
                    self.phase = TrainingPhase::Idle;
                    Ok(None)
                }
            },
            Err(err) => {
                tracing::warn!("Training status check failed: {err}");
                self.logs
                    .panel_mut()
                    .notice(format!("[ERROR] Failed to check status: {err}"));
                self.phase = TrainingPhase::Idle;
                Err(err.into())
            }
        }
    }

    /// Submit `payload` and return the job id the backend assigned.
    ///
    /// The control is active under the experiment name while the request is
    /// in flight; any failure returns it to idle.
    pub fn start(&mut self, payload: &TrainingPayload) -> Result<String, TrainingError> {
        if let Some(job_id) = self.job_id() {
            return Err(TrainingError::AlreadyActive(job_id.to_string()));
        }
        self.logs.restart(String::new());
        self.logs.panel_mut().notice(format!(
            "Preparing training... Job ID: {}",
            payload.exp_name
        ));
        self.activate(payload.exp_name.clone());

        let response = match self.backend.start(payload) {
            Ok(response) => response,
            Err(err) => {
                tracing::error!("Training submission failed: {err}");
                self.logs
                    .panel_mut()
                    .notice(format!("[ERROR] Network/API error: {err}"));
                self.phase = TrainingPhase::Idle;
                return Err(err.into());
            }
        };
        match response.accepted_job().map(str::to_string) {
            Some(job_id) => {
                tracing::info!(job_id = %job_id, "Training started");
                self.activate(job_id.clone());
                Ok(job_id)
            }
            None => {
                let message = response
                    .message
                    .unwrap_or_else(|| "Failed to start training".to_string());
                tracing::warn!(status = %response.status, "Training rejected: {message}");
                self.logs
                    .panel_mut()
                    .notice(format!("[ERROR] {message}"));
                self.phase = TrainingPhase::Idle;
                Err(TrainingError::Rejected(message))
            }
        }
    }

    /// Request cancellation. Returns false when nothing is running.
    ///
    /// An accepted cancel keeps the job active; the log stream reports the
    /// end of the run.
    pub fn cancel(&mut self) -> Result<bool, TrainingError> {
        let Some(job_id) = self.job_id().map(str::to_string) else {
            return Ok(false);
        };
        self.set_cancel_pending(true);
        self.logs
            .panel_mut()
            .notice(format!("Sending cancel request for {job_id}..."));

        let result = self.backend.cancel();
        match result {
            Ok(response) if response.accepted() => {
                let message = response.message.unwrap_or_else(|| "Cancelled".to_string());
                self.logs.panel_mut().notice(format!(
                    "{message}. Waiting for the log stream to end..."
                ));
                Ok(true)
            }
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "Unknown error".to_string());
                self.logs
                    .panel_mut()
                    .notice(format!("[ERROR] Failed to cancel: {message}"));
                self.set_cancel_pending(false);
                Err(TrainingError::CancelRejected(message))
            }
            Err(err) => {
                tracing::warn!("Cancel request failed: {err}");
                self.logs
                    .panel_mut()
                    .notice(format!("[ERROR] Network error while cancelling: {err}"));
                self.set_cancel_pending(false);
                Err(err.into())
            }
        }
    }

    /// Consume the job's log stream until a sentinel, an error or the end of
    /// input. The control is idle afterwards in every case.
    pub fn follow_logs<R: BufRead>(&mut self, reader: R) -> Result<StreamEnd, TrainingError> {
        if !self.is_active() {
            return Err(TrainingError::NotActive);
        }
        for event in SseReader::new(reader) {
            let event = match event {
                Ok(event) => event,
                Err(source) => {
                    tracing::warn!("Training log stream failed: {source}");
                    self.interrupt();
                    return Err(TrainingError::Stream { source });
                }
            };
            if !event.is_message() {
                continue;
            }
            if let Some(terminal) = self.logs.push(&event.data) {
                self.phase = TrainingPhase::Idle;
                return Ok(StreamEnd::Terminal(terminal));
            }
        }
        tracing::warn!("Training log stream ended without a final status");
        self.interrupt();
        Ok(StreamEnd::Interrupted)
    }

    fn activate(&mut self, job_id: String) {
        self.phase = TrainingPhase::Active {
            job_id,
            cancel_pending: false,
        };
    }

    fn set_cancel_pending(&mut self, pending: bool) {
        if let TrainingPhase::Active { cancel_pending, .. } = &mut self.phase {
            *cancel_pending = pending;
        }
    }

    fn interrupt(&mut self) {
        self.logs.panel_mut().append(&format!("\n{INTERRUPTED_NOTE}\n"));
        self.phase = TrainingPhase::Idle;
    }
}
