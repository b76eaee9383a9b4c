//! Training job control: submission, cancellation, status and log streaming.
//!
//! Transport is left to the embedding application through
//! [`TrainingBackend`]; this module owns the job state machine and decodes
//! the server-sent log stream.

mod control;
pub mod logs;
pub mod sse;
pub mod wire;


pub use control::{StreamEnd, TrainingBackend, TrainingControl, TrainingError, TrainingPhase};
pub use logs::{LogConsumer, Terminal};
pub use sse::{SseEvent, SseReader};
pub use wire::{BackendError, CancelResponse, StartResponse, StatusResponse};
