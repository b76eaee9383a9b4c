//! Control panel library for assembling, launching and monitoring object
//! detection training runs.
//!
//! The binary and the integration tests drive everything through these
//! modules; transport to the training server is left to implementors of
//! [`training::TrainingBackend`] and [`prediction::PredictionBackend`].

/// Application directory helpers.
pub mod app_dirs;
/// Versioned hyperparameter documents and their storage tiers.
pub mod config;
/// Tracing setup and the log panel buffer.
pub mod logging;
/// Training submission payload.
pub mod payload;
/// Prediction requests and result comparison.
pub mod prediction;
/// Negative sample selection and summary math.
pub mod selection;
/// Explicit per-activation panel state.
pub mod session;
/// TOML application settings.
pub mod settings;
/// Training job control and log streaming.
pub mod training;
