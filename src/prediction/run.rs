use crate::training::BackendError;

use super::compare::{ComparisonGroup, group_for_comparison};
use super::finder;
use super::models::ModelSelection;
use super::request::{PredictionBackend, PredictionError, PredictionRequest, PredictionSource};

#[derive(Debug, thiserror::Error)]
pub enum PredictionRunError {
    #[error(transparent)]
    Invalid(#[from] PredictionError),
    #[error("Prediction failed: {0}")]
    Backend(#[from] BackendError),
}

/// Run one prediction and group its images for comparison.
///
/// Ticked models are remembered for the next visit; with none ticked the
/// remembered list is used. Models the response has no entry for are looked
/// up in the latest run folder.
pub fn run_prediction(
    backend: &dyn PredictionBackend,
    selection: &ModelSelection,
    checked: &[String],
    source: PredictionSource,
    folder_path: Option<&str>,
) -> Result<Vec<ComparisonGroup>, PredictionRunError> {
    let models = selection.resolve(checked);
    let request = PredictionRequest::build(models, source, folder_path)?;
    if !checked.is_empty() && selection.save(checked).needs_warning() {
        tracing::warn!("Model selection was not saved durably");
    }
    tracing::info!(
        "Running prediction with {} model(s) from {}",
        request.models.len(),
        source.as_str()
    );
    let mut results = backend.predict(&request)?;
    finder::fill_missing(backend, &request.models, &mut results);
    Ok(group_for_comparison(&request.models, &results))
}
