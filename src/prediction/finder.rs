//! Image discovery for models a prediction response left out.
//!
//! The server writes each model's output under
//! `/predictions/<run>/<model>/predicao/`, so well-known file names can be
//! checked there directly.

use url::Url;

use super::request::{ModelImages, PredictionBackend, PredictionResults};

/// File names a prediction run usually writes for every model.
pub const KNOWN_IMAGE_NAMES: [&str; 7] = [
    "confusion_matrix.png",
    "confusion_matrix_normalized.png",
    "predictions.jpg",
    "pred.png",
    "result.png",
    "val_batch0_pred.jpg",
    "val_batch0_labels.jpg",
];

const WEIGHT_EXTENSIONS: [&str; 4] = ["pt", "pth", "onnx", "bin"];

/// Model name without its weights file extension.
pub fn model_stem(model: &str) -> &str {
    match model.rsplit_once('.') {
        Some((stem, ext))
            if WEIGHT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known)) =>
        {
            stem
        }
        _ => model,
    }
}

/// Server paths where `model`'s images would live inside run `run_dir`.
pub fn candidate_paths(run_dir: &str, model: &str) -> Vec<String> {
    let stem = model_stem(model);
    KNOWN_IMAGE_NAMES
        .iter()
        .filter_map(|&name| encoded_path(&["predictions", run_dir, stem, "predicao", name]))
        .collect()
}

fn encoded_path(segments: &[&str]) -> Option<String> {
    let mut url = Url::parse("http://localhost/").ok()?;
    url.path_segments_mut().ok()?.clear().extend(segments);
    Some(url.path().to_string())
}

/// Look up images for every model in `models` that `results` has no entry for.
///
/// Models whose candidates all come back missing stay absent.
pub fn fill_missing(
    backend: &dyn PredictionBackend,
    models: &[String],
    results: &mut PredictionResults,
) {
    let missing: Vec<&String> = models
        .iter()
        .filter(|model| !results.results_summary.contains_key(model.as_str()))
        .collect();
    if missing.is_empty() {
        return;
    }
    let run_dir = match backend.last_dir() {
        Ok(Some(dir)) if !dir.trim().is_empty() => dir,
        Ok(_) => {
            tracing::warn!("No prediction run folder found");
            return;
        }
        Err(err) => {
            tracing::warn!("Latest prediction run lookup failed: {err}");
            return;
        }
    };
    for model in missing {
        let images: Vec<String> = candidate_paths(&run_dir, model)
            .into_iter()
            .filter(|path| backend.image_exists(path))
            .collect();
        if images.is_empty() {
            tracing::warn!("No images found for model {}", model_stem(model));
            continue;
        }
        tracing::debug!(model = %model, found = images.len(), "Images located in {run_dir}");
        results
            .results_summary
            .insert(model.clone(), ModelImages { images });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_extensions_are_stripped() {
        assert_eq!(model_stem("best.pt"), "best");
        assert_eq!(model_stem("yolo.ONNX"), "yolo");
        assert_eq!(model_stem("v1.2"), "v1.2");
        assert_eq!(model_stem("plain"), "plain");
    }

    #[test]
    fn candidates_cover_every_known_name() {
        let paths = candidate_paths("predicao_20251110_153145", "best.pt");
        assert_eq!(paths.len(), KNOWN_IMAGE_NAMES.len());
        assert_eq!(
            paths[0],
            "/predictions/predicao_20251110_153145/best/predicao/confusion_matrix.png"
        );
        assert!(paths.iter().any(|path| path.ends_with("/val_batch0_pred.jpg")));
    }

    #[test]
    fn segments_are_percent_encoded() {
        let paths = candidate_paths("run 1", "a/b");
        assert_eq!(paths[0], "/predictions/run%201/a%2Fb/predicao/confusion_matrix.png");
    }
}
