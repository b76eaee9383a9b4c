use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::training::BackendError;

/// Folder offered for the `folder` source when the operator leaves it blank.
pub const SUGGESTED_FOLDER_PATH: &str = "./app/storage/datasets_yolo/CM/01";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PredictionError {
    #[error("No model selected; choose at least one model before running a prediction")]
    NoModels,
    #[error("The random source needs a folder path")]
    MissingFolderPath,
    #[error("Unknown prediction source: {0}")]
    UnknownSource(String),
}

/// Where the images to predict on come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    #[default]
    Val,
    Upload,
    Folder,
    Random,
}

impl PredictionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Val => "val",
            Self::Upload => "upload",
            Self::Folder => "folder",
            Self::Random => "random",
        }
    }

    /// Whether the folder path input applies to this source.
    pub fn uses_folder(self) -> bool {
        matches!(self, Self::Folder | Self::Random)
    }
}

impl FromStr for PredictionSource {
    type Err = PredictionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "val" => Ok(Self::Val),
            "upload" => Ok(Self::Upload),
            "folder" => Ok(Self::Folder),
            "random" => Ok(Self::Random),
            other => Err(PredictionError::UnknownSource(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub models: Vec<String>,
    pub source: PredictionSource,
    #[serde(default)]
    pub preprocessors: Vec<String>,
    #[serde(default)]
    pub options: PredictionOptions,
}

impl PredictionRequest {
    /// Validate the form and build the request body.
    ///
    /// The folder path is only read for `folder` and `random`; `random`
    /// requires one and `folder` falls back to [`SUGGESTED_FOLDER_PATH`].
    pub fn build(
        models: Vec<String>,
        source: PredictionSource,
        folder_path: Option<&str>,
    ) -> Result<Self, PredictionError> {
        if models.is_empty() {
            return Err(PredictionError::NoModels);
        }
        let typed = folder_path
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(str::to_string);
        let path = match source {
            PredictionSource::Random => Some(typed.ok_or(PredictionError::MissingFolderPath)?),
            PredictionSource::Folder => {
                Some(typed.unwrap_or_else(|| SUGGESTED_FOLDER_PATH.to_string()))
            }
            PredictionSource::Val | PredictionSource::Upload => None,
        };
        Ok(Self {
            models,
            source,
            preprocessors: Vec::new(),
            options: PredictionOptions { path },
        })
    }
}

/// Output images produced for one model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelImages {
    #[serde(default)]
    pub images: Vec<String>,
}

/// Response of a prediction run, keyed by model name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResults {
    #[serde(default)]
    pub results_summary: BTreeMap<String, ModelImages>,
}

impl PredictionResults {
    pub fn images_for(&self, model: &str) -> &[String] {
        self.results_summary
            .get(model)
            .map(|entry| entry.images.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ModelsWire {
    #[serde(default)]
    models: Vec<String>,
}

/// Model names from a `{ "models": [...] }` body; anything else is empty.
pub fn parse_models_response(body: &str) -> Vec<String> {
    serde_json::from_str::<ModelsWire>(body.trim())
        .map(|wire| wire.models)
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LastDirWire {
    #[serde(default)]
    last_dir: Option<String>,
}

/// Run folder from a `{ "last_dir": ... }` body; null, blank or garbage is `None`.
pub fn parse_last_dir_response(body: &str) -> Option<String> {
    serde_json::from_str::<LastDirWire>(body.trim())
        .ok()
        .and_then(|wire| wire.last_dir)
        .filter(|dir| !dir.trim().is_empty())
}

/// Remote side of prediction.
pub trait PredictionBackend {
    fn models(&self) -> Result<Vec<String>, BackendError>;
    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResults, BackendError>;

    /// Most recent prediction run folder, when the server reports one.
    fn last_dir(&self) -> Result<Option<String>, BackendError> {
        Ok(None)
    }

    /// Whether `path` serves an image.
    fn image_exists(&self, _path: &str) -> bool {
        false
    }
}
