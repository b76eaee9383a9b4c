//! Built-in training hyperparameter document and the `Config` wrapper.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Storage key for the default configuration.
pub const DEFAULT_CONFIG_KEY: &str = "yolo_default_config";
/// Current schema version; stored documents below this are replaced.
pub const DEFAULT_CONFIG_VERSION: u32 = 1;
/// Document field carrying the schema version.
pub const VERSION_FIELD: &str = "config_version";

#[derive(Debug, Error)]
pub enum ConfigEditError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Configuration must be a JSON object")]
    NotAnObject,
}

/// A free-form hyperparameter document (JSON object).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config(Map<String, Value>);

impl Config {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Parse a document, rejecting anything that is not a JSON object.
    pub fn from_json(text: &str) -> Result<Self, ConfigEditError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ConfigEditError::NotAnObject),
        }
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.to_json())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The experiment name, when present and non-empty.
    pub fn name(&self) -> Option<&str> {
        self.0
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
    }

    /// Schema version recorded in the document; missing or unreadable is 0.
    pub fn stored_version(&self) -> f64 {
        let version = match self.0.get(VERSION_FIELD) {
            Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
            Some(Value::String(text)) => text.trim().parse::<f64>().unwrap_or(0.0),
            Some(Value::Bool(true)) => 1.0,
            _ => 0.0,
        };
        if version.is_finite() { version } else { 0.0 }
    }

    pub fn is_current(&self) -> bool {
        self.stored_version() >= f64::from(DEFAULT_CONFIG_VERSION)
    }

    /// Mark the document with the current schema version.
    pub fn stamp_version(&mut self) {
        self.set(VERSION_FIELD, DEFAULT_CONFIG_VERSION);
    }

    /// Overlay every key of `other` onto this document.
    pub fn merge(&mut self, other: Config) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }
}

/// The built-in default hyperparameters.
pub fn default_config() -> Config {
    let entries: Vec<(&str, Value)> = vec![
        ("model", "yolo11x-cls.pt".into()),
        ("task", "classify".into()),
        ("mode", "train".into()),
        ("data", "/content/02-3".into()),
        ("epochs", 50_i64.into()),
        ("patience", 100_i64.into()),
        ("batch", 16_i64.into()),
        ("imgsz", 224_i64.into()),
        ("save", Value::Bool(true)),
        ("save_period", Value::from(-1_i64)),
        ("cache", Value::Bool(false)),
        ("device", "cpu".into()),
        ("workers", 8_i64.into()),
        ("project", "/content/drive/MyDrive/yolo_classificacao_resultados".into()),
        ("name", "treinamento_classificacao".into()),
        ("exist_ok", Value::Bool(false)),
        ("pretrained", Value::Bool(true)),
        ("optimizer", "auto".into()),
        ("seed", 0_i64.into()),
        ("deterministic", Value::Bool(true)),
        ("single_cls", Value::Bool(false)),
        ("classes", Value::Null),
        ("rect", Value::Bool(false)),
        ("multi_scale", Value::Bool(false)),
        ("cos_lr", Value::Bool(false)),
        ("close_mosaic", 10_i64.into()),
        ("resume", Value::Bool(false)),
        ("amp", Value::Bool(true)),
        ("fraction", 1.0_f64.into()),
        ("profile", Value::Bool(false)),
        ("freeze", Value::Null),
        ("val", Value::Bool(true)),
        ("plots", Value::Bool(true)),
        ("compile", Value::Bool(false)),
        ("verbose", Value::Bool(true)),
        ("lr0", 0.01_f64.into()),
        ("lrf", 0.01_f64.into()),
        ("momentum", 0.937_f64.into()),
        ("weight_decay", 0.0005_f64.into()),
        ("warmup_epochs", 3.0_f64.into()),
        ("warmup_momentum", 0.8_f64.into()),
        ("warmup_bias_lr", 0.1_f64.into()),
        ("box", 7.5_f64.into()),
        ("cls", 0.5_f64.into()),
        ("dfl", 1.5_f64.into()),
        ("pose", 12.0_f64.into()),
        ("kobj", 1.0_f64.into()),
        ("nbs", 64_i64.into()),
        ("overlap_mask", Value::Bool(true)),
        ("mask_ratio", 4_i64.into()),
        ("dropout", 0.0_f64.into()),
        ("hsv_h", 0.015_f64.into()),
        ("hsv_s", 0.7_f64.into()),
        ("hsv_v", 0.4_f64.into()),
        ("degrees", 0.0_f64.into()),
        ("translate", 0.1_f64.into()),
        ("scale", 0.5_f64.into()),
        ("shear", 0.0_f64.into()),
        ("perspective", 0.0_f64.into()),
        ("flipud", 0.0_f64.into()),
        ("fliplr", 0.5_f64.into()),
        ("bgr", 0.0_f64.into()),
        ("mosaic", 1.0_f64.into()),
        ("mixup", 0.0_f64.into()),
        ("cutmix", 0.0_f64.into()),
        ("copy_paste", 0.0_f64.into()),
        ("copy_paste_mode", "flip".into()),
        ("auto_augment", "randaugment".into()),
        ("erasing", 0.4_f64.into()),
        ("augment", Value::Bool(false)),
        ("cfg", Value::Null),
        ("iou", 0.7_f64.into()),
        ("conf", Value::Null),
        ("agnostic_nms", Value::Bool(false)),
        ("max_det", 300_i64.into()),
        ("retina_masks", Value::Bool(false)),
        ("keras", Value::Bool(false)),
        ("int8", Value::Bool(false)),
        ("half", Value::Bool(false)),
        ("dnn", Value::Bool(false)),
        ("dynamic", Value::Bool(false)),
        ("line_width", Value::Null),
        ("embed", Value::Null),
        ("show_boxes", Value::Bool(true)),
        ("show_conf", Value::Bool(true)),
        ("show_labels", Value::Bool(true)),
        ("vid_stride", 1_i64.into()),
        ("visualize", Value::Bool(false)),
        ("save_conf", Value::Bool(false)),
        ("save_crop", Value::Bool(false)),
        ("save_frames", Value::Bool(false)),
        ("save_json", Value::Bool(false)),
        ("save_txt", Value::Bool(false)),
        ("time", Value::Null),
        ("workspace", Value::Null),
        ("config_version", DEFAULT_CONFIG_VERSION.into()),
    ];
    Config(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_carry_current_version() {
        let config = default_config();
        assert!(config.is_current());
        assert_eq!(config.name(), Some("treinamento_classificacao"));
        assert_eq!(config.get("epochs"), Some(&json!(50)));
        assert_eq!(config.get("classes"), Some(&Value::Null));
    }

    #[test]
    fn save_period_defaults_to_disabled() {
        let config = default_config();
        assert_eq!(config.get("save_period"), Some(&json!(-1)));
        assert_eq!(config.get("save_period").and_then(Value::as_i64), Some(-1));
    }

    #[test]
    fn non_objects_are_rejected() {
        assert!(matches!(
            Config::from_json("[1, 2]"),
            Err(ConfigEditError::NotAnObject)
        ));
        assert!(matches!(
            Config::from_json("{not json"),
            Err(ConfigEditError::Json(_))
        ));
    }

    #[test]
    fn version_reads_loosely() {
        assert_eq!(Config::from_json("{}").unwrap().stored_version(), 0.0);
        let quoted = Config::from_json(r#"{"config_version": "2"}"#).unwrap();
        assert_eq!(quoted.stored_version(), 2.0);
        let junk = Config::from_json(r#"{"config_version": "x"}"#).unwrap();
        assert!(!junk.is_current());
    }

    #[test]
    fn merge_overlays_keys() {
        let mut base = default_config();
        let patch = Config::from_json(r#"{"epochs": 5, "extra": "kept"}"#).unwrap();
        base.merge(patch);
        assert_eq!(base.get("epochs"), Some(&json!(5)));
        assert_eq!(base.get("extra"), Some(&json!("kept")));
        assert_eq!(base.get("batch"), Some(&json!(16)));
    }

    #[test]
    fn blank_name_is_treated_as_missing() {
        let config = Config::from_json(r#"{"name": "  "}"#).unwrap();
        assert_eq!(config.name(), None);
    }
}
