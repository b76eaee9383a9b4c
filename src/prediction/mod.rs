//! Prediction page: request validation, remembered model choice, and the
//! side-by-side comparison of output images.

mod compare;
pub mod finder;
pub mod listing;
mod models;
mod request;
mod run;

pub use compare::{ComparisonGroup, ModelImage, group_for_comparison};
pub use listing::{DirListing, ListingError};
pub use models::{ModelSelection, SELECTED_MODELS_KEY};
pub use request::{
    ModelImages, PredictionBackend, PredictionError, PredictionOptions, PredictionRequest,
    PredictionResults, PredictionSource, SUGGESTED_FOLDER_PATH, parse_last_dir_response,
    parse_models_response,
};
pub use run::{PredictionRunError, run_prediction};
