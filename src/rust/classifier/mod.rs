mod builder;
#[allow(clippy::module_inception)]
mod classifier;
mod error;
mod model;
mod result;
mod utils;
mod vectorizer;

pub use builder::ClassifierBuilder;
pub use classifier::{decide, Classifier};
pub use error::{
    ClassifierError, MODEL_UNAVAILABLE_MESSAGE, NO_CONTENT_MESSAGE, PROCESSING_FAILURE_MESSAGE,
};
pub use model::{Calibration, LinearModel, OnnxModel, ProbabilisticModel};
pub use result::{
    ClassificationRecord, ClassificationResult, ManualReason, ACCEPT_THRESHOLD, ERROR,
    MANUAL_VERIFICATION, REVIEW_THRESHOLD,
};
pub use vectorizer::{Norm, TfidfVectorizer, Vectorizer};

use crate::models::LabelMapping;

/// Snapshot of which collaborators a classifier holds.
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    pub normalizer: String,
    pub vectorizer_loaded: bool,
    pub model_loaded: bool,
    pub num_features: Option<usize>,
    pub num_classes: Option<usize>,
    pub label_mapping: LabelMapping,
}
