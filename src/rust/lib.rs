//! Confidence-gated veracity classification for short news texts.
//!
//! Raw text is normalized, vectorized with a fitted TF-IDF table and scored by
//! a linear model. The top probability then decides the route:
//!
//! | confidence | result |
//! |---|---|
//! | `> 0.80` | [`ClassificationResult::Accepted`] |
//! | `0.60 ..= 0.80` | [`ClassificationResult::AcceptedWithAlternatives`] |
//! | `< 0.60` | [`ClassificationResult::ManualVerification`] |
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::Path;
//! use veritas::{Classifier, ModelManager};
//!
//! let manager = ModelManager::new_default()?;
//! let classifier = Classifier::builder()
//!     .with_resources(&manager)
//!     .with_lexicon(Some(Path::new("lexicon.json")))
//!     .build()?;
//!
//! let result = classifier.classify("Guvernul a anunțat noi măsuri economice.");
//! println!("{}", serde_json::to_string(&result.to_record())?);
//! # Ok(())
//! # }
//! ```
//!
//! Every outcome, including failures, is a [`ClassificationResult`]:
//! `classify` does not return `Err` and does not propagate collaborator panics.

pub mod classifier;
pub mod model_manager;
pub mod models;
pub mod normalizer;
mod runtime;

pub use classifier::{
    decide, Calibration, ClassificationRecord, ClassificationResult, Classifier, ClassifierBuilder,
    ClassifierError, ClassifierInfo, LinearModel, ManualReason, Norm, OnnxModel,
    ProbabilisticModel, TfidfVectorizer, Vectorizer, ACCEPT_THRESHOLD, REVIEW_THRESHOLD,
};
pub use model_manager::{ModelError, ModelManager, ProvisioningConfig, ResourceProvider};
pub use models::{ArtifactKind, LabelMapping, UNKNOWN_LABEL};
pub use normalizer::{
    select_normalizer, CharacterFilterNormalizer, LemmatizingNormalizer, Lexicon, TextNormalizer,
};
pub use runtime::{create_session_builder, OptimizationLevel, RuntimeConfig};

pub fn init_logger() {
    env_logger::init();
}
