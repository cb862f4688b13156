use ort::Error as OrtError;
use std::fmt;

/// Message returned when the submitted text is empty or whitespace-only.
pub const NO_CONTENT_MESSAGE: &str = "No content submitted.";
/// Message returned when the vectorizer or the predictive model failed to load.
pub const MODEL_UNAVAILABLE_MESSAGE: &str = "Model components are not available.";
/// Generic message for any failure inside the normalize/vectorize/predict pipeline.
pub const PROCESSING_FAILURE_MESSAGE: &str = "An error occurred during processing.";

/// Represents the different types of errors that can occur in the veracity classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// No content was submitted
    EmptyInput,
    /// The vectorizer or predictive model is not loaded
    ModelUnavailable,
    /// Error occurred while normalizing the input text
    NormalizationError(String),
    /// Error occurred while turning normalized text into features
    VectorizationError(String),
    /// Error occurred while running the predictive model
    PredictionError(String),
    /// Error occurred while loading or validating a persisted artifact
    ArtifactError(String),
    /// Error occurred due to invalid input parameters
    ValidationError(String),
}

impl ClassifierError {
    /// The message a caller is allowed to see. Processing details are
    /// collapsed into one generic message.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyInput => NO_CONTENT_MESSAGE,
            Self::ModelUnavailable => MODEL_UNAVAILABLE_MESSAGE,
            _ => PROCESSING_FAILURE_MESSAGE,
        }
    }

    /// Whether the error happened inside the normalize/vectorize/predict pipeline.
    pub fn is_processing_failure(&self) -> bool {
        matches!(
            self,
            Self::NormalizationError(_) | Self::VectorizationError(_) | Self::PredictionError(_)
        )
    }
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "Validation error: {}", NO_CONTENT_MESSAGE),
            Self::ModelUnavailable => write!(f, "Model error: {}", MODEL_UNAVAILABLE_MESSAGE),
            Self::NormalizationError(msg) => write!(f, "Normalization error: {}", msg),
            Self::VectorizationError(msg) => write!(f, "Vectorization error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
            Self::ArtifactError(msg) => write!(f, "Artifact error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::ArtifactError(err.to_string())
    }
}

impl From<serde_json::Error> for ClassifierError {
    fn from(err: serde_json::Error) -> Self {
        ClassifierError::ArtifactError(format!("Malformed artifact: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        assert_eq!(ClassifierError::EmptyInput.user_message(), "No content submitted.");
        assert_eq!(
            ClassifierError::ModelUnavailable.user_message(),
            "Model components are not available."
        );
        assert_eq!(
            ClassifierError::PredictionError("shape mismatch at row 3".into()).user_message(),
            "An error occurred during processing."
        );
    }

    #[test]
    fn test_processing_failure_class() {
        assert!(ClassifierError::NormalizationError("x".into()).is_processing_failure());
        assert!(ClassifierError::VectorizationError("x".into()).is_processing_failure());
        assert!(!ClassifierError::EmptyInput.is_processing_failure());
        assert!(!ClassifierError::ArtifactError("x".into()).is_processing_failure());
    }
}
