use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::{debug, error, warn};

use super::error::ClassifierError;
use super::model::ProbabilisticModel;
use super::result::{ClassificationResult, ManualReason, ACCEPT_THRESHOLD, REVIEW_THRESHOLD};
use super::utils::{argmax, rank_descending};
use super::vectorizer::Vectorizer;
use crate::models::LabelMapping;
use crate::normalizer::TextNormalizer;

/// Confidence-gated veracity classifier.
///
/// Runs normalize → vectorize → predict and routes the prediction into one of
/// three tiers: accepted, accepted with ranked alternatives, or manual
/// verification. Every failure is turned into [`ClassificationResult::Error`];
/// `classify` never returns an `Err` and never panics on a misbehaving
/// collaborator.
///
/// # Thread Safety
///
/// All collaborators are shared immutable handles (`Arc<dyn ... + Send + Sync>`),
/// so a single classifier can serve concurrent requests:
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
/// use ndarray::array;
/// use veritas::{Calibration, Classifier, LabelMapping, LinearModel, TfidfVectorizer};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let vocabulary = [("vaccin".to_string(), 0)].into_iter().collect();
/// let model = LinearModel::new(array![[4.0], [0.0]], array![0.0, 0.0], Calibration::Softmax)?;
/// let classifier = Arc::new(Classifier::builder()
///     .with_vectorizer(Arc::new(TfidfVectorizer::new(vocabulary, vec![1.0])?))
///     .with_model(Arc::new(model))
///     .with_label_mapping(LabelMapping::from_labels(vec!["FAKE", "REAL"]))
///     .build()?);
///
/// let handles: Vec<_> = (0..3).map(|_| {
///     let classifier = Arc::clone(&classifier);
///     thread::spawn(move || classifier.classify("vaccin"))
/// }).collect();
///
/// for handle in handles {
///     assert_eq!(handle.join().unwrap().classification(), "FAKE");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Classifier {
    pub(crate) normalizer: Arc<dyn TextNormalizer>,
    pub(crate) vectorizer: Option<Arc<dyn Vectorizer>>,
    pub(crate) model: Option<Arc<dyn ProbabilisticModel>>,
    pub(crate) label_mapping: LabelMapping,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("normalizer", &self.normalizer.name())
            .field("vectorizer_loaded", &self.vectorizer.is_some())
            .field("model_loaded", &self.model.is_some())
            .field("label_mapping", &self.label_mapping)
            .finish()
    }
}

impl Classifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            normalizer: self.normalizer.name().to_string(),
            vectorizer_loaded: self.vectorizer.is_some(),
            model_loaded: self.model.is_some(),
            num_features: self.vectorizer.as_ref().map(|v| v.n_features()),
            num_classes: self.model.as_ref().map(|m| m.n_classes()),
            label_mapping: self.label_mapping.clone(),
        }
    }

    /// Whether both the vectorizer and the predictive model are loaded.
    pub fn is_ready(&self) -> bool {
        self.vectorizer.is_some() && self.model.is_some()
    }

    /// Classifies `text` and decides how the result should be routed.
    ///
    /// - Empty or whitespace-only text: `Error("No content submitted.")`
    /// - Missing vectorizer or model: `Error("Model components are not available.")`
    /// - Nothing left after normalization: `ManualVerification` with confidence 0.0
    /// - Any collaborator failure: `Error("An error occurred during processing.")`,
    ///   the detail goes to the log only
    pub fn classify(&self, text: &str) -> ClassificationResult {
        if text.trim().is_empty() {
            return ClassificationResult::error(ClassifierError::EmptyInput.user_message());
        }

        let (Some(vectorizer), Some(model)) = (self.vectorizer.as_deref(), self.model.as_deref())
        else {
            warn!("Classification requested but model components are not loaded");
            return ClassificationResult::error(ClassifierError::ModelUnavailable.user_message());
        };

        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| self.run_pipeline(text, vectorizer, model)));

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                error!("Classification failed: {}", e);
                ClassificationResult::error(e.user_message())
            }
            Err(payload) => {
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("Classification panicked: {}", detail);
                ClassificationResult::error(
                    ClassifierError::PredictionError(detail).user_message(),
                )
            }
        }
    }

    fn run_pipeline(
        &self,
        text: &str,
        vectorizer: &dyn Vectorizer,
        model: &dyn ProbabilisticModel,
    ) -> Result<ClassificationResult, ClassifierError> {
        let normalized = self.normalizer.normalize(text)?;
        if normalized.is_empty() {
            debug!("Input has no content after normalization");
            return Ok(ClassificationResult::ManualVerification {
                confidence: 0.0,
                reason: ManualReason::NoContentAfterNormalization,
            });
        }

        let features = vectorizer.transform(&normalized)?;
        let probabilities = model.predict_proba(&features)?;
        decide(&probabilities, &self.label_mapping)
    }
}

/// Maps a probability vector to a routing decision.
///
/// The top class is the first index holding the maximum probability. Ranked
/// alternatives list every class in descending order, ties kept in index order.
///
/// # Errors
/// - `PredictionError` if `probabilities` is empty or holds a NaN
pub fn decide(
    probabilities: &[f32],
    labels: &LabelMapping,
) -> Result<ClassificationResult, ClassifierError> {
    if probabilities.iter().any(|p| p.is_nan()) {
        return Err(ClassifierError::PredictionError(
            "Model returned NaN probabilities".into(),
        ));
    }
    let (top_index, confidence) = argmax(probabilities).ok_or_else(|| {
        ClassifierError::PredictionError("Model returned no probabilities".into())
    })?;
    let label = labels.resolve(top_index).to_string();

    let result = if confidence > ACCEPT_THRESHOLD {
        ClassificationResult::Accepted { label, confidence }
    } else if confidence >= REVIEW_THRESHOLD {
        let ranked_alternatives = rank_descending(probabilities)
            .into_iter()
            .map(|i| (labels.resolve(i).to_string(), probabilities[i]))
            .collect();
        ClassificationResult::AcceptedWithAlternatives {
            label,
            confidence,
            ranked_alternatives,
        }
    } else {
        ClassificationResult::ManualVerification {
            confidence,
            reason: ManualReason::LowConfidence,
        }
    };

    debug!("Decision: {} ({:.3})", result.classification(), confidence);
    Ok(result)
}
