use std::path::Path;
use std::sync::Arc;

use log::{info, warn};

use super::classifier::Classifier;
use super::error::ClassifierError;
use super::model::ProbabilisticModel;
use super::vectorizer::Vectorizer;
use crate::model_manager::ResourceProvider;
use crate::models::LabelMapping;
use crate::normalizer::{select_normalizer, CharacterFilterNormalizer, TextNormalizer};

/// A builder for constructing a Classifier with a fluent interface.
///
/// Collaborators are injected either one by one or all at once from a
/// [`ResourceProvider`]. A classifier without a vectorizer or model still
/// builds; it answers every request with the model-unavailable error.
#[derive(Default)]
pub struct ClassifierBuilder {
    normalizer: Option<Arc<dyn TextNormalizer>>,
    vectorizer: Option<Arc<dyn Vectorizer>>,
    model: Option<Arc<dyn ProbabilisticModel>>,
    label_mapping: Option<LabelMapping>,
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance
    ///
    /// # Example
    /// ```
    /// use veritas::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the vectorizer, model and label mapping from a provider.
    ///
    /// Handles the provider failed to load are left absent.
    ///
    /// # Example
    /// ```no_run
    /// use std::sync::Arc;
    /// use veritas::{Classifier, ModelManager};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let manager = Arc::new(ModelManager::new_default()?);
    /// let classifier = Classifier::builder()
    ///     .with_resources(manager.as_ref())
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_resources(mut self, provider: &dyn ResourceProvider) -> Self {
        self.vectorizer = provider.vectorizer();
        self.model = provider.predictive_model();
        self.label_mapping = Some(provider.label_mapping());
        if self.vectorizer.is_none() || self.model.is_none() {
            warn!("Vectorizer or predictive model not loaded; classifier will report errors");
        }
        self
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn TextNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Selects the normalizer from an optional lexicon file, falling back to
    /// character filtering when it cannot be loaded.
    pub fn with_lexicon(self, lexicon_path: Option<&Path>) -> Self {
        self.with_normalizer(select_normalizer(lexicon_path))
    }

    pub fn with_vectorizer(mut self, vectorizer: Arc<dyn Vectorizer>) -> Self {
        self.vectorizer = Some(vectorizer);
        self
    }

    pub fn with_model(mut self, model: Arc<dyn ProbabilisticModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_label_mapping(mut self, label_mapping: LabelMapping) -> Self {
        self.label_mapping = Some(label_mapping);
        self
    }

    /// Builds and returns the final Classifier instance
    ///
    /// # Returns
    /// * `Result<Classifier, ClassifierError>` - The constructed Classifier, or an error if:
    ///   - The label mapping is empty
    ///
    /// A mapping that disagrees with the model about the class count is only
    /// logged.
    pub fn build(self) -> Result<Classifier, ClassifierError> {
        let label_mapping = self.label_mapping.unwrap_or_default();
        if label_mapping.is_empty() {
            return Err(ClassifierError::ValidationError("Label mapping cannot be empty".into()));
        }

        // Extra labels are never selected; classes without a label resolve to UNKNOWN
        if let Some(model) = &self.model {
            let n_classes = model.n_classes();
            if n_classes > 0 && label_mapping.len() != n_classes {
                warn!(
                    "Label mapping has {} labels but the model scores {} classes",
                    label_mapping.len(),
                    n_classes
                );
            }
        }

        let normalizer = self
            .normalizer
            .unwrap_or_else(|| Arc::new(CharacterFilterNormalizer));
        info!(
            "Classifier built (normalizer: {}, {} labels)",
            normalizer.name(),
            label_mapping.len()
        );

        Ok(Classifier {
            normalizer,
            vectorizer: self.vectorizer,
            model: self.model,
            label_mapping,
        })
    }
}
