use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ndarray::Array1;
use serde::Deserialize;

use super::error::ClassifierError;
use super::utils::normalize_vector;

/// Turns normalized text into a feature vector for a [`ProbabilisticModel`].
///
/// Implementations must be safe to call concurrently; they are shared behind
/// an `Arc` by every classification request.
///
/// [`ProbabilisticModel`]: super::model::ProbabilisticModel
pub trait Vectorizer: Send + Sync {
    /// Returns the feature vector for one document.
    fn transform(&self, text: &str) -> Result<Array1<f32>, ClassifierError>;

    /// Number of features produced by [`transform`](Self::transform)
    fn n_features(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    None,
}

#[derive(Debug, Deserialize)]
struct TfidfArtifact {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default)]
    norm: Norm,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

/// Applies a fitted TF-IDF table to text.
///
/// The table is produced offline; this type only does the transform step:
/// 1. Split text into tokens of two or more alphanumeric characters
/// 2. Build n-grams over the token sequence (joined by a single space)
/// 3. Count terms found in the vocabulary, optionally as `1 + ln(tf)`
/// 4. Multiply by the inverse document frequency and normalize
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Array1<f32>,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    norm: Norm,
}

impl TfidfVectorizer {
    /// Creates a vectorizer from a vocabulary and matching IDF weights.
    ///
    /// # Errors
    /// - `ArtifactError` if the IDF length differs from the vocabulary size
    /// - `ArtifactError` if a vocabulary index is out of range
    pub fn new(vocabulary: HashMap<String, usize>, idf: Vec<f32>) -> Result<Self, ClassifierError> {
        if idf.len() != vocabulary.len() {
            return Err(ClassifierError::ArtifactError(format!(
                "IDF table has {} entries but vocabulary has {} terms",
                idf.len(),
                vocabulary.len()
            )));
        }
        if let Some((term, idx)) = vocabulary.iter().find(|(_, &idx)| idx >= idf.len()) {
            return Err(ClassifierError::ArtifactError(format!(
                "Vocabulary term '{}' has out-of-range index {}",
                term, idx
            )));
        }

        Ok(Self {
            vocabulary,
            idf: Array1::from(idf),
            ngram_range: (1, 1),
            sublinear_tf: false,
            norm: Norm::L2,
        })
    }

    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Result<Self, ClassifierError> {
        if min_n == 0 || min_n > max_n {
            return Err(ClassifierError::ValidationError(format!(
                "Invalid n-gram range ({}, {})",
                min_n, max_n
            )));
        }
        self.ngram_range = (min_n, max_n);
        Ok(self)
    }

    pub fn with_sublinear_tf(mut self, sublinear_tf: bool) -> Self {
        self.sublinear_tf = sublinear_tf;
        self
    }

    pub fn with_norm(mut self, norm: Norm) -> Self {
        self.norm = norm;
        self
    }

    /// Loads a fitted table from its JSON artifact.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            ClassifierError::ArtifactError(format!("Failed to read vectorizer {:?}: {}", path, e))
        })?;
        Self::from_json(&bytes)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, ClassifierError> {
        let artifact: TfidfArtifact = serde_json::from_slice(bytes)?;
        let (min_n, max_n) = artifact.ngram_range;
        Ok(Self::new(artifact.vocabulary, artifact.idf)?
            .with_ngram_range(min_n, max_n)?
            .with_sublinear_tf(artifact.sublinear_tf)
            .with_norm(artifact.norm))
    }

    fn tokenize(text: &str) -> Vec<&str> {
        text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| t.chars().count() >= 2)
            .collect()
    }

    fn ngrams(&self, tokens: &[&str]) -> Vec<String> {
        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }
}

impl Vectorizer for TfidfVectorizer {
    fn transform(&self, text: &str) -> Result<Array1<f32>, ClassifierError> {
        let tokens = Self::tokenize(text);
        let mut tf: Array1<f32> = Array1::zeros(self.idf.len());

        for term in self.ngrams(&tokens) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                tf[idx] += 1.0;
            }
        }

        if self.sublinear_tf {
            tf.mapv_inplace(|count| if count > 0.0 { 1.0 + count.ln() } else { 0.0 });
        }

        let weighted = tf * &self.idf;
        Ok(match self.norm {
            Norm::L2 => normalize_vector(&weighted),
            Norm::None => weighted,
        })
    }

    fn n_features(&self) -> usize {
        self.idf.len()
    }
}
