use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Label used when the model produces a class index the mapping does not know.
pub const UNKNOWN_LABEL: &str = "UNKNOWN";

/// Fixed association between a model output index and its category name.
///
/// The mapping may be sparse: lookups for a missing index resolve to
/// [`UNKNOWN_LABEL`] instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMapping {
    labels: BTreeMap<usize, String>,
}

impl LabelMapping {
    /// The five veracity categories the shipped model was trained on.
    pub fn veracity() -> Self {
        Self::from_iter([
            (0, "FAKE"),
            (1, "MISINFORMATION"),
            (2, "PROPAGANDA"),
            (3, "REAL"),
            (4, "SATIRE"),
        ])
    }

    /// Builds a dense mapping from labels in index order.
    pub fn from_labels(labels: Vec<impl Into<String>>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).enumerate().collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(&index).map(String::as_str)
    }

    pub fn resolve(&self, index: usize) -> &str {
        self.get(index).unwrap_or(UNKNOWN_LABEL)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().map(|(i, l)| (*i, l.as_str()))
    }
}

impl Default for LabelMapping {
    fn default() -> Self {
        Self::veracity()
    }
}

impl<S: Into<String>> FromIterator<(usize, S)> for LabelMapping {
    fn from_iter<I: IntoIterator<Item = (usize, S)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(|(i, l)| (i, l.into())).collect(),
        }
    }
}

/// The persisted artifacts the provisioning layer knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Vectorizer,
    Model,
}

impl ArtifactKind {
    pub fn file_type(&self) -> &'static str {
        match self {
            Self::Vectorizer => "vectorizer",
            Self::Model => "model",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_veracity_mapping() {
        let mapping = LabelMapping::veracity();
        assert_eq!(mapping.len(), 5);
        assert_eq!(mapping.get(1), Some("MISINFORMATION"));
        assert_eq!(mapping.get(4), Some("SATIRE"));
        assert_eq!(mapping.resolve(7), UNKNOWN_LABEL);
    }

    #[test]
    fn test_sparse_mapping() {
        let mapping: LabelMapping = [(1, "MISINFORMATION")].into_iter().collect();
        assert_eq!(mapping.resolve(1), "MISINFORMATION");
        assert_eq!(mapping.resolve(0), "UNKNOWN");
    }

    #[test]
    fn test_mapping_serde_shape() {
        let mapping = LabelMapping::from_labels(vec!["FAKE", "REAL"]);
        let json = serde_json::to_string(&mapping).unwrap();
        assert_eq!(json, r#"{"0":"FAKE","1":"REAL"}"#);
        let back: LabelMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mapping);
    }
}
