use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::info;
use ndarray::{Array1, Array2};
use ort::session::Session;
use ort::value::{Tensor, ValueType};
use serde::Deserialize;

use super::error::ClassifierError;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// A fitted model that maps a feature vector to per-class probabilities.
///
/// The returned vector has one entry per class, in class-index order. Its
/// values are expected to be non-negative and to sum to roughly 1.0; the
/// decision core does not re-check this.
pub trait ProbabilisticModel: Send + Sync {
    fn predict_proba(&self, features: &Array1<f32>) -> Result<Vec<f32>, ClassifierError>;

    /// Number of classes the model scores
    fn n_classes(&self) -> usize;
}

/// How raw decision scores become probabilities.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Calibration {
    /// Multinomial softmax over the decision scores
    #[default]
    Softmax,
    /// One-vs-rest Platt scaling, `p = 1 / (1 + exp(a * s + b))`, renormalized
    Sigmoid { a: Vec<f32>, b: Vec<f32> },
}

#[derive(Debug, Deserialize)]
struct LinearArtifact {
    coefficients: Vec<Vec<f32>>,
    intercepts: Vec<f32>,
    #[serde(default)]
    calibration: Calibration,
}

/// Linear classifier with fitted coefficients: `scores = W · x + b`.
///
/// A single coefficient row is treated as a binary model and produces
/// `[1 - p, p]`.
#[derive(Debug, Clone)]
pub struct LinearModel {
    coefficients: Array2<f32>,
    intercepts: Array1<f32>,
    calibration: Calibration,
}

impl LinearModel {
    pub fn new(
        coefficients: Array2<f32>,
        intercepts: Array1<f32>,
        calibration: Calibration,
    ) -> Result<Self, ClassifierError> {
        let rows = coefficients.nrows();
        if rows == 0 || coefficients.ncols() == 0 {
            return Err(ClassifierError::ArtifactError("Coefficient matrix is empty".into()));
        }
        if intercepts.len() != rows {
            return Err(ClassifierError::ArtifactError(format!(
                "Expected {} intercepts, found {}",
                rows,
                intercepts.len()
            )));
        }
        if let Calibration::Sigmoid { a, b } = &calibration {
            if a.len() != rows || b.len() != rows {
                return Err(ClassifierError::ArtifactError(format!(
                    "Sigmoid calibration needs {} parameters per side, found a={} b={}",
                    rows,
                    a.len(),
                    b.len()
                )));
            }
        }
        Ok(Self {
            coefficients,
            intercepts,
            calibration,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            ClassifierError::ArtifactError(format!("Failed to read model {:?}: {}", path, e))
        })?;
        Self::from_json(&bytes)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, ClassifierError> {
        let artifact: LinearArtifact = serde_json::from_slice(bytes)?;
        let rows = artifact.coefficients.len();
        let cols = artifact.coefficients.first().map_or(0, Vec::len);
        if artifact.coefficients.iter().any(|row| row.len() != cols) {
            return Err(ClassifierError::ArtifactError(
                "Coefficient rows have different lengths".into(),
            ));
        }
        let flat: Vec<f32> = artifact.coefficients.into_iter().flatten().collect();
        let coefficients = Array2::from_shape_vec((rows, cols), flat)
            .map_err(|e| ClassifierError::ArtifactError(format!("Bad coefficient shape: {}", e)))?;
        Self::new(coefficients, Array1::from(artifact.intercepts), artifact.calibration)
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.ncols()
    }

    fn decision_scores(&self, features: &Array1<f32>) -> Result<Array1<f32>, ClassifierError> {
        if features.len() != self.n_features() {
            return Err(ClassifierError::PredictionError(format!(
                "Feature vector has {} dimensions, model expects {}",
                features.len(),
                self.n_features()
            )));
        }
        Ok(self.coefficients.dot(features) + &self.intercepts)
    }
}

fn softmax(scores: &Array1<f32>) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl ProbabilisticModel for LinearModel {
    fn predict_proba(&self, features: &Array1<f32>) -> Result<Vec<f32>, ClassifierError> {
        let scores = self.decision_scores(features)?;

        let probabilities = match &self.calibration {
            Calibration::Softmax if scores.len() == 1 => {
                let p = sigmoid(scores[0]);
                vec![1.0 - p, p]
            }
            Calibration::Softmax => softmax(&scores),
            Calibration::Sigmoid { a, b } => {
                let raw: Vec<f32> = scores
                    .iter()
                    .zip(a.iter().zip(b))
                    .map(|(&s, (&a, &b))| 1.0 / (1.0 + (a * s + b).exp()))
                    .collect();
                if raw.len() == 1 {
                    vec![1.0 - raw[0], raw[0]]
                } else {
                    let sum: f32 = raw.iter().sum();
                    if sum <= f32::EPSILON {
                        return Err(ClassifierError::PredictionError(
                            "Calibrated probabilities sum to zero".into(),
                        ));
                    }
                    raw.into_iter().map(|p| p / sum).collect()
                }
            }
        };
        Ok(probabilities)
    }

    fn n_classes(&self) -> usize {
        match self.coefficients.nrows() {
            1 => 2,
            n => n,
        }
    }
}

/// A linear classifier exported to ONNX.
///
/// The graph is expected to:
/// - Accept one float input of shape [1, n_features]
/// - Produce a float output named `probabilities_output` of shape [1, n_classes]
#[derive(Debug)]
pub struct OnnxModel {
    session: Arc<Session>,
    input_name: String,
    probabilities_output: String,
    n_classes: usize,
}

impl OnnxModel {
    pub const DEFAULT_PROBABILITIES_OUTPUT: &'static str = "probabilities";

    pub fn from_file(
        path: impl AsRef<Path>,
        config: &RuntimeConfig,
        probabilities_output: &str,
    ) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let session = create_session_builder(config)?.commit_from_file(path)?;
        let (input_name, n_classes) = Self::validate_model(&session, probabilities_output)?;
        info!("ONNX model {:?} validated ({} classes)", path, n_classes);

        Ok(Self {
            session: Arc::new(session),
            input_name,
            probabilities_output: probabilities_output.to_string(),
            n_classes,
        })
    }

    /// Checks the graph has a feature input and the named probability output.
    /// Returns the input name and the class count (0 when the output is dynamic).
    fn validate_model(session: &Session, output: &str) -> Result<(String, usize), ClassifierError> {
        let input = session.inputs.first().ok_or_else(|| {
            ClassifierError::ArtifactError("Model must have at least 1 input for features".into())
        })?;
        let probabilities = session
            .outputs
            .iter()
            .find(|o| o.name == output)
            .ok_or_else(|| {
                ClassifierError::ArtifactError(format!("Model has no output named '{}'", output))
            })?;

        let n_classes = match &probabilities.output_type {
            ValueType::Tensor { dimensions, .. } => dimensions
                .last()
                .copied()
                .filter(|&d| d > 0)
                .map_or(0, |d| d as usize),
            _ => 0,
        };

        Ok((input.name.clone(), n_classes))
    }
}

impl ProbabilisticModel for OnnxModel {
    fn predict_proba(&self, features: &Array1<f32>) -> Result<Vec<f32>, ClassifierError> {
        let input_array = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| {
                ClassifierError::PredictionError(format!("Failed to create input array: {}", e))
            })?;
        let input_dyn = input_array.into_dyn();
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input).map_err(|e| {
                ClassifierError::PredictionError(format!("Failed to create input tensor: {}", e))
            })?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[self.probabilities_output.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                ClassifierError::PredictionError(format!("Failed to extract output tensor: {}", e))
            })?;

        Ok(output_tensor.iter().copied().collect())
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_softmax_linear_model() {
        let model = LinearModel::new(
            array![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]],
            array![0.0, 0.0, 0.0],
            Calibration::Softmax,
        )
        .unwrap();

        let probs = model.predict_proba(&array![2.0, 0.0]).unwrap();
        assert_eq!(probs.len(), 3);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(probs[0] > probs[1]);
        assert!((probs[1] - probs[2]).abs() < 1e-6);
    }

    #[test]
    fn test_binary_model_produces_two_classes() {
        let model = LinearModel::new(array![[1.0]], array![0.0], Calibration::Softmax).unwrap();
        assert_eq!(model.n_classes(), 2);
        let probs = model.predict_proba(&array![0.0]).unwrap();
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!((probs[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sigmoid_calibration_renormalizes() {
        let model = LinearModel::new(
            array![[1.0], [-1.0]],
            array![0.0, 0.0],
            Calibration::Sigmoid {
                a: vec![-1.0, -1.0],
                b: vec![0.0, 0.0],
            },
        )
        .unwrap();
        let probs = model.predict_proba(&array![1.0]).unwrap();
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!(probs[0] > probs[1]);
    }

    #[test]
    fn test_dimension_mismatch_is_prediction_error() {
        let model =
            LinearModel::new(array![[1.0, 2.0]], array![0.0], Calibration::Softmax).unwrap();
        let err = model.predict_proba(&array![1.0]).unwrap_err();
        assert!(matches!(err, ClassifierError::PredictionError(_)));
    }

    #[test]
    fn test_from_json_shape_checks() {
        let ragged = br#"{"coefficients": [[1.0, 2.0], [1.0]], "intercepts": [0.0, 0.0]}"#;
        assert!(LinearModel::from_json(ragged).is_err());

        let intercepts = br#"{"coefficients": [[1.0], [2.0]], "intercepts": [0.0]}"#;
        assert!(LinearModel::from_json(intercepts).is_err());

        let ok = br#"{"coefficients": [[1.0], [2.0]], "intercepts": [0.0, 0.0],
                      "calibration": {"kind": "sigmoid", "a": [-1.0, -1.0], "b": [0.0, 0.0]}}"#;
        let model = LinearModel::from_json(ok).unwrap();
        assert_eq!(model.n_classes(), 2);
        assert_eq!(model.n_features(), 1);
    }

    #[test]
    fn test_onnx_rejects_unreadable_graphs() {
        use std::io::Write;

        let config = RuntimeConfig::default();
        let missing = OnnxModel::from_file(
            "/nonexistent/model.onnx",
            &config,
            OnnxModel::DEFAULT_PROBABILITIES_OUTPUT,
        );
        assert!(matches!(missing, Err(ClassifierError::ArtifactError(_))));

        let mut file = tempfile::Builder::new().suffix(".onnx").tempfile().unwrap();
        file.write_all(b"\x08\x07garbage, not a graph").unwrap();
        let corrupt =
            OnnxModel::from_file(file.path(), &config, OnnxModel::DEFAULT_PROBABILITIES_OUTPUT);
        assert!(matches!(corrupt, Err(ClassifierError::ArtifactError(_))));
    }
}
