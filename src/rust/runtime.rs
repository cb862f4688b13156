use std::sync::OnceLock;

use log::{error, info};
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;

use crate::classifier::ClassifierError;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Graph optimization applied when an ONNX model is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationLevel {
    Disable,
    Basic,
    Extended,
    #[default]
    All,
}

impl OptimizationLevel {
    fn to_ort(self) -> GraphOptimizationLevel {
        match self {
            Self::Disable => GraphOptimizationLevel::Disable,
            Self::Basic => GraphOptimizationLevel::Level1,
            Self::Extended => GraphOptimizationLevel::Level2,
            Self::All => GraphOptimizationLevel::Level3,
        }
    }
}

/// Settings for ONNX-backed predictive models.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// 0 lets ONNX Runtime decide
    pub inter_threads: usize,
    /// 0 lets ONNX Runtime decide
    pub intra_threads: usize,
    pub optimization_level: OptimizationLevel,
}

fn init_onnx_environment() -> Result<(), String> {
    ort::init()
        .with_name("veritas")
        .commit()
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Initializes the ONNX Runtime environment once per process.
///
/// A failed initialization is remembered and reported to every caller
/// instead of being retried.
pub fn ensure_initialized() -> Result<(), ClassifierError> {
    INIT.get_or_init(|| {
        let result = init_onnx_environment();
        match &result {
            Ok(()) => info!("ONNX Runtime environment initialized"),
            Err(e) => error!("Failed to initialize ONNX Runtime environment: {}", e),
        }
        result
    })
    .clone()
    .map_err(ClassifierError::ArtifactError)
}

pub fn create_session_builder(config: &RuntimeConfig) -> Result<SessionBuilder, ClassifierError> {
    ensure_initialized()?;
    let mut builder = Session::builder()?;

    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }

    builder = builder.with_optimization_level(config.optimization_level.to_ort())?;
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::default();
        assert_eq!(config.inter_threads, 0);
        assert_eq!(config.intra_threads, 0);
        assert_eq!(config.optimization_level, OptimizationLevel::All);
    }

    #[test]
    fn test_optimization_mapping() {
        assert!(matches!(OptimizationLevel::Basic.to_ort(), GraphOptimizationLevel::Level1));
        assert!(matches!(OptimizationLevel::Disable.to_ort(), GraphOptimizationLevel::Disable));
    }

    #[test]
    fn test_initialization_outcome_is_cached() {
        let first = ensure_initialized();
        assert!(INIT.get().is_some());
        assert_eq!(first, ensure_initialized());
    }

    #[test]
    fn test_session_builder_follows_initialization() {
        let config = RuntimeConfig {
            inter_threads: 1,
            intra_threads: 2,
            optimization_level: OptimizationLevel::Basic,
        };
        let builder = create_session_builder(&config);
        match ensure_initialized() {
            Ok(()) => assert!(builder.is_ok()),
            Err(e) => assert!(matches!(builder, Err(ref b) if *b == e)),
        }
    }
}
