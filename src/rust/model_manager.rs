use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::classifier::{LinearModel, OnnxModel, ProbabilisticModel, TfidfVectorizer, Vectorizer};
use crate::models::{ArtifactKind, LabelMapping};
use crate::runtime::RuntimeConfig;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("{file_type} artifact not found at {path:?}")]
    NotPresent { file_type: String, path: PathBuf },
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("Download of {file_type} file failed with HTTP status {status}")]
    HttpStatus { file_type: String, status: u16 },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
    #[error("{file_type} is already loaded in this process; restart to use a new file")]
    AlreadyLoaded { file_type: String },
}

/// Supplies the collaborators a [`Classifier`](crate::Classifier) needs.
///
/// A handle that failed to load is reported as `None`; providers never panic
/// on a missing or corrupt artifact.
pub trait ResourceProvider: Send + Sync {
    fn vectorizer(&self) -> Option<Arc<dyn Vectorizer>>;

    fn predictive_model(&self) -> Option<Arc<dyn ProbabilisticModel>>;

    fn label_mapping(&self) -> LabelMapping;
}

/// Where the artifacts live and how to check them.
#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
    pub models_dir: PathBuf,
    pub vectorizer_file: String,
    /// A `.onnx` extension selects the ONNX backend, anything else is read as JSON
    pub model_file: String,
    pub vectorizer_sha256: Option<String>,
    pub model_sha256: Option<String>,
    /// Output name holding class probabilities in ONNX models
    pub probabilities_output: String,
    pub label_mapping: LabelMapping,
    pub runtime: RuntimeConfig,
}

impl ProvisioningConfig {
    pub const DEFAULT_VECTORIZER_FILE: &'static str = "tfidf_vectorizer.json";
    pub const DEFAULT_MODEL_FILE: &'static str = "linear_model.json";

    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            vectorizer_file: Self::DEFAULT_VECTORIZER_FILE.to_string(),
            model_file: Self::DEFAULT_MODEL_FILE.to_string(),
            vectorizer_sha256: None,
            model_sha256: None,
            probabilities_output: OnnxModel::DEFAULT_PROBABILITIES_OUTPUT.to_string(),
            label_mapping: LabelMapping::veracity(),
            runtime: RuntimeConfig::default(),
        }
    }

    /// Default configuration with environment overrides applied:
    /// `VERITAS_VECTORIZER_FILE`, `VERITAS_MODEL_FILE`,
    /// `VERITAS_VECTORIZER_SHA256`, `VERITAS_MODEL_SHA256`.
    pub fn from_env() -> Self {
        let mut config = Self::new(Self::default_models_dir());
        if let Ok(file) = env::var("VERITAS_VECTORIZER_FILE") {
            config.vectorizer_file = file;
        }
        if let Ok(file) = env::var("VERITAS_MODEL_FILE") {
            config.model_file = file;
        }
        config.vectorizer_sha256 = env::var("VERITAS_VECTORIZER_SHA256").ok();
        config.model_sha256 = env::var("VERITAS_MODEL_SHA256").ok();
        config
    }

    /// Returns the default models directory path
    pub fn default_models_dir() -> PathBuf {
        if let Ok(path) = env::var("VERITAS_HOME") {
            return PathBuf::from(path).join("models");
        }
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("veritas").join("models");
        }
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("veritas").join("models");
        }
        env::temp_dir().join("veritas").join("models")
    }

    pub fn file_name(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Vectorizer => &self.vectorizer_file,
            ArtifactKind::Model => &self.model_file,
        }
    }

    pub fn expected_hash(&self, kind: ArtifactKind) -> Option<&str> {
        match kind {
            ArtifactKind::Vectorizer => self.vectorizer_sha256.as_deref(),
            ArtifactKind::Model => self.model_sha256.as_deref(),
        }
    }
}

struct LoadedComponents {
    vectorizer: Option<Arc<dyn Vectorizer>>,
    model: Option<Arc<dyn ProbabilisticModel>>,
}

/// Loads the vectorizer and predictive model once, on first use.
///
/// Concurrent first calls block on the same initialization; later calls return
/// the cached handles. Failures are logged and leave the handle absent for the
/// lifetime of the manager.
pub struct ModelManager {
    config: ProvisioningConfig,
    loaded: OnceLock<LoadedComponents>,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager from the environment-derived configuration
    pub fn new_default() -> io::Result<Self> {
        Self::new(ProvisioningConfig::from_env())
    }

    pub fn new(config: ProvisioningConfig) -> io::Result<Self> {
        fs::create_dir_all(&config.models_dir)?;
        Ok(Self {
            config,
            loaded: OnceLock::new(),
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn config(&self) -> &ProvisioningConfig {
        &self.config
    }

    pub fn artifact_path(&self, kind: ArtifactKind) -> PathBuf {
        self.config.models_dir.join(self.config.file_name(kind))
    }

    pub fn is_artifact_present(&self, kind: ArtifactKind) -> bool {
        let path = self.artifact_path(kind);
        log::debug!("{} path: {:?} (exists: {})", kind, path, path.exists());
        path.exists()
    }

    /// Whether the one-time load has already happened.
    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Checks an on-disk artifact against its configured digest.
    ///
    /// Without a configured digest, presence is enough.
    pub fn verify_artifact(&self, kind: ArtifactKind) -> Result<bool, ModelError> {
        let path = self.artifact_path(kind);
        if !path.exists() {
            log::info!("{} file does not exist at {:?}", kind, path);
            return Ok(false);
        }
        match self.config.expected_hash(kind) {
            Some(expected) => {
                let verified = hash_file(&path)?.eq_ignore_ascii_case(expected);
                log::info!("{} hash verification: {}", kind, verified);
                Ok(verified)
            }
            None => Ok(true),
        }
    }

    /// Downloads an artifact into the models directory.
    ///
    /// Must run before the first load: handles already loaded are never
    /// replaced.
    pub async fn fetch_artifact(&self, kind: ArtifactKind, url: &str) -> Result<(), ModelError> {
        if self.is_loaded() {
            return Err(ModelError::AlreadyLoaded {
                file_type: kind.to_string(),
            });
        }
        let _lock = self.download_lock.lock().await;
        let path = self.artifact_path(kind);

        log::info!("Downloading {} file from {} to {:?}", kind, url, path);
        let response = reqwest::get(url).await?;
        log::info!("Download response status: {}", response.status());
        if !response.status().is_success() {
            return Err(ModelError::HttpStatus {
                file_type: kind.to_string(),
                status: response.status().as_u16(),
            });
        }
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = self.config.expected_hash(kind) {
            let actual = sha256_hex(&bytes);
            if !actual.eq_ignore_ascii_case(expected) {
                log::error!("{} hash mismatch: expected {}, got {}", kind, expected, actual);
                return Err(ModelError::HashMismatch {
                    file_type: kind.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Readers only ever see the complete file
        let partial = partial_path(&path);
        if let Err(e) = fs::write(&partial, &bytes).and_then(|_| fs::rename(&partial, &path)) {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }
        log::info!("{} file written to {:?}", kind, path);
        Ok(())
    }

    pub fn remove_artifact(&self, kind: ArtifactKind) -> Result<(), ModelError> {
        let path = self.artifact_path(kind);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn components(&self) -> &LoadedComponents {
        self.loaded.get_or_init(|| {
            log::info!("Loading classification artifacts from {:?}", self.config.models_dir);
            LoadedComponents {
                vectorizer: self.load_vectorizer(),
                model: self.load_model(),
            }
        })
    }

    /// Path of an artifact that exists and matches its digest.
    fn checked_path(&self, kind: ArtifactKind) -> Result<PathBuf, ModelError> {
        let path = self.artifact_path(kind);
        if !path.exists() {
            return Err(ModelError::NotPresent {
                file_type: kind.to_string(),
                path,
            });
        }
        if let Some(expected) = self.config.expected_hash(kind) {
            let actual = hash_file(&path)?;
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(ModelError::HashMismatch {
                    file_type: kind.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }
        Ok(path)
    }

    fn load_vectorizer(&self) -> Option<Arc<dyn Vectorizer>> {
        let path = match self.checked_path(ArtifactKind::Vectorizer) {
            Ok(path) => path,
            Err(e) => {
                log::error!("Vectorizer unavailable: {}", e);
                return None;
            }
        };
        match TfidfVectorizer::from_file(&path) {
            Ok(vectorizer) => {
                log::info!("TF-IDF vectorizer loaded ({} features)", vectorizer.n_features());
                Some(Arc::new(vectorizer))
            }
            Err(e) => {
                log::error!("Failed to load vectorizer from {:?}: {}", path, e);
                None
            }
        }
    }

    fn load_model(&self) -> Option<Arc<dyn ProbabilisticModel>> {
        let path = match self.checked_path(ArtifactKind::Model) {
            Ok(path) => path,
            Err(e) => {
                log::error!("Predictive model unavailable: {}", e);
                return None;
            }
        };

        let is_onnx = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("onnx"));
        let result: Result<Arc<dyn ProbabilisticModel>, _> = if is_onnx {
            OnnxModel::from_file(&path, &self.config.runtime, &self.config.probabilities_output)
                .map(|m| Arc::new(m) as Arc<dyn ProbabilisticModel>)
        } else {
            LinearModel::from_file(&path).map(|m| Arc::new(m) as Arc<dyn ProbabilisticModel>)
        };

        match result {
            Ok(model) => {
                log::info!("Predictive model loaded ({} classes)", model.n_classes());
                Some(model)
            }
            Err(e) => {
                log::error!("Failed to load predictive model from {:?}: {}", path, e);
                None
            }
        }
    }
}

impl ResourceProvider for ModelManager {
    fn vectorizer(&self) -> Option<Arc<dyn Vectorizer>> {
        self.components().vectorizer.clone()
    }

    fn predictive_model(&self) -> Option<Arc<dyn ProbabilisticModel>> {
        self.components().model.clone()
    }

    fn label_mapping(&self) -> LabelMapping {
        self.config.label_mapping.clone()
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

fn hash_file(path: &Path) -> Result<String, ModelError> {
    let bytes = fs::read(path)?;
    Ok(sha256_hex(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_models_dir() {
        env::set_var("VERITAS_HOME", "/tmp/test-veritas");
        let path = ProvisioningConfig::default_models_dir();
        assert!(path.to_str().unwrap().contains("/tmp/test-veritas/models"));
        env::remove_var("VERITAS_HOME");

        let path = ProvisioningConfig::default_models_dir();
        assert!(path.to_str().unwrap().contains("veritas/models"));
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_partial_path_stays_beside_artifact() {
        let partial = partial_path(Path::new("/models/linear_model.json"));
        assert_eq!(partial, PathBuf::from("/models/linear_model.json.part"));
    }

    #[test]
    fn test_artifact_paths() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(ProvisioningConfig::new(dir.path())).unwrap();
        assert!(manager
            .artifact_path(ArtifactKind::Vectorizer)
            .ends_with("tfidf_vectorizer.json"));
        assert!(manager.artifact_path(ArtifactKind::Model).ends_with("linear_model.json"));
        assert!(!manager.is_artifact_present(ArtifactKind::Model));
        assert!(!manager.verify_artifact(ArtifactKind::Model).unwrap());
    }
}
