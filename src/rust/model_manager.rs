use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use sha2::{Sha256, Digest};
use log;

use crate::classifier::{ClassifierError, OnnxClassifier, Predictor};
use crate::runtime::RuntimeConfig;

/// Where the trained classifier is expected when no path is configured.
pub const DEFAULT_MODEL_PATH: &str = "model/model_knn.onnx";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {}", .path.display())]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
    #[error("Failed to load model: {0}")]
    LoadError(#[from] ClassifierError),
}

/// Locates, verifies and loads the classifier artifact from disk.
#[derive(Debug, Clone)]
pub struct ModelManager {
    model_path: PathBuf,
    expected_sha256: Option<String>,
    runtime_config: RuntimeConfig,
}

impl ModelManager {
    /// Creates a ModelManager pointing at [`DEFAULT_MODEL_PATH`]
    pub fn new_default() -> Self {
        Self::new(DEFAULT_MODEL_PATH)
    }

    pub fn new<P: AsRef<Path>>(model_path: P) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
            expected_sha256: None,
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Requires the artifact's SHA-256 digest to equal `hash` (hex, any case) before loading
    pub fn with_expected_sha256(mut self, hash: impl Into<String>) -> Self {
        self.expected_sha256 = Some(hash.into().to_lowercase());
        self
    }

    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn is_model_present(&self) -> bool {
        let exists = self.model_path.is_file();
        log::debug!("Model path: {:?} (exists: {})", self.model_path, exists);
        exists
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        log::info!("Verifying file: {:?}", path);
        let bytes = fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let hash = format!("{:x}", hasher.finalize());
        log::debug!("Calculated hash: {}", hash);
        log::debug!("Expected hash:   {}", expected_hash);
        if hash != expected_hash {
            log::error!("Model hash mismatch: expected {}, got {}", expected_hash, hash);
            return Err(ModelError::HashMismatch {
                path: path.to_path_buf(),
                expected: expected_hash.to_string(),
                actual: hash,
            });
        }
        Ok(true)
    }

    /// Checks the artifact against the configured digest.
    /// Returns `Ok(false)` when no digest is configured.
    pub fn verify_model(&self) -> Result<bool, ModelError> {
        if !self.is_model_present() {
            return Err(ModelError::NotFound(self.model_path.clone()));
        }
        match &self.expected_sha256 {
            Some(expected) => self.verify_file(&self.model_path, expected),
            None => Ok(false),
        }
    }

    /// Loads the classifier, verifying the digest first when one is configured
    pub fn load(&self) -> Result<Arc<dyn Predictor>, ModelError> {
        log::info!("Loading model from {:?}", self.model_path);
        if self.verify_model()? {
            log::info!("Model digest verified");
        }

        let classifier = OnnxClassifier::builder()
            .with_runtime_config(self.runtime_config.clone())
            .with_model_path(&self.model_path)?
            .build()?;

        let info = classifier.info();
        log::info!(
            "Model ready: input '{}' with {} features, outputs {:?}",
            info.input_name, info.feature_count, info.output_names
        );
        Ok(Arc::new(classifier))
    }
}

/// The process-wide classifier handle.
///
/// Loaded at most once, then read-only. A failed load is cached as well, so
/// every later submission sees the same `ModelError` instead of retrying.
pub struct SharedModel {
    manager: Option<ModelManager>,
    cell: OnceLock<Result<Arc<dyn Predictor>, ModelError>>,
}

impl SharedModel {
    /// Defers loading until the first call to [`get`](Self::get)
    pub fn lazy(manager: ModelManager) -> Self {
        Self { manager: Some(manager), cell: OnceLock::new() }
    }

    /// Loads immediately, capturing any failure
    pub fn eager(manager: ModelManager) -> Self {
        let model = Self::lazy(manager);
        if let Err(e) = model.get() {
            log::error!("{}", e);
        }
        model
    }

    pub fn from_predictor(predictor: Arc<dyn Predictor>) -> Self {
        Self { manager: None, cell: OnceLock::from(Ok(predictor)) }
    }

    pub fn unavailable(error: ModelError) -> Self {
        Self { manager: None, cell: OnceLock::from(Err(error)) }
    }

    pub fn get(&self) -> Result<&Arc<dyn Predictor>, &ModelError> {
        self.cell
            .get_or_init(|| match &self.manager {
                Some(manager) => manager.load(),
                None => Err(ModelError::NotFound(PathBuf::from(DEFAULT_MODEL_PATH))),
            })
            .as_ref()
    }

    /// True once a load has been attempted and succeeded
    pub fn is_loaded(&self) -> bool {
        matches!(self.cell.get(), Some(Ok(_)))
    }

    /// The cached load failure, if loading was attempted and failed
    pub fn load_error(&self) -> Option<&ModelError> {
        match self.cell.get() {
            Some(Err(e)) => Some(e),
            _ => None,
        }
    }

    /// Why predictions are unavailable, if that is already known.
    ///
    /// A cached failure is reported as-is. A pending handle only checks that
    /// the artifact exists, without loading it.
    pub fn unavailable_reason(&self) -> Option<String> {
        match (self.cell.get(), &self.manager) {
            (Some(Err(e)), _) => Some(e.to_string()),
            (None, Some(manager)) if !manager.is_model_present() => {
                Some(ModelError::NotFound(manager.model_path().to_path_buf()).to_string())
            }
            _ => None,
        }
    }
}

impl fmt::Debug for SharedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.cell.get() {
            None => "pending",
            Some(Ok(_)) => "loaded",
            Some(Err(_)) => "unavailable",
        };
        f.debug_struct("SharedModel")
            .field("manager", &self.manager)
            .field("state", &state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // sha256("hello")
    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let dir = env::temp_dir().join("ckd-predictor-test").join(name);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.onnx");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_default_model_path() {
        let manager = ModelManager::new_default();
        assert!(manager.model_path().ends_with("model/model_knn.onnx"));
    }

    #[test]
    fn test_missing_model() {
        let manager = ModelManager::new("/nonexistent/ckd-predictor/model.onnx");
        assert!(!manager.is_model_present());
        let err = manager.load().err().unwrap();
        assert!(matches!(err, ModelError::NotFound(_)));
        assert!(err.to_string().starts_with("Model file not found"));
    }

    #[test]
    fn test_verify_digest() {
        let path = scratch_file("verify", "hello");
        let manager = ModelManager::new(&path).with_expected_sha256(HELLO_SHA256.to_uppercase());
        assert!(manager.verify_model().unwrap());

        let unchecked = ModelManager::new(&path);
        assert!(!unchecked.verify_model().unwrap());
    }

    #[test]
    fn test_hash_mismatch_refuses_to_load() {
        let path = scratch_file("mismatch", "corrupted data");
        let manager = ModelManager::new(&path).with_expected_sha256(HELLO_SHA256);
        assert!(matches!(manager.load(), Err(ModelError::HashMismatch { .. })));
    }

    #[test]
    fn test_lazy_load_failure_is_cached() {
        let model = SharedModel::lazy(ModelManager::new("/nonexistent/ckd-predictor/model.onnx"));
        assert!(model.load_error().is_none());
        assert!(model.get().is_err());
        assert!(model.get().is_err());
        assert!(!model.is_loaded());
        assert!(matches!(model.load_error(), Some(ModelError::NotFound(_))));
    }

    #[test]
    fn test_pending_handle_reports_missing_artifact() {
        let model = SharedModel::lazy(ModelManager::new("/nonexistent/ckd-predictor/model.onnx"));
        assert_eq!(
            model.unavailable_reason().as_deref(),
            Some("Model file not found: /nonexistent/ckd-predictor/model.onnx")
        );
        // Checking presence does not attempt the load
        assert!(model.load_error().is_none());
        assert!(format!("{:?}", model).contains("pending"));

        let present = SharedModel::lazy(ModelManager::new(scratch_file("pending", "hello")));
        assert!(present.unavailable_reason().is_none());
        assert!(present.load_error().is_none());
    }

    #[test]
    fn test_eager_missing_model() {
        let model = SharedModel::eager(ModelManager::new("/nonexistent/ckd-predictor/model.onnx"));
        assert!(model.load_error().is_some());
        assert!(format!("{:?}", model).contains("unavailable"));
    }

    #[test]
    fn test_unavailable() {
        let model = SharedModel::unavailable(ModelError::NotFound(PathBuf::from("x.onnx")));
        assert_eq!(model.get().err().unwrap().to_string(), "Model file not found: x.onnx");
    }
}
