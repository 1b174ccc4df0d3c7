use std::path::Path;
use std::sync::Arc;
use ort::session::Session;
use ort::value::ValueType;
use ort::tensor::TensorElementType;
use log::{info, error};

use super::error::ClassifierError;
use super::model::OnnxClassifier;
use crate::runtime::{RuntimeConfig, create_session_builder};
use crate::schema::FEATURE_COUNT;

/// Name of the label output produced by scikit-learn ONNX exports.
const LABEL_OUTPUT: &str = "label";

/// A builder for constructing an OnnxClassifier with a fluent interface.
#[derive(Debug)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    session: Option<Session>,
    feature_count: usize,
    runtime_config: RuntimeConfig,
}

impl Default for ClassifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder expecting the schema's feature count
    pub fn new() -> Self {
        Self {
            model_path: None,
            session: None,
            feature_count: FEATURE_COUNT,
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Sets the runtime configuration for ONNX model execution.
    ///
    /// Must be called before [`with_model_path`](Self::with_model_path), which
    /// creates the session.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Overrides the number of features the model is expected to take
    pub fn with_feature_count(mut self, feature_count: usize) -> Self {
        self.feature_count = feature_count;
        self
    }

    /// Loads the ONNX model at `model_path`
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - The path is empty
    ///   - A model is already set
    ///   - The file doesn't exist
    ///   - The model failed to load
    pub fn with_model_path(mut self, model_path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let model_path = model_path.as_ref();
        if model_path.as_os_str().is_empty() {
            return Err(ClassifierError::BuildError("Model path cannot be empty".to_string()));
        }
        if self.model_path.is_some() {
            return Err(ClassifierError::BuildError("Model path already set".to_string()));
        }
        if !model_path.exists() {
            return Err(ClassifierError::BuildError(format!("Model file not found: {}", model_path.display())));
        }

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(model_path)
            .map_err(|e| {
                error!("Failed to load model from {}: {}", model_path.display(), e);
                ClassifierError::ModelError(format!("Failed to load model: {}", e))
            })?;
        info!("Model loaded from {}", model_path.display());

        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.session = Some(session);
        Ok(self)
    }

    /// Builds and returns the final OnnxClassifier instance
    ///
    /// # Returns
    /// * `Result<OnnxClassifier, ClassifierError>` - The constructed classifier if successful, or an error if:
    ///   - No model has been loaded
    ///   - The model does not have exactly one input
    ///   - The model's input does not match the feature count
    ///   - The model has no integer label output
    pub fn build(mut self) -> Result<OnnxClassifier, ClassifierError> {
        let session = self.session.take()
            .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?;
        let model_path = self.model_path.take()
            .ok_or_else(|| ClassifierError::BuildError("Model path must be set".into()))?;

        Self::validate_model(&session, self.feature_count)?;
        let label_output = Self::find_label_output(&session)?;
        info!("Model structure validated successfully");

        Ok(OnnxClassifier {
            model_path,
            input_name: session.inputs[0].name.clone(),
            session: Arc::new(session),
            label_output,
            feature_count: self.feature_count,
        })
    }

    /// Validates that the model has a single float input whose last dimension
    /// equals the feature count. Dynamic dimensions (reported as -1) are accepted.
    fn validate_model(session: &Session, feature_count: usize) -> Result<(), ClassifierError> {
        let inputs = &session.inputs;
        if inputs.len() != 1 {
            return Err(ClassifierError::ModelError(
                format!("Model must have exactly 1 input, found {}", inputs.len())
            ));
        }

        if let ValueType::Tensor { ty, dimensions, .. } = &inputs[0].input_type {
            if *ty != TensorElementType::Float32 {
                return Err(ClassifierError::ModelError(
                    format!("Model input must be float32, found {:?}", ty)
                ));
            }
            if let Some(&width) = dimensions.last() {
                if width >= 0 && width as usize != feature_count {
                    return Err(ClassifierError::ModelError(
                        format!("Model expects {} features, schema provides {}", width, feature_count)
                    ));
                }
            }
        }

        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for labels".to_string()
            ));
        }

        Ok(())
    }

    /// Prefers an output named `label`, falling back to the first int64 tensor output
    fn find_label_output(session: &Session) -> Result<usize, ClassifierError> {
        if let Some(index) = session.outputs.iter().position(|o| o.name == LABEL_OUTPUT) {
            return Ok(index);
        }
        session.outputs.iter()
            .position(|o| matches!(
                &o.output_type,
                ValueType::Tensor { ty: TensorElementType::Int64, .. }
            ))
            .ok_or_else(|| ClassifierError::ModelError("Model has no int64 label output".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_model_path() {
        let result = ClassifierBuilder::new().with_model_path("");
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_missing_model_file() {
        let result = ClassifierBuilder::new()
            .with_model_path("/nonexistent/ckd-predictor/model.onnx");
        match result {
            Err(ClassifierError::BuildError(msg)) => assert!(msg.contains("Model file not found")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_build_without_model() {
        let result = ClassifierBuilder::new().with_feature_count(3).build();
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_default_feature_count() {
        let builder = ClassifierBuilder::default();
        assert_eq!(builder.feature_count, FEATURE_COUNT);
    }
}
