use std::collections::HashMap;
use std::sync::Arc;
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use serde::Serialize;

use super::error::ClassifierError;
use crate::encoder::FeatureVector;

/// Anything that can turn a feature vector into a class label.
///
/// The production implementation is [`OnnxClassifier`]; tests and benches
/// plug in their own.
pub trait Predictor: Send + Sync {
    /// Returns the raw label predicted for `features`.
    fn predict(&self, features: &FeatureVector) -> Result<i64, ClassifierError>;
}

/// Outcome of a successful prediction.
///
/// Label `1` means the patient is *not* likely to have CKD and `0` means they
/// are. This polarity is taken as-is from the trained artifact and has not
/// been checked against the training labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnosis {
    NotLikely,
    Likely,
}

impl Diagnosis {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotLikely => "Patient is NOT likely to have Chronic Kidney Disease",
            Self::Likely => "Patient is likely to have Chronic Kidney Disease",
        }
    }
}

impl TryFrom<i64> for Diagnosis {
    type Error = ClassifierError;

    fn try_from(label: i64) -> Result<Self, Self::Error> {
        match label {
            1 => Ok(Self::NotLikely),
            0 => Ok(Self::Likely),
            other => Err(ClassifierError::PredictionError(format!(
                "Unexpected class label {} (expected 0 or 1)",
                other
            ))),
        }
    }
}

/// A thread-safe tabular classifier backed by an ONNX Runtime session.
///
/// The model must take a single `f32` input of shape `[1, feature_count]` and
/// produce an `i64` label tensor.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use ckd_predictor::{OnnxClassifier, Predictor, FeatureVector};
///
/// let classifier = OnnxClassifier::builder()
///     .with_model_path("model/model_knn.onnx")?
///     .build()?;
///
/// let label = classifier.predict(&FeatureVector::from(vec![0.0; 24]))?;
/// println!("Predicted label: {}", label);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OnnxClassifier {
    pub model_path: String,
    pub session: Arc<Session>,
    pub input_name: String,
    pub label_output: usize,
    pub feature_count: usize,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<OnnxClassifier>();
    }
};

impl OnnxClassifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the loaded model
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            input_name: self.input_name.clone(),
            output_names: self.session.outputs.iter().map(|o| o.name.clone()).collect(),
            feature_count: self.feature_count,
        }
    }
}

impl Predictor for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<i64, ClassifierError> {
        if features.len() != self.feature_count {
            return Err(ClassifierError::ValidationError(format!(
                "Expected {} features, got {}",
                self.feature_count,
                features.len()
            )));
        }

        let input_array = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input array: {}", e)))?;
        let input_dyn = input_array.into_dyn();
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(self.input_name.as_str(), Tensor::from_array(&input)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input tensor: {}", e)))?);

        let outputs = self.session.run(input_tensors)
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to run model: {}", e)))?;
        let labels = outputs[self.label_output].try_extract_tensor::<i64>()
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to extract label tensor: {}", e)))?;

        labels.iter().next().copied().ok_or_else(|| {
            ClassifierError::PredictionError("Model returned an empty label tensor".into())
        })
    }
}
