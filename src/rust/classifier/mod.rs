mod error;
mod model;
pub mod builder;

pub use error::ClassifierError;
pub use model::{Diagnosis, OnnxClassifier, Predictor};
pub use builder::ClassifierBuilder;

/// Information about a loaded classifier model
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file
    pub model_path: String,
    /// Name of the model's feature input
    pub input_name: String,
    /// Names of every model output
    pub output_names: Vec<String>,
    /// Number of features per row
    pub feature_count: usize,
}
