//! Chronic kidney disease prediction from a clinical measurement form.
//!
//! Raw form values are validated against a fixed field schema, encoded into a
//! 24-element feature vector in schema order and passed to a pre-trained ONNX
//! classifier.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use ckd_predictor::{FormController, ModelManager, Outcome, RawInput, SharedModel};
//!
//! let model = SharedModel::lazy(ModelManager::new("model/model_knn.onnx"));
//! let controller = FormController::new(Arc::new(model));
//!
//! let raw = RawInput::new().with("age", "45").with("blood_pressure", "80");
//! match controller.submit(&raw) {
//!     Outcome::Predicted(diagnosis) => println!("{}", diagnosis.message()),
//!     Outcome::Invalid(errors) => {
//!         for error in errors {
//!             println!("{}", error);
//!         }
//!     }
//!     other => println!("{:?}", other),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The loaded classifier is shared read-only behind an `Arc`; the controller
//! can be cloned into any number of request handlers.

pub mod classifier;
pub mod encoder;
pub mod form;
mod runtime;
pub mod model_manager;
pub mod schema;
pub mod server;
pub mod validator;

pub use classifier::{ClassifierBuilder, ClassifierError, ClassifierInfo, Diagnosis, OnnxClassifier, Predictor};
pub use encoder::{encode, EncodeError, FeatureVector, ValidatedInput};
pub use form::{FormController, FormPhase, Outcome, RawInput};
pub use model_manager::{ModelError, ModelManager, SharedModel};
pub use runtime::{RuntimeConfig, create_session_builder};
pub use schema::{CategoricalEncoding, FieldKind, FieldSpec, SchemaError, FEATURE_COUNT};
pub use validator::{validate_categorical, validate_numeric, FieldError, FieldValue};

/// Initializes `env_logger` from `RUST_LOG`.
pub fn init_logger() {
    env_logger::init();
}
