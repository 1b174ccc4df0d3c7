//! Turns one form submission into an [`Outcome`].
//!
//! A submission moves through three phases:
//!
//! ```text
//! Collecting --submit--> Validating --all valid--> Predicting --> Predicted | PredictionFailed
//!   ^    |                    |
//!   |    +- ModelUnavailable  |
//!   +------- Invalid ---------+
//! ```
//!
//! [`Outcome::phase`] reports where a submission ended.
//!
//! The classifier is only called once every field is valid, and every field
//! is checked so the user sees all problems at once.

use std::collections::HashMap;
use std::sync::Arc;
use log::{debug, error, info, warn};

use crate::classifier::Diagnosis;
use crate::encoder::{FeatureVector, ValidatedInput};
use crate::model_manager::SharedModel;
use crate::schema;
use crate::validator::{self, FieldError};

/// Shown under every prediction.
pub const DISCLAIMER: &str = "This prediction is for informational purposes only and should not be \
used as a substitute for professional medical advice. Please consult with a healthcare provider \
for proper diagnosis and treatment.";

/// Generic message shown when the classifier fails.
pub const PREDICTION_FAILED: &str = "An error occurred during prediction";

/// Where a submission currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Collecting,
    Validating,
    Predicting,
}

impl FormPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collecting => "collecting",
            Self::Validating => "validating",
            Self::Predicting => "predicting",
        }
    }
}

/// Unvalidated values as submitted, keyed by field name.
///
/// Unknown keys are kept but ignored; absent fields read as blank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInput {
    values: HashMap<String, String>,
}

impl RawInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }
}

impl From<HashMap<String, String>> for RawInput {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawInput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Result of one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The classifier could not be loaded, nothing was validated
    ModelUnavailable(String),
    /// One or more fields failed validation, in schema order
    Invalid(Vec<FieldError>),
    Predicted(Diagnosis),
    /// The classifier was called and failed; the detail is logged, not shown
    PredictionFailed(String),
}

impl Outcome {
    /// The phase the form is left in.
    ///
    /// Blocked and rejected submissions go back to collecting input; anything
    /// that reached the classifier ends in predicting.
    pub fn phase(&self) -> FormPhase {
        match self {
            Self::ModelUnavailable(_) | Self::Invalid(_) => FormPhase::Collecting,
            Self::Predicted(_) | Self::PredictionFailed(_) => FormPhase::Predicting,
        }
    }
}

/// Validates every field of `raw`, collecting all errors in schema order.
pub fn validate_all(raw: &RawInput) -> Result<ValidatedInput, Vec<FieldError>> {
    let mut validated = ValidatedInput::new();
    let mut errors = Vec::new();

    for spec in schema::fields() {
        let value = raw.get(spec.name);
        if value.trim().is_empty() {
            errors.push(FieldError::missing(spec));
            continue;
        }
        match validator::validate(spec, value) {
            Ok(v) => validated.insert(spec.name, v),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(validated)
    } else {
        Err(errors)
    }
}

/// Drives submissions against an injected classifier handle.
#[derive(Debug, Clone)]
pub struct FormController {
    model: Arc<SharedModel>,
}

impl FormController {
    pub fn new(model: Arc<SharedModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &SharedModel {
        &self.model
    }

    /// Processes one submission from start to finish.
    pub fn submit(&self, raw: &RawInput) -> Outcome {
        let mut phase = FormPhase::Collecting;

        let predictor = match self.model.get() {
            Ok(predictor) => predictor,
            Err(e) => {
                warn!("Submission blocked, model unavailable: {}", e);
                return finish(phase, Outcome::ModelUnavailable(e.to_string()));
            }
        };

        transition(&mut phase, FormPhase::Validating);
        let validated = match validate_all(raw) {
            Ok(validated) => validated,
            Err(errors) => {
                info!("Submission rejected with {} field error(s)", errors.len());
                transition(&mut phase, FormPhase::Collecting);
                return finish(phase, Outcome::Invalid(errors));
            }
        };

        transition(&mut phase, FormPhase::Predicting);
        let features = match FeatureVector::build(&validated) {
            Ok(features) => features,
            Err(e) => {
                error!("Encoding failed for validated input: {}", e);
                return finish(phase, Outcome::PredictionFailed(PREDICTION_FAILED.to_string()));
            }
        };

        let outcome = match predictor.predict(&features).and_then(Diagnosis::try_from) {
            Ok(diagnosis) => {
                info!("Prediction: {:?}", diagnosis);
                Outcome::Predicted(diagnosis)
            }
            Err(e) => {
                error!("Prediction failed: {}", e);
                Outcome::PredictionFailed(PREDICTION_FAILED.to_string())
            }
        };
        finish(phase, outcome)
    }
}

fn transition(phase: &mut FormPhase, next: FormPhase) {
    debug!("Form phase {:?} -> {:?}", phase, next);
    *phase = next;
}

fn finish(phase: FormPhase, outcome: Outcome) -> Outcome {
    debug_assert_eq!(phase, outcome.phase());
    debug!("Submission ends in {:?}", phase);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use crate::classifier::{ClassifierError, Predictor};
    use crate::model_manager::ModelError;

    /// Records every vector it sees and answers with a fixed label.
    struct Recording {
        label: i64,
        seen: Mutex<Vec<Vec<f32>>>,
    }

    impl Recording {
        fn new(label: i64) -> Arc<Self> {
            Arc::new(Self { label, seen: Mutex::new(Vec::new()) })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl Predictor for Recording {
        fn predict(&self, features: &FeatureVector) -> Result<i64, ClassifierError> {
            self.seen.lock().unwrap().push(features.to_vec());
            Ok(self.label)
        }
    }

    struct Failing;

    impl Predictor for Failing {
        fn predict(&self, _: &FeatureVector) -> Result<i64, ClassifierError> {
            Err(ClassifierError::PredictionError("boom".into()))
        }
    }

    fn valid_input() -> RawInput {
        RawInput::new()
            .with("age", "45")
            .with("blood_pressure", "80")
            .with("specific_gravity", "1.015")
            .with("albumin", "1")
            .with("sugar", "0")
            .with("red_blood_cells", "normal")
            .with("pus_cell", "normal")
            .with("pus_cell_clumps", "notpresent")
            .with("bacteria", "notpresent")
            .with("blood_glucose_random", "120")
            .with("blood_urea", "40")
            .with("serum_creatinine", "1.2")
            .with("sodium", "137")
            .with("potassium", "4.5")
            .with("hemoglobin", "13.5")
            .with("packed_cell_volume", "42")
            .with("white_blood_cell_count", "8000")
            .with("red_blood_cell_count", "4.8")
            .with("hypertension", "no")
            .with("diabetes_mellitus", "no")
            .with("coronary_artery_disease", "no")
            .with("appetite", "good")
            .with("pedal_edema", "no")
            .with("anemia", "no")
    }

    fn controller(predictor: Arc<dyn Predictor>) -> FormController {
        FormController::new(Arc::new(SharedModel::from_predictor(predictor)))
    }

    #[test]
    fn test_valid_submission_predicts_once() {
        let recording = Recording::new(1);
        let outcome = controller(recording.clone()).submit(&valid_input());
        assert_eq!(outcome, Outcome::Predicted(Diagnosis::NotLikely));
        assert_eq!(outcome.phase(), FormPhase::Predicting);
        assert_eq!(recording.calls(), 1);

        let seen = recording.seen.lock().unwrap();
        assert_eq!(seen[0].len(), schema::FEATURE_COUNT);
        assert_eq!(seen[0][0], 45.0);
        assert_eq!(seen[0][1], 80.0);
        assert_eq!(seen[0][5], 1.0); // red_blood_cells = normal
        assert_eq!(seen[0][7], 0.0); // pus_cell_clumps = notpresent
        assert_eq!(seen[0][21], 1.0); // appetite = good
    }

    #[test]
    fn test_label_zero_is_likely() {
        let outcome = controller(Recording::new(0)).submit(&valid_input());
        assert_eq!(outcome, Outcome::Predicted(Diagnosis::Likely));
    }

    #[test]
    fn test_blank_age_is_the_only_error() {
        let recording = Recording::new(1);
        let input = valid_input().with("age", "");
        let outcome = controller(recording.clone()).submit(&input);
        assert_eq!(outcome.phase(), FormPhase::Collecting);
        match outcome {
            Outcome::Invalid(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0], FieldError::Missing { field: "age", label: "Age" });
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(recording.calls(), 0);
    }

    #[test]
    fn test_out_of_range_blocks_prediction() {
        let recording = Recording::new(1);
        let input = valid_input().with("blood_pressure", "300");
        match controller(recording.clone()).submit(&input) {
            Outcome::Invalid(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(matches!(errors[0], FieldError::Range { field: "blood_pressure", .. }));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(recording.calls(), 0);
    }

    #[test]
    fn test_all_errors_collected_in_schema_order() {
        let input = valid_input()
            .with("anemia", "perhaps")
            .with("age", "old")
            .with("sodium", "");
        let errors = validate_all(&input).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(FieldError::field).collect();
        assert_eq!(fields, vec!["age", "sodium", "anemia"]);
        assert_eq!(errors[0].kind(), "format");
        assert_eq!(errors[1].kind(), "missing");
        assert_eq!(errors[2].kind(), "enum");
    }

    #[test]
    fn test_empty_submission_reports_every_field() {
        let errors = validate_all(&RawInput::new()).unwrap_err();
        assert_eq!(errors.len(), schema::FEATURE_COUNT);
        assert!(errors.iter().all(|e| matches!(e, FieldError::Missing { .. })));
    }

    #[test]
    fn test_whitespace_counts_as_blank() {
        let errors = validate_all(&valid_input().with("sugar", "   ")).unwrap_err();
        assert_eq!(errors, vec![FieldError::Missing { field: "sugar", label: "Sugar Level" }]);
    }

    #[test]
    fn test_categorical_case_is_normalised() {
        let input = valid_input().with("hypertension", "YES").with("appetite", "Poor");
        let validated = validate_all(&input).unwrap();
        let vector = FeatureVector::build(&validated).unwrap();
        assert_eq!(vector[18], 1.0);
        assert_eq!(vector[21], 0.0);
    }

    #[test]
    fn test_predictor_failure_is_contained() {
        let outcome = controller(Arc::new(Failing)).submit(&valid_input());
        assert_eq!(outcome, Outcome::PredictionFailed(PREDICTION_FAILED.to_string()));
        assert_eq!(outcome.phase(), FormPhase::Predicting);
    }

    #[test]
    fn test_unexpected_label_is_a_prediction_failure() {
        let outcome = controller(Recording::new(7)).submit(&valid_input());
        assert!(matches!(outcome, Outcome::PredictionFailed(_)));
    }

    #[test]
    fn test_model_unavailable_blocks_submission() {
        let model = SharedModel::unavailable(ModelError::NotFound(PathBuf::from("model/model_knn.onnx")));
        let outcome = FormController::new(Arc::new(model)).submit(&valid_input());
        // Blocked before validation, so the form never leaves collecting
        assert_eq!(outcome.phase(), FormPhase::Collecting);
        match outcome {
            Outcome::ModelUnavailable(msg) => assert!(msg.contains("Model file not found")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_raw_input_from_iterator() {
        let raw: RawInput = vec![("age", "45"), ("unknown", "x")].into_iter().collect();
        assert_eq!(raw.get("age"), "45");
        assert_eq!(raw.get("sodium"), "");
    }
}
