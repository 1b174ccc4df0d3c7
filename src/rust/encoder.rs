use std::collections::HashMap;
use std::ops::Deref;

use crate::schema::{self, FEATURE_COUNT};
use crate::validator::FieldValue;

/// Raised only when validated input disagrees with the schema tables.
/// A user can never trigger this through the form.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("No encoding for option '{option}' of field '{field}'")]
    UnknownOption { field: String, option: String },
    #[error("Field '{0}' has no validated value")]
    MissingValue(&'static str),
    #[error("Field '{0}' received a value of the wrong kind")]
    KindMismatch(String),
}

/// Converts one validated value into the number the classifier expects.
pub fn encode(field: &str, value: FieldValue) -> Result<f32, EncodeError> {
    match (schema::encoding_for(field), value) {
        (Some(encoding), FieldValue::Choice(option)) => encoding
            .code(option)
            .map(f32::from)
            .ok_or_else(|| EncodeError::UnknownOption {
                field: field.to_string(),
                option: option.to_string(),
            }),
        (None, FieldValue::Number(number)) => Ok(number as f32),
        _ => Err(EncodeError::KindMismatch(field.to_string())),
    }
}

/// Every field value that passed validation, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedInput {
    values: HashMap<&'static str, FieldValue>,
}

impl ValidatedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &'static str, value: FieldValue) {
        self.values.insert(field, value);
    }

    pub fn get(&self, field: &str) -> Option<FieldValue> {
        self.values.get(field).copied()
    }
}

/// The model input: one number per field, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    /// Encodes `input` by walking the flattened schema, so the result never
    /// depends on the order in which values were inserted.
    pub fn build(input: &ValidatedInput) -> Result<Self, EncodeError> {
        let features = schema::fields()
            .map(|spec| {
                let value = input.get(spec.name).ok_or(EncodeError::MissingValue(spec.name))?;
                encode(spec.name, value)
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug_assert_eq!(features.len(), FEATURE_COUNT);
        Ok(Self(features))
    }
}

impl Deref for FeatureVector {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(features: Vec<f32>) -> Self {
        Self(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldKind;

    fn mid_range_input() -> ValidatedInput {
        let mut input = ValidatedInput::new();
        for spec in schema::fields() {
            let value = match spec.kind {
                FieldKind::Numeric { min, max } => FieldValue::Number((min + max) / 2.0),
                FieldKind::Categorical { options } => FieldValue::Choice(options[0]),
            };
            input.insert(spec.name, value);
        }
        input
    }

    #[test]
    fn test_categorical_encoding() {
        assert_eq!(encode("hypertension", FieldValue::Choice("yes")), Ok(1.0));
        assert_eq!(encode("hypertension", FieldValue::Choice("no")), Ok(0.0));
        assert_eq!(encode("pus_cell_clumps", FieldValue::Choice("notpresent")), Ok(0.0));
        assert_eq!(encode("red_blood_cells", FieldValue::Choice("normal")), Ok(1.0));
    }

    #[test]
    fn test_encoding_is_a_bijection_onto_zero_and_one() {
        for spec in schema::fields() {
            if let FieldKind::Categorical { options } = spec.kind {
                let mut codes: Vec<f32> = options
                    .iter()
                    .map(|option| encode(spec.name, FieldValue::Choice(*option)).unwrap())
                    .collect();
                codes.sort_by(|a, b| a.partial_cmp(b).unwrap());
                assert_eq!(codes, vec![0.0, 1.0], "{}", spec.name);
            }
        }
    }

    #[test]
    fn test_numeric_passes_through() {
        assert_eq!(encode("age", FieldValue::Number(45.0)), Ok(45.0));
        assert_eq!(encode("specific_gravity", FieldValue::Number(1.015)), Ok(1.015f64 as f32));
    }

    #[test]
    fn test_invariant_violations() {
        assert!(matches!(
            encode("appetite", FieldValue::Choice("maybe")),
            Err(EncodeError::UnknownOption { .. })
        ));
        assert!(matches!(
            encode("age", FieldValue::Choice("yes")),
            Err(EncodeError::KindMismatch(_))
        ));
        assert!(matches!(
            encode("anemia", FieldValue::Number(1.0)),
            Err(EncodeError::KindMismatch(_))
        ));
    }

    #[test]
    fn test_vector_follows_schema_order() {
        let vector = FeatureVector::build(&mid_range_input()).unwrap();
        assert_eq!(vector.len(), FEATURE_COUNT);
        assert_eq!(vector[0], 60.0); // age
        assert_eq!(vector[1], 125.0); // blood_pressure
        assert_eq!(vector[5], 1.0); // red_blood_cells = normal
        assert_eq!(vector[21], 1.0); // appetite = good
    }

    #[test]
    fn test_vector_ignores_insertion_order() {
        let forward = mid_range_input();
        let mut reversed = ValidatedInput::new();
        let specs: Vec<_> = schema::fields().collect();
        for spec in specs.iter().rev() {
            reversed.insert(spec.name, forward.get(spec.name).unwrap());
        }
        assert_eq!(FeatureVector::build(&forward), FeatureVector::build(&reversed));
    }

    #[test]
    fn test_missing_value() {
        let mut input = mid_range_input();
        input.values.remove("sodium");
        assert_eq!(FeatureVector::build(&input), Err(EncodeError::MissingValue("sodium")));
    }
}
