use std::fmt;

use crate::schema::{FieldKind, FieldSpec};

/// A problem with one submitted field.
///
/// The `Display` output is the message shown to the user.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    /// The field was left blank
    #[error("Please fill in {label}")]
    Missing { field: &'static str, label: &'static str },
    /// A numeric field could not be parsed as a finite number
    #[error("{label} should be a numeric value")]
    Format { field: &'static str, label: &'static str },
    /// A numeric field fell outside its closed range
    #[error("{label} should be between {min} and {max}")]
    Range { field: &'static str, label: &'static str, min: f64, max: f64 },
    /// A categorical field matched none of its options
    #[error("{label} should be one of: {}", .options.join(", "))]
    Enum { field: &'static str, label: &'static str, options: &'static [&'static str] },
}

impl FieldError {
    pub fn missing(spec: &FieldSpec) -> Self {
        Self::Missing { field: spec.name, label: spec.label }
    }

    /// Name of the field this error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field, .. }
            | Self::Format { field, .. }
            | Self::Range { field, .. }
            | Self::Enum { field, .. } => field,
        }
    }

    /// Short machine-readable kind, used by the JSON API.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Missing { .. } => "missing",
            Self::Format { .. } => "format",
            Self::Range { .. } => "range",
            Self::Enum { .. } => "enum",
        }
    }
}

/// A value that passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Number(f64),
    /// Canonical lower-case option, borrowed from the schema
    Choice(&'static str),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{}", value),
            Self::Choice(option) => f.write_str(option),
        }
    }
}

/// Parses `raw` as a decimal number and checks it against `[min, max]`.
pub fn validate_numeric(
    spec: &FieldSpec,
    raw: &str,
    min: f64,
    max: f64,
) -> Result<f64, FieldError> {
    let value: f64 = raw
        .trim()
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or(FieldError::Format { field: spec.name, label: spec.label })?;

    if value < min || value > max {
        return Err(FieldError::Range { field: spec.name, label: spec.label, min, max });
    }
    Ok(value)
}

/// Matches `raw` case-insensitively against `options`.
///
/// Returns the option as declared in the schema, which is always lower case.
pub fn validate_categorical(
    spec: &FieldSpec,
    raw: &str,
    options: &'static [&'static str],
) -> Result<&'static str, FieldError> {
    let wanted = raw.trim().to_lowercase();
    options
        .iter()
        .copied()
        .find(|option| *option == wanted)
        .ok_or(FieldError::Enum { field: spec.name, label: spec.label, options })
}

/// Dispatches to the validator matching the field's kind.
///
/// Callers reject blank input before getting here.
pub fn validate(spec: &FieldSpec, raw: &str) -> Result<FieldValue, FieldError> {
    match spec.kind {
        FieldKind::Numeric { min, max } => validate_numeric(spec, raw, min, max).map(FieldValue::Number),
        FieldKind::Categorical { options } => {
            validate_categorical(spec, raw, options).map(FieldValue::Choice)
        }
    }
}
