//! Static description of every form field.
//!
//! The schema is split into display categories, but what matters to the
//! classifier is the *flattened* order: all fields of every category, in
//! declaration order. That order is the column order the model was trained
//! on. Reordering or inserting fields here without retraining the model
//! silently corrupts every prediction.
//!
//! | # | field | # | field |
//! |---|-------|---|-------|
//! | 0 | `age` | 12 | `sodium` |
//! | 1 | `blood_pressure` | 13 | `potassium` |
//! | 2 | `specific_gravity` | 14 | `hemoglobin` |
//! | 3 | `albumin` | 15 | `packed_cell_volume` |
//! | 4 | `sugar` | 16 | `white_blood_cell_count` |
//! | 5 | `red_blood_cells` | 17 | `red_blood_cell_count` |
//! | 6 | `pus_cell` | 18 | `hypertension` |
//! | 7 | `pus_cell_clumps` | 19 | `diabetes_mellitus` |
//! | 8 | `bacteria` | 20 | `coronary_artery_disease` |
//! | 9 | `blood_glucose_random` | 21 | `appetite` |
//! | 10 | `blood_urea` | 22 | `pedal_edema` |
//! | 11 | `serum_creatinine` | 23 | `anemia` |

use std::collections::HashSet;

/// Number of features the classifier expects.
pub const FEATURE_COUNT: usize = 24;

/// Validation rule attached to a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// A decimal number accepted on the closed interval `[min, max]`.
    Numeric { min: f64, max: f64 },
    /// One of a fixed set of lower-case options, matched case-insensitively.
    Categorical { options: &'static [&'static str] },
}

/// One input of the form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Unique key, also the form control name
    pub name: &'static str,
    /// Human readable label used in the page and in error messages
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn numeric(name: &'static str, label: &'static str, min: f64, max: f64) -> Self {
        Self { name, label, kind: FieldKind::Numeric { min, max } }
    }

    const fn categorical(
        name: &'static str,
        label: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self { name, label, kind: FieldKind::Categorical { options } }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self.kind, FieldKind::Categorical { .. })
    }
}

/// A named group of fields, used only for page layout.
#[derive(Debug, Clone, Copy)]
pub struct Category {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

/// Maps every option of one categorical field to the integer the model was trained on.
#[derive(Debug, Clone, Copy)]
pub struct CategoricalEncoding {
    pub field: &'static str,
    pub codes: &'static [(&'static str, u8)],
}

impl CategoricalEncoding {
    pub fn code(&self, option: &str) -> Option<u8> {
        self.codes
            .iter()
            .find(|(key, _)| *key == option)
            .map(|&(_, code)| code)
    }
}

const NORMALITY: &[&str] = &["normal", "abnormal"];
const PRESENCE: &[&str] = &["present", "notpresent"];
const YES_NO: &[&str] = &["yes", "no"];
const APPETITE: &[&str] = &["good", "poor"];

const DEMOGRAPHIC: &[FieldSpec] = &[
    FieldSpec::numeric("age", "Age", 0.0, 120.0),
    FieldSpec::numeric("blood_pressure", "Blood Pressure (mm Hg)", 50.0, 200.0),
];

const LABORATORY: &[FieldSpec] = &[
    FieldSpec::numeric("specific_gravity", "Specific Gravity", 1.005, 1.025),
    FieldSpec::numeric("albumin", "Albumin (g/dL)", 0.0, 5.0),
    FieldSpec::numeric("sugar", "Sugar Level", 0.0, 5.0),
    FieldSpec::categorical("red_blood_cells", "Red Blood Cells", NORMALITY),
    FieldSpec::categorical("pus_cell", "Pus Cell", NORMALITY),
    FieldSpec::categorical("pus_cell_clumps", "Pus Cell Clumps", PRESENCE),
    FieldSpec::categorical("bacteria", "Bacteria", PRESENCE),
    FieldSpec::numeric("blood_glucose_random", "Blood Glucose Random (mg/dL)", 70.0, 400.0),
    FieldSpec::numeric("blood_urea", "Blood Urea (mg/dL)", 10.0, 200.0),
    FieldSpec::numeric("serum_creatinine", "Serum Creatinine (mg/dL)", 0.4, 15.0),
    FieldSpec::numeric("sodium", "Sodium (mEq/L)", 100.0, 150.0),
    FieldSpec::numeric("potassium", "Potassium (mEq/L)", 2.5, 7.0),
    FieldSpec::numeric("hemoglobin", "Hemoglobin (g/dL)", 3.5, 17.5),
    FieldSpec::numeric("packed_cell_volume", "Packed Cell Volume (%)", 15.0, 55.0),
    FieldSpec::numeric("white_blood_cell_count", "White Blood Cell Count (/mm³)", 2000.0, 30000.0),
    FieldSpec::numeric("red_blood_cell_count", "Red Blood Cell Count (millions/mm³)", 2.0, 8.0),
];

const MEDICAL_HISTORY: &[FieldSpec] = &[
    FieldSpec::categorical("hypertension", "Hypertension", YES_NO),
    FieldSpec::categorical("diabetes_mellitus", "Diabetes Mellitus", YES_NO),
    FieldSpec::categorical("coronary_artery_disease", "Coronary Artery Disease", YES_NO),
    FieldSpec::categorical("appetite", "Appetite", APPETITE),
    FieldSpec::categorical("pedal_edema", "Pedal Edema", YES_NO),
    FieldSpec::categorical("anemia", "Anemia", YES_NO),
];

const CATEGORIES: &[Category] = &[
    Category { name: "Demographic Data", fields: DEMOGRAPHIC },
    Category { name: "Laboratory Results", fields: LABORATORY },
    Category { name: "Medical History", fields: MEDICAL_HISTORY },
];

const ENCODINGS: &[CategoricalEncoding] = &[
    CategoricalEncoding { field: "red_blood_cells", codes: &[("normal", 1), ("abnormal", 0)] },
    CategoricalEncoding { field: "pus_cell", codes: &[("normal", 1), ("abnormal", 0)] },
    CategoricalEncoding { field: "pus_cell_clumps", codes: &[("present", 1), ("notpresent", 0)] },
    CategoricalEncoding { field: "bacteria", codes: &[("present", 1), ("notpresent", 0)] },
    CategoricalEncoding { field: "hypertension", codes: &[("yes", 1), ("no", 0)] },
    CategoricalEncoding { field: "diabetes_mellitus", codes: &[("yes", 1), ("no", 0)] },
    CategoricalEncoding { field: "coronary_artery_disease", codes: &[("yes", 1), ("no", 0)] },
    CategoricalEncoding { field: "appetite", codes: &[("good", 1), ("poor", 0)] },
    CategoricalEncoding { field: "pedal_edema", codes: &[("yes", 1), ("no", 0)] },
    CategoricalEncoding { field: "anemia", codes: &[("yes", 1), ("no", 0)] },
];

/// Ways the static tables can disagree with each other.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SchemaError {
    #[error("Field '{0}' is declared more than once")]
    DuplicateField(&'static str),
    #[error("Field '{0}' has an empty or inverted range")]
    InvalidRange(&'static str),
    #[error("Field '{0}' has no options")]
    NoOptions(&'static str),
    #[error("Categorical field '{0}' has no encoding")]
    MissingEncoding(&'static str),
    #[error("Encoding for '{0}' does not match the field's options")]
    EncodingMismatch(&'static str),
    #[error("Encoding for '{0}' maps two options to the same code")]
    AmbiguousEncoding(&'static str),
    #[error("Encoding declared for unknown or numeric field '{0}'")]
    OrphanEncoding(&'static str),
    #[error("Schema declares {actual} fields, the classifier expects {expected}")]
    FieldCount { expected: usize, actual: usize },
}

/// Display categories in declaration order.
pub fn categories() -> &'static [Category] {
    CATEGORIES
}

/// All fields in feature-vector order.
pub fn fields() -> impl Iterator<Item = &'static FieldSpec> {
    CATEGORIES.iter().flat_map(|category| category.fields.iter())
}

pub fn field(name: &str) -> Option<&'static FieldSpec> {
    fields().find(|spec| spec.name == name)
}

pub fn encodings() -> &'static [CategoricalEncoding] {
    ENCODINGS
}

pub fn encoding_for(name: &str) -> Option<&'static CategoricalEncoding> {
    ENCODINGS.iter().find(|encoding| encoding.field == name)
}

/// Verifies that fields and encodings agree with each other.
///
/// The binary runs this once at startup and refuses to serve if it fails.
pub fn check_consistency() -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    let mut count = 0;

    for spec in fields() {
        count += 1;
        if !seen.insert(spec.name) {
            return Err(SchemaError::DuplicateField(spec.name));
        }
        match spec.kind {
            FieldKind::Numeric { min, max } => {
                if !(min.is_finite() && max.is_finite() && min <= max) {
                    return Err(SchemaError::InvalidRange(spec.name));
                }
            }
            FieldKind::Categorical { options } => {
                if options.is_empty() {
                    return Err(SchemaError::NoOptions(spec.name));
                }
                let encoding = encoding_for(spec.name)
                    .ok_or(SchemaError::MissingEncoding(spec.name))?;
                let keys: HashSet<&str> = encoding.codes.iter().map(|&(key, _)| key).collect();
                let expected: HashSet<&str> = options.iter().copied().collect();
                if keys != expected || keys.len() != encoding.codes.len() {
                    return Err(SchemaError::EncodingMismatch(spec.name));
                }
                let codes: HashSet<u8> = encoding.codes.iter().map(|&(_, code)| code).collect();
                if codes.len() != encoding.codes.len() {
                    return Err(SchemaError::AmbiguousEncoding(spec.name));
                }
            }
        }
    }

    for encoding in ENCODINGS {
        if !field(encoding.field).is_some_and(FieldSpec::is_categorical) {
            return Err(SchemaError::OrphanEncoding(encoding.field));
        }
    }

    if count != FEATURE_COUNT {
        return Err(SchemaError::FieldCount { expected: FEATURE_COUNT, actual: count });
    }

    Ok(())
}
