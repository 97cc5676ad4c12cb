//! Error types for schema validation, payload marshalling and dispatch.

use serde::Serialize;
use thiserror::Error;

/// Stable error codes shared by the HTTP adapter and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Payload errors (MLS001-MLS006)
    /// MLS001: Payload section is not a JSON object
    MalformedBody,
    /// MLS002: Payload keys differ from the declared keys
    KeySetMismatch,
    /// MLS003: A single field fails its shape constraints
    FieldValidation,
    /// MLS004: Ranged parameter outside its bounds
    RangeViolation,
    /// MLS005: Enum parameter not among the allowed values
    EnumViolation,
    /// MLS006: Unrecognized `output_type` discriminant
    UnknownVariant,

    // Registry and schema errors (MLS010-MLS019)
    /// MLS010: No endpoint carries a task schema
    NoCliEligibleEndpoints,
    /// MLS011: Task schema failed self-validation
    InvalidSchema,
    /// MLS012: Rule registered twice
    DuplicateRoute,
    /// MLS013: Rule does not start with `/`
    InvalidRule,
    /// MLS014: Empty input or parameter key
    EmptyKey,
    /// MLS015: Input or parameter key declared twice
    DuplicateKey,
    /// MLS016: Range lower bound above upper bound
    InvertedRange,
    /// MLS017: Default value outside its declared range
    DefaultOutOfRange,
    /// MLS018: Enum descriptor without values
    EmptyEnum,
    /// MLS019: Enum default not among the enum values
    UnknownEnumDefault,
    /// MLS020: Schema keys collide with each other as CLI flags
    FlagConflict,

    // Dispatch errors (MLS030)
    /// MLS030: The prediction function failed
    HandlerFailure,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "MLS001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::MalformedBody => "MLS001",
            ErrorCode::KeySetMismatch => "MLS002",
            ErrorCode::FieldValidation => "MLS003",
            ErrorCode::RangeViolation => "MLS004",
            ErrorCode::EnumViolation => "MLS005",
            ErrorCode::UnknownVariant => "MLS006",
            ErrorCode::NoCliEligibleEndpoints => "MLS010",
            ErrorCode::InvalidSchema => "MLS011",
            ErrorCode::DuplicateRoute => "MLS012",
            ErrorCode::InvalidRule => "MLS013",
            ErrorCode::EmptyKey => "MLS014",
            ErrorCode::DuplicateKey => "MLS015",
            ErrorCode::InvertedRange => "MLS016",
            ErrorCode::DefaultOutOfRange => "MLS017",
            ErrorCode::EmptyEnum => "MLS018",
            ErrorCode::UnknownEnumDefault => "MLS019",
            ErrorCode::FlagConflict => "MLS020",
            ErrorCode::HandlerFailure => "MLS030",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// A schema validation error with code, message, and optional JSON path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// JSON path to the problematic field (e.g., "parameters\[0\].value.range").
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation error with a JSON path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result of task schema validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Creates a successful validation result.
    pub fn success() -> Self {
        Self::default()
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Converts to a Result, returning Err if there are errors.
    pub fn into_result(self) -> Result<(), Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Which half of a request a key-set check ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadSection {
    /// The request body itself (`inputs` + `parameters`).
    Body,
    /// The `inputs` object.
    Inputs,
    /// The `parameters` object.
    Parameters,
}

impl PayloadSection {
    /// Returns the section name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadSection::Body => "body",
            PayloadSection::Inputs => "inputs",
            PayloadSection::Parameters => "parameters",
        }
    }
}

impl std::fmt::Display for PayloadSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type for marshalling and dispatch.
///
/// Every variant except [`MarshalError::HandlerFailure`] is detected before
/// the prediction function runs.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarshalError {
    /// A payload section is not a JSON object.
    #[error("{section} must be a valid JSON dictionary, got {found}. Call /api/routes to see how to use the API")]
    MalformedBody {
        section: PayloadSection,
        found: String,
    },

    /// The payload keys are not exactly the declared keys.
    #[error("keys mismatch in {section}: the schema has {expected:?} while the payload has {received:?}")]
    KeySetMismatch {
        section: PayloadSection,
        expected: Vec<String>,
        received: Vec<String>,
    },

    /// A single field fails its shape constraints.
    #[error("invalid value for '{key}' at {field}: {message}")]
    FieldValidation {
        key: String,
        field: String,
        message: String,
    },

    /// A ranged parameter is outside its inclusive bounds.
    #[error("parameter '{key}' must be within [{min}, {max}], got {value}")]
    RangeViolation {
        key: String,
        value: serde_json::Number,
        min: serde_json::Number,
        max: serde_json::Number,
    },

    /// An enum parameter is not one of the allowed values.
    #[error("parameter '{key}' must be one of {allowed:?}, got '{value}'")]
    EnumViolation {
        key: String,
        value: String,
        allowed: Vec<String>,
    },

    /// An `output_type` discriminant was not recognized.
    #[error("unknown output_type '{tag}'")]
    UnknownVariant { tag: String },

    /// No registered endpoint carries a task schema.
    #[error("no endpoint with a task schema is registered; the CLI has nothing to offer")]
    NoCliEligibleEndpoints,

    /// An endpoint or its task schema failed validation at registration time.
    #[error("invalid endpoint '{rule}': {}", join_errors(.errors))]
    InvalidSchema {
        rule: String,
        errors: Vec<ValidationError>,
    },

    /// The same rule was registered twice.
    #[error("route '{rule}' is already registered")]
    DuplicateRoute { rule: String },

    /// The prediction function returned an error or panicked.
    #[error("handler for '{rule}' failed: {message}")]
    HandlerFailure { rule: String, message: String },
}

impl MarshalError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            MarshalError::MalformedBody { .. } => ErrorCode::MalformedBody,
            MarshalError::KeySetMismatch { .. } => ErrorCode::KeySetMismatch,
            MarshalError::FieldValidation { .. } => ErrorCode::FieldValidation,
            MarshalError::RangeViolation { .. } => ErrorCode::RangeViolation,
            MarshalError::EnumViolation { .. } => ErrorCode::EnumViolation,
            MarshalError::UnknownVariant { .. } => ErrorCode::UnknownVariant,
            MarshalError::NoCliEligibleEndpoints => ErrorCode::NoCliEligibleEndpoints,
            MarshalError::InvalidSchema { .. } => ErrorCode::InvalidSchema,
            MarshalError::DuplicateRoute { .. } => ErrorCode::DuplicateRoute,
            MarshalError::HandlerFailure { .. } => ErrorCode::HandlerFailure,
        }
    }

    /// Returns true for errors caused by the caller's payload.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MarshalError::MalformedBody { .. }
                | MarshalError::KeySetMismatch { .. }
                | MarshalError::FieldValidation { .. }
                | MarshalError::RangeViolation { .. }
                | MarshalError::EnumViolation { .. }
                | MarshalError::UnknownVariant { .. }
        )
    }

    pub(crate) fn field(
        key: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        MarshalError::FieldValidation {
            key: key.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::MalformedBody.code(), "MLS001");
        assert_eq!(ErrorCode::RangeViolation.code(), "MLS004");
        assert_eq!(ErrorCode::NoCliEligibleEndpoints.code(), "MLS010");
        assert_eq!(ErrorCode::HandlerFailure.code(), "MLS030");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new(ErrorCode::EmptyKey, "key must not be empty");
        assert_eq!(err.to_string(), "MLS014: key must not be empty");

        let err_with_path = ValidationError::with_path(
            ErrorCode::InvertedRange,
            "min 2 is greater than max 1",
            "parameters[0].value.range",
        );
        assert_eq!(
            err_with_path.to_string(),
            "MLS016: min 2 is greater than max 1 (at parameters[0].value.range)"
        );
    }

    #[test]
    fn test_validation_result() {
        let mut result = ValidationResult::success();
        assert!(result.is_ok());

        result.add_error(ValidationError::new(ErrorCode::EmptyEnum, "no values"));
        assert!(!result.is_ok());
        assert_eq!(result.into_result().unwrap_err().len(), 1);
    }

    #[test]
    fn test_marshal_error_classification() {
        let err = MarshalError::KeySetMismatch {
            section: PayloadSection::Inputs,
            expected: vec!["a".into()],
            received: vec!["a".into(), "b".into()],
        };
        assert!(err.is_validation());
        assert_eq!(err.code(), ErrorCode::KeySetMismatch);

        let err = MarshalError::HandlerFailure {
            rule: "/x".into(),
            message: "boom".into(),
        };
        assert!(!err.is_validation());
    }

    #[test]
    fn test_marshal_error_serializes_with_kind_tag() {
        let err = MarshalError::field("t", "inputs.t.text", "must not be empty");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["kind"], "field_validation");
        assert_eq!(value["key"], "t");
        assert_eq!(value["field"], "inputs.t.text");
    }

    #[test]
    fn test_invalid_schema_display_joins_errors() {
        let err = MarshalError::InvalidSchema {
            rule: "/x".into(),
            errors: vec![
                ValidationError::new(ErrorCode::EmptyKey, "a"),
                ValidationError::new(ErrorCode::EmptyEnum, "b"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "invalid endpoint '/x': MLS014: a; MLS018: b"
        );
    }
}
