//! Error types for record decoding and validation.
//!
//! Decode failures (malformed JSON, wrong value types) are kept apart from
//! validation failures (missing or malformed required fields) so callers can
//! log them distinctly. Neither is fatal to the relay.

use std::fmt;

use thiserror::Error;

/// Result type alias for record operations.
pub type Result<T> = std::result::Result<T, RecordError>;

/// Errors produced while turning raw input into a forwardable record.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Input was not a JSON object matching the record schema.
    #[error("malformed record: {0}")]
    Decode(#[source] serde_json::Error),

    /// Record decoded but violated one or more field constraints.
    #[error("invalid record: {0}")]
    Invalid(ValidationErrors),

    /// A validated record could not be re-encoded.
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),
}

impl RecordError {
    /// Returns true when the error came from constraint checking rather than
    /// decoding.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Returns the violated fields, empty for non-validation errors.
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Invalid(errors) => errors.violations(),
            Self::Decode(_) | Self::Encode(_) => &[],
        }
    }
}

/// Constraint a field failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Field was absent or empty.
    Required,
    /// Field was present but not a numeric string.
    NotNumeric,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::NotNumeric => write!(f, "numeric"),
        }
    }
}

/// A single failed constraint on a named wire field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Wire name of the field (e.g. `TxId`).
    pub field: &'static str,
    /// Constraint that failed.
    pub kind: ViolationKind,
}

impl FieldViolation {
    /// Creates a violation for the given field.
    pub fn new(field: &'static str, kind: ViolationKind) -> Self {
        Self { field, kind }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}' failed '{}' check", self.field, self.kind)
    }
}

/// Every constraint a record failed, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed constraint.
    pub fn push(&mut self, field: &'static str, kind: ViolationKind) {
        self.violations.push(FieldViolation::new(field, kind));
    }

    /// Returns true when no constraint failed.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Failed constraints in the order they were checked.
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Returns true if `field` failed with `kind`.
    pub fn contains(&self, field: &str, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.field == field && v.kind == kind)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_display_lists_every_field() {
        let mut errors = ValidationErrors::new();
        errors.push("TxId", ViolationKind::NotNumeric);
        errors.push("Result", ViolationKind::Required);

        assert_eq!(
            errors.to_string(),
            "field 'TxId' failed 'numeric' check; field 'Result' failed 'required' check"
        );
    }

    #[test]
    fn violations_exposed_only_for_validation_errors() {
        let mut errors = ValidationErrors::new();
        errors.push("TxType", ViolationKind::Required);
        let invalid = RecordError::Invalid(errors);

        assert!(invalid.is_validation());
        assert_eq!(invalid.violations().len(), 1);

        let decode_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let decode = RecordError::Decode(decode_err);
        assert!(!decode.is_validation());
        assert!(decode.violations().is_empty());
    }
}
