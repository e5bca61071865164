//! Error types for the expense-core library.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::validate::FieldPath;

/// Main error type for the expense library.
#[derive(Error, Debug)]
pub enum ExpenseError {
    /// The input did not satisfy the expense document contract.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationReport),

    /// The input was not well-formed JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// The kind of defect found in an input record.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// A required key is absent.
    #[error("missing required field")]
    MissingField,

    /// A key is present but holds the wrong kind of value.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A numeric value lies outside its domain.
    #[error("value {value} is outside {allowed}")]
    OutOfRange { value: f64, allowed: &'static str },

    /// An identity index is used by more than one sibling.
    #[error("index {index} is already used at {first}")]
    DuplicateIndex { index: u32, first: FieldPath },
}

/// A single defect, located by its path from the validated root.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{path}: {kind}")]
pub struct ValidationError {
    pub path: FieldPath,
    #[serde(flatten)]
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    pub fn new(path: FieldPath, kind: ValidationErrorKind) -> Self {
        Self { path, kind }
    }

    pub fn is_missing_field(&self) -> bool {
        matches!(self.kind, ValidationErrorKind::MissingField)
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self.kind, ValidationErrorKind::TypeMismatch { .. })
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, ValidationErrorKind::OutOfRange { .. })
    }

    pub fn is_duplicate_index(&self) -> bool {
        matches!(self.kind, ValidationErrorKind::DuplicateIndex { .. })
    }
}

/// Every defect found while validating one record.
///
/// Errors appear in the order they were detected, which follows the order of
/// the input. When a reporting cap is configured, `suppressed` counts the
/// defects that were detected but not stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
    #[serde(skip_serializing_if = "is_zero")]
    suppressed: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl ValidationReport {
    /// Create a report from a list of errors.
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self {
            errors,
            suppressed: 0,
        }
    }

    pub(crate) fn with_suppressed(mut self, suppressed: usize) -> Self {
        self.suppressed = suppressed;
        self
    }

    /// Stored errors, in detection order.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Number of defects detected but dropped by the reporting cap.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    /// Total number of defects detected, stored or not.
    pub fn total(&self) -> usize {
        self.errors.len() + self.suppressed
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Find the first error reported at exactly `path` (rendered form).
    pub fn at(&self, path: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.path.to_string() == path)
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total();
        write!(
            f,
            "{} defect{}",
            total,
            if total == 1 { "" } else { "s" }
        )?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "{}{}", if i == 0 { ": " } else { "; " }, error)?;
        }
        if self.suppressed > 0 {
            write!(f, " (+{} more)", self.suppressed)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

/// Result type for the expense library.
pub type Result<T> = std::result::Result<T, ExpenseError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn missing(path: FieldPath) -> ValidationError {
        ValidationError::new(path, ValidationErrorKind::MissingField)
    }

    #[test]
    fn test_error_display() {
        let error = ValidationError::new(
            FieldPath::root().key("Type").key("Confidence"),
            ValidationErrorKind::OutOfRange {
                value: 150.0,
                allowed: "[0, 100]",
            },
        );
        assert_eq!(
            error.to_string(),
            "Type.Confidence: value 150 is outside [0, 100]"
        );
    }

    #[test]
    fn test_report_display() {
        let report = ValidationReport::new(vec![
            missing(FieldPath::root().key("ValueDetection")),
            missing(FieldPath::root().key("PageNumber")),
        ]);
        assert_eq!(
            report.to_string(),
            "2 defects: ValueDetection: missing required field; PageNumber: missing required field"
        );

        let capped = ValidationReport::new(vec![missing(FieldPath::root().key("Text"))])
            .with_suppressed(3);
        assert_eq!(capped.total(), 4);
        assert!(capped.to_string().ends_with("(+3 more)"));
    }

    #[test]
    fn test_error_serializes_flat() {
        let error = missing(FieldPath::root().key("LineItemGroups").index(2));
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "path": "LineItemGroups[2]", "kind": "missing_field" })
        );
    }
}
