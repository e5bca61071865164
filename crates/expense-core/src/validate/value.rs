//! Error-accumulating readers for untyped JSON values.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ValidationError, ValidationErrorKind, ValidationReport};
use crate::models::config::ValidationConfig;

use super::path::FieldPath;
use super::Validate;

/// Domain of identity indices, rendered in range errors.
pub(crate) const INDEX_RANGE: &str = "0..=4294967295";

/// Collects defects while a record is walked.
///
/// Readers never stop at the first problem: each one records what it found
/// and returns `None`, so callers can keep validating siblings. A reader
/// returns `None` only after recording at least one defect.
pub struct Validator {
    config: ValidationConfig,
    errors: Vec<ValidationError>,
    suppressed: usize,
}

impl Validator {
    /// Create a validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            errors: Vec::new(),
            suppressed: 0,
        }
    }

    /// Validate `value`, located at `path`, into a `T`.
    pub fn run<T: Validate>(
        config: &ValidationConfig,
        value: &Value,
        path: &FieldPath,
    ) -> Result<T, ValidationReport> {
        let mut validator = Self::new(config.clone());
        let validated = T::validate(&mut validator, value, path);
        validator.finish(validated)
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Record a defect at `path`.
    pub fn report(&mut self, path: FieldPath, kind: ValidationErrorKind) {
        let within_cap = self
            .config
            .max_reported_errors
            .is_none_or(|max| self.errors.len() < max);

        if within_cap {
            self.errors.push(ValidationError::new(path, kind));
        } else {
            self.suppressed += 1;
        }
    }

    /// Number of defects detected so far, stored or not.
    pub fn error_count(&self) -> usize {
        self.errors.len() + self.suppressed
    }

    /// Turn the walk's outcome into a result.
    pub fn finish<T>(self, validated: Option<T>) -> Result<T, ValidationReport> {
        let total = self.error_count();
        match validated {
            Some(value) if total == 0 => Ok(value),
            _ => {
                debug!(defects = total, "validation rejected input");
                Err(ValidationReport::new(self.errors).with_suppressed(self.suppressed))
            }
        }
    }

    fn mismatch(&mut self, path: &FieldPath, expected: &'static str, found: &Value) {
        self.report(
            path.clone(),
            ValidationErrorKind::TypeMismatch {
                expected,
                found: kind_name(found),
            },
        );
    }

    /// Require `value` to be an object.
    pub fn object<'a>(&mut self, value: &'a Value, path: &FieldPath) -> Option<&'a Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            other => {
                self.mismatch(path, "object", other);
                None
            }
        }
    }

    /// Require `value` to be an array.
    pub fn array<'a>(&mut self, value: &'a Value, path: &FieldPath) -> Option<&'a [Value]> {
        match value {
            Value::Array(items) => Some(items.as_slice()),
            other => {
                self.mismatch(path, "array", other);
                None
            }
        }
    }

    /// Require `value` to be a number.
    pub fn number(&mut self, value: &Value, path: &FieldPath) -> Option<f64> {
        match value.as_f64() {
            Some(n) => Some(n),
            None => {
                self.mismatch(path, "number", value);
                None
            }
        }
    }

    /// Require `value` to be a string. Empty strings are accepted.
    pub fn text(&mut self, value: &Value, path: &FieldPath) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            other => {
                self.mismatch(path, "string", other);
                None
            }
        }
    }

    /// Require `value` to be an integer within `min..=max`.
    ///
    /// Integral floats such as `1.0` count as integers. Numbers with a
    /// fractional part are a type mismatch, not a range error.
    pub fn integer_in(
        &mut self,
        value: &Value,
        path: &FieldPath,
        min: i64,
        max: i64,
        allowed: &'static str,
    ) -> Option<i64> {
        let Value::Number(n) = value else {
            self.mismatch(path, "integer", value);
            return None;
        };

        let integral = if n.is_i64() || n.is_u64() {
            n.as_i64()
        } else {
            match n.as_f64() {
                // Magnitudes past i64 fall through to the range error below.
                Some(f) if f.fract() == 0.0 => {
                    (f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
                }
                _ => {
                    self.report(
                        path.clone(),
                        ValidationErrorKind::TypeMismatch {
                            expected: "integer",
                            found: "number",
                        },
                    );
                    return None;
                }
            }
        };

        match integral {
            Some(i) if (min..=max).contains(&i) => Some(i),
            _ => {
                self.report(
                    path.clone(),
                    ValidationErrorKind::OutOfRange {
                        value: n.as_f64().unwrap_or(f64::NAN),
                        allowed,
                    },
                );
                None
            }
        }
    }

    /// Require `value` to be an identity index (non-negative `u32`).
    pub fn index(&mut self, value: &Value, path: &FieldPath) -> Option<u32> {
        self.integer_in(value, path, 0, i64::from(u32::MAX), INDEX_RANGE)
            .and_then(|i| u32::try_from(i).ok())
    }

    /// Read the mandatory `key` of `record` with `read`.
    pub fn required_field<T>(
        &mut self,
        record: &Map<String, Value>,
        key: &'static str,
        path: &FieldPath,
        read: impl FnOnce(&mut Self, &Value, &FieldPath) -> Option<T>,
    ) -> Option<T> {
        let field_path = path.key(key);
        match record.get(key) {
            Some(value) => read(self, value, &field_path),
            None => {
                self.report(field_path, ValidationErrorKind::MissingField);
                None
            }
        }
    }

    /// Read the optional `key` of `record` with `read`.
    ///
    /// Returns `Some(None)` when the key is absent and `None` when it is
    /// present but invalid. An explicit `null` counts as present.
    pub fn optional_field<T>(
        &mut self,
        record: &Map<String, Value>,
        key: &'static str,
        path: &FieldPath,
        read: impl FnOnce(&mut Self, &Value, &FieldPath) -> Option<T>,
    ) -> Option<Option<T>> {
        match record.get(key) {
            Some(value) => read(self, value, &path.key(key)).map(Some),
            None => Some(None),
        }
    }
}

/// Name of the JSON kind of `value`, as used in type mismatch reports.
pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn validator() -> Validator {
        Validator::new(ValidationConfig::default())
    }

    #[test]
    fn test_integer_in_accepts_bounds() {
        let mut v = validator();
        let path = FieldPath::root().key("PageNumber");
        assert_eq!(v.integer_in(&json!(1), &path, 1, 10, "1..=10"), Some(1));
        assert_eq!(v.integer_in(&json!(10), &path, 1, 10, "1..=10"), Some(10));
        assert_eq!(v.error_count(), 0);
    }

    #[test]
    fn test_integer_in_rejects() {
        let mut v = validator();
        let path = FieldPath::root().key("PageNumber");
        assert_eq!(v.integer_in(&json!(0), &path, 1, 10, "1..=10"), None);
        assert_eq!(v.integer_in(&json!(1.5), &path, 1, 10, "1..=10"), None);
        assert_eq!(v.integer_in(&json!("1"), &path, 1, 10, "1..=10"), None);
        assert_eq!(v.integer_in(&json!(u64::MAX), &path, 1, 10, "1..=10"), None);

        let report = v.finish::<()>(None).unwrap_err();
        let errors = report.errors();
        assert!(errors[0].is_out_of_range());
        assert_eq!(
            errors[1].kind,
            ValidationErrorKind::TypeMismatch {
                expected: "integer",
                found: "number"
            }
        );
        assert_eq!(
            errors[2].kind,
            ValidationErrorKind::TypeMismatch {
                expected: "integer",
                found: "string"
            }
        );
        assert!(errors[3].is_out_of_range());
    }

    #[test]
    fn test_integer_in_accepts_integral_floats() {
        let mut v = validator();
        let path = FieldPath::root().key("ExpenseIndex");
        assert_eq!(v.integer_in(&json!(0.0), &path, 0, 10, "0..=10"), Some(0));
        assert_eq!(v.integer_in(&json!(7.0), &path, 0, 10, "0..=10"), Some(7));
        assert_eq!(v.error_count(), 0);

        assert_eq!(v.integer_in(&json!(-1.0), &path, 0, 10, "0..=10"), None);
        assert_eq!(v.integer_in(&json!(1e300), &path, 0, 10, "0..=10"), None);

        let report = v.finish::<()>(None).unwrap_err();
        assert!(report.errors().iter().all(|e| e.is_out_of_range()));
        assert_eq!(report.errors().len(), 2);
    }

    #[test]
    fn test_optional_field_distinguishes_absent_from_invalid() {
        let mut v = validator();
        let record = json!({ "Text": 5 });
        let map = record.as_object().unwrap();
        let root = FieldPath::root();

        let absent = v.optional_field(map, "Missing", &root, Validator::text);
        assert_eq!(absent, Some(None));

        let invalid = v.optional_field(map, "Text", &root, Validator::text);
        assert_eq!(invalid, None);
        assert_eq!(v.error_count(), 1);
    }

    #[test]
    fn test_reporting_cap_counts_suppressed() {
        let config = ValidationConfig {
            max_reported_errors: Some(1),
            ..ValidationConfig::default()
        };
        let mut v = Validator::new(config);
        let record = json!({});
        let map = record.as_object().unwrap();
        let root = FieldPath::root();

        v.required_field(map, "A", &root, Validator::text);
        v.required_field(map, "B", &root, Validator::text);
        v.required_field(map, "C", &root, Validator::text);

        let report = v.finish::<()>(None).unwrap_err();
        assert_eq!(report.errors().len(), 1);
        assert_eq!(report.suppressed(), 2);
        assert_eq!(report.errors()[0].path.to_string(), "A");
    }

    #[test]
    fn test_zero_cap_still_rejects() {
        let config = ValidationConfig {
            max_reported_errors: Some(0),
            ..ValidationConfig::default()
        };
        let mut v = Validator::new(config);
        let found = v.text(&json!(null), &FieldPath::root());
        let report = v.finish(found).unwrap_err();
        assert!(report.errors().is_empty());
        assert_eq!(report.total(), 1);
    }
}
