//! Opaque on-page location of a detected element.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ValidationErrorKind;
use crate::validate::{FieldPath, Validate, Validator};

/// Bounding region of a detection, kept exactly as the API sent it.
///
/// Its inner shape (bounding box, polygon) belongs to the geometry model of
/// the wider response parser. Here it only has to be present and be a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Geometry(Map<String, Value>);

impl Geometry {
    /// Wrap an already-parsed geometry record.
    pub fn new(record: Map<String, Value>) -> Self {
        Self(record)
    }

    /// Accept `value` as a geometry if it is a record.
    pub fn from_json(value: Value) -> Result<Self, ValidationErrorKind> {
        match value {
            Value::Object(record) => Ok(Self(record)),
            other => Err(ValidationErrorKind::TypeMismatch {
                expected: "object",
                found: crate::validate::kind_name(&other),
            }),
        }
    }

    /// Look up a top-level member such as `BoundingBox` or `Polygon`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl Validate for Geometry {
    fn validate(v: &mut Validator, value: &Value, path: &FieldPath) -> Option<Self> {
        v.object(value, path).map(|record| Self(record.clone()))
    }
}

crate::validate::deserialize_via_validate!(Geometry);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_geometry_keeps_members() {
        let geometry = Geometry::from_json(json!({
            "BoundingBox": { "Width": 0.1, "Height": 0.02, "Left": 0.5, "Top": 0.3 },
            "Polygon": []
        }))
        .unwrap();

        assert_eq!(geometry.get("BoundingBox").unwrap()["Left"], json!(0.5));
        assert!(geometry.get("Polygon").unwrap().as_array().unwrap().is_empty());
    }

    #[test]
    fn test_geometry_must_be_record() {
        let err = Geometry::from_json(json!([0.1, 0.2])).unwrap_err();
        assert_eq!(
            err,
            ValidationErrorKind::TypeMismatch {
                expected: "object",
                found: "array"
            }
        );
        assert!(Geometry::from_value(&json!("box")).is_err());
    }

    #[test]
    fn test_empty_record_is_a_geometry() {
        let geometry: Geometry = serde_json::from_str("{}").unwrap();
        assert!(geometry.as_map().is_empty());
    }
}
