//! Validation of detected text components.

use serde_json::Value;
use tracing::trace;

use crate::models::expense::{ComponentDetection, Confidence};
use crate::models::geometry::Geometry;

use super::keys::{CONFIDENCE, GEOMETRY, TEXT};
use super::{FieldPath, Validate, Validator};

impl Validate for Confidence {
    fn validate(v: &mut Validator, value: &Value, path: &FieldPath) -> Option<Self> {
        let n = v.number(value, path)?;
        match Confidence::new(n) {
            Ok(confidence) => Some(confidence),
            Err(kind) => {
                v.report(path.clone(), kind);
                None
            }
        }
    }
}

impl Validate for ComponentDetection {
    fn validate(v: &mut Validator, value: &Value, path: &FieldPath) -> Option<Self> {
        trace!(%path, "validating component detection");
        let record = v.object(value, path)?;

        let confidence = v.required_field(record, CONFIDENCE, path, Confidence::validate);
        let geometry = v.required_field(record, GEOMETRY, path, Geometry::validate);
        let text = v.required_field(record, TEXT, path, Validator::text);

        Some(ComponentDetection::new(confidence?, geometry?, text?))
    }
}
