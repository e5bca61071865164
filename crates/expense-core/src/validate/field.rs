//! Validation of labeled expense fields.

use serde_json::Value;
use tracing::trace;

use crate::models::expense::{ComponentDetection, Confidence, Field, FieldType, PageNumber};

use super::keys::{CONFIDENCE, LABEL_DETECTION, PAGE_NUMBER, TEXT, TYPE, VALUE_DETECTION};
use super::{FieldPath, Validate, Validator};

impl Validate for PageNumber {
    fn validate(v: &mut Validator, value: &Value, path: &FieldPath) -> Option<Self> {
        // Range is checked by `PageNumber::new` so the reported domain matches.
        let n = v.integer_in(value, path, i64::MIN, i64::MAX, PageNumber::RANGE)?;
        match PageNumber::new(n) {
            Ok(page) => Some(page),
            Err(kind) => {
                v.report(path.clone(), kind);
                None
            }
        }
    }
}

impl Validate for FieldType {
    fn validate(v: &mut Validator, value: &Value, path: &FieldPath) -> Option<Self> {
        let record = v.object(value, path)?;

        let confidence = v.required_field(record, CONFIDENCE, path, Confidence::validate);
        let text = v.required_field(record, TEXT, path, Validator::text);

        Some(FieldType::new(confidence?, text?))
    }
}

impl Validate for Field {
    fn validate(v: &mut Validator, value: &Value, path: &FieldPath) -> Option<Self> {
        trace!(%path, "validating field");
        let record = v.object(value, path)?;

        let label = v.optional_field(record, LABEL_DETECTION, path, ComponentDetection::validate);
        let page_number = v.required_field(record, PAGE_NUMBER, path, PageNumber::validate);
        let field_type = v.required_field(record, TYPE, path, FieldType::validate);
        let value_detection =
            v.required_field(record, VALUE_DETECTION, path, ComponentDetection::validate);

        let field = Field::new(field_type?, value_detection?, page_number?);
        Some(match label? {
            Some(label) => field.with_label_detection(label),
            None => field,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn detection(text: &str) -> Value {
        json!({ "Confidence": 99.1, "Geometry": {}, "Text": text })
    }

    fn total_field() -> Value {
        json!({
            "LabelDetection": detection("Total:"),
            "PageNumber": 1,
            "Type": { "Confidence": 90, "Text": "TOTAL" },
            "ValueDetection": detection("$12.40")
        })
    }

    #[test]
    fn test_valid_field() {
        let field = Field::from_value(&total_field()).unwrap();
        assert_eq!(field.page_number().get(), 1);
        assert_eq!(field.field_type().text(), "TOTAL");
        assert_eq!(field.field_type().confidence().get(), 90.0);
        assert_eq!(field.label_text(), Some("Total:"));
        assert_eq!(field.value_text(), "$12.40");
    }

    #[test]
    fn test_missing_value_detection() {
        let input = json!({ "PageNumber": 1, "Type": { "Confidence": 90, "Text": "TOTAL" } });
        let report = Field::from_value(&input).unwrap_err();
        assert_eq!(report.errors().len(), 1);
        assert_eq!(report.errors()[0].path.to_string(), "ValueDetection");
        assert_eq!(report.errors()[0].kind, ValidationErrorKind::MissingField);
    }

    #[test]
    fn test_label_detection_is_optional() {
        let mut input = total_field();
        input.as_object_mut().unwrap().remove("LabelDetection");
        let field = Field::from_value(&input).unwrap();
        assert!(field.label_detection().is_none());
    }

    #[test]
    fn test_invalid_label_detection_is_rejected() {
        let mut input = total_field();
        input["LabelDetection"].as_object_mut().unwrap().remove("Text");
        let report = Field::from_value(&input).unwrap_err();
        assert_eq!(report.errors().len(), 1);
        assert_eq!(report.errors()[0].path.to_string(), "LabelDetection.Text");
        assert!(report.errors()[0].is_missing_field());
    }

    #[test]
    fn test_null_label_detection_is_present() {
        let mut input = total_field();
        input["LabelDetection"] = Value::Null;
        let report = Field::from_value(&input).unwrap_err();
        assert_eq!(
            report.errors()[0].kind,
            ValidationErrorKind::TypeMismatch { expected: "object", found: "null" }
        );
    }

    #[test]
    fn test_page_number_must_be_positive() {
        for page in [json!(0), json!(-1), json!(-4096)] {
            let mut input = total_field();
            input["PageNumber"] = page;
            let report = Field::from_value(&input).unwrap_err();
            assert_eq!(report.errors().len(), 1);
            assert_eq!(report.errors()[0].path.to_string(), "PageNumber");
            assert!(report.errors()[0].is_out_of_range());
        }

        let mut input = total_field();
        input["PageNumber"] = json!(2.5);
        let report = Field::from_value(&input).unwrap_err();
        assert!(report.errors()[0].is_type_mismatch());

        let mut input = total_field();
        input["PageNumber"] = json!(12);
        assert_eq!(Field::from_value(&input).unwrap().page_number().get(), 12);
    }

    #[test]
    fn test_page_number_written_as_float() {
        let mut input = total_field();
        input["PageNumber"] = json!(1.0);
        assert_eq!(Field::from_value(&input).unwrap().page_number().get(), 1);

        input["PageNumber"] = json!(0.0);
        let report = Field::from_value(&input).unwrap_err();
        assert_eq!(report.errors().len(), 1);
        assert_eq!(report.errors()[0].path.to_string(), "PageNumber");
        assert_eq!(
            report.errors()[0].kind,
            ValidationErrorKind::OutOfRange { value: 0.0, allowed: PageNumber::RANGE }
        );
    }

    #[test]
    fn test_field_type_text_may_be_empty() {
        let mut input = total_field();
        input["Type"] = json!({ "Confidence": 0, "Text": "" });
        let field = Field::from_value(&input).unwrap();
        assert_eq!(field.field_type().text(), "");
    }

    #[test]
    fn test_errors_from_all_parts_are_collected() {
        let input = json!({
            "LabelDetection": { "Confidence": 101, "Geometry": {}, "Text": "Tax" },
            "PageNumber": 0,
            "Type": { "Text": "TAX" }
        });
        let report = Field::from_value(&input).unwrap_err();
        let paths: Vec<String> = report.errors().iter().map(|e| e.path.to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "LabelDetection.Confidence",
                "PageNumber",
                "Type.Confidence",
                "ValueDetection",
            ]
        );
    }

    #[test]
    fn test_deserialize_runs_validation() {
        let parsed: Result<Field, _> = serde_json::from_value(json!({ "PageNumber": 1 }));
        let message = parsed.unwrap_err().to_string();
        assert!(message.contains("Type: missing required field"), "{}", message);
    }
}
