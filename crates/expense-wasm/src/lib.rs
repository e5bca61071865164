//! WASM bindings for Textract expense response validation.
//!
//! This crate exposes document and response validation to browsers and
//! Node.js. Validated graphs and defect reports are returned as plain
//! JavaScript objects using the upstream key names.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use expense_core::{
    validate_analyze_expense_response as validate_response_value,
    validate_expense_document as validate_document_value, ValidationConfig,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Validate one expense document given as JSON text.
///
/// Returns the validated document. Throws the defect report, or a JS `Error`
/// when the text is not JSON.
#[wasm_bindgen(js_name = validateExpenseDocument)]
pub fn validate_expense_document(json: &str) -> Result<JsValue, JsValue> {
    ExpenseValidator::new().validate_document(json)
}

/// Validate a full AnalyzeExpense response given as JSON text.
#[wasm_bindgen(js_name = validateAnalyzeExpenseResponse)]
pub fn validate_analyze_expense_response(json: &str) -> Result<JsValue, JsValue> {
    ExpenseValidator::new().validate_response(json)
}

/// Configurable validator class for browser use.
#[wasm_bindgen]
pub struct ExpenseValidator {
    config: ValidationConfig,
}

#[wasm_bindgen]
impl ExpenseValidator {
    /// Create a validator with default settings.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            config: ValidationConfig::default(),
        }
    }

    /// Configure rejection of duplicate line item group indices.
    #[wasm_bindgen(js_name = setRejectDuplicateGroupIndices)]
    pub fn set_reject_duplicate_group_indices(&mut self, reject: bool) {
        self.config.reject_duplicate_group_indices = reject;
    }

    /// Configure the check for expense indices shared within a response.
    #[wasm_bindgen(js_name = setCheckBatchExpenseIndices)]
    pub fn set_check_batch_expense_indices(&mut self, check: bool) {
        self.config.check_batch_expense_indices = check;
    }

    /// Cap the number of defects stored per report.
    #[wasm_bindgen(js_name = setMaxReportedErrors)]
    pub fn set_max_reported_errors(&mut self, max: Option<u32>) {
        self.config.max_reported_errors = max.map(|m| m as usize);
    }

    /// Validate one expense document.
    #[wasm_bindgen(js_name = validateDocument)]
    pub fn validate_document(&self, json: &str) -> Result<JsValue, JsValue> {
        let value = parse(json)?;
        match validate_document_value(&value, &self.config) {
            Ok(document) => to_js(&document),
            Err(report) => Err(to_js(&report)?),
        }
    }

    /// Validate a full response. Invalid documents do not throw; they are
    /// listed in the returned outcome.
    #[wasm_bindgen(js_name = validateResponse)]
    pub fn validate_response(&self, json: &str) -> Result<JsValue, JsValue> {
        let value = parse(json)?;
        match validate_response_value(&value, &self.config) {
            Ok(outcome) => to_js(&outcome),
            Err(report) => Err(to_js(&report)?),
        }
    }

    /// Number of defects in a document, without building JS objects.
    #[wasm_bindgen(js_name = countDefects)]
    pub fn count_defects(&self, json: &str) -> Result<u32, JsValue> {
        let value = parse(json)?;
        Ok(match validate_document_value(&value, &self.config) {
            Ok(_) => 0,
            Err(report) => report.total() as u32,
        })
    }
}

impl Default for ExpenseValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn parse(json: &str) -> Result<serde_json::Value, JsValue> {
    serde_json::from_str(json)
        .map_err(|e| js_sys::Error::new(&format!("invalid JSON: {}", e)).into())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const EMPTY_DOCUMENT: &str = r#"{ "ExpenseIndex": 0, "LineItemGroups": [], "SummaryFields": [] }"#;

    #[wasm_bindgen_test]
    fn test_validate_empty_document() {
        assert!(validate_expense_document(EMPTY_DOCUMENT).is_ok());
    }

    #[wasm_bindgen_test]
    fn test_count_defects() {
        let validator = ExpenseValidator::new();
        assert_eq!(validator.count_defects(EMPTY_DOCUMENT).unwrap(), 0);
        assert_eq!(validator.count_defects(r#"{ "ExpenseIndex": -1 }"#).unwrap(), 3);
    }

    #[wasm_bindgen_test]
    fn test_invalid_json_rejects() {
        assert!(validate_expense_document("{").is_err());
    }

    #[wasm_bindgen_test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
