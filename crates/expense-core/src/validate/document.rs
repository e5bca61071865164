//! Validation of whole expense documents, the root of the graph.

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::ValidationReport;
use crate::models::config::ValidationConfig;
use crate::models::expense::{ExpenseDocument, Field, LineItemGroup};

use super::keys::{EXPENSE_INDEX, LINE_ITEM_GROUPS, SUMMARY_FIELDS};
use super::line_item::check_unique_group_indices;
use super::{FieldPath, Validate, Validator};

impl Validate for ExpenseDocument {
    fn validate(v: &mut Validator, value: &Value, path: &FieldPath) -> Option<Self> {
        trace!(%path, "validating expense document");
        let record = v.object(value, path)?;

        let index = v.required_field(record, EXPENSE_INDEX, path, Validator::index);
        let groups = v.required_field(record, LINE_ITEM_GROUPS, path, |v, value, path| {
            let groups = Vec::<LineItemGroup>::validate(v, value, path);
            let unique = match value.as_array() {
                Some(raw) if v.config().reject_duplicate_group_indices => {
                    check_unique_group_indices(v, raw, path)
                }
                _ => true,
            };
            groups.filter(|_| unique)
        });
        let summary_fields = v.required_field(record, SUMMARY_FIELDS, path, Vec::<Field>::validate);

        Some(ExpenseDocument::from_parts(index?, groups?, summary_fields?))
    }
}

/// Validate one expense document record.
///
/// Every defect in the document is reported, each with its path from the
/// document root. Uniqueness of `ExpenseIndex` across a response is not
/// checked here; see [`super::validate_expense_documents`].
pub fn validate_expense_document(
    value: &Value,
    config: &ValidationConfig,
) -> Result<ExpenseDocument, ValidationReport> {
    let result = Validator::run::<ExpenseDocument>(config, value, &FieldPath::root());
    match &result {
        Ok(document) => debug!(
            expense_index = document.index(),
            groups = document.line_item_groups().len(),
            summary_fields = document.summary_fields().len(),
            "expense document accepted"
        ),
        Err(report) => debug!(defects = report.total(), "expense document rejected"),
    }
    result
}
