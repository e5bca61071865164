//! Validation of the expense documents returned by one API call.

use std::collections::HashMap;

use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ValidationError, ValidationErrorKind, ValidationReport};
use crate::models::config::ValidationConfig;
use crate::models::expense::{ExpenseDocument, PageNumber};

use super::keys::{DOCUMENT_METADATA, EXPENSE_DOCUMENTS, EXPENSE_INDEX, PAGES};
use super::{FieldPath, Validate, Validator};

/// Result of validating one document of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOutcome {
    position: usize,
    result: Result<ExpenseDocument, ValidationReport>,
}

impl DocumentOutcome {
    /// Position of the document in the `ExpenseDocuments` array.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_valid(&self) -> bool {
        self.result.is_ok()
    }

    pub fn document(&self) -> Option<&ExpenseDocument> {
        self.result.as_ref().ok()
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        self.result.as_ref().err()
    }

    pub fn into_result(self) -> Result<ExpenseDocument, ValidationReport> {
        self.result
    }
}

impl Serialize for DocumentOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            position: usize,
            valid: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            document: Option<&'a ExpenseDocument>,
            #[serde(skip_serializing_if = "Option::is_none")]
            defects: Option<&'a ValidationReport>,
        }

        Repr {
            position: self.position,
            valid: self.is_valid(),
            document: self.document(),
            defects: self.report(),
        }
        .serialize(serializer)
    }
}

/// Per-document outcomes of a batch plus defects that span documents.
///
/// Documents are validated independently: one malformed document never
/// prevents the others from being accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    documents: Vec<DocumentOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    batch_errors: Vec<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pages: Option<PageNumber>,
}

impl BatchOutcome {
    /// Outcomes in input order.
    pub fn documents(&self) -> &[DocumentOutcome] {
        &self.documents
    }

    /// Documents that passed validation.
    pub fn valid_documents(&self) -> impl Iterator<Item = &ExpenseDocument> {
        self.documents.iter().filter_map(DocumentOutcome::document)
    }

    pub fn invalid_count(&self) -> usize {
        self.documents.iter().filter(|d| !d.is_valid()).count()
    }

    /// Defects involving more than one document, such as a shared
    /// `ExpenseIndex`.
    pub fn batch_errors(&self) -> &[ValidationError] {
        &self.batch_errors
    }

    /// Page count declared in `DocumentMetadata`, when a full response was
    /// validated.
    pub fn pages(&self) -> Option<PageNumber> {
        self.pages
    }

    /// Whether every document and the batch as a whole are valid.
    pub fn is_fully_valid(&self) -> bool {
        self.batch_errors.is_empty() && self.documents.iter().all(DocumentOutcome::is_valid)
    }

    /// Keep only the documents that passed validation.
    pub fn into_valid_documents(self) -> Vec<ExpenseDocument> {
        self.documents
            .into_iter()
            .filter_map(|d| d.result.ok())
            .collect()
    }
}

/// Validate each record of an `ExpenseDocuments` array.
///
/// Paths in the outcomes start at `ExpenseDocuments[i]`. When
/// `check_batch_expense_indices` is set, documents sharing an `ExpenseIndex`
/// are reported as batch errors; the documents themselves stay valid.
pub fn validate_expense_documents(documents: &[Value], config: &ValidationConfig) -> BatchOutcome {
    let base = FieldPath::root().key(EXPENSE_DOCUMENTS);

    let outcomes: Vec<DocumentOutcome> = documents
        .iter()
        .enumerate()
        .map(|(position, value)| DocumentOutcome {
            position,
            result: Validator::run::<ExpenseDocument>(config, value, &base.index(position)),
        })
        .collect();

    let batch_errors = if config.check_batch_expense_indices {
        duplicate_expense_indices(documents, &base)
    } else {
        Vec::new()
    };

    let outcome = BatchOutcome {
        documents: outcomes,
        batch_errors,
        pages: None,
    };

    info!(
        documents = outcome.documents.len(),
        invalid = outcome.invalid_count(),
        batch_errors = outcome.batch_errors.len(),
        "validated expense documents"
    );

    outcome
}

/// Validate a full `AnalyzeExpense` response object.
///
/// Fails only when the response itself is unusable (not a record, or without
/// an `ExpenseDocuments` array). A malformed `DocumentMetadata.Pages` is
/// reported as a batch error.
pub fn validate_analyze_expense_response(
    response: &Value,
    config: &ValidationConfig,
) -> Result<BatchOutcome, ValidationReport> {
    let root = FieldPath::root();
    let mut v = Validator::new(config.clone());

    let documents_path = root.key(EXPENSE_DOCUMENTS);
    let documents = v
        .object(response, &root)
        .and_then(|record| match record.get(EXPENSE_DOCUMENTS) {
            Some(value) => v.array(value, &documents_path),
            None => {
                v.report(documents_path.clone(), ValidationErrorKind::MissingField);
                None
            }
        });
    let documents = v.finish(documents)?;

    let mut outcome = validate_expense_documents(documents, config);

    if let Some(metadata) = response.get(DOCUMENT_METADATA) {
        let mut v = Validator::new(config.clone());
        let metadata_path = root.key(DOCUMENT_METADATA);
        let pages = v
            .object(metadata, &metadata_path)
            .and_then(|record| v.optional_field(record, PAGES, &metadata_path, PageNumber::validate));

        match v.finish(pages) {
            Ok(pages) => outcome.pages = pages,
            Err(report) => outcome.batch_errors.extend(report.into_errors()),
        }
    }

    Ok(outcome)
}

fn duplicate_expense_indices(documents: &[Value], base: &FieldPath) -> Vec<ValidationError> {
    let index_path = |position: usize| base.index(position).key(EXPENSE_INDEX);
    let mut first_seen: HashMap<u32, usize> = HashMap::new();
    let mut errors = Vec::new();

    for (position, document) in documents.iter().enumerate() {
        let Some(index) = document
            .get(EXPENSE_INDEX)
            .and_then(Value::as_u64)
            .and_then(|i| u32::try_from(i).ok())
        else {
            continue;
        };

        match first_seen.get(&index) {
            Some(&first) => {
                warn!(expense_index = index, first, position, "expense index shared by two documents");
                errors.push(ValidationError::new(
                    index_path(position),
                    ValidationErrorKind::DuplicateIndex {
                        index,
                        first: index_path(first),
                    },
                ));
            }
            None => {
                first_seen.insert(index, position);
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn document(index: i64) -> Value {
        json!({
            "ExpenseIndex": index,
            "LineItemGroups": [],
            "SummaryFields": [{
                "PageNumber": 1,
                "Type": { "Confidence": 99, "Text": "TOTAL" },
                "ValueDetection": { "Confidence": 98, "Geometry": {}, "Text": "10.00" }
            }]
        })
    }

    fn response(documents: Vec<Value>) -> Value {
        json!({ "DocumentMetadata": { "Pages": 2 }, "ExpenseDocuments": documents })
    }

    #[test]
    fn test_documents_validate_independently() {
        let mut broken = document(2);
        broken["SummaryFields"][0]["Type"]["Confidence"] = json!(-5);

        let outcome = validate_expense_documents(
            &[document(1), broken, document(3)],
            &ValidationConfig::default(),
        );

        assert_eq!(outcome.documents().len(), 3);
        assert_eq!(outcome.invalid_count(), 1);
        assert!(!outcome.is_fully_valid());

        let report = outcome.documents()[1].report().unwrap();
        assert_eq!(
            report.errors()[0].path.to_string(),
            "ExpenseDocuments[1].SummaryFields[0].Type.Confidence"
        );

        let indices: Vec<u32> = outcome.valid_documents().map(ExpenseDocument::index).collect();
        assert_eq!(indices, vec![1, 3]);
    }

    #[test]
    fn test_duplicate_expense_index_is_batch_error() {
        let outcome = validate_expense_documents(
            &[document(1), document(2), document(1)],
            &ValidationConfig::default(),
        );

        assert_eq!(outcome.invalid_count(), 0);
        assert_eq!(outcome.batch_errors().len(), 1);
        let error = &outcome.batch_errors()[0];
        assert_eq!(error.path.to_string(), "ExpenseDocuments[2].ExpenseIndex");
        assert_eq!(
            error.kind,
            ValidationErrorKind::DuplicateIndex {
                index: 1,
                first: FieldPath::root().key("ExpenseDocuments").index(0).key("ExpenseIndex"),
            }
        );
    }

    #[test]
    fn test_duplicate_expense_index_check_can_be_disabled() {
        let config = ValidationConfig {
            check_batch_expense_indices: false,
            ..ValidationConfig::default()
        };
        let outcome = validate_expense_documents(&[document(1), document(1)], &config);
        assert!(outcome.is_fully_valid());
    }

    #[test]
    fn test_full_response() {
        let outcome = validate_analyze_expense_response(
            &response(vec![document(1), document(2)]),
            &ValidationConfig::default(),
        )
        .unwrap();

        assert!(outcome.is_fully_valid());
        assert_eq!(outcome.pages().map(PageNumber::get), Some(2));
        assert_eq!(outcome.into_valid_documents().len(), 2);
    }

    #[test]
    fn test_response_without_documents() {
        let report = validate_analyze_expense_response(
            &json!({ "DocumentMetadata": { "Pages": 1 } }),
            &ValidationConfig::default(),
        )
        .unwrap_err();
        assert_eq!(report.errors()[0].path.to_string(), "ExpenseDocuments");
        assert!(report.errors()[0].is_missing_field());

        let report =
            validate_analyze_expense_response(&json!([]), &ValidationConfig::default()).unwrap_err();
        assert!(report.errors()[0].is_type_mismatch());
    }

    #[test]
    fn test_bad_page_count_is_batch_error() {
        let mut input = response(vec![document(0)]);
        input["DocumentMetadata"]["Pages"] = json!(0);

        let outcome = validate_analyze_expense_response(&input, &ValidationConfig::default()).unwrap();
        assert_eq!(outcome.invalid_count(), 0);
        assert_eq!(outcome.batch_errors()[0].path.to_string(), "DocumentMetadata.Pages");
        assert!(outcome.pages().is_none());
    }

    #[test]
    fn test_outcome_serialization() {
        let mut broken = document(5);
        broken.as_object_mut().unwrap().remove("SummaryFields");
        let outcome = validate_expense_documents(&[broken], &ValidationConfig::default());

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            json!({
                "documents": [{
                    "position": 0,
                    "valid": false,
                    "defects": {
                        "errors": [{ "path": "ExpenseDocuments[0].SummaryFields", "kind": "missing_field" }]
                    }
                }]
            })
        );
    }
}
