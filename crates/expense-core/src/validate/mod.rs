//! Validation of raw expense analysis JSON into typed models.
//!
//! Each model has a small validator that reads its own keys and delegates
//! nested records to the validator of the child type. Defects are recorded
//! with their path and never stop the walk, so a single pass yields every
//! problem in the input.

mod batch;
mod component;
mod document;
mod field;
mod line_item;
mod path;
mod value;

pub use batch::{
    validate_analyze_expense_response, validate_expense_documents, BatchOutcome, DocumentOutcome,
};
pub use document::validate_expense_document;
pub use path::{FieldPath, PathSegment};
pub use value::Validator;
pub(crate) use value::kind_name;

use serde_json::Value;

use crate::error::ValidationReport;
use crate::models::config::ValidationConfig;

/// Key names fixed by the upstream API contract.
pub mod keys {
    pub const CONFIDENCE: &str = "Confidence";
    pub const GEOMETRY: &str = "Geometry";
    pub const TEXT: &str = "Text";
    pub const LABEL_DETECTION: &str = "LabelDetection";
    pub const PAGE_NUMBER: &str = "PageNumber";
    pub const TYPE: &str = "Type";
    pub const VALUE_DETECTION: &str = "ValueDetection";
    pub const LINE_ITEM_EXPENSE_FIELDS: &str = "LineItemExpenseFields";
    pub const LINE_ITEM_GROUP_INDEX: &str = "LineItemGroupIndex";
    pub const LINE_ITEMS: &str = "LineItems";
    pub const EXPENSE_INDEX: &str = "ExpenseIndex";
    pub const LINE_ITEM_GROUPS: &str = "LineItemGroups";
    pub const SUMMARY_FIELDS: &str = "SummaryFields";
    pub const EXPENSE_DOCUMENTS: &str = "ExpenseDocuments";
    pub const DOCUMENT_METADATA: &str = "DocumentMetadata";
    pub const PAGES: &str = "Pages";
}

/// Types that can only be obtained from raw JSON by validation.
pub trait Validate: Sized {
    /// Validate `value`, located at `path`, recording defects in `v`.
    ///
    /// Returns `None` if and only if at least one defect was recorded.
    fn validate(v: &mut Validator, value: &Value, path: &FieldPath) -> Option<Self>;

    /// Validate a standalone record with the default configuration.
    fn from_value(value: &Value) -> Result<Self, ValidationReport> {
        Self::from_value_with(value, &ValidationConfig::default())
    }

    /// Validate a standalone record with `config`.
    fn from_value_with(value: &Value, config: &ValidationConfig) -> Result<Self, ValidationReport> {
        Validator::run(config, value, &FieldPath::root())
    }
}

/// Sequences keep their input order; every element is validated even after
/// an earlier one fails.
impl<T: Validate> Validate for Vec<T> {
    fn validate(v: &mut Validator, value: &Value, path: &FieldPath) -> Option<Self> {
        let items = v.array(value, path)?;

        let mut validated = Vec::with_capacity(items.len());
        let mut complete = true;
        for (i, item) in items.iter().enumerate() {
            match T::validate(v, item, &path.index(i)) {
                Some(t) => validated.push(t),
                None => complete = false,
            }
        }

        complete.then_some(validated)
    }
}

/// Implement `Deserialize` by running the type's validator, so that serde
/// can never produce an instance that skipped validation.
macro_rules! deserialize_via_validate {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl<'de> ::serde::Deserialize<'de> for $ty {
                fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
                where
                    D: ::serde::Deserializer<'de>,
                {
                    let value = <::serde_json::Value as ::serde::Deserialize>::deserialize(deserializer)?;
                    <$ty as $crate::validate::Validate>::from_value(&value)
                        .map_err(<D::Error as ::serde::de::Error>::custom)
                }
            }
        )+
    };
}

pub(crate) use deserialize_via_validate;
