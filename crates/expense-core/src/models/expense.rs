//! Expense analysis data models for invoices and receipts.
//!
//! Every type here is immutable once built. Instances come either from the
//! validators in [`crate::validate`] or from constructors that take already
//! checked values, so the invariants hold for the lifetime of the object.
//! Serialization uses the upstream key names.

use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroU32;

use serde::Serialize;

use crate::error::{ValidationError, ValidationErrorKind, ValidationReport};
use crate::models::geometry::Geometry;
use crate::validate::{keys, FieldPath};

/// Detection confidence, a percentage in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    /// Rendered domain, used in range errors.
    pub(crate) const RANGE: &'static str = "[0, 100]";

    /// Accept `value` if it lies in `[0, 100]`. Out-of-range values are
    /// rejected, never clamped.
    pub fn new(value: f64) -> Result<Self, ValidationErrorKind> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationErrorKind::OutOfRange {
                value,
                allowed: Self::RANGE,
            })
        }
    }

    /// Percentage value.
    pub fn get(self) -> f64 {
        self.0
    }

    /// Confidence as a fraction in `[0, 1]`.
    pub fn as_fraction(self) -> f64 {
        self.0 / 100.0
    }
}

/// One-based page number within the analyzed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PageNumber(NonZeroU32);

impl PageNumber {
    pub(crate) const RANGE: &'static str = "1..=4294967295";

    /// Accept `value` if it is a positive page number.
    pub fn new(value: i64) -> Result<Self, ValidationErrorKind> {
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(ValidationErrorKind::OutOfRange {
                value: value as f64,
                allowed: Self::RANGE,
            })
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// A piece of text detected on the page, with its confidence and location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComponentDetection {
    confidence: Confidence,
    geometry: Geometry,
    text: String,
}

impl ComponentDetection {
    pub fn new(confidence: Confidence, geometry: Geometry, text: impl Into<String>) -> Self {
        Self {
            confidence,
            geometry,
            text: text.into(),
        }
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Detected text. May be empty when nothing legible was found.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Normalized classification of a field, such as `TOTAL` or `VENDOR_NAME`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldType {
    confidence: Confidence,
    text: String,
}

impl FieldType {
    pub fn new(confidence: Confidence, text: impl Into<String>) -> Self {
        Self {
            confidence,
            text: text.into(),
        }
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A labeled key/value pair found on one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Absent when the label was inferred rather than read from the page.
    #[serde(rename = "LabelDetection", skip_serializing_if = "Option::is_none")]
    label_detection: Option<ComponentDetection>,

    #[serde(rename = "PageNumber")]
    page_number: PageNumber,

    #[serde(rename = "Type")]
    field_type: FieldType,

    #[serde(rename = "ValueDetection")]
    value_detection: ComponentDetection,
}

impl Field {
    /// Create a field without a detected label.
    pub fn new(
        field_type: FieldType,
        value_detection: ComponentDetection,
        page_number: PageNumber,
    ) -> Self {
        Self {
            label_detection: None,
            page_number,
            field_type,
            value_detection,
        }
    }

    /// Attach the label that was detected on the page.
    pub fn with_label_detection(mut self, label: ComponentDetection) -> Self {
        self.label_detection = Some(label);
        self
    }

    pub fn label_detection(&self) -> Option<&ComponentDetection> {
        self.label_detection.as_ref()
    }

    pub fn page_number(&self) -> PageNumber {
        self.page_number
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn value_detection(&self) -> &ComponentDetection {
        &self.value_detection
    }

    /// Label text as printed on the page, if one was detected.
    pub fn label_text(&self) -> Option<&str> {
        self.label_detection.as_ref().map(ComponentDetection::text)
    }

    pub fn value_text(&self) -> &str {
        self.value_detection.text()
    }

    /// Whether the field is classified as `type_text` (e.g. `"TOTAL"`).
    pub fn is_type(&self, type_text: &str) -> bool {
        self.field_type.text == type_text
    }
}

/// One row of an itemized expense.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineItem {
    #[serde(rename = "LineItemExpenseFields")]
    expense_fields: Vec<Field>,
}

impl LineItem {
    pub fn new(expense_fields: Vec<Field>) -> Self {
        Self { expense_fields }
    }

    /// Fields in detection order.
    pub fn expense_fields(&self) -> &[Field] {
        &self.expense_fields
    }

    /// A line item without recognized fields is valid but carries nothing.
    pub fn is_empty(&self) -> bool {
        self.expense_fields.is_empty()
    }

    /// First field of the given type, e.g. `"ITEM"` or `"PRICE"`.
    pub fn field(&self, type_text: &str) -> Option<&Field> {
        self.expense_fields.iter().find(|f| f.is_type(type_text))
    }
}

/// A table of line items sharing one index within a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItemGroup {
    #[serde(rename = "LineItemGroupIndex")]
    index: u32,

    #[serde(rename = "LineItems")]
    line_items: Vec<LineItem>,
}

impl LineItemGroup {
    pub fn new(index: u32, line_items: Vec<LineItem>) -> Self {
        Self { index, line_items }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Line items in detection order.
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }
}

/// One expense (invoice or receipt) found in the analyzed file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseDocument {
    #[serde(rename = "ExpenseIndex")]
    index: u32,

    #[serde(rename = "LineItemGroups")]
    line_item_groups: Vec<LineItemGroup>,

    #[serde(rename = "SummaryFields")]
    summary_fields: Vec<Field>,
}

impl ExpenseDocument {
    /// Create a document, rejecting groups that share an index.
    pub fn new(
        index: u32,
        line_item_groups: Vec<LineItemGroup>,
        summary_fields: Vec<Field>,
    ) -> Result<Self, ValidationReport> {
        let groups_path = FieldPath::root().key(keys::LINE_ITEM_GROUPS);
        let mut first_seen: HashMap<u32, usize> = HashMap::new();
        let mut errors = Vec::new();

        for (position, group) in line_item_groups.iter().enumerate() {
            if let Some(&first) = first_seen.get(&group.index) {
                errors.push(ValidationError::new(
                    groups_path.index(position).key(keys::LINE_ITEM_GROUP_INDEX),
                    ValidationErrorKind::DuplicateIndex {
                        index: group.index,
                        first: groups_path.index(first).key(keys::LINE_ITEM_GROUP_INDEX),
                    },
                ));
            } else {
                first_seen.insert(group.index, position);
            }
        }

        if errors.is_empty() {
            Ok(Self::from_parts(index, line_item_groups, summary_fields))
        } else {
            Err(ValidationReport::new(errors))
        }
    }

    /// Assemble a document whose group indices were already checked, or
    /// deliberately left unchecked by configuration.
    pub(crate) fn from_parts(
        index: u32,
        line_item_groups: Vec<LineItemGroup>,
        summary_fields: Vec<Field>,
    ) -> Self {
        Self {
            index,
            line_item_groups,
            summary_fields,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn line_item_groups(&self) -> &[LineItemGroup] {
        &self.line_item_groups
    }

    /// Document-level fields not tied to a line item, in detection order.
    pub fn summary_fields(&self) -> &[Field] {
        &self.summary_fields
    }

    /// First summary field of the given type, e.g. `"TOTAL"`.
    pub fn summary_field(&self, type_text: &str) -> Option<&Field> {
        self.summary_fields.iter().find(|f| f.is_type(type_text))
    }

    /// The group carrying `index`, if any.
    pub fn group(&self, index: u32) -> Option<&LineItemGroup> {
        self.line_item_groups.iter().find(|g| g.index == index)
    }

    /// All line items of all groups, in order.
    pub fn line_items(&self) -> impl Iterator<Item = &LineItem> {
        self.line_item_groups.iter().flat_map(|g| g.line_items.iter())
    }

    /// Every field of the document: summary fields first, then line item
    /// fields group by group.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.summary_fields
            .iter()
            .chain(self.line_items().flat_map(|item| item.expense_fields.iter()))
    }

    /// Pages referenced by any field.
    pub fn pages(&self) -> BTreeSet<PageNumber> {
        self.fields().map(Field::page_number).collect()
    }

    /// Whether the document carries no groups and no summary fields.
    pub fn is_empty(&self) -> bool {
        self.line_item_groups.is_empty() && self.summary_fields.is_empty()
    }
}

crate::validate::deserialize_via_validate!(
    Confidence,
    PageNumber,
    ComponentDetection,
    FieldType,
    Field,
    LineItem,
    LineItemGroup,
    ExpenseDocument,
);
