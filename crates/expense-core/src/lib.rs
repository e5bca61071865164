//! Core library for ingesting Textract expense analysis responses.
//!
//! This crate provides:
//! - Typed, immutable models for expense documents, line items and fields
//! - Recursive validation of raw JSON into those models
//! - Path-annotated defect reports that list every problem in one pass
//! - Batch validation of full `AnalyzeExpense` responses

pub mod error;
pub mod models;
pub mod validate;

pub use error::{ExpenseError, Result, ValidationError, ValidationErrorKind, ValidationReport};
pub use models::config::ValidationConfig;
pub use models::expense::{
    ComponentDetection, Confidence, ExpenseDocument, Field, FieldType, LineItem, LineItemGroup,
    PageNumber,
};
pub use models::geometry::Geometry;
pub use validate::{
    validate_analyze_expense_response, validate_expense_document, validate_expense_documents,
    BatchOutcome, DocumentOutcome, FieldPath, PathSegment, Validate, Validator,
};
