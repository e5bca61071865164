//! Configuration for expense validation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ExpenseError, Result};

/// Validation behavior that callers may tune.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Reject documents whose line item groups share a `LineItemGroupIndex`.
    pub reject_duplicate_group_indices: bool,

    /// Report documents of one response that share an `ExpenseIndex`.
    pub check_batch_expense_indices: bool,

    /// Store at most this many defects per report (None = unlimited).
    /// Defects beyond the cap are still detected and counted.
    pub max_reported_errors: Option<usize>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            reject_duplicate_group_indices: true,
            check_batch_expense_indices: true,
            max_reported_errors: None,
        }
    }
}

impl ValidationConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| ExpenseError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
