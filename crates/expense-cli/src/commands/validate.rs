//! Validate command - check a single expense document or response file.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use serde_json::Value;
use tracing::{debug, info};

use expense_core::{
    validate_analyze_expense_response, validate_expense_document, BatchOutcome, ExpenseDocument,
    ValidationConfig, ValidationReport,
};

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Input JSON file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Treat the input as a full AnalyzeExpense response
    #[arg(long)]
    response: bool,

    /// Store at most this many defects per report
    #[arg(long)]
    max_errors: Option<usize>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

/// What validation found in one input file.
pub enum Checked {
    /// A single document that passed validation.
    Document(ExpenseDocument),
    /// A single document, or a whole response, that was rejected.
    Rejected(ValidationReport),
    /// A response whose documents were validated one by one.
    Response(BatchOutcome),
}

impl Checked {
    /// Validate `value` as a document, or as a full response when `response` is set.
    pub fn check(value: &Value, response: bool, config: &ValidationConfig) -> Self {
        if response {
            match validate_analyze_expense_response(value, config) {
                Ok(outcome) => Self::Response(outcome),
                Err(report) => Self::Rejected(report),
            }
        } else {
            match validate_expense_document(value, config) {
                Ok(document) => Self::Document(document),
                Err(report) => Self::Rejected(report),
            }
        }
    }

    pub fn document_count(&self) -> usize {
        match self {
            Self::Document(_) | Self::Rejected(_) => 1,
            Self::Response(outcome) => outcome.documents().len(),
        }
    }

    pub fn valid_count(&self) -> usize {
        match self {
            Self::Document(_) => 1,
            Self::Rejected(_) => 0,
            Self::Response(outcome) => outcome.valid_documents().count(),
        }
    }

    /// Number of defects found, including those beyond the reporting cap.
    pub fn defect_count(&self) -> usize {
        match self {
            Self::Document(_) => 0,
            Self::Rejected(report) => report.total(),
            Self::Response(outcome) => {
                outcome
                    .documents()
                    .iter()
                    .filter_map(|d| d.report())
                    .map(ValidationReport::total)
                    .sum::<usize>()
                    + outcome.batch_errors().len()
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Self::Document(document) => serde_json::to_string_pretty(document),
            Self::Rejected(report) => serde_json::to_string_pretty(report),
            Self::Response(outcome) => serde_json::to_string_pretty(outcome),
        }
    }

    pub fn to_text(&self) -> String {
        let mut output = String::new();
        match self {
            Self::Document(document) => format_document_text(&mut output, document),
            Self::Rejected(report) => format_report_text(&mut output, report, ""),
            Self::Response(outcome) => {
                if let Some(pages) = outcome.pages() {
                    let _ = writeln!(output, "Pages: {}", pages.get());
                }
                for document in outcome.documents() {
                    let _ = writeln!(output, "Document #{}", document.position());
                    match (document.document(), document.report()) {
                        (Some(valid), _) => format_document_text(&mut output, valid),
                        (None, Some(report)) => format_report_text(&mut output, report, "  "),
                        (None, None) => {}
                    }
                }
                if !outcome.batch_errors().is_empty() {
                    output.push_str("Batch defects:\n");
                    for error in outcome.batch_errors() {
                        let _ = writeln!(output, "  - {}", error);
                    }
                }
            }
        }
        output
    }
}

pub fn run(args: ValidateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = super::config::load(config_path)?;
    if args.max_errors.is_some() {
        config.max_reported_errors = args.max_errors;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Validating file: {}", args.input.display());

    let value = read_json(&args.input)?;
    let checked = Checked::check(&value, args.response, &config);

    let output = match args.format {
        OutputFormat::Json => checked.to_json()?,
        OutputFormat::Text => checked.to_text(),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    let defects = checked.defect_count();
    debug!(
        documents = checked.document_count(),
        valid = checked.valid_count(),
        defects,
        "validation finished"
    );

    if defects > 0 {
        anyhow::bail!(
            "{} defect{} found in {}",
            defects,
            if defects == 1 { "" } else { "s" },
            args.input.display()
        );
    }

    Ok(())
}

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> anyhow::Result<Value> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid JSON in {}: {}", path.display(), e))
}

fn format_document_text(output: &mut String, document: &ExpenseDocument) {
    let _ = writeln!(output, "Expense document {}", document.index());

    let _ = writeln!(output, "  Summary fields: {}", document.summary_fields().len());
    for field in document.summary_fields() {
        let _ = writeln!(
            output,
            "    {}: {} (page {}, {:.1}%)",
            field.field_type().text(),
            field.value_text(),
            field.page_number().get(),
            field.value_detection().confidence().get()
        );
    }

    let _ = writeln!(output, "  Line item groups: {}", document.line_item_groups().len());
    for group in document.line_item_groups() {
        let _ = writeln!(
            output,
            "    Group {}: {} line items",
            group.index(),
            group.line_items().len()
        );
        for (i, item) in group.line_items().iter().enumerate() {
            let fields: Vec<String> = item
                .expense_fields()
                .iter()
                .map(|f| format!("{}={}", f.field_type().text(), f.value_text()))
                .collect();
            let _ = writeln!(output, "      [{}] {}", i, fields.join(", "));
        }
    }
}

fn format_report_text(output: &mut String, report: &ValidationReport, indent: &str) {
    let total = report.total();
    let _ = writeln!(
        output,
        "{}Rejected: {} defect{}",
        indent,
        total,
        if total == 1 { "" } else { "s" }
    );
    for error in report.errors() {
        let _ = writeln!(output, "{}  - {}", indent, error);
    }
    if report.suppressed() > 0 {
        let _ = writeln!(output, "{}  ... and {} more", indent, report.suppressed());
    }
}
