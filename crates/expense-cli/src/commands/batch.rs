//! Batch validation command for multiple expense JSON files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use expense_core::ValidationConfig;

use super::validate::{read_json, Checked, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for per-file results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Treat every input as a full AnalyzeExpense response
    #[arg(long)]
    response: bool,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue when a file cannot be read or parsed
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of checking a single file.
struct FileResult {
    path: PathBuf,
    checked: Option<Checked>,
    error: Option<String>,
    processing_time_ms: u64,
}

impl FileResult {
    fn status(&self) -> &'static str {
        match &self.checked {
            Some(checked) if checked.defect_count() == 0 => "valid",
            Some(_) => "invalid",
            None => "error",
        }
    }
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::config::load(config_path)?;

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to validate",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let result = check_file(&path, args.response, &config);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(checked) => {
                if checked.defect_count() > 0 {
                    warn!(
                        "{}: {} defects",
                        path.display(),
                        checked.defect_count()
                    );
                }
                results.push(FileResult {
                    path,
                    checked: Some(checked),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to read {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        path,
                        checked: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to read {}: {}", path.display(), error_msg);
                    pb.abandon();
                    anyhow::bail!("Validation aborted: {}", error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();

    if let Some(output_dir) = &args.output_dir {
        write_outputs(output_dir, &results, args.format)?;
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let valid = results.iter().filter(|r| r.status() == "valid").count();
    let invalid = results.iter().filter(|r| r.status() == "invalid").count();
    let failed = results.iter().filter(|r| r.status() == "error").count();

    println!();
    println!(
        "{} Validated {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} valid, {} invalid, {} unreadable",
        style(valid).green(),
        style(invalid).yellow(),
        style(failed).red()
    );

    let problems: Vec<_> = results.iter().filter(|r| r.status() != "valid").collect();
    if !problems.is_empty() {
        println!();
        println!("{}", style("Files with problems:").red());
        for result in &problems {
            let detail = match (&result.checked, &result.error) {
                (Some(checked), _) => format!("{} defects", checked.defect_count()),
                (None, Some(error)) => error.clone(),
                (None, None) => "unknown error".to_string(),
            };
            println!("  - {}: {}", result.path.display(), detail);
        }
        anyhow::bail!("{} of {} files did not validate", problems.len(), results.len());
    }

    Ok(())
}

fn check_file(path: &Path, response: bool, config: &ValidationConfig) -> anyhow::Result<Checked> {
    let value = read_json(path)?;
    Ok(Checked::check(&value, response, config))
}

fn write_outputs(output_dir: &Path, results: &[FileResult], format: OutputFormat) -> anyhow::Result<()> {
    for result in results {
        let Some(checked) = &result.checked else {
            continue;
        };

        let output_name = result
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("expense");

        let (extension, content) = match format {
            OutputFormat::Json => ("json", checked.to_json()?),
            OutputFormat::Text => ("txt", checked.to_text()),
        };

        let output_path = output_dir.join(format!("{}.{}", output_name, extension));
        fs::write(&output_path, content)?;
        debug!("Wrote output to {}", output_path.display());
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "documents",
        "valid_documents",
        "defects",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");

        match &result.checked {
            Some(checked) => wtr.write_record([
                filename,
                result.status(),
                &checked.document_count().to_string(),
                &checked.valid_count().to_string(),
                &checked.defect_count().to_string(),
                &result.processing_time_ms.to_string(),
                "",
            ])?,
            None => wtr.write_record([
                filename,
                result.status(),
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?,
        }
    }

    wtr.flush()?;
    Ok(())
}
