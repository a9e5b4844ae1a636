mod bootstrap;

use anyhow::{Context, Result};
use awr_core::error::AwrError;
use awr_core::settings::Settings;
use awr_parser::ReportParser;
use awr_runtime::batch::{flatten_file, BatchOptions, BatchRunner};
use awr_runtime::sink::CsvSink;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("AWR Profiler v{} starting", env!("CARGO_PKG_VERSION"));

    match settings.mode.as_str() {
        "parse" => parse_one(&settings),
        _ => run_batch(&settings).await,
    }
}

/// Parse every report in `--input-dir` and write the flat table to `--output`.
async fn run_batch(settings: &Settings) -> Result<()> {
    let options = BatchOptions {
        workers: settings.workers as usize,
        policy: settings.failure_policy(),
    };
    tracing::info!(
        "Input: {}, Output: {}, Workers: {}, On error: {}",
        settings.input_dir.display(),
        settings.output.display(),
        options.workers,
        options.policy
    );

    let mut sink = CsvSink::create(&settings.output);
    let summary = BatchRunner::new(options)
        .run(&settings.input_dir, &mut sink)
        .await?;

    println!(
        "Parsed {} of {} reports in {:.2}s -> {}",
        summary.processed,
        summary.files_found,
        summary.elapsed_seconds,
        sink.path().display()
    );
    for failure in &summary.failures {
        println!("  skipped {}: {}", failure.document, failure.error);
    }
    Ok(())
}

/// Parse the single `--file` report and print its flat record as JSON.
fn parse_one(settings: &Settings) -> Result<()> {
    let path = settings
        .file
        .as_ref()
        .ok_or_else(|| AwrError::Config("--file is required in parse mode".to_string()))?;

    let record = match flatten_file(&ReportParser::new(), path) {
        Ok(record) => record,
        Err(e) if e.is_document_fault() => {
            return Err(anyhow::Error::new(e).context("malformed input"));
        }
        Err(e) => return Err(e.into()),
    };

    let json = serde_json::to_string_pretty(&record).context("serialising flat record")?;
    println!("{json}");
    Ok(())
}
