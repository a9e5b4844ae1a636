//! Directory-wide batch parsing.
//!
//! Every report in a directory is parsed and flattened on a bounded pool of
//! blocking workers. Rows are buffered in memory and committed to the sink in
//! one piece once all documents have finished, so a failure can never leave a
//! partially written table behind.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use awr_core::error::{AwrError, Result};
use awr_core::flatten::{flatten, FlatRecord};
use awr_core::schema::{FLAT_COLUMNS, SOURCE_NAME};
use awr_core::settings::FailurePolicy;
use awr_parser::parser::{source_name, ReportParser};
use awr_parser::reader::find_report_files;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{error, info, warn};

use crate::sink::RecordSink;

/// Progress is logged every this many finished documents.
const PROGRESS_EVERY: usize = 50;

// ── Public types ──────────────────────────────────────────────────────────────

/// How a batch is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum number of documents parsed concurrently.
    pub workers: usize,
    pub policy: FailurePolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            policy: FailurePolicy::Abort,
        }
    }
}

/// One document left out of the output under [`FailurePolicy::Skip`].
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub document: String,
    pub error: String,
}

/// Outcome of a committed batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// RFC 3339 timestamp when the batch finished.
    pub generated_at: String,
    /// Number of report files discovered.
    pub files_found: usize,
    /// Number of documents parsed, flattened and committed.
    pub processed: usize,
    /// Documents skipped because they failed to parse.
    pub failures: Vec<BatchFailure>,
    /// Row count per embedded `anomaly_type` value.
    pub label_distribution: BTreeMap<String, usize>,
    /// Absent cells across the whole committed table.
    pub missing_values: usize,
    /// Rows identical to an earlier row in every column but `filename`.
    pub duplicate_rows: usize,
    /// Wall-clock seconds spent parsing and committing.
    pub elapsed_seconds: f64,
}

// ── BatchRunner ───────────────────────────────────────────────────────────────

/// Parses a directory of reports into one table.
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    parser: ReportParser,
    options: BatchOptions,
}

impl BatchRunner {
    pub fn new(options: BatchOptions) -> Self {
        Self {
            parser: ReportParser::new(),
            options: BatchOptions {
                workers: options.workers.max(1),
                ..options
            },
        }
    }

    pub fn options(&self) -> BatchOptions {
        self.options
    }

    /// Parse every `.html` report in `input_dir` and commit the rows to `sink`.
    ///
    /// Documents are started in file-name order and rows are committed in
    /// that order. Under [`FailurePolicy::Abort`] the first failing document
    /// in file-name order stops the batch and nothing is committed; the
    /// returned [`AwrError::Batch`] names it and counts the documents before
    /// it. Under [`FailurePolicy::Skip`] failures are logged and listed in the
    /// summary.
    pub async fn run<S: RecordSink>(
        &self,
        input_dir: &Path,
        sink: &mut S,
    ) -> Result<BatchSummary> {
        let started = Instant::now();
        if !input_dir.is_dir() {
            return Err(AwrError::DataPathNotFound(input_dir.to_path_buf()));
        }

        info!("Parsing all reports from: {}", input_dir.display());
        let files = find_report_files(input_dir);
        info!("found {} HTML files", files.len());

        let abort = self.options.policy == FailurePolicy::Abort;
        let semaphore = Arc::new(Semaphore::new(self.options.workers));
        let mut tasks = JoinSet::new();
        let mut handles: BTreeMap<usize, AbortHandle> = BTreeMap::new();
        let mut next = 0usize;
        // Lowest index known to have failed; only set under Abort.
        let mut cutoff: Option<usize> = None;

        let mut rows: Vec<(usize, FlatRecord)> = Vec::with_capacity(files.len());
        let mut failures: Vec<(usize, String, AwrError)> = Vec::new();
        let mut finished = 0usize;

        loop {
            // Start documents strictly in index order, one per free permit.
            while next < files.len() && cutoff.map_or(true, |k| next < k) {
                let Ok(permit) = Arc::clone(&semaphore).try_acquire_owned() else {
                    break;
                };
                let index = next;
                let path = files[index].clone();
                let parser = self.parser;
                let handle = tasks.spawn(async move {
                    let _permit = permit;
                    let name = source_name(&path);
                    let outcome = tokio::task::spawn_blocking(move || flatten_file(&parser, &path))
                        .await
                        .unwrap_or_else(|e| Err(AwrError::Other(anyhow_from_join(e))));
                    (index, name, outcome)
                });
                handles.insert(index, handle);
                next += 1;
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            let (index, name, outcome) = match joined {
                Ok(v) => v,
                Err(e) if e.is_cancelled() => continue,
                Err(e) => return Err(AwrError::Other(anyhow_from_join(e))),
            };
            handles.remove(&index);
            if cutoff.is_some_and(|k| index > k) {
                continue;
            }
            finished += 1;

            match outcome {
                Ok(record) => rows.push((index, record)),
                Err(e) => {
                    error!("Failed to parse {}: {}", name, e);
                    if abort {
                        cutoff = Some(cutoff.map_or(index, |k| k.min(index)));
                        for handle in handles.range(index + 1..).map(|(_, h)| h) {
                            handle.abort();
                        }
                    }
                    failures.push((index, name, e));
                }
            }

            if finished % PROGRESS_EVERY == 0 {
                info!("Parsed {}/{} reports", finished, files.len());
            }
        }

        if abort {
            failures.sort_by_key(|(index, _, _)| *index);
            if let Some((first, document, source)) = failures.into_iter().next() {
                let processed = rows.iter().filter(|(index, _)| *index < first).count();
                warn!(
                    "batch aborted at {}; {} earlier report(s) succeeded, nothing committed",
                    document, processed
                );
                return Err(AwrError::Batch {
                    document,
                    processed,
                    source: Box::new(source),
                });
            }
            failures = Vec::new();
        }

        rows.sort_by_key(|(index, _)| *index);
        let records: Vec<FlatRecord> = rows.into_iter().map(|(_, record)| record).collect();
        sink.commit(FLAT_COLUMNS, &records)?;

        failures.sort_by_key(|(index, _, _)| *index);
        let failures: Vec<BatchFailure> = failures
            .into_iter()
            .map(|(_, document, e)| BatchFailure {
                document,
                error: e.to_string(),
            })
            .collect();
        if !failures.is_empty() {
            warn!("{} report(s) skipped after parse failures", failures.len());
        }

        let summary = BatchSummary {
            generated_at: Utc::now().to_rfc3339(),
            files_found: files.len(),
            processed: records.len(),
            failures,
            label_distribution: label_distribution(&records),
            missing_values: records.iter().map(FlatRecord::absent_count).sum(),
            duplicate_rows: duplicate_rows(&records),
            elapsed_seconds: started.elapsed().as_secs_f64(),
        };

        info!(
            "Parsed {} reports ({} skipped), {} missing values, {} duplicated rows",
            summary.processed,
            summary.failures.len(),
            summary.missing_values,
            summary.duplicate_rows
        );
        info!("Anomaly distribution: {:?}", summary.label_distribution);

        Ok(summary)
    }
}

/// Parse and flatten one report file, tagging it with its file name.
pub fn flatten_file(parser: &ReportParser, path: &Path) -> Result<FlatRecord> {
    let report = parser.parse_file(path)?.with_source(source_name(path));
    Ok(flatten(&report))
}

fn label_distribution(records: &[FlatRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for label in records
        .iter()
        .filter_map(|r| r.get("anomaly_type").and_then(|c| c.as_text()))
    {
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Rows repeating an earlier row in every column but the file name.
fn duplicate_rows(records: &[FlatRecord]) -> usize {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|record| {
            let key: Vec<String> = record
                .iter()
                .filter(|(column, _)| *column != SOURCE_NAME)
                .map(|(_, cell)| cell.to_string())
                .collect();
            !seen.insert(key.join("\u{1f}"))
        })
        .count()
}

fn anyhow_from_join(e: tokio::task::JoinError) -> anyhow::Error {
    anyhow::anyhow!("parse worker failed: {e}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use awr_core::models::Cell;
    use std::path::PathBuf;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct MemorySink {
        commits: usize,
        columns: Vec<String>,
        rows: Vec<FlatRecord>,
    }

    impl RecordSink for MemorySink {
        fn commit(&mut self, columns: &[&str], rows: &[FlatRecord]) -> Result<()> {
            self.commits += 1;
            self.columns = columns.iter().map(|c| c.to_string()).collect();
            self.rows.extend_from_slice(rows);
            Ok(())
        }
    }

    fn report_html(db_name: &str, label: &str, db_time: f64) -> String {
        format!(
            r#"<html><body>
<div class="hdr">
DB Name: {db_name} | DB Id: 1 | Instance: 1<br>
Period: 2024-01-01 00:00:00 to 2024-01-01 01:00:00<br>
Elapsed: 60.00 min | DB Time: 45.00 min
</div>
<div class="sec"><h2>Load Profile</h2><table>
<tr><th>Metric</th><th>Per Second</th><th>Per Transaction</th></tr>
<tr><td>DB Time(s):</td><td>{db_time}</td><td>0.1</td></tr>
</table></div>
<div class="sec"><p><strong>Report Type:</strong> {label}</p></div>
</body></html>"#
        )
    }

    fn write_report(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn write_good_reports(dir: &Path, count: usize) {
        for i in 0..count {
            let label = if i % 2 == 0 { "NORMAL" } else { "CPU_SPIKE" };
            write_report(
                dir,
                &format!("AWR_{i:04}.html"),
                &report_html(&format!("DB{i}"), label, 0.5 + i as f64),
            );
        }
    }

    const MALFORMED: &str = "<html><body><p>not an AWR report</p></body></html>";

    fn runner(workers: usize, policy: FailurePolicy) -> BatchRunner {
        BatchRunner::new(BatchOptions { workers, policy })
    }

    // ── Success ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_run_all_documents_committed_in_name_order() {
        let dir = TempDir::new().unwrap();
        write_good_reports(dir.path(), 5);
        write_report(dir.path(), "ignored.txt", "x");

        let mut sink = MemorySink::default();
        let summary = runner(3, FailurePolicy::Abort)
            .run(dir.path(), &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.files_found, 5);
        assert_eq!(summary.processed, 5);
        assert!(summary.failures.is_empty());
        assert_eq!(sink.commits, 1);
        assert_eq!(sink.columns.len(), FLAT_COLUMNS.len());
        let names: Vec<String> = sink
            .rows
            .iter()
            .map(|r| r.get("filename").unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "AWR_0000.html",
                "AWR_0001.html",
                "AWR_0002.html",
                "AWR_0003.html",
                "AWR_0004.html",
            ]
        );
        assert_eq!(sink.rows[2].number("db_time_per_sec"), Some(2.5));
        assert_eq!(sink.rows[2].get("db_name"), Some(&Cell::Text("DB2".into())));
    }

    #[tokio::test]
    async fn test_run_summary_label_distribution_and_missing_values() {
        let dir = TempDir::new().unwrap();
        write_good_reports(dir.path(), 3);

        let mut sink = MemorySink::default();
        let summary = runner(2, FailurePolicy::Abort)
            .run(dir.path(), &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.label_distribution.get("NORMAL"), Some(&2));
        assert_eq!(summary.label_distribution.get("CPU_SPIKE"), Some(&1));
        let expected_missing: usize = sink.rows.iter().map(FlatRecord::absent_count).sum();
        assert_eq!(summary.missing_values, expected_missing);
        assert!(summary.missing_values > 0);
    }

    #[tokio::test]
    async fn test_run_summary_counts_duplicate_rows() {
        let dir = TempDir::new().unwrap();
        let html = report_html("PRODDB", "NORMAL", 1.0);
        write_report(dir.path(), "AWR_a.html", &html);
        write_report(dir.path(), "AWR_b.html", &html);
        write_report(dir.path(), "AWR_c.html", &report_html("PRODDB", "NORMAL", 2.0));

        let mut sink = MemorySink::default();
        let summary = runner(2, FailurePolicy::Abort)
            .run(dir.path(), &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.processed, 3);
        assert_eq!(summary.duplicate_rows, 1);
    }

    #[tokio::test]
    async fn test_run_rows_share_key_set() {
        let dir = TempDir::new().unwrap();
        write_good_reports(dir.path(), 2);
        write_report(
            dir.path(),
            "AWR_bare.html",
            "<html><body><div class=\"hdr\">nothing useful</div></body></html>",
        );

        let mut sink = MemorySink::default();
        runner(2, FailurePolicy::Abort)
            .run(dir.path(), &mut sink)
            .await
            .unwrap();

        assert_eq!(sink.rows.len(), 3);
        for row in &sink.rows {
            assert_eq!(row.values().len(), FLAT_COLUMNS.len());
        }
    }

    #[tokio::test]
    async fn test_run_empty_directory_commits_header_only() {
        let dir = TempDir::new().unwrap();
        let mut sink = MemorySink::default();
        let summary = runner(1, FailurePolicy::Abort)
            .run(dir.path(), &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.processed, 0);
        assert_eq!(sink.commits, 1);
        assert!(sink.rows.is_empty());
    }

    #[tokio::test]
    async fn test_run_missing_directory() {
        let mut sink = MemorySink::default();
        let err = runner(1, FailurePolicy::Skip)
            .run(Path::new("/tmp/awr-profiler-no-such-dir"), &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, AwrError::DataPathNotFound(_)));
        assert_eq!(sink.commits, 0);
    }

    // ── Failure policies ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_abort_policy_commits_nothing_and_names_document() {
        let dir = TempDir::new().unwrap();
        write_good_reports(dir.path(), 4);
        write_report(dir.path(), "AWR_0002_bad.html", MALFORMED);

        let mut sink = MemorySink::default();
        let err = runner(1, FailurePolicy::Abort)
            .run(dir.path(), &mut sink)
            .await
            .unwrap_err();

        assert_eq!(sink.commits, 0);
        assert!(sink.rows.is_empty());
        match err {
            AwrError::Batch {
                document,
                processed,
                source,
            } => {
                assert_eq!(document, "AWR_0002_bad.html");
                assert_eq!(processed, 3);
                assert!(source.is_document_fault());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_abort_policy_names_earliest_of_several_failures() {
        let dir = TempDir::new().unwrap();
        write_good_reports(dir.path(), 40);
        write_report(dir.path(), "AWR_0005.html", MALFORMED);
        write_report(dir.path(), "AWR_0035.html", MALFORMED);

        for _ in 0..10 {
            let mut sink = MemorySink::default();
            let err = runner(4, FailurePolicy::Abort)
                .run(dir.path(), &mut sink)
                .await
                .unwrap_err();

            assert_eq!(sink.commits, 0);
            match err {
                AwrError::Batch {
                    document,
                    processed,
                    ..
                } => {
                    assert_eq!(document, "AWR_0005.html");
                    assert_eq!(processed, 5);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_abort_policy_fails_on_dangling_report_symlink() {
        let dir = TempDir::new().unwrap();
        write_good_reports(dir.path(), 1);
        let target = dir.path().join("nowhere.html");
        std::os::unix::fs::symlink(target, dir.path().join("AWR_0001.html")).unwrap();

        let mut sink = MemorySink::default();
        let err = runner(2, FailurePolicy::Abort)
            .run(dir.path(), &mut sink)
            .await
            .unwrap_err();

        assert_eq!(sink.commits, 0);
        match err {
            AwrError::Batch {
                document,
                processed,
                source,
            } => {
                assert_eq!(document, "AWR_0001.html");
                assert_eq!(processed, 1);
                assert!(source.is_document_fault());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_skip_policy_reports_dangling_report_symlink() {
        let dir = TempDir::new().unwrap();
        write_good_reports(dir.path(), 1);
        let target = dir.path().join("nowhere.html");
        std::os::unix::fs::symlink(target, dir.path().join("AWR_0001.html")).unwrap();

        let mut sink = MemorySink::default();
        let summary = runner(2, FailurePolicy::Skip)
            .run(dir.path(), &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.files_found, 2);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].document, "AWR_0001.html");
    }

    #[tokio::test]
    async fn test_skip_policy_commits_remaining_rows() {
        let dir = TempDir::new().unwrap();
        write_good_reports(dir.path(), 4);
        write_report(dir.path(), "AWR_0002_bad.html", MALFORMED);

        let mut sink = MemorySink::default();
        let summary = runner(4, FailurePolicy::Skip)
            .run(dir.path(), &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.files_found, 5);
        assert_eq!(summary.processed, 4);
        assert_eq!(sink.rows.len(), 4);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].document, "AWR_0002_bad.html");
        assert!(summary.failures[0].error.contains("header"));
    }

    #[test]
    fn test_runner_clamps_zero_workers() {
        let runner = runner(0, FailurePolicy::Skip);
        assert_eq!(runner.options().workers, 1);
    }

    // ── flatten_file ──────────────────────────────────────────────────────────

    #[test]
    fn test_flatten_file_attaches_source_name() {
        let dir = TempDir::new().unwrap();
        let path = write_report(dir.path(), "AWR_X.html", &report_html("X", "NORMAL", 1.0));
        let flat = flatten_file(&ReportParser::new(), &path).unwrap();
        assert_eq!(flat.get("filename"), Some(&Cell::Text("AWR_X.html".into())));
        assert_eq!(flat.get("anomaly_type"), Some(&Cell::Text("NORMAL".into())));
    }
}
