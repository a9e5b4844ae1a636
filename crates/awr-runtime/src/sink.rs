//! Output sinks for flattened batch tables.

use std::io::Write;
use std::path::{Path, PathBuf};

use awr_core::error::{AwrError, Result};
use awr_core::flatten::FlatRecord;
use tracing::info;

/// Destination for one rectangular batch table.
///
/// `commit` is called at most once per batch, with every row at once.
pub trait RecordSink {
    fn commit(&mut self, columns: &[&str], rows: &[FlatRecord]) -> Result<()>;
}

/// Write `rows` as CSV: one header line of `columns`, then one line per record.
///
/// Absent values become empty fields.
pub fn write_csv<W: Write>(writer: W, columns: &[&str], rows: &[FlatRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(columns)?;
    for row in rows {
        wtr.write_record(row.values().iter().map(|cell| cell.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

// ── CsvSink ───────────────────────────────────────────────────────────────────

/// Writes the batch table to a CSV file, atomically.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn create(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for CsvSink {
    fn commit(&mut self, columns: &[&str], rows: &[FlatRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Write to a temp file then rename so readers never see a partial table.
        let tmp = self.path.with_extension("csv.tmp");
        let written = std::fs::File::create(&tmp)
            .map_err(AwrError::from)
            .and_then(|file| write_csv(std::io::BufWriter::new(file), columns, rows));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        std::fs::rename(&tmp, &self.path)?;

        info!("saved {} rows to: {}", rows.len(), self.path.display());
        Ok(())
    }
}
