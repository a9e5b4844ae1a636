use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single normalised table value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// A numeric cell, thousands separators already removed.
    Number(f64),
    /// Any cell that did not look numeric, trimmed.
    Text(String),
    /// No value was found for this key.
    #[default]
    Absent,
}

impl Cell {
    /// The numeric value, if this cell is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The text value, if this cell is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }

    /// Build a text cell from an optional string, absent when `None`.
    pub fn from_opt_text(value: Option<&str>) -> Self {
        value.map_or(Cell::Absent, |s| Cell::Text(s.to_string()))
    }

    /// Build a numeric cell from an optional float, absent when `None`.
    pub fn from_opt_f64(value: Option<f64>) -> Self {
        value.map_or(Cell::Absent, Cell::Number)
    }
}

impl fmt::Display for Cell {
    /// Renders the cell the way it appears in tabular output; absent is empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Text(s) => f.write_str(s),
            Cell::Absent => Ok(()),
        }
    }
}

// ── RowRecord ─────────────────────────────────────────────────────────────────

/// One extracted table row, keyed by column name in column order.
///
/// Keys are unique; inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
    cells: Vec<(String, Cell)>,
}

impl RowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair `columns` with `values` positionally.
    ///
    /// Returns `None` when the lengths differ; a mismatched row is never padded
    /// or truncated.
    pub fn zip<S: AsRef<str>>(columns: &[S], values: Vec<Cell>) -> Option<Self> {
        if columns.len() != values.len() {
            return None;
        }
        let mut record = Self::new();
        for (column, value) in columns.iter().zip(values) {
            record.insert(column.as_ref(), value);
        }
        Some(record)
    }

    pub fn insert(&mut self, key: &str, value: Cell) {
        match self.cells.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.cells.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Cell> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// The row label: the text of the first column.
    pub fn label(&self) -> Option<&str> {
        self.cells.first().and_then(|(_, v)| v.as_text())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ── SectionTag ────────────────────────────────────────────────────────────────

/// The nine fixed report sections extracted from every document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionTag {
    LoadProfile,
    InstanceEfficiency,
    TopWaitEvents,
    TimeModel,
    MemoryStats,
    OsStats,
    TablespaceIo,
    SegmentsByPhysicalReads,
    SqlByElapsedTime,
}

impl SectionTag {
    /// Every section, in document order.
    pub const ALL: [SectionTag; 9] = [
        SectionTag::LoadProfile,
        SectionTag::InstanceEfficiency,
        SectionTag::TopWaitEvents,
        SectionTag::TimeModel,
        SectionTag::MemoryStats,
        SectionTag::OsStats,
        SectionTag::TablespaceIo,
        SectionTag::SegmentsByPhysicalReads,
        SectionTag::SqlByElapsedTime,
    ];

    /// The exact `<h2>` heading text that introduces this section.
    pub fn title(self) -> &'static str {
        match self {
            SectionTag::LoadProfile => "Load Profile",
            SectionTag::InstanceEfficiency => "Instance Efficiency (Target 100%)",
            SectionTag::TopWaitEvents => "Top Foreground Events by Wait Time",
            SectionTag::TimeModel => "Time Model Statistics",
            SectionTag::MemoryStats => "Memory Statistics",
            SectionTag::OsStats => "Operating System Statistics",
            SectionTag::TablespaceIo => "Tablespace I/O Stats",
            SectionTag::SegmentsByPhysicalReads => "Segments by Physical Reads",
            SectionTag::SqlByElapsedTime => "SQL ordered by Elapsed Time",
        }
    }

    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.title() == title)
    }
}

impl fmt::Display for SectionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

// ── Report ────────────────────────────────────────────────────────────────────

/// Global metadata from the report header block. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportHeader {
    pub db_name: Option<String>,
    pub db_id: Option<String>,
    pub instance: Option<String>,
    /// Raw start of the snapshot period, not parsed as a timestamp.
    pub start_time: Option<String>,
    /// Raw end of the snapshot period, not parsed as a timestamp.
    pub end_time: Option<String>,
    pub elapsed_minutes: Option<f64>,
    pub db_time_minutes: Option<f64>,
}

/// One parsed performance-snapshot document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub header: ReportHeader,
    pub sections: BTreeMap<SectionTag, Vec<RowRecord>>,
    /// Ground-truth tag embedded in training documents only.
    pub anomaly_label: Option<String>,
    /// Originating file identifier.
    #[serde(default)]
    pub source_name: String,
}

impl Report {
    /// Rows of `tag`, or an empty slice when the section was absent.
    pub fn section(&self, tag: SectionTag) -> &[RowRecord] {
        self.sections.get(&tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Attach the originating file identifier.
    pub fn with_source(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = source_name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Cell ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_cell_accessors() {
        assert_eq!(Cell::Number(1.5).as_f64(), Some(1.5));
        assert_eq!(Cell::Text("x".into()).as_f64(), None);
        assert_eq!(Cell::Text("x".into()).as_text(), Some("x"));
        assert!(Cell::Absent.is_absent());
        assert!(Cell::default().is_absent());
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Number(0.75).to_string(), "0.75");
        assert_eq!(Cell::Text("CPU time".into()).to_string(), "CPU time");
        assert_eq!(Cell::Absent.to_string(), "");
    }

    #[test]
    fn test_cell_serializes_untagged() {
        let json = serde_json::to_string(&vec![
            Cell::Number(2.0),
            Cell::Text("a".into()),
            Cell::Absent,
        ])
        .unwrap();
        assert_eq!(json, r#"[2.0,"a",null]"#);
    }

    // ── RowRecord ─────────────────────────────────────────────────────────────

    #[test]
    fn test_row_record_zip_matching_lengths() {
        let row = RowRecord::zip(
            &["Metric", "Value"],
            vec![Cell::Text("Buffer Hit %".into()), Cell::Number(99.1)],
        )
        .unwrap();
        assert_eq!(row.len(), 2);
        assert_eq!(row.label(), Some("Buffer Hit %"));
        assert_eq!(row.get("Value"), Some(&Cell::Number(99.1)));
    }

    #[test]
    fn test_row_record_zip_mismatch_is_none() {
        let row = RowRecord::zip(&["Metric", "Value"], vec![Cell::Text("x".into())]);
        assert!(row.is_none());
    }

    #[test]
    fn test_row_record_duplicate_key_replaces_in_place() {
        let row = RowRecord::zip(
            &["a", "b", "a"],
            vec![Cell::Text("first".into()), Cell::Number(1.0), Cell::Number(2.0)],
        )
        .unwrap();
        let keys: Vec<&str> = row.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(row.get("a"), Some(&Cell::Number(2.0)));
    }

    // ── SectionTag ────────────────────────────────────────────────────────────

    #[test]
    fn test_section_tag_title_round_trip() {
        for tag in SectionTag::ALL {
            assert_eq!(SectionTag::from_title(tag.title()), Some(tag));
        }
        assert_eq!(SectionTag::from_title("Load profile"), None);
    }

    // ── Report ────────────────────────────────────────────────────────────────

    #[test]
    fn test_report_missing_section_is_empty() {
        let report = Report::default();
        assert!(report.section(SectionTag::OsStats).is_empty());
    }

    #[test]
    fn test_report_with_source() {
        let report = Report::default().with_source("AWR_NORMAL_0001.html");
        assert_eq!(report.source_name, "AWR_NORMAL_0001.html");
    }
}
