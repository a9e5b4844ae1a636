//! Projection of a structured [`Report`] into one flat feature record.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::{Cell, Report, SectionTag};
use crate::schema::{
    column_index, top_event_key, CPU_PCT_OF_DB_TIME, FLAT_COLUMNS, PHYSICAL_TO_LOGICAL_RATIO,
    PROJECTIONS, SOURCE_NAME, TOP_EVENT_COLUMNS, TOP_EVENT_RANKS,
};

// ── FlatRecord ────────────────────────────────────────────────────────────────

/// One row of batch output: a value for every key in [`FLAT_COLUMNS`].
///
/// The key set is fixed; only value presence varies between records.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecord {
    values: Vec<Cell>,
}

impl Default for FlatRecord {
    fn default() -> Self {
        Self {
            values: vec![Cell::Absent; FLAT_COLUMNS.len()],
        }
    }
}

impl FlatRecord {
    /// A record with every key absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `key`; `None` only for keys outside the fixed column set.
    pub fn get(&self, key: &str) -> Option<&Cell> {
        column_index(key).map(|i| &self.values[i])
    }

    /// Numeric value of `key`, if present and numeric.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Cell::as_f64)
    }

    /// Set `key`. Returns `false` (and changes nothing) for unknown keys.
    pub fn set(&mut self, key: &str, value: Cell) -> bool {
        match column_index(key) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        FLAT_COLUMNS
    }

    /// Values in column order.
    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Cell)> {
        FLAT_COLUMNS.iter().copied().zip(self.values.iter())
    }

    /// Number of absent values.
    pub fn absent_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_absent()).count()
    }
}

impl Serialize for FlatRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ── Flattener ─────────────────────────────────────────────────────────────────

/// Project `report` into a [`FlatRecord`].
///
/// Total over any report: missing sections or rows leave their keys absent.
pub fn flatten(report: &Report) -> FlatRecord {
    let mut flat = FlatRecord::new();
    let header = &report.header;

    let source = (!report.source_name.is_empty()).then_some(report.source_name.as_str());
    flat.set(SOURCE_NAME, Cell::from_opt_text(source));
    flat.set("db_name", Cell::from_opt_text(header.db_name.as_deref()));
    flat.set("db_id", Cell::from_opt_text(header.db_id.as_deref()));
    flat.set("instance", Cell::from_opt_text(header.instance.as_deref()));
    flat.set("start_time", Cell::from_opt_text(header.start_time.as_deref()));
    flat.set("end_time", Cell::from_opt_text(header.end_time.as_deref()));
    flat.set("elapsed_min", Cell::from_opt_f64(header.elapsed_minutes));
    flat.set("db_time_min", Cell::from_opt_f64(header.db_time_minutes));
    flat.set("anomaly_type", Cell::from_opt_text(report.anomaly_label.as_deref()));

    for tag in SectionTag::ALL {
        project_section(report, tag, &mut flat);
    }
    project_top_events(report, &mut flat);

    let cpu_pct = guarded_ratio(&flat, "db_cpu_per_sec", "db_time_per_sec").map(|r| r * 100.0);
    flat.set(CPU_PCT_OF_DB_TIME, Cell::from_opt_f64(cpu_pct));
    let phys_to_logical = guarded_ratio(&flat, "physical_reads_per_sec", "logical_reads_per_sec");
    flat.set(PHYSICAL_TO_LOGICAL_RATIO, Cell::from_opt_f64(phys_to_logical));

    flat
}

fn project_section(report: &Report, tag: SectionTag, flat: &mut FlatRecord) {
    let projections: Vec<_> = PROJECTIONS.iter().filter(|p| p.section == tag).collect();
    if projections.is_empty() {
        return;
    }

    for row in report.section(tag) {
        let Some(label) = row.label() else { continue };
        for p in projections.iter().filter(|p| p.label == label) {
            let value = row.get(p.column).cloned().unwrap_or_default();
            flat.set(p.key, value);
        }
    }
}

fn project_top_events(report: &Report, flat: &mut FlatRecord) {
    let rows = report.section(SectionTag::TopWaitEvents);
    for (rank, row) in rows.iter().take(TOP_EVENT_RANKS).enumerate() {
        for (column, suffix) in TOP_EVENT_COLUMNS {
            let value = row.get(column).cloned().unwrap_or_default();
            flat.set(&top_event_key(rank + 1, suffix), value);
        }
    }
}

/// `numerator / denominator` when both are numeric and the denominator is
/// strictly positive.
fn guarded_ratio(flat: &FlatRecord, numerator: &str, denominator: &str) -> Option<f64> {
    let den = flat.number(denominator).filter(|d| *d > 0.0)?;
    let num = flat.number(numerator)?;
    Some(num / den)
}
