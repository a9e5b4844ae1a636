//! Fixed lookup tables that define the output column set.
//!
//! Changing any table here changes the shape of every flattened record and
//! must be accompanied by a bump of [`FALLBACK_SCHEMA_VERSION`].

use crate::models::SectionTag;

/// Version of the fallback-schema and projection tables.
pub const FALLBACK_SCHEMA_VERSION: u32 = 1;

/// Column names substituted when a section table has no `<th>` header row.
///
/// Names are stored in their cleaned form so that fallback and explicit
/// headers produce identical keys.
pub const FALLBACK_SCHEMAS: &[(SectionTag, &[&str])] = &[
    (SectionTag::LoadProfile, &["Metric", "Per_Second", "Per_Transaction"]),
    (SectionTag::InstanceEfficiency, &["metric", "Value"]),
    (SectionTag::TopWaitEvents, &["Event", "Waits", "Time_s", "Avg_ms", "DB"]),
    (SectionTag::TimeModel, &["Statistic", "Time_s", "DB_Time"]),
    (SectionTag::MemoryStats, &["metric", "Value"]),
    (SectionTag::OsStats, &["metric", "Value"]),
    (
        SectionTag::TablespaceIo,
        &["Tablespace", "Reads", "Writes", "Read_Time_s", "Write_Time_s"],
    ),
    (
        SectionTag::SegmentsByPhysicalReads,
        &["Owner", "Object_Name", "Object_Type", "Physical_Reads"],
    ),
    (
        SectionTag::SqlByElapsedTime,
        &["SQL_ID", "Execs", "Elapsed_s", "CPU_s", "SQL_Text"],
    ),
];

/// Look up the fallback column list for `tag`.
pub fn fallback_schema(tag: SectionTag) -> &'static [&'static str] {
    FALLBACK_SCHEMAS
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, cols)| *cols)
        .unwrap_or(&[])
}

// ── Projection table ──────────────────────────────────────────────────────────

/// Maps one labelled row of one section to one flat key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    pub section: SectionTag,
    /// Row label to match, case-exact, trailing colon already stripped.
    pub label: &'static str,
    /// Column of the matched row to read.
    pub column: &'static str,
    pub key: &'static str,
}

const fn project(
    section: SectionTag,
    label: &'static str,
    column: &'static str,
    key: &'static str,
) -> Projection {
    Projection {
        section,
        label,
        column,
        key,
    }
}

pub const PROJECTIONS: &[Projection] = &[
    project(SectionTag::LoadProfile, "DB Time(s)", "Per_Second", "db_time_per_sec"),
    project(SectionTag::LoadProfile, "DB CPU(s)", "Per_Second", "db_cpu_per_sec"),
    project(SectionTag::LoadProfile, "Redo size", "Per_Second", "redo_size_per_sec"),
    project(SectionTag::LoadProfile, "Logical reads", "Per_Second", "logical_reads_per_sec"),
    project(SectionTag::LoadProfile, "Physical reads", "Per_Second", "physical_reads_per_sec"),
    project(SectionTag::LoadProfile, "Executes", "Per_Second", "executes_per_sec"),
    project(SectionTag::LoadProfile, "Transactions", "Per_Second", "transactions_per_sec"),
    project(SectionTag::InstanceEfficiency, "Buffer Hit %", "Value", "buffer_hit_pct"),
    project(SectionTag::InstanceEfficiency, "Library Hit %", "Value", "library_hit_pct"),
    project(SectionTag::InstanceEfficiency, "Soft Parse %", "Value", "soft_parse_pct"),
    project(SectionTag::InstanceEfficiency, "Latch Hit %", "Value", "latch_hit_pct"),
    project(SectionTag::TimeModel, "parse time elapsed", "DB_Time", "parse_time_pct"),
    project(SectionTag::TimeModel, "hard parse elapsed time", "DB_Time", "hard_parse_pct"),
    project(SectionTag::MemoryStats, "SGA Size (MB)", "Value", "sga_size_mb"),
    project(SectionTag::MemoryStats, "PGA Allocated (MB)", "Value", "pga_allocated_mb"),
    project(SectionTag::MemoryStats, "PGA Used (MB)", "Value", "pga_used_mb"),
    project(SectionTag::MemoryStats, "PGA Usage %", "Value", "pga_usage_pct"),
    project(SectionTag::MemoryStats, "Sorts in Memory", "Value", "sorts_memory"),
    project(SectionTag::MemoryStats, "Sorts on Disk", "Value", "sorts_disk"),
    project(SectionTag::OsStats, "OS CPU Usage %", "Value", "os_cpu_usage_pct"),
    project(SectionTag::OsStats, "Load Average", "Value", "load_average"),
    project(SectionTag::OsStats, "Physical Memory (GB)", "Value", "physical_memory_gb"),
    project(SectionTag::OsStats, "Num CPUs", "Value", "num_cpus"),
];

/// How many leading wait-event rows are projected.
pub const TOP_EVENT_RANKS: usize = 3;

/// `(source column, key suffix)` for each projected wait-event rank.
pub const TOP_EVENT_COLUMNS: &[(&str, &str)] =
    &[("Event", "name"), ("Time_s", "time_sec"), ("Avg_ms", "avg_ms")];

/// The flat key for wait-event `rank` (1-based) and `suffix`.
pub fn top_event_key(rank: usize, suffix: &str) -> String {
    format!("top_event_{rank}_{suffix}")
}

// ── Output columns ────────────────────────────────────────────────────────────

pub const SOURCE_NAME: &str = "filename";
pub const CPU_PCT_OF_DB_TIME: &str = "cpu_pct_of_db_time";
pub const PHYSICAL_TO_LOGICAL_RATIO: &str = "physical_to_logical_ratio";

/// Every flat key, in output column order.
pub const FLAT_COLUMNS: &[&str] = &[
    SOURCE_NAME,
    "db_name",
    "db_id",
    "instance",
    "start_time",
    "end_time",
    "elapsed_min",
    "db_time_min",
    "anomaly_type",
    "db_time_per_sec",
    "db_cpu_per_sec",
    "redo_size_per_sec",
    "logical_reads_per_sec",
    "physical_reads_per_sec",
    "executes_per_sec",
    "transactions_per_sec",
    "buffer_hit_pct",
    "library_hit_pct",
    "soft_parse_pct",
    "latch_hit_pct",
    "top_event_1_name",
    "top_event_1_time_sec",
    "top_event_1_avg_ms",
    "top_event_2_name",
    "top_event_2_time_sec",
    "top_event_2_avg_ms",
    "top_event_3_name",
    "top_event_3_time_sec",
    "top_event_3_avg_ms",
    "parse_time_pct",
    "hard_parse_pct",
    "sga_size_mb",
    "pga_allocated_mb",
    "pga_used_mb",
    "pga_usage_pct",
    "sorts_memory",
    "sorts_disk",
    "os_cpu_usage_pct",
    "load_average",
    "physical_memory_gb",
    "num_cpus",
    CPU_PCT_OF_DB_TIME,
    PHYSICAL_TO_LOGICAL_RATIO,
];

/// Position of `key` in [`FLAT_COLUMNS`].
pub fn column_index(key: &str) -> Option<usize> {
    FLAT_COLUMNS.iter().position(|c| *c == key)
}
