//! Core data model for the AWR profiler.
//!
//! Holds the typed report representation, the value normalisation rules, the
//! versioned fallback-schema and projection tables, and the flattener that
//! turns a parsed report into one fixed-shape feature record.

pub mod error;
pub mod flatten;
pub mod models;
pub mod normalize;
pub mod schema;
pub mod settings;

pub use error::{AwrError, ParseStage, Result};
pub use flatten::{flatten, FlatRecord};
pub use models::{Cell, Report, ReportHeader, RowRecord, SectionTag};
