//! Structural parsing of AWR HTML reports.
//!
//! Locates the header block, the nine fixed section tables and the optional
//! embedded anomaly label, producing an [`awr_core::Report`] per document.

pub mod header;
pub mod label;
pub mod parser;
pub mod reader;
pub mod section;

pub use awr_core as core;
pub use parser::ReportParser;
