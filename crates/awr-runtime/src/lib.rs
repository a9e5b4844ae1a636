//! Batch orchestration, output sinks and single-document prediction.

pub mod batch;
pub mod predict;
pub mod sink;

pub use batch::{flatten_file, BatchFailure, BatchOptions, BatchRunner, BatchSummary};
pub use predict::{Prediction, Predictor, Scorer, Verdict};
pub use sink::{CsvSink, RecordSink};
