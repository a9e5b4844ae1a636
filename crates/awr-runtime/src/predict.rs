//! Single-document prediction.
//!
//! Parses and flattens one report, then hands the flat record to a
//! [`Scorer`]. Malformed documents surface as errors before the scorer is
//! ever consulted.

use std::path::Path;

use awr_core::error::Result;
use awr_core::flatten::FlatRecord;
use awr_parser::ReportParser;
use serde::Serialize;
use tracing::{debug, info};

use crate::batch::flatten_file;

/// Labels meaning "no anomaly".
const NORMAL_LABELS: [&str; 2] = ["NONE", "NORMAL"];

/// What a scorer says about one flat record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Verdict {
    /// A categorical anomaly label such as `CPU_SPIKE`.
    Label(String),
    /// A continuous anomaly score.
    Score(f64),
}

impl Verdict {
    /// Whether the verdict flags an anomaly. Scores carry no threshold here,
    /// so only labels give an answer.
    pub fn is_anomaly(&self) -> Option<bool> {
        match self {
            Self::Label(label) => Some(
                !NORMAL_LABELS
                    .iter()
                    .any(|normal| label.eq_ignore_ascii_case(normal)),
            ),
            Self::Score(_) => None,
        }
    }
}

/// A pre-trained model that maps one flat record to a verdict.
pub trait Scorer {
    fn score(&self, record: &FlatRecord) -> Result<Verdict>;
}

impl<F> Scorer for F
where
    F: Fn(&FlatRecord) -> Result<Verdict>,
{
    fn score(&self, record: &FlatRecord) -> Result<Verdict> {
        self(record)
    }
}

/// The flat record of a document together with the scorer's verdict.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub record: FlatRecord,
    pub verdict: Verdict,
}

pub struct Predictor<S> {
    parser: ReportParser,
    scorer: S,
}

impl<S: Scorer> Predictor<S> {
    pub fn new(scorer: S) -> Self {
        Self {
            parser: ReportParser::new(),
            scorer,
        }
    }

    pub fn predict(&self, path: &Path) -> Result<Prediction> {
        let record = flatten_file(&self.parser, path)?;
        debug!(
            "{}: {} of {} values absent",
            path.display(),
            record.absent_count(),
            record.values().len()
        );
        let verdict = self.scorer.score(&record)?;
        info!("Prediction for {}: {:?}", path.display(), verdict);
        Ok(Prediction { record, verdict })
    }
}
