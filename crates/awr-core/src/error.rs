use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Stage of a single-document parse at which a fault occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Read,
    Header,
    Sections,
    Label,
}

impl fmt::Display for ParseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseStage::Read => "read",
            ParseStage::Header => "header",
            ParseStage::Sections => "sections",
            ParseStage::Label => "label",
        };
        f.write_str(name)
    }
}

/// All errors produced by the AWR profiler.
#[derive(Error, Debug)]
pub enum AwrError {
    /// A report file could not be opened or was not valid UTF-8.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document has no `div.hdr` header container.
    #[error("Report header block not found in {source_name}")]
    MissingHeader { source_name: String },

    /// A document fault annotated with the file and parse stage.
    #[error("Malformed report {source_name} ({stage} stage): {source}")]
    Document {
        source_name: String,
        stage: ParseStage,
        #[source]
        source: Box<AwrError>,
    },

    /// The batch input directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// A batch was aborted because one document failed.
    #[error("Batch aborted at {document} after {processed} report(s) processed: {source}")]
    Batch {
        document: String,
        processed: usize,
        #[source]
        source: Box<AwrError>,
    },

    /// The output sink rejected the table.
    #[error("Sink error: {0}")]
    Sink(String),

    /// CSV serialisation failed.
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be produced or parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The external label/score consumer failed.
    #[error("Scorer error: {0}")]
    Scorer(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AwrError {
    /// Wrap a fault with the originating document and stage.
    ///
    /// Already-wrapped faults are returned unchanged so context is never nested twice.
    pub fn in_document(self, source_name: impl Into<String>, stage: ParseStage) -> Self {
        match self {
            wrapped @ AwrError::Document { .. } => wrapped,
            other => AwrError::Document {
                source_name: source_name.into(),
                stage,
                source: Box::new(other),
            },
        }
    }

    /// `true` when the error means the input document itself is malformed or unreadable.
    pub fn is_document_fault(&self) -> bool {
        matches!(
            self,
            AwrError::FileRead { .. } | AwrError::MissingHeader { .. } | AwrError::Document { .. }
        )
    }
}

/// Convenience alias used throughout the AWR crates.
pub type Result<T> = std::result::Result<T, AwrError>;
