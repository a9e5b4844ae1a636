//! Single-document parsing: header, nine section tables and the optional label.

use std::path::Path;
use std::sync::OnceLock;

use awr_core::error::{AwrError, ParseStage, Result};
use awr_core::models::{Report, SectionTag};
use scraper::{Html, Selector};
use tracing::debug;

use crate::header::extract_header;
use crate::label::extract_anomaly_label;
use crate::section::extract_section;

/// Parses AWR HTML documents into [`Report`]s.
///
/// Parsing is a pure function of the document text; no state is shared
/// between calls, so one parser can serve any number of worker threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportParser;

impl ReportParser {
    pub fn new() -> Self {
        Self
    }

    /// Read and parse the file at `path`.
    ///
    /// The returned report has no `source_name`; the caller attaches it.
    pub fn parse_file(&self, path: &Path) -> Result<Report> {
        let name = source_name(path);
        let html = std::fs::read_to_string(path)
            .map_err(|source| AwrError::FileRead {
                path: path.to_path_buf(),
                source,
            })
            .map_err(|e| e.in_document(name.as_str(), ParseStage::Read))?;
        self.parse_document(&html, &name)
    }

    /// Parse document text. `name` is used for error context only.
    pub fn parse_document(&self, html: &str, name: &str) -> Result<Report> {
        let document = Html::parse_document(html);

        let header_text = header_block_text(&document).ok_or_else(|| {
            AwrError::MissingHeader {
                source_name: name.to_string(),
            }
            .in_document(name, ParseStage::Header)
        })?;
        let header = extract_header(&header_text);

        let sections = SectionTag::ALL
            .into_iter()
            .map(|tag| (tag, extract_section(&document, tag)))
            .collect();

        let anomaly_label = extract_anomaly_label(&document);

        debug!(
            "parsed {}: db_name={:?}, label={:?}",
            name, header.db_name, anomaly_label
        );

        Ok(Report {
            header,
            sections,
            anomaly_label,
            source_name: String::new(),
        })
    }
}

/// The file-name part of `path`, used as the report's source identifier.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Full text of the `div.hdr` header container, or `None` if there is none.
fn header_block_text(document: &Html) -> Option<String> {
    static HEADER: OnceLock<Selector> = OnceLock::new();
    let selector = HEADER.get_or_init(|| Selector::parse("div.hdr").expect("selector is valid"));
    document
        .select(selector)
        .next()
        .map(|el| el.text().collect())
}
