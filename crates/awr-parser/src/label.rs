//! Ground-truth anomaly label embedded in training documents.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::section::cell_text;

const LABEL_TEXT: &str = "Report Type:";

/// Read the word following a bold `Report Type:` label, if any.
///
/// Production reports carry no label; absence is never an error.
pub fn extract_anomaly_label(document: &Html) -> Option<String> {
    static STRONG: OnceLock<Selector> = OnceLock::new();
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let strong = STRONG.get_or_init(|| Selector::parse("strong").expect("selector is valid"));
    let pattern =
        PATTERN.get_or_init(|| Regex::new(r"Report Type:\s*(\w+)").expect("regex is valid"));

    let label = document
        .select(strong)
        .find(|el| cell_text(*el) == LABEL_TEXT)?;
    let parent = label.parent().and_then(ElementRef::wrap)?;
    let parent_text: String = parent.text().collect();

    pattern
        .captures(&parent_text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
