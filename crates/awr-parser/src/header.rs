//! Global report metadata from the `div.hdr` block.

use std::sync::OnceLock;

use awr_core::models::ReportHeader;
use regex::Regex;

struct HeaderPatterns {
    db_name: Regex,
    db_id: Regex,
    instance: Regex,
    period: Regex,
    elapsed: Regex,
    db_time: Regex,
}

fn patterns() -> &'static HeaderPatterns {
    static PATTERNS: OnceLock<HeaderPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| HeaderPatterns {
        db_name: Regex::new(r"DB Name:\s*(\S+)").expect("regex is valid"),
        db_id: Regex::new(r"DB Id:\s*(\d+)").expect("regex is valid"),
        instance: Regex::new(r"Instance:\s*(\d+)").expect("regex is valid"),
        // The end time runs to the next field separator, label or line end.
        period: Regex::new(r"Period:\s*(.+?)\s+to\s+(.+?)\s*(?:\||\n|Elapsed:|DB Time:|$)")
            .expect("regex is valid"),
        elapsed: Regex::new(r"Elapsed:\s*([\d.]+)\s*min").expect("regex is valid"),
        db_time: Regex::new(r"DB Time:\s*([\d.]+)\s*min").expect("regex is valid"),
    })
}

/// Extract every header field from the header block text.
///
/// Each field is matched independently; one that does not match is `None`
/// and never prevents the others from being read.
pub fn extract_header(text: &str) -> ReportHeader {
    let p = patterns();

    let (start_time, end_time) = match p.period.captures(text) {
        Some(caps) => (
            caps.get(1).map(|m| m.as_str().trim().to_string()),
            caps.get(2).map(|m| m.as_str().trim().to_string()),
        ),
        None => (None, None),
    };

    ReportHeader {
        db_name: first_capture(&p.db_name, text),
        db_id: first_capture(&p.db_id, text),
        instance: first_capture(&p.instance, text),
        start_time,
        end_time,
        elapsed_minutes: first_capture(&p.elapsed, text).and_then(|s| s.parse().ok()),
        db_time_minutes: first_capture(&p.db_time, text).and_then(|s| s.parse().ok()),
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
