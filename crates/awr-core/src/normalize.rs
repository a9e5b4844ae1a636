//! Cleaning routines for table header keys and data cells.

use crate::models::Cell;

/// Turn a header cell into a column key.
///
/// Colons and parentheses are dropped, every character outside
/// `[A-Za-z0-9 _]` is removed, each remaining space becomes one underscore and
/// leading/trailing underscores are trimmed. Runs of spaces are not collapsed:
/// `"Load   Profile"` becomes `"Load___Profile"`.
pub fn clean_key(raw: &str) -> String {
    let kept: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '_')
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();
    kept.trim_matches('_').to_string()
}

/// Turn a data cell into a [`Cell`].
///
/// Thousands separators are removed; what remains is numeric when it consists
/// only of ASCII digits plus at most one decimal point. Anything else,
/// including negative numbers and exponents, stays text.
pub fn clean_value(raw: &str) -> Cell {
    let trimmed = raw.trim();
    let digits = trimmed.replace(',', "");

    if looks_numeric(&digits) {
        if let Ok(n) = digits.parse::<f64>() {
            return Cell::Number(n);
        }
    }
    Cell::Text(trimmed.to_string())
}

/// Strip the trailing colons from a row label (`"DB Time(s):"` → `"DB Time(s)"`).
pub fn clean_label(raw: &str) -> String {
    raw.trim().trim_end_matches(':').trim().to_string()
}

fn looks_numeric(s: &str) -> bool {
    let mut seen_point = false;
    let mut seen_digit = false;
    for c in s.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => return false,
        }
    }
    seen_digit
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── clean_key ─────────────────────────────────────────────────────────────

    #[test]
    fn test_clean_key_strips_colon_and_parens() {
        assert_eq!(clean_key("DB Time(s):"), "DB_Times");
    }

    #[test]
    fn test_clean_key_header_cells() {
        assert_eq!(clean_key("Per Second"), "Per_Second");
        assert_eq!(clean_key("Time (s)"), "Time_s");
        assert_eq!(clean_key("Avg (ms)"), "Avg_ms");
        assert_eq!(clean_key("% DB Time"), "DB_Time");
        assert_eq!(clean_key("% DB"), "DB");
        assert_eq!(clean_key("Read Time (s)"), "Read_Time_s");
    }

    #[test]
    fn test_clean_key_each_space_becomes_underscore() {
        assert_eq!(clean_key("  Load   Profile "), "Load___Profile");
    }

    #[test]
    fn test_clean_key_empty_and_symbol_only() {
        assert_eq!(clean_key(""), "");
        assert_eq!(clean_key("  "), "");
        assert_eq!(clean_key("%:()"), "");
    }

    #[test]
    fn test_clean_key_trims_underscores() {
        assert_eq!(clean_key("_private_"), "private");
        assert_eq!(clean_key("% Value"), "Value");
    }

    #[test]
    fn test_clean_key_idempotent() {
        let inputs = [
            "DB Time(s):",
            "  Load   Profile ",
            "% DB Time",
            "Instance Efficiency (Target 100%)",
            "SQL*Net more data",
            "",
            "__x__",
        ];
        for input in inputs {
            let once = clean_key(input);
            assert_eq!(clean_key(&once), once, "not idempotent for {input:?}");
        }
    }

    // ── clean_value ───────────────────────────────────────────────────────────

    #[test]
    fn test_clean_value_thousands_separator() {
        assert_eq!(clean_value("1,234"), Cell::Number(1234.0));
        assert_eq!(clean_value("12,345,678"), Cell::Number(12_345_678.0));
    }

    #[test]
    fn test_clean_value_decimal() {
        assert_eq!(clean_value("12.5"), Cell::Number(12.5));
        assert_eq!(clean_value(" 0.75 "), Cell::Number(0.75));
    }

    #[test]
    fn test_clean_value_text() {
        assert_eq!(clean_value("abc"), Cell::Text("abc".to_string()));
        assert_eq!(clean_value("  CPU time "), Cell::Text("CPU time".to_string()));
    }

    #[test]
    fn test_clean_value_two_decimal_points_is_text() {
        assert_eq!(clean_value("12.5.3"), Cell::Text("12.5.3".to_string()));
    }

    #[test]
    fn test_clean_value_text_keeps_original_commas() {
        assert_eq!(clean_value("a,b"), Cell::Text("a,b".to_string()));
    }

    #[test]
    fn test_clean_value_non_plain_numbers_are_text() {
        assert_eq!(clean_value("-1.5"), Cell::Text("-1.5".to_string()));
        assert_eq!(clean_value("1e5"), Cell::Text("1e5".to_string()));
        assert_eq!(clean_value("."), Cell::Text(".".to_string()));
        assert_eq!(clean_value(""), Cell::Text(String::new()));
    }

    // ── clean_label ───────────────────────────────────────────────────────────

    #[test]
    fn test_clean_label() {
        assert_eq!(clean_label("DB Time(s):"), "DB Time(s)");
        assert_eq!(clean_label("Sorts on Disk: "), "Sorts on Disk");
        assert_eq!(clean_label("CPU time"), "CPU time");
    }
}
