//! Line normalization applied before any pattern matching or delimiter counting.

use regex::Regex;
use std::sync::OnceLock;

fn quoted_re() -> &'static Regex {
    static QUOTED_RE: OnceLock<Regex> = OnceLock::new();
    QUOTED_RE.get_or_init(|| Regex::new(r#"'[^']*'|"[^"]*""#).unwrap())
}

/// Remove quoted substrings (quotes included) and collapse whitespace runs.
///
/// Keeps delimiters and keywords that only appear inside string literals from
/// reaching the balance counters or the catalog patterns.
pub fn normalize_line(line: &str) -> String {
    let stripped = quoted_re().replace_all(line, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
