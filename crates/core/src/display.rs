//! Rendering detected elements for humans and machines.

use serde_json::{json, Value};

use crate::batch::FileElements;
use crate::types::Element;

/// Maximum preview length, in characters.
const PREVIEW_CHARS: usize = 60;

fn preview(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.chars().count() <= PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(PREVIEW_CHARS - 3).collect();
    format!("{cut}...")
}

/// One line per element: `TAG  start-end  name  preview`, 1-based line numbers.
///
/// `lines` is optional source text used for the preview column.
pub fn format_element(el: &Element, lines: Option<&[String]>) -> String {
    let range = if el.start == el.end {
        format!("{}", el.start + 1)
    } else {
        format!("{}-{}", el.start + 1, el.end + 1)
    };
    let name = el.name.as_deref().map(|n| if n.is_empty() { "<anonymous>" } else { n }).unwrap_or("");
    let mut out = format!("{:<16} {:>11}  {}", el.tag, range, name);
    if let Some(first) = lines.and_then(|l| l.get(el.start)) {
        if !out.ends_with(' ') {
            out.push_str("  ");
        }
        out.push_str(&preview(first));
    }
    out.trim_end().to_string()
}

pub fn format_elements(elements: &[Element], lines: Option<&[String]>) -> String {
    let mut out = String::new();
    for el in elements {
        out.push_str(&format_element(el, lines));
        out.push('\n');
    }
    out
}

/// JSON for a batch: `[{path, line_count, elements: [{tag, start, end, name}]}]`.
/// Indices stay 0-based; an absent name is `null`.
pub fn files_json(files: &[FileElements]) -> Value {
    json!(files)
}
