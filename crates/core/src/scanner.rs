//! The per-line scan loop.
//!
//! For each line: advance open blocks (always), classify, then start or extend
//! a record unless the most recently started block is non-recursive and still
//! open. Lines inside such a block are opaque: they move delimiter balances but
//! start nothing.

use std::time::Instant;
use tracing::{debug, trace};

use crate::builder::ElementBuilder;
use crate::classify::{classify, LineType};
use crate::error::Result;
use crate::nesting::NestingState;
use crate::normalize::normalize_line;
use crate::types::{Catalog, Element};

/// Incremental scanner over one line sequence. Owns all scan state; a fresh
/// scanner is needed per input.
pub struct Scanner<'c> {
    catalog: &'c Catalog,
    state: NestingState,
    builder: ElementBuilder,
    line: usize,
    last_block: Option<usize>,
}

impl<'c> Scanner<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            state: NestingState::new(catalog),
            builder: ElementBuilder::new(catalog),
            line: 0,
            last_block: None,
        }
    }

    /// Number of lines consumed so far.
    pub fn lines_seen(&self) -> usize {
        self.line
    }

    pub fn state(&self) -> &NestingState {
        &self.state
    }

    pub fn elements(&self) -> &[Element] {
        self.builder.elements()
    }

    /// Consume the next line.
    pub fn feed(&mut self, line: &str) -> Result<()> {
        let idx = self.line;
        let text = normalize_line(line);

        let closures = self.state.advance(self.catalog, &text);
        self.builder.close(self.catalog, &closures, idx)?;

        if let Some(kind) = classify(&text, self.catalog, &self.state) {
            if self.suppressed() {
                trace!(line = idx, tag = kind.tag(self.catalog), "classification suppressed");
            } else {
                match kind {
                    LineType::Single(single) => {
                        self.builder.single(self.catalog, &mut self.state, single, idx);
                    }
                    LineType::Block(block) => {
                        self.builder.block(self.catalog, &mut self.state, block, idx, &text);
                        self.last_block = Some(block);
                    }
                }
                self.state.reset_streaks_except(kind.single());
            }
        }

        self.line += 1;
        Ok(())
    }

    /// Inside a still-open instance of a non-recursive block.
    fn suppressed(&self) -> bool {
        self.last_block
            .is_some_and(|b| !self.catalog.blocks[b].recursive && self.state.active(b) > 0)
    }

    pub fn finish(self) -> Vec<Element> {
        self.builder.finish()
    }
}

/// Scan `lines` against `catalog` and return the detected elements in the
/// order they were opened.
///
/// All-or-nothing: an unmatched closure aborts the scan without partial
/// results.
pub fn scan_elements<S: AsRef<str>>(lines: &[S], catalog: &Catalog) -> Result<Vec<Element>> {
    let start = Instant::now();
    let mut scanner = Scanner::new(catalog);
    for line in lines {
        scanner.feed(line.as_ref())?;
    }
    let elements = scanner.finish();
    debug!(
        lines = lines.len(),
        elements = elements.len(),
        time_us = start.elapsed().as_micros() as u64,
        "Scan complete"
    );
    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_catalog;

    const FUNC_COMMENT: &str = r#"
[blocks.COMMENT]
pattern = '^/\*'
open = "/*"
close = "*/"
recursive = false

[blocks.FUNC]
pattern = '^function (\w+)'
recursive = true
"#;

    #[test]
    fn test_single_function() {
        let cat = parse_catalog(FUNC_COMMENT).unwrap();
        let out = scan_elements(&["function foo() {", "  return 1;", "}"], &cat).unwrap();
        assert_eq!(out, vec![Element::new("FUNC", 0, 2, Some("foo"))]);
    }

    #[test]
    fn test_non_recursive_comment_suppresses_inner_lines() {
        let cat = parse_catalog(FUNC_COMMENT).unwrap();
        let out = scan_elements(&["/* start", "function inner() {", "*/"], &cat).unwrap();
        assert_eq!(out, vec![Element::new("COMMENT", 0, 2, None)]);
    }

    #[test]
    fn test_suppression_ends_with_the_block() {
        let cat = parse_catalog(FUNC_COMMENT).unwrap();
        let lines = ["/* a", "*/", "function after() {", "}"];
        let out = scan_elements(&lines, &cat).unwrap();
        assert_eq!(
            out,
            vec![Element::new("COMMENT", 0, 1, None), Element::new("FUNC", 2, 3, Some("after"))]
        );
    }

    #[test]
    fn test_nested_recursive_functions() {
        let cat = parse_catalog(FUNC_COMMENT).unwrap();
        let lines = ["function outer() {", "function inner() {", "}", "}"];
        let out = scan_elements(&lines, &cat).unwrap();
        assert_eq!(
            out,
            vec![Element::new("FUNC", 0, 3, Some("outer")), Element::new("FUNC", 1, 2, Some("inner"))]
        );
    }

    #[test]
    fn test_one_line_block_inside_open_block() {
        let cat = parse_catalog(FUNC_COMMENT).unwrap();
        let lines = ["function a() {", "function b() { return 1; }", "}"];
        let out = scan_elements(&lines, &cat).unwrap();
        assert_eq!(
            out,
            vec![Element::new("FUNC", 0, 2, Some("a")), Element::new("FUNC", 1, 1, Some("b"))]
        );
    }

    #[test]
    fn test_string_literal_immunity() {
        let cat = parse_catalog(FUNC_COMMENT).unwrap();
        let lines = ["function f() {", r#"let x = "{ not real";"#, "}", "function g() {", "}"];
        let out = scan_elements(&lines, &cat).unwrap();
        assert_eq!(out[0], Element::new("FUNC", 0, 2, Some("f")));
        assert_eq!(out[1], Element::new("FUNC", 3, 4, Some("g")));
    }

    #[test]
    fn test_incremental_feed_matches_batch() {
        let cat = parse_catalog(FUNC_COMMENT).unwrap();
        let lines = ["function a() {", "/* c */", "}"];
        let mut scanner = Scanner::new(&cat);
        for l in &lines {
            scanner.feed(l).unwrap();
        }
        assert_eq!(scanner.lines_seen(), 3);
        assert_eq!(scanner.finish(), scan_elements(&lines, &cat).unwrap());
    }
}
