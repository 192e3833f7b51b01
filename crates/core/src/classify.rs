//! Line classification: which catalog tag, if any, a normalized line starts.

use crate::nesting::NestingState;
use crate::types::{Catalog, Position};

/// The tag a line was classified as, by index into the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Block(usize),
    Single(usize),
}

impl LineType {
    pub fn single(&self) -> Option<usize> {
        match self {
            LineType::Single(idx) => Some(*idx),
            LineType::Block(_) => None,
        }
    }

    pub fn tag<'c>(&self, catalog: &'c Catalog) -> &'c str {
        match self {
            LineType::Block(idx) => &catalog.blocks[*idx].tag,
            LineType::Single(idx) => &catalog.singles[*idx].tag,
        }
    }
}

/// Classify a normalized line. First match wins, in this order:
/// `up` singles, blocks (declared order, subject to ignore substrings and
/// containment), `down` singles, then the first `default` single.
pub fn classify(line: &str, catalog: &Catalog, state: &NestingState) -> Option<LineType> {
    let singles_at = |position: Position| {
        catalog
            .singles
            .iter()
            .position(|s| s.position == position && s.matches(line))
            .map(LineType::Single)
    };

    if let Some(found) = singles_at(Position::Up) {
        return Some(found);
    }

    if !catalog.ignore.iter().any(|ign| line.contains(ign.as_str())) {
        let block = catalog.blocks.iter().position(|b| {
            b.pattern.is_match(line)
                && b.is_not_in.iter().all(|&other| state.active(other) == 0)
                && b.is_inside.iter().all(|&other| state.active(other) > 0)
        });
        if let Some(idx) = block {
            return Some(LineType::Block(idx));
        }
    }

    if let Some(found) = singles_at(Position::Down) {
        return Some(found);
    }

    catalog.singles.iter().position(|s| s.position == Position::Default).map(LineType::Single)
}
