//! Per-scan nesting state: open block instances, single-line streaks and the
//! shared pending argument list.
//!
//! Each block tag keeps its open instances oldest first. Invariant: a tag's
//! list is either empty or starts with an unresolved instance; closed entries
//! only survive behind an older instance that is still open, and are pruned
//! when that oldest instance closes.

use tracing::trace;

use crate::balance::{scan_balance, Balance};
use crate::types::{BlockSpec, Catalog};

const ARGS_OPEN: &str = "(";
const ARGS_CLOSE: &str = ")";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Opened by a `have_args` block whose argument list has not balanced yet.
    AwaitingArgs,
    /// Body delimiters still open.
    Open(usize),
    /// Closed, or abandoned without ever opening its body.
    Closed,
}

impl InstanceState {
    pub fn is_unresolved(&self) -> bool {
        !matches!(self, InstanceState::Closed)
    }
}

/// One open occurrence of a block tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instance {
    /// Index of the element record this instance opened.
    pub record: usize,
    pub state: InstanceState,
}

/// The argument list currently being balanced. Only one can be pending at a
/// time: opening any block takes the slot over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingArgs {
    pub block: usize,
    pub depth: usize,
}

/// A block instance whose delimiters balanced on the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closure {
    pub block: usize,
    pub record: usize,
}

#[derive(Debug, Clone)]
pub struct NestingState {
    open: Vec<Vec<Instance>>,
    streaks: Vec<usize>,
    pending: Option<PendingArgs>,
}

impl NestingState {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            open: vec![Vec::new(); catalog.blocks.len()],
            streaks: vec![0; catalog.singles.len()],
            pending: None,
        }
    }

    /// Number of tracked instances of a block tag.
    pub fn active(&self, block: usize) -> usize {
        self.open[block].len()
    }

    pub fn instances(&self, block: usize) -> &[Instance] {
        &self.open[block]
    }

    pub fn pending(&self) -> Option<PendingArgs> {
        self.pending
    }

    pub fn streak(&self, single: usize) -> usize {
        self.streaks[single]
    }

    pub fn bump_streak(&mut self, single: usize) {
        self.streaks[single] += 1;
    }

    /// End every single-line streak except `keep`.
    pub fn reset_streaks_except(&mut self, keep: Option<usize>) {
        for (idx, streak) in self.streaks.iter_mut().enumerate() {
            if Some(idx) != keep {
                *streak = 0;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Opening
    // -----------------------------------------------------------------------

    /// Register a block instance that starts on the line `text`.
    ///
    /// Returns `true` when the block also closed on this line (or never opened
    /// a body), in which case the record's range is already final.
    pub fn open_block(&mut self, block: usize, spec: &BlockSpec, record: usize, text: &str) -> bool {
        if let Some(prev) = self.pending.take() {
            self.abandon_pending(prev);
        }

        let body = if spec.have_args {
            match scan_balance(text, 0, ARGS_OPEN, ARGS_CLOSE) {
                Balance::Closed { end } => &text[end..],
                Balance::Open { depth } => {
                    trace!(tag = spec.tag.as_str(), record, depth, "argument list pending");
                    self.pending = Some(PendingArgs { block, depth });
                    self.push(block, Instance { record, state: InstanceState::AwaitingArgs });
                    return false;
                }
            }
        } else {
            text
        };

        let state = match scan_balance(body, 0, &spec.open, &spec.close) {
            Balance::Open { depth } if depth > 0 => InstanceState::Open(depth),
            _ => InstanceState::Closed,
        };
        trace!(tag = spec.tag.as_str(), record, ?state, "block opened");
        self.push(block, Instance { record, state });
        state == InstanceState::Closed
    }

    fn push(&mut self, block: usize, instance: Instance) {
        self.open[block].push(instance);
        if self.open[block][0].state == InstanceState::Closed {
            self.compact(block);
        }
    }

    /// A newer block took the pending slot; the old argument list is given up.
    fn abandon_pending(&mut self, prev: PendingArgs) {
        let list = &self.open[prev.block];
        if let Some(idx) = list.len().checked_sub(1) {
            if list[idx].state == InstanceState::AwaitingArgs {
                trace!(block = prev.block, record = list[idx].record, "pending argument list abandoned");
                self.retire(prev.block, idx);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Advancing
    // -----------------------------------------------------------------------

    /// Feed one normalized line to every open instance and report the ones
    /// that closed on it.
    pub fn advance(&mut self, catalog: &Catalog, text: &str) -> Vec<Closure> {
        let mut closures = Vec::new();

        for (block, spec) in catalog.blocks.iter().enumerate() {
            let n = self.open[block].len();
            // Most recent first. Compaction can only happen at index 0, the
            // last one visited, so indices stay valid throughout.
            for j in (0..n).rev() {
                let instance = self.open[block][j];
                match instance.state {
                    InstanceState::AwaitingArgs => {
                        let Some(pending) = self.pending.filter(|p| p.block == block && j == n - 1) else {
                            continue;
                        };
                        match scan_balance(text, pending.depth, ARGS_OPEN, ARGS_CLOSE) {
                            Balance::Open { depth } => {
                                self.pending = Some(PendingArgs { block, depth });
                            }
                            Balance::Closed { end } => {
                                self.pending = None;
                                match scan_balance(&text[end..], 0, &spec.open, &spec.close) {
                                    Balance::Closed { .. } => {
                                        closures.push(Closure { block, record: instance.record });
                                        self.retire(block, j);
                                    }
                                    Balance::Open { depth } if depth > 0 => {
                                        self.open[block][j].state = InstanceState::Open(depth);
                                    }
                                    Balance::Open { .. } => self.retire(block, j),
                                }
                            }
                        }
                    }
                    InstanceState::Open(depth) => match scan_balance(text, depth, &spec.open, &spec.close) {
                        Balance::Closed { .. } => {
                            trace!(tag = spec.tag.as_str(), record = instance.record, index = j, "block closed");
                            closures.push(Closure { block, record: instance.record });
                            self.retire(block, j);
                        }
                        Balance::Open { depth } => {
                            self.open[block][j].state = InstanceState::Open(depth);
                        }
                    },
                    InstanceState::Closed => {}
                }
            }
        }

        closures
    }

    /// Mark instance `j` closed. The oldest instance triggers compaction;
    /// younger ones stay in place until then.
    fn retire(&mut self, block: usize, j: usize) {
        self.open[block][j].state = InstanceState::Closed;
        if j == 0 {
            self.compact(block);
        }
    }

    /// Drop every closed entry that precedes the most recently opened
    /// unresolved instance, or everything if none is left.
    fn compact(&mut self, block: usize) {
        let list = &mut self.open[block];
        match list.iter().rposition(|i| i.state.is_unresolved()) {
            Some(last) => {
                let mut idx = 0;
                list.retain(|inst| {
                    let keep = idx >= last || inst.state.is_unresolved();
                    idx += 1;
                    keep
                });
            }
            None => list.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn spec(tag: &str, open: &str, close: &str, have_args: bool) -> BlockSpec {
        BlockSpec {
            tag: tag.to_string(),
            pattern: Regex::new("^x").unwrap(),
            open: open.to_string(),
            close: close.to_string(),
            have_args,
            recursive: true,
            is_not_in: Vec::new(),
            is_inside: Vec::new(),
        }
    }

    fn catalog(blocks: Vec<BlockSpec>) -> Catalog {
        Catalog { blocks, ..Default::default() }
    }

    #[test]
    fn test_open_and_close_across_lines() {
        let cat = catalog(vec![spec("F", "{", "}", false)]);
        let mut st = NestingState::new(&cat);
        assert!(!st.open_block(0, &cat.blocks[0], 0, "function f() {"));
        assert_eq!(st.active(0), 1);
        assert!(st.advance(&cat, "x = { a: 1 };").is_empty());
        assert_eq!(st.advance(&cat, "}"), vec![Closure { block: 0, record: 0 }]);
        assert_eq!(st.active(0), 0);
    }

    #[test]
    fn test_same_line_block_leaves_nothing_open() {
        let cat = catalog(vec![spec("F", "{", "}", false)]);
        let mut st = NestingState::new(&cat);
        assert!(st.open_block(0, &cat.blocks[0], 0, "function f() { return 1; }"));
        assert_eq!(st.active(0), 0);
    }

    #[test]
    fn test_nested_instances_close_in_place_then_compact() {
        let cat = catalog(vec![spec("F", "{", "}", false)]);
        let mut st = NestingState::new(&cat);
        st.open_block(0, &cat.blocks[0], 0, "function a() {");
        st.advance(&cat, "function b() {");
        st.open_block(0, &cat.blocks[0], 1, "function b() {");
        assert_eq!(st.instances(0)[0].state, InstanceState::Open(2));
        assert_eq!(st.instances(0)[1].state, InstanceState::Open(1));

        // Inner closes first: marked closed, kept until the outer one closes.
        assert_eq!(st.advance(&cat, "}"), vec![Closure { block: 0, record: 1 }]);
        assert_eq!(st.active(0), 2);
        assert_eq!(st.instances(0)[1].state, InstanceState::Closed);

        assert_eq!(st.advance(&cat, "}"), vec![Closure { block: 0, record: 0 }]);
        assert_eq!(st.active(0), 0);
    }

    #[test]
    fn test_compaction_keeps_entries_from_last_unresolved() {
        let cat = catalog(vec![spec("F", "{", "}", false)]);
        let mut st = NestingState::new(&cat);
        // Ill-nested: the oldest closes while a younger one is still open.
        st.open_block(0, &cat.blocks[0], 0, "{");
        st.open_block(0, &cat.blocks[0], 1, "{ {");
        st.open_block(0, &cat.blocks[0], 2, "{");
        st.open[0][1].state = InstanceState::Closed;
        st.open[0][0].state = InstanceState::Open(1);
        st.open[0][2].state = InstanceState::Open(3);

        let closed = st.advance(&cat, "}");
        assert_eq!(closed, vec![Closure { block: 0, record: 0 }]);
        assert_eq!(st.instances(0), &[Instance { record: 2, state: InstanceState::Open(2) }]);
    }

    #[test]
    fn test_args_pending_across_lines() {
        let cat = catalog(vec![spec("F", "{", "}", true)]);
        let mut st = NestingState::new(&cat);
        assert!(!st.open_block(0, &cat.blocks[0], 0, "function f(a,"));
        assert_eq!(st.pending(), Some(PendingArgs { block: 0, depth: 1 }));
        assert_eq!(st.instances(0)[0].state, InstanceState::AwaitingArgs);

        // Braces inside the argument list do not count toward the body.
        assert!(st.advance(&cat, "b = {},").is_empty());
        assert!(st.advance(&cat, "c) {").is_empty());
        assert_eq!(st.pending(), None);
        assert_eq!(st.instances(0)[0].state, InstanceState::Open(1));

        assert_eq!(st.advance(&cat, "}"), vec![Closure { block: 0, record: 0 }]);
    }

    #[test]
    fn test_args_resolved_and_body_closed_on_same_line() {
        let cat = catalog(vec![spec("F", "{", "}", true)]);
        let mut st = NestingState::new(&cat);
        st.open_block(0, &cat.blocks[0], 0, "function f(");
        assert_eq!(st.advance(&cat, ") { return 1; }"), vec![Closure { block: 0, record: 0 }]);
        assert_eq!(st.active(0), 0);
    }

    #[test]
    fn test_new_block_abandons_pending_args() {
        let cat = catalog(vec![spec("F", "{", "}", true), spec("C", "/*", "*/", false)]);
        let mut st = NestingState::new(&cat);
        st.open_block(0, &cat.blocks[0], 0, "function f(a,");
        st.open_block(1, &cat.blocks[1], 1, "/* note");
        assert_eq!(st.pending(), None);
        assert_eq!(st.active(0), 0, "abandoned argument list is pruned");
        assert_eq!(st.active(1), 1);
    }

    #[test]
    fn test_streaks() {
        let mut cat = catalog(Vec::new());
        cat.singles = vec![
            crate::types::SingleSpec {
                tag: "A".into(),
                element: "a".into(),
                position: crate::types::Position::Up,
                way: crate::types::Way::Equals,
            },
            crate::types::SingleSpec {
                tag: "B".into(),
                element: "b".into(),
                position: crate::types::Position::Up,
                way: crate::types::Way::Equals,
            },
        ];
        let mut st = NestingState::new(&cat);
        st.bump_streak(0);
        st.bump_streak(1);
        st.reset_streaks_except(Some(1));
        assert_eq!((st.streak(0), st.streak(1)), (0, 1));
        st.reset_streaks_except(None);
        assert_eq!(st.streak(1), 0);
    }
}
