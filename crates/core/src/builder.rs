//! Element record creation, single-line streak extension and range closing.

use crate::error::{Result, ScanError};
use crate::nesting::{Closure, NestingState};
use crate::types::{Catalog, Element};

pub struct ElementBuilder {
    elements: Vec<Element>,
    /// Most recent record of each single tag.
    last_single: Vec<Option<usize>>,
}

impl ElementBuilder {
    pub fn new(catalog: &Catalog) -> Self {
        Self { elements: Vec::new(), last_single: vec![None; catalog.singles.len()] }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn finish(self) -> Vec<Element> {
        self.elements
    }

    /// Start a single-line record, or extend the running streak of that tag.
    pub fn single(&mut self, catalog: &Catalog, state: &mut NestingState, single: usize, line: usize) {
        if state.streak(single) > 0 {
            if let Some(el) = self.last_single[single].and_then(|idx| self.elements.get_mut(idx)) {
                el.end = line;
                return;
            }
        }
        self.last_single[single] = Some(self.elements.len());
        self.elements.push(Element::new(&catalog.singles[single].tag, line, line, None));
        state.bump_streak(single);
    }

    /// Start a block record and register its instance with the tracker.
    pub fn block(&mut self, catalog: &Catalog, state: &mut NestingState, block: usize, line: usize, text: &str) {
        let spec = &catalog.blocks[block];
        let record = self.elements.len();
        self.elements.push(Element {
            tag: spec.tag.clone(),
            start: line,
            end: line,
            name: spec.capture_name(text),
        });
        state.open_block(block, spec, record, text);
    }

    /// Move the end of every record whose instance closed on `line`.
    pub fn close(&mut self, catalog: &Catalog, closures: &[Closure], line: usize) -> Result<()> {
        for closure in closures {
            let tag = &catalog.blocks[closure.block].tag;
            match self.elements.get_mut(closure.record) {
                Some(el) if &el.tag == tag && el.start <= line => el.end = line,
                _ => return Err(ScanError::UnmatchedClosure { tag: tag.clone(), line }),
            }
        }
        Ok(())
    }
}
