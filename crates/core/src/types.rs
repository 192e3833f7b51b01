use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::CatalogError;

/// Preset used when neither a catalog file nor a preset is configured.
pub const DEFAULT_PRESET: &str = "javascript";

// ---------------------------------------------------------------------------
// Scan configuration
// ---------------------------------------------------------------------------

/// Runtime configuration for scanning a tree. Loaded from `.blockscope.toml` or defaults.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub root: PathBuf,
    /// Built-in catalog name. Ignored when `catalog` is set.
    pub preset: Option<String>,
    /// Catalog file, relative to `root` unless absolute.
    pub catalog: Option<PathBuf>,
    /// File extensions to include when walking directories. Empty = all files.
    pub extensions: HashSet<String>,
    /// Directory names to skip during walk.
    pub skip_dirs: HashSet<String>,
    /// Extra ignore substrings merged into the catalog's own.
    pub ignore: Vec<String>,
}

impl ScanConfig {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            preset: None,
            catalog: None,
            extensions: ["js", "mjs", "cjs", "jsx", "ts", "tsx"].iter().map(|s| s.to_string()).collect(),
            skip_dirs: [".git", "node_modules", "target", "dist", "build", ".next", "vendor", "coverage"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ignore: Vec::new(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}

// ---------------------------------------------------------------------------
// Detected elements
// ---------------------------------------------------------------------------

/// One detected element: a block or a (possibly multi-line) single.
///
/// Line indices are 0-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub tag: String,
    pub start: usize,
    pub end: usize,
    /// Captured name. Only block tags whose pattern has a capture group carry one.
    pub name: Option<String>,
}

impl Element {
    pub fn new(tag: &str, start: usize, end: usize, name: Option<&str>) -> Self {
        Self { tag: tag.to_string(), start, end, name: name.map(str::to_string) }
    }

    /// Number of lines covered by the element.
    pub fn line_count(&self) -> usize {
        self.end - self.start + 1
    }
}

// ---------------------------------------------------------------------------
// Single-line matching modes
// ---------------------------------------------------------------------------

/// When a single tag is tested relative to the block patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Before any block pattern.
    Up,
    /// After the block patterns.
    Down,
    /// Unconditional fallback when nothing else matched.
    Default,
}

impl Position {
    pub fn parse(tag: &str, s: &str) -> Result<Self, CatalogError> {
        match s {
            "up" => Ok(Position::Up),
            "down" => Ok(Position::Down),
            "default" => Ok(Position::Default),
            other => Err(CatalogError::UnknownPosition {
                tag: tag.to_string(),
                position: other.to_string(),
            }),
        }
    }
}

/// How a single tag's `element` is compared with a normalized line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Way {
    /// `==`
    Equals,
    /// `startswith`
    StartsWith,
    /// `endswith`
    EndsWith,
    /// `in`: the line occurs within the element string.
    In,
    /// `no a,b,c`: none of the listed substrings occur in the line.
    NoneOf(Vec<String>),
}

impl Way {
    pub fn parse(tag: &str, s: &str) -> Result<Self, CatalogError> {
        match s {
            "==" => Ok(Way::Equals),
            "startswith" => Ok(Way::StartsWith),
            "endswith" => Ok(Way::EndsWith),
            "in" => Ok(Way::In),
            _ => match s.strip_prefix("no ") {
                Some(list) => Ok(Way::NoneOf(
                    list.split(',').filter(|p| !p.is_empty()).map(str::to_string).collect(),
                )),
                None => Err(CatalogError::UnknownWay { tag: tag.to_string(), way: s.to_string() }),
            },
        }
    }

    pub fn matches(&self, line: &str, element: &str) -> bool {
        match self {
            Way::Equals => line == element,
            Way::StartsWith => line.starts_with(element),
            Way::EndsWith => line.ends_with(element),
            Way::In => element.contains(line),
            Way::NoneOf(parts) => parts.iter().all(|p| !line.contains(p.as_str())),
        }
    }
}

// ---------------------------------------------------------------------------
// Compiled catalog
// ---------------------------------------------------------------------------

/// A multi-line construct delimited by an open/close pair.
#[derive(Debug, Clone)]
pub struct BlockSpec {
    pub tag: String,
    pub pattern: Regex,
    pub open: String,
    pub close: String,
    pub have_args: bool,
    pub recursive: bool,
    /// Indices into [`Catalog::blocks`] that must have no open instance.
    pub is_not_in: Vec<usize>,
    /// Indices into [`Catalog::blocks`] that must have an open instance.
    pub is_inside: Vec<usize>,
}

impl BlockSpec {
    /// Name captured by the pattern's first group.
    ///
    /// No capture group gives `None`; a group that did not participate in the
    /// match gives an empty name, which is kept distinct from an absent one.
    pub fn capture_name(&self, line: &str) -> Option<String> {
        if self.pattern.captures_len() < 2 {
            return None;
        }
        let caps = self.pattern.captures(line)?;
        Some(caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default())
    }
}

/// A construct contained on one line, possibly repeated over contiguous lines.
#[derive(Debug, Clone)]
pub struct SingleSpec {
    pub tag: String,
    pub element: String,
    pub position: Position,
    pub way: Way,
}

impl SingleSpec {
    pub fn matches(&self, line: &str) -> bool {
        self.way.matches(line, &self.element)
    }
}

/// Ordered block and single specs plus the ignore substrings.
///
/// Declaration order matters: block tags are tried in order and the first
/// `default` single wins. Built through [`crate::catalog`], which resolves
/// `is_not_in` / `is_inside` tags to indices.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub blocks: Vec<BlockSpec>,
    pub singles: Vec<SingleSpec>,
    /// Substrings that disable block matching on any line containing them.
    pub ignore: Vec<String>,
}

impl Catalog {
    pub fn block_index(&self, tag: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.tag == tag)
    }

    pub fn single_index(&self, tag: &str) -> Option<usize> {
        self.singles.iter().position(|s| s.tag == tag)
    }

    /// All declared tags, blocks first.
    pub fn tags(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.tag.as_str()).chain(self.singles.iter().map(|s| s.tag.as_str())).collect()
    }

    /// Return a copy with extra ignore substrings appended (duplicates dropped).
    pub fn with_extra_ignore(&self, extra: &[String]) -> Catalog {
        let mut catalog = self.clone();
        let mut seen: HashSet<String> = catalog.ignore.iter().cloned().collect();
        for s in extra {
            if seen.insert(s.clone()) {
                catalog.ignore.push(s.clone());
            }
        }
        catalog
    }
}
