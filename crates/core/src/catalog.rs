//! Catalog loading: TOML documents compiled into a [`Catalog`].
//!
//! ```toml
//! ignore = ["#pragma"]
//!
//! [blocks.FUNCTION]
//! pattern = '^function (\w+)'
//! open = "{"
//! close = "}"
//! have_args = true
//! recursive = true
//! is_not_in = []
//! is_inside = []
//!
//! [singles.IMPORT]
//! element = "import "
//! position = "up"
//! way = "startswith"
//! ```
//!
//! Table order is declaration order and is significant.

use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

use crate::edit_distance;
use crate::error::{CatalogError, ScanError};
use crate::types::{BlockSpec, Catalog, Position, SingleSpec, Way};

const KNOWN_CATALOG_KEYS: &[&str] = &["blocks", "singles", "ignore"];
const KNOWN_BLOCK_KEYS: &[&str] =
    &["pattern", "open", "close", "have_args", "recursive", "is_not_in", "is_inside"];
const KNOWN_SINGLE_KEYS: &[&str] = &["element", "position", "way"];

/// Built-in catalogs, embedded at compile time.
const PRESETS: &[(&str, &str)] = &[("javascript", include_str!("../presets/javascript.toml"))];

/// Warn on keys outside `known`, suggesting the closest one when it's a likely typo.
fn warn_unknown_keys(context: &str, table: &toml::Table, known: &[&str]) {
    for key in table.keys() {
        if known.contains(&key.as_str()) {
            continue;
        }
        let suggestion = known.iter().min_by_key(|k| edit_distance(key, k));
        match suggestion {
            Some(s) if edit_distance(key, s) <= 3 => {
                warn!(context, key = key.as_str(), suggestion = *s, "Unknown catalog key; did you mean '{s}'?");
            }
            _ => {
                warn!(context, key = key.as_str(), "Unknown catalog key (known keys: {})", known.join(", "));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Typed field access
// ---------------------------------------------------------------------------

fn get_str<'t>(tag: &str, table: &'t toml::Table, field: &str) -> Result<Option<&'t str>, CatalogError> {
    match table.get(field) {
        None => Ok(None),
        Some(v) => v.as_str().map(Some).ok_or_else(|| CatalogError::WrongType {
            tag: tag.to_string(),
            field: field.to_string(),
            expected: "a string",
        }),
    }
}

fn get_bool(tag: &str, table: &toml::Table, field: &str) -> Result<bool, CatalogError> {
    match table.get(field) {
        None => Ok(false),
        Some(v) => v.as_bool().ok_or_else(|| CatalogError::WrongType {
            tag: tag.to_string(),
            field: field.to_string(),
            expected: "a boolean",
        }),
    }
}

fn get_list(tag: &str, value: Option<&toml::Value>, field: &str) -> Result<Vec<String>, CatalogError> {
    let wrong = || CatalogError::WrongType {
        tag: tag.to_string(),
        field: field.to_string(),
        expected: "an array of strings",
    };
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    value
        .as_array()
        .ok_or_else(wrong)?
        .iter()
        .map(|v| v.as_str().map(str::to_string).ok_or_else(wrong))
        .collect()
}

fn get_section<'t>(table: &'t toml::Table, name: &str) -> Result<Option<&'t toml::Table>, CatalogError> {
    match table.get(name) {
        None => Ok(None),
        Some(v) => v.as_table().map(Some).ok_or_else(|| CatalogError::WrongType {
            tag: name.to_string(),
            field: name.to_string(),
            expected: "a table",
        }),
    }
}

fn as_entry<'t>(tag: &str, value: &'t toml::Value) -> Result<&'t toml::Table, CatalogError> {
    value.as_table().ok_or_else(|| CatalogError::WrongType {
        tag: tag.to_string(),
        field: tag.to_string(),
        expected: "a table",
    })
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Block fields before `is_not_in` / `is_inside` tags are resolved.
struct RawBlock {
    spec: BlockSpec,
    is_not_in: Vec<String>,
    is_inside: Vec<String>,
}

fn compile_block(tag: &str, table: &toml::Table) -> Result<RawBlock, CatalogError> {
    warn_unknown_keys(tag, table, KNOWN_BLOCK_KEYS);

    let pattern = get_str(tag, table, "pattern")?
        .ok_or(CatalogError::MissingField { tag: tag.to_string(), field: "pattern" })?;
    let pattern = Regex::new(pattern)
        .map_err(|source| CatalogError::InvalidPattern { tag: tag.to_string(), source })?;
    let open = get_str(tag, table, "open")?.unwrap_or("{").to_string();
    let close = get_str(tag, table, "close")?.unwrap_or("}").to_string();
    if open.is_empty() || close.is_empty() {
        return Err(CatalogError::EmptyDelimiter { tag: tag.to_string() });
    }

    Ok(RawBlock {
        spec: BlockSpec {
            tag: tag.to_string(),
            pattern,
            open,
            close,
            have_args: get_bool(tag, table, "have_args")?,
            recursive: get_bool(tag, table, "recursive")?,
            is_not_in: Vec::new(),
            is_inside: Vec::new(),
        },
        is_not_in: get_list(tag, table.get("is_not_in"), "is_not_in")?,
        is_inside: get_list(tag, table.get("is_inside"), "is_inside")?,
    })
}

fn compile_single(tag: &str, table: &toml::Table) -> Result<SingleSpec, CatalogError> {
    warn_unknown_keys(tag, table, KNOWN_SINGLE_KEYS);

    let element = get_str(tag, table, "element")?
        .ok_or(CatalogError::MissingField { tag: tag.to_string(), field: "element" })?;
    let position = Position::parse(tag, get_str(tag, table, "position")?.unwrap_or("down"))?;
    let way = Way::parse(tag, get_str(tag, table, "way")?.unwrap_or("=="))?;

    Ok(SingleSpec { tag: tag.to_string(), element: element.to_string(), position, way })
}

fn resolve_refs(
    tag: &str,
    field: &'static str,
    names: &[String],
    blocks: &[RawBlock],
) -> Result<Vec<usize>, CatalogError> {
    names
        .iter()
        .map(|target| {
            blocks.iter().position(|b| &b.spec.tag == target).ok_or_else(|| CatalogError::UnknownBlockRef {
                tag: tag.to_string(),
                field,
                target: target.clone(),
            })
        })
        .collect()
}

/// Compile a catalog from TOML text.
pub fn parse_catalog(content: &str) -> Result<Catalog, CatalogError> {
    let table: toml::Table = content.parse()?;
    warn_unknown_keys("catalog", &table, KNOWN_CATALOG_KEYS);

    let ignore = get_list("catalog", table.get("ignore"), "ignore")?;

    let mut raw_blocks = Vec::new();
    if let Some(section) = get_section(&table, "blocks")? {
        for (tag, value) in section {
            raw_blocks.push(compile_block(tag, as_entry(tag, value)?)?);
        }
    }

    let mut singles = Vec::new();
    if let Some(section) = get_section(&table, "singles")? {
        for (tag, value) in section {
            singles.push(compile_single(tag, as_entry(tag, value)?)?);
        }
    }

    let mut seen = HashSet::new();
    for tag in raw_blocks.iter().map(|b| &b.spec.tag).chain(singles.iter().map(|s| &s.tag)) {
        if !seen.insert(tag.as_str()) {
            return Err(CatalogError::DuplicateTag { tag: tag.clone() });
        }
    }

    let mut blocks = Vec::with_capacity(raw_blocks.len());
    for raw in &raw_blocks {
        let mut spec = raw.spec.clone();
        spec.is_not_in = resolve_refs(&spec.tag, "is_not_in", &raw.is_not_in, &raw_blocks)?;
        spec.is_inside = resolve_refs(&spec.tag, "is_inside", &raw.is_inside, &raw_blocks)?;
        blocks.push(spec);
    }

    debug!(blocks = blocks.len(), singles = singles.len(), ignore = ignore.len(), "Catalog compiled");

    Ok(Catalog { blocks, singles, ignore })
}

/// Read and compile a catalog file.
pub fn load_catalog(path: &Path) -> Result<Catalog, ScanError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| ScanError::Io { path: path.to_path_buf(), source })?;
    Ok(parse_catalog(&content)?)
}

/// Names of the built-in catalogs.
pub fn preset_names() -> Vec<&'static str> {
    PRESETS.iter().map(|(name, _)| *name).collect()
}

/// Compile a built-in catalog by name.
pub fn preset(name: &str) -> Result<Catalog, CatalogError> {
    let (_, content) = PRESETS.iter().find(|(n, _)| *n == name).ok_or_else(|| CatalogError::UnknownPreset {
        name: name.to_string(),
        available: preset_names().join(", "),
    })?;
    parse_catalog(content)
}
