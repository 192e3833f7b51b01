//! BlockScope: declarative, line-based code structure detection.
//!
//! Given the lines of a source file and a catalog of block constructs
//! (functions, classes, comment regions) and single-line constructs (imports,
//! directives), produces the detected elements with their line ranges and
//! names. Heuristic: structure is inferred from per-line regex matches and
//! delimiter balance, never from a grammar.
//!
//! # Modules
//!
//! - [`scanner`]: The per-line scan loop and [`scan_elements`] entry point
//! - [`balance`]: Delimiter balance counting (multi-character delimiters)
//! - [`normalize`]: String-literal stripping and whitespace collapsing
//! - [`nesting`]: Open block instances, single-line streaks, pending argument lists
//! - [`classify`]: Which catalog tag a line starts
//! - [`builder`]: Element record creation and range closing
//! - [`catalog`]: TOML catalogs and built-in presets
//! - [`batch`]: Parallel scanning of files and directory trees
//! - [`display`]: Text and JSON rendering of elements
//! - [`types`]: Core types shared across the crate
//! - [`error`]: Error types and exit codes

pub mod balance;
pub mod batch;
pub mod builder;
pub mod catalog;
pub mod classify;
pub mod display;
pub mod error;
pub mod nesting;
pub mod normalize;
pub mod scanner;
pub mod types;

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub use error::{CatalogError, Result, ScanError};
pub use normalize::normalize_line;
pub use scanner::{scan_elements, Scanner};
pub use types::{Catalog, Element, ScanConfig};

// ---------------------------------------------------------------------------
// .blockscope.toml config loading
// ---------------------------------------------------------------------------

/// Known keys in `.blockscope.toml` for config validation.
const KNOWN_CONFIG_KEYS: &[&str] = &["preset", "catalog", "extensions", "skip_dirs", "ignore"];

/// Simple Levenshtein edit distance for typo suggestions.
pub(crate) fn edit_distance(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn string_array(value: &toml::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(|v| v.as_str().map(|s| s.to_string())).collect())
        .unwrap_or_default()
}

/// Load scan configuration from `.blockscope.toml` in the given root.
///
/// Returns a [`ScanConfig`] with defaults merged with any overrides from the config file.
/// If the file doesn't exist or can't be parsed, returns defaults with a warning.
/// Unknown keys trigger a warning with a typo suggestion.
pub fn load_blockscope_config(root: &Path) -> ScanConfig {
    let mut config = ScanConfig::new(root.to_path_buf());
    let config_path = root.join(".blockscope.toml");

    if !config_path.exists() {
        return config;
    }

    debug!("Loading .blockscope.toml");
    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to read .blockscope.toml");
            return config;
        }
    };
    let table = match content.parse::<toml::Table>() {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "Failed to parse .blockscope.toml");
            return config;
        }
    };

    // Validate keys, warn on unknown
    for key in table.keys() {
        if KNOWN_CONFIG_KEYS.contains(&key.as_str()) {
            continue;
        }
        let suggestion = KNOWN_CONFIG_KEYS.iter().min_by_key(|k| edit_distance(key, k));
        match suggestion {
            Some(s) if edit_distance(key, s) <= 3 => {
                warn!(key = key.as_str(), suggestion = *s, "Unknown key in .blockscope.toml; did you mean '{s}'?");
            }
            _ => {
                warn!(
                    key = key.as_str(),
                    "Unknown key in .blockscope.toml (known keys: {})",
                    KNOWN_CONFIG_KEYS.join(", ")
                );
            }
        }
    }

    if let Some(preset) = table.get("preset").and_then(|v| v.as_str()) {
        config.preset = Some(preset.to_string());
    }

    if let Some(catalog) = table.get("catalog").and_then(|v| v.as_str()) {
        config.catalog = Some(PathBuf::from(catalog));
    }

    // extensions replace the defaults
    if let Some(exts) = table.get("extensions") {
        config.extensions = string_array(exts).into_iter().collect();
    }

    // skip_dirs merge with defaults
    if let Some(dirs) = table.get("skip_dirs") {
        config.skip_dirs.extend(string_array(dirs));
    }

    if let Some(ignore) = table.get("ignore") {
        config.ignore = string_array(ignore);
    }

    config
}

/// Build the catalog a [`ScanConfig`] asks for: its catalog file if set, else
/// its preset, else the default preset. The config's extra ignore substrings
/// are merged in.
pub fn resolve_catalog(config: &ScanConfig) -> Result<Catalog> {
    let catalog = match (&config.catalog, &config.preset) {
        (Some(path), _) => {
            let path = if path.is_absolute() { path.clone() } else { config.root.join(path) };
            catalog::load_catalog(&path)?
        }
        (None, Some(name)) => catalog::preset(name)?,
        (None, None) => catalog::preset(types::DEFAULT_PRESET)?,
    };
    Ok(catalog.with_extra_ignore(&config.ignore))
}
