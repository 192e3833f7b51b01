//! Scanning files and directory trees.
//!
//! Every scan owns its own state, so files are scanned in parallel with rayon
//! against one shared, read-only [`Catalog`].

use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::{Result, ScanError};
use crate::scanner::scan_elements;
use crate::types::{Catalog, Element, ScanConfig};

/// Elements detected in one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileElements {
    pub path: String,
    pub line_count: usize,
    pub elements: Vec<Element>,
}

/// Result of a batch scan: successful files sorted by path, plus per-file failures.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub files: Vec<FileElements>,
    pub errors: Vec<(String, ScanError)>,
}

/// Read a file as lines. Invalid UTF-8 is replaced rather than rejected.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path).map_err(|source| ScanError::Io { path: path.to_path_buf(), source })?;
    Ok(String::from_utf8_lossy(&bytes).lines().map(|l| l.to_string()).collect())
}

/// Scan a single file.
pub fn scan_file(path: &Path, catalog: &Catalog) -> Result<Vec<Element>> {
    let lines = read_lines(path)?;
    scan_elements(&lines, catalog)
}

// ---------------------------------------------------------------------------
// Parallel file walking
// ---------------------------------------------------------------------------

/// Collect the files under `roots`. Explicit file roots are always kept;
/// walked files are filtered by `config.extensions` (empty = all) and
/// `config.skip_dirs`.
pub fn collect_files(roots: &[PathBuf], config: &ScanConfig) -> Vec<PathBuf> {
    let results: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

    for root in roots {
        if root.is_file() {
            results.lock().unwrap().push(root.clone());
            continue;
        }
        if !root.is_dir() {
            warn!(path = %root.display(), "Skipping path (not found)");
            continue;
        }

        let skip = config.skip_dirs.clone();
        let exts: &HashSet<String> = &config.extensions;
        WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .threads(rayon::current_num_threads().min(12))
            .filter_entry(move |entry| {
                if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                    let name = entry.file_name().to_string_lossy();
                    return !skip.contains(name.as_ref());
                }
                true
            })
            .build_parallel()
            .run(|| {
                Box::new(|entry| {
                    let entry = match entry {
                        Ok(e) => e,
                        Err(_) => return ignore::WalkState::Continue,
                    };
                    if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                        return ignore::WalkState::Continue;
                    }
                    let ext = entry.path().extension().and_then(|e| e.to_str()).unwrap_or("");
                    if !exts.is_empty() && !exts.contains(ext) {
                        return ignore::WalkState::Continue;
                    }
                    results.lock().unwrap().push(entry.path().to_path_buf());
                    ignore::WalkState::Continue
                })
            });
    }

    let mut files = results.into_inner().unwrap();
    files.sort();
    files.dedup();
    files
}

/// Display path for a scanned file: relative to the config root when possible.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).to_string_lossy().replace('\\', "/")
}

/// Scan every file under `roots` in parallel.
pub fn scan_paths(roots: &[PathBuf], config: &ScanConfig, catalog: &Catalog) -> BatchOutcome {
    let start = Instant::now();
    let files = collect_files(roots, config);

    let results: Vec<(String, Result<FileElements>)> = files
        .par_iter()
        .map(|path| {
            let rel = display_path(path, &config.root);
            let scanned = read_lines(path).and_then(|lines| {
                let elements = scan_elements(&lines, catalog)?;
                Ok(FileElements { path: rel.clone(), line_count: lines.len(), elements })
            });
            (rel, scanned)
        })
        .collect();

    let mut outcome = BatchOutcome::default();
    for (rel, result) in results {
        match result {
            Ok(file) => outcome.files.push(file),
            Err(e) => {
                warn!(path = rel.as_str(), error = %e, "Scan failed");
                outcome.errors.push((rel, e));
            }
        }
    }

    debug!(
        files = outcome.files.len(),
        failed = outcome.errors.len(),
        elements = outcome.files.iter().map(|f| f.elements.len()).sum::<usize>(),
        time_ms = start.elapsed().as_millis() as u64,
        "Batch scan complete"
    );

    outcome
}
