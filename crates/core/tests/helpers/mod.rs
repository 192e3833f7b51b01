//! Test harness for scan integration tests.
//!
//! Copies a fixture project into a temp dir, loads its `.blockscope.toml` and
//! resolves the catalog exactly as the CLI does.

pub mod fixtures;

use blockscope_core::batch::{scan_paths, BatchOutcome};
use blockscope_core::types::{Catalog, Element, ScanConfig};
use blockscope_core::{load_blockscope_config, resolve_catalog};
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestHarness {
    pub root: PathBuf,
    pub config: ScanConfig,
    pub catalog: Catalog,
    _temp_dir: TempDir,
}

impl TestHarness {
    /// Create a harness from a named fixture directory.
    pub fn from_fixture(name: &str) -> Self {
        let fixture_src = fixtures::fixture_path(name);
        assert!(fixture_src.exists(), "Fixture '{name}' not found at {}", fixture_src.display());

        // The walker skips hidden entries, and default temp dir names start with '.'.
        let temp_dir =
            tempfile::Builder::new().prefix("bscope-test").tempdir().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        fixtures::copy_dir_recursive(&fixture_src, &root);

        let config = load_blockscope_config(&root);
        let catalog = resolve_catalog(&config).expect("Fixture catalog should resolve");

        TestHarness { root, config, catalog, _temp_dir: temp_dir }
    }

    /// Scan the whole fixture tree.
    pub fn scan(&self) -> BatchOutcome {
        scan_paths(&[self.root.clone()], &self.config, &self.catalog)
    }

    /// Elements of one file from a full scan, by path relative to the root.
    pub fn elements_of(&self, rel: &str) -> Vec<Element> {
        let outcome = self.scan();
        assert!(outcome.errors.is_empty(), "Scan errors: {:?}", outcome.errors);
        outcome
            .files
            .into_iter()
            .find(|f| f.path == rel)
            .unwrap_or_else(|| panic!("{rel} was not scanned"))
            .elements
    }
}
