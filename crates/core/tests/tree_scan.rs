//! Directory scans driven by a fixture project's `.blockscope.toml`.

mod helpers;

use blockscope_core::display::{files_json, format_elements};
use blockscope_core::Element;
use helpers::TestHarness;

#[test]
fn test_walk_respects_extensions_and_skip_dirs() {
    let h = TestHarness::from_fixture("basic");
    let outcome = h.scan();
    assert!(outcome.errors.is_empty(), "Scan errors: {:?}", outcome.errors);

    let paths: Vec<&str> = outcome.files.iter().map(|f| f.path.as_str()).collect();
    // notes.txt is filtered by extension, generated/ by the config's skip_dirs.
    assert_eq!(paths, vec!["src/loader.js"]);
    assert!(h.config.skip_dirs.contains("generated"));
    assert_eq!(h.config.preset.as_deref(), Some("javascript"));
}

#[test]
fn test_tree_scan_matches_direct_scan() {
    let h = TestHarness::from_fixture("basic");
    let from_tree = h.elements_of("src/loader.js");
    let direct = blockscope_core::batch::scan_file(&h.root.join("src/loader.js"), &h.catalog).unwrap();
    assert_eq!(from_tree, direct);

    let names: Vec<(&str, Option<&str>)> = from_tree
        .iter()
        .filter(|e| e.name.is_some())
        .map(|e| (e.tag.as_str(), e.name.as_deref()))
        .collect();
    assert_eq!(
        names,
        vec![
            ("CLASS", Some("Loader")),
            ("METHOD", Some("constructor")),
            ("METHOD", Some("load")),
            ("FUNCTION", Some("helper")),
            ("ARROW_FUNCTION", Some("double")),
        ]
    );
}

#[test]
fn test_tree_scan_is_deterministic() {
    let h = TestHarness::from_fixture("basic");
    let a = h.scan();
    let b = h.scan();
    let a: Vec<(String, Vec<Element>)> = a.files.into_iter().map(|f| (f.path, f.elements)).collect();
    let b: Vec<(String, Vec<Element>)> = b.files.into_iter().map(|f| (f.path, f.elements)).collect();
    assert_eq!(a, b);
}

#[test]
fn test_rendering_a_tree_scan() {
    let h = TestHarness::from_fixture("basic");
    let outcome = h.scan();
    let file = &outcome.files[0];
    assert_eq!(file.line_count, 27);

    let json = files_json(&outcome.files);
    assert_eq!(json[0]["path"], "src/loader.js");
    let class = json[0]["elements"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["tag"] == "CLASS")
        .unwrap()
        .clone();
    assert_eq!(class["start"], 6);
    assert_eq!(class["end"], 15);
    assert_eq!(class["name"], "Loader");

    let text = format_elements(&file.elements, None);
    assert!(text.lines().any(|l| l.starts_with("CLASS") && l.contains("7-16") && l.ends_with("Loader")));
}
