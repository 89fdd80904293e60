//! Integration tests for the reachability closure over fixture packages
//!
//! Each fixture directory under `tests/fixtures` is one Go package; the file
//! named in each test is the entry.

use std::fs;
use std::path::{Path, PathBuf};

use gocut_core::closure::{Closure, ClosureBuilder};
use gocut_core::loader::{Package, load_package};
use insta::assert_json_snapshot;
use serde::Serialize;

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../tests/fixtures");

fn fixture(relative_path: &str) -> PathBuf {
    Path::new(FIXTURES_DIR).join(relative_path)
}

fn closure_for(entry: &Path) -> (Package, Closure) {
    let package = load_package(entry)
        .unwrap_or_else(|e| panic!("Failed to load {}: {}", entry.display(), e));
    let model = package.resolve();
    let closure = ClosureBuilder::new(&package, &model).build();
    (package, closure)
}

fn used(closure: &Closure) -> Vec<&str> {
    closure.used.iter().map(String::as_str).collect()
}

#[derive(Serialize)]
struct RetainedSnapshot {
    file: String,
    names: Vec<String>,
}

#[derive(Serialize)]
struct ClosureSnapshot {
    used: Vec<String>,
    retained: Vec<RetainedSnapshot>,
}

fn snapshot(package: &Package, closure: &Closure) -> ClosureSnapshot {
    let retained = closure
        .retained
        .iter()
        .map(|&decl_ref| RetainedSnapshot {
            file: package
                .file(decl_ref.file)
                .and_then(|f| f.path().file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            names: package.declared_names(decl_ref),
        })
        .collect();

    ClosureSnapshot {
        used: closure.used.iter().cloned().collect(),
        retained,
    }
}

#[test]
fn end_to_end_fixture_keeps_reachable_chain() {
    let (package, closure) = closure_for(&fixture("e2e/entry.go"));

    assert_eq!(
        used(&closure),
        vec!["Helper2Type", "MainFunc", "MyStruct", "helper"]
    );
    assert!(!closure.contains("Unused"));
    assert_json_snapshot!("e2e_closure", snapshot(&package, &closure));
}

#[test]
fn self_contained_entry_uses_exactly_its_declarations() {
    let (package, closure) = closure_for(&fixture("selfcontained/main.go"));

    assert_eq!(used(&closure), vec!["Len", "Measure", "Point", "Scale"]);
    assert!(closure.retained.iter().all(|r| r.file == package.entry));
}

#[test]
fn closure_is_idempotent() {
    let entry = fixture("e2e/entry.go");
    let (_, first) = closure_for(&entry);
    let (_, second) = closure_for(&entry);

    assert_eq!(first, second);
}

#[test]
fn extra_reference_only_grows_the_closure() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["entry.go", "support.go"] {
        fs::copy(fixture("e2e").join(name), dir.path().join(name)).unwrap();
    }
    let (_, before) = closure_for(&dir.path().join("entry.go"));

    fs::write(
        dir.path().join("entry.go"),
        "package e2e\n\nfunc MainFunc() {\n\thelper()\n\tUnused()\n}\n",
    )
    .unwrap();
    let (_, after) = closure_for(&dir.path().join("entry.go"));

    assert!(before.used.is_subset(&after.used));
    assert!(after.contains("Unused"));
}

#[test]
fn mutual_recursion_terminates_with_both_members() {
    let (_, closure) = closure_for(&fixture("cycle/main.go"));

    assert_eq!(used(&closure), vec!["Start", "ping", "pong"]);
}

#[test]
fn struct_fields_pull_in_their_types() {
    let (_, closure) = closure_for(&fixture("structs/main.go"));

    assert_eq!(used(&closure), vec!["Leaf", "Payload", "Root", "Tree"]);
    assert!(!closure.contains("Orphan"));
}

#[test]
fn interface_method_sets_are_not_expanded() {
    let (_, closure) = closure_for(&fixture("interfaces/main.go"));

    assert_eq!(used(&closure), vec!["S", "Shape", "Square"]);
    assert!(!closure.contains("Unit"));
    assert!(!closure.contains("Area"));
}

#[test]
fn function_literal_bodies_are_not_followed() {
    let (_, closure) = closure_for(&fixture("funclit/main.go"));

    assert_eq!(used(&closure), vec!["Handler", "Run"]);
    assert!(!closure.contains("compute"));
}

#[test]
fn local_shadowing_does_not_reach_package_level() {
    let (_, closure) = closure_for(&fixture("shadowing/main.go"));

    assert_eq!(used(&closure), vec!["Run"]);
}
