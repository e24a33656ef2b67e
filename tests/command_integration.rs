//! End-to-end tests of the `v` command against a synthesized process.

mod common;

use common::sample_process;
use stlview::{Viewer, ViewerConfig};

#[test]
fn size_of_vector() {
    let (snap, _) = sample_process();
    let viewer = Viewer::default();
    assert_eq!(viewer.invoke(&snap, "/l myVector"), "3");
}

#[test]
fn index_into_vector() {
    let (snap, _) = sample_process();
    let viewer = Viewer::default();
    assert_eq!(viewer.invoke(&snap, "/i myVector 1"), "20");
    assert_eq!(viewer.invoke(&snap, "/i myVector 0"), "10");
    assert_eq!(
        viewer.invoke(&snap, "/i myVector 3"),
        "Out Of Bounds Error: 3 (size 3)"
    );
}

#[test]
fn render_short_string() {
    let (snap, layout) = sample_process();
    let viewer = Viewer::default();
    assert_eq!(
        viewer.invoke(&snap, "myString"),
        format!("<address: {:#x}, content: {{hi}}>", layout.my_string + 16)
    );
    assert!(viewer
        .invoke(&snap, "oldString")
        .ends_with("content: {hello}>"));
    assert_eq!(viewer.invoke(&snap, "/l oldString"), "5");
    assert_eq!(viewer.invoke(&snap, "/i oldString 1"), "101 'e'");
}

#[test]
fn find_in_map() {
    let (snap, _) = sample_process();
    let viewer = Viewer::default();
    assert_eq!(viewer.invoke(&snap, "/f myMap key1"), "42");
    assert_eq!(viewer.invoke(&snap, "/f myMap \"two words\""), "2");
    assert_eq!(
        viewer.invoke(&snap, "/f myMap missing"),
        "Not Found Error: missing"
    );
    assert_eq!(viewer.invoke(&snap, "/f intMap 2"), "200");
    assert_eq!(viewer.invoke(&snap, "/l myMap"), "3");
}

#[test]
fn render_map_and_string_vector() {
    let (snap, _) = sample_process();
    let viewer = Viewer::default();
    assert_eq!(
        viewer.invoke(&snap, "myMap"),
        "{\"key1\": 42, \"key2\": 7, \"two words\": 2}"
    );
    assert_eq!(viewer.invoke(&snap, "intMap"), "{1: 100, 2: 200}");
    assert!(viewer
        .invoke(&snap, "words")
        .ends_with("content: {\"alpha\", \"beta\"}>"));
    assert_eq!(viewer.invoke(&snap, "/i words 1"), "\"beta\"");
}

#[test]
fn unknown_symbol() {
    let (snap, _) = sample_process();
    let viewer = Viewer::default();
    assert_eq!(
        viewer.invoke(&snap, "bogusSymbol"),
        "Symbol Error: bogusSymbol"
    );
}

#[test]
fn unmodeled_types_fall_back() {
    let (snap, _) = sample_process();
    let viewer = Viewer::default();
    assert_eq!(viewer.invoke(&snap, "origin"), "{x = 3, y = 4}");
    assert_eq!(viewer.invoke(&snap, "count"), "5");
    assert_eq!(viewer.invoke(&snap, "/l origin"), "Unimplemented Error: /l");
    assert_eq!(viewer.invoke(&snap, "/i count 0"), "Unimplemented Error: /i");
    assert_eq!(viewer.invoke(&snap, "/f myVector 0"), "Unimplemented Error: /f");
}

#[test]
fn argument_errors() {
    let (snap, _) = sample_process();
    let viewer = Viewer::new(&ViewerConfig::default());
    for line in ["", "/l", "/l myVector 1", "/i myVector", "/q myVector 1"] {
        let out = viewer.invoke(&snap, line);
        if line == "/l" {
            // A lone flag is taken as an object name.
            assert_eq!(out, "Symbol Error: /l");
        } else {
            assert!(out.starts_with("Argument Error: "), "{:?} -> {}", line, out);
        }
    }
    assert!(viewer
        .invoke(&snap, "/i myVector one")
        .starts_with("Argument Error: "));
}

#[test]
fn malformed_numbers_are_argument_errors() {
    let (snap, _) = sample_process();
    let viewer = Viewer::default();
    for line in [
        "/i myVector --1",
        "/i myVector +1",
        "/i myVector 0x-1",
        "/f intMap --2",
        "/f intMap +2",
        "/f intMap 0x-2",
        "/f intMap -0x-80000000000000000000000000000000",
        "/f intMap --170141183460469231731687303460469231728",
    ] {
        let out = viewer.invoke(&snap, line);
        assert!(out.starts_with("Argument Error: "), "{:?} -> {}", line, out);
    }
    assert_eq!(viewer.invoke(&snap, "/i myVector 0x1"), "20");
    assert_eq!(
        viewer.invoke(&snap, "/f intMap -0x80000000000000000000000000000000"),
        "Not Found Error: -0x80000000000000000000000000000000"
    );
}

#[test]
fn oversized_index_reports_argument_error() {
    let (snap, _) = sample_process();
    let viewer = Viewer::default();
    assert_eq!(
        viewer.invoke(&snap, "/i myVector 9223372036854775808"),
        "Argument Error: index out of range: 9223372036854775808"
    );
    assert_eq!(
        viewer.invoke(&snap, "/i myVector 9223372036854775807"),
        "Out Of Bounds Error: 9223372036854775807 (size 3)"
    );
}

#[test]
fn every_outcome_is_one_line() {
    let (snap, _) = sample_process();
    let viewer = Viewer::default();
    for line in [
        "myVector",
        "emptyVector",
        "/i emptyVector 0",
        "/f myMap nope",
        "/f intMap x",
        "\"unterminated",
        "nothing",
    ] {
        assert!(!viewer.invoke(&snap, line).contains('\n'), "{}", line);
    }
}

#[test]
fn viewer_usage_lists_modes() {
    for flag in ["/l", "/i", "/f"] {
        assert!(Viewer::USAGE.contains(flag));
    }
}
