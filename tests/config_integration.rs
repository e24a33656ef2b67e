//! Configuration files and their effect on views.

mod common;

use std::io::Write;

use stlview::config::{ConfigError, KeyMatchConfig, ViewerConfig};
use stlview::inspect::snapshot::SnapshotBuilder;
use stlview::inspect::stdcxx;
use stlview::Viewer;

#[test]
fn config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"max_chain_nodes": 2, "keys": {{"literal_quote": "'"}}}}"#).unwrap();
    let config = ViewerConfig::from_path(file.path()).unwrap();
    assert_eq!(config.max_chain_nodes, 2);
    assert_eq!(config.keys.literal_quote, "'");
    assert_eq!(config.legacy_header_words, 3);
}

#[test]
fn chain_limit_stops_long_maps() {
    let (snap, _) = common::sample_process();
    let config = ViewerConfig {
        max_chain_nodes: 2,
        ..ViewerConfig::default()
    };
    let viewer = Viewer::new(&config);
    assert!(viewer.invoke(&snap, "myMap").starts_with("Layout Error: "));
    // The element count is read directly, so size still works.
    assert_eq!(viewer.invoke(&snap, "/l myMap"), "3");
    assert_eq!(viewer.invoke(&snap, "/f myMap key1"), "42");
}

#[test]
fn literal_key_comparison_uses_backend_text() {
    let (snap, _) = common::sample_process();
    let config = ViewerConfig {
        keys: KeyMatchConfig {
            decode_string_keys: false,
            ..KeyMatchConfig::default()
        },
        ..ViewerConfig::default()
    };
    // Without decoding, a string key renders as its raw members and never
    // equals the quoted literal.
    let viewer = Viewer::new(&config);
    assert_eq!(
        viewer.invoke(&snap, "/f myMap key1"),
        "Not Found Error: key1"
    );
}

#[test]
fn literal_key_comparison_matches_rendered_keys() {
    // Keys of an enum type excluded from integer comparison are matched by
    // their rendered enumerator name.
    let mut b = SnapshotBuilder::default();
    b.define(
        serde_json::from_str(
            r#"{"name": "color", "size": 4, "kind": "enum",
                "members": [{"name": "RED", "value": 0}, {"name": "BLUE", "value": 1}]}"#,
        )
        .unwrap(),
    );
    let entries = vec![(b.encode(0, 4), b.encode(10, 4)), (b.encode(1, 4), b.encode(11, 4))];
    let m = stdcxx::unordered_map(&mut b, "color", "int", &entries).unwrap();
    b.symbol("m", &stdcxx::unordered_map_type("color", "int"), m);
    let snap = b.build();

    let config = ViewerConfig {
        keys: KeyMatchConfig {
            integer_codes: vec![],
            literal_quote: String::new(),
            ..KeyMatchConfig::default()
        },
        ..ViewerConfig::default()
    };
    let viewer = Viewer::new(&config);
    assert_eq!(viewer.invoke(&snap, "/f m BLUE"), "11");
    assert_eq!(viewer.invoke(&snap, "m"), "{RED: 10, BLUE: 11}");
    assert_eq!(Viewer::default().invoke(&snap, "/f m 0"), "10");
}

#[test]
fn legacy_header_distance_is_configurable() {
    let (snap, _) = common::sample_process();
    // One word back from the data is the refcount, which is zero.
    let config = ViewerConfig {
        legacy_header_words: 1,
        ..ViewerConfig::default()
    };
    assert_eq!(Viewer::new(&config).invoke(&snap, "/l oldString"), "0");
}

#[test]
fn invalid_config_rejected() {
    assert!(matches!(
        ViewerConfig::from_json(r#"{"legacy_header_words": 0}"#),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        ViewerConfig::from_path("/nonexistent/config.json"),
        Err(ConfigError::Io(_))
    ));
}
