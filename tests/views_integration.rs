//! Layout properties checked over a range of container contents.

mod common;

use stlview::inspect::snapshot::SnapshotBuilder;
use stlview::inspect::stdcxx;
use stlview::views::registry::default_registry;
use stlview::views::{ElementText, UnorderedMapView, View};
use stlview::{Inspector, ViewError, ViewerConfig};

fn sample_strings() -> Vec<Vec<u8>> {
    vec![
        b"".to_vec(),
        b"x".to_vec(),
        b"exactly fifteen".to_vec(),
        b"sixteen chars!!!".to_vec(),
        (0u8..=255).filter(|b| *b != 0).collect(),
    ]
}

#[test]
fn string_size_and_index_agree_with_content() {
    let registry = default_registry();
    for content in sample_strings() {
        let mut b = SnapshotBuilder::default();
        let old = stdcxx::legacy_string(&mut b, &content);
        let new = stdcxx::string(&mut b, &content).unwrap();
        b.symbol("old", "std::string", old)
            .symbol("new", "std::__cxx11::string", new);
        let snap = b.build();

        for sym in ["old", "new"] {
            let s = snap.lookup_symbol(sym).unwrap();
            let view = registry.resolve_value(&snap, &s).unwrap();
            let size = view.size(&snap, &s).unwrap();
            assert_eq!(size, content.len(), "{} {:?}", sym, content);
            for (i, byte) in content.iter().enumerate() {
                let c = view.at(&snap, &s, i as i64).unwrap();
                assert_eq!(snap.to_int(&c).unwrap() as u8, *byte);
            }
            assert!(matches!(
                view.at(&snap, &s, size as i64),
                Err(ViewError::OutOfBounds { .. })
            ));
        }
    }
}

#[test]
fn vector_size_is_pointer_difference() {
    let registry = default_registry();
    for len in [0usize, 1, 2, 17, 100] {
        let values: Vec<i32> = (0..len as i32).map(|i| i * 3 - 50).collect();
        let mut b = SnapshotBuilder::default();
        let v = stdcxx::int_vector(&mut b, &values).unwrap();
        b.symbol("v", &stdcxx::vector_type("int"), v);
        let snap = b.build();
        let v = snap.lookup_symbol("v").unwrap();
        let view = registry.resolve(v.ty().name());

        assert_eq!(view.size(&snap, &v).unwrap(), len);
        let expected: Vec<String> = values.iter().map(|n| n.to_string()).collect();
        let text = view.render(&snap, &v).unwrap();
        assert!(
            text.ends_with(&format!("content: {{{}}}>", expected.join(", "))),
            "{}",
            text
        );
    }
}

#[test]
fn map_element_count_matches_chain() {
    let config = ViewerConfig::default();
    let view = UnorderedMapView::new(&config, ElementText::from_config(&config));
    for len in [0u64, 1, 5, 64] {
        let mut b = SnapshotBuilder::default();
        let entries: Vec<_> = (0..len)
            .map(|i| (b.encode(i * 7, 8), b.encode(i, 4)))
            .collect();
        let m = stdcxx::unordered_map(&mut b, "unsigned long", "int", &entries).unwrap();
        b.symbol("m", &stdcxx::unordered_map_type("unsigned long", "int"), m);
        let snap = b.build();
        let m = snap.lookup_symbol("m").unwrap();

        let walked = view.entries(&snap, &m).unwrap().count();
        assert_eq!(view.size(&snap, &m).unwrap(), walked);
        assert_eq!(walked as u64, len);

        for i in 0..len {
            let found = view.find(&snap, &m, &(i * 7).to_string()).unwrap();
            assert_eq!(snap.to_int(&found).unwrap(), i128::from(i));
        }
        assert!(matches!(
            view.find(&snap, &m, "1"),
            Err(ViewError::NotFound(_))
        ));
    }
}

#[test]
fn default_view_matches_backend_text() {
    let (snap, _) = common::sample_process();
    let registry = default_registry();
    for sym in ["origin", "count"] {
        let v = snap.lookup_symbol(sym).unwrap();
        let view = registry.resolve_value(&snap, &v).unwrap();
        assert_eq!(view.name(), "default");
        assert_eq!(view.render(&snap, &v).unwrap(), snap.to_text(&v).unwrap());
    }
}

#[test]
fn template_arguments_do_not_affect_resolution() {
    let registry = default_registry();
    let bare = registry.resolve("std::vector").name();
    for name in [
        "std::vector<int>",
        "std::vector<int, std::allocator<int> >",
        "std::vector<std::vector<char> >",
    ] {
        assert_eq!(registry.resolve(name).name(), bare);
    }
}

#[test]
fn layout_mismatch_fails_safely() {
    let (snap, _) = common::sample_process();
    let registry = default_registry();
    // An int viewed through the vector layout has no `_M_impl` member.
    let n = snap.lookup_symbol("count").unwrap();
    let vector = registry.resolve("std::vector");
    assert!(matches!(
        vector.size(&snap, &n),
        Err(ViewError::Backend(_))
    ));
    assert!(vector.render(&snap, &n).is_err());
}
