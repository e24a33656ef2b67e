//! Shared fixtures for integration tests.
//!
//! Builds a snapshot of a small "paused process" holding one instance of
//! each modeled container plus a few unmodeled objects.

#![allow(dead_code)]

use stlview::inspect::snapshot::{Snapshot, SnapshotBuilder};
use stlview::inspect::stdcxx;
use stlview::inspect::types::{DataType, Field};

/// Address of each fixture object, for assertions on rendered addresses.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub my_string: u64,
    pub my_vector: u64,
}

pub fn sample_process() -> (Snapshot, Layout) {
    let mut b = SnapshotBuilder::default();

    let my_vector = stdcxx::int_vector(&mut b, &[10, 20, 30]).unwrap();
    b.symbol("myVector", &stdcxx::vector_type("int"), my_vector);

    let empty = stdcxx::int_vector(&mut b, &[]).unwrap();
    b.symbol("emptyVector", &stdcxx::vector_type("int"), empty);

    let my_string = stdcxx::string(&mut b, b"hi").unwrap();
    b.symbol("myString", "std::__cxx11::string", my_string);

    let old = stdcxx::legacy_string(&mut b, b"hello");
    b.symbol("oldString", "std::string", old);

    stdcxx::define_string(&mut b);
    let entries: Vec<_> = [("key1", 42u64), ("key2", 7), ("two words", 2)]
        .iter()
        .map(|(k, v)| (stdcxx::string_object(&mut b, k.as_bytes()), b.encode(*v, 4)))
        .collect();
    let my_map = stdcxx::unordered_map(&mut b, stdcxx::CXX11_STRING, "int", &entries).unwrap();
    b.symbol(
        "myMap",
        &stdcxx::unordered_map_type(stdcxx::CXX11_STRING, "int"),
        my_map,
    );

    let entries = vec![(b.encode(1, 4), b.encode(100, 8)), (b.encode(2, 4), b.encode(200, 8))];
    let int_map = stdcxx::unordered_map(&mut b, "int", "long", &entries).unwrap();
    b.symbol("intMap", &stdcxx::unordered_map_type("int", "long"), int_map);

    let mut words = stdcxx::string_object(&mut b, b"alpha");
    words.extend(stdcxx::string_object(&mut b, b"beta"));
    let words = stdcxx::vector(&mut b, stdcxx::CXX11_STRING, &words, 0).unwrap();
    b.symbol("words", &stdcxx::vector_type(stdcxx::CXX11_STRING), words);

    b.define(DataType::structure(
        "point",
        8,
        vec![Field::new("x", "int", 0), Field::new("y", "int", 4)],
    ));
    let mut xy = b.encode(3, 4);
    xy.extend(b.encode(4, 4));
    let point = b.alloc(&xy, 4);
    b.symbol("origin", "point", point);

    let n = b.alloc(&b.encode(5, 4), 4);
    b.symbol("count", "int", n);

    (
        b.build(),
        Layout {
            my_string,
            my_vector,
        },
    )
}
