//! Writers for the libstdc++ container layouts the views decode.
//!
//! Each `define_*` function registers the internal types of one container
//! family on a [`SnapshotBuilder`]; the matching writer lays out an instance
//! in the builder's heap and returns the object's address. Layouts follow
//! libstdc++ on an LP64 or ILP32 target:
//!
//! - pre-C++11 `std::string`: one pointer to the character data, preceded
//!   by a `_Rep` header of length, capacity and refcount words
//! - `std::__cxx11::string`: data pointer, explicit length, 16-byte local
//!   buffer for short strings
//! - `std::vector<T>`: start, finish and end-of-storage pointers
//! - `std::unordered_map<K, V>`: hashtable with a before-begin sentinel whose
//!   `_M_nxt` threads every node in one forward list

use super::snapshot::SnapshotBuilder;
use super::types::{DataType, Field};
use crate::error::Result;

pub const LEGACY_STRING: &str =
    "std::basic_string<char, std::char_traits<char>, std::allocator<char> >";
pub const CXX11_STRING: &str =
    "std::__cxx11::basic_string<char, std::char_traits<char>, std::allocator<char> >";

const NODE_BASE: &str = "std::__detail::_Hash_node_base";
const LOCAL_BUF: usize = 16;

fn align_up(n: u64, align: u64) -> u64 {
    n.div_ceil(align.max(1)) * align.max(1)
}

fn pad_to(bytes: &mut Vec<u8>, len: u64) {
    bytes.resize(len as usize, 0);
}

/// Register the copy-on-write string layout under `std::string`.
pub fn define_legacy_string(b: &mut SnapshotBuilder) {
    let ps = b.pointer_size();
    let hider = format!("{}::_Alloc_hider", LEGACY_STRING);
    b.define(DataType::structure(
        hider.clone(),
        ps,
        vec![Field::new("_M_p", "char *", 0)],
    ))
    .define(DataType::template(
        LEGACY_STRING,
        ps,
        vec![Field::new("_M_dataplus", hider, 0)],
        vec!["char".to_string()],
    ))
    .define(DataType::typedef("std::string", LEGACY_STRING));
}

/// Lay out a copy-on-write string and return the object's address.
pub fn legacy_string(b: &mut SnapshotBuilder, content: &[u8]) -> u64 {
    define_legacy_string(b);
    let len = content.len() as u64;
    let mut rep = b.word(len);
    rep.extend(b.word(len));
    rep.extend(b.word(0));
    rep.extend_from_slice(content);
    rep.push(0);
    let rep_addr = b.alloc(&rep, b.pointer_size());
    let data = rep_addr + 3 * b.pointer_size();
    let obj = b.word(data);
    b.alloc(&obj, b.pointer_size())
}

/// Register the C++11 small-string layout under `std::__cxx11::string`.
pub fn define_string(b: &mut SnapshotBuilder) {
    let ps = b.pointer_size();
    let hider = format!("{}::_Alloc_hider", CXX11_STRING);
    b.define(DataType::array("char [16]", "char", LOCAL_BUF as u64))
        .define(DataType::structure(
            hider.clone(),
            ps,
            vec![Field::new("_M_p", "char *", 0)],
        ))
        .define(DataType::template(
            CXX11_STRING,
            2 * ps + LOCAL_BUF as u64,
            vec![
                Field::new("_M_dataplus", hider, 0),
                Field::new("_M_string_length", "size_t", ps),
                Field::new("_M_local_buf", "char [16]", 2 * ps),
            ],
            vec!["char".to_string()],
        ))
        .define(DataType::typedef("std::__cxx11::string", CXX11_STRING));
}

/// Lay out a C++11 string, using the local buffer when the content fits.
pub fn string(b: &mut SnapshotBuilder, content: &[u8]) -> Result<u64> {
    define_string(b);
    let ps = b.pointer_size();
    if content.len() >= LOCAL_BUF {
        let bytes = string_object(b, content);
        return Ok(b.alloc(&bytes, ps));
    }
    let obj = b.alloc_zeroed((2 * ps) as usize + LOCAL_BUF, ps);
    let local = obj + 2 * ps;
    let mut bytes = b.word(local);
    bytes.extend(b.word(content.len() as u64));
    bytes.extend_from_slice(content);
    b.write(obj, &bytes)?;
    Ok(obj)
}

/// Bytes of a C++11 string object whose data lives on the heap, for
/// embedding inside other objects.
pub fn string_object(b: &mut SnapshotBuilder, content: &[u8]) -> Vec<u8> {
    define_string(b);
    let mut data = content.to_vec();
    data.push(0);
    let data_addr = b.alloc(&data, 1);
    let mut bytes = b.word(data_addr);
    bytes.extend(b.word(content.len() as u64));
    bytes.extend(b.word(content.len() as u64));
    pad_to(&mut bytes, 2 * b.pointer_size() + LOCAL_BUF as u64);
    bytes
}

pub fn vector_type(elem: &str) -> String {
    format!("std::vector<{e}, std::allocator<{e}> >", e = elem)
}

pub fn define_vector(b: &mut SnapshotBuilder, elem: &str) {
    let ps = b.pointer_size();
    let pointer = format!("{} *", elem);
    let imp = format!("std::_Vector_base<{e}, std::allocator<{e}> >::_Vector_impl", e = elem);
    b.define(DataType::structure(
        imp.clone(),
        3 * ps,
        vec![
            Field::new("_M_start", pointer.clone(), 0),
            Field::new("_M_finish", pointer.clone(), ps),
            Field::new("_M_end_of_storage", pointer, 2 * ps),
        ],
    ))
    .define(DataType::template(
        vector_type(elem),
        3 * ps,
        vec![Field::new("_M_impl", imp, 0)],
        vec![elem.to_string(), format!("std::allocator<{}>", elem)],
    ));
}

/// Lay out a vector over the raw bytes of its elements. Empty vectors hold
/// null pointers, as a default-constructed vector does.
pub fn vector(b: &mut SnapshotBuilder, elem: &str, data: &[u8], spare: usize) -> Result<u64> {
    define_vector(b, elem);
    let ps = b.pointer_size();
    let size = b.sizeof(elem)?;
    let (start, finish, end) = if data.is_empty() && spare == 0 {
        (0, 0, 0)
    } else {
        let mut storage = data.to_vec();
        storage.resize(data.len() + spare * size as usize, 0);
        let start = b.alloc(&storage, ps.max(size.min(16)));
        let finish = start + data.len() as u64;
        (start, finish, start + storage.len() as u64)
    };
    let mut obj = b.word(start);
    obj.extend(b.word(finish));
    obj.extend(b.word(end));
    Ok(b.alloc(&obj, ps))
}

pub fn int_vector(b: &mut SnapshotBuilder, values: &[i32]) -> Result<u64> {
    let data: Vec<u8> = values
        .iter()
        .flat_map(|v| b.encode(*v as u32 as u64, 4))
        .collect();
    vector(b, "int", &data, 0)
}

pub fn pair_type(key: &str, value: &str) -> String {
    format!("std::pair<const {}, {}>", key, value)
}

pub fn hashtable_type(key: &str, value: &str) -> String {
    let pair = pair_type(key, value);
    format!(
        "std::_Hashtable<{k}, {p}, std::allocator<{p} > >",
        k = key,
        p = pair
    )
}

pub fn unordered_map_type(key: &str, value: &str) -> String {
    format!(
        "std::unordered_map<{k}, {v}, std::hash<{k}>, std::equal_to<{k}>, std::allocator<{p} > >",
        k = key,
        v = value,
        p = pair_type(key, value)
    )
}

/// Offset of `second` and total size of `std::pair<const K, V>`.
fn pair_layout(b: &SnapshotBuilder, key: &str, value: &str) -> Result<(u64, u64)> {
    let ps = b.pointer_size();
    let key_size = b.sizeof(key)?;
    let value_size = b.sizeof(value)?;
    let second = align_up(key_size, value_size.clamp(1, ps));
    let align = key_size.max(value_size).clamp(1, ps);
    Ok((second, align_up(second + value_size, align)))
}

pub fn define_unordered_map(b: &mut SnapshotBuilder, key: &str, value: &str) -> Result<()> {
    let ps = b.pointer_size();
    let pair = pair_type(key, value);
    let (second, pair_size) = pair_layout(b, key, value)?;
    let storage_bytes = format!("unsigned char [{}]", pair_size);
    let buffer = format!("__gnu_cxx::__aligned_buffer<{} >", pair);
    let node = format!("std::__detail::_Hash_node<{}, false>", pair);
    let table = hashtable_type(key, value);
    let node_ptr = format!("{} *", NODE_BASE);

    b.define(DataType::template(
        pair.clone(),
        pair_size,
        vec![Field::new("first", key, 0), Field::new("second", value, second)],
        vec![key.to_string(), value.to_string()],
    ))
    .define(DataType::array(
        storage_bytes.clone(),
        "unsigned char",
        pair_size,
    ))
    .define(DataType::template(
        buffer.clone(),
        pair_size,
        vec![Field::new("_M_storage", storage_bytes, 0)],
        vec![pair.clone()],
    ))
    .define(DataType::structure(
        NODE_BASE,
        ps,
        vec![Field::new("_M_nxt", node_ptr.clone(), 0)],
    ))
    .define(DataType::template(
        node.clone(),
        ps + pair_size,
        vec![
            Field::new("_M_nxt", node_ptr.clone(), 0),
            Field::new("_M_storage", buffer, ps),
        ],
        vec![pair.clone(), "bool".to_string()],
    ))
    .define(DataType::template(
        table.clone(),
        7 * ps,
        vec![
            Field::new("_M_buckets", format!("{}*", node_ptr), 0),
            Field::new("_M_bucket_count", "size_t", ps),
            Field::new("_M_before_begin", NODE_BASE, 2 * ps),
            Field::new("_M_element_count", "size_t", 3 * ps),
        ],
        vec![key.to_string(), pair.clone()],
    ))
    .define(DataType::typedef(format!("{}::__node_type", table), node))
    .define(DataType::template(
        unordered_map_type(key, value),
        7 * ps,
        vec![Field::new("_M_h", table, 0)],
        vec![
            key.to_string(),
            value.to_string(),
            format!("std::hash<{}>", key),
            format!("std::equal_to<{}>", key),
            format!("std::allocator<{} >", pair),
        ],
    ));
    Ok(())
}

/// Lay out a hash map whose node chain visits `entries` in order.
///
/// `entries` are the raw bytes of each key and mapped value.
pub fn unordered_map(
    b: &mut SnapshotBuilder,
    key: &str,
    value: &str,
    entries: &[(Vec<u8>, Vec<u8>)],
) -> Result<u64> {
    define_unordered_map(b, key, value)?;
    let ps = b.pointer_size();
    let (second, pair_size) = pair_layout(b, key, value)?;

    let mut next = 0u64;
    for (k, v) in entries.iter().rev() {
        let mut node = b.word(next);
        let mut pair = k.clone();
        pad_to(&mut pair, second);
        pair.extend_from_slice(v);
        pad_to(&mut pair, pair_size);
        node.extend(pair);
        next = b.alloc(&node, ps);
    }

    let bucket_count = entries.len().max(1) as u64;
    let buckets = b.alloc_zeroed((bucket_count * ps) as usize, ps);
    let mut obj = b.word(buckets);
    obj.extend(b.word(bucket_count));
    obj.extend(b.word(next));
    obj.extend(b.word(entries.len() as u64));
    pad_to(&mut obj, 7 * ps);
    Ok(b.alloc(&obj, ps))
}
