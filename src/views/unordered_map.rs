//! View over `std::unordered_map`.
//!
//! libstdc++ threads every node of the hashtable through one forward list
//! starting at the `_M_before_begin` sentinel; buckets only index into that
//! list. The view walks the list and never touches the buckets. Each node's
//! `_M_storage` holds a `std::pair<const K, V>`.

use super::iter::ChainIter;
use super::keys::KeyMatcher;
use super::string::ElementText;
use super::{to_size, View};
use crate::config::ViewerConfig;
use crate::error::{Result, ViewError};
use crate::inspect::{Inspector, Type, Value};

#[derive(Debug, Clone)]
pub struct UnorderedMapView {
    keys: KeyMatcher,
    max_chain_nodes: usize,
    elements: ElementText,
}

impl UnorderedMapView {
    pub const NAMES: &'static [&'static str] = &["std::unordered_map"];

    pub fn new(config: &ViewerConfig, elements: ElementText) -> Self {
        Self {
            keys: KeyMatcher::new(config.keys.clone(), elements),
            max_chain_nodes: config.max_chain_nodes,
            elements,
        }
    }

    /// `(key, value)` pairs in chain order.
    pub fn entries<'a>(&self, inspector: &'a dyn Inspector, value: &Value) -> Result<Entries<'a>> {
        let table = inspector.field(value, "_M_h")?;
        let sentinel = inspector.field(&table, "_M_before_begin")?;
        let head = inspector.field(&sentinel, "_M_nxt")?;
        let table_type = inspector.strip_typedefs(table.ty())?;
        let node_type = inspector.lookup_type(&format!("{}::__node_type", table_type))?;
        let pair_type = inspector.template_argument(&node_type, 0)?;
        Ok(Entries {
            inspector,
            chain: ChainIter::new(
                inspector,
                head,
                node_type.pointer(),
                "_M_nxt",
                self.max_chain_nodes,
            ),
            pair_pointer: pair_type.pointer(),
        })
    }
}

/// Iterator over the pairs of one map.
pub struct Entries<'a> {
    inspector: &'a dyn Inspector,
    chain: ChainIter<'a>,
    pair_pointer: Type,
}

impl Entries<'_> {
    fn pair(&self, node: Value) -> Result<(Value, Value)> {
        let ix = self.inspector;
        let storage = ix.address_of(&ix.field(&node, "_M_storage")?)?;
        let pair = ix.dereference(&ix.cast(&storage, &self.pair_pointer)?)?;
        Ok((ix.field(&pair, "first")?, ix.field(&pair, "second")?))
    }
}

impl Iterator for Entries<'_> {
    type Item = Result<(Value, Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.chain.next()?;
        Some(node.and_then(|n| self.pair(n)))
    }
}

impl View for UnorderedMapView {
    fn name(&self) -> &'static str {
        Self::NAMES[0]
    }

    /// Reads the element count; the chain is not walked.
    fn size(&self, inspector: &dyn Inspector, value: &Value) -> Result<usize> {
        let table = inspector.field(value, "_M_h")?;
        let count = inspector.field(&table, "_M_element_count")?;
        to_size(inspector.to_int(&count)?, "element count")
    }

    fn find(&self, inspector: &dyn Inspector, value: &Value, key: &str) -> Result<Value> {
        let key_type = inspector.template_argument(value.ty(), 0)?;
        let probe = self.keys.probe(inspector, &key_type, key)?;
        for entry in self.entries(inspector, value)? {
            let (first, second) = entry?;
            if self.keys.matches(inspector, &probe, &first)? {
                return Ok(second);
            }
        }
        Err(ViewError::NotFound(key.to_string()))
    }

    fn render(&self, inspector: &dyn Inspector, value: &Value) -> Result<String> {
        let pairs = self
            .entries(inspector, value)?
            .map(|entry| {
                let (k, v) = entry?;
                Ok(format!(
                    "{}: {}",
                    self.elements.text(inspector, &k)?,
                    self.elements.text(inspector, &v)?
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("{{{}}}", pairs.join(", ")))
    }
}
