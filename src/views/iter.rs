//! Forward-only traversal of target memory.
//!
//! Both iterators are lazy and single-use. Each step is one or more blocking
//! reads through the [`Inspector`]; a failed read is yielded once and ends
//! the traversal.

use tracing::{trace, warn};

use crate::error::{Result, ViewError};
use crate::inspect::{Inspector, Type, Value};

/// Elements of a `[first, finish)` pointer range.
pub struct ContiguousIter<'a> {
    inspector: &'a dyn Inspector,
    current: Value,
    finish: u64,
    done: bool,
}

impl<'a> ContiguousIter<'a> {
    /// Fails when `finish` lies before `first`.
    pub fn new(inspector: &'a dyn Inspector, first: Value, finish: &Value) -> Result<Self> {
        let start = inspector.pointer_value(&first)?;
        let finish = inspector.pointer_value(finish)?;
        if finish < start {
            warn!(start, finish, "Range ends before it starts");
            return Err(ViewError::Layout(format!(
                "range end {:#x} precedes start {:#x}",
                finish, start
            )));
        }
        Ok(Self {
            inspector,
            current: first,
            finish,
            done: false,
        })
    }

    fn step(&mut self) -> Result<Option<Value>> {
        let at = self.inspector.pointer_value(&self.current)?;
        // Ordered comparison, so a finish between elements still ends the range.
        if at >= self.finish {
            return Ok(None);
        }
        trace!(address = at, "Contiguous step");
        let item = self.inspector.dereference(&self.current)?;
        self.current = self.inspector.add(&self.current, 1)?;
        Ok(Some(item))
    }
}

impl Iterator for ContiguousIter<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let step = self.step();
        if !matches!(step, Ok(Some(_))) {
            self.done = true;
        }
        step.transpose()
    }
}

/// Nodes of a singly-linked chain, terminated by a null link.
///
/// Each link is cast to `node_pointer` before being followed, and the node's
/// `next_field` supplies the following link.
pub struct ChainIter<'a> {
    inspector: &'a dyn Inspector,
    link: Value,
    node_pointer: Type,
    next_field: &'static str,
    remaining: usize,
    done: bool,
}

impl<'a> ChainIter<'a> {
    pub fn new(
        inspector: &'a dyn Inspector,
        head: Value,
        node_pointer: Type,
        next_field: &'static str,
        max_nodes: usize,
    ) -> Self {
        Self {
            inspector,
            link: head,
            node_pointer,
            next_field,
            remaining: max_nodes,
            done: false,
        }
    }

    fn step(&mut self) -> Result<Option<Value>> {
        let at = self.inspector.pointer_value(&self.link)?;
        if at == 0 {
            return Ok(None);
        }
        if self.remaining == 0 {
            warn!(address = at, "Node chain exceeds configured limit");
            return Err(ViewError::Layout(format!(
                "node chain did not terminate (still running at {:#x})",
                at
            )));
        }
        self.remaining -= 1;
        trace!(address = at, "Chain step");
        let node_ptr = self.inspector.cast(&self.link, &self.node_pointer)?;
        let node = self.inspector.dereference(&node_ptr)?;
        self.link = self.inspector.field(&node, self.next_field)?;
        Ok(Some(node))
    }
}

impl Iterator for ChainIter<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let step = self.step();
        if !matches!(step, Ok(Some(_))) {
            self.done = true;
        }
        step.transpose()
    }
}
