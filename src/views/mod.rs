//! Structure-aware views over standard library containers.
//!
//! A view decodes one container family's in-memory layout and exposes up to
//! four capabilities: size, indexed access, key lookup and rendering. The
//! set of views is closed; [`AnyView`] dispatches over it and the
//! [`registry::Registry`] picks one from a type name.

pub mod iter;
pub mod keys;
pub mod registry;
pub mod string;
pub mod unordered_map;
pub mod vector;

use crate::error::{Result, ViewError};
use crate::inspect::{Inspector, Value};

pub use registry::{Mode, Output, Registry};
pub use string::{ElementText, LegacyStringView, StringLayout, StringView};
pub use unordered_map::UnorderedMapView;
pub use vector::VectorView;

/// Capability contract shared by every view.
///
/// Unsupported operations fail with [`ViewError::Unimplemented`] carrying
/// the command flag of the operation. Views only read through the value.
pub trait View {
    /// Canonical type name the view is registered under.
    fn name(&self) -> &'static str;

    fn size(&self, _inspector: &dyn Inspector, _value: &Value) -> Result<usize> {
        Err(ViewError::Unimplemented(Mode::Size.flag()))
    }

    /// Element at `index`; valid indices are `[0, size)`.
    fn at(&self, _inspector: &dyn Inspector, _value: &Value, _index: i64) -> Result<Value> {
        Err(ViewError::Unimplemented(Mode::Index.flag()))
    }

    /// Value mapped to `key`, given as the operator typed it.
    fn find(&self, _inspector: &dyn Inspector, _value: &Value, _key: &str) -> Result<Value> {
        Err(ViewError::Unimplemented(Mode::Find.flag()))
    }

    fn render(&self, inspector: &dyn Inspector, value: &Value) -> Result<String> {
        inspector.to_text(value)
    }
}

/// Fallback for types no view models: renders through the backend and
/// supports nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultView;

impl View for DefaultView {
    fn name(&self) -> &'static str {
        "default"
    }
}

/// The closed set of views.
#[derive(Debug, Clone)]
pub enum AnyView {
    LegacyString(LegacyStringView),
    String(StringView),
    Vector(VectorView),
    UnorderedMap(UnorderedMapView),
    Default(DefaultView),
}

macro_rules! dispatch {
    ($self:ident, $v:ident => $call:expr) => {
        match $self {
            AnyView::LegacyString($v) => $call,
            AnyView::String($v) => $call,
            AnyView::Vector($v) => $call,
            AnyView::UnorderedMap($v) => $call,
            AnyView::Default($v) => $call,
        }
    };
}

impl View for AnyView {
    fn name(&self) -> &'static str {
        dispatch!(self, v => v.name())
    }

    fn size(&self, inspector: &dyn Inspector, value: &Value) -> Result<usize> {
        dispatch!(self, v => v.size(inspector, value))
    }

    fn at(&self, inspector: &dyn Inspector, value: &Value, index: i64) -> Result<Value> {
        dispatch!(self, v => v.at(inspector, value, index))
    }

    fn find(&self, inspector: &dyn Inspector, value: &Value, key: &str) -> Result<Value> {
        dispatch!(self, v => v.find(inspector, value, key))
    }

    fn render(&self, inspector: &dyn Inspector, value: &Value) -> Result<String> {
        dispatch!(self, v => v.render(inspector, value))
    }
}

/// Reject indices outside `[0, size)`.
pub(crate) fn check_index(index: i64, size: usize) -> Result<u64> {
    match u64::try_from(index) {
        Ok(i) if i < size as u64 => Ok(i),
        _ => Err(ViewError::OutOfBounds { index, size }),
    }
}

/// Convert a length read from the target into a size.
pub(crate) fn to_size(raw: i128, what: &str) -> Result<usize> {
    usize::try_from(raw).map_err(|_| ViewError::Layout(format!("{} is {}", what, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::snapshot::SnapshotBuilder;

    #[test]
    fn default_view_only_renders() {
        let mut b = SnapshotBuilder::default();
        let addr = b.alloc(&b.encode(42, 4), 4);
        b.symbol("n", "int", addr);
        let snap = b.build();
        let n = snap.lookup_symbol("n").unwrap();
        let view = AnyView::Default(DefaultView);
        assert_eq!(view.render(&snap, &n).unwrap(), "42");
        assert!(matches!(
            view.size(&snap, &n),
            Err(ViewError::Unimplemented("/l"))
        ));
        assert!(matches!(
            view.at(&snap, &n, 0),
            Err(ViewError::Unimplemented("/i"))
        ));
        assert!(matches!(
            view.find(&snap, &n, "k"),
            Err(ViewError::Unimplemented("/f"))
        ));
    }

    #[test]
    fn index_bounds() {
        assert_eq!(check_index(0, 1).unwrap(), 0);
        assert!(matches!(
            check_index(1, 1),
            Err(ViewError::OutOfBounds { index: 1, size: 1 })
        ));
        assert!(matches!(
            check_index(-1, 4),
            Err(ViewError::OutOfBounds { index: -1, .. })
        ));
        assert!(to_size(-2, "length").is_err());
        assert_eq!(to_size(7, "length").unwrap(), 7);
    }
}
