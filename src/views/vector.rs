//! View over `std::vector`: a `[_M_start, _M_finish)` element range.

use super::iter::ContiguousIter;
use super::string::ElementText;
use super::{check_index, View};
use crate::error::{Result, ViewError};
use crate::inspect::{Inspector, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VectorView {
    elements: ElementText,
}

impl VectorView {
    pub const NAMES: &'static [&'static str] = &["std::vector"];

    pub fn new(elements: ElementText) -> Self {
        Self { elements }
    }

    fn range(&self, inspector: &dyn Inspector, value: &Value) -> Result<(Value, Value)> {
        let imp = inspector.field(value, "_M_impl")?;
        Ok((
            inspector.field(&imp, "_M_start")?,
            inspector.field(&imp, "_M_finish")?,
        ))
    }
}

impl View for VectorView {
    fn name(&self) -> &'static str {
        Self::NAMES[0]
    }

    fn size(&self, inspector: &dyn Inspector, value: &Value) -> Result<usize> {
        let (start, finish) = self.range(inspector, value)?;
        let n = inspector.pointer_diff(&finish, &start)?;
        usize::try_from(n).map_err(|_| ViewError::Layout(format!("vector finish precedes start by {}", -n)))
    }

    fn at(&self, inspector: &dyn Inspector, value: &Value, index: i64) -> Result<Value> {
        let i = check_index(index, self.size(inspector, value)?)?;
        let (start, _) = self.range(inspector, value)?;
        inspector.dereference(&inspector.add(&start, i as i64)?)
    }

    fn render(&self, inspector: &dyn Inspector, value: &Value) -> Result<String> {
        let (start, finish) = self.range(inspector, value)?;
        let void_ptr = inspector.lookup_type("void")?.pointer();
        let address = inspector.to_text(&inspector.cast(&start, &void_ptr)?)?;
        let items = ContiguousIter::new(inspector, start, &finish)?
            .map(|item| self.elements.text(inspector, &item?))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!(
            "<address: {}, content: {{{}}}>",
            address,
            items.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::snapshot::SnapshotBuilder;
    use crate::inspect::stdcxx;

    #[test]
    fn int_vector_size_index_render() {
        let mut b = SnapshotBuilder::default();
        let v = stdcxx::int_vector(&mut b, &[10, -20, 30]).unwrap();
        b.symbol("v", &stdcxx::vector_type("int"), v);
        let snap = b.build();
        let v = snap.lookup_symbol("v").unwrap();
        let view = VectorView::default();

        assert_eq!(view.size(&snap, &v).unwrap(), 3);
        let second = view.at(&snap, &v, 1).unwrap();
        assert_eq!(snap.to_int(&second).unwrap(), -20);
        assert!(matches!(
            view.at(&snap, &v, 3),
            Err(ViewError::OutOfBounds { index: 3, size: 3 })
        ));

        let text = view.render(&snap, &v).unwrap();
        assert!(text.starts_with("<address: 0x"), "{}", text);
        assert!(text.ends_with(", content: {10, -20, 30}>"), "{}", text);
    }

    #[test]
    fn empty_vector_renders_null_range() {
        let mut b = SnapshotBuilder::default();
        let v = stdcxx::int_vector(&mut b, &[]).unwrap();
        b.symbol("v", &stdcxx::vector_type("int"), v);
        let snap = b.build();
        let v = snap.lookup_symbol("v").unwrap();
        let view = VectorView::default();
        assert_eq!(view.size(&snap, &v).unwrap(), 0);
        assert_eq!(view.render(&snap, &v).unwrap(), "<address: 0x0, content: {}>");
        assert!(view.at(&snap, &v, 0).is_err());
        assert!(matches!(
            view.find(&snap, &v, "0"),
            Err(ViewError::Unimplemented("/f"))
        ));
    }

    #[test]
    fn spare_capacity_is_not_counted() {
        let mut b = SnapshotBuilder::default();
        let data: Vec<u8> = [1u64, 2].iter().flat_map(|v| v.to_le_bytes()).collect();
        let v = stdcxx::vector(&mut b, "long", &data, 6).unwrap();
        b.symbol("v", &stdcxx::vector_type("long"), v);
        let snap = b.build();
        let v = snap.lookup_symbol("v").unwrap();
        assert_eq!(VectorView::default().size(&snap, &v).unwrap(), 2);
    }

    #[test]
    fn inverted_range_is_a_layout_error() {
        let mut b = SnapshotBuilder::default();
        stdcxx::define_vector(&mut b, "int");
        let mut obj = b.word(0x2000);
        obj.extend(b.word(0x1000));
        obj.extend(b.word(0x2000));
        let v = b.alloc(&obj, 8);
        b.symbol("v", &stdcxx::vector_type("int"), v);
        let snap = b.build();
        let v = snap.lookup_symbol("v").unwrap();
        assert!(matches!(
            VectorView::default().size(&snap, &v),
            Err(ViewError::Layout(_))
        ));
    }

    #[test]
    fn string_elements_render_quoted() {
        let mut b = SnapshotBuilder::default();
        let mut data = stdcxx::string_object(&mut b, b"ab");
        data.extend(stdcxx::string_object(&mut b, b"c"));
        let v = stdcxx::vector(&mut b, stdcxx::CXX11_STRING, &data, 0).unwrap();
        b.symbol("v", &stdcxx::vector_type(stdcxx::CXX11_STRING), v);
        let snap = b.build();
        let v = snap.lookup_symbol("v").unwrap();
        assert!(VectorView::default()
            .render(&snap, &v)
            .unwrap()
            .ends_with("content: {\"ab\", \"c\"}>"));
    }
}
