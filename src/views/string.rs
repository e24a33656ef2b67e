//! Views over `std::string`.
//!
//! Both modeled layouts keep the character data behind
//! `_M_dataplus._M_p`. They differ in where the length lives:
//!
//! - the copy-on-write layout stores it in a header placed immediately before
//!   the data (length, capacity, refcount); recovering it depends on that
//!   allocator bookkeeping order and is best-effort
//! - the C++11 layout stores it in `_M_string_length`

use super::iter::ContiguousIter;
use super::registry::strip_template_args;
use super::{check_index, to_size, View};
use crate::config::ViewerConfig;
use crate::error::Result;
use crate::inspect::{Inspector, Type, Value};

/// Where a string object keeps its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringLayout {
    /// Length in a header `header_words` words before the data.
    Legacy { header_words: u64 },
    /// Length in an explicit member.
    Revised,
}

impl StringLayout {
    /// Layout for a string class name, template arguments allowed.
    pub fn for_class(name: &str, header_words: u64) -> Option<Self> {
        let name = strip_template_args(name);
        if LegacyStringView::NAMES.contains(&name) {
            Some(StringLayout::Legacy { header_words })
        } else if StringView::NAMES.contains(&name) {
            Some(StringLayout::Revised)
        } else {
            None
        }
    }

    fn data(&self, inspector: &dyn Inspector, value: &Value) -> Result<Value> {
        let hider = inspector.field(value, "_M_dataplus")?;
        inspector.field(&hider, "_M_p")
    }

    pub fn size(&self, inspector: &dyn Inspector, value: &Value) -> Result<usize> {
        let raw = match *self {
            StringLayout::Legacy { header_words } => {
                let data = self.data(inspector, value)?;
                let word = inspector.lookup_type("size_t")?.pointer();
                let header = inspector.add(&inspector.cast(&data, &word)?, -(header_words as i64))?;
                inspector.to_int(&inspector.dereference(&header)?)?
            }
            StringLayout::Revised => {
                inspector.to_int(&inspector.field(value, "_M_string_length")?)?
            }
        };
        to_size(raw, "string length")
    }

    pub fn at(&self, inspector: &dyn Inspector, value: &Value, index: i64) -> Result<Value> {
        let i = check_index(index, self.size(inspector, value)?)?;
        let data = self.data(inspector, value)?;
        inspector.dereference(&inspector.add(&data, i as i64)?)
    }

    /// The string's bytes, `size` of them starting at the data pointer.
    pub fn content(&self, inspector: &dyn Inspector, value: &Value) -> Result<Vec<u8>> {
        let size = self.size(inspector, value)?;
        let data = self.data(inspector, value)?;
        let end = inspector.add(&data, size as i64)?;
        ContiguousIter::new(inspector, data, &end)?
            .map(|c| Ok(inspector.to_int(&c?)? as u8))
            .collect()
    }

    pub fn render(&self, inspector: &dyn Inspector, value: &Value) -> Result<String> {
        let data = self.data(inspector, value)?;
        let void_ptr = inspector.lookup_type("void")?.pointer();
        let address = inspector.to_text(&inspector.cast(&data, &void_ptr)?)?;
        let content = self.content(inspector, value)?;
        Ok(format!(
            "<address: {}, content: {{{}}}>",
            address,
            content.escape_ascii()
        ))
    }
}

/// Renders container elements: modeled strings as a quoted literal,
/// anything else as the backend renders it.
///
/// Built once by the registry and shared by every view that prints elements
/// or compares string keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementText {
    header_words: u64,
}

impl Default for ElementText {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

impl ElementText {
    pub fn new(header_words: u64) -> Self {
        Self { header_words }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(config.legacy_header_words)
    }

    /// String layout of `ty`, looking through typedefs when the declared
    /// name is not a modeled string class.
    pub fn layout(&self, inspector: &dyn Inspector, ty: &Type) -> Result<Option<StringLayout>> {
        if let Some(layout) = StringLayout::for_class(ty.name(), self.header_words) {
            return Ok(Some(layout));
        }
        let stripped = inspector.strip_typedefs(ty)?;
        Ok(StringLayout::for_class(stripped.name(), self.header_words))
    }

    pub fn text(&self, inspector: &dyn Inspector, value: &Value) -> Result<String> {
        match self.layout(inspector, value.ty())? {
            Some(layout) => Ok(format!(
                "\"{}\"",
                layout.content(inspector, value)?.escape_ascii()
            )),
            None => inspector.to_text(value),
        }
    }
}

/// Copy-on-write `std::string` (pre-C++11 ABI).
#[derive(Debug, Clone, Copy)]
pub struct LegacyStringView {
    layout: StringLayout,
}

impl LegacyStringView {
    pub const NAMES: &'static [&'static str] = &["std::string", "std::basic_string"];

    pub fn new(header_words: u64) -> Self {
        Self {
            layout: StringLayout::Legacy { header_words },
        }
    }
}

impl View for LegacyStringView {
    fn name(&self) -> &'static str {
        Self::NAMES[0]
    }

    fn size(&self, inspector: &dyn Inspector, value: &Value) -> Result<usize> {
        self.layout.size(inspector, value)
    }

    fn at(&self, inspector: &dyn Inspector, value: &Value, index: i64) -> Result<Value> {
        self.layout.at(inspector, value, index)
    }

    fn render(&self, inspector: &dyn Inspector, value: &Value) -> Result<String> {
        self.layout.render(inspector, value)
    }
}

/// `std::__cxx11::string`, with an explicit length member.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringView;

impl StringView {
    pub const NAMES: &'static [&'static str] =
        &["std::__cxx11::string", "std::__cxx11::basic_string"];
}

impl View for StringView {
    fn name(&self) -> &'static str {
        Self::NAMES[0]
    }

    fn size(&self, inspector: &dyn Inspector, value: &Value) -> Result<usize> {
        StringLayout::Revised.size(inspector, value)
    }

    fn at(&self, inspector: &dyn Inspector, value: &Value, index: i64) -> Result<Value> {
        StringLayout::Revised.at(inspector, value, index)
    }

    fn render(&self, inspector: &dyn Inspector, value: &Value) -> Result<String> {
        StringLayout::Revised.render(inspector, value)
    }
}
