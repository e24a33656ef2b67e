//! Type-name dispatch to views.
//!
//! The registry is built once from an explicit table of views and is
//! read-only afterwards. Lookups strip template arguments, so
//! `std::vector<int, std::allocator<int> >` resolves like `std::vector`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::debug;

use super::keys::parse_int;
use super::string::ElementText;
use super::{
    AnyView, DefaultView, LegacyStringView, StringView, UnorderedMapView, VectorView, View,
};
use crate::config::ViewerConfig;
use crate::error::{Result, ViewError};
use crate::inspect::{Inspector, Value};

static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(|| Registry::new(&ViewerConfig::default()));

/// Registry built with the default configuration.
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

/// `name` without its template argument list.
pub fn strip_template_args(name: &str) -> &str {
    match name.find('<') {
        Some(idx) => name[..idx].trim_end(),
        None => name.trim(),
    }
}

/// Operation selected by a command flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Render,
    Size,
    Index,
    Find,
}

impl Mode {
    pub fn flag(self) -> &'static str {
        match self {
            Mode::Render => "",
            Mode::Size => "/l",
            Mode::Index => "/i",
            Mode::Find => "/f",
        }
    }

    pub fn from_flag(flag: &str) -> Option<Mode> {
        match flag {
            "/l" => Some(Mode::Size),
            "/i" => Some(Mode::Index),
            "/f" => Some(Mode::Find),
            _ => None,
        }
    }

    /// Arguments the operation takes after the object name.
    pub fn extra_args(self) -> usize {
        match self {
            Mode::Render | Mode::Size => 0,
            Mode::Index | Mode::Find => 1,
        }
    }
}

/// Result of a dispatched operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Size(usize),
    Value(Value),
    Text(String),
}

/// Immutable map from canonical type name to view.
#[derive(Debug, Clone)]
pub struct Registry {
    views: Vec<AnyView>,
    by_name: HashMap<&'static str, usize>,
    fallback: AnyView,
    elements: ElementText,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(&ViewerConfig::default())
    }
}

impl Registry {
    pub fn new(config: &ViewerConfig) -> Self {
        let elements = ElementText::from_config(config);
        let table: [(AnyView, &'static [&'static str]); 4] = [
            (
                AnyView::LegacyString(LegacyStringView::new(config.legacy_header_words)),
                LegacyStringView::NAMES,
            ),
            (AnyView::String(StringView), StringView::NAMES),
            (
                AnyView::Vector(VectorView::new(elements)),
                VectorView::NAMES,
            ),
            (
                AnyView::UnorderedMap(UnorderedMapView::new(config, elements)),
                UnorderedMapView::NAMES,
            ),
        ];

        let mut views = Vec::with_capacity(table.len());
        let mut by_name = HashMap::new();
        for (view, names) in table {
            for name in names {
                by_name.insert(*name, views.len());
            }
            views.push(view);
        }
        debug!(views = views.len(), names = by_name.len(), "Built view registry");
        Self {
            views,
            by_name,
            fallback: AnyView::Default(DefaultView),
            elements,
        }
    }

    /// Every name a view is registered under, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.by_name.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// View registered under exactly `name`, template arguments stripped.
    pub fn get(&self, type_name: &str) -> Option<&AnyView> {
        self.by_name
            .get(strip_template_args(type_name))
            .map(|&i| &self.views[i])
    }

    /// View for `type_name`, or the default view.
    pub fn resolve(&self, type_name: &str) -> &AnyView {
        let view = self.get(type_name).unwrap_or(&self.fallback);
        debug!(
            type_name,
            stripped = strip_template_args(type_name),
            view = view.name(),
            "Resolved view"
        );
        view
    }

    /// View for a value: its declared type first, then the type with
    /// typedefs stripped.
    pub fn resolve_value(&self, inspector: &dyn Inspector, value: &Value) -> Result<&AnyView> {
        if let Some(view) = self.get(value.ty().name()) {
            return Ok(view);
        }
        let stripped = inspector.strip_typedefs(value.ty())?;
        Ok(self.resolve(stripped.name()))
    }

    /// Run `mode` on `value` with the operator's extra arguments.
    pub fn dispatch(
        &self,
        inspector: &dyn Inspector,
        view: &AnyView,
        mode: Mode,
        value: &Value,
        args: &[String],
    ) -> Result<Output> {
        if args.len() != mode.extra_args() {
            return Err(ViewError::Argument(format!(
                "{} takes {} argument(s), got {}",
                view.name(),
                mode.extra_args(),
                args.len()
            )));
        }
        match mode {
            Mode::Render => view.render(inspector, value).map(Output::Text),
            Mode::Size => view.size(inspector, value).map(Output::Size),
            Mode::Index => {
                let index = parse_int(&args[0])?;
                let index = i64::try_from(index).map_err(|_| {
                    ViewError::Argument(format!("index out of range: {}", args[0]))
                })?;
                view.at(inspector, value, index).map(Output::Value)
            }
            Mode::Find => view.find(inspector, value, &args[0]).map(Output::Value),
        }
    }

    /// One-line text for an operation's result.
    pub fn format(&self, inspector: &dyn Inspector, output: &Output) -> Result<String> {
        match output {
            Output::Size(n) => Ok(n.to_string()),
            Output::Text(s) => Ok(s.clone()),
            Output::Value(v) => self.elements.text(inspector, v),
        }
    }
}
