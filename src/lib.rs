//! Structure-aware views over C++ standard library containers living in the
//! memory of an inspected process.
//!
//! Given a symbol and an inspection backend, a [`views::View`] chosen by the
//! symbol's type name decodes the container's implementation-defined layout
//! and answers size, indexed access, key lookup and rendering queries.

/// The `v` command front end
pub mod command;
/// Engine configuration
pub mod config;
pub mod error;
/// Backend contract and the offline snapshot backend
pub mod inspect;
pub mod logging;
/// Layout interpreters and the type-name registry
pub mod views;

pub use command::Viewer;
pub use config::ViewerConfig;
pub use error::{ErrorKind, Result, ViewError};
pub use inspect::{Inspector, Type, Value};
pub use views::{AnyView, Mode, Registry, View};
