//! The `v` command: argument parsing and error reporting.
//!
//! ```text
//! v OBJECT            render OBJECT
//! v /l OBJECT         size of OBJECT
//! v /i OBJECT INDEX   element at INDEX
//! v /f OBJECT KEY     value mapped to KEY
//! ```
//!
//! [`Viewer::invoke`] is the only place errors are caught; every outcome is
//! reported as exactly one line.

use tracing::{debug, info_span};

use crate::config::ViewerConfig;
use crate::error::{Result, ViewError};
use crate::inspect::Inspector;
use crate::views::{Mode, Registry};

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub mode: Mode,
    pub symbol: String,
    pub args: Vec<String>,
}

/// Split a command line into arguments, honouring single and double quotes
/// and backslash escapes.
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut argv = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') | (None, '\\') => {
                let escaped = chars
                    .next()
                    .ok_or_else(|| ViewError::Argument(format!("trailing backslash: {}", line)))?;
                current.push(escaped);
                in_token = true;
            }
            (Some(_), c) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                in_token = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    argv.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if quote.is_some() {
        return Err(ViewError::Argument(format!("unterminated quote: {}", line)));
    }
    if in_token {
        argv.push(current);
    }
    Ok(argv)
}

/// Parse the arguments of one `v` command.
///
/// A single argument is an object to render. Otherwise the first argument
/// must be a mode flag followed by exactly the arguments that mode takes.
pub fn parse(line: &str) -> Result<Request> {
    let mut argv = tokenize(line)?;
    match argv.len() {
        0 => Err(ViewError::Argument(line.to_string())),
        1 => Ok(Request {
            mode: Mode::Render,
            symbol: argv.remove(0),
            args: Vec::new(),
        }),
        n => {
            let mode = Mode::from_flag(&argv[0])
                .filter(|m| n == 2 + m.extra_args())
                .ok_or_else(|| ViewError::Argument(line.to_string()))?;
            let args = argv.split_off(2);
            Ok(Request {
                mode,
                symbol: argv.remove(1),
                args,
            })
        }
    }
}

/// Command front end over a registry.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    registry: Registry,
}

impl Viewer {
    pub const USAGE: &'static str = "\
Usage: v [OPTION] OBJECT [ARG]
Options:
        /l    get the length or size of object.
        /i    return the item at index of string/vector.
        /f    find the corresponding value by KEY.";

    pub fn new(config: &ViewerConfig) -> Self {
        Self::with_registry(Registry::new(config))
    }

    pub fn with_registry(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run one command, propagating any failure.
    pub fn view(&self, inspector: &dyn Inspector, line: &str) -> Result<String> {
        let request = parse(line)?;
        let span = info_span!("view", symbol = %request.symbol, mode = ?request.mode);
        let _guard = span.enter();

        let value = inspector.lookup_symbol(&request.symbol)?;
        let view = self.registry.resolve_value(inspector, &value)?;
        let output = self
            .registry
            .dispatch(inspector, view, request.mode, &value, &request.args)?;
        self.registry.format(inspector, &output)
    }

    /// Run one command and return the line to print, success or not.
    pub fn invoke(&self, inspector: &dyn Inspector, line: &str) -> String {
        match self.view(inspector, line) {
            Ok(text) => text,
            Err(e) => {
                debug!(kind = ?e.kind(), error = %e, "Command failed");
                format!("{}: {}", e.kind(), e)
            }
        }
    }
}
