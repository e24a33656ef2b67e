//! Matching a textual key argument against typed map keys.
//!
//! The operator types keys as plain text, so the comparison is chosen by
//! the semantic kind of the map's key type (see [`KeyMatchConfig`]).

use tracing::debug;

use super::string::{ElementText, StringLayout};
use crate::config::KeyMatchConfig;
use crate::error::{Result, ViewError};
use crate::inspect::{Inspector, Type, Value};

/// A key argument prepared for comparison against one map's keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyProbe {
    /// Integer keys compare numerically.
    Integer(i128),
    /// Modeled strings compare by decoded content.
    Decoded { layout: StringLayout, text: Vec<u8> },
    /// Anything else compares the backend's rendering with this literal.
    Literal(String),
}

#[derive(Debug, Clone)]
pub struct KeyMatcher {
    config: KeyMatchConfig,
    elements: ElementText,
}

impl KeyMatcher {
    pub fn new(config: KeyMatchConfig, elements: ElementText) -> Self {
        Self { config, elements }
    }

    /// Classify `key_type` and convert `key` accordingly.
    pub fn probe(&self, inspector: &dyn Inspector, key_type: &Type, key: &str) -> Result<KeyProbe> {
        let stripped = inspector.strip_typedefs(key_type)?;
        let code = inspector.type_code(&stripped)?;
        let probe = if self.config.integer_codes.contains(&code) {
            KeyProbe::Integer(parse_int(key)?)
        } else {
            let layout = if self.config.decode_string_keys {
                self.elements.layout(inspector, &stripped)?
            } else {
                None
            };
            match layout {
                Some(layout) => KeyProbe::Decoded {
                    layout,
                    text: key.as_bytes().to_vec(),
                },
                None => {
                    let q = &self.config.literal_quote;
                    KeyProbe::Literal(format!("{}{}{}", q, key, q))
                }
            }
        };
        debug!(key_type = %stripped, ?code, ?probe, "Prepared key probe");
        Ok(probe)
    }

    pub fn matches(&self, inspector: &dyn Inspector, probe: &KeyProbe, candidate: &Value) -> Result<bool> {
        Ok(match probe {
            KeyProbe::Integer(n) => inspector.to_int(candidate)? == *n,
            KeyProbe::Decoded { layout, text } => layout.content(inspector, candidate)? == *text,
            KeyProbe::Literal(literal) => inspector.to_text(candidate)? == *literal,
        })
    }
}

/// Parse an integer key or index argument: decimal, `0x` hex, or a quoted
/// character such as `'a'`.
pub fn parse_int(text: &str) -> Result<i128> {
    let t = text.trim();
    let invalid = || ViewError::Argument(format!("not an integer: {}", text));
    if let Some(inner) = t.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        let mut chars = inner.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(i128::from(u32::from(c))),
            _ => Err(invalid()),
        };
    }
    let (negative, digits) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t),
    };
    let (radix, digits) = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    // The std parsers take their own sign; only the one leading '-' is ours.
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    // Parsed as unsigned so the i128::MIN magnitude is representable.
    let magnitude = u128::from_str_radix(digits, radix).map_err(|_| invalid())?;
    if negative {
        0i128.checked_sub_unsigned(magnitude).ok_or_else(invalid)
    } else {
        i128::try_from(magnitude).map_err(|_| invalid())
    }
}
