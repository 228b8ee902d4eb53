//! core::keys
//!
//! Expansion of configuration key templates.
//!
//! # Overview
//!
//! A template is an ordered list of [`KeyPart`]s. Literal parts are copied
//! as-is; `Choices` parts stand for "any of these identifiers". Composing a
//! template yields one key per combination of the choices, with the
//! leftmost `Choices` part varying slowest.
//!
//! # Example
//!
//! ```
//! use fraudcheck::core::keys::{compose, KeyPart};
//!
//! let keys = compose(&[
//!     KeyPart::from("mapping.master."),
//!     KeyPart::choices(["FOLDER", "CASE"]),
//!     KeyPart::from(".detail."),
//!     KeyPart::choices(["INVOICE", "RIB"]),
//!     KeyPart::from("."),
//! ]);
//!
//! assert_eq!(
//!     keys,
//!     vec![
//!         "mapping.master.FOLDER.detail.INVOICE.",
//!         "mapping.master.FOLDER.detail.RIB.",
//!         "mapping.master.CASE.detail.INVOICE.",
//!         "mapping.master.CASE.detail.RIB.",
//!     ]
//! );
//! ```

/// One part of a key template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPart {
    /// Copied verbatim into every composed key
    Literal(String),
    /// One composed key per element, in the given order
    Choices(Vec<String>),
    /// Contributes nothing
    Absent,
}

impl KeyPart {
    /// Build a multi-valued part, preserving the caller's order.
    pub fn choices<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeyPart::Choices(items.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for KeyPart {
    fn from(literal: &str) -> Self {
        KeyPart::Literal(literal.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(literal: String) -> Self {
        KeyPart::Literal(literal)
    }
}

impl From<&[String]> for KeyPart {
    fn from(items: &[String]) -> Self {
        KeyPart::Choices(items.to_vec())
    }
}

impl From<Option<&str>> for KeyPart {
    fn from(part: Option<&str>) -> Self {
        part.map_or(KeyPart::Absent, KeyPart::from)
    }
}

/// Expand a key template into concrete keys.
///
/// The number of keys is the product of the sizes of all `Choices` parts
/// (one when there are none, zero when any of them is empty). An empty
/// template yields no keys at all.
pub fn compose(parts: &[KeyPart]) -> Vec<String> {
    if parts.is_empty() {
        return Vec::new();
    }

    let mut keys = vec![String::new()];
    for part in parts {
        match part {
            KeyPart::Literal(literal) => {
                for key in &mut keys {
                    key.push_str(literal);
                }
            }
            KeyPart::Choices(items) => {
                keys = keys
                    .iter()
                    .flat_map(|prefix| items.iter().map(move |item| format!("{prefix}{item}")))
                    .collect();
            }
            KeyPart::Absent => {}
        }
    }
    keys
}

/// Concatenate independently composed key lists, keeping their order.
///
/// Callers pass the groups from highest to lowest precedence.
pub fn merge<T>(groups: impl IntoIterator<Item = Vec<T>>) -> Vec<T> {
    groups.into_iter().flatten().collect()
}
