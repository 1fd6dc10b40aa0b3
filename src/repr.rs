//! Structured, human-readable representation of abstract values.

use std::collections::BTreeMap;
use std::fmt;

/// Structured view of an abstract value, used for reporting and `Display`.
///
/// Whole-state top and bottom print as the literal tokens `⊤` and `⊥`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Representation {
    Top,
    Bottom,
    /// Leaf value, already rendered.
    Value(String),
    /// Named components, printed in key order.
    Mapping(BTreeMap<String, Representation>),
}

impl Representation {
    pub fn value(text: impl fmt::Display) -> Self {
        Representation::Value(text.to_string())
    }

    pub fn mapping<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Representation)>,
    {
        Representation::Mapping(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Look up a component of a mapping.
    pub fn get(&self, key: &str) -> Option<&Representation> {
        match self {
            Representation::Mapping(entries) => entries.get(key),
            _ => None,
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Representation::Top => write!(f, "⊤"),
            Representation::Bottom => write!(f, "⊥"),
            Representation::Value(text) => write!(f, "{}", text),
            Representation::Mapping(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Values that can describe themselves as a [`Representation`].
pub trait Representable {
    fn representation(&self) -> Representation;
}
