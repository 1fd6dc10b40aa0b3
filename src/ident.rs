//! Program variable identifiers.

use std::borrow::Borrow;
use std::fmt;

/// Opaque handle naming a program variable.
///
/// Equality, hashing and ordering are by name. Identifiers are used as keys
/// of ordered maps, so every environment iterates (and prints) its variables
/// in a deterministic order.
///
/// `Identifier` borrows as `str`, so lookups can use plain string slices:
///
/// ```rust
/// use std::collections::BTreeMap;
/// use pentagon_rs::ident::Identifier;
///
/// let mut map = BTreeMap::new();
/// map.insert(Identifier::new("x"), 42);
/// assert_eq!(map.get("x"), Some(&42));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&Identifier> for Identifier {
    fn from(id: &Identifier) -> Self {
        id.clone()
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
