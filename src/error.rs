//! Error types.
//!
//! Lattice operators never fail: imprecision is expressed by returning
//! `⊤` or `⊥`. Errors are reserved for callers that hand the library
//! structurally invalid input.

use thiserror::Error;

use crate::ident::Identifier;

/// Integration error raised when seeding or selecting abstract states.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// An interval was seeded with `low > high`.
    #[error("invalid interval for `{var}`: [{low}, {high}] is empty")]
    InvalidInterval {
        /// Variable being seeded
        var: Identifier,
        /// Requested lower bound
        low: i64,
        /// Requested upper bound
        high: i64,
    },

    /// A strict bound `var < var` was seeded.
    #[error("`{var}` cannot be strictly less than itself")]
    SelfBound {
        /// Variable being seeded
        var: Identifier,
    },

    /// A domain was selected by a name that does not exist.
    #[error("unknown abstract domain `{name}`")]
    UnknownDomain {
        /// Requested name
        name: String,
    },
}

pub type Result<T, E = DomainError> = std::result::Result<T, E>;
