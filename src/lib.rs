//! # pentagon-rs: weakly relational numeric abstract domains
//!
//! **`pentagon-rs`** implements the Pentagon abstract domain for static
//! analysis: intervals combined with strict symbolic upper bounds between
//! variables. It over-approximates the reachable states of a program without
//! running it, and proves facts such as `0 <= i < len` that neither half can
//! prove alone.
//!
//! ## Domains
//!
//! - [`Sign`][crate::sign::Sign]: 7-element sign lattice.
//! - [`Interval`][crate::interval::Interval]: ranges with infinite bounds.
//! - [`Environment`][crate::environment::Environment]: pointwise lifting of any
//!   scalar lattice to program states.
//! - [`UpperBoundsEnv`][crate::upper_bounds::UpperBoundsEnv]: strict `x < y`
//!   facts, ordered by reverse inclusion.
//! - [`Pentagon`][crate::pentagon::Pentagon]: the reduced product of the two
//!   above, with a join that recovers bounds implied by intervals.
//!
//! Every domain implements [`AbstractDomain`] (the lattice operations) and,
//! for program states, [`NumericDomain`] (assignment, conditions,
//! projection, and satisfiability checks). All operations are pure: they
//! take `&self` and return a new value.
//!
//! ## Basic Usage
//!
//! ```rust
//! use pentagon_rs::{AbstractDomain, NumExpr, NumericDomain, Pentagon, Satisfiability};
//!
//! let len = NumExpr::var("len");
//! let i = NumExpr::var("i");
//!
//! // assume(0 < len); i := len - 1
//! let state = Pentagon::top()
//!     .assume(&NumExpr::constant(0).lt(len.clone()))
//!     .assign(&"i".into(), &len.clone().sub(NumExpr::constant(1)));
//!
//! assert_eq!(state.satisfies(&i.clone().lt(len)), Satisfiability::Satisfied);
//! assert_eq!(state.satisfies(&i.ge(NumExpr::constant(0))), Satisfiability::Satisfied);
//! ```
//!
//! ## Analyzing Programs
//!
//! [`NumericTransferFunction`] interprets structured [`Stmt`] programs over
//! any [`NumericDomain`], computing loop invariants with the
//! [`FixpointEngine`] (widening followed by narrowing).
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: fixpoint progress and state
//! transitions at `debug`, reduction and join details at `trace`.

pub mod domain;
pub mod environment;
pub mod error;
pub mod expr;
pub mod fixpoint;
pub mod ident;
pub mod interval;
pub mod numeric;
pub mod pentagon;
pub mod repr;
pub mod sign;
pub mod transfer;
pub mod upper_bounds;

// Re-exports for convenience
pub use domain::AbstractDomain;
pub use environment::Environment;
pub use error::DomainError;
pub use expr::{BinaryOp, CmpOp, NumExpr, NumPred, Stmt};
pub use fixpoint::{FixpointConfig, FixpointEngine};
pub use ident::Identifier;
pub use interval::{Bound, Interval};
pub use numeric::{NonRelationalValue, NumericDomain, Satisfiability};
pub use pentagon::Pentagon;
pub use repr::{Representable, Representation};
pub use sign::Sign;
pub use transfer::{NumericTransferFunction, TransferFunction};
pub use upper_bounds::{UpperBounds, UpperBoundsEnv};
