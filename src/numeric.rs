//! Numeric abstract domain traits and utilities.

use std::fmt;

use crate::domain::AbstractDomain;
use crate::expr::{BinaryOp, CmpOp, NumExpr, NumPred};
use crate::ident::Identifier;

/// Three-valued answer to "does this state satisfy a predicate?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Satisfiability {
    /// Every concrete state satisfies the predicate.
    Satisfied,
    /// No concrete state satisfies the predicate.
    Unsatisfied,
    /// Some states may satisfy it, some may not.
    Unknown,
}

impl Satisfiability {
    pub fn from_bool(value: bool) -> Self {
        if value {
            Satisfiability::Satisfied
        } else {
            Satisfiability::Unsatisfied
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Satisfiability::Satisfied => Satisfiability::Unsatisfied,
            Satisfiability::Unsatisfied => Satisfiability::Satisfied,
            Satisfiability::Unknown => Satisfiability::Unknown,
        }
    }

    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Satisfiability::Unsatisfied, _) | (_, Satisfiability::Unsatisfied) => Satisfiability::Unsatisfied,
            (Satisfiability::Satisfied, Satisfiability::Satisfied) => Satisfiability::Satisfied,
            _ => Satisfiability::Unknown,
        }
    }

    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Satisfiability::Satisfied, _) | (_, Satisfiability::Satisfied) => Satisfiability::Satisfied,
            (Satisfiability::Unsatisfied, Satisfiability::Unsatisfied) => Satisfiability::Unsatisfied,
            _ => Satisfiability::Unknown,
        }
    }

    /// Prefer a definite answer: `Unknown` defers to `fallback`.
    pub fn or_else(self, fallback: impl FnOnce() -> Self) -> Self {
        match self {
            Satisfiability::Unknown => fallback(),
            definite => definite,
        }
    }

    pub fn is_definite(self) -> bool {
        self != Satisfiability::Unknown
    }
}

impl fmt::Display for Satisfiability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Satisfiability::Satisfied => write!(f, "satisfied"),
            Satisfiability::Unsatisfied => write!(f, "unsatisfied"),
            Satisfiability::Unknown => write!(f, "unknown"),
        }
    }
}

/// Numeric abstract domain over program variables.
///
/// This trait extends `AbstractDomain` with the transfer functions a
/// fixpoint engine needs when walking a program: every method returns a
/// new element and leaves `self` untouched.
pub trait NumericDomain: AbstractDomain {
    /// Apply assignment: var := expr.
    ///
    /// Returns a new abstract element where `var` is bound to the result of `expr`.
    fn assign(&self, var: &Identifier, expr: &NumExpr) -> Self;

    /// Assume a predicate holds: self ∧ pred.
    ///
    /// Refines the abstract element by adding constraint `pred`.
    fn assume(&self, pred: &NumPred) -> Self;

    /// Project out a variable (existential quantification): ∃var. self.
    ///
    /// Removes all constraints on `var`, including those held by other variables.
    fn forget(&self, var: &Identifier) -> Self {
        self.forget_if(|v| v == var)
    }

    /// Project out every variable matching `pred`.
    fn forget_if<F>(&self, pred: F) -> Self
    where
        F: Fn(&Identifier) -> bool;

    /// Check whether every state described by `self` satisfies `pred`.
    fn satisfies(&self, pred: &NumPred) -> Satisfiability;
}

/// Scalar lattice that abstracts a single numeric value.
///
/// Implementors plug into [`Environment`](crate::environment::Environment),
/// which lifts them pointwise to whole program states.
pub trait NonRelationalValue: AbstractDomain {
    /// Abstraction of a single constant.
    fn from_constant(value: i64) -> Self;

    /// Abstract negation.
    fn eval_neg(&self) -> Self;

    /// Abstract binary arithmetic.
    fn eval_binary(op: BinaryOp, left: &Self, right: &Self) -> Self;

    /// Refine both operands under the assumption `left op right`.
    ///
    /// The default keeps the operands unchanged, which is always sound.
    fn assume_comparison(op: CmpOp, left: &Self, right: &Self) -> (Self, Self) {
        let _ = op;
        (left.clone(), right.clone())
    }

    /// Decide `left op right` for all concrete values of the operands.
    fn satisfies_comparison(op: CmpOp, left: &Self, right: &Self) -> Satisfiability {
        let _ = (op, left, right);
        Satisfiability::Unknown
    }
}
