//! Pointwise lifting of a scalar lattice to whole program states.
//!
//! An [`Environment`] maps each variable to a value of some
//! [`NonRelationalValue`] (signs, intervals, ...). Variables that are absent
//! from the map are unconstrained (`⊤`), and a bottom environment carries an
//! explicit flag with an empty map. Because top entries are never stored,
//! derived equality coincides with lattice equality.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use log::trace;

use crate::domain::AbstractDomain;
use crate::expr::{BinaryOp, CmpOp, NumExpr, NumPred};
use crate::ident::Identifier;
use crate::numeric::{NonRelationalValue, NumericDomain, Satisfiability};
use crate::repr::{Representable, Representation};

/// Map from variables to abstract values of `V`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment<V> {
    values: BTreeMap<Identifier, V>,
    is_bottom: bool,
}

impl<V: AbstractDomain> Default for Environment<V> {
    fn default() -> Self {
        Self::top()
    }
}

impl<V: AbstractDomain> Environment<V> {
    /// Value bound to `var`: `⊤` when absent, `⊥` everywhere in a bottom environment.
    pub fn get<Q>(&self, var: &Q) -> V
    where
        Identifier: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if self.is_bottom {
            return V::bottom();
        }
        self.values.get(var).cloned().unwrap_or_else(V::top)
    }

    /// Bind `var` to `value`.
    ///
    /// Binding a bottom value collapses the whole environment to bottom;
    /// binding top removes the entry.
    pub fn set(&mut self, var: impl Into<Identifier>, value: V) {
        if self.is_bottom {
            return;
        }
        if value.is_bottom() {
            *self = Self::bottom();
        } else if value.is_top() {
            self.values.remove(&var.into());
        } else {
            self.values.insert(var.into(), value);
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, var: impl Into<Identifier>, value: V) -> Self {
        self.set(var, value);
        self
    }

    /// Constrained variables with their values, in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &V)> {
        self.values.iter()
    }

    /// Constrained variables, in identifier order.
    pub fn variables(&self) -> impl Iterator<Item = &Identifier> {
        self.values.keys()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Combine two environments over the union of their variables.
    ///
    /// Returns bottom as soon as one combined value is bottom.
    fn combine_union(&self, other: &Self, op: impl Fn(&V, &V) -> V) -> Self {
        let mut result = self.clone();
        for var in self.values.keys().chain(other.values.keys()) {
            let value = op(&self.get(var), &other.get(var));
            result.set(var, value);
            if result.is_bottom {
                break;
            }
        }
        result
    }

    /// Combine two environments over the variables constrained in both.
    fn combine_intersection(&self, other: &Self, op: impl Fn(&V, &V) -> V) -> Self {
        let mut result = Self::top();
        for (var, value) in &self.values {
            if let Some(other_value) = other.values.get(var) {
                result.set(var, op(value, other_value));
            }
        }
        result
    }
}

impl<V: AbstractDomain> AbstractDomain for Environment<V> {
    fn bottom() -> Self {
        Self {
            values: BTreeMap::new(),
            is_bottom: true,
        }
    }

    fn top() -> Self {
        Self {
            values: BTreeMap::new(),
            is_bottom: false,
        }
    }

    fn is_bottom(&self) -> bool {
        self.is_bottom
    }

    fn is_top(&self) -> bool {
        !self.is_bottom && self.values.is_empty()
    }

    fn le(&self, other: &Self) -> bool {
        if self.is_bottom {
            return true;
        }
        if other.is_bottom {
            return false;
        }
        other.values.iter().all(|(var, value)| self.get(var).le(value))
    }

    fn join(&self, other: &Self) -> Self {
        if self.is_bottom {
            return other.clone();
        }
        if other.is_bottom {
            return self.clone();
        }
        self.combine_intersection(other, V::join)
    }

    fn meet(&self, other: &Self) -> Self {
        if self.is_bottom || other.is_bottom {
            return Self::bottom();
        }
        self.combine_union(other, V::meet)
    }

    fn widen(&self, other: &Self) -> Self {
        if self.is_bottom {
            return other.clone();
        }
        if other.is_bottom {
            return self.clone();
        }
        self.combine_intersection(other, V::widen)
    }

    fn narrow(&self, other: &Self) -> Self {
        if self.is_bottom || other.is_bottom {
            return Self::bottom();
        }
        self.combine_union(other, V::narrow)
    }
}

impl<V: NonRelationalValue> Environment<V> {
    /// Abstract evaluation of an expression.
    pub fn eval(&self, expr: &NumExpr) -> V {
        if self.is_bottom {
            return V::bottom();
        }
        match expr {
            NumExpr::Var(v) => self.get(v),
            NumExpr::Const(c) => V::from_constant(*c),
            NumExpr::Add(e1, e2) => V::eval_binary(BinaryOp::Add, &self.eval(e1), &self.eval(e2)),
            NumExpr::Sub(e1, e2) => V::eval_binary(BinaryOp::Sub, &self.eval(e1), &self.eval(e2)),
            NumExpr::Mul(e1, e2) => V::eval_binary(BinaryOp::Mul, &self.eval(e1), &self.eval(e2)),
            NumExpr::Div(e1, e2) => V::eval_binary(BinaryOp::Div, &self.eval(e1), &self.eval(e2)),
            NumExpr::Neg(e) => self.eval(e).eval_neg(),
        }
    }

    fn assume_comparison(&self, op: CmpOp, lhs: &NumExpr, rhs: &NumExpr) -> Self {
        if let (Some(x), Some(y)) = (lhs.as_var(), rhs.as_var()) {
            if x == y {
                return if op.holds(0, 0) { self.clone() } else { Self::bottom() };
            }
        }

        let (left, right) = V::assume_comparison(op, &self.eval(lhs), &self.eval(rhs));
        if left.is_bottom() || right.is_bottom() {
            trace!("{} {} {} is infeasible", lhs, op, rhs);
            return Self::bottom();
        }

        let mut result = self.clone();
        if let Some(x) = lhs.as_var() {
            let refined = result.get(x).meet(&left);
            result.set(x, refined);
        }
        if let Some(y) = rhs.as_var() {
            let refined = result.get(y).meet(&right);
            result.set(y, refined);
        }
        result
    }
}

impl<V: NonRelationalValue> NumericDomain for Environment<V> {
    fn assign(&self, var: &Identifier, expr: &NumExpr) -> Self {
        if self.is_bottom {
            return Self::bottom();
        }
        let value = self.eval(expr);
        self.clone().with(var, value)
    }

    fn assume(&self, pred: &NumPred) -> Self {
        if self.is_bottom {
            return Self::bottom();
        }
        match pred {
            NumPred::True => self.clone(),
            NumPred::False => Self::bottom(),
            NumPred::Not(p) => self.assume(&p.negate()),
            NumPred::And(p1, p2) => self.assume(p1).assume(p2),
            NumPred::Or(p1, p2) => self.assume(p1).join(&self.assume(p2)),
            NumPred::Eq(e1, e2) => self.assume_comparison(CmpOp::Eq, e1, e2),
            NumPred::Neq(e1, e2) => self.assume_comparison(CmpOp::Neq, e1, e2),
            NumPred::Lt(e1, e2) => self.assume_comparison(CmpOp::Lt, e1, e2),
            NumPred::Le(e1, e2) => self.assume_comparison(CmpOp::Le, e1, e2),
            NumPred::Gt(e1, e2) => self.assume_comparison(CmpOp::Gt, e1, e2),
            NumPred::Ge(e1, e2) => self.assume_comparison(CmpOp::Ge, e1, e2),
        }
    }

    fn forget_if<F>(&self, pred: F) -> Self
    where
        F: Fn(&Identifier) -> bool,
    {
        if self.is_bottom {
            return Self::bottom();
        }
        let mut result = self.clone();
        result.values.retain(|var, _| !pred(var));
        result
    }

    fn satisfies(&self, pred: &NumPred) -> Satisfiability {
        if self.is_bottom {
            return Satisfiability::Unknown;
        }
        match pred {
            NumPred::True => Satisfiability::Satisfied,
            NumPred::False => Satisfiability::Unsatisfied,
            NumPred::Not(p) => self.satisfies(p).negate(),
            NumPred::And(p1, p2) => self.satisfies(p1).and(self.satisfies(p2)),
            NumPred::Or(p1, p2) => self.satisfies(p1).or(self.satisfies(p2)),
            _ => match pred.as_comparison() {
                Some((op, lhs, rhs)) => match (lhs.as_var(), rhs.as_var()) {
                    (Some(x), Some(y)) if x == y => Satisfiability::from_bool(op.holds(0, 0)),
                    _ => V::satisfies_comparison(op, &self.eval(lhs), &self.eval(rhs)),
                },
                None => Satisfiability::Unknown,
            },
        }
    }
}

impl<V: AbstractDomain + Representable> Representable for Environment<V> {
    fn representation(&self) -> Representation {
        if self.is_bottom {
            Representation::Bottom
        } else if self.values.is_empty() {
            Representation::Top
        } else {
            Representation::mapping(self.values.iter().map(|(var, value)| (var.name(), value.representation())))
        }
    }
}

impl<V: AbstractDomain + Representable> fmt::Display for Environment<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.representation())
    }
}
