//! Strict upper bounds: the symbolic half of the Pentagon domain.
//!
//! For every variable `x` the domain keeps a set `B(x)` of variables that are
//! known to be strictly greater than `x`. Larger sets carry more facts, so the
//! order is inverted with respect to set inclusion:
//!
//! ```text
//!   {y, z}  ⊑  {y}  ⊑  {}  = ⊤
//! ```
//!
//! [`UpperBounds::refines`] is the single order primitive; `le`, `join`
//! (intersection) and `meet` (union) are all derived from it.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use log::trace;

use crate::domain::AbstractDomain;
use crate::environment::Environment;
use crate::expr::{CmpOp, NumExpr, NumPred};
use crate::ident::Identifier;
use crate::numeric::{NumericDomain, Satisfiability};
use crate::repr::{Representable, Representation};

/// Set of variables strictly greater than some variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UpperBounds {
    /// Unreachable.
    Bottom,
    /// Known strict upper bounds; the empty set is `⊤`.
    Bounds(BTreeSet<Identifier>),
}

impl UpperBounds {
    pub fn contains<Q>(&self, var: &Q) -> bool
    where
        Identifier: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self {
            UpperBounds::Bottom => false,
            UpperBounds::Bounds(set) => set.contains(var),
        }
    }

    /// Whether `self` carries at least the facts of `other` (`self ⊇ other`).
    pub fn refines(&self, other: &UpperBounds) -> bool {
        match (self, other) {
            (UpperBounds::Bottom, _) => true,
            (_, UpperBounds::Bottom) => false,
            (UpperBounds::Bounds(mine), UpperBounds::Bounds(theirs)) => mine.is_superset(theirs),
        }
    }

    pub fn add(&self, var: impl Into<Identifier>) -> UpperBounds {
        match self {
            UpperBounds::Bottom => UpperBounds::Bottom,
            UpperBounds::Bounds(set) => {
                let mut set = set.clone();
                set.insert(var.into());
                UpperBounds::Bounds(set)
            }
        }
    }

    pub fn remove<Q>(&self, var: &Q) -> UpperBounds
    where
        Identifier: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.retain(|v| Borrow::<Q>::borrow(v) != var)
    }

    fn retain(&self, keep: impl Fn(&Identifier) -> bool) -> UpperBounds {
        match self {
            UpperBounds::Bottom => UpperBounds::Bottom,
            UpperBounds::Bounds(set) => UpperBounds::Bounds(set.iter().filter(|v| keep(v)).cloned().collect()),
        }
    }

    /// Bounds in identifier order; empty for bottom.
    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        let set = match self {
            UpperBounds::Bottom => None,
            UpperBounds::Bounds(set) => Some(set),
        };
        set.into_iter().flatten()
    }

    pub fn len(&self) -> usize {
        match self {
            UpperBounds::Bottom => 0,
            UpperBounds::Bounds(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<I: Into<Identifier>> FromIterator<I> for UpperBounds {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        UpperBounds::Bounds(iter.into_iter().map(Into::into).collect())
    }
}

impl AbstractDomain for UpperBounds {
    fn bottom() -> Self {
        UpperBounds::Bottom
    }

    fn top() -> Self {
        UpperBounds::Bounds(BTreeSet::new())
    }

    fn is_bottom(&self) -> bool {
        matches!(self, UpperBounds::Bottom)
    }

    fn is_top(&self) -> bool {
        matches!(self, UpperBounds::Bounds(set) if set.is_empty())
    }

    fn le(&self, other: &Self) -> bool {
        self.refines(other)
    }

    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (UpperBounds::Bottom, x) | (x, UpperBounds::Bottom) => x.clone(),
            (UpperBounds::Bounds(a), UpperBounds::Bounds(b)) => UpperBounds::Bounds(a.intersection(b).cloned().collect()),
        }
    }

    fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (UpperBounds::Bottom, _) | (_, UpperBounds::Bottom) => UpperBounds::Bottom,
            (UpperBounds::Bounds(a), UpperBounds::Bounds(b)) => UpperBounds::Bounds(a.union(b).cloned().collect()),
        }
    }

    fn widen(&self, other: &Self) -> Self {
        // Comparable operands: keep the coarser one; otherwise give up.
        if self.refines(other) {
            other.clone()
        } else if other.refines(self) {
            self.clone()
        } else {
            UpperBounds::top()
        }
    }
}

impl fmt::Display for UpperBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpperBounds::Bottom => write!(f, "⊥"),
            UpperBounds::Bounds(set) if set.is_empty() => write!(f, "⊤"),
            UpperBounds::Bounds(set) => {
                write!(f, "{{")?;
                for (i, var) in set.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", var)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Representable for UpperBounds {
    fn representation(&self) -> Representation {
        match self {
            UpperBounds::Bottom => Representation::Bottom,
            _ if self.is_top() => Representation::Top,
            _ => Representation::value(self),
        }
    }
}

/// Environment of strict upper bounds, `x ↦ B(x)`.
///
/// A state where some `x ∈ B(x)`, or where `x ∈ B(y)` and `y ∈ B(x)`, is
/// normalized to bottom.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpperBoundsEnv(Environment<UpperBounds>);

impl UpperBoundsEnv {
    /// `B(var)`.
    pub fn get<Q>(&self, var: &Q) -> UpperBounds
    where
        Identifier: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.0.get(var)
    }

    /// Non-empty bound sets, in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&Identifier, &UpperBounds)> {
        self.0.iter()
    }

    /// Record `x < y`, inheriting the bounds already known for `y`.
    pub fn add_bound(&self, x: &Identifier, y: &Identifier) -> Self {
        self.assume_less(x, y, true)
    }

    /// Insert `y` into `B(x)` without propagation.
    pub(crate) fn admit(&mut self, x: &Identifier, y: &Identifier) {
        let bounds = self.get(x).add(y);
        self.0.set(x, bounds);
    }

    fn assume_less(&self, x: &Identifier, y: &Identifier, strict: bool) -> Self {
        if self.is_bottom() {
            return Self::bottom();
        }
        if x == y {
            return if strict { Self::bottom() } else { self.clone() };
        }
        let mut merged = self.get(x).meet(&self.get(y));
        if strict {
            merged = merged.add(y);
        }
        let mut result = self.clone();
        result.0.set(x, merged);
        result.normalize()
    }

    fn assume_equal(&self, x: &Identifier, y: &Identifier) -> Self {
        if self.is_bottom() || x == y {
            return self.clone();
        }
        let merged = self.get(x).meet(&self.get(y));
        let mut result = self.clone();
        result.0.set(x, merged.clone());
        result.0.set(y, merged);
        result.normalize()
    }

    fn assume_comparison(&self, op: CmpOp, lhs: &NumExpr, rhs: &NumExpr) -> Self {
        let (Some(x), Some(y)) = (lhs.as_var(), rhs.as_var()) else {
            return self.clone();
        };
        match op {
            CmpOp::Lt => self.assume_less(x, y, true),
            CmpOp::Le => self.assume_less(x, y, false),
            CmpOp::Gt => self.assume_less(y, x, true),
            CmpOp::Ge => self.assume_less(y, x, false),
            CmpOp::Eq => self.assume_equal(x, y),
            CmpOp::Neq => self.clone(),
        }
    }

    /// Collapse to bottom on a self bound or a two-cycle.
    fn normalize(self) -> Self {
        for (x, bounds) in self.0.iter() {
            if bounds.contains(x) {
                trace!("{} < {} is contradictory", x, x);
                return Self::bottom();
            }
            if let Some(y) = bounds.iter().find(|y| self.get(*y).contains(x)) {
                trace!("{} < {} < {} is contradictory", x, y, x);
                return Self::bottom();
            }
        }
        self
    }

    fn satisfies_comparison(&self, op: CmpOp, x: &Identifier, y: &Identifier) -> Satisfiability {
        let below = |a: &Identifier, b: &Identifier| self.get(a).contains(b);
        match op {
            CmpOp::Lt | CmpOp::Le if x == y => Satisfiability::from_bool(op == CmpOp::Le),
            CmpOp::Lt | CmpOp::Le => {
                if below(x, y) {
                    Satisfiability::Satisfied
                } else if below(y, x) {
                    Satisfiability::Unsatisfied
                } else {
                    Satisfiability::Unknown
                }
            }
            CmpOp::Gt | CmpOp::Ge => self.satisfies_comparison(op.flip(), y, x),
            CmpOp::Eq if x == y => Satisfiability::Satisfied,
            CmpOp::Eq if below(x, y) || below(y, x) => Satisfiability::Unsatisfied,
            CmpOp::Eq => Satisfiability::Unknown,
            CmpOp::Neq => self.satisfies_comparison(CmpOp::Eq, x, y).negate(),
        }
    }
}

impl AbstractDomain for UpperBoundsEnv {
    fn bottom() -> Self {
        UpperBoundsEnv(Environment::bottom())
    }

    fn top() -> Self {
        UpperBoundsEnv(Environment::top())
    }

    fn is_bottom(&self) -> bool {
        self.0.is_bottom()
    }

    fn is_top(&self) -> bool {
        self.0.is_top()
    }

    fn le(&self, other: &Self) -> bool {
        self.0.le(&other.0)
    }

    fn join(&self, other: &Self) -> Self {
        UpperBoundsEnv(self.0.join(&other.0))
    }

    fn meet(&self, other: &Self) -> Self {
        UpperBoundsEnv(self.0.meet(&other.0)).normalize()
    }

    fn widen(&self, other: &Self) -> Self {
        UpperBoundsEnv(self.0.widen(&other.0))
    }

    fn narrow(&self, other: &Self) -> Self {
        UpperBoundsEnv(self.0.narrow(&other.0)).normalize()
    }
}

impl NumericDomain for UpperBoundsEnv {
    fn assign(&self, var: &Identifier, expr: &NumExpr) -> Self {
        if self.is_bottom() {
            return Self::bottom();
        }
        let previous = self.get(var);
        let mut result = self.forget(var);
        trace!("kill bounds of {}: {}", var, previous);

        match expr.as_offset() {
            Some((y, c)) if c > 0 && y == var => {
                // The new value lies below the old one, so old bounds still hold
                result.0.set(var, previous);
            }
            Some((y, c)) if c > 0 => {
                let inherited = result.get(y).add(y);
                result.0.set(var, inherited);
            }
            _ => {}
        }
        result
    }

    fn assume(&self, pred: &NumPred) -> Self {
        if self.is_bottom() {
            return Self::bottom();
        }
        match pred {
            NumPred::True => self.clone(),
            NumPred::False => Self::bottom(),
            NumPred::Not(p) => self.assume(&p.negate()),
            NumPred::And(p1, p2) => self.assume(p1).assume(p2),
            NumPred::Or(p1, p2) => self.assume(p1).join(&self.assume(p2)),
            _ => match pred.as_comparison() {
                Some((op, lhs, rhs)) => self.assume_comparison(op, lhs, rhs),
                None => self.clone(),
            },
        }
    }

    fn forget_if<F>(&self, pred: F) -> Self
    where
        F: Fn(&Identifier) -> bool,
    {
        if self.is_bottom() {
            return Self::bottom();
        }
        let mut result = Self::top();
        for (var, bounds) in self.0.iter().filter(|(var, _)| !pred(var)) {
            result.0.set(var, bounds.retain(|v| !pred(v)));
        }
        result
    }

    fn satisfies(&self, pred: &NumPred) -> Satisfiability {
        if self.is_bottom() {
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
                    (Some(x), Some(y)) => self.satisfies_comparison(op, x, y),
                    _ => Satisfiability::Unknown,
                },
                None => Satisfiability::Unknown,
            },
        }
    }
}

impl Representable for UpperBoundsEnv {
    fn representation(&self) -> Representation {
        self.0.representation()
    }
}

impl fmt::Display for UpperBoundsEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::domain::tests::{test_join_associativity, test_lattice_axioms};

    fn bounds(vars: &[&str]) -> UpperBounds {
        vars.iter().copied().collect()
    }

    fn var(name: &str) -> NumExpr {
        NumExpr::var(name)
    }

    fn id(name: &str) -> Identifier {
        Identifier::new(name)
    }

    #[test]
    fn test_inverted_order() {
        let yz = bounds(&["y", "z"]);
        let y = bounds(&["y"]);
        let top = UpperBounds::top();

        assert!(yz.refines(&y));
        assert!(!y.refines(&yz));
        assert!(yz.le(&y));
        assert!(y.le(&top));
        assert!(UpperBounds::Bottom.le(&yz));
        assert!(top.is_top());
        assert!(bounds(&[]).is_top());
    }

    #[test]
    fn test_join_meet() {
        let a = bounds(&["y", "z"]);
        let b = bounds(&["z", "w"]);

        assert_eq!(a.join(&b), bounds(&["z"]));
        assert_eq!(a.meet(&b), bounds(&["w", "y", "z"]));
        assert_eq!(a.remove("y"), bounds(&["z"]));
        assert_eq!(a.add("w").len(), 3);
        assert!(a.remove("y").remove("z").is_empty());
        assert_eq!(a.join(&UpperBounds::Bottom), a);
        assert_eq!(a.meet(&UpperBounds::Bottom), UpperBounds::Bottom);
    }

    #[test]
    fn test_widen() {
        let yz = bounds(&["y", "z"]);
        let y = bounds(&["y"]);
        let w = bounds(&["w"]);

        assert_eq!(yz.widen(&y), y);
        assert_eq!(y.widen(&yz), y);
        assert_eq!(y.widen(&w), UpperBounds::top());
        assert_eq!(UpperBounds::Bottom.widen(&w), w);
    }

    #[test]
    fn test_assume_strict() {
        let env = UpperBoundsEnv::top().assume(&var("y").lt(var("z")));
        let env = env.assume(&var("x").lt(var("y")));

        assert_eq!(env.get("x"), bounds(&["y", "z"]));
        assert_eq!(env.get("y"), bounds(&["z"]));
        assert!(env.get("z").is_top());
    }

    #[test]
    fn test_assume_non_strict_and_equal() {
        let env = UpperBoundsEnv::top().assume(&var("y").lt(var("z")));

        let le = env.assume(&var("x").le(var("y")));
        assert_eq!(le.get("x"), bounds(&["z"]));

        let ge = env.assume(&var("y").ge(var("x")));
        assert_eq!(ge, le);

        let gt = env.assume(&var("y").gt(var("x")));
        assert_eq!(gt.get("x"), bounds(&["y", "z"]));

        let eq = env.assume(&var("x").eq(var("y")));
        assert_eq!(eq.get("x"), bounds(&["z"]));
        assert_eq!(eq.get("y"), bounds(&["z"]));

        assert_eq!(env.assume(&var("x").neq(var("y"))), env);
        assert_eq!(env.assume(&var("x").lt(NumExpr::constant(3))), env);
    }

    #[test]
    fn test_contradictions_are_bottom() {
        let env = UpperBoundsEnv::top().assume(&var("x").lt(var("y")));

        assert!(env.assume(&var("y").lt(var("x"))).is_bottom());
        assert!(env.assume(&var("y").le(var("x"))).is_bottom());
        assert!(env.assume(&var("x").eq(var("y"))).is_bottom());
        assert!(env.assume(&var("z").lt(var("z"))).is_bottom());
        assert!(env.assume(&NumPred::False).is_bottom());

        // Three-cycle through inherited bounds
        let chain = env.assume(&var("y").lt(var("z")));
        assert!(chain.assume(&var("z").lt(var("x"))).is_bottom());
    }

    #[test]
    fn test_assume_connectives() {
        let env = UpperBoundsEnv::top();

        let both = env.assume(&var("x").lt(var("y")).and(var("x").lt(var("z"))));
        assert_eq!(both.get("x"), bounds(&["y", "z"]));

        let either = env.assume(&var("x").lt(var("y")).or(var("x").lt(var("z"))));
        assert!(either.is_top());

        let negated = env.assume(&var("x").ge(var("y")).not());
        assert_eq!(negated.get("x"), bounds(&["y"]));
    }

    #[test]
    fn test_assign_kill() {
        let env = UpperBoundsEnv::top()
            .assume(&var("x").lt(var("y")))
            .assume(&var("w").lt(var("x")));
        assert_eq!(env.get("w"), bounds(&["x", "y"]));

        let env = env.assign(&id("x"), &NumExpr::constant(0));
        assert!(env.get("x").is_top());
        assert_eq!(env.get("w"), bounds(&["y"]));
    }

    #[test]
    fn test_assign_offset() {
        let env = UpperBoundsEnv::top().assume(&var("y").lt(var("z")));

        let decremented = env.assign(&id("x"), &var("y").sub(NumExpr::constant(1)));
        assert_eq!(decremented.get("x"), bounds(&["y", "z"]));

        let same = env.assign(&id("x"), &var("y").sub(NumExpr::constant(0)));
        assert!(same.get("x").is_top());

        let incremented = env.assign(&id("x"), &var("y").add(NumExpr::constant(1)));
        assert!(incremented.get("x").is_top());

        let symbolic = env.assign(&id("x"), &var("y").sub(var("k")));
        assert!(symbolic.get("x").is_top());

        // y := y - 2 keeps y below z; the old y is gone from every set
        let shrunk = decremented.assign(&id("y"), &var("y").sub(NumExpr::constant(2)));
        assert_eq!(shrunk.get("y"), bounds(&["z"]));
        assert_eq!(shrunk.get("x"), bounds(&["z"]));
    }

    #[test]
    fn test_forget() {
        let env = UpperBoundsEnv::top()
            .assume(&var("x").lt(var("y")))
            .assume(&var("w").lt(var("x")));

        let env = env.forget(&id("x"));
        assert!(env.get("x").is_top());
        assert!(env.iter().all(|(_, b)| !b.contains("x")));
        assert_eq!(env.get("w"), bounds(&["y"]));

        let env = env.forget_if(|v| v.name() == "y");
        assert!(env.is_top());
    }

    #[test]
    fn test_satisfies() {
        let env = UpperBoundsEnv::top().assume(&var("x").lt(var("y")));

        assert_eq!(env.satisfies(&var("x").lt(var("y"))), Satisfiability::Satisfied);
        assert_eq!(env.satisfies(&var("x").le(var("y"))), Satisfiability::Satisfied);
        assert_eq!(env.satisfies(&var("y").gt(var("x"))), Satisfiability::Satisfied);
        assert_eq!(env.satisfies(&var("y").lt(var("x"))), Satisfiability::Unsatisfied);
        assert_eq!(env.satisfies(&var("y").le(var("x"))), Satisfiability::Unsatisfied);
        assert_eq!(env.satisfies(&var("x").eq(var("y"))), Satisfiability::Unsatisfied);
        assert_eq!(env.satisfies(&var("x").neq(var("y"))), Satisfiability::Satisfied);
        assert_eq!(env.satisfies(&var("x").lt(var("z"))), Satisfiability::Unknown);
        assert_eq!(env.satisfies(&var("x").lt(NumExpr::constant(0))), Satisfiability::Unknown);
        assert_eq!(env.satisfies(&var("x").le(var("x"))), Satisfiability::Satisfied);
    }

    #[test]
    fn test_representation() {
        let env = UpperBoundsEnv::top().assume(&var("x").lt(var("y")).and(var("x").lt(var("z"))));
        assert_eq!(env.to_string(), "{x: {y, z}}");
        assert_eq!(UpperBoundsEnv::top().to_string(), "⊤");
        assert_eq!(UpperBoundsEnv::bottom().to_string(), "⊥");
    }

    #[test]
    fn test_lattice_axioms_upper_bounds() {
        let samples = vec![
            UpperBounds::Bottom,
            UpperBounds::top(),
            bounds(&["y"]),
            bounds(&["z"]),
            bounds(&["y", "z"]),
            bounds(&["w", "y"]),
        ];

        test_lattice_axioms(&samples);
        test_join_associativity(&samples);
    }

    #[test]
    fn test_lattice_axioms_env() {
        let top = UpperBoundsEnv::top();
        let samples = vec![
            UpperBoundsEnv::bottom(),
            top.clone(),
            top.assume(&var("x").lt(var("y"))),
            top.assume(&var("x").lt(var("z"))),
            top.assume(&var("x").lt(var("y")).and(var("y").lt(var("z")))),
            top.assume(&var("z").lt(var("w"))),
        ];

        test_lattice_axioms(&samples);
        test_join_associativity(&samples);
    }
}
