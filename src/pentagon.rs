//! Pentagon abstract domain.
//!
//! A Pentagon pairs an interval environment with an environment of strict
//! upper bounds. Each half is cheap on its own; together they capture facts
//! of the shape `x ∈ [a, b] ∧ x < y`, which is enough to prove most array
//! bound checks.
//!
//! # Reduction
//!
//! The two halves are kept consistent: whenever `y ∈ B(x)` the intervals are
//! refined so that `high(x) < high(y)` and `low(x) < low(y)`:
//!
//! ```text
//! I(x) := I(x) ⊓ [-∞, high(I(y)) - 1]
//! I(y) := I(y) ⊓ [low(I(x)) + 1, +∞]
//! ```
//!
//! A state whose intervals cannot satisfy one of its bounds is bottom.
//!
//! # Join
//!
//! Joining the halves independently loses `x < y` whenever one operand only
//! knows it numerically (`high(x) < low(y)`). The join recovers such facts
//! in two symmetric passes before returning.
//!
//! # Example
//!
//! ```rust
//! use pentagon_rs::domain::AbstractDomain;
//! use pentagon_rs::numeric::{NumericDomain, Satisfiability};
//! use pentagon_rs::expr::NumExpr;
//! use pentagon_rs::pentagon::Pentagon;
//!
//! let p1 = Pentagon::top()
//!     .with_interval("x", 0, 5)?
//!     .with_interval("y", 10, 20)?
//!     .with_bound("x", "y")?;
//! let p2 = Pentagon::top()
//!     .with_interval("x", 0, 5)?
//!     .with_interval("y", 10, 20)?;
//!
//! let joined = p1.join(&p2);
//! assert!(joined.upper_bounds("x").contains("y"));
//!
//! let x_lt_y = NumExpr::var("x").lt(NumExpr::var("y"));
//! assert_eq!(joined.satisfies(&x_lt_y), Satisfiability::Satisfied);
//! # Ok::<(), pentagon_rs::error::DomainError>(())
//! ```

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use log::{debug, trace};

use crate::domain::AbstractDomain;
use crate::environment::Environment;
use crate::error::{DomainError, Result};
use crate::expr::{CmpOp, NumExpr, NumPred};
use crate::ident::Identifier;
use crate::interval::Interval;
use crate::numeric::{NonRelationalValue, NumericDomain, Satisfiability};
use crate::repr::{Representable, Representation};
use crate::upper_bounds::{UpperBounds, UpperBoundsEnv};

/// Intervals plus strict upper bounds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pentagon {
    intervals: Environment<Interval>,
    bounds: UpperBoundsEnv,
}

impl Pentagon {
    /// Combine the two halves, reducing them against each other.
    pub fn from_parts(intervals: Environment<Interval>, bounds: UpperBoundsEnv) -> Self {
        reduce(intervals, bounds)
    }

    /// Seed `var ∈ [low, high]`, replacing the previous interval of `var`.
    pub fn with_interval(self, var: impl Into<Identifier>, low: i64, high: i64) -> Result<Self> {
        let var = var.into();
        if low > high {
            return Err(DomainError::InvalidInterval { var, low, high });
        }
        let intervals = self.intervals.with(var, Interval::from_bounds(low, high));
        Ok(reduce(intervals, self.bounds))
    }

    /// Seed `x < y`.
    pub fn with_bound(self, x: impl Into<Identifier>, y: impl Into<Identifier>) -> Result<Self> {
        let x = x.into();
        let y = y.into();
        if x == y {
            return Err(DomainError::SelfBound { var: x });
        }
        let bounds = self.bounds.add_bound(&x, &y);
        Ok(reduce(self.intervals, bounds))
    }

    /// Interval of `var` (`⊤` when unconstrained).
    pub fn interval<Q>(&self, var: &Q) -> Interval
    where
        Identifier: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.intervals.get(var)
    }

    /// Strict upper bounds of `var`.
    pub fn upper_bounds<Q>(&self, var: &Q) -> UpperBounds
    where
        Identifier: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.bounds.get(var)
    }

    pub fn intervals(&self) -> &Environment<Interval> {
        &self.intervals
    }

    pub fn bounds(&self) -> &UpperBoundsEnv {
        &self.bounds
    }

    /// Whether `x < y` follows from the intervals alone.
    fn implies_less(&self, x: &Identifier, y: &Identifier) -> bool {
        self.interval(x).strictly_below(&self.interval(y))
    }

    fn assume_comparison(&self, pred: &NumPred) -> Self {
        let intervals = self.intervals.assume(pred);
        let bounds = self.bounds.assume(pred);
        reduce(intervals, bounds)
    }
}

/// Propagate bounds into intervals until stable.
fn reduce(mut intervals: Environment<Interval>, bounds: UpperBoundsEnv) -> Pentagon {
    if intervals.is_bottom() || bounds.is_bottom() {
        return Pentagon::bottom();
    }

    let pairs: Vec<(Identifier, Identifier)> = bounds
        .iter()
        .flat_map(|(x, b)| b.iter().map(move |y| (x.clone(), y.clone())))
        .collect();
    if pairs.is_empty() {
        return Pentagon { intervals, bounds };
    }

    // `normalize` has already turned self bounds and 2-cycles into ⊥. On an
    // acyclic bound graph every round settles one more edge of each path, so
    // `vars` rounds reach the fixpoint and one more observes it. A longer cycle
    // would keep shrinking intervals; stopping there leaves a sound state that
    // is merely not fully reduced.
    let vars: BTreeSet<&Identifier> = pairs.iter().flat_map(|(x, y)| [x, y]).collect();
    let max_rounds = vars.len() + 1;
    for round in 0..max_rounds {
        let mut changed = false;
        for (x, y) in &pairs {
            let ix = intervals.get(x);
            let iy = intervals.get(y);
            let (nx, ny) = Interval::assume_comparison(CmpOp::Lt, &ix, &iy);
            if nx.is_empty() || ny.is_empty() {
                debug!("{} < {} contradicts {} and {}", x, y, ix, iy);
                return Pentagon::bottom();
            }
            if nx != ix {
                intervals.set(x, nx);
                changed = true;
            }
            if ny != iy {
                intervals.set(y, ny);
                changed = true;
            }
        }
        if !changed {
            trace!("reduction stable after {} round(s)", round + 1);
            break;
        }
    }

    Pentagon { intervals, bounds }
}

impl AbstractDomain for Pentagon {
    fn bottom() -> Self {
        Pentagon {
            intervals: Environment::bottom(),
            bounds: UpperBoundsEnv::bottom(),
        }
    }

    fn top() -> Self {
        Pentagon {
            intervals: Environment::top(),
            bounds: UpperBoundsEnv::top(),
        }
    }

    fn is_bottom(&self) -> bool {
        self.intervals.is_bottom() || self.bounds.is_bottom()
    }

    fn is_top(&self) -> bool {
        self.intervals.is_top() && self.bounds.is_top()
    }

    fn le(&self, other: &Self) -> bool {
        if self.is_bottom() {
            return true;
        }
        if other.is_bottom() {
            return false;
        }
        self.intervals.le(&other.intervals)
            && other.bounds.iter().all(|(x, bounds)| {
                let mine = self.upper_bounds(x);
                bounds.iter().all(|y| mine.contains(y) || self.implies_less(x, y))
            })
    }

    fn join(&self, other: &Self) -> Self {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }

        let intervals = self.intervals.join(&other.intervals);
        let mut bounds = self.bounds.join(&other.bounds);

        // Bounds known symbolically here, numerically there.
        for (x, mine) in self.bounds.iter() {
            let theirs = other.upper_bounds(x);
            for y in mine.iter().filter(|y| !theirs.contains(*y)) {
                if other.implies_less(x, y) {
                    trace!("join keeps {} < {} (implied by the right operand)", x, y);
                    bounds.admit(x, y);
                }
            }
        }

        // Bounds known numerically here, symbolically there.
        for (x, theirs) in other.bounds.iter() {
            let mine = self.upper_bounds(x);
            for y in theirs.iter().filter(|y| !mine.contains(*y)) {
                if self.implies_less(x, y) {
                    trace!("join keeps {} < {} (implied by the left operand)", x, y);
                    bounds.admit(x, y);
                }
            }
        }

        Pentagon { intervals, bounds }
    }

    fn meet(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        reduce(self.intervals.meet(&other.intervals), self.bounds.meet(&other.bounds))
    }

    fn widen(&self, other: &Self) -> Self {
        if self.is_bottom() {
            return other.clone();
        }
        if other.is_bottom() {
            return self.clone();
        }
        Pentagon {
            intervals: self.intervals.widen(&other.intervals),
            bounds: self.bounds.widen(&other.bounds),
        }
    }

    fn narrow(&self, other: &Self) -> Self {
        if self.is_bottom() || other.is_bottom() {
            return Self::bottom();
        }
        reduce(self.intervals.narrow(&other.intervals), self.bounds.narrow(&other.bounds))
    }
}

impl NumericDomain for Pentagon {
    fn assign(&self, var: &Identifier, expr: &NumExpr) -> Self {
        if self.is_bottom() {
            return Self::bottom();
        }
        let result = reduce(self.intervals.assign(var, expr), self.bounds.assign(var, expr));
        debug!("{} := {} gives {}", var, expr, result);
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
            _ => self.assume_comparison(pred),
        }
    }

    fn forget_if<F>(&self, pred: F) -> Self
    where
        F: Fn(&Identifier) -> bool,
    {
        if self.is_bottom() {
            return Self::bottom();
        }
        Pentagon {
            intervals: self.intervals.forget_if(&pred),
            bounds: self.bounds.forget_if(&pred),
        }
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
            _ => self.bounds.satisfies(pred).or_else(|| self.intervals.satisfies(pred)),
        }
    }
}

impl Representable for Pentagon {
    fn representation(&self) -> Representation {
        if self.is_bottom() {
            return Representation::Bottom;
        }
        if self.is_top() {
            return Representation::Top;
        }
        let constrained = self.intervals.variables().chain(self.bounds.iter().map(|(x, _)| x));
        let entries: Vec<_> = constrained
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|x| {
                let entry = Representation::mapping([
                    ("interval", self.interval(x).representation()),
                    ("upper_bounds", self.upper_bounds(x).representation()),
                ]);
                (x.name(), entry)
            })
            .collect();
        Representation::mapping(entries)
    }
}

impl fmt::Display for Pentagon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.representation())
    }
}

#[cfg(test)]
mod tests {
    use log::debug;
    use test_log::test;

    use super::*;
    use crate::domain::tests::test_lattice_axioms;
    use crate::interval::Bound;

    fn var(name: &str) -> NumExpr {
        NumExpr::var(name)
    }

    fn lit(value: i64) -> NumExpr {
        NumExpr::constant(value)
    }

    fn id(name: &str) -> Identifier {
        Identifier::new(name)
    }

    fn p1() -> Pentagon {
        Pentagon::top()
            .with_interval("x", 0, 5)
            .and_then(|p| p.with_interval("y", 10, 20))
            .and_then(|p| p.with_bound("x", "y"))
            .unwrap()
    }

    fn p2() -> Pentagon {
        Pentagon::top()
            .with_interval("x", 0, 5)
            .and_then(|p| p.with_interval("y", 10, 20))
            .unwrap()
    }

    #[test]
    fn test_builder_errors() {
        assert_eq!(
            Pentagon::top().with_interval("x", 5, 0),
            Err(DomainError::InvalidInterval {
                var: id("x"),
                low: 5,
                high: 0
            })
        );
        assert_eq!(
            Pentagon::top().with_bound("x", "x"),
            Err(DomainError::SelfBound { var: id("x") })
        );
    }

    #[test]
    fn test_seeding_reduces() {
        let p = Pentagon::top()
            .with_interval("y", 0, 10)
            .and_then(|p| p.with_bound("x", "y"))
            .unwrap();
        assert_eq!(p.interval("x"), Interval::at_most(9));
        assert_eq!(p.interval("y"), Interval::from_bounds(0, 10));

        let contradiction = Pentagon::top()
            .with_interval("x", 10, 20)
            .and_then(|p| p.with_interval("y", 0, 10))
            .and_then(|p| p.with_bound("x", "y"))
            .unwrap();
        assert!(contradiction.is_bottom());
    }

    #[test]
    fn test_join_closure() {
        let p1 = p1();
        let p2 = p2();

        let joined = p1.join(&p2);
        debug!("joined = {}", joined);
        assert!(joined.upper_bounds("x").contains("y"));
        assert_eq!(joined.interval("x"), Interval::from_bounds(0, 5));
        assert_eq!(joined.interval("y"), Interval::from_bounds(10, 20));

        let reversed = p2.join(&p1);
        assert_eq!(joined, reversed);

        assert!(p1.le(&joined));
        assert!(p2.le(&joined));
    }

    #[test]
    fn test_join_drops_unsupported_bounds() {
        let p1 = p1();
        let p3 = Pentagon::top()
            .with_interval("x", 0, 15)
            .and_then(|p| p.with_interval("y", 10, 20))
            .unwrap();

        let joined = p1.join(&p3);
        assert!(!joined.upper_bounds("x").contains("y"));
        assert_eq!(joined.satisfies(&var("x").lt(var("y"))), Satisfiability::Unknown);
    }

    #[test]
    fn test_le_uses_numeric_facts() {
        // p2 implies x < y through its intervals alone
        assert!(p2().le(&p1()));
        assert!(p1().le(&p2()));
        assert!(p1().equivalent(&p2()));

        let wide = Pentagon::top().with_interval("x", 0, 15).unwrap();
        assert!(!wide.le(&p1()));
    }

    #[test]
    fn test_assume_is_idempotent() {
        let start = Pentagon::top()
            .with_interval("x", 0, 100)
            .and_then(|p| p.with_interval("y", 0, 100))
            .and_then(|p| p.with_interval("z", 50, 60))
            .unwrap();
        let preds = [
            var("x").lt(var("y")),
            var("y").le(var("z")),
            var("x").gt(lit(10)).and(var("y").lt(var("z"))),
            var("x").lt(var("y")).or(var("z").lt(var("x"))),
        ];

        for pred in &preds {
            let once = start.assume(pred);
            let twice = once.assume(pred);
            assert_eq!(once, twice, "assume({}) is not idempotent", pred);
        }

        let once = start.assume(&preds[0]);
        assert_eq!(once.interval("x"), Interval::from_bounds(0, 99));
        assert_eq!(once.interval("y"), Interval::from_bounds(1, 100));
        assert!(once.upper_bounds("x").contains("y"));
    }

    #[test]
    fn test_assume_reduces_through_chains() {
        let p = Pentagon::top()
            .assume(&var("x").lt(var("y")))
            .assume(&var("y").lt(var("z")))
            .assume(&var("z").le(lit(10)));

        assert_eq!(p.interval("z"), Interval::at_most(10));
        assert_eq!(p.interval("y"), Interval::at_most(9));
        assert_eq!(p.interval("x"), Interval::at_most(8));

        assert!(p.assume(&var("x").ge(lit(9))).is_bottom());
        assert!(p.assume(&var("z").lt(var("x"))).is_bottom());
    }

    #[test]
    fn test_assign_offset_introduces_bound() {
        let p = Pentagon::top()
            .with_interval("n", 1, 100)
            .and_then(|p| p.with_bound("n", "len"))
            .unwrap();

        let p = p.assign(&id("i"), &var("n").sub(lit(1)));
        assert_eq!(p.upper_bounds("i"), ["len", "n"].into_iter().collect::<UpperBounds>());
        assert_eq!(p.interval("i"), Interval::from_bounds(0, 99));
        assert_eq!(p.satisfies(&var("i").lt(var("len"))), Satisfiability::Satisfied);
        assert_eq!(p.satisfies(&var("i").ge(lit(0))), Satisfiability::Satisfied);
    }

    #[test]
    fn test_assign_kills_stale_bounds() {
        let p = p1();
        let p = p.assign(&id("x"), &lit(50));

        assert!(p.upper_bounds("x").is_top());
        assert_eq!(p.interval("x"), Interval::constant(50));
        assert_eq!(p.satisfies(&var("x").lt(var("y"))), Satisfiability::Unsatisfied);

        let q = p1().assign(&id("y"), &var("y").add(lit(1)));
        assert!(!q.upper_bounds("x").contains("y"));
        // Still implied numerically
        assert_eq!(q.satisfies(&var("x").lt(var("y"))), Satisfiability::Satisfied);
    }

    #[test]
    fn test_forget() {
        let p = p2()
            .with_interval("z", 30, 40)
            .and_then(|p| p.with_bound("y", "z"))
            .and_then(|p| p.with_bound("x", "y"))
            .unwrap();
        assert_eq!(p.upper_bounds("x"), ["y", "z"].into_iter().collect::<UpperBounds>());

        let forgotten = p.forget(&id("y"));
        assert!(forgotten.interval("y").is_top());
        assert!(forgotten.upper_bounds("y").is_top());
        assert!(forgotten.bounds().iter().all(|(_, b)| !b.contains("y")));
        assert_eq!(forgotten.interval("x"), Interval::from_bounds(0, 5));
        assert_eq!(forgotten.interval("z"), Interval::from_bounds(30, 40));
        // x < z was inherited from y and survives
        assert!(forgotten.upper_bounds("x").contains("z"));
    }

    #[test]
    fn test_satisfies_prefers_relational_answer() {
        let p = Pentagon::top().assume(&var("x").lt(var("y")));

        assert_eq!(p.satisfies(&var("x").lt(var("y"))), Satisfiability::Satisfied);
        assert_eq!(p.satisfies(&var("x").eq(var("y"))), Satisfiability::Unsatisfied);
        assert_eq!(p.satisfies(&var("x").lt(lit(0))), Satisfiability::Unknown);
        assert_eq!(
            p.satisfies(&var("y").le(var("x")).or(var("x").lt(var("y")))),
            Satisfiability::Satisfied
        );

        let p = p.assume(&var("x").ge(lit(0)));
        assert_eq!(p.satisfies(&var("y").gt(lit(0))), Satisfiability::Satisfied);
        assert_eq!(Pentagon::bottom().satisfies(&NumPred::True), Satisfiability::Unknown);
    }

    #[test]
    fn test_overflowing_assignment_stays_reachable() {
        let x_plus_one = var("x").add(lit(1));
        let state = Pentagon::top()
            .assign(&id("x"), &lit(i64::MAX))
            .assign(&id("y"), &x_plus_one);

        assert_eq!(state.interval("y"), Interval::at_least(i64::MAX));
        assert_eq!(state.satisfies(&var("y").gt(var("x"))), Satisfiability::Unknown);

        let above = state.assume(&var("y").gt(var("x")));
        assert!(!above.is_bottom());
        assert_eq!(above.satisfies(&var("y").gt(var("x"))), Satisfiability::Satisfied);

        let doubled = Pentagon::top()
            .assign(&id("a"), &lit(i64::MAX))
            .assign(&id("b"), &var("a").mul(lit(2)));
        assert_eq!(doubled.interval("b").high, Bound::PosInf);
        assert_eq!(doubled.satisfies(&var("b").gt(var("a"))), Satisfiability::Unknown);
    }

    #[test]
    fn test_widening_terminates() {
        // i := 0; while (i < n) i := i + 1, with n unknown
        let init = Pentagon::top().assign(&id("i"), &lit(0));
        let body = |p: &Pentagon| {
            let inside = p.assume(&var("i").lt(var("n")));
            inside.assign(&id("i"), &var("i").add(lit(1)))
        };

        let vars = 2;
        let mut current = init.clone();
        let mut changes = 0;
        loop {
            let next = current.widen(&init.join(&body(&current)));
            if next.le(&current) {
                break;
            }
            current = next;
            changes += 1;
            assert!(changes <= 2 * vars + 1, "widening did not stabilize: {}", current);
        }

        assert_eq!(current.interval("i").low, Bound::Finite(0));
        assert_eq!(current.interval("i").high, Bound::PosInf);
    }

    #[test]
    fn test_widen_drops_unstable_bounds() {
        let a = p1();
        let b = Pentagon::top()
            .with_interval("x", 0, 5)
            .and_then(|p| p.with_interval("y", 0, 20))
            .and_then(|p| p.with_bound("y", "z"))
            .unwrap();

        let widened = a.widen(&b);
        assert!(widened.upper_bounds("x").is_top());
        assert!(widened.upper_bounds("y").is_top());
        assert_eq!(widened.interval("y"), Interval::new(Bound::NegInf, Bound::Finite(20)));
        assert!(a.le(&widened));
        assert!(b.le(&widened));
    }

    #[test]
    fn test_narrow_refines_widened_bounds() {
        let widened = Pentagon::top().assume(&var("i").ge(lit(0)));
        let refined = Pentagon::top()
            .with_interval("i", 0, 10)
            .and_then(|p| p.with_bound("i", "n"))
            .unwrap();

        let narrowed = widened.narrow(&refined);
        assert_eq!(narrowed.interval("i"), Interval::from_bounds(0, 10));
        assert!(narrowed.upper_bounds("i").contains("n"));
        assert_eq!(narrowed.interval("n"), Interval::at_least(1));
    }

    #[test]
    fn test_meet_reduces() {
        let bound = Pentagon::top().with_bound("x", "y").unwrap();
        let ranges = Pentagon::top()
            .with_interval("x", 0, 10)
            .and_then(|p| p.with_interval("y", 0, 10))
            .unwrap();

        let met = bound.meet(&ranges);
        assert_eq!(met.interval("x"), Interval::from_bounds(0, 9));
        assert_eq!(met.interval("y"), Interval::from_bounds(1, 10));
        assert_eq!(Pentagon::from_parts(ranges.intervals().clone(), bound.bounds().clone()), met);

        let reversed = Pentagon::top().with_bound("y", "x").unwrap();
        assert!(met.meet(&reversed).is_bottom());
    }

    #[test]
    fn test_representation() {
        assert_eq!(Pentagon::top().to_string(), "⊤");
        assert_eq!(Pentagon::bottom().to_string(), "⊥");
        assert_eq!(
            p1().to_string(),
            "{x: {interval: [0, 5], upper_bounds: {y}}, y: {interval: [10, 20], upper_bounds: ⊤}}"
        );
    }

    #[test]
    fn test_pentagon_lattice_axioms() {
        let samples = vec![
            Pentagon::bottom(),
            Pentagon::top(),
            p1(),
            p2(),
            Pentagon::top().with_bound("x", "y").unwrap(),
            Pentagon::top().with_bound("y", "x").unwrap(),
            Pentagon::top()
                .with_interval("x", -5, 5)
                .and_then(|p| p.with_bound("x", "z"))
                .unwrap(),
            Pentagon::top().with_interval("y", 0, 0).unwrap(),
        ];

        test_lattice_axioms(&samples);
    }
}
