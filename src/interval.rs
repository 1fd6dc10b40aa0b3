//! Interval abstract domain implementation.
//!
//! The interval domain tracks lower and upper bounds for numeric variables.
//! It's simple, efficient, but loses relational information between variables;
//! the [`Pentagon`](crate::pentagon::Pentagon) domain pairs it with strict
//! upper bounds to recover some of it.

use std::cmp::{max, min};
use std::fmt;

use crate::domain::AbstractDomain;
use crate::expr::{BinaryOp, CmpOp};
use crate::numeric::{NonRelationalValue, Satisfiability};
use crate::repr::{Representable, Representation};

/// Bound of an interval: -∞, finite value, or +∞.
///
/// Finite results outside the `i64` range escape to the infinity of their
/// sign. [`Interval`] arithmetic then rounds such endpoints outward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bound {
    NegInf,
    Finite(i64),
    PosInf,
}

impl Bound {
    fn signum(&self) -> i64 {
        match self {
            Bound::NegInf => -1,
            Bound::Finite(n) => n.signum(),
            Bound::PosInf => 1,
        }
    }

    fn infinity(signum: i64) -> Bound {
        if signum < 0 {
            Bound::NegInf
        } else {
            Bound::PosInf
        }
    }

    /// As a lower bound: a value beyond `i64::MAX` is still at least `i64::MAX`.
    fn round_down(self) -> Bound {
        match self {
            Bound::PosInf => Bound::Finite(i64::MAX),
            b => b,
        }
    }

    /// As an upper bound: a value beyond `i64::MIN` is still at most `i64::MIN`.
    fn round_up(self) -> Bound {
        match self {
            Bound::NegInf => Bound::Finite(i64::MIN),
            b => b,
        }
    }

    pub fn add(&self, other: &Bound) -> Bound {
        match (self, other) {
            (Bound::Finite(a), Bound::Finite(b)) => match a.checked_add(*b) {
                Some(n) => Bound::Finite(n),
                None => Bound::infinity(a.signum()),
            },
            (Bound::NegInf, Bound::PosInf) | (Bound::PosInf, Bound::NegInf) => {
                // Undefined: use top
                Bound::PosInf
            }
            (Bound::NegInf, _) | (_, Bound::NegInf) => Bound::NegInf,
            (Bound::PosInf, _) | (_, Bound::PosInf) => Bound::PosInf,
        }
    }

    pub fn sub(&self, other: &Bound) -> Bound {
        match (self, other) {
            (Bound::Finite(a), Bound::Finite(b)) => match a.checked_sub(*b) {
                Some(n) => Bound::Finite(n),
                None => Bound::infinity(-b.signum()),
            },
            (Bound::PosInf, Bound::NegInf) => Bound::PosInf,
            (Bound::NegInf, Bound::PosInf) => Bound::NegInf,
            (Bound::PosInf, _) => Bound::PosInf,
            (Bound::NegInf, _) => Bound::NegInf,
            (_, Bound::PosInf) => Bound::NegInf,
            (_, Bound::NegInf) => Bound::PosInf,
        }
    }

    pub fn mul(&self, other: &Bound) -> Bound {
        match (self, other) {
            (Bound::Finite(a), Bound::Finite(b)) => match a.checked_mul(*b) {
                Some(n) => Bound::Finite(n),
                None => Bound::infinity(a.signum() * b.signum()),
            },
            (Bound::Finite(0), _) | (_, Bound::Finite(0)) => Bound::Finite(0),
            _ => Bound::infinity(self.signum() * other.signum()),
        }
    }

    /// Truncating division; the divisor must not be zero.
    pub fn div(&self, other: &Bound) -> Bound {
        match (self, other) {
            (Bound::Finite(a), Bound::Finite(b)) => match a.checked_div(*b) {
                Some(q) => Bound::Finite(q),
                // i64::MIN / -1
                None => Bound::PosInf,
            },
            (Bound::Finite(_), _) => Bound::Finite(0),
            _ => Bound::infinity(self.signum() * other.signum()),
        }
    }

    pub fn neg(&self) -> Bound {
        match self {
            Bound::NegInf => Bound::PosInf,
            Bound::Finite(n) => n.checked_neg().map_or(Bound::PosInf, Bound::Finite),
            Bound::PosInf => Bound::NegInf,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::NegInf => write!(f, "-∞"),
            Bound::Finite(n) => write!(f, "{}", n),
            Bound::PosInf => write!(f, "+∞"),
        }
    }
}

/// Interval: [low, high].
///
/// Every empty interval is normalized to the canonical bottom `[+∞, -∞]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub low: Bound,
    pub high: Bound,
}

impl Interval {
    pub fn new(low: Bound, high: Bound) -> Self {
        if low > high || low == Bound::PosInf || high == Bound::NegInf {
            Self::bottom()
        } else {
            Self { low, high }
        }
    }

    /// Arithmetic result whose finite endpoints may have overflowed.
    fn rounded(low: Bound, high: Bound) -> Self {
        Self::new(low.round_down(), high.round_up())
    }

    pub fn from_bounds(low: i64, high: i64) -> Self {
        Self::new(Bound::Finite(low), Bound::Finite(high))
    }

    pub fn constant(value: i64) -> Self {
        Self {
            low: Bound::Finite(value),
            high: Bound::Finite(value),
        }
    }

    /// `[value, +∞]`
    pub fn at_least(value: i64) -> Self {
        Self::new(Bound::Finite(value), Bound::PosInf)
    }

    /// `[-∞, value]`
    pub fn at_most(value: i64) -> Self {
        Self::new(Bound::NegInf, Bound::Finite(value))
    }

    pub fn top() -> Self {
        Self {
            low: Bound::NegInf,
            high: Bound::PosInf,
        }
    }

    pub fn bottom() -> Self {
        Self {
            low: Bound::PosInf,
            high: Bound::NegInf,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.low > self.high
    }

    pub fn contains(&self, value: i64) -> bool {
        !self.is_empty() && self.low <= Bound::Finite(value) && Bound::Finite(value) <= self.high
    }

    /// The single value of a singleton interval.
    pub fn as_constant(&self) -> Option<i64> {
        match (self.low, self.high) {
            (Bound::Finite(l), Bound::Finite(h)) if l == h => Some(l),
            _ => None,
        }
    }

    /// Every value of `self` is strictly below every value of `other`.
    pub fn strictly_below(&self, other: &Interval) -> bool {
        !self.is_empty() && !other.is_empty() && self.high < other.low
    }

    pub fn add(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Interval::bottom();
        }
        Interval::rounded(self.low.add(&other.low), self.high.add(&other.high))
    }

    pub fn sub(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Interval::bottom();
        }
        Interval::rounded(self.low.sub(&other.high), self.high.sub(&other.low))
    }

    pub fn mul(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Interval::bottom();
        }
        let corners = [
            self.low.mul(&other.low),
            self.low.mul(&other.high),
            self.high.mul(&other.low),
            self.high.mul(&other.high),
        ];
        Self::hull(&corners)
    }

    /// Truncating division.
    ///
    /// A divisor of exactly `[0, 0]` yields bottom. Otherwise zero is split out
    /// of the divisor and the quotients over its negative and positive parts
    /// are joined.
    pub fn div(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() || *other == Interval::constant(0) {
            return Interval::bottom();
        }
        let negative = other.meet(&Interval::at_most(-1));
        let positive = other.meet(&Interval::at_least(1));
        self.div_nonzero(&negative).join(&self.div_nonzero(&positive))
    }

    fn div_nonzero(&self, divisor: &Interval) -> Interval {
        if divisor.is_empty() {
            return Interval::bottom();
        }
        let corners = [
            self.low.div(&divisor.low),
            self.low.div(&divisor.high),
            self.high.div(&divisor.low),
            self.high.div(&divisor.high),
        ];
        Self::hull(&corners)
    }

    fn hull(corners: &[Bound]) -> Interval {
        let low = corners.iter().min().copied().unwrap_or(Bound::NegInf);
        let high = corners.iter().max().copied().unwrap_or(Bound::PosInf);
        Interval::rounded(low, high)
    }

    pub fn neg(&self) -> Interval {
        if self.is_empty() {
            return Interval::bottom();
        }
        Interval::rounded(self.high.neg(), self.low.neg())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "⊥")
        } else {
            write!(f, "[{}, {}]", self.low, self.high)
        }
    }
}

impl AbstractDomain for Interval {
    fn bottom() -> Self {
        Interval::bottom()
    }

    fn top() -> Self {
        Interval::top()
    }

    fn is_bottom(&self) -> bool {
        self.is_empty()
    }

    fn is_top(&self) -> bool {
        self.low == Bound::NegInf && self.high == Bound::PosInf
    }

    fn le(&self, other: &Self) -> bool {
        if self.is_empty() {
            return true;
        }
        if other.is_empty() {
            return false;
        }
        other.low <= self.low && self.high <= other.high
    }

    fn join(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Interval {
            low: min(self.low, other.low),
            high: max(self.high, other.high),
        }
    }

    fn meet(&self, other: &Self) -> Self {
        Interval::new(max(self.low, other.low), min(self.high, other.high))
    }

    fn widen(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let low = if other.low < self.low { Bound::NegInf } else { self.low };
        let high = if other.high > self.high { Bound::PosInf } else { self.high };
        Interval { low, high }
    }

    fn narrow(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Interval::bottom();
        }
        // Only bounds lost to widening are refined
        let low = if self.low == Bound::NegInf { other.low } else { self.low };
        let high = if self.high == Bound::PosInf { other.high } else { self.high };
        Interval::new(low, high)
    }
}

impl NonRelationalValue for Interval {
    fn from_constant(value: i64) -> Self {
        Interval::constant(value)
    }

    fn eval_neg(&self) -> Self {
        self.neg()
    }

    fn eval_binary(op: BinaryOp, left: &Self, right: &Self) -> Self {
        match op {
            BinaryOp::Add => left.add(right),
            BinaryOp::Sub => left.sub(right),
            BinaryOp::Mul => left.mul(right),
            BinaryOp::Div => left.div(right),
        }
    }

    fn assume_comparison(op: CmpOp, left: &Self, right: &Self) -> (Self, Self) {
        if left.is_empty() || right.is_empty() {
            return (Interval::bottom(), Interval::bottom());
        }
        let one = Bound::Finite(1);
        match op {
            CmpOp::Lt => (
                left.meet(&Interval::rounded(Bound::NegInf, right.high.sub(&one))),
                right.meet(&Interval::rounded(left.low.add(&one), Bound::PosInf)),
            ),
            CmpOp::Le => (
                left.meet(&Interval::new(Bound::NegInf, right.high)),
                right.meet(&Interval::new(left.low, Bound::PosInf)),
            ),
            CmpOp::Gt | CmpOp::Ge => {
                let (r, l) = Self::assume_comparison(op.flip(), right, left);
                (l, r)
            }
            CmpOp::Eq => {
                let both = left.meet(right);
                (both, both)
            }
            CmpOp::Neq => (left.exclude(right.as_constant()), right.exclude(left.as_constant())),
        }
    }

    fn satisfies_comparison(op: CmpOp, left: &Self, right: &Self) -> Satisfiability {
        if left.is_empty() || right.is_empty() {
            return Satisfiability::Unknown;
        }
        match op {
            CmpOp::Lt => {
                if left.high < right.low {
                    Satisfiability::Satisfied
                } else if left.low >= right.high {
                    Satisfiability::Unsatisfied
                } else {
                    Satisfiability::Unknown
                }
            }
            CmpOp::Le => {
                if left.high <= right.low {
                    Satisfiability::Satisfied
                } else if left.low > right.high {
                    Satisfiability::Unsatisfied
                } else {
                    Satisfiability::Unknown
                }
            }
            CmpOp::Gt | CmpOp::Ge => Self::satisfies_comparison(op.flip(), right, left),
            CmpOp::Eq => match (left.as_constant(), right.as_constant()) {
                (Some(a), Some(b)) if a == b => Satisfiability::Satisfied,
                _ if left.meet(right).is_empty() => Satisfiability::Unsatisfied,
                _ => Satisfiability::Unknown,
            },
            CmpOp::Neq => Self::satisfies_comparison(CmpOp::Eq, left, right).negate(),
        }
    }
}

impl Interval {
    /// Shave `value` off an endpoint (intervals cannot represent holes).
    fn exclude(&self, value: Option<i64>) -> Interval {
        let Some(c) = value else {
            return *self;
        };
        let mut low = self.low;
        let mut high = self.high;
        if low == Bound::Finite(c) {
            low = low.add(&Bound::Finite(1));
        }
        if high == Bound::Finite(c) {
            high = high.sub(&Bound::Finite(1));
        }
        Interval::rounded(low, high)
    }
}

impl Representable for Interval {
    fn representation(&self) -> Representation {
        if self.is_empty() {
            Representation::Bottom
        } else if AbstractDomain::is_top(self) {
            Representation::Top
        } else {
            Representation::value(self)
        }
    }
}
