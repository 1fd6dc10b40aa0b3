//! Sign abstract domain implementation.
//!
//! The sign domain tracks the sign of numeric values, providing a coarse
//! but very efficient abstraction. It is the smallest complete specimen of
//! the [`NonRelationalValue`] contract: lifted through
//! [`Environment`](crate::environment::Environment) it becomes a full
//! program-state domain.
//!
//! # Elements
//!
//! The lattice has 7 elements representing sign properties:
//! - `⊥` (Bottom): impossible/unreachable
//! - `-` (Negative): strictly negative
//! - `0` (Zero): exactly zero
//! - `+` (Positive): strictly positive
//! - `≤0` (ZeroOrNegative): zero or negative
//! - `≥0` (ZeroOrPositive): zero or positive
//! - `⊤` (Top): any value
//!
//! # Lattice Structure
//!
//! ```text
//!          ⊤
//!        /   \
//!      ≤0     ≥0
//!     /  \   /  \
//!    -    0      +
//!     \   |     /
//!          ⊥
//! ```
//!
//! There is no "non-zero" element: the join of `-` and `+` is `⊤`.

use std::fmt;

use crate::domain::AbstractDomain;
use crate::expr::{BinaryOp, CmpOp};
use crate::numeric::{NonRelationalValue, Satisfiability};
use crate::repr::{Representable, Representation};

/// Sign values representing abstract sign properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    /// Bottom (`⊥`): impossible/unreachable
    Bottom,
    /// Strictly negative (`< 0`)
    Negative,
    /// Exactly zero (`= 0`)
    Zero,
    /// Strictly positive (`> 0`)
    Positive,
    /// Non-positive (`≤ 0`): `Zero ∪ Negative`
    ZeroOrNegative,
    /// Non-negative (`≥ 0`): `Zero ∪ Positive`
    ZeroOrPositive,
    /// Top (`⊤`): any value
    Top,
}

impl Sign {
    /// Check if sign contains negative values.
    pub fn has_negative(&self) -> bool {
        matches!(self, Sign::Negative | Sign::ZeroOrNegative | Sign::Top)
    }

    /// Check if sign contains zero.
    pub fn has_zero(&self) -> bool {
        matches!(self, Sign::Zero | Sign::ZeroOrNegative | Sign::ZeroOrPositive | Sign::Top)
    }

    /// Check if sign contains positive values.
    pub fn has_positive(&self) -> bool {
        matches!(self, Sign::Positive | Sign::ZeroOrPositive | Sign::Top)
    }

    /// Create sign from a concrete value.
    pub fn from_value(v: i64) -> Self {
        match v.cmp(&0) {
            std::cmp::Ordering::Less => Sign::Negative,
            std::cmp::Ordering::Equal => Sign::Zero,
            std::cmp::Ordering::Greater => Sign::Positive,
        }
    }

    /// Concretization membership: is `v` one of the values this sign describes?
    pub fn contains(&self, v: i64) -> bool {
        match v.cmp(&0) {
            std::cmp::Ordering::Less => self.has_negative(),
            std::cmp::Ordering::Equal => self.has_zero(),
            std::cmp::Ordering::Greater => self.has_positive(),
        }
    }

    /// Smallest sign covering the given concrete components.
    ///
    /// `{-, +}` has no exact element and is rounded up to `⊤`.
    fn from_components(negative: bool, zero: bool, positive: bool) -> Sign {
        match (negative, zero, positive) {
            (false, false, false) => Sign::Bottom,
            (true, false, false) => Sign::Negative,
            (false, true, false) => Sign::Zero,
            (false, false, true) => Sign::Positive,
            (true, true, false) => Sign::ZeroOrNegative,
            (false, true, true) => Sign::ZeroOrPositive,
            (true, _, true) => Sign::Top,
        }
    }

    /// Drop zero from the described values (used for `x != 0`).
    pub fn exclude_zero(self) -> Sign {
        match self {
            Sign::Zero => Sign::Bottom,
            Sign::ZeroOrNegative => Sign::Negative,
            Sign::ZeroOrPositive => Sign::Positive,
            other => other,
        }
    }

    /// Addition on signs.
    pub fn add(self, other: Sign) -> Sign {
        use Sign::*;

        match (self, other) {
            (Bottom, _) | (_, Bottom) => Bottom,
            (Top, _) | (_, Top) => Top,

            // Zero is identity
            (Zero, s) | (s, Zero) => s,

            // Same sign: a strict operand keeps the sum strict
            (Positive, Positive) | (Positive, ZeroOrPositive) | (ZeroOrPositive, Positive) => Positive,
            (ZeroOrPositive, ZeroOrPositive) => ZeroOrPositive,
            (Negative, Negative) | (Negative, ZeroOrNegative) | (ZeroOrNegative, Negative) => Negative,
            (ZeroOrNegative, ZeroOrNegative) => ZeroOrNegative,

            // Opposite signs: uncertain
            (Positive | ZeroOrPositive, Negative | ZeroOrNegative)
            | (Negative | ZeroOrNegative, Positive | ZeroOrPositive) => Top,
        }
    }

    /// Subtraction on signs.
    pub fn sub(self, other: Sign) -> Sign {
        self.add(other.neg())
    }

    /// Multiplication on signs.
    pub fn mul(self, other: Sign) -> Sign {
        use Sign::*;

        match (self, other) {
            (Bottom, _) | (_, Bottom) => Bottom,

            // Zero absorbs, even against an unknown sign
            (Zero, _) | (_, Zero) => Zero,

            (Top, _) | (_, Top) => Top,

            // A positive factor preserves the sign, a negative one flips it
            (Positive, s) | (s, Positive) => s,
            (Negative, s) | (s, Negative) => s.neg(),

            (ZeroOrPositive, ZeroOrPositive) | (ZeroOrNegative, ZeroOrNegative) => ZeroOrPositive,
            (ZeroOrPositive, ZeroOrNegative) | (ZeroOrNegative, ZeroOrPositive) => ZeroOrNegative,
        }
    }

    /// Integer (truncating) division on signs.
    ///
    /// Only an exactly-zero divisor yields `⊥`. A divisor that merely may be
    /// zero contributes its non-zero part, so the result stays a sound value.
    /// Truncation can produce zero (`1 / 2 = 0`), hence strict operand signs
    /// only give non-strict quotients.
    pub fn div(self, other: Sign) -> Sign {
        use Sign::*;

        match (self, other) {
            (Bottom, _) | (_, Bottom) => Bottom,
            (_, Zero) => Bottom,
            (Zero, _) => Zero,
            (Top, _) | (_, Top) => Top,

            (Positive | ZeroOrPositive, Positive | ZeroOrPositive)
            | (Negative | ZeroOrNegative, Negative | ZeroOrNegative) => ZeroOrPositive,
            (Positive | ZeroOrPositive, Negative | ZeroOrNegative)
            | (Negative | ZeroOrNegative, Positive | ZeroOrPositive) => ZeroOrNegative,
        }
    }

    /// Negation on signs.
    pub fn neg(self) -> Sign {
        use Sign::*;
        match self {
            Bottom => Bottom,
            Negative => Positive,
            Zero => Zero,
            Positive => Negative,
            ZeroOrNegative => ZeroOrPositive,
            ZeroOrPositive => ZeroOrNegative,
            Top => Top,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sign::Bottom => write!(f, "⊥"),
            Sign::Negative => write!(f, "-"),
            Sign::Zero => write!(f, "0"),
            Sign::Positive => write!(f, "+"),
            Sign::ZeroOrNegative => write!(f, "≤0"),
            Sign::ZeroOrPositive => write!(f, "≥0"),
            Sign::Top => write!(f, "⊤"),
        }
    }
}

impl AbstractDomain for Sign {
    fn bottom() -> Self {
        Sign::Bottom
    }

    fn top() -> Self {
        Sign::Top
    }

    fn is_bottom(&self) -> bool {
        *self == Sign::Bottom
    }

    fn is_top(&self) -> bool {
        *self == Sign::Top
    }

    fn le(&self, other: &Self) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Sign::Bottom, _) => true,
            (_, Sign::Top) => true,
            (Sign::Negative, Sign::ZeroOrNegative) => true,
            (Sign::Positive, Sign::ZeroOrPositive) => true,
            (Sign::Zero, Sign::ZeroOrNegative | Sign::ZeroOrPositive) => true,
            _ => false,
        }
    }

    fn join(&self, other: &Self) -> Self {
        Sign::from_components(
            self.has_negative() || other.has_negative(),
            self.has_zero() || other.has_zero(),
            self.has_positive() || other.has_positive(),
        )
    }

    fn meet(&self, other: &Self) -> Self {
        Sign::from_components(
            self.has_negative() && other.has_negative(),
            self.has_zero() && other.has_zero(),
            self.has_positive() && other.has_positive(),
        )
    }

    fn widen(&self, other: &Self) -> Self {
        // Finite height: join already terminates
        self.join(other)
    }
}

impl NonRelationalValue for Sign {
    fn from_constant(value: i64) -> Self {
        Sign::from_value(value)
    }

    fn eval_neg(&self) -> Self {
        self.neg()
    }

    fn eval_binary(op: BinaryOp, left: &Self, right: &Self) -> Self {
        match op {
            BinaryOp::Add => left.add(*right),
            BinaryOp::Sub => left.sub(*right),
            BinaryOp::Mul => left.mul(*right),
            BinaryOp::Div => left.div(*right),
        }
    }

    fn assume_comparison(op: CmpOp, left: &Self, right: &Self) -> (Self, Self) {
        use Sign::*;

        match op {
            CmpOp::Lt => {
                // l < r ≤ 0 forces l < 0; 0 ≤ l < r forces r > 0
                let l = if right.le(&ZeroOrNegative) { left.meet(&Negative) } else { *left };
                let r = if left.le(&ZeroOrPositive) { right.meet(&Positive) } else { *right };
                (l, r)
            }
            CmpOp::Le => {
                let l = if right.le(&Negative) {
                    left.meet(&Negative)
                } else if right.le(&ZeroOrNegative) {
                    left.meet(&ZeroOrNegative)
                } else {
                    *left
                };
                let r = if left.le(&Positive) {
                    right.meet(&Positive)
                } else if left.le(&ZeroOrPositive) {
                    right.meet(&ZeroOrPositive)
                } else {
                    *right
                };
                (l, r)
            }
            CmpOp::Gt | CmpOp::Ge => {
                let (r, l) = Self::assume_comparison(op.flip(), right, left);
                (l, r)
            }
            CmpOp::Eq => {
                let both = left.meet(right);
                (both, both)
            }
            CmpOp::Neq => {
                let l = if *right == Zero { left.exclude_zero() } else { *left };
                let r = if *left == Zero { right.exclude_zero() } else { *right };
                (l, r)
            }
        }
    }

    fn satisfies_comparison(op: CmpOp, left: &Self, right: &Self) -> Satisfiability {
        use Sign::*;

        if left.is_bottom() || right.is_bottom() {
            return Satisfiability::Unknown;
        }

        match op {
            CmpOp::Lt => {
                if (left.le(&Negative) && right.le(&ZeroOrPositive)) || (left.le(&ZeroOrNegative) && right.le(&Positive)) {
                    Satisfiability::Satisfied
                } else if left.le(&ZeroOrPositive) && right.le(&ZeroOrNegative) {
                    Satisfiability::Unsatisfied
                } else {
                    Satisfiability::Unknown
                }
            }
            CmpOp::Le => {
                if left.le(&ZeroOrNegative) && right.le(&ZeroOrPositive) {
                    Satisfiability::Satisfied
                } else if (left.le(&Positive) && right.le(&ZeroOrNegative))
                    || (left.le(&ZeroOrPositive) && right.le(&Negative))
                {
                    Satisfiability::Unsatisfied
                } else {
                    Satisfiability::Unknown
                }
            }
            CmpOp::Gt | CmpOp::Ge => Self::satisfies_comparison(op.flip(), right, left),
            CmpOp::Eq => {
                if *left == Zero && *right == Zero {
                    Satisfiability::Satisfied
                } else if left.meet(right).is_bottom() {
                    Satisfiability::Unsatisfied
                } else {
                    Satisfiability::Unknown
                }
            }
            CmpOp::Neq => Self::satisfies_comparison(CmpOp::Eq, left, right).negate(),
        }
    }
}

impl Representable for Sign {
    fn representation(&self) -> Representation {
        match self {
            Sign::Top => Representation::Top,
            Sign::Bottom => Representation::Bottom,
            other => Representation::value(other),
        }
    }
}
