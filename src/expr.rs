//! Numeric expressions, predicates and statements.

use std::fmt;

use crate::ident::Identifier;

/// Numeric expression (right-hand side of assignments).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NumExpr {
    /// Variable reference
    Var(Identifier),
    /// Constant value
    Const(i64),
    /// Addition: e1 + e2
    Add(Box<NumExpr>, Box<NumExpr>),
    /// Subtraction: e1 - e2
    Sub(Box<NumExpr>, Box<NumExpr>),
    /// Multiplication: e1 * e2
    Mul(Box<NumExpr>, Box<NumExpr>),
    /// Division: e1 / e2
    Div(Box<NumExpr>, Box<NumExpr>),
    /// Negation: -e
    Neg(Box<NumExpr>),
}

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
        }
    }
}

impl NumExpr {
    /// Variable reference
    pub fn var(var: impl Into<Identifier>) -> Self {
        NumExpr::Var(var.into())
    }

    /// Constant value
    pub fn constant(value: i64) -> Self {
        NumExpr::Const(value)
    }

    /// Addition: self + other
    pub fn add(self, other: Self) -> Self {
        NumExpr::Add(Box::new(self), Box::new(other))
    }

    /// Subtraction: self - other
    pub fn sub(self, other: Self) -> Self {
        NumExpr::Sub(Box::new(self), Box::new(other))
    }

    /// Multiplication: self * other
    pub fn mul(self, other: Self) -> Self {
        NumExpr::Mul(Box::new(self), Box::new(other))
    }

    /// Division: self / other
    pub fn div(self, other: Self) -> Self {
        NumExpr::Div(Box::new(self), Box::new(other))
    }

    /// Negation: -self
    pub fn neg(self) -> Self {
        NumExpr::Neg(Box::new(self))
    }

    /// Equality: self == other
    pub fn eq(self, other: Self) -> NumPred {
        NumPred::Eq(self, other)
    }

    /// Inequality: self != other
    pub fn neq(self, other: Self) -> NumPred {
        NumPred::Neq(self, other)
    }

    /// Less than: self < other
    pub fn lt(self, other: Self) -> NumPred {
        NumPred::Lt(self, other)
    }

    /// Less or equal: self <= other
    pub fn le(self, other: Self) -> NumPred {
        NumPred::Le(self, other)
    }

    /// Greater than: self > other
    pub fn gt(self, other: Self) -> NumPred {
        NumPred::Gt(self, other)
    }

    /// Greater or equal: self >= other
    pub fn ge(self, other: Self) -> NumPred {
        NumPred::Ge(self, other)
    }

    /// The variable, if this expression is a bare variable reference.
    pub fn as_var(&self) -> Option<&Identifier> {
        match self {
            NumExpr::Var(v) => Some(v),
            _ => None,
        }
    }

    /// Matches `y - c` where `y` is a variable and `c` a literal constant.
    pub fn as_offset(&self) -> Option<(&Identifier, i64)> {
        match self {
            NumExpr::Sub(lhs, rhs) => match (lhs.as_ref(), rhs.as_ref()) {
                (NumExpr::Var(y), NumExpr::Const(c)) => Some((y, *c)),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for NumExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumExpr::Var(v) => write!(f, "{}", v),
            NumExpr::Const(c) => write!(f, "{}", c),
            NumExpr::Add(e1, e2) => write!(f, "({} + {})", e1, e2),
            NumExpr::Sub(e1, e2) => write!(f, "({} - {})", e1, e2),
            NumExpr::Mul(e1, e2) => write!(f, "({} * {})", e1, e2),
            NumExpr::Div(e1, e2) => write!(f, "({} / {})", e1, e2),
            NumExpr::Neg(e) => write!(f, "-{}", e),
        }
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    /// Operator obtained by swapping the operands: `a < b` is `b > a`.
    pub fn flip(self) -> CmpOp {
        match self {
            CmpOp::Eq => CmpOp::Eq,
            CmpOp::Neq => CmpOp::Neq,
            CmpOp::Lt => CmpOp::Gt,
            CmpOp::Le => CmpOp::Ge,
            CmpOp::Gt => CmpOp::Lt,
            CmpOp::Ge => CmpOp::Le,
        }
    }

    /// Concrete evaluation.
    pub fn holds(self, a: i64, b: i64) -> bool {
        match self {
            CmpOp::Eq => a == b,
            CmpOp::Neq => a != b,
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CmpOp::Eq => write!(f, "=="),
            CmpOp::Neq => write!(f, "!="),
            CmpOp::Lt => write!(f, "<"),
            CmpOp::Le => write!(f, "<="),
            CmpOp::Gt => write!(f, ">"),
            CmpOp::Ge => write!(f, ">="),
        }
    }
}

/// Numeric predicate (boolean condition).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NumPred {
    /// Always true
    True,
    /// Always false
    False,
    /// Equality: e1 == e2
    Eq(NumExpr, NumExpr),
    /// Inequality: e1 != e2
    Neq(NumExpr, NumExpr),
    /// Less than: e1 < e2
    Lt(NumExpr, NumExpr),
    /// Less or equal: e1 <= e2
    Le(NumExpr, NumExpr),
    /// Greater than: e1 > e2
    Gt(NumExpr, NumExpr),
    /// Greater or equal: e1 >= e2
    Ge(NumExpr, NumExpr),
    /// Negation: !p
    Not(Box<NumPred>),
    /// Conjunction: p1 && p2
    And(Box<NumPred>, Box<NumPred>),
    /// Disjunction: p1 || p2
    Or(Box<NumPred>, Box<NumPred>),
}

impl NumPred {
    /// Build a comparison from its operator.
    pub fn compare(op: CmpOp, lhs: NumExpr, rhs: NumExpr) -> Self {
        match op {
            CmpOp::Eq => NumPred::Eq(lhs, rhs),
            CmpOp::Neq => NumPred::Neq(lhs, rhs),
            CmpOp::Lt => NumPred::Lt(lhs, rhs),
            CmpOp::Le => NumPred::Le(lhs, rhs),
            CmpOp::Gt => NumPred::Gt(lhs, rhs),
            CmpOp::Ge => NumPred::Ge(lhs, rhs),
        }
    }

    /// Negation: !p
    pub fn not(self) -> Self {
        NumPred::Not(Box::new(self))
    }

    /// Conjunction: p1 && p2
    pub fn and(self, other: Self) -> Self {
        NumPred::And(Box::new(self), Box::new(other))
    }

    /// Disjunction: p1 || p2
    pub fn or(self, other: Self) -> Self {
        NumPred::Or(Box::new(self), Box::new(other))
    }

    /// View a comparison as `(op, lhs, rhs)`.
    pub fn as_comparison(&self) -> Option<(CmpOp, &NumExpr, &NumExpr)> {
        match self {
            NumPred::Eq(e1, e2) => Some((CmpOp::Eq, e1, e2)),
            NumPred::Neq(e1, e2) => Some((CmpOp::Neq, e1, e2)),
            NumPred::Lt(e1, e2) => Some((CmpOp::Lt, e1, e2)),
            NumPred::Le(e1, e2) => Some((CmpOp::Le, e1, e2)),
            NumPred::Gt(e1, e2) => Some((CmpOp::Gt, e1, e2)),
            NumPred::Ge(e1, e2) => Some((CmpOp::Ge, e1, e2)),
            _ => None,
        }
    }

    /// Logical negation pushed through connectives (De Morgan), so the
    /// result contains no `Not` at the top level.
    pub fn negate(&self) -> NumPred {
        match self {
            NumPred::True => NumPred::False,
            NumPred::False => NumPred::True,
            NumPred::Not(p) => p.as_ref().clone(),
            NumPred::And(p1, p2) => p1.negate().or(p2.negate()),
            NumPred::Or(p1, p2) => p1.negate().and(p2.negate()),
            NumPred::Eq(e1, e2) => NumPred::Neq(e1.clone(), e2.clone()),
            NumPred::Neq(e1, e2) => NumPred::Eq(e1.clone(), e2.clone()),
            NumPred::Lt(e1, e2) => NumPred::Ge(e1.clone(), e2.clone()),
            NumPred::Le(e1, e2) => NumPred::Gt(e1.clone(), e2.clone()),
            NumPred::Gt(e1, e2) => NumPred::Le(e1.clone(), e2.clone()),
            NumPred::Ge(e1, e2) => NumPred::Lt(e1.clone(), e2.clone()),
        }
    }
}

impl fmt::Display for NumPred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumPred::True => write!(f, "true"),
            NumPred::False => write!(f, "false"),
            NumPred::Not(p) => write!(f, "!({})", p),
            NumPred::And(p1, p2) => write!(f, "({} && {})", p1, p2),
            NumPred::Or(p1, p2) => write!(f, "({} || {})", p1, p2),
            NumPred::Eq(e1, e2) => write!(f, "{} == {}", e1, e2),
            NumPred::Neq(e1, e2) => write!(f, "{} != {}", e1, e2),
            NumPred::Lt(e1, e2) => write!(f, "{} < {}", e1, e2),
            NumPred::Le(e1, e2) => write!(f, "{} <= {}", e1, e2),
            NumPred::Gt(e1, e2) => write!(f, "{} > {}", e1, e2),
            NumPred::Ge(e1, e2) => write!(f, "{} >= {}", e1, e2),
        }
    }
}

/// Program statements for abstract interpretation.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Skip (no-op)
    Skip,
    /// Assignment: var := expr
    Assign(Identifier, NumExpr),
    /// Sequence: s1; s2
    Seq(Box<Stmt>, Box<Stmt>),
    /// Conditional: if (pred) then s1 else s2
    If(NumPred, Box<Stmt>, Box<Stmt>),
    /// While loop: while (pred) do s
    While(NumPred, Box<Stmt>),
    /// Assertion: assert(pred)
    Assert(NumPred),
    /// Assumption: assume(pred)
    Assume(NumPred),
    /// Havoc: var := * (non-deterministic)
    Havoc(Identifier),
}

impl Stmt {
    pub fn assign(var: impl Into<Identifier>, expr: NumExpr) -> Self {
        Stmt::Assign(var.into(), expr)
    }

    pub fn if_then_else(pred: NumPred, then_stmt: Stmt, else_stmt: Stmt) -> Self {
        Stmt::If(pred, Box::new(then_stmt), Box::new(else_stmt))
    }

    pub fn while_loop(pred: NumPred, body: Stmt) -> Self {
        Stmt::While(pred, Box::new(body))
    }

    /// Right-nested sequence of statements; empty input yields `Skip`.
    pub fn block(stmts: impl IntoIterator<Item = Stmt>) -> Self {
        let mut stmts: Vec<Stmt> = stmts.into_iter().collect();
        let Some(mut acc) = stmts.pop() else {
            return Stmt::Skip;
        };
        while let Some(stmt) = stmts.pop() {
            acc = Stmt::Seq(Box::new(stmt), Box::new(acc));
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_negate_pushes_through_connectives() {
        let x = || NumExpr::var("x");
        let pred = x().lt(NumExpr::constant(10)).and(x().neq(NumExpr::constant(0)));

        let negated = pred.negate();
        assert_eq!(
            negated,
            x().ge(NumExpr::constant(10)).or(x().eq(NumExpr::constant(0)))
        );
        assert_eq!(NumPred::Not(Box::new(pred.clone())).negate(), pred);
    }

    #[test]
    fn test_cmp_op_flip() {
        for op in [CmpOp::Eq, CmpOp::Neq, CmpOp::Lt, CmpOp::Le, CmpOp::Gt, CmpOp::Ge] {
            for (a, b) in [(-1, 2), (3, 3), (5, -5)] {
                assert_eq!(op.holds(a, b), op.flip().holds(b, a));
            }
        }
    }

    #[test]
    fn test_as_offset() {
        let expr = NumExpr::var("y").sub(NumExpr::constant(1));
        assert_eq!(expr.as_offset(), Some((&Identifier::new("y"), 1)));

        let expr = NumExpr::var("y").sub(NumExpr::var("z"));
        assert_eq!(expr.as_offset(), None);

        let expr = NumExpr::var("y").add(NumExpr::constant(1));
        assert_eq!(expr.as_offset(), None);
    }

    #[test]
    fn test_block() {
        assert!(matches!(Stmt::block(Vec::<Stmt>::new()), Stmt::Skip));
        let block = Stmt::block([
            Stmt::assign("x", NumExpr::constant(0)),
            Stmt::assign("y", NumExpr::constant(1)),
            Stmt::Skip,
        ]);
        match block {
            Stmt::Seq(first, rest) => {
                assert!(matches!(*first, Stmt::Assign(_, NumExpr::Const(0))));
                assert!(matches!(*rest, Stmt::Seq(_, _)));
            }
            other => panic!("expected sequence, got {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        let expr = NumExpr::var("x").add(NumExpr::constant(1)).neg();
        assert_eq!(expr.to_string(), "-(x + 1)");
        let pred = NumExpr::var("x").le(NumExpr::var("y"));
        assert_eq!(pred.to_string(), "x <= y");
    }
}
