//! Abstract transfer functions for program statements.

use log::{debug, info, warn};

use crate::domain::AbstractDomain;
use crate::expr::Stmt;
use crate::fixpoint::{FixpointConfig, FixpointEngine};
use crate::numeric::{NumericDomain, Satisfiability};

/// Abstract transfer function for statements.
///
/// Implements abstract semantics: ⟦stmt⟧♯: D → D
pub trait TransferFunction<D: AbstractDomain> {
    /// Apply transfer function: ⟦stmt⟧♯(state)
    fn apply(&self, state: &D, stmt: &Stmt) -> D;
}

/// Transfer function for numeric domains.
///
/// Loops are analyzed in place: the loop-head invariant is computed with a
/// [`FixpointEngine`] and the loop exits under the negated condition.
#[derive(Debug, Clone, Default)]
pub struct NumericTransferFunction {
    pub config: FixpointConfig,
}

impl NumericTransferFunction {
    pub fn new(config: FixpointConfig) -> Self {
        Self { config }
    }
}

impl<D: NumericDomain> TransferFunction<D> for NumericTransferFunction {
    fn apply(&self, state: &D, stmt: &Stmt) -> D {
        if state.is_bottom() {
            return state.clone();
        }

        match stmt {
            Stmt::Skip => state.clone(),

            Stmt::Assign(var, expr) => state.assign(var, expr),

            Stmt::Seq(s1, s2) => {
                let s = self.apply(state, s1);
                self.apply(&s, s2)
            }

            Stmt::If(pred, then_stmt, else_stmt) => {
                let then_result = self.apply(&state.assume(pred), then_stmt);
                let else_result = self.apply(&state.assume(&pred.negate()), else_stmt);
                then_result.join(&else_result)
            }

            Stmt::While(pred, body) => {
                let engine = FixpointEngine::new(self.config.clone());
                let invariant = engine.lfp(state.clone(), |s: &D| self.apply(&s.assume(pred), body));
                debug!("Loop invariant for while ({}): {:?}", pred, invariant);
                invariant.assume(&pred.negate())
            }

            Stmt::Assert(pred) => {
                match state.satisfies(pred) {
                    Satisfiability::Satisfied => debug!("assert({}) holds", pred),
                    Satisfiability::Unknown => info!("assert({}) may fail", pred),
                    Satisfiability::Unsatisfied => warn!("assert({}) always fails", pred),
                }
                state.assume(pred)
            }

            Stmt::Assume(pred) => state.assume(pred),

            Stmt::Havoc(var) => state.forget(var),
        }
    }
}
