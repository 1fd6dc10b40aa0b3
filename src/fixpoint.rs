//! Loop invariants by Kleene iteration, accelerated with widening and
//! refined with narrowing.

use std::marker::PhantomData;

use log::{debug, warn};

use crate::domain::AbstractDomain;

/// Iteration limits of the fixpoint engine.
#[derive(Debug, Clone)]
pub struct FixpointConfig {
    /// Number of plain join steps before widening kicks in.
    pub widening_threshold: usize,
    /// Number of descending steps after the ascending phase has stabilized.
    pub narrowing_iterations: usize,
    /// Hard cap on ascending steps; exceeding it yields `⊤`.
    pub max_iterations: usize,
}

impl Default for FixpointConfig {
    fn default() -> Self {
        Self {
            widening_threshold: 3,
            narrowing_iterations: 2,
            max_iterations: 1000,
        }
    }
}

/// Solves `X = init ⊔ F(X)` over a domain `D`.
#[derive(Debug, Clone)]
pub struct FixpointEngine<D> {
    pub config: FixpointConfig,
    _domain: PhantomData<fn() -> D>,
}

impl<D: AbstractDomain> Default for FixpointEngine<D> {
    fn default() -> Self {
        Self::new(FixpointConfig::default())
    }
}

impl<D: AbstractDomain> FixpointEngine<D> {
    pub fn new(config: FixpointConfig) -> Self {
        Self {
            config,
            _domain: PhantomData,
        }
    }

    /// Post-fixpoint of `X ↦ init ⊔ f(X)`.
    ///
    /// The first `widening_threshold - 1` steps join; later steps widen.
    /// The result is then narrowed at most `narrowing_iterations` times.
    pub fn lfp<F>(&self, init: D, f: F) -> D
    where
        F: Fn(&D) -> D,
    {
        let step = |x: &D| init.join(&f(x));

        let mut x = init.clone();
        let mut iterations = 0;

        loop {
            let next = step(&x);

            if next.le(&x) {
                break;
            }

            iterations += 1;

            if iterations > self.config.max_iterations {
                warn!(
                    "no post-fixpoint within {} iterations, giving up with ⊤",
                    self.config.max_iterations
                );
                return D::top();
            }

            if iterations >= self.config.widening_threshold {
                x = x.widen(&next);
            } else {
                x = x.join(&next);
            }
        }

        debug!("ascending phase stable after {} step(s)", iterations);

        self.narrow(x, step)
    }

    /// Descend from the post-fixpoint `x` while it keeps shrinking.
    fn narrow<F>(&self, mut x: D, step: F) -> D
    where
        F: Fn(&D) -> D,
    {
        for i in 0..self.config.narrowing_iterations {
            let next = x.narrow(&step(&x));

            if x.le(&next) {
                debug!("narrowing stable after {} step(s)", i + 1);
                break;
            }

            x = next;
        }

        x
    }
}
