//! The lattice contract shared by every domain in the crate.

use std::fmt::Debug;

/// A lattice of abstract values.
///
/// Values over-approximate sets of concrete states; `⊑` is inclusion of
/// those sets. Operations take `&self` and build a new value.
///
/// Implementations must make `⊑` a preorder with `⊥ ⊑ a ⊑ ⊤` for every `a`,
/// and `join`/`meet` must be upper/lower bounds of their operands.
pub trait AbstractDomain: Clone + Debug + PartialEq + Sized {
    /// The value describing no state at all.
    fn bottom() -> Self;

    /// The value describing every state.
    fn top() -> Self;

    fn is_bottom(&self) -> bool;

    fn is_top(&self) -> bool;

    /// `self ⊑ other`: every state of `self` is also a state of `other`.
    fn le(&self, other: &Self) -> bool;

    /// `self ⊔ other`, an upper bound of both operands.
    fn join(&self, other: &Self) -> Self;

    /// `self ⊓ other`, a lower bound of both operands.
    fn meet(&self, other: &Self) -> Self;

    /// `self ∇ other`, an upper bound of both operands that stabilizes any
    /// increasing chain `x₀, x₀ ∇ x₁, ...` after finitely many steps.
    fn widen(&self, other: &Self) -> Self;

    /// `self ∆ other`, used to recover precision lost by widening.
    ///
    /// Falls back to [`meet`](AbstractDomain::meet).
    fn narrow(&self, other: &Self) -> Self {
        self.meet(other)
    }

    /// `self ⊑ other` and `other ⊑ self`.
    fn equivalent(&self, other: &Self) -> bool {
        self.le(other) && other.le(self)
    }

    /// Fold `join` over `elems`, starting from `⊥`.
    fn join_many<I>(elems: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        elems.into_iter().fold(Self::bottom(), |acc, e| acc.join(&e))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Check order, bound and commutativity laws on every pair of `samples`.
    pub fn test_lattice_axioms<D: AbstractDomain>(samples: &[D]) {
        let bottom = D::bottom();
        let top = D::top();
        assert!(bottom.is_bottom(), "bottom() is not bottom");
        assert!(top.is_top(), "top() is not top");

        for a in samples {
            // Reflexivity: a ⊑ a
            assert!(a.le(a), "Reflexivity failed for {:?}", a);

            // Bounds: ⊥ ⊑ a ⊑ ⊤
            assert!(bottom.le(a), "Bottom is not below {:?}", a);
            assert!(a.le(&top), "{:?} is not below top", a);

            // Identity: a ⊔ ⊥ = a
            let joined = a.join(&bottom);
            assert!(a.equivalent(&joined), "Join with bottom failed for {:?}", a);

            // Identity: a ⊓ ⊤ = a
            let met = a.meet(&top);
            assert!(a.equivalent(&met), "Meet with top failed for {:?}", a);

            // Widening is an upper bound: a ⊑ (a ∇ b), b ⊑ (a ∇ b)
            for b in samples {
                let widened = a.widen(b);
                assert!(a.le(&widened), "Widening does not preserve order: {:?} ∇ {:?}", a, b);
                assert!(b.le(&widened), "Widening is not above {:?} in {:?} ∇ {:?}", b, a, b);
            }
        }

        for a in samples {
            for b in samples {
                // Commutativity: a ⊔ b = b ⊔ a
                let ab = a.join(b);
                let ba = b.join(a);
                assert!(ab.equivalent(&ba), "Join commutativity failed: {:?}, {:?}", a, b);

                // Commutativity: a ⊓ b = b ⊓ a
                let ab = a.meet(b);
                let ba = b.meet(a);
                assert!(ab.equivalent(&ba), "Meet commutativity failed: {:?}, {:?}", a, b);

                // Join upper bound: a ⊑ (a ⊔ b)
                let joined = a.join(b);
                assert!(a.le(&joined), "Join is not upper bound for {:?}", a);
                assert!(b.le(&joined), "Join is not upper bound for {:?}", b);

                // Meet lower bound: (a ⊓ b) ⊑ a
                let met = a.meet(b);
                assert!(met.le(a), "Meet is not lower bound of {:?}", a);
                assert!(met.le(b), "Meet is not lower bound of {:?}", b);
            }
        }
    }

    /// Check `(a ⊔ b) ⊔ c ≡ a ⊔ (b ⊔ c)` on every triple of `samples`.
    pub fn test_join_associativity<D: AbstractDomain>(samples: &[D]) {
        for a in samples {
            for b in samples {
                for c in samples {
                    let left = a.join(b).join(c);
                    let right = a.join(&b.join(c));
                    assert!(
                        left.equivalent(&right),
                        "Join associativity failed: {:?}, {:?}, {:?}",
                        a,
                        b,
                        c
                    );
                }
            }
        }
    }
}
