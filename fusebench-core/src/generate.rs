//! Builder primitives and the paired lhs/rhs term generators.
//!
//! Both outputs of [`generate`] are equal under beta/eta plus the functor law
//! `map(f) . map(g) = map(f . g)`; the lhs nests all `map` layers around one
//! composed chain while the rhs maps each half-chain separately and composes
//! the results. The distance between the two shapes is what stresses the
//! consuming solver.

use crate::{BenchError, BenchResult, expr::Expr};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Term encoding selector, forwarded to the solver as a token.
///
/// `Slot` leaves the chained functions and parameter placeholders as free
/// symbols and derives binder names from the `$` counter. `Named` produces a
/// fully closed term: binder names use the `s` counter internally, and every
/// function/parameter name is bound by a deterministic outer lambda chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encoding {
    Slot,
    Named,
}

impl Encoding {
    pub fn token(self) -> &'static str {
        match self {
            Self::Slot => "slot",
            Self::Named => "named",
        }
    }

    fn binder_prefix(self) -> &'static str {
        match self {
            Self::Slot => "$",
            Self::Named => "s",
        }
    }

    fn function(self, index: u32) -> Expr {
        match self {
            Self::Slot => Expr::sym(format!("f{index}")),
            Self::Named => Expr::var(format!("fn{index}")),
        }
    }

    fn parameter(self, index: u32) -> Expr {
        match self {
            Self::Slot => Expr::sym(format!("p{index}")),
            Self::Named => Expr::var(format!("p{index}")),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Encoding {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "slot" => Ok(Self::Slot),
            "named" => Ok(Self::Named),
            other => Err(format!("unknown encoding {other:?}, expected slot or named")),
        }
    }
}

/// Fresh binder names for one generation call.
///
/// The counter is strictly increasing and the allocator is created per
/// [`generate`] call and shared across that call's lhs and rhs builds, so no
/// binder name ever repeats within a generated pair. It is deliberately not a
/// process-wide singleton; independent calls restart from 1.
pub struct NameAlloc {
    prefix: &'static str,
    next: u32,
}

impl NameAlloc {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, next: 0 }
    }

    pub fn fresh(&mut self) -> String {
        self.next += 1;
        format!("{}{}", self.prefix, self.next)
    }
}

/// Validated sweep-point parameters.
///
/// `maps` (N) is the `map` nesting depth, `half_chain` (M) the half-width of
/// the composed function chain over indices `1..=2M`, `arity` (O) the number
/// of parameter placeholders each chained function is applied to. N and O may
/// be zero; M must be positive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Params {
    maps: u32,
    half_chain: u32,
    arity: u32,
}

impl Params {
    pub fn new(maps: u32, half_chain: u32, arity: u32) -> BenchResult<Self> {
        if half_chain == 0 {
            return Err(BenchError::InvalidParameter(
                "half_chain must be at least 1, a chain needs at least one element".into(),
            ));
        }
        Ok(Self { maps, half_chain, arity })
    }

    pub fn maps(self) -> u32 {
        self.maps
    }
    pub fn half_chain(self) -> u32 {
        self.half_chain
    }
    pub fn arity(self) -> u32 {
        self.arity
    }

    fn low_half(self) -> RangeInclusive<u32> {
        1..=self.half_chain
    }
    fn high_half(self) -> RangeInclusive<u32> {
        self.half_chain + 1..=2 * self.half_chain
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedPair {
    pub lhs: Expr,
    pub rhs: Expr,
}

/// `(lam x (app a (app b (var x))))` for a fresh `x`: "a after b".
fn compose(a: Expr, b: Expr, names: &mut NameAlloc) -> Expr {
    let x = names.fresh();
    Expr::lam(x.clone(), Expr::app(a, Expr::app(b, Expr::var(x))))
}

/// `depth` nested `(app map _)` wrappings; identity at depth 0.
fn map_over(depth: u32, e: Expr) -> Expr {
    (0..depth).fold(e, |acc, _| Expr::app(Expr::sym("map"), acc))
}

/// `f` applied to `p1..p_arity` in ascending order; no-op at arity 0.
fn apply_args(f: Expr, arity: u32, encoding: Encoding) -> Expr {
    (1..=arity).fold(f, |acc, i| Expr::app(acc, encoding.parameter(i)))
}

/// Chained application of the function symbols at `indices`, lowest index
/// applied first.
///
/// At arity 0 this is a fold of [`compose`], one fresh binder per link and
/// none at all for a single-element chain. At arity > 0 every symbol is
/// pre-applied to the parameter placeholders and the whole chain becomes one
/// fresh-bound function threading its input through each application; the two
/// shapes agree on application order.
fn chain(
    indices: RangeInclusive<u32>,
    arity: u32,
    encoding: Encoding,
    names: &mut NameAlloc,
) -> Expr {
    assert!(!indices.is_empty(), "a chain needs at least one element");
    if arity == 0 {
        let mut it = indices.map(|i| encoding.function(i));
        let first = it.next().unwrap();
        it.fold(first, |acc, f| compose(f, acc, names))
    } else {
        let x = names.fresh();
        let body = indices.fold(Expr::var(x.clone()), |acc, i| {
            Expr::app(apply_args(encoding.function(i), arity, encoding), acc)
        });
        Expr::lam(x, body)
    }
}

/// One chain over the full `1..=2M` index range, split at M by its top-level
/// composition binder, inside N `map` layers.
fn generate_lhs(params: Params, encoding: Encoding, names: &mut NameAlloc) -> Expr {
    let low = chain(params.low_half(), params.arity, encoding, names);
    let high = chain(params.high_half(), params.arity, encoding, names);
    map_over(params.maps, compose(low, high, names))
}

/// The two half-chains mapped separately, then composed in the same operand
/// order as the lhs.
fn generate_rhs(params: Params, encoding: Encoding, names: &mut NameAlloc) -> Expr {
    let low = map_over(params.maps, chain(params.low_half(), params.arity, encoding, names));
    let high = map_over(params.maps, chain(params.high_half(), params.arity, encoding, names));
    compose(low, high, names)
}

/// Close over every free function/parameter name: outermost-first
/// `fn2M .. fn1`, then `pO .. p1`. `map` stays free.
fn close_named(e: Expr, params: Params) -> Expr {
    let e = (1..=params.arity).fold(e, |acc, i| Expr::lam(format!("p{i}"), acc));
    (1..=2 * params.half_chain).fold(e, |acc, i| Expr::lam(format!("fn{i}"), acc))
}

/// Produce the observationally-equivalent (lhs, rhs) pair for one sweep
/// point. Deterministic: the allocator is call-scoped and the lhs is always
/// built first.
pub fn generate(params: Params, encoding: Encoding) -> GeneratedPair {
    let names = &mut NameAlloc::new(encoding.binder_prefix());
    let lhs = generate_lhs(params, encoding, names);
    let rhs = generate_rhs(params, encoding, names);
    match encoding {
        Encoding::Slot => GeneratedPair { lhs, rhs },
        Encoding::Named => GeneratedPair {
            lhs: close_named(lhs, params),
            rhs: close_named(rhs, params),
        },
    }
}

#[cfg(test)]
mod test {
    use super::{Encoding, GeneratedPair, Params, generate};
    use crate::normalize::normalize;
    use expect_test::{Expect, expect};
    use itertools::Itertools as _;
    use proptest::prelude::*;

    fn check(maps: u32, half_chain: u32, arity: u32, encoding: Encoding, expected: Expect) {
        let pair = generate(Params::new(maps, half_chain, arity).unwrap(), encoding);
        expected.assert_eq(&format!("{}\n{}", pair.lhs, pair.rhs));
    }

    #[test]
    fn single_map_single_element_chains() {
        check(
            1,
            1,
            0,
            Encoding::Slot,
            expect![[r"
                (app map (lam $1 (app f1 (app f2 (var $1)))))
                (lam $2 (app (app map f1) (app (app map f2) (var $2))))"]],
        );
    }

    #[test]
    fn no_maps_splits_at_half_chain() {
        check(
            0,
            2,
            0,
            Encoding::Slot,
            expect![[r"
                (lam $3 (app (lam $1 (app f2 (app f1 (var $1)))) (app (lam $2 (app f4 (app f3 (var $2)))) (var $3))))
                (lam $6 (app (lam $4 (app f2 (app f1 (var $4)))) (app (lam $5 (app f4 (app f3 (var $5)))) (var $6))))"]],
        );
    }

    #[test]
    fn arity_pre_applies_parameters() {
        check(
            1,
            1,
            2,
            Encoding::Slot,
            expect![[r"
                (app map (lam $3 (app (lam $1 (app (app (app f1 p1) p2) (var $1))) (app (lam $2 (app (app (app f2 p1) p2) (var $2))) (var $3)))))
                (lam $6 (app (app map (lam $4 (app (app (app f1 p1) p2) (var $4)))) (app (app map (lam $5 (app (app (app f2 p1) p2) (var $5)))) (var $6))))"]],
        );
    }

    #[test]
    fn named_mode_closes_the_term() {
        check(
            1,
            1,
            1,
            Encoding::Named,
            expect![[r"
                (lam fn2 (lam fn1 (lam p1 (app map (lam s3 (app (lam s1 (app (app (var fn1) (var p1)) (var s1))) (app (lam s2 (app (app (var fn2) (var p1)) (var s2))) (var s3))))))))
                (lam fn2 (lam fn1 (lam p1 (lam s6 (app (app map (lam s4 (app (app (var fn1) (var p1)) (var s4)))) (app (app map (lam s5 (app (app (var fn2) (var p1)) (var s5)))) (var s6)))))))"]],
        );
    }

    #[test]
    fn zero_half_chain_is_rejected() {
        assert!(matches!(
            Params::new(3, 0, 1),
            Err(crate::BenchError::InvalidParameter(_))
        ));
    }

    fn assert_hygienic(pair: &GeneratedPair, params: Params, encoding: Encoding) {
        let allowed: Vec<String> = match encoding {
            Encoding::Slot => std::iter::once("map".to_string())
                .chain((1..=2 * params.half_chain()).map(|i| format!("f{i}")))
                .chain((1..=params.arity()).map(|i| format!("p{i}")))
                .collect(),
            Encoding::Named => vec!["map".to_string()],
        };
        for e in [&pair.lhs, &pair.rhs] {
            assert!(e.free_vars().is_empty(), "unbound vars in {e}");
            for s in e.syms() {
                assert!(allowed.contains(&s), "disallowed free symbol {s} in {e}");
            }
            let binders = e.binders();
            assert_eq!(
                binders.iter().unique().count(),
                binders.len(),
                "binder reused within {e}"
            );
        }
        // counter-derived binders must also be distinct across the pair
        let counted: Vec<String> = [&pair.lhs, &pair.rhs]
            .iter()
            .flat_map(|e| e.binders())
            .filter(|b| b.starts_with('$') || b.starts_with('s'))
            .collect();
        assert_eq!(counted.iter().unique().count(), counted.len());
    }

    proptest! {
        #[test]
        fn hygiene(maps in 0u32..4, half_chain in 1u32..4, arity in 0u32..3, named in any::<bool>()) {
            let encoding = if named { Encoding::Named } else { Encoding::Slot };
            let params = Params::new(maps, half_chain, arity).unwrap();
            assert_hygienic(&generate(params, encoding), params, encoding);
        }

        #[test]
        fn determinism(maps in 0u32..4, half_chain in 1u32..4, arity in 0u32..3, named in any::<bool>()) {
            let encoding = if named { Encoding::Named } else { Encoding::Slot };
            let params = Params::new(maps, half_chain, arity).unwrap();
            let a = generate(params, encoding);
            let b = generate(params, encoding);
            assert_eq!(a.lhs.to_string(), b.lhs.to_string());
            assert_eq!(a.rhs.to_string(), b.rhs.to_string());
        }
    }

    #[test]
    fn concrete_normal_form() {
        // one map layer over single-symbol half-chains: both sides collapse
        // to the mapped composed chain
        let pair = generate(Params::new(1, 1, 0).unwrap(), Encoding::Slot);
        let nf = normalize(&pair.lhs).unwrap();
        assert_eq!(nf, normalize(&pair.rhs).unwrap());
        expect!["(app map (lam x1 (app f1 (app f2 (var x1)))))"].assert_eq(&nf.to_string());
    }

    #[test]
    fn both_sides_share_a_normal_form() {
        for maps in 0..=2 {
            for half_chain in 1..=2 {
                for arity in 0..=2 {
                    for encoding in [Encoding::Slot, Encoding::Named] {
                        let params = Params::new(maps, half_chain, arity).unwrap();
                        let pair = generate(params, encoding);
                        let l = normalize(&pair.lhs).unwrap();
                        let r = normalize(&pair.rhs).unwrap();
                        assert_eq!(l, r, "lhs/rhs diverge at {params:?} {encoding}");
                    }
                }
            }
        }
    }
}
