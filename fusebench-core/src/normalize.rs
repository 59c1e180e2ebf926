//! Reference normalizer for the generated terms: beta, eta, and map-fusion
//! rewriting to fixpoint, then canonical alpha renaming.
//!
//! This is test/check support only. It is not a solver; it exists so the
//! structural-equivalence guarantee of the generator can be witnessed
//! mechanically on small instances.

use crate::{BenchError, BenchResult, expr::Expr, generate::NameAlloc};

/// Generated terms are linear in their binders so every rewrite shrinks some
/// measure; the fuel only guards hand-written input.
const FUEL: usize = 100_000;

/// Reduce to normal form under beta, eta, and the functor law, with binders
/// canonically renamed so normal forms compare with `==`.
pub fn normalize(e: &Expr) -> BenchResult<Expr> {
    let names = &mut NameAlloc::new("_");
    let mut current = e.clone();
    for _ in 0..FUEL {
        match step(&current, names) {
            Some(next) => current = next,
            None => return Ok(alpha_rename(&current)),
        }
    }
    Err(BenchError::Normalize(format!(
        "no normal form within {FUEL} steps for {e}"
    )))
}

/// One leftmost-outermost rewrite, or `None` at normal form.
fn step(e: &Expr, names: &mut NameAlloc) -> Option<Expr> {
    // beta
    if let Expr::App(f, a) = e {
        if let Expr::Lam(x, body) = &**f {
            return Some(subst(body, x, a, names));
        }
    }
    // eta
    if let Expr::Lam(x, body) = e {
        if let Expr::App(f, a) = &**body {
            if matches!(&**a, Expr::Var(v) if v == x) && !f.free_vars().contains(x) {
                return Some((**f).clone());
            }
        }
    }
    // map-fusion: (app (app map f) (app (app map g) e)) => map (f . g) e
    if let Expr::App(mapped_f, inner) = e {
        if let (Some(f), Expr::App(mapped_g, arg)) = (as_mapped(mapped_f), &**inner) {
            if let Some(g) = as_mapped(mapped_g) {
                let x = names.fresh();
                let fused = Expr::lam(
                    x.clone(),
                    Expr::app(f.clone(), Expr::app(g.clone(), Expr::var(x))),
                );
                return Some(Expr::app(
                    Expr::app(Expr::sym("map"), fused),
                    (**arg).clone(),
                ));
            }
        }
    }
    match e {
        Expr::Var(_) | Expr::Sym(_) => None,
        Expr::Lam(x, b) => step(b, names).map(|b| Expr::lam(x.clone(), b)),
        Expr::App(f, a) => step(f, names)
            .map(|f| Expr::app(f, (**a).clone()))
            .or_else(|| step(a, names).map(|a| Expr::app((**f).clone(), a))),
    }
}

fn as_mapped(e: &Expr) -> Option<&Expr> {
    if let Expr::App(m, f) = e {
        if matches!(&**m, Expr::Sym(s) if s == "map") {
            return Some(f);
        }
    }
    None
}

/// Capture-avoiding `body[name := arg]`.
fn subst(body: &Expr, name: &str, arg: &Expr, names: &mut NameAlloc) -> Expr {
    match body {
        Expr::Var(v) if v == name => arg.clone(),
        Expr::Var(_) | Expr::Sym(_) => body.clone(),
        Expr::App(f, a) => Expr::app(subst(f, name, arg, names), subst(a, name, arg, names)),
        Expr::Lam(x, _) if x == name => body.clone(),
        Expr::Lam(x, b) => {
            if arg.free_vars().contains(x) {
                let fresh = names.fresh();
                let renamed = subst(b, x, &Expr::var(fresh.clone()), names);
                Expr::lam(fresh, subst(&renamed, name, arg, names))
            } else {
                Expr::lam(x.clone(), subst(b, name, arg, names))
            }
        }
    }
}

/// Rename binders to `x1, x2, ..` in preorder; alpha-equal terms map to
/// identical trees.
fn alpha_rename(e: &Expr) -> Expr {
    fn go(e: &Expr, counter: &mut u32, env: &mut Vec<(String, String)>) -> Expr {
        match e {
            Expr::Var(v) => {
                let renamed = env
                    .iter()
                    .rev()
                    .find(|(old, _)| old == v)
                    .map_or_else(|| v.clone(), |(_, new)| new.clone());
                Expr::Var(renamed)
            }
            Expr::Sym(s) => Expr::sym(s.clone()),
            Expr::App(f, a) => Expr::app(go(f, counter, env), go(a, counter, env)),
            Expr::Lam(x, b) => {
                *counter += 1;
                let fresh = format!("x{counter}");
                env.push((x.clone(), fresh.clone()));
                let b = go(b, counter, env);
                env.pop();
                Expr::lam(fresh, b)
            }
        }
    }
    go(e, &mut 0, &mut Vec::new())
}

#[cfg(test)]
mod test {
    use super::normalize;
    use crate::expr::Expr;
    use expect_test::expect;

    fn norm(s: &str) -> String {
        normalize(&Expr::parse(s).unwrap()).unwrap().to_string()
    }

    #[test]
    fn beta() {
        assert_eq!(norm("(app (lam a (var a)) f1)"), "f1");
        assert_eq!(
            norm("(app (lam a (app (var a) f2)) f1)"),
            "(app f1 f2)"
        );
    }

    #[test]
    fn eta() {
        assert_eq!(norm("(lam a (app f1 (var a)))"), "f1");
        // not eta: the bound variable occurs in the function position
        assert_eq!(
            norm("(lam a (app (app f1 (var a)) (var a)))"),
            "(lam x1 (app (app f1 (var x1)) (var x1)))"
        );
    }

    #[test]
    fn map_fusion() {
        expect!["(app (app map (lam x1 (app f1 (app f2 (var x1))))) g)"]
            .assert_eq(&norm("(app (app map f1) (app (app map f2) g))"));
    }

    #[test]
    fn capture_avoided() {
        // substituting (var b) under a lam binding b must rename the binder
        let e = Expr::parse("(app (lam a (lam b (app (var b) (var a)))) (var b))").unwrap();
        let normalized = normalize(&e).unwrap().to_string();
        assert_eq!(normalized, "(lam x1 (app (var x1) (var b)))");
    }

    #[test]
    fn alpha_renaming_is_canonical() {
        let a = norm("(lam p (lam q (app (var p) (var q))))");
        let b = norm("(lam u (lam v (app (var u) (var v))))");
        assert_eq!(a, b);
        assert_eq!(a, "(lam x1 (lam x2 (app (var x1) (var x2))))");
    }
}
