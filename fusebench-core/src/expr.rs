//! Lambda term tree and its fully parenthesized prefix wire format.

use crate::{BenchError, BenchResult};
use std::collections::BTreeSet;
use std::fmt;

/// `Var` is a bound occurrence and must be scoped by an enclosing `Lam` with
/// the same binder name. `Sym` is an externally-defined constant (`map`,
/// `f3`, `p1`) that the consuming solver is expected to know about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Var(String),
    Lam(String, Box<Expr>),
    App(Box<Expr>, Box<Expr>),
    Sym(String),
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }
    pub fn lam(binder: impl Into<String>, body: Self) -> Self {
        Self::Lam(binder.into(), Box::new(body))
    }
    pub fn app(f: Self, arg: Self) -> Self {
        Self::App(Box::new(f), Box::new(arg))
    }
    pub fn sym(name: impl Into<String>) -> Self {
        Self::Sym(name.into())
    }

    pub fn size(&self) -> usize {
        match self {
            Self::Var(_) | Self::Sym(_) => 1,
            Self::Lam(_, b) => b.size() + 1,
            Self::App(f, a) => f.size() + a.size() + 1,
        }
    }

    /// `Var` names not bound by any enclosing `Lam`. `Sym`s do not count;
    /// a well-formed generated term has no free vars at all.
    pub fn free_vars(&self) -> BTreeSet<String> {
        fn go(e: &Expr, bound: &mut Vec<String>, out: &mut BTreeSet<String>) {
            match e {
                Expr::Var(v) => {
                    if !bound.iter().any(|b| b == v) {
                        out.insert(v.clone());
                    }
                }
                Expr::Sym(_) => {}
                Expr::App(f, a) => {
                    go(f, bound, out);
                    go(a, bound, out);
                }
                Expr::Lam(x, b) => {
                    bound.push(x.clone());
                    go(b, bound, out);
                    bound.pop();
                }
            }
        }
        let mut out = BTreeSet::new();
        go(self, &mut Vec::new(), &mut out);
        out
    }

    /// Every distinct `Sym` name occurring in the term.
    pub fn syms(&self) -> BTreeSet<String> {
        fn go(e: &Expr, out: &mut BTreeSet<String>) {
            match e {
                Expr::Var(_) => {}
                Expr::Sym(s) => {
                    out.insert(s.clone());
                }
                Expr::App(f, a) => {
                    go(f, out);
                    go(a, out);
                }
                Expr::Lam(_, b) => go(b, out),
            }
        }
        let mut out = BTreeSet::new();
        go(self, &mut out);
        out
    }

    /// Binder names of every `Lam` in preorder, duplicates preserved.
    pub fn binders(&self) -> Vec<String> {
        fn go(e: &Expr, out: &mut Vec<String>) {
            match e {
                Expr::Var(_) | Expr::Sym(_) => {}
                Expr::App(f, a) => {
                    go(f, out);
                    go(a, out);
                }
                Expr::Lam(x, b) => {
                    out.push(x.clone());
                    go(b, out);
                }
            }
        }
        let mut out = Vec::new();
        go(self, &mut out);
        out
    }

    /// Parse the wire format back into a tree. Only needed by the reference
    /// normalizer and the `check` surface; the generator never round-trips.
    pub fn parse(s: &str) -> BenchResult<Self> {
        let tokens = tokenize(s)?;
        let (expr, rest) = assemble(&tokens)?;
        if rest.is_empty() {
            Ok(expr)
        } else {
            Err(BenchError::Parse("trailing tokens after expression".into()))
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(x) => write!(f, "(var {x})"),
            Self::Lam(x, b) => write!(f, "(lam {x} {b})"),
            Self::App(l, r) => write!(f, "(app {l} {r})"),
            Self::Sym(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Token<'a> {
    LParen,
    RParen,
    Ident(&'a str),
}

fn tokenize(s: &str) -> BenchResult<Vec<Token<'_>>> {
    let is_ident = |c: char| c.is_alphanumeric() || c == '$' || c == '_';
    let mut tokens = Vec::new();
    let mut rest = s;
    while let Some(c) = rest.chars().next() {
        if c == '(' {
            tokens.push(Token::LParen);
            rest = &rest[1..];
        } else if c == ')' {
            tokens.push(Token::RParen);
            rest = &rest[1..];
        } else if c.is_whitespace() {
            rest = rest.trim_start();
        } else if is_ident(c) {
            let end = rest.find(|c| !is_ident(c)).unwrap_or(rest.len());
            tokens.push(Token::Ident(&rest[..end]));
            rest = &rest[end..];
        } else {
            return Err(BenchError::Parse(format!("invalid character {c:?}")));
        }
    }
    Ok(tokens)
}

fn assemble<'a, 'b>(tk: &'b [Token<'a>]) -> BenchResult<(Expr, &'b [Token<'a>])> {
    match tk {
        [Token::Ident(x), rest @ ..] => Ok((Expr::sym(*x), rest)),
        [Token::LParen, Token::Ident("var"), Token::Ident(x), Token::RParen, rest @ ..] => {
            Ok((Expr::var(*x), rest))
        }
        [Token::LParen, Token::Ident("lam"), Token::Ident(x), rest @ ..] => {
            let (body, rest) = assemble(rest)?;
            let [Token::RParen, rest @ ..] = rest else {
                return Err(BenchError::Parse("lam lacks closing paren".into()));
            };
            Ok((Expr::lam(*x, body), rest))
        }
        [Token::LParen, Token::Ident("app"), rest @ ..] => {
            let (l, rest) = assemble(rest)?;
            let (r, rest) = assemble(rest)?;
            let [Token::RParen, rest @ ..] = rest else {
                return Err(BenchError::Parse("app lacks closing paren".into()));
            };
            Ok((Expr::app(l, r), rest))
        }
        _ => Err(BenchError::Parse("expected expression".into())),
    }
}

#[cfg(test)]
mod test {
    use super::Expr;

    #[test]
    fn display_round_trip() {
        for s in [
            "map",
            "(var $1)",
            "(app map f1)",
            "(lam $1 (app f1 (app f2 (var $1))))",
            "(lam fn2 (lam fn1 (lam p1 (app (var fn1) (var p1)))))",
        ] {
            assert_eq!(Expr::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn parse_rejects_malformed() {
        for s in ["", "(app f1)", "(lam x", "(var)", "f1)", "(foo x y)", "f1 f2"] {
            Expr::parse(s).expect_err(s);
        }
    }

    #[test]
    fn scope_helpers() {
        let e = Expr::parse("(lam x (app (var x) (app f1 (var y))))").unwrap();
        assert_eq!(
            e.free_vars().into_iter().collect::<Vec<_>>(),
            vec!["y".to_string()]
        );
        assert_eq!(e.syms().into_iter().collect::<Vec<_>>(), vec!["f1".to_string()]);
        assert_eq!(e.binders(), vec!["x".to_string()]);
        assert_eq!(e.size(), 6);
    }
}
