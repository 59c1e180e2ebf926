//! Map-fusion equivalence stress inputs for equality-saturation solvers.
//!
//! The generator emits pairs of lambda terms that are provably equal under
//! beta/eta and the functor law; the sweep controller feeds them to external
//! solver binaries across the (maps, half_chain, arity) lattice and prunes
//! dominated regions under a monotonic-failure heuristic.

mod expr;
mod generate;
mod normalize;
mod solver;
mod sweep;

pub use expr::Expr;
pub use generate::{Encoding, GeneratedPair, NameAlloc, Params, generate};
pub use normalize::normalize;
pub use solver::{Invocation, Outcome, ProcessRunner, Runner, Variant, Verdict};
pub use sweep::{AxisStatus, Point, Record, SweepConfig, run_sweep, trace_file_name};

use std::fmt;

pub type BenchResult<T> = Result<T, BenchError>;

#[derive(Debug)]
pub enum BenchError {
    /// Rejected generator parameters; never silently clamped.
    InvalidParameter(String),
    /// The reference parser rejected an expression string.
    Parse(String),
    /// A solver trace file could not be interpreted.
    Trace(String),
    /// The reference normalizer ran out of fuel.
    Normalize(String),
    Io(std::io::Error),
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Trace(msg) => write!(f, "trace error: {msg}"),
            Self::Normalize(msg) => write!(f, "normalize error: {msg}"),
            Self::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for BenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BenchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
