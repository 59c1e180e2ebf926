//! Typed boundary to the external equality-solver binaries.
//!
//! A solver is an opaque process taking `lhs rhs encoding_token trace_path`
//! as discrete arguments and writing a row-oriented trace ending in a found
//! flag. This module never builds a shell command line; the expression
//! strings are passed as argv entries.

use crate::{BenchError, BenchResult, generate::Encoding};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

/// One named solver configuration: which binary to run and which term
/// encoding it consumes.
#[derive(Clone, Debug)]
pub struct Variant {
    pub label: String,
    pub binary: PathBuf,
    pub encoding: Encoding,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Found,
    NotFound,
    /// Killed at the wall-clock deadline. Treated as not-found for pruning,
    /// never retried.
    Timeout,
    /// Nonzero exit. Distinguished in records, identical for pruning.
    Crash,
}

#[derive(Clone, Debug)]
pub struct Verdict {
    pub outcome: Outcome,
    pub wall_time: Duration,
    /// Max of the physical-memory column over all trace rows; pass-through
    /// for downstream reporting.
    pub peak_physical_memory: Option<u64>,
}

impl Verdict {
    pub fn found(&self) -> bool {
        matches!(self.outcome, Outcome::Found)
    }
}

/// One solver call: the generated pair plus where the solver should write
/// its trace.
pub struct Invocation<'a> {
    pub variant: &'a Variant,
    pub lhs: &'a str,
    pub rhs: &'a str,
    pub trace_path: &'a Path,
}

pub trait Runner {
    fn run(&mut self, invocation: &Invocation<'_>) -> BenchResult<Verdict>;
}

/// Blocking subprocess runner with an enforced wall-clock timeout.
pub struct ProcessRunner {
    pub timeout: Duration,
}

const POLL_INTERVAL: Duration = Duration::from_millis(20);

impl Runner for ProcessRunner {
    fn run(&mut self, invocation: &Invocation<'_>) -> BenchResult<Verdict> {
        let start = Instant::now();
        let mut child = Command::new(&invocation.variant.binary)
            .arg(invocation.lhs)
            .arg(invocation.rhs)
            .arg(invocation.variant.encoding.token())
            .arg(invocation.trace_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break Some(status);
            }
            if start.elapsed() >= self.timeout {
                // kill errors if the child exited since try_wait; wait reaps
                // it either way
                drop(child.kill());
                child.wait()?;
                break None;
            }
            std::thread::sleep(POLL_INTERVAL);
        };
        let wall_time = start.elapsed();

        let Some(status) = status else {
            return Ok(Verdict {
                outcome: Outcome::Timeout,
                wall_time,
                peak_physical_memory: None,
            });
        };
        if !status.success() {
            return Ok(Verdict {
                outcome: Outcome::Crash,
                wall_time,
                peak_physical_memory: None,
            });
        }

        let trace = std::fs::read_to_string(invocation.trace_path)?;
        let summary = parse_trace(&trace)?;
        Ok(Verdict {
            outcome: if summary.found {
                Outcome::Found
            } else {
                Outcome::NotFound
            },
            wall_time,
            peak_physical_memory: Some(summary.peak_physical_memory),
        })
    }
}

#[derive(Debug)]
pub(crate) struct TraceSummary {
    pub(crate) found: bool,
    pub(crate) peak_physical_memory: u64,
}

/// Interpret a solver trace: comma-separated rows starting with the
/// iteration number and physical memory and ending with a found flag. Solver
/// variants disagree on the columns in between, so only the shared shape is
/// parsed.
pub(crate) fn parse_trace(trace: &str) -> BenchResult<TraceSummary> {
    static TRACE_ROW: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^(\d+)\s*,\s*(\d+)\s*,.*,\s*(true|false)$").unwrap());

    let mut found = None;
    let mut peak = 0_u64;
    for line in trace.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let caps = TRACE_ROW
            .captures(line)
            .ok_or_else(|| BenchError::Trace(format!("malformed trace row {line:?}")))?;
        let memory: u64 = caps
            .get(2)
            .unwrap()
            .as_str()
            .parse()
            .map_err(|_| BenchError::Trace(format!("memory overflow in row {line:?}")))?;
        peak = peak.max(memory);
        found = Some(caps.get(3).unwrap().as_str() == "true");
    }
    let Some(found) = found else {
        return Err(BenchError::Trace("empty trace".into()));
    };
    Ok(TraceSummary {
        found,
        peak_physical_memory: peak,
    })
}

#[cfg(test)]
mod test {
    use super::parse_trace;
    use itertools::Itertools as _;

    #[test]
    fn found_on_last_row() {
        let trace = "0, 1000, 2000, 10, 5, 0.1, false\n1, 3000, 4000, 20, 9, 0.2, true\n";
        let summary = parse_trace(trace).unwrap();
        assert!(summary.found);
        assert_eq!(summary.peak_physical_memory, 3000);
    }

    #[test]
    fn not_found_when_no_row_succeeds() {
        let trace = (0..3)
            .map(|i| format!("{i}, {}, 9, 1, 1, 0.5, false", 100 * (i + 1)))
            .join("\n");
        let summary = parse_trace(&trace).unwrap();
        assert!(!summary.found);
        assert_eq!(summary.peak_physical_memory, 300);
    }

    #[test]
    fn wider_rows_still_parse() {
        // the egg-style trace carries extra timing columns
        let trace = "0, 42, 50, 7, 7, 7, 3, 0.1, 0.2, 0.3, 0.4, 0.5, true";
        assert!(parse_trace(trace).unwrap().found);
    }

    #[test]
    fn malformed_traces_are_rejected() {
        for trace in ["", "garbage", "0, x, 1, true", "0, 5, 1, maybe"] {
            parse_trace(trace).expect_err(trace);
        }
    }
}
