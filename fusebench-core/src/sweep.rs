//! Adaptively pruned sweep over the (maps, half_chain, arity) lattice.
//!
//! Per variant the axes nest outer-to-inner as maps, half_chain, arity, and
//! each invocation is interpreted through the monotonic-failure heuristic:
//! once a variant fails somewhere, larger coordinates on that axis are
//! assumed to fail too, and a failure at an axis minimum condemns the whole
//! enclosing slice. The heuristic is a knob (`prune`), not an assumed solver
//! property; with it off the sweep is exhaustive.

use crate::{
    BenchResult,
    generate::{Encoding, Params, generate},
    solver::{Invocation, Runner, Variant, Verdict},
};
use itertools::Itertools as _;
use std::ops::RangeInclusive;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct SweepConfig {
    pub maps: RangeInclusive<u32>,
    pub half_chain: RangeInclusive<u32>,
    pub arity: RangeInclusive<u32>,
    pub prune: bool,
    pub out_dir: PathBuf,
}

/// One coordinate of the lattice; the encoding comes from the variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Point {
    pub maps: u32,
    pub half_chain: u32,
    pub arity: u32,
}

/// Exploration status of one axis for one variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AxisStatus {
    Exploring,
    /// An invocation at this coordinate reported not-found.
    FailedAt(u32),
    /// Condemned by a child-axis failure at the child's minimum coordinate,
    /// without being invoked here.
    Propagated(u32),
}

impl AxisStatus {
    pub fn blocks(self) -> bool {
        !matches!(self, Self::Exploring)
    }

    /// Pure propagation rule: a child axis that failed at its minimum
    /// coordinate condemns the parent slice at `parent_coordinate`.
    pub fn propagate(child: Self, child_min: u32, parent_coordinate: u32) -> Option<Self> {
        match child {
            Self::FailedAt(k) | Self::Propagated(k) if k == child_min => {
                Some(Self::Propagated(parent_coordinate))
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Record {
    pub variant: String,
    pub point: Point,
    pub encoding: Encoding,
    pub verdict: Verdict,
    pub trace_path: PathBuf,
}

/// Trace artifact name for one (variant, point) invocation: five
/// dash-separated fields, unique per combination; parse by right-splitting
/// the last four fields (the label itself may contain dashes).
pub fn trace_file_name(variant: &Variant, point: Point) -> String {
    format!(
        "{}-{}-{}-{}-{}.csv",
        variant.label,
        point.maps,
        point.half_chain,
        point.arity,
        variant.encoding.token()
    )
}

/// Sweep every variant over the configured lattice. Every invocation,
/// including failed ones, yields a [`Record`]; each point/variant pair is
/// invoked at most once.
pub fn run_sweep<R: Runner>(
    config: &SweepConfig,
    variants: &[Variant],
    runner: &mut R,
) -> BenchResult<Vec<Record>> {
    std::fs::create_dir_all(&config.out_dir)?;
    tracing::info!(
        "sweeping maps={:?} half_chain={:?} arity={:?} for {}",
        config.maps,
        config.half_chain,
        config.arity,
        variants.iter().map(|v| &v.label).join(", ")
    );
    let mut records = Vec::new();
    for variant in variants {
        sweep_variant(config, variant, runner, &mut records)?;
    }
    Ok(records)
}

fn sweep_variant<R: Runner>(
    config: &SweepConfig,
    variant: &Variant,
    runner: &mut R,
    records: &mut Vec<Record>,
) -> BenchResult<()> {
    let mut maps_status = AxisStatus::Exploring;
    for maps in config.maps.clone() {
        let mut half_status = AxisStatus::Exploring;
        for half_chain in config.half_chain.clone() {
            let mut arity_status = AxisStatus::Exploring;
            for arity in config.arity.clone() {
                let point = Point { maps, half_chain, arity };
                let verdict = invoke(config, variant, runner, point, records)?;
                if !verdict.found() && config.prune {
                    arity_status = AxisStatus::FailedAt(arity);
                    if let Some(status) =
                        AxisStatus::propagate(arity_status, *config.arity.start(), half_chain)
                    {
                        half_status = status;
                        if let Some(status) =
                            AxisStatus::propagate(half_status, *config.half_chain.start(), maps)
                        {
                            maps_status = status;
                        }
                    }
                    tracing::debug!(
                        "{} failed at n={maps} m={half_chain} o={arity}, skipping the rest of the arity axis",
                        variant.label
                    );
                    break;
                }
            }
            if half_status.blocks() {
                tracing::debug!(
                    "{} half_chain axis condemned at n={maps} m={half_chain}",
                    variant.label
                );
                break;
            }
        }
        if maps_status.blocks() {
            tracing::debug!("{} maps axis condemned at n={maps}, variant done", variant.label);
            break;
        }
    }
    Ok(())
}

fn invoke<R: Runner>(
    config: &SweepConfig,
    variant: &Variant,
    runner: &mut R,
    point: Point,
    records: &mut Vec<Record>,
) -> BenchResult<Verdict> {
    let params = Params::new(point.maps, point.half_chain, point.arity)?;
    let pair = generate(params, variant.encoding);
    let trace_path = config.out_dir.join(trace_file_name(variant, point));
    let verdict = runner.run(&Invocation {
        variant,
        lhs: &pair.lhs.to_string(),
        rhs: &pair.rhs.to_string(),
        trace_path: &trace_path,
    })?;
    tracing::info!(
        "{} n={} m={} o={} {:?} in {:?}",
        variant.label,
        point.maps,
        point.half_chain,
        point.arity,
        verdict.outcome,
        verdict.wall_time
    );
    records.push(Record {
        variant: variant.label.clone(),
        point,
        encoding: variant.encoding,
        verdict: verdict.clone(),
        trace_path,
    });
    Ok(verdict)
}
