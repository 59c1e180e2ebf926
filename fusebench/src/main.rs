use clap::{Args, Parser, Subcommand};
use fusebench_core::{
    Encoding, Params, ProcessRunner, SweepConfig, Variant, generate, normalize, run_sweep,
};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the generated lhs and rhs, one per line.
    Gen(TermArgs),
    /// Generate a pair and verify both sides share a normal form.
    Check(TermArgs),
    /// Sweep solver variants over a parameter lattice.
    Sweep(SweepArgs),
}

#[derive(Args)]
struct TermArgs {
    /// `map` nesting depth (N).
    #[arg(long, default_value_t = 1)]
    maps: u32,

    /// Half-width of the composed function chain (M).
    #[arg(long, default_value_t = 1)]
    half_chain: u32,

    /// Arity of each chained function (O).
    #[arg(long, default_value_t = 0)]
    arity: u32,

    /// Term encoding: slot or named.
    #[arg(long, default_value = "slot")]
    encoding: Encoding,
}

#[derive(Args)]
struct SweepArgs {
    /// Maps axis (N), a single value or `lo..=hi`.
    #[arg(long, value_parser = parse_range, default_value = "1..=5")]
    maps: RangeInclusive<u32>,

    /// Half-chain axis (M), a single value or `lo..=hi`.
    #[arg(long, value_parser = parse_range, default_value = "1..=5")]
    half_chain: RangeInclusive<u32>,

    /// Arity axis (O), a single value or `lo..=hi`.
    #[arg(long, value_parser = parse_range, default_value = "0..=0")]
    arity: RangeInclusive<u32>,

    /// Solver variant as `label,encoding,path`; repeatable.
    #[arg(long = "variant", value_parser = parse_variant, required = true)]
    variants: Vec<Variant>,

    /// Directory for trace artifacts.
    #[arg(long, value_name = "DIR", default_value = "out")]
    out: PathBuf,

    /// Per-invocation wall-clock timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Disable monotonic failure propagation (exhaustive sweep).
    #[arg(long)]
    no_prune: bool,
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.command {
        Cmd::Gen(args) => {
            let pair = generate(params(&args), args.encoding);
            tracing::debug!("lhs size {}, rhs size {}", pair.lhs.size(), pair.rhs.size());
            println!("{}", pair.lhs);
            println!("{}", pair.rhs);
        }
        Cmd::Check(args) => {
            let pair = generate(params(&args), args.encoding);
            let lhs = normalize(&pair.lhs).unwrap();
            let rhs = normalize(&pair.rhs).unwrap();
            if lhs != rhs {
                panic!("lhs and rhs do not share a normal form:\n  lhs: {lhs}\n  rhs: {rhs}");
            }
            println!("equal: both sides normalize to {lhs}");
        }
        Cmd::Sweep(args) => {
            let config = SweepConfig {
                maps: args.maps,
                half_chain: args.half_chain,
                arity: args.arity,
                prune: !args.no_prune,
                out_dir: args.out,
            };
            let mut runner = ProcessRunner {
                timeout: Duration::from_secs(args.timeout),
            };
            let records = run_sweep(&config, &args.variants, &mut runner).unwrap();
            for record in &records {
                println!(
                    "{} n={} m={} o={} {} {:?} {:.3}s mem={}",
                    record.variant,
                    record.point.maps,
                    record.point.half_chain,
                    record.point.arity,
                    record.encoding,
                    record.verdict.outcome,
                    record.verdict.wall_time.as_secs_f64(),
                    record
                        .verdict
                        .peak_physical_memory
                        .map_or_else(|| "-".to_string(), |m| m.to_string()),
                );
            }
        }
    }
}

fn params(args: &TermArgs) -> Params {
    Params::new(args.maps, args.half_chain, args.arity).unwrap()
}

fn parse_range(s: &str) -> Result<RangeInclusive<u32>, String> {
    if let Some((lo, hi)) = s.split_once("..=") {
        let lo: u32 = lo.trim().parse().map_err(|_| format!("bad range start {lo:?}"))?;
        let hi: u32 = hi.trim().parse().map_err(|_| format!("bad range end {hi:?}"))?;
        if lo > hi {
            return Err(format!("empty range {s:?}"));
        }
        Ok(lo..=hi)
    } else {
        let k: u32 = s.trim().parse().map_err(|_| format!("bad coordinate {s:?}"))?;
        Ok(k..=k)
    }
}

fn parse_variant(s: &str) -> Result<Variant, String> {
    let mut parts = s.splitn(3, ',');
    let (Some(label), Some(encoding), Some(binary)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected label,encoding,path, got {s:?}"));
    };
    if label.is_empty() {
        return Err("variant label must not be empty".to_string());
    }
    Ok(Variant {
        label: label.to_string(),
        encoding: encoding.parse()?,
        binary: PathBuf::from(binary),
    })
}
