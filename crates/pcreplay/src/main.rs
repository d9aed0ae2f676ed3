//! PageCache trace replayer - feeds page accesses through a RecencyCache

mod replay;
mod trace;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::replay::replay;
use crate::trace::parse_trace;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of pages)
    #[arg(short, long, default_value_t = 4)]
    capacity: usize,

    /// Trace file, one `key [contents]` access per line (stdin if omitted)
    #[arg(short, long)]
    trace: Option<PathBuf>,

    /// Print the recency order after every access
    #[arg(long)]
    steps: bool,

    /// Emit the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(directives.as_deref()))
        .init();

    let args = Args::parse();
    let input = load_input(args.trace.as_deref(), std::io::stdin())?;

    print!("{}", run(&args, &input)?);
    Ok(())
}

/// `RUST_LOG`-style directives, falling back to `warn` when none are given
fn log_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives.unwrap_or_default())
}

/// Read the trace file, or `stdin` when no path was given
fn load_input(path: Option<&Path>, mut stdin: impl Read) -> Result<String> {
    match path {
        Some(path) => read_trace(path),
        None => {
            let mut buf = String::new();
            stdin
                .read_to_string(&mut buf)
                .context("reading trace from stdin")?;
            Ok(buf)
        }
    }
}

fn read_trace(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading trace {}", path.display()))
}

fn run(args: &Args, input: &str) -> Result<String> {
    let entries = parse_trace(input)?;
    if entries.is_empty() {
        warn!("trace contains no accesses");
    }
    info!(accesses = entries.len(), capacity = args.capacity, "replaying trace");

    let report = replay(entries, args.capacity, args.steps)
        .with_context(|| format!("building cache with capacity {}", args.capacity))?;

    if args.json {
        let mut out = serde_json::to_string_pretty(&report)?;
        out.push('\n');
        Ok(out)
    } else {
        Ok(report.to_string())
    }
}
