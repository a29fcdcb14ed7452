//! Random battle simulation CLI.
//!
//! Plays simulated battles through the engine and writes one JSON record
//! per battle.
//!
//! Usage:
//!   cargo run --release --bin simulate -- [OPTIONS]
//!
//! Options:
//!   --battles N       Number of battles to play (default: 100)
//!   --rounds N        Rounds per battle (default: 6)
//!   --units N         Units per side (default: 5)
//!   --threads N       Number of parallel threads (default: 4)
//!   --seed N          Random seed, 0 for entropy (default: 0)
//!   --shields MODE    Shield source: tracked or keyword (default: tracked)
//!   --output FILE     Output file path (default: stdout)
//!   --quiet           Suppress progress and summary output

use std::env;
use std::fs::File;
use std::io::{self, BufWriter};
use std::process;
use std::str::FromStr;
use std::time::Instant;

use tracing_subscriber::EnvFilter;

use battle_tracker::config::ShieldSource;
use battle_tracker::simulate::{self, SimulationConfig};

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config = SimulationConfig::default();
    let mut output_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--battles" => config.num_battles = value(&args, &mut i),
            "--rounds" => config.rounds = value(&args, &mut i),
            "--units" => config.units_per_side = value(&args, &mut i),
            "--threads" => config.threads = value(&args, &mut i),
            "--seed" => config.seed = value(&args, &mut i),
            "--shields" => {
                let mode: String = value(&args, &mut i);
                config.rules.shield_source = ShieldSource::from_keyword(&mode)
                    .unwrap_or_else(|| fail(&format!("invalid --shields value: {mode}")));
            }
            "--output" => output_path = Some(value(&args, &mut i)),
            "--quiet" => config.quiet = true,
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => fail(&format!("Unknown argument: {other}")),
        }
        i += 1;
    }

    if config.units_per_side == 0 {
        fail("--units must be at least 1");
    }

    if !config.quiet {
        eprintln!(
            "Simulation: {} battles, {} rounds, {} units/side, {} threads",
            config.num_battles, config.rounds, config.units_per_side, config.threads
        );
    }

    let start = Instant::now();
    let records = simulate::run_simulation(&config);
    let elapsed = start.elapsed();

    if !config.quiet {
        eprintln!(
            "Completed {} battles in {:.2}s",
            records.len(),
            elapsed.as_secs_f64()
        );
        simulate::print_summary(&records);
    }

    let written = match &output_path {
        Some(path) => File::create(path)
            .and_then(|file| simulate::write_jsonl(&records, &mut BufWriter::new(file))),
        None => simulate::write_jsonl(&records, &mut BufWriter::new(io::stdout().lock())),
    };
    if let Err(e) = written {
        fail(&format!("failed to write output: {e}"));
    }
    if let Some(path) = output_path {
        if !config.quiet {
            eprintln!("Wrote {} battles to {}", records.len(), path);
        }
    }

    if records.iter().any(|r| !r.is_clean()) {
        process::exit(2);
    }
}

/// Parses the value following the flag at `args[*i]`, advancing `i`.
fn value<T: FromStr>(args: &[String], i: &mut usize) -> T {
    let flag = &args[*i];
    *i += 1;
    match args.get(*i).map(|v| v.parse::<T>()) {
        Some(Ok(v)) => v,
        Some(Err(_)) => fail(&format!("invalid {flag} value: {}", args[*i])),
        None => fail(&format!("{flag} requires a value")),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    print_usage();
    process::exit(1);
}

fn print_usage() {
    eprintln!("Usage: simulate [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --battles N      Number of battles to play (default: 100)");
    eprintln!("  --rounds N       Rounds per battle (default: 6)");
    eprintln!("  --units N        Units per side (default: 5)");
    eprintln!("  --threads N      Number of parallel threads (default: 4)");
    eprintln!("  --seed N         Random seed, 0 for entropy (default: 0)");
    eprintln!("  --shields MODE   Shield source: tracked or keyword (default: tracked)");
    eprintln!("  --output FILE    Output file path (default: stdout)");
    eprintln!("  --quiet          Suppress progress and summary output");
    eprintln!("  --help           Show this help");
}
