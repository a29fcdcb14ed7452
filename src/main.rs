//! Battle tracker -- a round/phase engine for tabletop miniatures battles.
//!
//! This binary reads protocol commands from stdin and writes responses to
//! stdout. Logs go to stderr, filtered by `RUST_LOG`.

use std::io::{self, BufRead};

use tracing_subscriber::EnvFilter;

use battle_tracker::engine::Engine;
use battle_tracker::protocol::{parse_command, Command};

/// Runs the main protocol loop, reading commands from stdin and writing
/// responses to stdout.
fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut engine = Engine::new();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let cmd = match parse_command(&line) {
            Some(c) => c,
            None => continue,
        };

        if cmd == Command::Quit {
            break;
        }

        if let Err(e) = engine.handle(cmd, &mut out) {
            tracing::error!(error = %e, "failed to write response");
            break;
        }
    }
}
