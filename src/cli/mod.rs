//! Command-line layer: argument parsing, wiring, and CI output surfaces

mod check;
mod context;
mod style;
mod validate;

pub use check::{CheckArgs, run_check};
pub use validate::run_validate;

use tracing_subscriber::EnvFilter;

/// Install the tracing subscriber
///
/// Logs go to stderr so stdout carries only the summary. `RUST_LOG`
/// overrides the verbosity flag.
pub fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "merge_gate=info",
        1 => "merge_gate=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
