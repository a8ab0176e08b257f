//! Tracing subscriber setup for the `mpm` binary.
//!
//! Logs go to stderr so report output on stdout stays clean. `RUST_LOG` wins
//! over the verbosity flag:
//!
//! ```bash
//! RUST_LOG=model_perf_monitor::metrics=debug mpm evaluate --input scores.csv
//! ```

use tracing_subscriber::filter::EnvFilter;

/// Default filter directive for a `-v` count.
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(verbosity: u8) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
