//! Subscriber setup for the `shellutil` binary.
//!
//! The library only emits `tracing` events and leaves the subscriber to its
//! caller. What it emits:
//! - `info`: each rendered `sort`/`tar` command line and decoded stdout.
//! - `error`: decoded stderr of a command that failed.
//! - `warn`: a command killed after its timeout.
//! - `debug`: spawn and exit details from the process runner.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a compact stderr subscriber filtered by `RUST_LOG`.
///
/// Only warnings and errors show unless `RUST_LOG` says otherwise, which
/// keeps stdout free for command output:
/// ```bash
/// RUST_LOG=shellutil=info shellutil sort data.csv -o sorted.csv -t, -k 2,2
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
