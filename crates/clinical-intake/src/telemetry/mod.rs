//! Telemetry for the intake pipeline
//!
//! Structured logging goes through `tracing`; counters and timings are
//! exported through a Prometheus registry (see [`metrics`]).

pub mod metrics;

pub use metrics::{IntakeMetrics, IntakeMetricsRegistry, ValidationTimer};

/// Install the process-wide `tracing` subscriber
///
/// `verbosity` raises the default `warn` level: 1 for info, 2 for debug,
/// 3 or more for trace. `RUST_LOG` directives still apply on top.
pub fn init_tracing(verbosity: u8, quiet: bool) {
    let level = match (quiet, verbosity) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::WARN,
        (false, 1) => tracing::Level::INFO,
        (false, 2) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_target(false)
        .try_init();
}
