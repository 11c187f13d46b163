//! Utilities for logging.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Initialize a global subscriber.
///
/// Directives from `RUST_LOG` override `default_level`. Calling this more than
/// once is a no-op.
pub fn init(default_level: LevelFilter, format: LogFormat) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let builder = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_file(true)
        .with_line_number(true);

    let _ = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// Initialize logging for tests, writing through the test harness so output
/// is captured per test.
pub fn init_test() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::DEBUG.into())
        .from_env_lossy();
    let _ = FmtSubscriber::builder()
        .with_test_writer()
        .with_env_filter(env_filter)
        .try_init();
}
