use std::env;

use tracing_subscriber::filter::{EnvFilter, LevelFilter};

const LOG_FILTER: &str = "RUST_LOG";

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingOptions {
    pub verbosity: u8,
    pub quiet: bool,
    pub ansi: bool,
}

/// Install the global fmt subscriber, writing to stderr so that reports on
/// stdout stay machine-readable.
///
/// `RUST_LOG` sets the filter (default `warn`). `-v`/`-vv` raise the level
/// to debug/trace and `--quiet` turns logging off; both override `RUST_LOG`.
pub fn init_tracing(options: TracingOptions) {
    let env_filter = match env::var_os(LOG_FILTER) {
        Some(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        None => EnvFilter::new("warn"),
    };

    let level_filter = if options.quiet {
        Some(LevelFilter::OFF)
    } else {
        match options.verbosity {
            0 => None,
            1 => Some(LevelFilter::DEBUG),
            _ => Some(LevelFilter::TRACE),
        }
    };

    let builder = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_ansi(options.ansi)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);

    // an explicit level overrides RUST_LOG
    let result = match level_filter {
        Some(level) => builder.with_max_level(level).try_init(),
        None => builder.try_init(),
    };
    if let Err(e) = result {
        eprintln!("warning: could not install tracing subscriber: {}", e);
    }
}
