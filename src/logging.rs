use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is unset: `info` by default, `-v` for debug,
/// `-vv` for trace. Dependencies stay at `warn`.
pub fn default_directive(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    format!("warn,seqscout={level}")
}

/// Installs the stderr subscriber. `RUST_LOG` wins over the verbosity count.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    // A subscriber may already be installed (tests, repeated calls); keep it.
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
