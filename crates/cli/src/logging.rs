use chainscan_core::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const WORKSPACE_CRATES: &[&str] = &["chainscan_core", "chainscan"];

fn scoped_directives(level: &str) -> String {
    let directives: Vec<String> =
        WORKSPACE_CRATES.iter().map(|krate| format!("{krate}={level}")).collect();
    format!("warn,{}", directives.join(","))
}

fn scoped_filter(level: &str) -> EnvFilter {
    EnvFilter::new(scoped_directives(level))
}

/// Builds the filter: `RUST_LOG` wins, `-v` flags come next, then the configured level.
///
/// The bare levels `debug` and `trace` in `RUST_LOG` are scoped to the workspace crates so
/// dependency noise (hyper, rustls) stays at `warn`.
pub fn build_filter(config: &LoggingConfig, verbosity: u8) -> EnvFilter {
    if let Ok(env_filter) = std::env::var("RUST_LOG") {
        return match env_filter.as_str() {
            "debug" | "trace" => scoped_filter(&env_filter),
            _ => EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| scoped_filter("debug")),
        };
    }

    match verbosity {
        0 => scoped_filter(&config.level),
        1 => scoped_filter("debug"),
        _ => scoped_filter("trace"),
    }
}

/// Initializes logging to stderr so log lines never interleave with the table on stdout.
pub fn init_logging(config: &LoggingConfig, verbosity: u8) {
    let registry = tracing_subscriber::registry().with(build_filter(config, verbosity));

    if config.format.as_str() == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_file(true)
            .with_line_number(true)
            .with_target(false);
        registry.with(fmt_layer).init();
    }
}
