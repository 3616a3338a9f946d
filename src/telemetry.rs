//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Installs the global `fmt` subscriber.
///
/// `RUST_LOG` directives take precedence; `config.log_level` is the fallback.
/// `LOG_FORMAT=json` switches to one JSON object per line.
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
