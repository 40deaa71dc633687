use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::config::{LogFormat, LoggingConfig};

/// Install the global subscriber. Logs go to stderr; stdout carries output.
///
/// `RUST_LOG` wins over the `-v` count when set.
pub fn init(config: &LoggingConfig, verbose: u8) -> anyhow::Result<()> {
    let directives = match std::env::var("RUST_LOG") {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default_directives(verbose),
    };
    let filter = EnvFilter::builder().parse(directives)?;

    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
    }
    Ok(())
}

fn default_directives(verbose: u8) -> String {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("warn,pp_settings={level},environment_settings={level},ppkit_http={level}")
}
