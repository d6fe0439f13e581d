//! Common library for `rdspump`: moving files in and out of Oracle directory objects
//!
//! This crate holds everything the `rdspump` binary does apart from argument parsing.
//!
//! # Modules
//!
//! - [`profile`] - INI configuration file with a DEFAULT section and named profiles
//! - [`config`] - merging DEFAULT, profile and command-line values into [`Settings`]
//! - [`dsn`] - Oracle connect descriptor built from host/port/service/SID
//! - [`session`] - database capabilities needed by the transfer engine
//! - `oracle` - [`session::Session`] on top of the `oracle` crate (feature `oracle`)
//! - [`transfer`] - chunked PUT, GET and DEL
//! - [`progress`] - rate-limited text updates or an interactive progress bar
//!
//! # Logging
//!
//! Logs go to stdout and progress goes to stderr. Verbosity is controlled by
//! [`OutputConfig::verbose`]: 0=ERROR, 1=INFO, 2=DEBUG, 3=TRACE. `RUST_LOG` is honored when set.

pub mod config;
pub mod dsn;
pub mod error;
#[cfg(feature = "oracle")]
pub mod oracle;
pub mod profile;
pub mod progress;
pub mod session;
pub mod transfer;

#[cfg(test)]
mod testutils;

pub use config::{ConnectionParams, Mode, OutputConfig, Overrides, RunParams, Settings, resolve};
pub use error::{Error, NotFound};
pub use profile::ConfigFile;
pub use progress::{ProgressSettings, ProgressType};
pub use session::{RemoteFile, Session};
pub use transfer::Summary;

fn level_for(output: &OutputConfig) -> &'static str {
    if output.quiet {
        return "off";
    }
    match output.verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the stdout log subscriber, safe to call more than once
pub fn init_tracing(output: &OutputConfig) {
    let filter = match std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => tracing_subscriber::EnvFilter::new(directives),
        _ => tracing_subscriber::EnvFilter::new(level_for(output)),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .try_init();
}

/// Runs `func` with logging configured, reports a failure once and returns `None` for it
pub fn run<T, F>(output: OutputConfig, func: F) -> Option<T>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    init_tracing(&output);
    match func() {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::error!("{:#}", error);
            None
        }
    }
}
