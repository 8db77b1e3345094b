//! # Event Log
//!
//! Sets up `tracing` output for a mission run.
//!
//! Events go to stdout and, without ANSI colours, to a single non-rotating
//! event log file in the output directory. `RUST_LOG` overrides the default
//! INFO level.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Result, SamplerError};

/// Filter used when `RUST_LOG` is unset, empty or unparsable.
const DEFAULT_FILTER: &str = "info";

/// Builds the level filter from the raw `RUST_LOG` value.
fn level_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber writing to stdout and `dir/file_name`.
///
/// The returned guard flushes the event log when dropped; keep it alive for
/// the whole run.
///
/// # Errors
///
/// Returns error if the log file cannot be created or a global subscriber is
/// already installed.
pub fn init(dir: &Path, file_name: &str) -> Result<WorkerGuard> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|e| {
            SamplerError::Io(std::io::Error::other(format!(
                "Failed to open event log in {}: {}",
                dir.display(),
                e
            )))
        })?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::registry()
        .with(level_filter(rust_log.as_deref()))
        .with(fmt::layer())
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .map_err(|e| SamplerError::Io(std::io::Error::other(e.to_string())))?;

    Ok(guard)
}
