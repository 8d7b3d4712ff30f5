//! Tracing setup for the command line.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Context, Result, eyre};
use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use sortwise_core::{LogRotation, LoggingConfig};

/// Build the dispatch for a run.
///
/// `RUST_LOG` takes precedence over the configured level. When a log file is
/// configured, the returned guard must be kept alive until the run is over;
/// dropping it flushes the file.
pub fn init(config: &LoggingConfig) -> Result<(Dispatch, Option<WorkerGuard>)> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .wrap_err_with(|| format!("invalid log level '{}'", config.level))?,
    };

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(appender(path, config.rotation)?);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(file_layer);

    Ok((Dispatch::new(subscriber), guard))
}

fn appender(path: &Path, rotation: LogRotation) -> Result<rolling::RollingFileAppender> {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| eyre!("log file path has no file name: {}", path.display()))?;

    fs::create_dir_all(directory)
        .wrap_err_with(|| format!("failed to create log directory {}", directory.display()))?;

    Ok(match rotation {
        LogRotation::Never => rolling::never(directory, file_name),
        LogRotation::Hourly => rolling::hourly(directory, file_name),
        LogRotation::Daily => rolling::daily(directory, file_name),
    })
}
