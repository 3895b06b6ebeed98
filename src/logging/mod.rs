//! File-backed tracing setup. The terminal belongs to the console UI, so nothing is
//! written to stdout or stderr.

use std::{fs, panic, path::Path};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE: &str = "cadcon.log";

/// Keep alive for the whole program; dropping it flushes the file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// `RUST_LOG` takes precedence over `level`.
pub fn init(dir: &Path, level: &str) -> Result<LoggingGuard> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, file_guard) = tracing_appender::non_blocking(appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for(level));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    tracing::info!(
        log_path = %dir.join(LOG_FILE).display(),
        "logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Routes panic messages into the log while held; dropping it restores the default hook.
///
/// Host panics inside a script are caught, but the default hook would still print
/// over the alternate screen.
pub struct PanicToLog {
    _private: (),
}

impl PanicToLog {
    pub fn install() -> Self {
        panic::set_hook(Box::new(|info| {
            tracing::error!(target: "panic", "{}", info);
        }));
        Self { _private: () }
    }
}

impl Drop for PanicToLog {
    fn drop(&mut self) {
        let _ = panic::take_hook();
    }
}

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}
