//! Logging initialization
//!
//! Console logs go to stderr so command output on stdout stays clean.
//! Supports JSON or human-readable formatting, an optional daily-rolling
//! file, and `RUST_LOG` overrides.

use crate::config::LoggingConfig;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Flushes the file writer on drop. Keep it alive until exit.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let env_filter = build_env_filter(config);

    let (file_writer, file_guard) = match &config.directory {
        Some(directory) => {
            fs::create_dir_all(directory).map_err(|e| {
                anyhow::anyhow!("Failed to create log directory {}: {e}", directory.display())
            })?;
            let appender = tracing_appender::rolling::daily(directory, "remediar.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.json {
        let console = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(std::io::stderr);
        let file = file_writer.map(|w| fmt::layer().json().with_ansi(false).with_writer(w));
        registry.with(console).with(file).try_init()?;
    } else {
        let console = fmt::layer().with_target(false).with_writer(std::io::stderr);
        let file = file_writer.map(|w| fmt::layer().with_ansi(false).with_writer(w));
        registry.with(console).with(file).try_init()?;
    }

    tracing::debug!(
        level = %config.level,
        json = config.json,
        file = config.directory.is_some(),
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.level;
        EnvFilter::new(format!(
            "warn,remediar={level},remediar_client={level},remediar_filter={level},remediar_models={level}"
        ))
    })
}
