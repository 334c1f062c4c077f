//! CLI command implementations

pub mod clients;
pub mod demo;
pub mod logs;
pub mod notify;
pub mod products;
pub mod workflows;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use prorab_core::config;
use prorab_core::ports::UserAlert;
use prorab_core::services::logging::Logger;
use prorab_core::{EntryPoint, LogEvent, LoggingService, ProrabContext};

use crate::output;

/// Alerts go to stderr in red
pub struct CliAlert;

impl UserAlert for CliAlert {
    fn alert(&self, message: &str) {
        output::error(message);
    }
}

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Logger {
    let data_dir = get_data_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
        .ok()
        .map(Arc::new)
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Logger, event: LogEvent) {
    prorab_core::services::logging::record(logger, event);
}

/// Get the data directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    config::data_dir()
}

/// Open the context for `command`, recording the command in the log
pub fn get_context(command: &str) -> Result<ProrabContext> {
    let data_dir = get_data_dir()?;

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Не удалось создать каталог данных: {:?}", data_dir))?;

    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command(command));

    ProrabContext::new(&data_dir, Arc::new(CliAlert), logger)
        .context("Не удалось открыть хранилище")
}

/// Spinner shown while the store is read; hidden when stdout is not a terminal
pub fn spinner(message: &str) -> ProgressBar {
    if atty::isnt(atty::Stream::Stdout) {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}
