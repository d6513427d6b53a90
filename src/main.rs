mod api;
mod app;
mod cache;
mod commands;
mod config;
mod event;
mod mutation;
mod query;
#[cfg(test)]
mod testing;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE_ENV: &str = "CREWDESK_LOG_FILE";

#[derive(Parser, Debug)]
#[command(name = "crewdesk")]
#[command(about = "A terminal client for the project staffing API")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./crewdesk.yaml, then $XDG_CONFIG_HOME/crewdesk/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Screen to open on start
  #[arg(long, value_enum, default_value_t = app::RootView::Projects)]
  view: app::RootView,

  /// Write logs to this file (also CREWDESK_LOG_FILE). Level comes from RUST_LOG.
  #[arg(long)]
  log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Guard flushes buffered log lines on drop
  let log_path = args
    .log_file
    .clone()
    .or_else(|| std::env::var_os(LOG_FILE_ENV).map(PathBuf::from));
  let _log_guard = match log_path {
    Some(path) => Some(setup_tracing(&path)?),
    None => None,
  };

  let config = config::Config::load(args.config.as_deref())?;
  tracing::info!(base_url = %config.api.base_url, "configuration loaded");

  let mut app = app::App::new(config, args.view)?;
  app.run().await?;

  Ok(())
}

/// File logging. Without a log file no subscriber is installed, so the
/// terminal UI is never written over.
fn setup_tracing(path: &Path) -> Result<WorkerGuard> {
  use tracing_subscriber::prelude::*;
  use tracing_subscriber::EnvFilter;

  let dir = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;
  let file_name = path
    .file_name()
    .ok_or_else(|| eyre!("Log file path has no file name: {}", path.display()))?;

  let appender = tracing_appender::rolling::never(dir, file_name);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crewdesk=info"));
  let file_layer = tracing_subscriber::fmt::layer()
    .with_writer(writer)
    .with_ansi(false)
    .with_target(true);

  tracing_subscriber::registry()
    .with(filter)
    .with(file_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to initialise logging: {}", e))?;

  Ok(guard)
}
