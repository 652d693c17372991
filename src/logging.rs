use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::LoggingConfig;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unknown log level `{0}`; expected trace, debug, info, warn or error")]
    UnknownLevel(String),
    #[error("failed to open log file {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to set tracing subscriber: {0}")]
    Install(String),
}

pub fn parse_level(level: &str) -> Result<Level, LoggingError> {
    level
        .trim()
        .parse::<Level>()
        .map_err(|_| LoggingError::UnknownLevel(level.to_string()))
}

/// Install the global subscriber. Logs go to stderr so `latest` and `query`
/// output on stdout stays machine-readable.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    install(config, std::io::stderr)
}

/// Install the global subscriber writing to `path`, truncating it. The
/// dashboard owns the terminal, so its logs cannot share stderr.
pub fn init_to_file(config: &LoggingConfig, path: &Path) -> Result<(), LoggingError> {
    parse_level(&config.level)?;
    let file = open_log_file(path)?;
    install(config, Mutex::new(file))
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    let io_err = |source: std::io::Error| LoggingError::File {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    File::create(path).map_err(io_err)
}

fn install<W>(config: &LoggingConfig, writer: W) -> Result<(), LoggingError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let level = parse_level(&config.level)?;
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(writer);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().with_ansi(false).finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| LoggingError::Install(e.to_string()))
}
