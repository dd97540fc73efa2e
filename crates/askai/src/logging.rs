//! Log-file initialization.
//!
//! Logs go to `<log dir>/askai.log` through a `tracing-subscriber` fmt
//! layer, as plain text or JSON. Standard output is reserved for answers,
//! so if the log file cannot be opened the program falls back to warnings
//! on stderr.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, writer::BoxMakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, LogFormat};

/// Parse a configured level name. Accepts the `tracing` names plus
/// `warning`, `fatal` and `panic`.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Some(LevelFilter::TRACE),
        "debug" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "error" | "fatal" | "panic" => Some(LevelFilter::ERROR),
        "off" => Some(LevelFilter::OFF),
        _ => None,
    }
}

/// Open `path` for appending, creating it and its directory if needed.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let mut options = OpenOptions::new();
    options.append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o640);
    }
    options.open(path)
}

/// Install the global subscriber described by `config`.
///
/// Never fails: problems with the log file are reported on stderr.
pub fn init_logging(config: &AppConfig) {
    let level = parse_level(&config.log_level);

    let file = config
        .log_file_path()
        .and_then(|path| {
            open_log_file(&path)
                .map(|file| (path.clone(), file))
                .map_err(|e| format!("failed to create log file {}: {e}", path.display()))
        });

    match file {
        Ok((path, file)) => {
            install(
                level.unwrap_or(LevelFilter::INFO),
                config.log_format,
                BoxMakeWriter::new(Mutex::new(file)),
                false,
            );
            debug!("Logging to {}", path.display());
        }
        Err(e) => {
            install(LevelFilter::WARN, config.log_format, BoxMakeWriter::new(io::stderr), true);
            warn!("{e}");
        }
    }

    if level.is_none() {
        warn!("unknown log level '{}', using info", config.log_level);
    }
}

fn install(level: LevelFilter, format: LogFormat, writer: BoxMakeWriter, ansi: bool) {
    let filter = EnvFilter::default().add_directive(level.into());

    let (text, json) = match format {
        LogFormat::Text => (
            Some(fmt::layer().with_ansi(ansi).with_writer(writer)),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(fmt::layer().json().with_ansi(false).with_writer(writer)),
        ),
    };

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .try_init();
}
