//! Logging infrastructure for tfsclient.
//!
//! The library only emits `tracing` events; installing a subscriber is left to the
//! application. [`init_logging`] is a convenience for applications that want the
//! same setup everywhere:
//! - stderr or file output
//! - configurable log levels
//! - text or JSON format

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const ENV_LOG_LEVEL: &str = "TFSCLIENT_LOG_LEVEL";
const ENV_LOG_FILE: &str = "TFSCLIENT_LOG_FILE";
const ENV_LOG_FORMAT: &str = "TFSCLIENT_LOG_FORMAT";

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a log level from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Convert to a filter string for tracing-subscriber.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format.
    Json,
}

impl LogFormat {
    /// Parse a log format from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Default)]
pub struct LogConfig {
    /// Log level (None means logging is disabled).
    pub level: Option<LogLevel>,
    /// Output file path (None means stderr).
    pub file: Option<PathBuf>,
    /// Output format.
    pub format: LogFormat,
}

impl LogConfig {
    /// Reads `TFSCLIENT_LOG_LEVEL`, `TFSCLIENT_LOG_FILE` and `TFSCLIENT_LOG_FORMAT`.
    ///
    /// Unrecognized level or format values are treated as unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            level: std::env::var(ENV_LOG_LEVEL)
                .ok()
                .and_then(|s| LogLevel::parse(&s)),
            file: std::env::var(ENV_LOG_FILE)
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            format: std::env::var(ENV_LOG_FORMAT)
                .ok()
                .and_then(|s| LogFormat::parse(&s))
                .unwrap_or_default(),
        }
    }

    /// Filter directive limiting output to this crate.
    fn filter_directive(&self) -> Option<String> {
        self.level
            .map(|level| format!("tfsclient={}", level.as_filter_str()))
    }
}

/// Guard that must be held to ensure logs are flushed.
///
/// When this guard is dropped, all pending log messages are flushed.
pub struct LogGuard {
    _guard: WorkerGuard,
}

/// Initialize the logging system.
///
/// Returns `None` if logging is disabled, the log file can't be opened, or a global
/// subscriber is already installed.
///
/// # Example
///
/// ```rust,no_run
/// use tfsclient::logging::{LogConfig, LogLevel, LogFormat, init_logging};
/// use std::path::PathBuf;
///
/// let config = LogConfig {
///     level: Some(LogLevel::Debug),
///     file: Some(PathBuf::from("/tmp/tfsclient.log")),
///     format: LogFormat::Text,
/// };
///
/// let _guard = init_logging(config);
/// ```
#[must_use = "the returned guard must be held until application exit"]
pub fn init_logging(config: LogConfig) -> Option<LogGuard> {
    let filter = EnvFilter::new(config.filter_directive()?);

    let (non_blocking, guard) = match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let with_source = config.file.is_some();
    let installed = match config.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_file(with_source)
                .with_line_number(with_source);

            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Text => {
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_level(true)
                .with_file(with_source)
                .with_line_number(with_source)
                .compact();

            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
    };

    installed.ok().map(|_| LogGuard { _guard: guard })
}
