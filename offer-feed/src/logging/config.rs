//! Logging configuration and initialization.

use std::env;
use std::io::IsTerminal;

use tracing_subscriber::fmt::time::{ChronoLocal, ChronoUtc};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line format (default)
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
    /// Newline-delimited JSON for log aggregation
    Json,
}

impl LogFormat {
    /// Parse format from string
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Timestamp format for log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    /// Local time with timezone (default)
    #[default]
    Local,
    /// UTC time (ISO 8601)
    Utc,
    /// No timestamps
    None,
}

impl TimestampFormat {
    /// Parse format from string
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "utc" => TimestampFormat::Utc,
            "none" | "off" => TimestampFormat::None,
            _ => TimestampFormat::Local,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format (pretty, compact, json)
    pub format: LogFormat,
    /// Timestamp format
    pub timestamps: TimestampFormat,
    /// Default log level filter, used when `RUST_LOG` is unset
    pub default_level: String,
    /// Include source file location
    pub include_location: bool,
    /// Include thread IDs
    pub include_thread_ids: bool,
    /// Include target (module path)
    pub include_target: bool,
    /// Emit ANSI colors
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            timestamps: TimestampFormat::Local,
            default_level: "info".to_string(),
            include_location: true,
            include_thread_ids: false,
            include_target: true,
            ansi: std::io::stdout().is_terminal(),
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|s| s == "true" || s == "1")
        .unwrap_or(default)
}

impl LogConfig {
    /// Create config from environment variables
    ///
    /// Reads:
    /// - `LOG_FORMAT`: pretty, compact, or json
    /// - `LOG_TIMESTAMPS`: local, utc, or none
    /// - `LOG_LEVEL`: default log level (fallback if RUST_LOG not set)
    /// - `LOG_LOCATION`: true/false for file:line info
    /// - `LOG_THREAD_IDS`: true/false for thread IDs
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            format: env::var("LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or_default(),
            timestamps: env::var("LOG_TIMESTAMPS")
                .map(|s| TimestampFormat::parse(&s))
                .unwrap_or_default(),
            default_level: env::var("LOG_LEVEL").unwrap_or(defaults.default_level),
            include_location: env_flag("LOG_LOCATION", defaults.include_location),
            include_thread_ids: env_flag("LOG_THREAD_IDS", defaults.include_thread_ids),
            ..defaults
        }
    }

    /// Config for JSON output with UTC timestamps
    pub fn json() -> Self {
        Self {
            format: LogFormat::Json,
            timestamps: TimestampFormat::Utc,
            include_thread_ids: true,
            ansi: false,
            ..Default::default()
        }
    }

    /// Config for compact output without source locations
    pub fn compact() -> Self {
        Self {
            format: LogFormat::Compact,
            include_location: false,
            ..Default::default()
        }
    }

    /// Set the default log level
    pub fn with_default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize logging with the given configuration
///
/// # Errors
///
/// Returns an error if the subscriber cannot be initialized (e.g., already set)
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    tracing_subscriber::registry()
        .with(build_fmt_layer(&config))
        .with(env_filter)
        .try_init()?;

    Ok(())
}

/// Build the fmt layer for the configured format and timer.
fn build_fmt_layer(config: &LogConfig) -> BoxedLayer {
    let local = || ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f %z".to_string());
    let utc = || ChronoUtc::new("%Y-%m-%dT%H:%M:%S%.3fZ".to_string());

    let base = fmt::layer()
        .with_target(config.include_target)
        .with_thread_ids(config.include_thread_ids)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_level(true)
        .with_ansi(config.ansi);

    match (config.format, config.timestamps) {
        (LogFormat::Pretty, TimestampFormat::Local) => base.pretty().with_timer(local()).boxed(),
        (LogFormat::Pretty, TimestampFormat::Utc) => base.pretty().with_timer(utc()).boxed(),
        (LogFormat::Pretty, TimestampFormat::None) => base.pretty().without_time().boxed(),
        (LogFormat::Compact, TimestampFormat::Local) => base.compact().with_timer(local()).boxed(),
        (LogFormat::Compact, TimestampFormat::Utc) => base.compact().with_timer(utc()).boxed(),
        (LogFormat::Compact, TimestampFormat::None) => base.compact().without_time().boxed(),
        (LogFormat::Json, TimestampFormat::Local) => base.json().with_timer(local()).boxed(),
        (LogFormat::Json, TimestampFormat::Utc) => base.json().with_timer(utc()).boxed(),
        (LogFormat::Json, TimestampFormat::None) => base.json().without_time().boxed(),
    }
}
