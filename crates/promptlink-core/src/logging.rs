//! Structured logging configuration for promptlink.
//!
//! Uses `tracing` with `tracing-subscriber`. Logs always go to stderr so
//! that links printed on stdout can be piped.
//!
//! ## Environment Variables
//!
//! - `PROMPTLINK_LOG` or `RUST_LOG`: log filter (e.g. `debug`, `promptlink_core=trace`)
//! - `PROMPTLINK_LOG_FORMAT`: output format (`pretty`, `compact`, `json`)
//!
//! ## Examples
//!
//! ```bash
//! # Trace every playback tick
//! PROMPTLINK_LOG=promptlink_core=trace promptlink play 'https://…/?q=hi'
//!
//! # JSON output
//! PROMPTLINK_LOG_FORMAT=json promptlink share "how do prompts work"
//! ```

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "promptlink=info,promptlink_core=info,warn";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable with colors and indentation
    Pretty,
    /// Compact single-line output
    #[default]
    Compact,
    /// JSON output for log aggregation
    Json,
}

impl LogFormat {
    /// Parse from string (case-insensitive); unknown values fall back to compact.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => Self::Compact,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log filter directive
    pub filter: String,
    /// Output format
    pub format: LogFormat,
    /// Include file/line in logs
    pub with_file: bool,
    /// Include target (module path)
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Compact,
            with_file: false,
            with_target: true,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("PROMPTLINK_LOG")
                .or_else(|_| std::env::var("RUST_LOG"))
                .ok(),
            std::env::var("PROMPTLINK_LOG_FORMAT").ok(),
        )
    }

    fn from_vars(filter: Option<String>, format: Option<String>) -> Self {
        Self {
            filter: filter.unwrap_or_else(|| DEFAULT_FILTER.to_string()),
            format: format.map(|s| LogFormat::parse(&s)).unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Verbose configuration for `--verbose`.
    pub fn debug() -> Self {
        Self {
            filter: "promptlink=debug,promptlink_core=debug,info".to_string(),
            with_file: true,
            ..Default::default()
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Subsequent calls are ignored.
pub fn init(config: LogConfig) {
    let env_filter =
        EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(config.with_file)
        .with_line_number(config.with_file)
        .with_target(config.with_target);

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.json())
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.compact())
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.pretty())
            .try_init(),
    };
    let _ = result;
}

/// Initialize logging with environment-based configuration.
pub fn init_from_env() {
    init(LogConfig::from_env());
}
