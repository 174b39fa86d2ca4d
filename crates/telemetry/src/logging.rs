//! Structured logging setup.

use std::str::FromStr;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human readable single-line output.
    Compact,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "compact" | "text" => Ok(Self::Compact),
            other => Err(anyhow::anyhow!("Unknown log format: {}", other)),
        }
    }
}

/// Initialize structured logging with environment-based filtering.
///
/// # Arguments
/// * `log_level` - Optional filter override (e.g., "info", "tx_explorer_chain=debug")
/// * `format` - Line format of the emitted events
pub fn init_logging(log_level: Option<&str>, format: LogFormat) -> anyhow::Result<()> {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let json = (format == LogFormat::Json).then(|| fmt::layer().json());
    let compact = (format == LogFormat::Compact).then(|| fmt::layer().compact());

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(compact)
        .try_init()?;

    Ok(())
}
