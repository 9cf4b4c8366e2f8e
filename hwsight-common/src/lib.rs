//! HwSight Common Library
//!
//! This crate provides shared types and utilities for HwSight hardware telemetry:
//!
//! - [`telemetry`] - Common data model (`SensorReading`, `Category`)
//! - [`health`] - Per-category collection status and error reports
//! - [`serialization`] - JSON/CBOR encoding and decoding
//! - [`config`] - Configuration loading (JSON5 format)
//! - [`keyexpr`] - Flat output key builders and parsers
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod health;
pub mod keyexpr;
pub mod serialization;
pub mod telemetry;

// Re-export commonly used types at the crate root
pub use config::{LogFormat, LoggingConfig, load_config, parse_config};
pub use error::{Error, Result};
pub use health::{CategoryStatus, ErrorReport, ErrorType};
pub use keyexpr::{KEY_PREFIX, KeyBuilder, ParsedKey, parse_key};
pub use serialization::{Format, decode, decode_auto, encode};
pub use telemetry::{Category, SensorReading};

/// Initialize tracing with the given configuration.
///
/// Logs are written to stderr so that stdout stays reserved for snapshot
/// output. Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
///
/// # Example
///
/// ```ignore
/// use hwsight_common::{LoggingConfig, LogFormat, init_tracing};
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Json,
/// };
/// init_tracing(&config)?;
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}
