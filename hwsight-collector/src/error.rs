//! Error types for hardware collection.

use hwsight_common::ErrorType;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`CollectError`].
pub type Result<T> = std::result::Result<T, CollectError>;

/// Fatal conditions that abort collection of one category.
///
/// Per-chip, per-channel and per-line problems never surface here; they are
/// skipped where they occur.
#[derive(Debug, Error)]
pub enum CollectError {
    /// CPU topology metadata could not be read.
    #[error("CPU topology unreadable: {0}")]
    TopologyUnreadable(String),

    /// Per-CPU time counters could not be read.
    #[error("CPU time counters unreadable: {0}")]
    CountersUnreadable(String),

    /// Neither the primary nor the alternate temperature source exists.
    #[error("No temperature sensor found (checked {})", format_paths(.checked))]
    SensorSourceUnavailable { checked: Vec<PathBuf> },

    /// The topology file declares no usable core count.
    #[error("Unable to determine CPU core count: {0}")]
    CoreCountUnavailable(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CollectError {
    /// Classify the error for reporting.
    pub fn kind(&self) -> ErrorType {
        match self {
            Self::TopologyUnreadable(_) | Self::CoreCountUnavailable(_) => {
                ErrorType::TopologyUnreadable
            }
            Self::CountersUnreadable(_) => ErrorType::CountersUnreadable,
            Self::SensorSourceUnavailable { .. } => ErrorType::SourceUnavailable,
            Self::Config(_) => ErrorType::ConfigError,
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            CollectError::TopologyUnreadable("x".into()).kind(),
            ErrorType::TopologyUnreadable
        );
        assert_eq!(
            CollectError::CoreCountUnavailable("x".into()).kind(),
            ErrorType::TopologyUnreadable
        );
        assert_eq!(
            CollectError::CountersUnreadable("x".into()).kind(),
            ErrorType::CountersUnreadable
        );
        assert_eq!(
            CollectError::SensorSourceUnavailable { checked: vec![] }.kind(),
            ErrorType::SourceUnavailable
        );
        assert_eq!(CollectError::config("x").kind(), ErrorType::ConfigError);
    }

    #[test]
    fn test_source_unavailable_message_lists_paths() {
        let err = CollectError::SensorSourceUnavailable {
            checked: vec![PathBuf::from("/a"), PathBuf::from("/b")],
        };
        assert_eq!(err.to_string(), "No temperature sensor found (checked /a, /b)");
    }
}
