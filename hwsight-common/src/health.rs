//! Collection status and error report types.
//!
//! A snapshot carries one status per category so a consumer can tell a
//! host with no sensors apart from a host that simply reported nothing.

use serde::{Deserialize, Serialize};

use crate::telemetry::Category;

/// Outcome of collecting one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategoryStatus {
    /// Collection completed (possibly with zero readings).
    Ok,
    /// Collection hit a fatal condition; no readings for this category.
    Failed,
    /// Collection was turned off in configuration.
    #[default]
    Disabled,
}

impl std::fmt::Display for CategoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryStatus::Ok => write!(f, "ok"),
            CategoryStatus::Failed => write!(f, "failed"),
            CategoryStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// Error type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// No sensor source exists on the host.
    SourceUnavailable,
    /// CPU topology metadata could not be read or understood.
    TopologyUnreadable,
    /// Per-CPU time counters could not be read.
    CountersUnreadable,
    /// Configuration error.
    ConfigError,
    /// Other/unknown error.
    #[default]
    Other,
}

impl ErrorType {
    /// Human-readable description of the error kind.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorType::SourceUnavailable => "sensor source unavailable",
            ErrorType::TopologyUnreadable => "topology unreadable",
            ErrorType::CountersUnreadable => "counters unreadable",
            ErrorType::ConfigError => "configuration error",
            ErrorType::Other => "other",
        }
    }
}

/// Error report attached to a failed category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Timestamp (millis since epoch).
    pub timestamp: i64,
    /// Category that failed.
    pub category: Category,
    /// Error type classification.
    pub error_type: ErrorType,
    /// Error message.
    pub message: String,
    /// Whether the error is retryable.
    pub retryable: bool,
}

impl ErrorReport {
    /// Create a non-retryable report.
    pub fn new(
        timestamp: i64,
        category: Category,
        error_type: ErrorType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            category,
            error_type,
            message: message.into(),
            retryable: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_status_default() {
        assert_eq!(CategoryStatus::default(), CategoryStatus::Disabled);
    }

    #[test]
    fn test_category_status_display() {
        assert_eq!(format!("{}", CategoryStatus::Ok), "ok");
        assert_eq!(format!("{}", CategoryStatus::Failed), "failed");
        assert_eq!(format!("{}", CategoryStatus::Disabled), "disabled");
    }

    #[test]
    fn test_error_type_description() {
        assert_eq!(
            ErrorType::SourceUnavailable.description(),
            "sensor source unavailable"
        );
        assert_eq!(
            ErrorType::TopologyUnreadable.description(),
            "topology unreadable"
        );
    }

    #[test]
    fn test_error_report_deserialize() {
        let json = r#"{
            "timestamp": 1703500000000,
            "category": "temperature",
            "error_type": "source_unavailable",
            "message": "no temperature sensor found",
            "retryable": false
        }"#;

        let report: ErrorReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.category, Category::Temperature);
        assert_eq!(report.error_type, ErrorType::SourceUnavailable);
        assert!(!report.retryable);
    }

    #[test]
    fn test_error_report_new_is_not_retryable() {
        let report = ErrorReport::new(
            0,
            Category::Utilization,
            ErrorType::CountersUnreadable,
            "boom",
        );
        assert!(!report.retryable);
        assert_eq!(report.message, "boom");
    }
}
