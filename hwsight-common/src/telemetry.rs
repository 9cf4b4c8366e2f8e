use serde::{Deserialize, Serialize};

/// A single already-stringified sensor measurement.
///
/// The key identifies the measurement point (a `socket-core` identity, a
/// `chip-channel` pair, or a management-controller sensor name). The value is
/// kept as text; further parsing is up to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorReading {
    key: String,
    value: String,
}

impl SensorReading {
    /// Create a new reading.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The measurement key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The measured value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Split the reading into its key and value.
    pub fn into_parts(self) -> (String, String) {
        (self.key, self.value)
    }
}

impl std::fmt::Display for SensorReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Which acquisition component produced a set of readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Per-logical-CPU busy percentage.
    Utilization,
    /// Per-core temperature from the hwmon hierarchy.
    Temperature,
    /// Out-of-band management controller sensors.
    Oob,
}

impl Category {
    /// All categories in collection order.
    pub const ALL: [Category; 3] = [Category::Utilization, Category::Temperature, Category::Oob];

    /// Get the string representation used in output keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Utilization => "utilization",
            Category::Temperature => "temperature",
            Category::Oob => "oob",
        }
    }

    /// Parse a category from its string representation.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "utilization" => Some(Category::Utilization),
            "temperature" => Some(Category::Temperature),
            "oob" => Some(Category::Oob),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
