//! Configuration for the hardware collector.

use hwsight_common::{LoggingConfig, load_config};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::oob::{DelimitedDialect, OobDialect, OobPlatform, OobSource};
use crate::temperature::ChipAllowList;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] hwsight_common::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete collector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Hostname reported in snapshots.
    /// Use "auto" to detect automatically (default).
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Directory that `/sys` and `/proc` paths are resolved against
    /// (default: "/"). Applies to temperature discovery and utilization
    /// sampling alike; useful in containers with the host mounted elsewhere.
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,

    /// Which categories to collect.
    #[serde(default)]
    pub collect: CollectConfig,

    /// Temperature discovery settings.
    #[serde(default)]
    pub temperature: TemperatureConfig,

    /// Out-of-band sensor settings.
    #[serde(default)]
    pub oob: OobConfig,

    /// Snapshot output format.
    #[serde(default)]
    pub output: OutputFormat,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_hostname() -> String {
    "auto".to_string()
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            sysfs_root: default_sysfs_root(),
            collect: CollectConfig::default(),
            temperature: TemperatureConfig::default(),
            oob: OobConfig::default(),
            output: OutputFormat::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration for which categories to collect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectConfig {
    /// Collect per-logical-CPU utilization.
    #[serde(default = "default_true")]
    pub utilization: bool,

    /// Collect per-core temperatures.
    #[serde(default = "default_true")]
    pub temperature: bool,

    /// Collect BMC sensors through the platform's IPMI tool.
    #[serde(default = "default_true")]
    pub oob: bool,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            utilization: true,
            temperature: true,
            oob: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Temperature discovery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemperatureConfig {
    /// hwmon chip names accepted in addition to `coretemp` and `k10temp`.
    #[serde(default)]
    pub extra_chip_names: Vec<String>,
}

fn default_sysfs_root() -> PathBuf {
    PathBuf::from("/")
}

impl TemperatureConfig {
    /// Build the chip allow-list.
    pub fn allow_list(&self) -> ChipAllowList {
        ChipAllowList::builtin().with_extra(self.extra_chip_names.iter().cloned())
    }
}

/// Platform selection for the IPMI tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformSelection {
    /// Pick by build target (default).
    #[default]
    Auto,
    /// `ipmitool sensor`.
    Ipmitool,
    /// `ipmiutil sensor`.
    Ipmiutil,
}

impl PlatformSelection {
    /// Resolve to a concrete platform.
    pub fn resolve(&self) -> OobPlatform {
        match self {
            PlatformSelection::Auto => OobPlatform::detect(),
            PlatformSelection::Ipmitool => OobPlatform::Ipmitool,
            PlatformSelection::Ipmiutil => OobPlatform::Ipmiutil,
        }
    }
}

/// Out-of-band sensor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OobConfig {
    /// Which IPMI tool and output dialect to use.
    #[serde(default)]
    pub platform: PlatformSelection,

    /// Override the program path.
    #[serde(default)]
    pub command: Option<String>,

    /// Override the program arguments.
    #[serde(default)]
    pub args: Option<Vec<String>>,

    /// Field separator of the delimited dialect (default: "|").
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for OobConfig {
    fn default() -> Self {
        Self {
            platform: PlatformSelection::default(),
            command: None,
            args: None,
            separator: default_separator(),
        }
    }
}

fn default_separator() -> String {
    "|".to_string()
}

impl OobConfig {
    /// Resolve the command and dialect to use.
    ///
    /// Call after [`CollectorConfig::validate`]; an invalid separator falls
    /// back to `|`.
    pub fn source(&self) -> OobSource {
        let mut source = OobSource::for_platform(self.platform.resolve());

        if let Some(command) = &self.command {
            source.command = command.clone();
        }
        if let Some(args) = &self.args {
            source.args = args.clone();
        }
        if let (OobDialect::Delimited(_), Some(separator)) =
            (source.dialect, separator_byte(&self.separator))
        {
            source.dialect = OobDialect::Delimited(DelimitedDialect::new(separator));
        }

        source
    }
}

fn separator_byte(separator: &str) -> Option<u8> {
    match separator.as_bytes() {
        [b] if b.is_ascii() => Some(*b),
        _ => None,
    }
}

/// Snapshot output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON (default).
    #[default]
    Json,
    /// CBOR bytes.
    Cbor,
    /// One `<key> <value>` line per reading.
    Text,
}

impl CollectorConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: CollectorConfig = load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let collect = &self.collect;
        if !collect.utilization && !collect.temperature && !collect.oob {
            return Err(ConfigError::Validation(
                "At least one category must be enabled".to_string(),
            ));
        }

        if separator_byte(&self.oob.separator).is_none() {
            return Err(ConfigError::Validation(format!(
                "oob.separator must be a single ASCII character, got '{}'",
                self.oob.separator
            )));
        }

        if matches!(&self.oob.command, Some(c) if c.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "oob.command must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the hostname to use, resolving "auto" if needed.
    pub fn get_hostname(&self) -> String {
        if self.hostname == "auto" {
            hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string())
        } else {
            self.hostname.clone()
        }
    }
}
