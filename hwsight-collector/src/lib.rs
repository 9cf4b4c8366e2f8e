//! Hardware health collector.
//!
//! Takes a single snapshot of three independent categories and normalizes
//! each into `{key, value}` readings:
//!
//! - [`utilization`]: busy percentage per logical CPU, keyed by physical core
//! - [`temperature`]: per-core temperature from recognized hwmon chips
//! - [`oob`]: BMC sensors parsed from `ipmitool`/`ipmiutil` output
//!
//! # Keys
//!
//! ```text
//! hwsight/utilization/<hostname>/<physical id>-<core id>
//! hwsight/temperature/<hostname>/<chip>-<channel>
//! hwsight/temperature/<hostname>/probe
//! hwsight/oob/<hostname>/<sensor name>
//! ```

pub mod args;
pub mod collector;
pub mod config;
pub mod error;
pub mod exec;
pub mod oob;
pub mod sysfs;
pub mod temperature;
pub mod utilization;

pub use collector::{CategoryReport, HostCollector, HostSnapshot};
pub use config::{CollectorConfig, ConfigError, OutputFormat};
pub use error::{CollectError, Result};
