//! Out-of-band (BMC/IPMI) sensor collection.
//!
//! The diagnostic tool differs per platform and so does its output layout.
//! A [`Dialect`] is chosen once per host and turns the raw output into
//! readings; lines it does not understand are dropped.

use hwsight_common::SensorReading;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::exec::CommandRunner;

/// Sensor line of `ipmiutil sensor`, e.g.
/// `0004 SDR Full 01 01 20 a 01 snum 30 CPU Temp        = 2d OK   45.00 degrees C`.
static IPMIUTIL_SENSOR_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9A-Fa-f]+\s+.*\s+snum [0-9A-Fa-f]+ (.*)\s+= [0-9A-Fa-f]+ (?:OK)?(.*)?")
        .expect("valid ipmiutil sensor pattern")
});

/// Text layout of a diagnostic tool's output.
pub trait Dialect {
    /// Parse raw output into readings, skipping lines that do not fit.
    fn parse(&self, output: &[u8]) -> Vec<SensorReading>;
}

/// Field-separated lines (`ipmitool sensor`): field 0 is the key, field 1
/// the value, both kept verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedDialect {
    separator: u8,
}

impl DelimitedDialect {
    /// Dialect splitting on `separator`.
    pub fn new(separator: u8) -> Self {
        Self { separator }
    }

    /// The field separator.
    pub fn separator(&self) -> u8 {
        self.separator
    }
}

impl Default for DelimitedDialect {
    fn default() -> Self {
        Self::new(b'|')
    }
}

impl Dialect for DelimitedDialect {
    fn parse(&self, output: &[u8]) -> Vec<SensorReading> {
        output
            .split(|b| *b == b'\n')
            .filter_map(|line| {
                let mut fields = line.split(|b| *b == self.separator);
                let key = fields.next()?;
                let value = fields.next()?;
                Some(SensorReading::new(
                    String::from_utf8_lossy(key),
                    String::from_utf8_lossy(value),
                ))
            })
            .collect()
    }
}

/// Fixed-width `ipmiutil sensor` lines matched by a fixed pattern; the
/// sensor name and the trailing reading are trimmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternDialect;

impl Dialect for PatternDialect {
    fn parse(&self, output: &[u8]) -> Vec<SensorReading> {
        output
            .split(|b| *b == b'\n')
            .filter_map(|line| {
                let line = String::from_utf8_lossy(line);
                let caps = IPMIUTIL_SENSOR_LINE.captures(&line)?;
                let key = caps.get(1).map_or("", |m| m.as_str()).trim();
                let value = caps.get(2).map_or("", |m| m.as_str()).trim();
                Some(SensorReading::new(key, value))
            })
            .collect()
    }
}

/// Diagnostic tool available on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OobPlatform {
    /// `ipmitool sensor`, pipe-delimited (Linux).
    Ipmitool,
    /// `ipmiutil sensor`, fixed-width text (Windows).
    Ipmiutil,
}

impl OobPlatform {
    /// Platform matching the build target.
    pub fn detect() -> Self {
        if cfg!(windows) {
            OobPlatform::Ipmiutil
        } else {
            OobPlatform::Ipmitool
        }
    }

    /// Program to run.
    pub fn default_command(&self) -> &'static str {
        match self {
            OobPlatform::Ipmitool => "ipmitool",
            OobPlatform::Ipmiutil => "ipmiutil\\ipmiutil.exe",
        }
    }

    /// Arguments for the sensor listing.
    pub fn default_args(&self) -> Vec<String> {
        vec!["sensor".to_string()]
    }
}

/// Parsed-output dialect, selected once per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OobDialect {
    Delimited(DelimitedDialect),
    Pattern(PatternDialect),
}

impl Dialect for OobDialect {
    fn parse(&self, output: &[u8]) -> Vec<SensorReading> {
        match self {
            OobDialect::Delimited(d) => d.parse(output),
            OobDialect::Pattern(d) => d.parse(output),
        }
    }
}

/// A resolved command plus the dialect for its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OobSource {
    pub command: String,
    pub args: Vec<String>,
    pub dialect: OobDialect,
}

impl OobSource {
    /// Default command and dialect for a platform.
    pub fn for_platform(platform: OobPlatform) -> Self {
        let dialect = match platform {
            OobPlatform::Ipmitool => OobDialect::Delimited(DelimitedDialect::default()),
            OobPlatform::Ipmiutil => OobDialect::Pattern(PatternDialect),
        };
        Self {
            command: platform.default_command().to_string(),
            args: platform.default_args(),
            dialect,
        }
    }

    /// Default source for the build target.
    pub fn detect() -> Self {
        Self::for_platform(OobPlatform::detect())
    }
}

/// Run the diagnostic tool and parse its output.
///
/// Never fails: a tool that cannot run produces no readings.
pub fn collect_oob<R: CommandRunner + ?Sized>(runner: &R, source: &OobSource) -> Vec<SensorReading> {
    let args: Vec<&str> = source.args.iter().map(String::as_str).collect();
    let output = runner.run(&source.command, &args);
    let readings = source.dialect.parse(&output);

    for reading in &readings {
        debug!("Sensor: {}, Value: {}", reading.key(), reading.value());
    }

    readings
}
