//! Per-core CPU temperature discovery through hwmon.
//!
//! The hwmon layout differs between vendors and kernels, so nothing about it
//! is assumed up front:
//!
//! 1. A single-value thermal source must exist (thermal zone 0, or the first
//!    hwmon input as a fallback), otherwise the host has no sensor at all.
//! 2. The core count comes from the `cpu cores` line of `/proc/cpuinfo` and
//!    bounds both the chip slots (`hwmon0..=hwmonN`) and the channels
//!    (`temp1_input..=tempN_input`) that are probed.
//! 3. Only chips whose `name` is on the [`ChipAllowList`] contribute
//!    readings. Matched chips are numbered densely in discovery order.
//!
//! # Keys
//!
//! ```text
//! <matched chip index>-<channel - 1>     e.g. 0-0, 0-1, 1-0
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use hwsight_common::SensorReading;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CollectError, Result};
use crate::sysfs::FileSystem;

/// Thermal zone 0, present on most Intel hosts.
pub const PRIMARY_SOURCE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// First hwmon input, the usual fallback on AMD hosts.
pub const ALTERNATE_SOURCE: &str = "/sys/class/hwmon/hwmon0/temp1_input";

/// Core topology metadata.
pub const CPUINFO_PATH: &str = "/proc/cpuinfo";

/// Root of the numbered chip hierarchy.
pub const HWMON_ROOT: &str = "/sys/class/hwmon";

/// Key of the single-value probe reading.
pub const PROBE_KEY: &str = "probe";

static CPU_CORES_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^cpu cores\s*:\s*(\S*)").expect("valid cpu cores pattern"));

/// Known CPU temperature chip drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChipVendor {
    /// Intel `coretemp` driver.
    Coretemp,
    /// AMD Ryzen/EPYC `k10temp` driver.
    K10temp,
}

impl ChipVendor {
    /// Every built-in vendor.
    pub const ALL: [ChipVendor; 2] = [ChipVendor::Coretemp, ChipVendor::K10temp];

    /// The hwmon `name` the driver reports.
    pub fn chip_name(&self) -> &'static str {
        match self {
            ChipVendor::Coretemp => "coretemp",
            ChipVendor::K10temp => "k10temp",
        }
    }

    /// Look up a vendor by hwmon chip name.
    pub fn from_chip_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.chip_name() == name)
    }
}

/// Set of hwmon chip names accepted as CPU temperature sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipAllowList {
    names: BTreeSet<String>,
}

impl ChipAllowList {
    /// Allow-list holding every built-in [`ChipVendor`].
    pub fn builtin() -> Self {
        Self {
            names: ChipVendor::ALL
                .iter()
                .map(|v| v.chip_name().to_string())
                .collect(),
        }
    }

    /// Add extra chip names on top of the current set.
    pub fn with_extra<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Exact-match check on a trimmed chip name.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Iterate over the accepted names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for ChipAllowList {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Which single-value source answered the presence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeSource {
    Primary,
    Alternate,
}

/// Result of the single-value presence check.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReading {
    /// Which source was found.
    pub source: ProbeSource,
    /// Path that was read.
    pub path: PathBuf,
    /// Converted value, if the file could be read and parsed.
    pub celsius: Option<i64>,
}

impl ProbeReading {
    /// The probe value as a reading keyed [`PROBE_KEY`].
    pub fn to_reading(&self) -> Option<SensorReading> {
        self.celsius
            .map(|c| SensorReading::new(PROBE_KEY, c.to_string()))
    }
}

/// Everything one discovery pass produces.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureReport {
    /// The single-value source that proved a sensor exists.
    pub probe: ProbeReading,
    /// Core count taken from the topology file.
    pub core_count: usize,
    /// One reading per readable channel of each matched chip.
    pub samples: Vec<SensorReading>,
}

/// Convert a raw millidegree value to whole degrees Celsius (truncated).
pub fn millidegrees_to_celsius(raw: &str) -> Option<i64> {
    let milli: f64 = raw.trim().parse().ok()?;
    if !milli.is_finite() {
        return None;
    }
    Some((milli / 1000.0) as i64)
}

/// Check the primary then the alternate single-value source.
pub fn probe_source<F: FileSystem + ?Sized>(fs: &F) -> Result<ProbeReading> {
    let candidates = [
        (ProbeSource::Primary, PRIMARY_SOURCE),
        (ProbeSource::Alternate, ALTERNATE_SOURCE),
    ];

    let Some((source, path)) = candidates
        .into_iter()
        .find(|(_, path)| fs.exists(Path::new(path)))
    else {
        return Err(CollectError::SensorSourceUnavailable {
            checked: candidates.iter().map(|(_, p)| PathBuf::from(p)).collect(),
        });
    };

    let celsius = match fs.read_trimmed(Path::new(path)) {
        Ok(raw) => {
            let value = millidegrees_to_celsius(&raw);
            if value.is_none() {
                warn!("Unparsable temperature '{}' in {}", raw, path);
            }
            value
        }
        Err(e) => {
            warn!("Failed to read {}: {}", path, e);
            None
        }
    };

    debug!(?source, ?celsius, "Temperature source found at {}", path);

    Ok(ProbeReading {
        source,
        path: PathBuf::from(path),
        celsius,
    })
}

/// Extract the declared core count from `/proc/cpuinfo` contents.
///
/// The first `cpu cores` line decides; a missing line, a non-numeric value
/// and a zero count are all errors.
pub fn parse_core_count(cpuinfo: &[u8]) -> Result<usize> {
    let text = String::from_utf8_lossy(cpuinfo);

    let Some(caps) = text.lines().find_map(|line| CPU_CORES_LINE.captures(line)) else {
        return Err(CollectError::CoreCountUnavailable(
            "no 'cpu cores' line in topology metadata".to_string(),
        ));
    };

    let raw = caps.get(1).map_or("", |m| m.as_str());
    match raw.parse::<usize>() {
        Ok(0) => Err(CollectError::CoreCountUnavailable(
            "topology metadata declares 0 cores".to_string(),
        )),
        Ok(count) => Ok(count),
        Err(_) => Err(CollectError::CoreCountUnavailable(format!(
            "invalid core count '{}'",
            raw
        ))),
    }
}

/// Read the core count from the host topology file.
pub fn read_core_count<F: FileSystem + ?Sized>(fs: &F) -> Result<usize> {
    let cpuinfo = fs
        .read(Path::new(CPUINFO_PATH))
        .map_err(|e| CollectError::TopologyUnreadable(format!("{}: {}", CPUINFO_PATH, e)))?;
    parse_core_count(&cpuinfo)
}

/// Walk chip slots `0..=core_count` and channels `1..=core_count`.
///
/// Unreadable or unrecognized chips and unreadable channels are skipped.
pub fn walk_chips<F: FileSystem + ?Sized>(
    fs: &F,
    allow_list: &ChipAllowList,
    core_count: usize,
) -> Vec<SensorReading> {
    let root = Path::new(HWMON_ROOT);
    let mut samples = Vec::new();
    let mut chip_index = 0usize;

    for slot in 0..=core_count {
        let chip_dir = root.join(format!("hwmon{}", slot));

        let name = match fs.read_trimmed(&chip_dir.join("name")) {
            Ok(name) => name,
            Err(e) => {
                debug!("Skipping hwmon{}: {}", slot, e);
                continue;
            }
        };
        if !allow_list.contains(&name) {
            debug!("Skipping hwmon{}: chip '{}' not recognized", slot, name);
            continue;
        }

        for channel in 1..=core_count {
            let input = chip_dir.join(format!("temp{}_input", channel));
            let Ok(raw) = fs.read_trimmed(&input) else {
                continue;
            };
            let Some(celsius) = millidegrees_to_celsius(&raw) else {
                continue;
            };

            let key = format!("{}-{}", chip_index, channel - 1);
            debug!("{} temperature: {} C", key, celsius);
            samples.push(SensorReading::new(key, celsius.to_string()));
        }

        chip_index += 1;
    }

    if chip_index == 0 {
        debug!("No recognized temperature chip under {}", HWMON_ROOT);
    }

    samples
}

/// Run a complete discovery pass.
pub fn discover_temperatures<F: FileSystem + ?Sized>(
    fs: &F,
    allow_list: &ChipAllowList,
) -> Result<TemperatureReport> {
    let probe = probe_source(fs)?;
    let core_count = read_core_count(fs)?;
    let samples = walk_chips(fs, allow_list, core_count);

    Ok(TemperatureReport {
        probe,
        core_count,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;

    #[derive(Default)]
    struct MemFs {
        files: HashMap<PathBuf, Vec<u8>>,
    }

    impl MemFs {
        fn with(mut self, path: &str, content: &str) -> Self {
            self.files.insert(PathBuf::from(path), content.as_bytes().to_vec());
            self
        }
    }

    impl FileSystem for MemFs {
        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.contains_key(path)
        }
    }

    #[test]
    fn test_millidegree_conversion() {
        assert_eq!(millidegrees_to_celsius("45000"), Some(45));
        assert_eq!(millidegrees_to_celsius("52999\n"), Some(52));
        assert_eq!(millidegrees_to_celsius(" 38500 "), Some(38));
        assert_eq!(millidegrees_to_celsius("-5500"), Some(-5));
        assert_eq!(millidegrees_to_celsius("hot"), None);
        assert_eq!(millidegrees_to_celsius(""), None);
        assert_eq!(millidegrees_to_celsius("NaN"), None);
    }

    #[test]
    fn test_core_count() {
        let cpuinfo = b"processor\t: 0\nmodel name\t: Test CPU\ncpu cores\t: 4\n";
        assert_eq!(parse_core_count(cpuinfo).unwrap(), 4);
    }

    #[test]
    fn test_core_count_first_line_wins() {
        let cpuinfo = b"cpu cores : 8\ncpu cores : 2\n";
        assert_eq!(parse_core_count(cpuinfo).unwrap(), 8);
    }

    #[test]
    fn test_core_count_missing_line() {
        let err = parse_core_count(b"processor : 0\nflags : fpu\n").unwrap_err();
        assert!(matches!(err, CollectError::CoreCountUnavailable(_)));
    }

    #[test]
    fn test_core_count_zero() {
        let err = parse_core_count(b"cpu cores : 0\n").unwrap_err();
        assert!(matches!(err, CollectError::CoreCountUnavailable(_)));
    }

    #[test]
    fn test_core_count_not_numeric() {
        let err = parse_core_count(b"cpu cores : many\n").unwrap_err();
        assert!(matches!(err, CollectError::CoreCountUnavailable(_)));
    }

    #[test]
    fn test_probe_prefers_primary() {
        let fs = MemFs::default()
            .with(PRIMARY_SOURCE, "41000\n")
            .with(ALTERNATE_SOURCE, "60000\n");

        let probe = probe_source(&fs).unwrap();
        assert_eq!(probe.source, ProbeSource::Primary);
        assert_eq!(probe.celsius, Some(41));
        assert_eq!(probe.to_reading(), Some(SensorReading::new("probe", "41")));
    }

    #[test]
    fn test_probe_falls_back_to_alternate() {
        let fs = MemFs::default().with(ALTERNATE_SOURCE, "60000\n");

        let probe = probe_source(&fs).unwrap();
        assert_eq!(probe.source, ProbeSource::Alternate);
        assert_eq!(probe.celsius, Some(60));
    }

    #[test]
    fn test_probe_unparsable_value_is_not_fatal() {
        let fs = MemFs::default().with(PRIMARY_SOURCE, "garbage");

        let probe = probe_source(&fs).unwrap();
        assert_eq!(probe.celsius, None);
        assert_eq!(probe.to_reading(), None);
    }

    #[test]
    fn test_no_source_is_fatal() {
        let err = probe_source(&MemFs::default()).unwrap_err();
        assert!(matches!(err, CollectError::SensorSourceUnavailable { .. }));
    }

    #[test]
    fn test_coretemp_chip() {
        let fs = MemFs::default()
            .with("/sys/class/hwmon/hwmon0/name", "coretemp\n")
            .with("/sys/class/hwmon/hwmon0/temp1_input", "45000\n")
            .with("/sys/class/hwmon/hwmon0/temp2_input", "52000\n");

        let samples = walk_chips(&fs, &ChipAllowList::builtin(), 4);
        assert_eq!(
            samples,
            vec![
                SensorReading::new("0-0", "45"),
                SensorReading::new("0-1", "52"),
            ]
        );
    }

    #[test]
    fn test_unknown_vendor_contributes_nothing() {
        let fs = MemFs::default()
            .with("/sys/class/hwmon/hwmon0/name", "unknown_vendor\n")
            .with("/sys/class/hwmon/hwmon0/temp1_input", "45000\n")
            .with("/sys/class/hwmon/hwmon0/temp2_input", "52000\n");

        assert!(walk_chips(&fs, &ChipAllowList::builtin(), 4).is_empty());
    }

    #[test]
    fn test_chip_index_counts_matched_slots_only() {
        let fs = MemFs::default()
            .with("/sys/class/hwmon/hwmon0/name", "acpitz\n")
            .with("/sys/class/hwmon/hwmon0/temp1_input", "27000\n")
            .with("/sys/class/hwmon/hwmon2/name", "k10temp\n")
            .with("/sys/class/hwmon/hwmon2/temp1_input", "61000\n");

        let samples = walk_chips(&fs, &ChipAllowList::builtin(), 2);
        assert_eq!(samples, vec![SensorReading::new("0-0", "61")]);
    }

    #[test]
    fn test_bad_channel_is_skipped() {
        let fs = MemFs::default()
            .with("/sys/class/hwmon/hwmon0/name", "coretemp")
            .with("/sys/class/hwmon/hwmon0/temp1_input", "oops")
            .with("/sys/class/hwmon/hwmon0/temp3_input", "70000")
            .with("/sys/class/hwmon/hwmon1/name", "coretemp")
            .with("/sys/class/hwmon/hwmon1/temp2_input", "71000");

        let samples = walk_chips(&fs, &ChipAllowList::builtin(), 3);
        assert_eq!(
            samples,
            vec![
                SensorReading::new("0-2", "70"),
                SensorReading::new("1-1", "71"),
            ]
        );
    }

    #[test]
    fn test_slots_bounded_by_core_count() {
        // With 1 core only hwmon0..=hwmon1 and temp1 are probed.
        let fs = MemFs::default()
            .with("/sys/class/hwmon/hwmon1/name", "coretemp")
            .with("/sys/class/hwmon/hwmon1/temp1_input", "40000")
            .with("/sys/class/hwmon/hwmon1/temp2_input", "41000")
            .with("/sys/class/hwmon/hwmon2/name", "coretemp")
            .with("/sys/class/hwmon/hwmon2/temp1_input", "42000");

        let samples = walk_chips(&fs, &ChipAllowList::builtin(), 1);
        assert_eq!(samples, vec![SensorReading::new("0-0", "40")]);
    }

    #[test]
    fn test_extra_chip_names() {
        let fs = MemFs::default()
            .with("/sys/class/hwmon/hwmon0/name", "zenpower")
            .with("/sys/class/hwmon/hwmon0/temp1_input", "55000");

        assert!(walk_chips(&fs, &ChipAllowList::builtin(), 1).is_empty());

        let allow = ChipAllowList::builtin().with_extra(["zenpower"]);
        assert_eq!(
            walk_chips(&fs, &allow, 1),
            vec![SensorReading::new("0-0", "55")]
        );
    }

    #[test]
    fn test_vendor_lookup() {
        assert_eq!(
            ChipVendor::from_chip_name("coretemp"),
            Some(ChipVendor::Coretemp)
        );
        assert_eq!(
            ChipVendor::from_chip_name("k10temp"),
            Some(ChipVendor::K10temp)
        );
        assert_eq!(ChipVendor::from_chip_name("nct6775"), None);
        assert_eq!(ChipAllowList::builtin().names().count(), 2);
    }

    #[test]
    fn test_discover_full_pass() {
        let fs = MemFs::default()
            .with(PRIMARY_SOURCE, "47000")
            .with(CPUINFO_PATH, "processor : 0\ncpu cores : 2\n")
            .with("/sys/class/hwmon/hwmon0/name", "coretemp")
            .with("/sys/class/hwmon/hwmon0/temp1_input", "45000")
            .with("/sys/class/hwmon/hwmon0/temp2_input", "52000");

        let report = discover_temperatures(&fs, &ChipAllowList::default()).unwrap();
        assert_eq!(report.core_count, 2);
        assert_eq!(report.probe.celsius, Some(47));
        assert_eq!(report.samples.len(), 2);
        // The probe value is kept apart from the per-core samples.
        assert!(report.samples.iter().all(|s| s.key() != PROBE_KEY));
    }

    #[test]
    fn test_discover_unreadable_topology() {
        let fs = MemFs::default().with(PRIMARY_SOURCE, "47000");

        let err = discover_temperatures(&fs, &ChipAllowList::default()).unwrap_err();
        assert!(matches!(err, CollectError::TopologyUnreadable(_)));
    }
}
