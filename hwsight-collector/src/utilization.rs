//! Per-logical-CPU utilization sampling.
//!
//! Each logical CPU is labelled with its physical core identity
//! (`<physical id>-<core id>`) and reports the busy share of its cumulative
//! time counters. Hyperthreads sharing a core produce separate readings with
//! the same key.

use std::collections::HashMap;
use std::path::PathBuf;

use hwsight_common::SensorReading;
use tracing::debug;

use crate::error::{CollectError, Result};

/// Physical placement of one logical CPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuTopology {
    /// Logical CPU index as reported by the platform.
    pub cpu: usize,
    /// Socket identifier.
    pub physical_id: String,
    /// Core identifier within the socket.
    pub core_id: String,
}

impl CpuTopology {
    /// Composite `<physical id>-<core id>` identity.
    pub fn identity(&self) -> String {
        format!("{}-{}", self.physical_id, self.core_id)
    }
}

/// Cumulative time-in-state counters of one logical CPU, in ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuCounters {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuCounters {
    /// Sum of all categories.
    ///
    /// Saturates at `u64::MAX` rather than wrapping on corrupt counters.
    pub fn total(&self) -> u64 {
        [
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .into_iter()
        .fold(self.user, u64::saturating_add)
    }

    /// Busy share since boot, truncated to a whole percentage in `0..=100`.
    ///
    /// This is a ratio of cumulative counters, not a rate over an interval.
    pub fn busy_percent(&self) -> u32 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        let busy = total.saturating_sub(self.idle);
        (busy as f64 / total as f64 * 100.0) as u32
    }
}

/// Source of CPU topology and time counters.
///
/// The two reads are independent; no atomic snapshot is implied.
pub trait CpuStatSource {
    /// Read the placement of every logical CPU.
    fn topology(&self) -> Result<Vec<CpuTopology>>;

    /// Read the cumulative counters of every logical CPU, in platform order.
    fn counters(&self) -> Result<Vec<CpuCounters>>;
}

/// Map each logical CPU index to its composite core identity.
pub fn identity_map(topology: &[CpuTopology]) -> HashMap<usize, String> {
    topology
        .iter()
        .map(|entry| (entry.cpu, entry.identity()))
        .collect()
}

/// Take one utilization reading per logical CPU.
///
/// A CPU missing from the topology is reported under an empty key.
pub fn sample_utilization<S: CpuStatSource + ?Sized>(source: &S) -> Result<Vec<SensorReading>> {
    let identities = identity_map(&source.topology()?);
    let counters = source.counters()?;

    let readings = counters
        .iter()
        .enumerate()
        .map(|(index, counters)| {
            let key = identities.get(&index).cloned().unwrap_or_else(|| {
                debug!(cpu = index, "Logical CPU missing from topology");
                String::new()
            });
            let value = counters.busy_percent();
            debug!("Core {} usage: {}", key, value);
            SensorReading::new(key, value.to_string())
        })
        .collect();

    Ok(readings)
}

/// [`CpuStatSource`] reading `<root>/proc/cpuinfo` and `<root>/proc/stat`
/// through procfs.
#[cfg(target_os = "linux")]
#[derive(Debug, Clone)]
pub struct ProcfsCpuSource {
    root: PathBuf,
}

#[cfg(target_os = "linux")]
impl ProcfsCpuSource {
    /// Source reading the live `/proc`.
    pub fn new() -> Self {
        Self::with_root("/")
    }

    /// Source reading `proc/` below another directory, e.g. a host mount.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn proc_file(&self, name: &str) -> PathBuf {
        self.root.join("proc").join(name)
    }
}

#[cfg(target_os = "linux")]
impl Default for ProcfsCpuSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "linux")]
impl CpuStatSource for ProcfsCpuSource {
    fn topology(&self) -> Result<Vec<CpuTopology>> {
        use procfs::FromRead;

        let path = self.proc_file("cpuinfo");
        let info = procfs::CpuInfo::from_file(&path)
            .map_err(|e| CollectError::TopologyUnreadable(format!("{}: {}", path.display(), e)))?;

        let topology = (0..info.num_cores())
            .map(|i| CpuTopology {
                cpu: info
                    .get_field(i, "processor")
                    .and_then(|p| p.trim().parse().ok())
                    .unwrap_or(i),
                physical_id: info.get_field(i, "physical id").unwrap_or("").to_string(),
                core_id: info.get_field(i, "core id").unwrap_or("").to_string(),
            })
            .collect();

        Ok(topology)
    }

    fn counters(&self) -> Result<Vec<CpuCounters>> {
        use procfs::FromReadSI;

        let path = self.proc_file("stat");
        let stat = procfs::KernelStats::from_file(&path, procfs::current_system_info())
            .map_err(|e| CollectError::CountersUnreadable(format!("{}: {}", path.display(), e)))?;

        let counters = stat
            .cpu_time
            .iter()
            .map(|cpu| CpuCounters {
                user: cpu.user,
                nice: cpu.nice,
                system: cpu.system,
                idle: cpu.idle,
                iowait: cpu.iowait.unwrap_or(0),
                irq: cpu.irq.unwrap_or(0),
                softirq: cpu.softirq.unwrap_or(0),
                steal: cpu.steal.unwrap_or(0),
            })
            .collect();

        Ok(counters)
    }
}

/// Placeholder source for platforms without procfs.
#[cfg(not(target_os = "linux"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedCpuSource;

#[cfg(not(target_os = "linux"))]
impl UnsupportedCpuSource {
    pub fn with_root(_root: impl Into<PathBuf>) -> Self {
        Self
    }
}

#[cfg(not(target_os = "linux"))]
impl CpuStatSource for UnsupportedCpuSource {
    fn topology(&self) -> Result<Vec<CpuTopology>> {
        Err(CollectError::TopologyUnreadable(
            "per-CPU topology is only available on Linux".to_string(),
        ))
    }

    fn counters(&self) -> Result<Vec<CpuCounters>> {
        Err(CollectError::CountersUnreadable(
            "per-CPU counters are only available on Linux".to_string(),
        ))
    }
}

/// The CPU source for the current platform.
#[cfg(target_os = "linux")]
pub type HostCpuSource = ProcfsCpuSource;

/// The CPU source for the current platform.
#[cfg(not(target_os = "linux"))]
pub type HostCpuSource = UnsupportedCpuSource;
