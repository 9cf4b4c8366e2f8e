//! One-shot host snapshot across all collection categories.

use crate::config::CollectorConfig;
use crate::error::CollectError;
use crate::exec::{CommandRunner, ProcessRunner};
use crate::oob::{OobSource, collect_oob};
use crate::sysfs::{FileSystem, HostFs};
use crate::temperature::{ChipAllowList, discover_temperatures};
use crate::utilization::{CpuStatSource, HostCpuSource, sample_utilization};
use hwsight_common::{Category, CategoryStatus, ErrorReport, KeyBuilder, SensorReading};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Readings and outcome of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: Category,
    pub status: CategoryStatus,
    pub readings: Vec<SensorReading>,
    /// Single host-wide value reported next to the per-core readings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<SensorReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl CategoryReport {
    fn ok(category: Category, readings: Vec<SensorReading>) -> Self {
        Self {
            category,
            status: CategoryStatus::Ok,
            readings,
            aggregate: None,
            error: None,
        }
    }

    fn failed(category: Category, timestamp: i64, err: &CollectError) -> Self {
        Self {
            category,
            status: CategoryStatus::Failed,
            readings: Vec::new(),
            aggregate: None,
            error: Some(ErrorReport::new(
                timestamp,
                category,
                err.kind(),
                err.to_string(),
            )),
        }
    }

    fn disabled(category: Category) -> Self {
        Self {
            category,
            status: CategoryStatus::Disabled,
            readings: Vec::new(),
            aggregate: None,
            error: None,
        }
    }
}

/// Everything collected in one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSnapshot {
    /// Unix epoch milliseconds when collection started.
    pub timestamp: i64,
    pub hostname: String,
    pub categories: Vec<CategoryReport>,
}

impl HostSnapshot {
    /// Report for one category.
    pub fn category(&self, category: Category) -> Option<&CategoryReport> {
        self.categories.iter().find(|r| r.category == category)
    }

    /// Render as `hwsight/<category>/<host>/<key> <value>` lines.
    ///
    /// Failed categories produce a single `@/error` line; disabled ones
    /// produce nothing.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        for report in &self.categories {
            let keys = KeyBuilder::new(report.category);

            if let Some(error) = &report.error {
                lines.push(format!(
                    "{} {}: {}",
                    keys.error_key(&self.hostname),
                    error.error_type.description(),
                    error.message
                ));
            }
            if let Some(aggregate) = &report.aggregate {
                lines.push(format!(
                    "{} {}",
                    keys.build(&self.hostname, aggregate.key()),
                    aggregate.value()
                ));
            }
            for reading in &report.readings {
                lines.push(format!(
                    "{} {}",
                    keys.build(&self.hostname, reading.key()),
                    reading.value()
                ));
            }
        }

        lines
    }
}

/// Collector for hardware health snapshots.
///
/// Holds no state between snapshots; every call re-reads topology and
/// re-discovers the sensor hierarchy.
pub struct HostCollector {
    hostname: String,
    config: CollectorConfig,
    allow_list: ChipAllowList,
    oob_source: OobSource,
    fs: Box<dyn FileSystem>,
    runner: Box<dyn CommandRunner>,
    cpu: Box<dyn CpuStatSource>,
}

impl HostCollector {
    /// Create a collector reading from the real host.
    pub fn new(hostname: String, config: CollectorConfig) -> Self {
        Self {
            allow_list: config.temperature.allow_list(),
            oob_source: config.oob.source(),
            fs: Box::new(HostFs::with_root(&config.sysfs_root)),
            runner: Box::new(ProcessRunner),
            cpu: Box::new(HostCpuSource::with_root(&config.sysfs_root)),
            hostname,
            config,
        }
    }

    /// Replace the file access layer.
    pub fn with_fs(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Box::new(fs);
        self
    }

    /// Replace the process execution helper.
    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    /// Replace the CPU topology/counter source.
    pub fn with_cpu_source(mut self, cpu: impl CpuStatSource + 'static) -> Self {
        self.cpu = Box::new(cpu);
        self
    }

    /// Hostname reported in snapshots.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Whether a category is enabled in configuration.
    pub fn is_enabled(&self, category: Category) -> bool {
        let collect = &self.config.collect;
        match category {
            Category::Utilization => collect.utilization,
            Category::Temperature => collect.temperature,
            Category::Oob => collect.oob,
        }
    }

    /// Collect every enabled category.
    pub fn snapshot(&self) -> HostSnapshot {
        self.snapshot_of(&Category::ALL)
    }

    /// Collect the given categories (if enabled), in [`Category::ALL`] order.
    pub fn snapshot_of(&self, only: &[Category]) -> HostSnapshot {
        let timestamp = chrono::Utc::now().timestamp_millis();

        let categories: Vec<CategoryReport> = Category::ALL
            .into_iter()
            .filter(|c| only.contains(c))
            .map(|category| {
                if self.is_enabled(category) {
                    self.collect(category, timestamp)
                } else {
                    debug!("Skipping disabled category '{}'", category);
                    CategoryReport::disabled(category)
                }
            })
            .collect();

        let readings: usize = categories.iter().map(|r| r.readings.len()).sum();
        info!(
            "Collected {} readings for '{}' ({} categories)",
            readings,
            self.hostname,
            categories.len()
        );

        HostSnapshot {
            timestamp,
            hostname: self.hostname.clone(),
            categories,
        }
    }

    /// Collect one category; fatal errors become a failed report.
    pub fn collect(&self, category: Category, timestamp: i64) -> CategoryReport {
        match category {
            Category::Utilization => match sample_utilization(self.cpu.as_ref()) {
                Ok(readings) => CategoryReport::ok(category, readings),
                Err(e) => self.fail(category, timestamp, e),
            },
            Category::Temperature => {
                match discover_temperatures(self.fs.as_ref(), &self.allow_list) {
                    Ok(report) => {
                        let mut result = CategoryReport::ok(category, report.samples);
                        result.aggregate = report.probe.to_reading();
                        result
                    }
                    Err(e) => self.fail(category, timestamp, e),
                }
            }
            Category::Oob => {
                CategoryReport::ok(category, collect_oob(self.runner.as_ref(), &self.oob_source))
            }
        }
    }

    fn fail(&self, category: Category, timestamp: i64, err: CollectError) -> CategoryReport {
        warn!("Failed to collect {} on '{}': {}", category, self.hostname, err);
        CategoryReport::failed(category, timestamp, &err)
    }
}
