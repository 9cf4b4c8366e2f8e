//! Hardware health snapshot collector.
//!
//! Collects per-core CPU utilization, per-core temperatures and BMC sensor
//! readings once, writes the snapshot to stdout and exits.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use hwsight_common::{Format, encode, init_tracing};

use hwsight_collector::args::CollectorArgs;
use hwsight_collector::collector::HostCollector;
use hwsight_collector::config::{CollectorConfig, OutputFormat};

fn main() -> Result<()> {
    let args = CollectorArgs::parse();

    let mut config = match &args.config {
        Some(path) => CollectorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => CollectorConfig::default(),
    };

    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = args.format {
        config.output = format;
    }

    init_tracing(&config.logging)?;

    let hostname = config.get_hostname();
    let output = config.output;

    tracing::info!(
        "Collecting snapshot for '{}' (utilization: {}, temperature: {}, oob: {})",
        hostname,
        config.collect.utilization,
        config.collect.temperature,
        config.collect.oob
    );

    let collector = HostCollector::new(hostname, config);
    let snapshot = collector.snapshot_of(&args.categories());

    let bytes = match output {
        OutputFormat::Json => {
            let mut bytes = serde_json::to_vec_pretty(&snapshot)?;
            bytes.push(b'\n');
            bytes
        }
        OutputFormat::Cbor => encode(&snapshot, Format::Cbor)?,
        OutputFormat::Text => {
            let mut text = snapshot.to_lines().join("\n");
            text.push('\n');
            text.into_bytes()
        }
    };

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&bytes)
        .and_then(|_| stdout.flush())
        .context("Failed to write snapshot")?;

    Ok(())
}
