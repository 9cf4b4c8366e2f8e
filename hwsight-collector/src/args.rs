//! CLI argument parsing.

use std::path::PathBuf;

use clap::Parser;
use hwsight_common::Category;

use crate::config::OutputFormat;

/// Take one hardware health snapshot and print it.
#[derive(Parser, Debug, Clone)]
#[command(name = "hwsight", version, about = "Hardware health snapshot collector")]
pub struct CollectorArgs {
    /// Path to configuration file (JSON5). Built-in defaults are used when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override output format.
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Only collect these categories (utilization, temperature, oob).
    #[arg(long, value_parser = parse_category)]
    pub only: Vec<Category>,
}

impl CollectorArgs {
    /// Categories requested on the command line, or all of them.
    pub fn categories(&self) -> Vec<Category> {
        if self.only.is_empty() {
            Category::ALL.to_vec()
        } else {
            self.only.clone()
        }
    }
}

fn parse_category(s: &str) -> Result<Category, String> {
    Category::from_str_opt(s).ok_or_else(|| {
        format!(
            "unknown category '{}' (expected utilization, temperature or oob)",
            s
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CollectorArgs::try_parse_from(["hwsight"]).unwrap();
        assert!(args.config.is_none());
        assert!(args.format.is_none());
        assert_eq!(args.categories(), Category::ALL.to_vec());
    }

    #[test]
    fn test_full_args() {
        let args = CollectorArgs::try_parse_from([
            "hwsight",
            "--config",
            "hwsight.json5",
            "--log-level",
            "debug",
            "--format",
            "text",
            "--only",
            "temperature",
            "--only",
            "oob",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("hwsight.json5")));
        assert_eq!(args.log_level, Some("debug".to_string()));
        assert_eq!(args.format, Some(OutputFormat::Text));
        assert_eq!(args.categories(), vec![Category::Temperature, Category::Oob]);
    }

    #[test]
    fn test_unknown_category_rejected() {
        assert!(CollectorArgs::try_parse_from(["hwsight", "--only", "memory"]).is_err());
    }
}
