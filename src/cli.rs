//! CLI Module
//! Command line arguments and their overrides on top of the TOML configuration.

use crate::config::{MissingGenderPolicy, ReportConfig};
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ctdc-report")]
#[command(about = "Charts and trend fit over a CTDC case registration export", long_about = None)]
#[command(version)]
pub struct Cli {
    /// CSV export to analyse
    pub input: PathBuf,

    /// Directory for chart images and the summary
    #[arg(short, long, default_value = "report")]
    pub output: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Field delimiter of the input file
    #[arg(short, long)]
    pub delimiter: Option<char>,

    /// Significance level for the trend test
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Treatment of cases with missing gender
    #[arg(long, value_enum)]
    pub missing_gender: Option<MissingGenderPolicy>,

    /// Chart width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Chart height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Do not write summary.json
    #[arg(long)]
    pub no_summary: bool,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Configuration file (or defaults) with command line overrides applied.
    pub fn resolve_config(&self) -> Result<ReportConfig> {
        let mut config = match &self.config {
            Some(path) => ReportConfig::from_toml_file(path)?,
            None => ReportConfig::default(),
        };
        if let Some(separator) = self.delimiter {
            config.separator = separator;
        }
        if let Some(alpha) = self.alpha {
            config.significance = alpha;
        }
        if let Some(policy) = self.missing_gender {
            config.missing_gender = policy;
        }
        if let Some(width) = self.width {
            config.chart.width = width;
        }
        if let Some(height) = self.height {
            config.chart.height = height;
        }
        if self.no_summary {
            config.write_summary = false;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "ctdc-report",
            "cases.csv",
            "--alpha",
            "0.1",
            "--missing-gender",
            "keep",
            "--width",
            "640",
            "--no-summary",
        ])
        .unwrap();
        assert_eq!(cli.output, PathBuf::from("report"));

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.significance, 0.1);
        assert_eq!(config.missing_gender, MissingGenderPolicy::Keep);
        assert_eq!(config.chart.width, 640);
        assert_eq!(config.chart.height, 640);
        assert!(!config.write_summary);
    }

    #[test]
    fn config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.toml");
        std::fs::write(&path, "significance = 0.01\n[chart]\nheight = 300\n").unwrap();

        let cli = Cli::try_parse_from([
            "ctdc-report",
            "cases.csv",
            "-c",
            path.to_str().unwrap(),
            "--height",
            "480",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.significance, 0.01);
        assert_eq!(config.chart.height, 480);
    }

    #[test]
    fn delimiter_flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.toml");
        std::fs::write(&path, "separator = \"|\"\n").unwrap();

        let from_file = Cli::try_parse_from(["ctdc-report", "cases.csv", "-c", path.to_str().unwrap()])
            .unwrap()
            .resolve_config()
            .unwrap();
        assert_eq!(from_file.separator, '|');

        let cli = Cli::try_parse_from([
            "ctdc-report",
            "cases.csv",
            "-c",
            path.to_str().unwrap(),
            "--delimiter",
            ";",
        ])
        .unwrap();
        assert_eq!(cli.resolve_config().unwrap().separator, ';');
    }

    #[test]
    fn multi_character_delimiter_is_rejected() {
        assert!(Cli::try_parse_from(["ctdc-report", "cases.csv", "-d", ";;"]).is_err());
    }

    #[test]
    fn invalid_alpha_is_rejected() {
        let cli = Cli::try_parse_from(["ctdc-report", "cases.csv", "--alpha", "0"]).unwrap();
        assert!(cli.resolve_config().is_err());
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["ctdc-report"]).is_err());
    }
}
