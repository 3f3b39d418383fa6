//! Report configuration, read from an optional TOML file and overridden by CLI flags.

use crate::error::{ReportError, Result};
use crate::stats::SIGNIFICANCE_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do with cases whose gender is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MissingGenderPolicy {
    /// Leave gender null; gender group-counts drop the row.
    #[default]
    Exclude,
    /// Relabel missing gender as "Unknown" so it forms its own group.
    Keep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 640,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Field delimiter of the input export.
    pub separator: char,
    /// Alpha for the trend significance decision.
    pub significance: f64,
    pub missing_gender: MissingGenderPolicy,
    pub chart: ChartConfig,
    pub write_summary: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            separator: ',',
            significance: SIGNIFICANCE_THRESHOLD,
            missing_gender: MissingGenderPolicy::default(),
            chart: ChartConfig::default(),
            write_summary: true,
        }
    }
}

impl ReportConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ReportConfig =
            toml::from_str(text).map_err(|e| ReportError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ReportError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Separator as the single byte the CSV reader expects.
    pub fn separator_byte(&self) -> Result<u8> {
        match u8::try_from(self.separator) {
            Ok(b) if b.is_ascii() && !matches!(b, b'\n' | b'\r' | b'"') => Ok(b),
            _ => Err(ReportError::Config(format!(
                "separator must be a single ASCII character other than a quote or line break, got {:?}",
                self.separator
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.separator_byte()?;
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(ReportError::Config(format!(
                "significance must be in (0, 1), got {}",
                self.significance
            )));
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(ReportError::Config(format!(
                "chart size must be non-zero, got {}x{}",
                self.chart.width, self.chart.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ReportConfig::from_toml_str("").unwrap();
        assert_eq!(config, ReportConfig::default());
        assert_eq!(config.significance, 0.05);
        assert_eq!(config.missing_gender, MissingGenderPolicy::Exclude);
        assert_eq!(config.separator_byte().unwrap(), b',');
    }

    #[test]
    fn separator_from_toml() {
        let config = ReportConfig::from_toml_str("separator = \";\"").unwrap();
        assert_eq!(config.separator, ';');
        assert_eq!(config.separator_byte().unwrap(), b';');

        let tabbed = ReportConfig::from_toml_str("separator = \"\\t\"").unwrap();
        assert_eq!(tabbed.separator_byte().unwrap(), b'\t');
    }

    #[test]
    fn rejects_unusable_separator() {
        for separator in ['\n', '"', '§'] {
            let config = ReportConfig {
                separator,
                ..ReportConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert_eq!(err.stage(), Some(Stage::Config));
        }
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let config = ReportConfig::from_toml_str(
            r#"
significance = 0.01
missing_gender = "keep"

[chart]
width = 800
"#,
        )
        .unwrap();
        assert_eq!(config.significance, 0.01);
        assert_eq!(config.missing_gender, MissingGenderPolicy::Keep);
        assert_eq!(config.chart.width, 800);
        assert_eq!(config.chart.height, 640);
        assert!(config.write_summary);
    }

    #[test]
    fn rejects_alpha_out_of_range() {
        let err = ReportConfig::from_toml_str("significance = 1.5").unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
        assert_eq!(err.stage(), Some(Stage::Config));
    }

    #[test]
    fn rejects_zero_chart_size() {
        let config = ReportConfig {
            chart: ChartConfig {
                width: 0,
                height: 100,
            },
            ..ReportConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(ReportConfig::from_toml_str("missing_gender = \"drop\"").is_err());
    }
}
