//! Configuration management

use std::path::PathBuf;

use anyhow::{self, Context, Result};
use chrono_tz::Tz;

use crate::cli::RenderArgs;
use crate::defaults::{DEFAULT_OUTPUT_DIR, DEFAULT_ZONE};
use crate::services::timeline::{LabelMode, LayoutConfig};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Zone for axis hours and time labels
    pub timezone: Tz,

    /// Where timelines are written when `--output-dir` is not given
    pub output_dir: PathBuf,

    /// Default time label style
    pub labels: LabelMode,

    /// Draw the legend without `--legend`
    pub legend: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let timezone = match lookup("TIMELINE_TIMEZONE") {
            Some(name) => parse_zone(&name).context("TIMELINE_TIMEZONE is not a valid IANA zone")?,
            None => DEFAULT_ZONE,
        };

        let output_dir = lookup("TIMELINE_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let labels = match lookup("TIMELINE_LABELS") {
            Some(value) => value.parse().context("TIMELINE_LABELS is invalid")?,
            None => LabelMode::default(),
        };

        let legend = match lookup("TIMELINE_LEGEND") {
            Some(value) => parse_flag(&value).context("TIMELINE_LEGEND is invalid")?,
            None => false,
        };

        Ok(Self {
            timezone,
            output_dir,
            labels,
            legend,
        })
    }

    /// Merge CLI overrides into a layout configuration and check its geometry.
    pub fn layout_config(&self, args: &RenderArgs) -> Result<LayoutConfig> {
        let legend = args.legend || self.legend;
        let mut layout = if legend {
            LayoutConfig::with_legend()
        } else {
            LayoutConfig::default()
        };

        layout.zone = match &args.timezone {
            Some(name) => parse_zone(name)?,
            None => self.timezone,
        };
        layout.labels = args.labels.unwrap_or(self.labels);
        layout.row_bands = args.row_bands;

        if let Some(width) = args.width {
            layout.width = width;
        }
        if let Some(height) = args.height {
            layout.height = height;
        }
        if let Some(margin) = args.margin {
            layout.margin = margin;
        }
        if let Some(row_height) = args.row_height {
            layout.row_height = row_height;
        }
        if let Some(row_spacing) = args.row_spacing {
            layout.row_spacing = row_spacing;
        }

        validate_geometry(&layout)?;
        Ok(layout)
    }
}

pub fn parse_zone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("unknown time zone {:?}: {}", name, e))
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => anyhow::bail!("expected a boolean (true/false, 1/0, yes/no, on/off), got {:?}", value),
    }
}

fn validate_geometry(layout: &LayoutConfig) -> Result<()> {
    if layout.plot_width() <= 0 {
        anyhow::bail!(
            "canvas width {} leaves no room inside a {} px margin",
            layout.width,
            layout.margin
        );
    }
    if layout.plot_height() <= 0 {
        anyhow::bail!(
            "canvas height {} leaves no room inside a {} px margin",
            layout.height,
            layout.margin
        );
    }
    if layout.row_height == 0 {
        anyhow::bail!("row height must be positive");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    fn args() -> RenderArgs {
        RenderArgs {
            input: PathBuf::from("snapshot.json"),
            output_dir: None,
            timezone: None,
            labels: None,
            legend: false,
            row_bands: false,
            break_actuals: Default::default(),
            width: None,
            height: None,
            margin: None,
            row_height: None,
            row_spacing: None,
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.timezone, chrono_tz::America::Denver);
        assert_eq!(config.output_dir, Path::new("."));
        assert_eq!(config.labels, LabelMode::Short);
        assert!(!config.legend);
    }

    #[test]
    fn test_config_reads_variables() {
        let config = config_from(&[
            ("TIMELINE_TIMEZONE", "Europe/Prague"),
            ("TIMELINE_OUTPUT_DIR", "/tmp/timelines"),
            ("TIMELINE_LABELS", "long"),
            ("TIMELINE_LEGEND", "true"),
        ])
        .unwrap();
        assert_eq!(config.timezone, chrono_tz::Europe::Prague);
        assert_eq!(config.output_dir, Path::new("/tmp/timelines"));
        assert_eq!(config.labels, LabelMode::Long);
        assert!(config.legend);
    }

    #[test]
    fn test_default_zone_is_denver() {
        assert_eq!(DEFAULT_ZONE.name(), "America/Denver");
        assert_eq!(config_from(&[]).unwrap().timezone, DEFAULT_ZONE);
    }

    #[test]
    fn test_legend_flag_values() {
        for value in ["1", "TRUE", " yes ", "on"] {
            assert!(config_from(&[("TIMELINE_LEGEND", value)]).unwrap().legend, "{value}");
        }
        for value in ["0", "false", "No", "off"] {
            assert!(!config_from(&[("TIMELINE_LEGEND", value)]).unwrap().legend, "{value}");
        }
    }

    #[test]
    fn test_misspelled_legend_flag_is_rejected() {
        let err = config_from(&[("TIMELINE_LEGEND", "ture")]).unwrap_err();
        assert!(format!("{err:#}").contains("TIMELINE_LEGEND"));
    }

    #[test]
    fn test_config_rejects_unknown_zone() {
        assert!(config_from(&[("TIMELINE_TIMEZONE", "Mars/Olympus")]).is_err());
    }

    #[test]
    fn test_layout_config_defaults_match_plain_variant() {
        let layout = config_from(&[]).unwrap().layout_config(&args()).unwrap();
        assert_eq!(layout, LayoutConfig::default());
    }

    #[test]
    fn test_legend_switches_to_tall_canvas() {
        let mut cli = args();
        cli.legend = true;
        let layout = config_from(&[]).unwrap().layout_config(&cli).unwrap();
        assert!(layout.legend);
        assert_eq!(layout.height, 500);

        cli.height = Some(450);
        let layout = config_from(&[]).unwrap().layout_config(&cli).unwrap();
        assert_eq!(layout.height, 450);
    }

    #[test]
    fn test_cli_overrides_environment() {
        let config = config_from(&[("TIMELINE_LABELS", "long")]).unwrap();
        let mut cli = args();
        cli.labels = Some(LabelMode::Short);
        cli.timezone = Some("UTC".to_string());
        cli.row_spacing = Some(30);

        let layout = config.layout_config(&cli).unwrap();
        assert_eq!(layout.labels, LabelMode::Short);
        assert_eq!(layout.zone, Tz::UTC);
        assert_eq!(layout.row_spacing, 30);
    }

    #[test]
    fn test_geometry_without_plot_area_is_rejected() {
        let config = config_from(&[]).unwrap();
        let mut cli = args();
        cli.width = Some(100);
        assert!(config.layout_config(&cli).is_err());

        let mut cli = args();
        cli.row_height = Some(0);
        assert!(config.layout_config(&cli).is_err());
    }
}
