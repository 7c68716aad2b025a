//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thermoscan_core::CategoryTable;
use thermoscan_policy::NarrativeTable;

/// Title used when a request does not supply one
pub const DEFAULT_REPORT_TITLE: &str = "Thermal Inspection Results Report";

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Report output settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Category table override; built-in table when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<CategoryTable>,

    /// Narrative table override; built-in wording when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narratives: Option<NarrativeTable>,

    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl EngineConfig {
    /// Load configuration from file, or defaults when the file does not exist
    pub fn load(config_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_path = config_path.as_ref();

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
            Self::default()
        };

        Ok(config)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> thermoscan_core::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Category table in effect
    pub fn category_table(&self) -> CategoryTable {
        self.categories.clone().unwrap_or_default()
    }

    /// Narrative table in effect
    pub fn narrative_table(&self) -> NarrativeTable {
        self.narratives.clone().unwrap_or_default()
    }
}

/// Report output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Title for requests that do not supply one
    #[serde(default = "default_title")]
    pub default_title: String,

    /// Directory rendered reports are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Upper bound on captures decoded at the same time
    #[serde(default = "default_max_concurrent_decodes")]
    pub max_concurrent_decodes: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_title: default_title(),
            output_dir: default_output_dir(),
            max_concurrent_decodes: default_max_concurrent_decodes(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Keep a hash-chained audit trail per batch and write it next to the report
    #[serde(default = "default_true")]
    pub audit: bool,

    /// Record counters for processed captures
    #[serde(default = "default_true")]
    pub metrics: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            audit: true,
            metrics: true,
        }
    }
}

fn default_title() -> String {
    DEFAULT_REPORT_TITLE.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./reports")
}

fn default_max_concurrent_decodes() -> usize {
    8
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use thermoscan_core::{DeviceCategory, DeviceType, Severity, Thresholds};

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.report.default_title, DEFAULT_REPORT_TITLE);
        assert_eq!(config.report.output_dir, PathBuf::from("./reports"));
        assert_eq!(config.report.max_concurrent_decodes, 8);
        assert!(config.telemetry.audit);
        assert_eq!(config.category_table(), CategoryTable::builtin());
    }

    #[test]
    fn test_partial_yaml() {
        let config = EngineConfig::from_yaml(
            r#"
report:
  default_title: "Site 271 inspection"
telemetry:
  audit: false
"#,
        )
        .unwrap();

        assert_eq!(config.report.default_title, "Site 271 inspection");
        assert_eq!(config.report.output_dir, PathBuf::from("./reports"));
        assert!(!config.telemetry.audit);
        assert!(config.telemetry.metrics);
        assert!(config.categories.is_none());
    }

    #[test]
    fn test_category_override() {
        let config = EngineConfig::from_yaml(
            r#"
categories:
  - category: solar_panel
    label: "Module"
    sort_rank: 2
    keywords: ["pv"]
    thresholds: { warning: 40.0, critical: 60.0 }
  - category: device
    label: "Other"
    sort_rank: 1
    thresholds: { warning: 50.0, critical: 70.0 }
"#,
        )
        .unwrap();

        let table = config.category_table();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.thresholds(&DeviceCategory::SolarPanel.into()),
            Thresholds::new(40.0, 60.0)
        );
        assert_eq!(table.label(&DeviceType::parse("cable")), "Other");
    }

    #[test]
    fn test_invalid_override_rejected() {
        let result = EngineConfig::from_yaml(
            r#"
categories:
  - category: cable
    label: "Cable"
    sort_rank: 1
    thresholds: { warning: 90.0, critical: 70.0 }
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "report:\n  output_dir: /var/reports").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.report.output_dir, PathBuf::from("/var/reports"));
        assert_eq!(
            config
                .narrative_table()
                .conclusion(&DeviceCategory::Cable.into(), Severity::Normal),
            Some("Connection point temperature is normal.")
        );
    }
}
