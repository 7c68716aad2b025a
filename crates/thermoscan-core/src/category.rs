//! Device categories and the category configuration table
//!
//! The table carries, per category, the filename keywords, the display
//! label, the report sort rank, and the warning/critical temperature
//! thresholds. It is validated once at construction and shared read-only
//! (`Arc<CategoryTable>`) by the classifier, the severity evaluator, and the
//! report orderer.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Sort rank used for a device type the table does not know.
///
/// This equals the `solar_panel` rank rather than sorting unknown types
/// last; kept as-is until the intended placement is confirmed.
pub const UNKNOWN_SORT_RANK: u32 = 1;

/// Closed set of device categories the classifier can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCategory {
    SolarPanel,
    Cable,
    Cabinet,
    Device,
}

impl DeviceCategory {
    /// Declaration order. Metadata scoring breaks ties in this order.
    pub const ALL: [DeviceCategory; 4] = [
        DeviceCategory::SolarPanel,
        DeviceCategory::Cable,
        DeviceCategory::Cabinet,
        DeviceCategory::Device,
    ];

    /// Stable identifier used in configuration files and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SolarPanel => "solar_panel",
            Self::Cable => "cable",
            Self::Cabinet => "cabinet",
            Self::Device => "device",
        }
    }

    /// Position in [`DeviceCategory::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "solar_panel" => Ok(Self::SolarPanel),
            "cable" => Ok(Self::Cable),
            "cabinet" => Ok(Self::Cabinet),
            "device" => Ok(Self::Device),
            other => Err(Error::config(format!("unknown device category '{}'", other))),
        }
    }
}

/// Device type attached to a record.
///
/// Classification always yields a [`DeviceCategory`]; a caller forcing a
/// category by name may supply anything, which is kept verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceType {
    Known(DeviceCategory),
    Other(String),
}

impl DeviceType {
    /// Parse a free-text device type
    pub fn parse(s: &str) -> Self {
        match s.parse::<DeviceCategory>() {
            Ok(category) => Self::Known(category),
            Err(_) => Self::Other(s.trim().to_string()),
        }
    }

    /// The category, if this is one of the known identifiers
    pub fn category(&self) -> Option<DeviceCategory> {
        match self {
            Self::Known(category) => Some(*category),
            Self::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(category) => category.as_str(),
            Self::Other(name) => name,
        }
    }
}

impl From<DeviceCategory> for DeviceType {
    fn from(category: DeviceCategory) -> Self {
        Self::Known(category)
    }
}

impl From<String> for DeviceType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<DeviceType> for String {
    fn from(device_type: DeviceType) -> Self {
        device_type.as_str().to_string()
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Warning/critical temperature pair in °C
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub warning: f64,
    pub critical: f64,
}

impl Thresholds {
    pub fn new(warning: f64, critical: f64) -> Self {
        Self { warning, critical }
    }
}

/// Configuration for a single category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpec {
    /// Category this entry configures
    pub category: DeviceCategory,

    /// Display label used in rendered reports
    pub label: String,

    /// Report position (lower sorts first)
    pub sort_rank: u32,

    /// Lower-case filename keywords, matched in declaration order
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Severity thresholds
    pub thresholds: Thresholds,
}

/// Validated, immutable category configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CategorySpec>", into = "Vec<CategorySpec>")]
pub struct CategoryTable {
    categories: Vec<CategorySpec>,
    fallback: usize,
}

impl CategoryTable {
    /// Build a table, validating every entry
    pub fn new(categories: Vec<CategorySpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut ranks = HashSet::new();

        for spec in &categories {
            if !seen.insert(spec.category) {
                return Err(Error::category_table(format!(
                    "category '{}' declared more than once",
                    spec.category
                )));
            }

            if spec.sort_rank < 1 || spec.sort_rank as usize > categories.len() {
                return Err(Error::category_table(format!(
                    "sort rank {} of category '{}' outside 1..={}",
                    spec.sort_rank,
                    spec.category,
                    categories.len()
                )));
            }

            if !ranks.insert(spec.sort_rank) {
                return Err(Error::category_table(format!(
                    "sort rank {} used by more than one category",
                    spec.sort_rank
                )));
            }

            let Thresholds { warning, critical } = spec.thresholds;
            if !warning.is_finite() || !critical.is_finite() || warning >= critical {
                return Err(Error::category_table(format!(
                    "category '{}' needs finite thresholds with warning < critical (got {} / {})",
                    spec.category, warning, critical
                )));
            }

            for keyword in &spec.keywords {
                if keyword.trim().is_empty() {
                    return Err(Error::category_table(format!(
                        "category '{}' has an empty keyword",
                        spec.category
                    )));
                }
                if *keyword != keyword.to_lowercase() {
                    return Err(Error::category_table(format!(
                        "keyword '{}' of category '{}' must be lower-case",
                        keyword, spec.category
                    )));
                }
            }
        }

        let fallback = categories
            .iter()
            .position(|spec| spec.category == DeviceCategory::Device)
            .ok_or_else(|| {
                Error::category_table("the 'device' category is required as the fallback entry")
            })?;

        Ok(Self {
            categories,
            fallback,
        })
    }

    /// Built-in table used for field inspections of PV installations
    pub fn builtin() -> Self {
        fn spec(
            category: DeviceCategory,
            label: &str,
            sort_rank: u32,
            keywords: &[&str],
            warning: f64,
            critical: f64,
        ) -> CategorySpec {
            CategorySpec {
                category,
                label: label.to_string(),
                sort_rank,
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
                thresholds: Thresholds::new(warning, critical),
            }
        }

        Self {
            fallback: 3,
            categories: vec![
                spec(
                    DeviceCategory::SolarPanel,
                    "PV Panel",
                    1,
                    &["pv", "panel", "solar", "module", "string", "cell"],
                    45.0,
                    65.0,
                ),
                spec(
                    DeviceCategory::Cable,
                    "AC/DC Cable",
                    2,
                    &[
                        "cable", "ac", "dc", "wire", "connector", "junction", "cb", "dây", "cap",
                    ],
                    70.0,
                    90.0,
                ),
                spec(
                    DeviceCategory::Cabinet,
                    "Cabinet / Inverter",
                    3,
                    &[
                        "cabinet", "inverter", "combiner", "box", "mdb", "db", "acb", "tủ", "inv",
                    ],
                    60.0,
                    80.0,
                ),
                spec(
                    DeviceCategory::Device,
                    "Device",
                    4,
                    &["device", "thiết bị", "other", "khác"],
                    50.0,
                    70.0,
                ),
            ],
        }
    }

    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &CategorySpec> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Look up a category entry
    pub fn get(&self, category: DeviceCategory) -> Option<&CategorySpec> {
        self.categories.iter().find(|spec| spec.category == category)
    }

    /// Entry used when a device type is not in the table
    pub fn fallback(&self) -> &CategorySpec {
        &self.categories[self.fallback]
    }

    fn resolve(&self, device_type: &DeviceType) -> Option<&CategorySpec> {
        device_type.category().and_then(|category| self.get(category))
    }

    /// Thresholds for a device type, falling back to the `device` entry
    pub fn thresholds(&self, device_type: &DeviceType) -> Thresholds {
        self.resolve(device_type)
            .unwrap_or_else(|| self.fallback())
            .thresholds
    }

    /// Display label for a device type, falling back to the `device` entry
    pub fn label(&self, device_type: &DeviceType) -> &str {
        &self.resolve(device_type).unwrap_or_else(|| self.fallback()).label
    }

    /// Sort rank for a device type; unknown types get [`UNKNOWN_SORT_RANK`]
    pub fn sort_rank(&self, device_type: &DeviceType) -> u32 {
        self.resolve(device_type)
            .map(|spec| spec.sort_rank)
            .unwrap_or(UNKNOWN_SORT_RANK)
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TryFrom<Vec<CategorySpec>> for CategoryTable {
    type Error = Error;

    fn try_from(categories: Vec<CategorySpec>) -> Result<Self> {
        Self::new(categories)
    }
}

impl From<CategoryTable> for Vec<CategorySpec> {
    fn from(table: CategoryTable) -> Self {
        table.categories
    }
}
