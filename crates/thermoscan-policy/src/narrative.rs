//! Conclusion and recommendation texts
//!
//! Texts are keyed by (subject, severity). The subject collapses every device
//! type without dedicated wording (`device` and unrecognized types) into
//! [`NarrativeSubject::Generic`]. A table is only constructed when it covers
//! every combination, so lookups on a built table always succeed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thermoscan_core::{DeviceCategory, DeviceType, Error, Result, Severity, ThermalImageRecord};
use tracing::debug;

/// Device grouping used for narrative wording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSubject {
    SolarPanel,
    Cable,
    Cabinet,
    Generic,
}

impl NarrativeSubject {
    pub const ALL: [NarrativeSubject; 4] = [
        NarrativeSubject::SolarPanel,
        NarrativeSubject::Cable,
        NarrativeSubject::Cabinet,
        NarrativeSubject::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SolarPanel => "solar_panel",
            Self::Cable => "cable",
            Self::Cabinet => "cabinet",
            Self::Generic => "generic",
        }
    }

    /// Subject whose wording applies to a device type
    pub fn for_device_type(device_type: &DeviceType) -> Self {
        match device_type.category() {
            Some(DeviceCategory::SolarPanel) => Self::SolarPanel,
            Some(DeviceCategory::Cable) => Self::Cable,
            Some(DeviceCategory::Cabinet) => Self::Cabinet,
            Some(DeviceCategory::Device) | None => Self::Generic,
        }
    }
}

impl fmt::Display for NarrativeSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Texts keyed by subject, then severity
pub type TextMap = BTreeMap<NarrativeSubject, BTreeMap<Severity, String>>;

/// Serialized shape of a narrative table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeTableSpec {
    pub conclusions: TextMap,
    pub recommendations: TextMap,
}

/// Complete set of conclusion and recommendation texts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NarrativeTableSpec", into = "NarrativeTableSpec")]
pub struct NarrativeTable {
    conclusions: TextMap,
    recommendations: TextMap,
}

impl NarrativeTable {
    /// Build a table, rejecting it unless every (subject, severity) pair has
    /// a non-empty conclusion and recommendation.
    pub fn new(conclusions: TextMap, recommendations: TextMap) -> Result<Self> {
        check_complete("conclusion", &conclusions)?;
        check_complete("recommendation", &recommendations)?;

        Ok(Self {
            conclusions,
            recommendations,
        })
    }

    /// Built-in wording
    pub fn builtin() -> Self {
        let conclusions = text_map([
            (
                NarrativeSubject::SolarPanel,
                [
                    "PV panel operating normally; temperature within the permitted range.",
                    "Abnormal heating on the panel; possible soiling, shading, or a minor cell fault.",
                    "Severe hotspot on the panel; cell or bypass diode damage likely.",
                ],
            ),
            (
                NarrativeSubject::Cable,
                [
                    "Connection point temperature is normal.",
                    "Localized heating at the connection; possible loose contact or light overload.",
                    "Severe overheating at the connection; risk of insulation damage or fire.",
                ],
            ),
            (
                NarrativeSubject::Cabinet,
                [
                    "Cabinet components operating within the permitted temperature range.",
                    "Localized heating inside the cabinet; possible contact fault or light overload.",
                    "Severe overheating inside the cabinet; risk of equipment damage or fire.",
                ],
            ),
            (
                NarrativeSubject::Generic,
                [
                    "System operating normally; temperature within the permitted range.",
                    "Localized temperature rise; possible contact fault, light overload, or shading.",
                    "Severe overheating detected; risk of equipment damage or fire.",
                ],
            ),
        ]);

        let recommendations = text_map([
            (
                NarrativeSubject::SolarPanel,
                [
                    "Continue routine panel inspections.",
                    "Clean the panel surface, check for shading, and monitor at the next inspection.",
                    "Inspect on site, re-measure, and consider replacing the panel.",
                ],
            ),
            (
                NarrativeSubject::Cable,
                [
                    "Continue periodic monitoring of the connection.",
                    "Re-tighten the connection and re-check at the next inspection.",
                    "Inspect immediately: measure the current, check terminal torque, or replace the conductor.",
                ],
            ),
            (
                NarrativeSubject::Cabinet,
                [
                    "Continue periodic monitoring of the cabinet.",
                    "Clean the cabinet and re-tighten terminals; re-check at the next inspection.",
                    "Inspect immediately: measure the load current and check or replace the affected component.",
                ],
            ),
            (
                NarrativeSubject::Generic,
                [
                    "Continue periodic monitoring.",
                    "Clean surfaces and re-tighten connections; monitor at the next inspection.",
                    "Technical inspection required immediately: measure current, check torque, or replace.",
                ],
            ),
        ]);

        Self {
            conclusions,
            recommendations,
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

    /// Conclusion text for a device type and severity
    pub fn conclusion(&self, device_type: &DeviceType, severity: Severity) -> Option<&str> {
        lookup(&self.conclusions, device_type, severity)
    }

    /// Recommendation text for a device type and severity
    pub fn recommendation(&self, device_type: &DeviceType, severity: Severity) -> Option<&str> {
        lookup(&self.recommendations, device_type, severity)
    }
}

impl Default for NarrativeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TryFrom<NarrativeTableSpec> for NarrativeTable {
    type Error = Error;

    fn try_from(spec: NarrativeTableSpec) -> Result<Self> {
        Self::new(spec.conclusions, spec.recommendations)
    }
}

impl From<NarrativeTable> for NarrativeTableSpec {
    fn from(table: NarrativeTable) -> Self {
        Self {
            conclusions: table.conclusions,
            recommendations: table.recommendations,
        }
    }
}

fn text_map(rows: [(NarrativeSubject, [&str; 3]); 4]) -> TextMap {
    rows.into_iter()
        .map(|(subject, texts)| {
            let by_severity = Severity::ALL
                .into_iter()
                .zip(texts)
                .map(|(severity, text)| (severity, text.to_string()))
                .collect();
            (subject, by_severity)
        })
        .collect()
}

fn check_complete(kind: &str, texts: &TextMap) -> Result<()> {
    for subject in NarrativeSubject::ALL {
        for severity in Severity::ALL {
            let present = texts
                .get(&subject)
                .and_then(|by_severity| by_severity.get(&severity))
                .is_some_and(|text| !text.trim().is_empty());

            if !present {
                return Err(Error::narrative(format!(
                    "missing {} text for {} / {}",
                    kind, subject, severity
                )));
            }
        }
    }
    Ok(())
}

fn lookup<'a>(texts: &'a TextMap, device_type: &DeviceType, severity: Severity) -> Option<&'a str> {
    texts
        .get(&NarrativeSubject::for_device_type(device_type))
        .and_then(|by_severity| by_severity.get(&severity))
        .map(String::as_str)
}

/// Fills empty conclusion and recommendation fields of a record
#[derive(Debug, Clone)]
pub struct NarrativeSelector {
    table: Arc<NarrativeTable>,
}

impl NarrativeSelector {
    pub fn new(table: Arc<NarrativeTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &NarrativeTable {
        &self.table
    }

    /// Narrative stage of the record pipeline.
    ///
    /// Only empty fields are filled; text the operator supplied is kept as
    /// is. Records without a severity pass through untouched. A record
    /// without a device type gets the generic wording.
    pub fn fill(&self, mut record: ThermalImageRecord) -> ThermalImageRecord {
        let Some(severity) = record.severity else {
            return record;
        };

        let device_type = record
            .device_type
            .clone()
            .unwrap_or(DeviceType::Known(DeviceCategory::Device));

        if record.conclusion.is_empty() {
            if let Some(text) = self.table.conclusion(&device_type, severity) {
                record.conclusion = text.to_string();
            }
        }

        if record.recommendation.is_empty() {
            if let Some(text) = self.table.recommendation(&device_type, severity) {
                record.recommendation = text.to_string();
            }
        }

        debug!(
            filename = %record.filename,
            subject = %NarrativeSubject::for_device_type(&device_type),
            severity = %severity,
            "Narrative selected"
        );

        record
    }
}

impl Default for NarrativeSelector {
    fn default() -> Self {
        Self::new(Arc::new(NarrativeTable::builtin()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::io::Write;

    #[test]
    fn test_builtin_is_complete_and_distinct() {
        let table = NarrativeTable::builtin();
        assert!(check_complete("conclusion", &table.conclusions).is_ok());
        assert!(check_complete("recommendation", &table.recommendations).is_ok());

        let mut conclusions = BTreeSet::new();
        let mut recommendations = BTreeSet::new();
        for subject in NarrativeSubject::ALL {
            for severity in Severity::ALL {
                conclusions.insert(&table.conclusions[&subject][&severity]);
                recommendations.insert(&table.recommendations[&subject][&severity]);
            }
        }
        assert_eq!(conclusions.len(), 12);
        assert_eq!(recommendations.len(), 12);
    }

    #[test]
    fn test_subject_mapping() {
        assert_eq!(
            NarrativeSubject::for_device_type(&DeviceCategory::Cable.into()),
            NarrativeSubject::Cable
        );
        assert_eq!(
            NarrativeSubject::for_device_type(&DeviceCategory::Device.into()),
            NarrativeSubject::Generic
        );
        assert_eq!(
            NarrativeSubject::for_device_type(&DeviceType::parse("transformer")),
            NarrativeSubject::Generic
        );
    }

    #[test]
    fn test_device_and_unknown_share_wording() {
        let table = NarrativeTable::builtin();
        let device = DeviceType::Known(DeviceCategory::Device);
        let other = DeviceType::parse("combiner box");

        for severity in Severity::ALL {
            assert_eq!(
                table.conclusion(&device, severity),
                table.conclusion(&other, severity)
            );
        }
    }

    #[test]
    fn test_fill_empty_fields() {
        let selector = NarrativeSelector::default();
        let record = ThermalImageRecord::new("CABLE_01.BMT")
            .with_device_type(DeviceCategory::Cable)
            .with_severity(Severity::Critical);

        let record = selector.fill(record);
        assert_eq!(
            record.conclusion,
            "Severe overheating at the connection; risk of insulation damage or fire."
        );
        assert!(record.recommendation.starts_with("Inspect immediately"));
    }

    #[test]
    fn test_fill_keeps_supplied_text() {
        let selector = NarrativeSelector::default();
        let record = ThermalImageRecord::new("PV_01.BMT")
            .with_device_type(DeviceCategory::SolarPanel)
            .with_severity(Severity::Warning)
            .with_conclusion("Bird droppings on cell 14");

        let record = selector.fill(record);
        assert_eq!(record.conclusion, "Bird droppings on cell 14");
        assert_eq!(
            record.recommendation,
            "Clean the panel surface, check for shading, and monitor at the next inspection."
        );
    }

    #[test]
    fn test_fill_without_severity_is_noop() {
        let selector = NarrativeSelector::default();
        let record = ThermalImageRecord::new("IR_0001.BMT").with_device_type(DeviceCategory::Cabinet);

        let filled = selector.fill(record.clone());
        assert_eq!(filled, record);
    }

    #[test]
    fn test_yaml_round_trip() {
        let table = NarrativeTable::builtin();
        let yaml = serde_yaml::to_string(&table).unwrap();
        assert!(yaml.contains("solar_panel:"));
        assert!(yaml.contains("Critical:"));

        let parsed = NarrativeTable::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_incomplete_yaml_rejected() {
        let yaml = r#"
conclusions:
  solar_panel:
    Normal: "ok"
    Warning: "warm"
    Critical: "hot"
recommendations: {}
"#;
        let err = NarrativeTable::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("missing conclusion text"));
    }

    #[test]
    fn test_blank_text_rejected() {
        let mut conclusions = NarrativeTable::builtin().conclusions;
        conclusions
            .get_mut(&NarrativeSubject::Cabinet)
            .unwrap()
            .insert(Severity::Warning, "   ".to_string());

        let err =
            NarrativeTable::new(conclusions, NarrativeTable::builtin().recommendations).unwrap_err();
        assert!(matches!(err, Error::Narrative(_)));
        assert!(err.to_string().contains("cabinet / Warning"));
    }

    #[test]
    fn test_from_file() {
        let yaml = serde_yaml::to_string(&NarrativeTable::builtin()).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let table = NarrativeTable::from_file(file.path()).unwrap();
        assert_eq!(
            table.conclusion(&DeviceCategory::Cabinet.into(), Severity::Normal),
            Some("Cabinet components operating within the permitted temperature range.")
        );
    }
}
