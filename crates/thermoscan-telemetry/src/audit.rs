//! Hash-chained audit trail of report decisions
//!
//! Each annotated capture appends one event recording how its category was
//! chosen and which severity it received. Every event stores the hash of its
//! predecessor, so editing or dropping an event breaks [`AuditTrail::verify`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::SystemTime;
use thermoscan_classifiers::Classification;
use thermoscan_core::{Result, Severity, ThermalImageRecord};
use tracing::debug;

/// Event type for an annotated capture
pub const CAPTURE_ANNOTATED: &str = "capture_annotated";

/// Event type for a capture the decoder could not read
pub const DECODE_FAILED: &str = "decode_failed";

/// Audit trail with hash-chained events for tamper detection
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    events: Vec<AuditEvent>,
    chain_hash: Option<String>,
}

impl AuditTrail {
    /// Create a new audit trail
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event to the audit trail
    pub fn add_event(&mut self, event: AuditEvent) {
        let mut event = event;
        event.previous_hash = self.chain_hash.clone();

        let hash = compute_hash(&event);
        event.hash = Some(hash.clone());

        debug!(event_type = %event.event_type, hash = %hash, "Audit event appended");

        self.chain_hash = Some(hash);
        self.events.push(event);
    }

    /// Record the decisions taken for one capture
    pub fn record_decision(&mut self, record: &ThermalImageRecord, classification: &Classification) {
        let decision = DecisionData {
            filename: record.filename.clone(),
            category: record
                .device_type
                .as_ref()
                .map(|t| t.as_str().to_string())
                .unwrap_or_else(|| classification.category.as_str().to_string()),
            source: classification.source.as_str().to_string(),
            severity: record.severity,
            temp_max: record.temp_max().filter(|t| t.is_finite()),
        };

        self.add_event(
            AuditEvent::new(CAPTURE_ANNOTATED)
                .with_data(&decision)
                .with_severity(AuditSeverity::from(record.severity)),
        );
    }

    /// Record a capture that could not be decoded
    pub fn record_decode_failure(&mut self, filename: &str, message: &str) {
        self.add_event(
            AuditEvent::new(DECODE_FAILED)
                .with_data(serde_json::json!({ "filename": filename, "message": message }))
                .with_severity(AuditSeverity::Warning),
        );
    }

    /// Verify the integrity of the audit trail
    pub fn verify(&self) -> bool {
        let mut prev_hash: Option<String> = None;

        for event in &self.events {
            if event.previous_hash != prev_hash {
                return false;
            }

            let computed_hash = compute_hash(event);
            if event.hash.as_ref() != Some(&computed_hash) {
                return false;
            }

            prev_hash = event.hash.clone();
        }

        true
    }

    /// Get all events
    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Hash of the last event
    pub fn head(&self) -> Option<&str> {
        self.chain_hash.as_deref()
    }

    /// Write the trail as JSON lines, one event per line
    pub fn write_jsonl(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        for event in &self.events {
            serde_json::to_writer(&mut writer, event)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        debug!(
            path = %path.as_ref().display(),
            events = self.events.len(),
            "Audit trail written"
        );
        Ok(())
    }

    /// Read a trail written by [`AuditTrail::write_jsonl`].
    ///
    /// Events are taken as stored; call [`AuditTrail::verify`] to check them.
    pub fn read_jsonl(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut events = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str::<AuditEvent>(&line)?);
        }

        let chain_hash = events.last().and_then(|e| e.hash.clone());
        Ok(Self { events, chain_hash })
    }
}

/// Compute the chained hash of an event (excluding its own hash field)
fn compute_hash(event: &AuditEvent) -> String {
    let mut hasher = Sha256::new();

    hasher.update(event.id.as_bytes());
    hasher.update(event.event_type.as_bytes());
    if let Some(ref data) = event.data {
        hasher.update(data.as_bytes());
    }
    hasher.update(format!("{:?}", event.timestamp).as_bytes());
    hasher.update(event.severity.as_str().as_bytes());
    if let Some(ref prev) = event.previous_hash {
        hasher.update(prev.as_bytes());
    }

    format!("{:x}", hasher.finalize())
}

/// Payload of a [`CAPTURE_ANNOTATED`] event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionData {
    pub filename: String,
    pub category: String,
    pub source: String,
    pub severity: Option<Severity>,
    pub temp_max: Option<f64>,
}

/// A single audit event in the trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: String,

    /// Event type
    pub event_type: String,

    /// Event data (JSON serialized)
    pub data: Option<String>,

    pub timestamp: SystemTime,

    /// Hash of this event
    pub hash: Option<String>,

    /// Hash of previous event (for chaining)
    pub previous_hash: Option<String>,

    pub severity: AuditSeverity,
}

impl AuditEvent {
    /// Create a new audit event
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            id: format!("evt_{}", uuid::Uuid::new_v4()),
            event_type: event_type.into(),
            data: None,
            timestamp: SystemTime::now(),
            hash: None,
            previous_hash: None,
            severity: AuditSeverity::Info,
        }
    }

    /// Set event data
    pub fn with_data(mut self, data: impl Serialize) -> Self {
        self.data = serde_json::to_string(&data).ok();
        self
    }

    /// Set severity
    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Decode the payload of a [`CAPTURE_ANNOTATED`] event
    pub fn decision(&self) -> Option<DecisionData> {
        if self.event_type != CAPTURE_ANNOTATED {
            return None;
        }
        self.data
            .as_deref()
            .and_then(|data| serde_json::from_str(data).ok())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Info,
    Warning,
    Critical,
}

impl AuditSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl From<Option<Severity>> for AuditSeverity {
    fn from(severity: Option<Severity>) -> Self {
        match severity {
            Some(Severity::Critical) => Self::Critical,
            Some(Severity::Warning) => Self::Warning,
            Some(Severity::Normal) | None => Self::Info,
        }
    }
}
