//! Thermoscan Telemetry
//!
//! Observability for report generation.
//!
//! Provides:
//! - A hash-chained audit trail of classification and severity decisions
//! - Counters for captures, decode failures, sources and severities
//! - Tracing subscriber initialisation

pub mod audit;
pub mod logging;
pub mod metrics;

pub use audit::{AuditEvent, AuditSeverity, AuditTrail, DecisionData};
pub use logging::{init_tracing, init_tracing_json};
pub use metrics::{MetricsCollector, MetricsSnapshot};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::audit::{AuditEvent, AuditTrail};
    pub use crate::metrics::MetricsCollector;
}
