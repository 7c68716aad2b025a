//! Thermoscan Report
//!
//! Batch orchestration for thermal inspection reports.
//!
//! [`ReportEngine`] is the synchronous entry point: it takes the submitted
//! captures with their operator inputs and returns the annotated records in
//! presentation order. [`ReportService`] wraps it with the async decoder and
//! renderer collaborators.

pub mod config;
pub mod engine;
pub mod orderer;
pub mod service;
pub mod stats;

pub use config::{EngineConfig, ReportConfig, TelemetryConfig, DEFAULT_REPORT_TITLE};
pub use engine::{CaptureFailure, CaptureSubmission, ReportBatch, ReportEngine, ReportRequest};
pub use orderer::{compare_filenames, ReportOrderer};
pub use service::{
    CaptureDecoder, CaptureUpload, DecodedCapture, ReportArtifact, ReportRenderer, ReportService,
};
pub use stats::{category_statistics, CategoryStats, Extreme};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::engine::{CaptureSubmission, ReportBatch, ReportEngine, ReportRequest};
    pub use crate::service::{CaptureDecoder, CaptureUpload, ReportRenderer, ReportService};
}
