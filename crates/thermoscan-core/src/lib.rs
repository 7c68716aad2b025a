//! Thermoscan Core
//!
//! Core types, configuration tables, and error handling shared across the
//! Thermoscan thermal inspection components.
//!
//! This crate provides:
//! - The decoded capture metadata and its validated form
//! - Device categories and the category configuration table
//! - Severity levels and the annotated report record
//! - Error types and result handling

pub mod category;
pub mod error;
pub mod types;

pub use category::{
    CategorySpec, CategoryTable, DeviceCategory, DeviceType, Thresholds, UNKNOWN_SORT_RANK,
};
pub use error::{Error, Result};
pub use types::{
    MetadataRejection, Severity, ThermalImageRecord, ThermalMetadata, ThermalReading,
    DEFAULT_EMISSIVITY,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::category::{CategoryTable, DeviceCategory, DeviceType, Thresholds};
    pub use crate::error::{Error, Result};
    pub use crate::types::{Severity, ThermalImageRecord, ThermalMetadata, ThermalReading};
}
