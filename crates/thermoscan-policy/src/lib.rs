//! Thermoscan Policy
//!
//! Decision rules applied to a classified capture:
//! - Severity from the category's warning/critical thresholds
//! - Conclusion and recommendation texts by category and severity
//!
//! Both stages take a record by value and return it annotated, so they
//! compose directly in the report pipeline.

pub mod narrative;
pub mod severity;

pub use narrative::{NarrativeSelector, NarrativeSubject, NarrativeTable, NarrativeTableSpec, TextMap};
pub use severity::SeverityEvaluator;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::narrative::{NarrativeSelector, NarrativeSubject, NarrativeTable};
    pub use crate::severity::SeverityEvaluator;
}
