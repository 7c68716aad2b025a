//! Presentation order of annotated records

use std::cmp::Ordering;
use std::sync::Arc;
use thermoscan_core::{CategoryTable, ThermalImageRecord, UNKNOWN_SORT_RANK};

/// Sorts a batch by category rank, then filename
#[derive(Debug, Clone)]
pub struct ReportOrderer {
    table: Arc<CategoryTable>,
}

impl ReportOrderer {
    pub fn new(table: Arc<CategoryTable>) -> Self {
        Self { table }
    }

    /// Rank of a record's device type.
    ///
    /// Types missing from the table, and records never classified, get
    /// [`UNKNOWN_SORT_RANK`].
    pub fn rank(&self, record: &ThermalImageRecord) -> u32 {
        record
            .device_type
            .as_ref()
            .map(|device_type| self.table.sort_rank(device_type))
            .unwrap_or(UNKNOWN_SORT_RANK)
    }

    /// Compare two records by `(rank, filename)`; see [`compare_filenames`]
    pub fn compare(&self, a: &ThermalImageRecord, b: &ThermalImageRecord) -> Ordering {
        self.rank(a)
            .cmp(&self.rank(b))
            .then_with(|| compare_filenames(&a.filename, &b.filename))
    }

    /// Stable sort; records with equal keys keep their input order
    pub fn order(&self, mut records: Vec<ThermalImageRecord>) -> Vec<ThermalImageRecord> {
        records.sort_by(|a, b| self.compare(a, b));
        records
    }
}

/// Collation order of filenames as a file browser lists them.
///
/// Letters compare case-insensitively, and punctuation sorts before digits,
/// which sort before letters. Names equal under that rule put the lower-case
/// spelling first, then fall back to byte order so the result is total.
pub fn compare_filenames(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(collation_key(b))
        .then_with(|| case_key(a).cmp(case_key(b)))
        .then_with(|| a.cmp(b))
}

fn collation_key(name: &str) -> impl Iterator<Item = (u8, char)> + '_ {
    name.chars().map(|c| {
        let class = if c.is_alphabetic() {
            2
        } else if c.is_numeric() {
            1
        } else {
            0
        };
        (class, c.to_lowercase().next().unwrap_or(c))
    })
}

fn case_key(name: &str) -> impl Iterator<Item = bool> + '_ {
    name.chars().map(char::is_uppercase)
}
