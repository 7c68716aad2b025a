//! Metrics collection and reporting

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};
use thermoscan_classifiers::ClassificationSource;
use thermoscan_core::Severity;

const SOURCES: [&str; 4] = ["filename", "metadata", "forced", "default"];

static DESCRIBED: Once = Once::new();

/// Counters for report batches
///
/// Cloning shares the underlying counters. Every `record_*` call also emits
/// the matching counter through the `metrics` facade.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    batches: AtomicU64,
    captures: AtomicU64,
    decode_failures: AtomicU64,
    by_source: [AtomicU64; 4],
    by_severity: [AtomicU64; 3],
    unrated: AtomicU64,
    total_batch_latency_us: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector; the first one also registers the
    /// metric descriptions
    pub fn new() -> Self {
        DESCRIBED.call_once(Self::describe);
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    /// Register metric descriptions with the installed recorder
    fn describe() {
        ::metrics::describe_counter!(
            "thermoscan_captures_total",
            "Captures annotated, by classification source"
        );
        ::metrics::describe_counter!(
            "thermoscan_severity_total",
            "Annotated captures by severity"
        );
        ::metrics::describe_counter!(
            "thermoscan_decode_failures_total",
            "Captures the decoder could not read"
        );
        ::metrics::describe_histogram!(
            "thermoscan_batch_latency_us",
            ::metrics::Unit::Microseconds,
            "Time to annotate and order one report batch"
        );
    }

    /// Record one annotated capture
    pub fn record_capture(&self, source: &ClassificationSource, severity: Option<Severity>) {
        self.inner.captures.fetch_add(1, Ordering::Relaxed);

        let source = source.as_str();
        if let Some(i) = SOURCES.iter().position(|s| *s == source) {
            self.inner.by_source[i].fetch_add(1, Ordering::Relaxed);
        }
        ::metrics::counter!("thermoscan_captures_total", "source" => source).increment(1);

        match severity {
            Some(severity) => {
                self.inner.by_severity[severity_index(severity)].fetch_add(1, Ordering::Relaxed);
                ::metrics::counter!("thermoscan_severity_total", "severity" => severity.as_str())
                    .increment(1);
            }
            None => {
                self.inner.unrated.fetch_add(1, Ordering::Relaxed);
                ::metrics::counter!("thermoscan_severity_total", "severity" => "unrated").increment(1);
            }
        }
    }

    /// Record a capture the decoder failed on
    pub fn record_decode_failure(&self) {
        self.inner.decode_failures.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!("thermoscan_decode_failures_total").increment(1);
    }

    /// Record a finished batch
    pub fn record_batch(&self, latency_us: u64) {
        self.inner.batches.fetch_add(1, Ordering::Relaxed);
        self.inner
            .total_batch_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);
        ::metrics::histogram!("thermoscan_batch_latency_us").record(latency_us as f64);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

        MetricsSnapshot {
            batches: load(&self.inner.batches),
            captures: load(&self.inner.captures),
            decode_failures: load(&self.inner.decode_failures),
            by_filename: load(&self.inner.by_source[0]),
            by_metadata: load(&self.inner.by_source[1]),
            forced: load(&self.inner.by_source[2]),
            defaulted: load(&self.inner.by_source[3]),
            normal: load(&self.inner.by_severity[0]),
            warning: load(&self.inner.by_severity[1]),
            critical: load(&self.inner.by_severity[2]),
            unrated: load(&self.inner.unrated),
            total_batch_latency_us: load(&self.inner.total_batch_latency_us),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn severity_index(severity: Severity) -> usize {
    match severity {
        Severity::Normal => 0,
        Severity::Warning => 1,
        Severity::Critical => 2,
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches: u64,
    pub captures: u64,
    pub decode_failures: u64,
    pub by_filename: u64,
    pub by_metadata: u64,
    pub forced: u64,
    pub defaulted: u64,
    pub normal: u64,
    pub warning: u64,
    pub critical: u64,
    pub unrated: u64,
    pub total_batch_latency_us: u64,
}

impl MetricsSnapshot {
    /// Average latency per batch
    pub fn avg_batch_latency_us(&self) -> u64 {
        if self.batches == 0 {
            0
        } else {
            self.total_batch_latency_us / self.batches
        }
    }

    /// Share of captures that fell through to the generic category
    pub fn default_rate(&self) -> f64 {
        if self.captures == 0 {
            0.0
        } else {
            self.defaulted as f64 / self.captures as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermoscan_classifiers::ScoreCard;

    #[test]
    fn test_metrics_collection() {
        let metrics = MetricsCollector::new();

        metrics.record_capture(
            &ClassificationSource::Filename {
                keyword: "pv".to_string(),
            },
            Some(Severity::Critical),
        );
        metrics.record_capture(
            &ClassificationSource::Metadata {
                scores: ScoreCard::new(),
            },
            Some(Severity::Normal),
        );
        metrics.record_capture(&ClassificationSource::Default, None);
        metrics.record_decode_failure();
        metrics.record_batch(3000);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.captures, 3);
        assert_eq!(snapshot.by_filename, 1);
        assert_eq!(snapshot.by_metadata, 1);
        assert_eq!(snapshot.defaulted, 1);
        assert_eq!(snapshot.critical, 1);
        assert_eq!(snapshot.normal, 1);
        assert_eq!(snapshot.unrated, 1);
        assert_eq!(snapshot.decode_failures, 1);
        assert_eq!(snapshot.avg_batch_latency_us(), 3000);
        assert!((snapshot.default_rate() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = MetricsCollector::new();
        let clone = metrics.clone();

        clone.record_capture(&ClassificationSource::Forced, Some(Severity::Warning));

        assert_eq!(metrics.snapshot().forced, 1);
        assert_eq!(metrics.snapshot().warning, 1);
    }

    #[test]
    fn test_descriptions_registered_once_collector_built() {
        let _metrics = MetricsCollector::new();
        assert!(DESCRIBED.is_completed());
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = MetricsCollector::new().snapshot();
        assert_eq!(snapshot, MetricsSnapshot::default());
        assert_eq!(snapshot.avg_batch_latency_us(), 0);
        assert_eq!(snapshot.default_rate(), 0.0);
    }
}
