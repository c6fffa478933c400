//! Metrics sink trait and implementations.

use super::MetricsSnapshot;
use parking_lot::RwLock;
use tracing::info;

/// Destination for exported counter values.
///
/// Exporting must never fail the caller; sinks log and swallow their own
/// errors.
pub trait MetricsSink: Send + Sync {
    /// Receives a snapshot of every counter.
    fn export(&self, snapshot: &MetricsSnapshot);
}

/// A sink that discards all snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetricsSink;

impl MetricsSink for NoOpMetricsSink {
    fn export(&self, _snapshot: &MetricsSnapshot) {}
}

/// A sink that logs every counter through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMetricsSink;

impl MetricsSink for LoggingMetricsSink {
    fn export(&self, snapshot: &MetricsSnapshot) {
        for counter in &snapshot.counters {
            info!(
                service = %snapshot.service,
                command = %counter.command,
                success = counter.success,
                error = counter.error,
                "Command counters"
            );
        }
    }
}

/// A collecting sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingMetricsSink {
    snapshots: RwLock<Vec<MetricsSnapshot>>,
}

impl CollectingMetricsSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every exported snapshot.
    #[must_use]
    pub fn snapshots(&self) -> Vec<MetricsSnapshot> {
        self.snapshots.read().clone()
    }

    /// Returns the number of exports received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    /// Returns true if nothing was exported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }
}

impl MetricsSink for CollectingMetricsSink {
    fn export(&self, snapshot: &MetricsSnapshot) {
        self.snapshots.write().push(snapshot.clone());
    }
}
