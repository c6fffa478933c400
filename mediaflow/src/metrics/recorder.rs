//! Instrument registry issuing per-command counters.

use super::MetricsSink;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// A monotonic counter. Clones share the same value.
#[derive(Debug, Clone)]
pub struct Counter {
    name: Arc<str>,
    value: Arc<AtomicU64>,
}

impl Counter {
    fn new(name: String) -> Self {
        Self {
            name: name.into(),
            value: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Adds `n` to the counter.
    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Returns the instrument name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The success and error counters of one command name.
#[derive(Debug, Clone)]
pub struct CommandCounters {
    /// Incremented once per successful execution.
    pub success: Counter,
    /// Incremented once per failed execution.
    pub error: Counter,
}

/// Counter values of one command at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// Command name.
    pub command: String,
    /// Success count.
    pub success: u64,
    /// Error count.
    pub error: u64,
}

/// Point-in-time view of every counter, as handed to a [`MetricsSink`].
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Service the counters belong to.
    pub service: String,
    /// When the snapshot was taken.
    pub taken_at: DateTime<Utc>,
    /// Per-command values, sorted by command name.
    pub counters: Vec<CounterSnapshot>,
}

impl MetricsSnapshot {
    /// Returns the values recorded for `command`.
    #[must_use]
    pub fn get(&self, command: &str) -> Option<&CounterSnapshot> {
        self.counters.iter().find(|c| c.command == command)
    }
}

/// Process-wide registry of command counters.
///
/// Create one at process start, hand it to command constructors, and call
/// [`MetricsRecorder::shutdown`] before exit so the final values reach the
/// sink. Asking twice for the same command name returns the same counters.
pub struct MetricsRecorder {
    service: String,
    counters: DashMap<String, CommandCounters>,
    sink: Arc<dyn MetricsSink>,
    closed: AtomicBool,
}

impl MetricsRecorder {
    /// Creates a recorder exporting to `sink`.
    #[must_use]
    pub fn new(service: impl Into<String>, sink: Arc<dyn MetricsSink>) -> Self {
        let service = service.into();
        debug!(service = %service, "Metrics recorder initialized");
        Self {
            service,
            counters: DashMap::new(),
            sink,
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the counters for `command`, creating them on first use.
    #[must_use]
    pub fn command_counters(&self, command: &str) -> CommandCounters {
        self.counters
            .entry(command.to_string())
            .or_insert_with(|| CommandCounters {
                success: Counter::new(format!("{command}.success")),
                error: Counter::new(format!("{command}.error")),
            })
            .clone()
    }

    /// Returns the service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Captures the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut counters: Vec<CounterSnapshot> = self
            .counters
            .iter()
            .map(|entry| CounterSnapshot {
                command: entry.key().clone(),
                success: entry.value().success.value(),
                error: entry.value().error.value(),
            })
            .collect();
        counters.sort_by(|a, b| a.command.cmp(&b.command));

        MetricsSnapshot {
            service: self.service.clone(),
            taken_at: Utc::now(),
            counters,
        }
    }

    /// Exports the current values to the sink.
    pub fn flush(&self) {
        self.sink.export(&self.snapshot());
    }

    /// Flushes a final time. Later calls are no-ops.
    pub fn shutdown(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.flush();
            info!(service = %self.service, "Metrics recorder shut down");
        }
    }

    /// Returns true once [`MetricsRecorder::shutdown`] has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for MetricsRecorder {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRecorder")
            .field("service", &self.service)
            .field("commands", &self.counters.len())
            .field("closed", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}
