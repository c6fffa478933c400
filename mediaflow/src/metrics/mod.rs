//! Per-command success and error counters.
//!
//! A [`MetricsRecorder`] is created once per process and injected into every
//! command constructor. Counters are monotonic and exported to a
//! [`MetricsSink`] on flush and at shutdown.

mod recorder;
mod sink;

pub use recorder::{CommandCounters, Counter, CounterSnapshot, MetricsRecorder, MetricsSnapshot};
pub use sink::{CollectingMetricsSink, LoggingMetricsSink, MetricsSink, NoOpMetricsSink};
