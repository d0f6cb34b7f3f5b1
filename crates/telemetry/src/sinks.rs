// Path: crates/telemetry/src/sinks.rs
//! Defines abstract traits for metrics reporting, decoupling core logic from the backend.

/// A no-op sink for use in tests or when telemetry is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopSink;

/// A sink for metrics about reconcile passes.
pub trait ReconcileMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments the counter of finished reconciles, labeled by controller and
    /// outcome (`converged`, `requeue`, or `error`).
    fn inc_reconcile(&self, controller: &'static str, outcome: &'static str);
    /// Observes the wall-clock duration of one reconcile pass.
    fn observe_reconcile_duration(&self, controller: &'static str, duration_secs: f64);
}
impl ReconcileMetricsSink for NopSink {
    fn inc_reconcile(&self, _controller: &'static str, _outcome: &'static str) {}
    fn observe_reconcile_duration(&self, _controller: &'static str, _duration_secs: f64) {}
}

/// A sink for metrics about writes to child objects.
pub trait ChildMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter of API writes, labeled by object kind and verb
    /// (`create`, `update`, `delete`).
    fn inc_child_write(&self, kind: &str, verb: &'static str);
}
impl ChildMetricsSink for NopSink {
    fn inc_child_write(&self, _kind: &str, _verb: &'static str) {}
}

/// A sink for the key-lifecycle and teardown state machines.
pub trait LifecycleMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter when a network enters a provisioning state.
    fn inc_key_state_transition(&self, state: &'static str);
    /// Increments a counter for each teardown step taken, labeled by step.
    fn inc_finalizer_step(&self, step: &'static str);
}
impl LifecycleMetricsSink for NopSink {
    fn inc_key_state_transition(&self, _state: &'static str) {}
    fn inc_finalizer_step(&self, _step: &'static str) {}
}

/// A sink for recording structured error metrics.
pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for a specific error, categorized by its kind and variant.
    fn inc_error(&self, kind: &'static str, variant: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _variant: &'static str) {}
}

/// A unified sink that implements all domain-specific traits, providing a single
/// point of implementation for metrics backends like Prometheus.
pub trait MetricsSink:
    ReconcileMetricsSink + ChildMetricsSink + LifecycleMetricsSink + ErrorMetricsSink
{
}

// Blanket implementation to allow any type that implements all sub-traits
// to be used as a `MetricsSink`.
impl<T> MetricsSink for T where
    T: ReconcileMetricsSink + ChildMetricsSink + LifecycleMetricsSink + ErrorMetricsSink
{
}
