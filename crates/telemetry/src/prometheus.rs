// Path: crates/telemetry/src/prometheus.rs
//! A concrete implementation of the metrics sinks using the Prometheus crate.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_histogram_vec, register_int_counter_vec, HistogramVec,
    IntCounterVec,
};

// --- Metric Statics ---
// We use OnceCell to hold the metric collectors. They will be initialized
// exactly once by the `install` function.

static RECONCILE_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static RECONCILE_DURATION_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static CHILD_WRITES_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static KEY_STATE_TRANSITIONS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static FINALIZER_STEPS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

/// The Prometheus-backed sink returned by [`install`].
#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

/// Helper macro to reduce boilerplate for getting a metric from OnceCell.
/// Recording is skipped if `install()` has not been called.
macro_rules! get_metric {
    ($metric:ident) => {
        match $metric.get() {
            Some(m) => m,
            None => return,
        }
    };
}

impl ReconcileMetricsSink for PrometheusSink {
    fn inc_reconcile(&self, controller: &'static str, outcome: &'static str) {
        get_metric!(RECONCILE_TOTAL)
            .with_label_values(&[controller, outcome])
            .inc();
    }
    fn observe_reconcile_duration(&self, controller: &'static str, duration_secs: f64) {
        get_metric!(RECONCILE_DURATION_SECONDS)
            .with_label_values(&[controller])
            .observe(duration_secs);
    }
}

impl ChildMetricsSink for PrometheusSink {
    fn inc_child_write(&self, kind: &str, verb: &'static str) {
        get_metric!(CHILD_WRITES_TOTAL)
            .with_label_values(&[kind, verb])
            .inc();
    }
}

impl LifecycleMetricsSink for PrometheusSink {
    fn inc_key_state_transition(&self, state: &'static str) {
        get_metric!(KEY_STATE_TRANSITIONS_TOTAL)
            .with_label_values(&[state])
            .inc();
    }
    fn inc_finalizer_step(&self, step: &'static str) {
        get_metric!(FINALIZER_STEPS_TOTAL)
            .with_label_values(&[step])
            .inc();
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, variant: &'static str) {
        get_metric!(ERRORS_TOTAL)
            .with_label_values(&[kind, variant])
            .inc();
    }
}

fn set_once<T>(cell: &OnceCell<T>, value: T) -> Result<(), prometheus::Error> {
    cell.set(value).map_err(|_| prometheus::Error::AlreadyReg)
}

/// Initializes all Prometheus metrics collectors and returns a static reference to the sink.
/// This function must be called only once at application startup.
pub fn install() -> Result<&'static dyn MetricsSink, prometheus::Error> {
    set_once(
        &RECONCILE_TOTAL,
        register_int_counter_vec!(
            "besu_operator_reconcile_total",
            "Total reconcile passes, by controller and outcome.",
            &["controller", "outcome"]
        )?,
    )?;
    set_once(
        &RECONCILE_DURATION_SECONDS,
        register_histogram_vec!(
            "besu_operator_reconcile_duration_seconds",
            "Latency of a single reconcile pass.",
            &["controller"],
            exponential_buckets(0.001, 2.0, 15)?
        )?,
    )?;
    set_once(
        &CHILD_WRITES_TOTAL,
        register_int_counter_vec!(
            "besu_operator_child_writes_total",
            "Total API writes to managed objects, by kind and verb.",
            &["kind", "verb"]
        )?,
    )?;
    set_once(
        &KEY_STATE_TRANSITIONS_TOTAL,
        register_int_counter_vec!(
            "besu_operator_key_state_transitions_total",
            "Total transitions of the key provisioning state machine.",
            &["state"]
        )?,
    )?;
    set_once(
        &FINALIZER_STEPS_TOTAL,
        register_int_counter_vec!(
            "besu_operator_finalizer_steps_total",
            "Total teardown steps taken, by step.",
            &["step"]
        )?,
    )?;
    set_once(
        &ERRORS_TOTAL,
        register_int_counter_vec!(
            "besu_operator_errors_total",
            "Total number of errors, categorized by type and variant.",
            &["kind", "variant"]
        )?,
    )?;

    static SINK: PrometheusSink = PrometheusSink;
    Ok(&SINK)
}
