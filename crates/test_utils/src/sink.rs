//! A metrics sink that remembers what it was told.

use besu_telemetry::sinks::{
    ChildMetricsSink, ErrorMetricsSink, LifecycleMetricsSink, ReconcileMetricsSink,
};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// Counts every metric event by a `family:label,label` key.
#[derive(Debug, Default)]
pub struct RecordingSink {
    counts: Mutex<BTreeMap<String, u64>>,
}

impl RecordingSink {
    /// A sink with `'static` lifetime, as the controller context requires.
    pub fn leaked() -> &'static Self {
        Box::leak(Box::default())
    }

    fn bump(&self, key: String) {
        *self
            .counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(0) += 1;
    }

    /// How many times `key` was recorded, e.g. `"key_state:Ready"`.
    pub fn count(&self, key: &str) -> u64 {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// A snapshot of every counter.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ReconcileMetricsSink for RecordingSink {
    fn inc_reconcile(&self, controller: &'static str, outcome: &'static str) {
        self.bump(format!("reconcile:{controller},{outcome}"));
    }
    fn observe_reconcile_duration(&self, controller: &'static str, _duration_secs: f64) {
        self.bump(format!("duration:{controller}"));
    }
}

impl ChildMetricsSink for RecordingSink {
    fn inc_child_write(&self, kind: &str, verb: &'static str) {
        self.bump(format!("child_write:{kind},{verb}"));
    }
}

impl LifecycleMetricsSink for RecordingSink {
    fn inc_key_state_transition(&self, state: &'static str) {
        self.bump(format!("key_state:{state}"));
    }
    fn inc_finalizer_step(&self, step: &'static str) {
        self.bump(format!("finalizer:{step}"));
    }
}

impl ErrorMetricsSink for RecordingSink {
    fn inc_error(&self, kind: &'static str, variant: &'static str) {
        self.bump(format!("error:{kind},{variant}"));
    }
}
