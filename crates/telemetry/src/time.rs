// Path: crates/telemetry/src/time.rs
use crate::sinks::ReconcileMetricsSink;
use std::time::Instant;

/// Observes the time between its creation and drop as one reconcile duration.
pub struct Timer<'a, S: ReconcileMetricsSink + ?Sized> {
    sink: &'a S,
    controller: &'static str,
    start: Instant,
}

impl<'a, S: ReconcileMetricsSink + ?Sized> Timer<'a, S> {
    pub fn new(sink: &'a S, controller: &'static str) -> Self {
        Self {
            sink,
            controller,
            start: Instant::now(),
        }
    }
}

impl<S: ReconcileMetricsSink + ?Sized> Drop for Timer<'_, S> {
    fn drop(&mut self) {
        self.sink
            .observe_reconcile_duration(self.controller, self.start.elapsed().as_secs_f64());
    }
}
