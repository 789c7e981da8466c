use log::{Level, log_enabled, trace, warn};
use std::time::{Duration, Instant};

/// Traces the wall time spent inside a labelled section at `trace` level.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        if log_enabled!(Level::Trace) {
            trace!("start {label}");
        }
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            trace!("end {} ({} us)", self.label, self.start.elapsed().as_micros());
        }
    }
}

/// Warns when a single tick takes longer than `budget_ms`.
pub fn warn_if_tick_budget_exceeded(duration: Duration, budget_ms: f32) -> bool {
    let elapsed_ms = duration.as_secs_f32() * 1000.0;
    if elapsed_ms > budget_ms {
        warn!("physics tick exceeded budget: {elapsed_ms:.2} ms > {budget_ms:.2} ms");
        true
    } else {
        false
    }
}
