use log::info;
use std::time::{Duration, Instant};

/// Per-tick timing and population counters, owned by the world.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhysicsProfiler {
    pub integrate_time: Duration,
    pub ccd_time: Duration,
    pub broad_phase_time: Duration,
    pub narrow_phase_time: Duration,
    pub solver_time: Duration,
    pub sleep_time: Duration,
    pub total_tick_time: Duration,

    pub body_count: usize,
    pub collider_count: usize,
    pub pair_count: usize,
    pub contact_count: usize,
    pub sleeping_count: usize,
}

impl PhysicsProfiler {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Logs the last tick's breakdown at `info` level.
    pub fn report(&self) {
        let total_us = self.total_tick_time.as_micros() as f32;
        if total_us < 1.0 {
            return;
        }

        info!(
            "bodies: {}, colliders: {}, pairs: {}, contacts: {}, sleeping: {}",
            self.body_count,
            self.collider_count,
            self.pair_count,
            self.contact_count,
            self.sleeping_count
        );
        info!(
            "tick: {:.2} ms",
            self.total_tick_time.as_secs_f32() * 1000.0
        );
        for (label, phase) in [
            ("integrate", self.integrate_time),
            ("ccd", self.ccd_time),
            ("broad phase", self.broad_phase_time),
            ("narrow phase", self.narrow_phase_time),
            ("solver", self.solver_time),
            ("sleep", self.sleep_time),
        ] {
            info!(
                "  {label:<13} {:.2} ms ({:.1}%)",
                phase.as_secs_f32() * 1000.0,
                (phase.as_micros() as f32 / total_us) * 100.0
            );
        }
    }
}

/// Accumulates the elapsed time of its scope into a profiler slot.
pub struct PhaseTimer<'a> {
    start: Instant,
    output: &'a mut Duration,
}

impl<'a> PhaseTimer<'a> {
    pub fn new(output: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            output,
        }
    }
}

impl Drop for PhaseTimer<'_> {
    fn drop(&mut self) {
        *self.output += self.start.elapsed();
    }
}
