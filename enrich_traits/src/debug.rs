//! Debug telemetry seam.
//!
//! Strategies publish a snapshot after each correction when a sink is attached.
//! Sinks are observers only: nothing they do feeds back into the correction.

/// Intermediate values of one throttle correction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThrottleSnapshot {
    pub tps_from: f32,
    pub tps_to: f32,
    pub table_value: f32,
    pub extra_ms: f32,
    pub accumulated_ms: f32,
    pub max_extra_per_period_ms: f32,
    pub max_injected_per_period_ms: f32,
    pub cycle_countdown: i32,
}

/// Intermediate values of one load correction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadSnapshot {
    pub distance: usize,
    pub result_ms: f32,
    pub taper: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebugSnapshot {
    Throttle(ThrottleSnapshot),
    Load(LoadSnapshot),
}

pub trait DebugSink {
    fn publish(&mut self, snapshot: &DebugSnapshot);
}

impl<F> DebugSink for F
where
    F: FnMut(&DebugSnapshot),
{
    fn publish(&mut self, snapshot: &DebugSnapshot) {
        self(snapshot)
    }
}
