//! Throttle-position (TPS) enrichment with the multi-cycle "acceleration pump".
//!
//! Each tick the steepest recent TPS rise is looked up in the two-axis table
//! (or turned into an enleanment on a sharp drop). When fractional smoothing is
//! enabled, that charge is split across engine cycles:
//!
//! - per tick, the larger of the fresh charge and the pending accumulator is
//!   divided by `divisor`, then spread evenly over `period` cycles;
//! - per cycle, the accumulator is recharged with the period's peak;
//! - per period, what was injected is subtracted from the accumulator.
//!
//! With `divisor = d` the accumulator shrinks geometrically by `(d - 1) / d`
//! each period, and is snapped to zero below [`ACCUMULATOR_EPSILON_MS`].

use crate::config::ThrottleCfg;
use crate::detector::find_steepest_rise;
use crate::error::{EnrichError, Result};
use crate::history::BoundedHistory;
use crate::strategy::Enrichment;
use enrich_traits::{CorrectionTable, DebugSink, DebugSnapshot, ThrottleSnapshot};

/// Accumulated fuel below this is treated as fully dispensed.
pub const ACCUMULATOR_EPSILON_MS: f32 = 0.001;

/// Accumulator fields, exposed for telemetry and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FractionState {
    /// Fuel still owed across future cycles (ms).
    pub accumulated_ms: f32,
    /// Peak charge seen during the current engine cycle.
    pub max_extra_per_cycle_ms: f32,
    /// Peak charge carried through the current period.
    pub max_extra_per_period_ms: f32,
    /// Largest per-tick injection issued in the current period.
    pub max_injected_per_period_ms: f32,
    /// Cycles left before the period rolls over.
    pub cycle_countdown: i32,
}

pub struct ThrottleEnrichment<T: CorrectionTable> {
    cfg: ThrottleCfg,
    table: T,
    history: BoundedHistory,
    state: FractionState,
    sink: Option<Box<dyn DebugSink + Send>>,
}

impl<T: CorrectionTable> core::fmt::Debug for ThrottleEnrichment<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ThrottleEnrichment")
            .field("cfg", &self.cfg)
            .field("history_len", &self.history.len())
            .field("state", &self.state)
            .field("debug_sink", &self.sink.is_some())
            .finish()
    }
}

impl<T: CorrectionTable> ThrottleEnrichment<T> {
    pub fn new(cfg: ThrottleCfg, table: T) -> Result<Self> {
        let history = BoundedHistory::with_capacity(cfg.history_len).map_err(eyre::Report::new)?;
        Ok(Self {
            cfg,
            table,
            history,
            state: FractionState::default(),
            sink: None,
        })
    }

    /// Attach an observer that receives a [`ThrottleSnapshot`] after every correction.
    pub fn with_debug_sink(mut self, sink: Box<dyn DebugSink + Send>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn set_debug_sink(&mut self, sink: Option<Box<dyn DebugSink + Send>>) {
        self.sink = sink;
    }

    pub fn config(&self) -> &ThrottleCfg {
        &self.cfg
    }

    pub fn history(&self) -> &BoundedHistory {
        &self.history
    }

    pub fn fraction_state(&self) -> FractionState {
        self.state
    }

    /// Apply new thresholds/multipliers/smoothing. A changed history length is
    /// applied through [`Enrichment::set_capacity`]; if it is rejected nothing
    /// else changes either.
    pub fn reconfigure(&mut self, cfg: ThrottleCfg) -> core::result::Result<(), EnrichError> {
        if cfg.history_len != self.history.capacity() {
            self.set_capacity(i64::try_from(cfg.history_len).unwrap_or(i64::MAX))?;
        }
        self.cfg = cfg;
        Ok(())
    }

    fn reset_fraction(&mut self) {
        self.state = FractionState::default();
    }
}

impl<T: CorrectionTable> Enrichment for ThrottleEnrichment<T> {
    #[inline]
    fn sample(&mut self, value: f32) {
        self.history.push(value);
    }

    fn compute_correction(&mut self) -> f32 {
        let Some(rise) = find_steepest_rise(&self.history) else {
            return 0.0;
        };
        let delta = rise.delta();
        let table_value = self.table.lookup(rise.from, rise.to);

        let mut extra = if delta > self.cfg.accel_threshold {
            table_value
        } else if delta < -self.cfg.decel_threshold {
            delta * self.cfg.decel_multiplier
        } else {
            0.0
        };

        let fraction = self.cfg.fraction;
        if fraction.is_enabled() {
            let period = fraction.period_clamped() as f32;
            let divisor = fraction.divisor_clamped();
            // A weak fresh charge does not drain the pump: keep injecting from the accumulator.
            let max_extra = extra.max(self.state.accumulated_ms);
            let injected = max_extra / divisor;
            self.state.max_extra_per_cycle_ms = extra.max(self.state.max_extra_per_cycle_ms);
            self.state.max_injected_per_period_ms =
                injected.max(self.state.max_injected_per_period_ms);
            extra = injected / period;
        } else {
            self.reset_fraction();
        }

        tracing::trace!(
            tps_from = rise.from,
            tps_to = rise.to,
            table_value,
            extra_ms = extra,
            accumulated_ms = self.state.accumulated_ms,
            "tps enrichment"
        );

        if let Some(sink) = self.sink.as_mut() {
            sink.publish(&DebugSnapshot::Throttle(ThrottleSnapshot {
                tps_from: rise.from,
                tps_to: rise.to,
                table_value,
                extra_ms: extra,
                accumulated_ms: self.state.accumulated_ms,
                max_extra_per_period_ms: self.state.max_extra_per_period_ms,
                max_injected_per_period_ms: self.state.max_injected_per_period_ms,
                cycle_countdown: self.state.cycle_countdown,
            }));
        }

        extra
    }

    fn on_cycle_boundary(&mut self) {
        let s = &mut self.state;
        // Charge the pump with the fuel requested during this cycle.
        s.accumulated_ms -= s.max_extra_per_period_ms;
        s.max_extra_per_period_ms = s.max_extra_per_cycle_ms.max(s.max_extra_per_period_ms);
        s.max_extra_per_cycle_ms = 0.0;
        s.accumulated_ms += s.max_extra_per_period_ms;

        s.cycle_countdown -= 1;
        if s.cycle_countdown <= 0 {
            s.max_extra_per_period_ms = 0.0;
            // What was injected during the period is no longer owed.
            s.accumulated_ms -= s.max_injected_per_period_ms;
            s.max_injected_per_period_ms = 0.0;
            if s.accumulated_ms < ACCUMULATOR_EPSILON_MS {
                s.accumulated_ms = 0.0;
            }
            s.cycle_countdown = self.cfg.fraction.period_clamped();
            tracing::debug!(
                accumulated_ms = s.accumulated_ms,
                "tps enrichment period rolled over"
            );
        }
    }

    fn reset(&mut self) {
        self.history.clear();
        self.reset_fraction();
        tracing::debug!("tps enrichment reset");
    }

    fn set_capacity(&mut self, requested: i64) -> core::result::Result<(), EnrichError> {
        self.history.set_capacity(requested)
    }
}
