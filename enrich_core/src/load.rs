//! Engine-load enrichment.
//!
//! The steepest load rise in the window is scaled by the cylinder count and,
//! on acceleration, weighted by a taper looked up by how many samples ago the
//! rise happened. Deceleration is applied at full strength.
//!
//! The taper treats elapsed samples as elapsed time, which only holds at a
//! constant sampling rate.

use crate::config::LoadCfg;
use crate::detector::find_steepest_rise;
use crate::error::{EnrichError, Result};
use crate::history::BoundedHistory;
use crate::strategy::Enrichment;
use enrich_traits::{DebugSink, DebugSnapshot, LoadSnapshot, TaperCurve};

pub struct LoadEnrichment<C: TaperCurve> {
    cfg: LoadCfg,
    taper: C,
    history: BoundedHistory,
    sink: Option<Box<dyn DebugSink + Send>>,
}

impl<C: TaperCurve> core::fmt::Debug for LoadEnrichment<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoadEnrichment")
            .field("cfg", &self.cfg)
            .field("history_len", &self.history.len())
            .field("debug_sink", &self.sink.is_some())
            .finish()
    }
}

impl<C: TaperCurve> LoadEnrichment<C> {
    pub fn new(cfg: LoadCfg, taper: C) -> Result<Self> {
        let history = BoundedHistory::with_capacity(cfg.history_len).map_err(eyre::Report::new)?;
        if cfg.cylinders == 0 {
            tracing::warn!("cylinder count 0 clamped to 1");
        }
        Ok(Self {
            cfg,
            taper,
            history,
            sink: None,
        })
    }

    /// Attach an observer that receives a [`LoadSnapshot`] after every correction.
    pub fn with_debug_sink(mut self, sink: Box<dyn DebugSink + Send>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn set_debug_sink(&mut self, sink: Option<Box<dyn DebugSink + Send>>) {
        self.sink = sink;
    }

    pub fn config(&self) -> &LoadCfg {
        &self.cfg
    }

    pub fn history(&self) -> &BoundedHistory {
        &self.history
    }

    pub fn reconfigure(&mut self, cfg: LoadCfg) -> core::result::Result<(), EnrichError> {
        if cfg.history_len != self.history.capacity() {
            self.set_capacity(i64::try_from(cfg.history_len).unwrap_or(i64::MAX))?;
        }
        self.cfg = cfg;
        Ok(())
    }
}

impl<C: TaperCurve> Enrichment for LoadEnrichment<C> {
    #[inline]
    fn sample(&mut self, value: f32) {
        self.history.push(value);
    }

    fn compute_correction(&mut self) -> f32 {
        let Some(rise) = find_steepest_rise(&self.history) else {
            return 0.0;
        };
        let d = rise.delta() * self.cfg.cylinders.max(1) as f32;

        // distance and taper stay 0 unless the accel branch fires
        let mut distance = 0;
        let mut taper = 0.0;
        let result = if d > self.cfg.accel_threshold {
            distance = self.history.distance_since(rise.offset).unwrap_or(0);
            taper = self.taper.lookup(distance as f32);
            taper * d * self.cfg.accel_multiplier
        } else if d < -self.cfg.decel_threshold {
            d * self.cfg.decel_multiplier
        } else {
            0.0
        };

        tracing::trace!(d, distance, taper, result_ms = result, "load enrichment");

        if let Some(sink) = self.sink.as_mut() {
            sink.publish(&DebugSnapshot::Load(LoadSnapshot {
                distance,
                result_ms: result,
                taper,
            }));
        }

        result
    }

    fn reset(&mut self) {
        self.history.clear();
        tracing::debug!("load enrichment reset");
    }

    fn set_capacity(&mut self, requested: i64) -> core::result::Result<(), EnrichError> {
        self.history.set_capacity(requested)
    }
}
