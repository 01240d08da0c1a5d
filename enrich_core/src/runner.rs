//! Reference orchestrator: drives both strategies from a recorded trace.
//!
//! Per tick the throttle strategy is sampled and asked for its correction.
//! On the last tick of an engine cycle the throttle accumulator advances and
//! the load strategy takes its once-per-cycle sample; the resulting load
//! correction holds until the next cycle boundary.

use crate::config::{LoadCfg, ThrottleCfg};
use crate::error::Result;
use crate::load::LoadEnrichment;
use crate::strategy::Enrichment;
use crate::table::{TaperTable, ThrottleTable};
use crate::throttle::ThrottleEnrichment;
use enrich_traits::{CorrectionTable, TaperCurve};
use eyre::WrapErr;

/// One control tick of input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TraceRow {
    /// Throttle position, percent.
    pub tps: f32,
    /// Engine load; only consumed on cycle-end rows.
    pub load: f32,
    /// Last tick of the current engine cycle.
    pub cycle_end: bool,
}

impl From<&enrich_config::TraceSample> for TraceRow {
    fn from(s: &enrich_config::TraceSample) -> Self {
        Self {
            tps: s.tps,
            load: s.load,
            cycle_end: s.cycle_end,
        }
    }
}

/// Corrections in effect after a tick, in ms of injector time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Corrections {
    pub tps_ms: f32,
    pub load_ms: f32,
}

impl Corrections {
    #[inline]
    pub fn total_ms(&self) -> f32 {
        self.tps_ms + self.load_ms
    }
}

#[derive(Debug)]
pub struct Runner<T: CorrectionTable, C: TaperCurve> {
    throttle: ThrottleEnrichment<T>,
    load: LoadEnrichment<C>,
    load_ms: f32,
    cycles: u64,
}

impl<T: CorrectionTable, C: TaperCurve> Runner<T, C> {
    pub fn new(throttle: ThrottleEnrichment<T>, load: LoadEnrichment<C>) -> Self {
        Self {
            throttle,
            load,
            load_ms: 0.0,
            cycles: 0,
        }
    }

    pub fn tick(&mut self, row: &TraceRow) -> Corrections {
        self.throttle.sample(row.tps);
        let tps_ms = self.throttle.compute_correction();
        if row.cycle_end {
            self.throttle.on_cycle_boundary();
            self.load.sample(row.load);
            self.load_ms = self.load.compute_correction();
            self.load.on_cycle_boundary();
            self.cycles += 1;
        }
        Corrections {
            tps_ms,
            load_ms: self.load_ms,
        }
    }

    /// Replay a whole trace, one [`Corrections`] per row.
    pub fn run<'a, I>(&mut self, rows: I) -> Vec<Corrections>
    where
        I: IntoIterator<Item = &'a TraceRow>,
    {
        rows.into_iter().map(|r| self.tick(r)).collect()
    }

    /// Engine cycles completed since construction or the last reset.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn reset(&mut self) {
        self.throttle.reset();
        self.load.reset();
        self.load_ms = 0.0;
        self.cycles = 0;
    }

    pub fn throttle(&self) -> &ThrottleEnrichment<T> {
        &self.throttle
    }

    pub fn throttle_mut(&mut self) -> &mut ThrottleEnrichment<T> {
        &mut self.throttle
    }

    pub fn load(&self) -> &LoadEnrichment<C> {
        &self.load
    }

    pub fn load_mut(&mut self) -> &mut LoadEnrichment<C> {
        &mut self.load
    }
}

/// Build a runner from TOML configuration.
///
/// `table` / `taper` override the tables found in `cfg` (e.g. CSV files given
/// on the command line). Without any throttle table the lookup yields 0 ms.
pub fn build_runner(
    cfg: &enrich_config::Config,
    table: Option<&enrich_config::ThrottleTableData>,
    taper: Option<&enrich_config::TaperData>,
) -> Result<Runner<ThrottleTable, TaperTable>> {
    let table = match table.or(cfg.throttle.table.as_ref()) {
        Some(data) => ThrottleTable::try_from(data).wrap_err("throttle table")?,
        None => ThrottleTable::new(vec![0.0], vec![0.0], vec![0.0])?,
    };
    let taper = match taper {
        Some(data) => TaperTable::try_from(data),
        None => TaperTable::try_from(&cfg.load.taper()),
    }
    .wrap_err("load taper")?;

    let throttle_cfg: ThrottleCfg = (&cfg.throttle).into();
    let load_cfg: LoadCfg = cfg.into();
    let throttle = ThrottleEnrichment::new(throttle_cfg, table).wrap_err("tps enrichment")?;
    let load = LoadEnrichment::new(load_cfg, taper).wrap_err("load enrichment")?;
    Ok(Runner::new(throttle, load))
}
