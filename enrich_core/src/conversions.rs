//! `From` implementations bridging `enrich_config` types to `enrich_core` types.

use crate::config::{FractionCfg, LoadCfg, ThrottleCfg};

// ── FractionCfg ──────────────────────────────────────────────────────────────

impl From<&enrich_config::FractionCfg> for FractionCfg {
    fn from(c: &enrich_config::FractionCfg) -> Self {
        Self {
            period: c.period,
            divisor: c.divisor,
        }
    }
}

// ── ThrottleCfg ──────────────────────────────────────────────────────────────

impl From<&enrich_config::ThrottleCfg> for ThrottleCfg {
    fn from(c: &enrich_config::ThrottleCfg) -> Self {
        Self {
            accel_threshold: c.accel_threshold,
            decel_threshold: c.decel_threshold,
            decel_multiplier: c.decel_multiplier,
            history_len: c.history_len,
            fraction: (&c.fraction).into(),
        }
    }
}

// ── LoadCfg ──────────────────────────────────────────────────────────────────

/// Load settings need the engine's cylinder count, so convert from the whole config.
impl From<&enrich_config::Config> for LoadCfg {
    fn from(c: &enrich_config::Config) -> Self {
        Self {
            accel_threshold: c.load.accel_threshold,
            decel_threshold: c.load.decel_threshold,
            accel_multiplier: c.load.accel_multiplier,
            decel_multiplier: c.load.decel_multiplier,
            history_len: c.load.history_len,
            cylinders: c.engine.cylinders,
        }
    }
}
