//! Runtime configuration for the enrichment strategies.
//!
//! These are the value objects the strategies are constructed and reconfigured
//! with. They are separate from the TOML-deserialized config in `enrich_config`.

use crate::history::DEFAULT_HISTORY_LEN;

/// Multi-cycle fractional enrichment ("acceleration pump").
///
/// Smoothing is active when `period > 1` or `divisor > 1.0`. Values below 1
/// are clamped to 1 at use, so a zero or negative setting never divides by zero.
#[derive(Debug, Clone, Copy)]
pub struct FractionCfg {
    /// Engine cycles one enrichment charge is spread over.
    pub period: i32,
    /// Fraction of the pending charge injected per period.
    pub divisor: f32,
}

impl Default for FractionCfg {
    fn default() -> Self {
        Self {
            period: 1,
            divisor: 1.0,
        }
    }
}

impl FractionCfg {
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.period > 1 || self.divisor > 1.0
    }

    #[inline]
    pub fn period_clamped(&self) -> i32 {
        self.period.max(1)
    }

    #[inline]
    pub fn divisor_clamped(&self) -> f32 {
        if self.divisor.is_finite() {
            self.divisor.max(1.0)
        } else {
            1.0
        }
    }
}

/// Throttle-position strategy configuration.
#[derive(Debug, Clone, Copy)]
pub struct ThrottleCfg {
    /// TPS rise per sample (%) above which the table value is applied.
    pub accel_threshold: f32,
    /// TPS drop per sample (%) beyond which fuel is removed.
    pub decel_threshold: f32,
    /// ms removed per % of TPS drop.
    pub decel_multiplier: f32,
    pub history_len: usize,
    pub fraction: FractionCfg,
}

impl Default for ThrottleCfg {
    fn default() -> Self {
        Self {
            accel_threshold: 40.0,
            decel_threshold: 40.0,
            decel_multiplier: 0.0,
            history_len: DEFAULT_HISTORY_LEN,
            fraction: FractionCfg::default(),
        }
    }
}

/// Engine-load strategy configuration.
#[derive(Debug, Clone, Copy)]
pub struct LoadCfg {
    pub accel_threshold: f32,
    pub decel_threshold: f32,
    pub accel_multiplier: f32,
    pub decel_multiplier: f32,
    pub history_len: usize,
    /// Scales a per-sample load delta to a whole-engine-cycle quantity.
    pub cylinders: u32,
}

impl Default for LoadCfg {
    fn default() -> Self {
        Self {
            accel_threshold: 2.0,
            decel_threshold: 2.0,
            accel_multiplier: 0.0,
            decel_multiplier: 0.0,
            history_len: DEFAULT_HISTORY_LEN,
            cylinders: 4,
        }
    }
}
