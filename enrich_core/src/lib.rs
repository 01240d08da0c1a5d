#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Transient fuel enrichment (hardware-agnostic).
//!
//! Corrects fueling when throttle position or engine load moves faster than
//! the base fuel map can follow. Sensor values come in through
//! [`Enrichment::sample`]; tables come in through the `enrich_traits` seams.
//!
//! ## Architecture
//!
//! - **History**: fixed-capacity lookback buffer (`history` module)
//! - **Detection**: steepest rise between consecutive samples (`detector` module)
//! - **Throttle**: table enrichment plus multi-cycle "acceleration pump" (`throttle` module)
//! - **Load**: cylinder-scaled load delta with distance taper (`load` module)
//! - **Tables**: bilinear throttle table and taper curve (`table` module)
//! - **Runner**: trace replay orchestrating both strategies (`runner` module)
//!
//! ## Real-time behavior
//!
//! `sample`, `compute_correction` and `on_cycle_boundary` never allocate,
//! block or panic. Misconfiguration is rejected at construction or clamped.

pub mod config;
pub mod conversions;
pub mod detector;
pub mod error;
pub mod history;
pub mod load;
pub mod mocks;
pub mod runner;
pub mod strategy;
pub mod table;
pub mod throttle;

pub use config::{FractionCfg, LoadCfg, ThrottleCfg};
pub use detector::{SteepestRise, find_steepest_rise, steepest_rise_magnitude};
pub use error::{BuildError, EnrichError};
pub use history::{BoundedHistory, DEFAULT_HISTORY_LEN, MAX_HISTORY_LEN};
pub use load::LoadEnrichment;
pub use runner::{Corrections, Runner, TraceRow, build_runner};
pub use strategy::Enrichment;
pub use table::{ConstantTable, TaperTable, ThrottleTable};
pub use throttle::{ACCUMULATOR_EPSILON_MS, FractionState, ThrottleEnrichment};
