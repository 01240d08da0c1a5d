#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and table parsing for the enrichment engine.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Table CSV loaders enforce exact headers and rebuild the lookup grid,
//!   rejecting gaps and duplicate cells.
use serde::Deserialize;
use serde::de::Deserializer;

/// Upper bound for a strategy history length; mirrors the core's fixed buffer size.
pub const MAX_HISTORY_LEN: usize = 32;
/// Upper bound for the cylinder count accepted by validation.
pub const MAX_CYLINDERS: u32 = 16;

/// Throttle table CSV schema (long format, one row per grid cell).
///
/// Expected headers:
/// from,to,extra_ms
///
/// Example:
/// from,to,extra_ms
/// 0,0,0.0
/// 0,100,4.5
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ThrottleTableRow {
    pub from: f32,
    pub to: f32,
    pub extra_ms: f32,
}

/// Taper CSV schema.
///
/// Expected headers:
/// distance,mult
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct TaperRow {
    pub distance: f32,
    pub mult: f32,
}

/// Recorded sensor trace schema, one row per control tick.
///
/// Expected headers:
/// tps,load,cycle_end
///
/// `cycle_end` accepts `0`/`1` or `true`/`false` and marks the last tick of an
/// engine cycle.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct TraceSample {
    pub tps: f32,
    pub load: f32,
    #[serde(deserialize_with = "de_flag")]
    pub cycle_end: bool,
}

fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "cycle_end must be 0/1 or true/false, got '{other}'"
        ))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineCfg {
    pub cylinders: u32,
}

impl Default for EngineCfg {
    fn default() -> Self {
        Self { cylinders: 4 }
    }
}

/// Multi-cycle fractional enrichment ("acceleration pump").
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct FractionCfg {
    /// Engine cycles a single enrichment is spread over.
    pub period: i32,
    /// Fraction of the accumulated charge injected per period.
    pub divisor: f32,
}

impl Default for FractionCfg {
    fn default() -> Self {
        Self {
            period: 3,
            divisor: 1.0,
        }
    }
}

/// Two-axis throttle correction table: rows indexed by `from_bins`,
/// columns by `to_bins`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ThrottleTableData {
    pub from_bins: Vec<f32>,
    pub to_bins: Vec<f32>,
    pub values: Vec<Vec<f32>>,
}

impl ThrottleTableData {
    pub fn validate(&self) -> eyre::Result<()> {
        check_bins("throttle.table.from_bins", &self.from_bins)?;
        check_bins("throttle.table.to_bins", &self.to_bins)?;
        if self.values.len() != self.from_bins.len() {
            eyre::bail!(
                "throttle.table.values must have {} rows (one per from bin), got {}",
                self.from_bins.len(),
                self.values.len()
            );
        }
        for (i, row) in self.values.iter().enumerate() {
            if row.len() != self.to_bins.len() {
                eyre::bail!(
                    "throttle.table.values row {} must have {} columns, got {}",
                    i,
                    self.to_bins.len(),
                    row.len()
                );
            }
            if row.iter().any(|v| !v.is_finite()) {
                eyre::bail!("throttle.table.values row {} contains a non-finite value", i);
            }
        }
        Ok(())
    }
}

/// One-axis taper curve: multiplier by samples elapsed since the load jump.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TaperData {
    pub bins: Vec<f32>,
    pub mult: Vec<f32>,
}

impl TaperData {
    pub fn validate(&self) -> eyre::Result<()> {
        check_bins("load.taper_bins", &self.bins)?;
        if self.mult.len() != self.bins.len() {
            eyre::bail!(
                "load.taper_mult must have {} entries to match load.taper_bins, got {}",
                self.bins.len(),
                self.mult.len()
            );
        }
        if self.mult.iter().any(|v| !v.is_finite()) {
            eyre::bail!("load.taper_mult contains a non-finite value");
        }
        Ok(())
    }
}

impl Default for TaperData {
    fn default() -> Self {
        Self {
            bins: (0..8).map(|i| i as f32).collect(),
            mult: vec![1.0; 8],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ThrottleCfg {
    /// TPS rise per sample (%) above which the table enrichment applies.
    pub accel_threshold: f32,
    /// TPS drop per sample (%) beyond which the decel enleanment applies.
    pub decel_threshold: f32,
    /// ms of fuel removed per % of TPS drop.
    pub decel_multiplier: f32,
    pub history_len: usize,
    pub fraction: FractionCfg,
    /// Optional inline table; a CSV given on the command line takes precedence.
    pub table: Option<ThrottleTableData>,
}

impl Default for ThrottleCfg {
    fn default() -> Self {
        Self {
            accel_threshold: 40.0,
            decel_threshold: 40.0,
            decel_multiplier: 0.0,
            history_len: 4,
            fraction: FractionCfg::default(),
            table: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoadCfg {
    pub accel_threshold: f32,
    pub decel_threshold: f32,
    pub accel_multiplier: f32,
    pub decel_multiplier: f32,
    pub history_len: usize,
    pub taper_bins: Vec<f32>,
    pub taper_mult: Vec<f32>,
}

impl Default for LoadCfg {
    fn default() -> Self {
        let taper = TaperData::default();
        Self {
            accel_threshold: 2.0,
            decel_threshold: 2.0,
            accel_multiplier: 0.0,
            decel_multiplier: 0.0,
            history_len: 4,
            taper_bins: taper.bins,
            taper_mult: taper.mult,
        }
    }
}

impl LoadCfg {
    pub fn taper(&self) -> TaperData {
        TaperData {
            bins: self.taper_bins.clone(),
            mult: self.taper_mult.clone(),
        }
    }
}

/// Which strategy publishes debug snapshots.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DebugMode {
    #[default]
    Off,
    TpsAccel,
    LoadAccel,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct DebugCfg {
    pub mode: DebugMode,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub engine: EngineCfg,
    pub throttle: ThrottleCfg,
    pub load: LoadCfg,
    pub debug: DebugCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

fn check_bins(name: &str, bins: &[f32]) -> eyre::Result<()> {
    if bins.is_empty() {
        eyre::bail!("{name} must not be empty");
    }
    if bins.iter().any(|b| !b.is_finite()) {
        eyre::bail!("{name} contains a non-finite value");
    }
    if bins.windows(2).any(|w| w[1] <= w[0]) {
        eyre::bail!("{name} must be strictly increasing");
    }
    Ok(())
}

fn check_threshold(name: &str, v: f32) -> eyre::Result<()> {
    if !v.is_finite() || v.is_sign_negative() {
        eyre::bail!("{name} must be finite and >= 0");
    }
    Ok(())
}

fn check_multiplier(name: &str, v: f32) -> eyre::Result<()> {
    if !v.is_finite() {
        eyre::bail!("{name} must be finite");
    }
    Ok(())
}

fn check_history_len(name: &str, n: usize) -> eyre::Result<()> {
    if !(1..=MAX_HISTORY_LEN).contains(&n) {
        eyre::bail!("{name} must be in [1, {MAX_HISTORY_LEN}], got {n}");
    }
    Ok(())
}

/// Rebuild a throttle grid from long-format rows.
///
/// Bins are the sorted distinct `from`/`to` values; every cell must appear exactly once.
pub fn throttle_table_from_rows(rows: &[ThrottleTableRow]) -> eyre::Result<ThrottleTableData> {
    if rows.is_empty() {
        eyre::bail!("throttle table requires at least one row");
    }
    if rows
        .iter()
        .any(|r| !(r.from.is_finite() && r.to.is_finite() && r.extra_ms.is_finite()))
    {
        eyre::bail!("throttle table contains a non-finite value");
    }

    let distinct = |pick: fn(&ThrottleTableRow) -> f32| -> Vec<f32> {
        let mut v: Vec<f32> = rows.iter().map(pick).collect();
        v.sort_by(f32::total_cmp);
        v.dedup();
        v
    };
    let from_bins = distinct(|r| r.from);
    let to_bins = distinct(|r| r.to);

    let mut cells: Vec<Vec<Option<f32>>> = vec![vec![None; to_bins.len()]; from_bins.len()];
    for (idx, r) in rows.iter().enumerate() {
        let fi = from_bins.partition_point(|b| *b < r.from);
        let ti = to_bins.partition_point(|b| *b < r.to);
        let cell = &mut cells[fi][ti];
        if cell.is_some() {
            eyre::bail!(
                "throttle table has duplicate cell from={} to={} at row {}",
                r.from,
                r.to,
                idx + 2
            );
        }
        *cell = Some(r.extra_ms);
    }

    let mut values = Vec::with_capacity(from_bins.len());
    for (fi, row) in cells.into_iter().enumerate() {
        let mut out = Vec::with_capacity(to_bins.len());
        for (ti, c) in row.into_iter().enumerate() {
            match c {
                Some(v) => out.push(v),
                None => eyre::bail!(
                    "throttle table is missing cell from={} to={}",
                    from_bins[fi],
                    to_bins[ti]
                ),
            }
        }
        values.push(out);
    }

    Ok(ThrottleTableData {
        from_bins,
        to_bins,
        values,
    })
}

fn read_csv_rows<T: serde::de::DeserializeOwned>(
    path: &std::path::Path,
    kind: &str,
    expected: &[&str],
) -> eyre::Result<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open {kind} CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "{kind} CSV must have headers '{}', got: {}",
            expected.join(","),
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<T>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    Ok(rows)
}

pub fn load_throttle_table_csv(path: &std::path::Path) -> eyre::Result<ThrottleTableData> {
    let rows: Vec<ThrottleTableRow> =
        read_csv_rows(path, "throttle table", &["from", "to", "extra_ms"])?;
    let table = throttle_table_from_rows(&rows)?;
    table.validate()?;
    Ok(table)
}

pub fn load_taper_csv(path: &std::path::Path) -> eyre::Result<TaperData> {
    let rows: Vec<TaperRow> = read_csv_rows(path, "taper", &["distance", "mult"])?;
    let taper = TaperData {
        bins: rows.iter().map(|r| r.distance).collect(),
        mult: rows.iter().map(|r| r.mult).collect(),
    };
    taper.validate()?;
    Ok(taper)
}

pub fn load_trace_csv(path: &std::path::Path) -> eyre::Result<Vec<TraceSample>> {
    let rows: Vec<TraceSample> = read_csv_rows(path, "trace", &["tps", "load", "cycle_end"])?;
    if let Some(idx) = rows
        .iter()
        .position(|r| !(r.tps.is_finite() && r.load.is_finite()))
    {
        eyre::bail!("trace row {} contains a non-finite value", idx + 2);
    }
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Engine
        if self.engine.cylinders == 0 {
            eyre::bail!("engine.cylinders must be >= 1");
        }
        if self.engine.cylinders > MAX_CYLINDERS {
            eyre::bail!("engine.cylinders must be <= {MAX_CYLINDERS}");
        }

        // Throttle
        check_threshold("throttle.accel_threshold", self.throttle.accel_threshold)?;
        check_threshold("throttle.decel_threshold", self.throttle.decel_threshold)?;
        check_multiplier("throttle.decel_multiplier", self.throttle.decel_multiplier)?;
        check_history_len("throttle.history_len", self.throttle.history_len)?;
        if self.throttle.fraction.period < 1 {
            eyre::bail!("throttle.fraction.period must be >= 1");
        }
        if !self.throttle.fraction.divisor.is_finite() || self.throttle.fraction.divisor < 1.0 {
            eyre::bail!("throttle.fraction.divisor must be >= 1.0");
        }
        if let Some(table) = &self.throttle.table {
            table.validate()?;
        }

        // Load
        check_threshold("load.accel_threshold", self.load.accel_threshold)?;
        check_threshold("load.decel_threshold", self.load.decel_threshold)?;
        check_multiplier("load.accel_multiplier", self.load.accel_multiplier)?;
        check_multiplier("load.decel_multiplier", self.load.decel_multiplier)?;
        check_history_len("load.history_len", self.load.history_len)?;
        self.load.taper().validate()?;

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot}");
        }

        Ok(())
    }
}
