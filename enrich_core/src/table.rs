//! Lookup tables consumed by the strategies.
//!
//! Both tables clamp to their edge values outside the bin range. They are
//! built (and validated) once before the control loop starts; lookups do not
//! allocate.

use crate::error::{BuildError, Result};
use enrich_traits::{CorrectionTable, TaperCurve};

/// Locate `x` between two bins: `(lower index, upper index, fraction)`.
#[inline]
fn bracket(bins: &[f32], x: f32) -> (usize, usize, f32) {
    let last = bins.len() - 1;
    if x.is_nan() || x <= bins[0] {
        return (0, 0, 0.0);
    }
    if x >= bins[last] {
        return (last, last, 0.0);
    }
    // bins[0] < x < bins[last], so 1 <= hi <= last
    let hi = bins.partition_point(|b| *b <= x);
    let lo = hi - 1;
    let frac = (x - bins[lo]) / (bins[hi] - bins[lo]);
    (lo, hi, frac)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn check_bins(bins: &[f32], what: &'static str) -> Result<()> {
    if bins.is_empty() {
        return Err(eyre::Report::new(BuildError::InvalidTable(what)));
    }
    if bins.iter().any(|b| !b.is_finite()) || bins.windows(2).any(|w| w[1] <= w[0]) {
        return Err(eyre::Report::new(BuildError::InvalidTable(what)));
    }
    Ok(())
}

/// Two-axis `(tps_from, tps_to) -> extra ms` table with bilinear interpolation.
#[derive(Debug, Clone)]
pub struct ThrottleTable {
    from_bins: Vec<f32>,
    to_bins: Vec<f32>,
    // Row-major: values[from_idx * to_bins.len() + to_idx]
    values: Vec<f32>,
}

impl ThrottleTable {
    pub fn new(from_bins: Vec<f32>, to_bins: Vec<f32>, values: Vec<f32>) -> Result<Self> {
        check_bins(&from_bins, "from bins must be non-empty, finite and strictly increasing")?;
        check_bins(&to_bins, "to bins must be non-empty, finite and strictly increasing")?;
        if values.len() != from_bins.len() * to_bins.len() {
            return Err(eyre::Report::new(BuildError::InvalidTable(
                "value count must equal from bins x to bins",
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(eyre::Report::new(BuildError::InvalidTable(
                "values must be finite",
            )));
        }
        Ok(Self {
            from_bins,
            to_bins,
            values,
        })
    }

    #[inline]
    fn at(&self, fi: usize, ti: usize) -> f32 {
        self.values[fi * self.to_bins.len() + ti]
    }
}

impl CorrectionTable for ThrottleTable {
    fn lookup(&self, from: f32, to: f32) -> f32 {
        let (f0, f1, ft) = bracket(&self.from_bins, from);
        let (t0, t1, tt) = bracket(&self.to_bins, to);
        let low = lerp(self.at(f0, t0), self.at(f0, t1), tt);
        let high = lerp(self.at(f1, t0), self.at(f1, t1), tt);
        lerp(low, high, ft)
    }
}

impl TryFrom<&enrich_config::ThrottleTableData> for ThrottleTable {
    type Error = eyre::Report;
    fn try_from(d: &enrich_config::ThrottleTableData) -> Result<Self> {
        if d.values.iter().any(|row| row.len() != d.to_bins.len()) {
            return Err(eyre::Report::new(BuildError::InvalidTable(
                "every row must have one value per to bin",
            )));
        }
        let values = d.values.iter().flatten().copied().collect();
        Self::new(d.from_bins.clone(), d.to_bins.clone(), values)
    }
}

/// One-axis taper: multiplier by samples elapsed since the detected jump.
#[derive(Debug, Clone)]
pub struct TaperTable {
    bins: Vec<f32>,
    mult: Vec<f32>,
}

impl TaperTable {
    pub fn new(bins: Vec<f32>, mult: Vec<f32>) -> Result<Self> {
        check_bins(&bins, "taper bins must be non-empty, finite and strictly increasing")?;
        if mult.len() != bins.len() {
            return Err(eyre::Report::new(BuildError::InvalidTable(
                "taper multipliers must match taper bins",
            )));
        }
        if mult.iter().any(|v| !v.is_finite()) {
            return Err(eyre::Report::new(BuildError::InvalidTable(
                "taper multipliers must be finite",
            )));
        }
        Ok(Self { bins, mult })
    }

    /// Taper that leaves every jump at full strength.
    pub fn flat() -> Self {
        Self {
            bins: vec![0.0],
            mult: vec![1.0],
        }
    }
}

impl TaperCurve for TaperTable {
    fn lookup(&self, distance: f32) -> f32 {
        let (lo, hi, t) = bracket(&self.bins, distance);
        lerp(self.mult[lo], self.mult[hi], t)
    }
}

impl TryFrom<&enrich_config::TaperData> for TaperTable {
    type Error = eyre::Report;
    fn try_from(d: &enrich_config::TaperData) -> Result<Self> {
        Self::new(d.bins.clone(), d.mult.clone())
    }
}

/// Table returning the same value everywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConstantTable(pub f32);

impl CorrectionTable for ConstantTable {
    fn lookup(&self, _from: f32, _to: f32) -> f32 {
        self.0
    }
}

impl TaperCurve for ConstantTable {
    fn lookup(&self, _distance: f32) -> f32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> ThrottleTable {
        // rows: from 0 / 100; cols: to 0 / 100
        ThrottleTable::new(vec![0.0, 100.0], vec![0.0, 100.0], vec![0.0, 10.0, 0.0, 2.0]).unwrap()
    }

    #[test]
    fn bilinear_hits_corners_and_midpoints() {
        let t = grid();
        assert_eq!(t.lookup(0.0, 100.0), 10.0);
        assert_eq!(t.lookup(100.0, 100.0), 2.0);
        assert!((t.lookup(0.0, 50.0) - 5.0).abs() < 1e-6);
        assert!((t.lookup(50.0, 100.0) - 6.0).abs() < 1e-6);
        assert!((t.lookup(50.0, 50.0) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn clamps_outside_bins() {
        let t = grid();
        assert_eq!(t.lookup(-20.0, 250.0), 10.0);
        assert_eq!(t.lookup(f32::NAN, 100.0), 10.0);
    }

    #[test]
    fn rejects_mismatched_values() {
        let err = ThrottleTable::new(vec![0.0, 1.0], vec![0.0], vec![1.0]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidTable(_))
        ));
    }

    #[test]
    fn taper_interpolates_and_clamps() {
        let t = TaperTable::new(vec![1.0, 3.0], vec![1.0, 0.0]).unwrap();
        assert_eq!(t.lookup(0.0), 1.0);
        assert!((t.lookup(2.0) - 0.5).abs() < 1e-6);
        assert_eq!(t.lookup(9.0), 0.0);
        assert_eq!(TaperTable::flat().lookup(5.0), 1.0);
    }

    #[test]
    fn taper_rejects_unsorted_bins() {
        assert!(TaperTable::new(vec![2.0, 1.0], vec![1.0, 1.0]).is_err());
    }
}
