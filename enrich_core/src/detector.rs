//! Steepest-rise search over a [`BoundedHistory`].

use crate::history::BoundedHistory;

/// The consecutive pair with the largest `to - from` in the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteepestRise {
    /// Offset of `to` relative to the newest sample; `from` sits at `offset + 1`.
    pub offset: usize,
    pub from: f32,
    pub to: f32,
}

impl SteepestRise {
    #[inline]
    pub fn delta(&self) -> f32 {
        self.to - self.from
    }
}

/// Scan newest pair to oldest and return the largest rise.
///
/// Returns `None` with fewer than two samples. A later (older) candidate only
/// replaces the incumbent when strictly larger, so equal rises resolve to the
/// most recent pair.
pub fn find_steepest_rise(history: &BoundedHistory) -> Option<SteepestRise> {
    let pair_at = |offset: usize| -> Option<SteepestRise> {
        Some(SteepestRise {
            offset,
            to: history.get(offset)?,
            from: history.get(offset + 1)?,
        })
    };

    let mut best = pair_at(0)?;
    for offset in 1..history.len().saturating_sub(1) {
        let Some(candidate) = pair_at(offset) else {
            break;
        };
        if candidate.delta() > best.delta() {
            best = candidate;
        }
    }
    Some(best)
}

/// Magnitude of the steepest rise (`to - from`), `None` with fewer than two samples.
pub fn steepest_rise_magnitude(history: &BoundedHistory) -> Option<f32> {
    find_steepest_rise(history).map(|r| r.delta())
}
