//! Fixed-capacity sample history with relative lookback.
//!
//! Storage is an inline array sized to [`MAX_HISTORY_LEN`]; the runtime capacity
//! selects how much of it is in use. Pushing never allocates. All slot
//! arithmetic stays inside this module: callers only see offsets relative to
//! the newest sample (offset 0).

use crate::error::EnrichError;

/// Static upper bound for any history length.
pub const MAX_HISTORY_LEN: usize = enrich_config::MAX_HISTORY_LEN;
/// Length used when a strategy is created without explicit configuration.
pub const DEFAULT_HISTORY_LEN: usize = 4;

#[derive(Debug, Clone)]
pub struct BoundedHistory {
    buf: [f32; MAX_HISTORY_LEN],
    capacity: usize,
    // Slot the next push writes to.
    head: usize,
    count: usize,
}

impl Default for BoundedHistory {
    fn default() -> Self {
        Self {
            buf: [0.0; MAX_HISTORY_LEN],
            capacity: DEFAULT_HISTORY_LEN,
            head: 0,
            count: 0,
        }
    }
}

impl BoundedHistory {
    /// Create an empty history retaining at most `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Result<Self, EnrichError> {
        let mut h = Self::default();
        h.set_capacity(i64::try_from(capacity).unwrap_or(i64::MAX))?;
        Ok(h)
    }

    /// Resize the lookback window.
    ///
    /// Out-of-range requests are rejected and leave both the capacity and the
    /// stored samples untouched. An accepted resize clears the history.
    pub fn set_capacity(&mut self, requested: i64) -> Result<(), EnrichError> {
        let valid = usize::try_from(requested)
            .ok()
            .filter(|n| (1..=MAX_HISTORY_LEN).contains(n));
        let Some(n) = valid else {
            tracing::warn!(
                requested,
                current = self.capacity,
                max = MAX_HISTORY_LEN,
                "history length rejected"
            );
            return Err(EnrichError::InvalidCapacity {
                requested,
                max: MAX_HISTORY_LEN,
            });
        };
        self.capacity = n;
        self.clear();
        Ok(())
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples currently retained (`min(insertions, capacity)`).
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Record a sample, evicting the oldest once full.
    #[inline]
    pub fn push(&mut self, value: f32) {
        self.buf[self.head] = value;
        self.head = (self.head + 1) % self.capacity;
        if self.count < self.capacity {
            self.count += 1;
        }
    }

    /// Sample `offset` steps behind the newest one; `None` when `offset >= len()`.
    #[inline]
    pub fn get(&self, offset: usize) -> Option<f32> {
        self.slot(offset).map(|s| self.buf[s])
    }

    /// Discard all samples, keeping the capacity.
    pub fn clear(&mut self) {
        self.head = 0;
        self.count = 0;
    }

    /// Samples from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.count).filter_map(move |o| self.get(o))
    }

    /// Samples elapsed between the write head and the slot holding `offset`.
    ///
    /// Computed on raw slot positions: a non-positive difference means the
    /// slot sits past a wrap, so the logical length is added back.
    pub fn distance_since(&self, offset: usize) -> Option<usize> {
        let slot = self.slot(offset)?;
        let mut distance = self.head as isize - slot as isize;
        if distance <= 0 {
            distance += self.count.min(self.capacity) as isize;
        }
        Some(distance.max(0) as usize)
    }

    #[inline]
    fn slot(&self, offset: usize) -> Option<usize> {
        if offset >= self.count {
            return None;
        }
        Some((self.head + self.capacity - 1 - offset) % self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_is_relative_to_newest() {
        let mut h = BoundedHistory::default();
        for v in [1.0, 2.0, 3.0] {
            h.push(v);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.get(0), Some(3.0));
        assert_eq!(h.get(2), Some(1.0));
        assert_eq!(h.get(3), None);
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut h = BoundedHistory::with_capacity(3).unwrap();
        for v in 1..=5 {
            h.push(v as f32);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.iter().collect::<Vec<_>>(), vec![5.0, 4.0, 3.0]);
    }

    #[test]
    fn rejected_capacity_keeps_content() {
        let mut h = BoundedHistory::with_capacity(4).unwrap();
        h.push(10.0);
        h.push(90.0);
        for bad in [0, -1, (MAX_HISTORY_LEN as i64) + 1] {
            let err = h.set_capacity(bad).unwrap_err();
            assert_eq!(
                err,
                EnrichError::InvalidCapacity {
                    requested: bad,
                    max: MAX_HISTORY_LEN
                }
            );
        }
        assert_eq!(h.capacity(), 4);
        assert_eq!(h.iter().collect::<Vec<_>>(), vec![90.0, 10.0]);
    }

    #[test]
    fn accepted_capacity_clears() {
        let mut h = BoundedHistory::default();
        h.push(1.0);
        h.set_capacity(8).unwrap();
        assert_eq!(h.capacity(), 8);
        assert!(h.is_empty());
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut h = BoundedHistory::with_capacity(6).unwrap();
        h.push(1.0);
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.capacity(), 6);
        assert_eq!(h.get(0), None);
    }

    #[test]
    fn distance_is_offset_plus_one_across_wraps() {
        let mut h = BoundedHistory::with_capacity(4).unwrap();
        for i in 0..11 {
            h.push(i as f32);
            for off in 0..h.len() {
                assert_eq!(h.distance_since(off), Some(off + 1), "push {i} offset {off}");
            }
        }
        assert_eq!(h.distance_since(4), None);
    }
}
