//! Guide table for interval selection.
//!
//! Maps a rescaled uniform draw to an interval index at or before the one
//! containing the draw in cumulative-area order, so that the forward scan
//! that follows takes O(1) steps on average. The table is a pure function
//! of the envelope and is rebuilt from scratch whenever the interval count
//! changes; incremental patching is not worth the bookkeeping.

use super::Envelope;
use crate::Float;

/// Lookup table from hat-area offsets to interval indices.
#[derive(Debug, Clone)]
pub struct GuideTable {
    slots: Vec<usize>,
    factor: Float,
}

impl GuideTable {
    /// Create an empty table with the given size factor (table length
    /// relative to the interval count). A factor of zero degrades to a
    /// single slot, i.e. a plain linear scan.
    pub fn new(factor: Float) -> Self {
        Self {
            slots: Vec::new(),
            factor,
        }
    }

    /// Number of slots currently in the table.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the table has not been built yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Rebuild the table against the envelope's current cumulative areas.
    pub fn rebuild(&mut self, envelope: &Envelope) {
        let n = envelope.n();
        let size = if self.factor <= 0.0 {
            1
        } else {
            ((self.factor * n as Float).ceil() as usize).max(1)
        };

        self.slots.clear();
        self.slots.reserve(size);

        let total = envelope.total_hat();
        let mut i = 0;
        for k in 0..size {
            let u = k as Float / size as Float * total;
            // First interval whose cumulative area exceeds u.
            while envelope.interval(i).a_cum() <= u && i + 1 < n {
                i += 1;
            }
            self.slots.push(i);
        }
    }

    /// Map a draw `u` in `[0, total_hat)` to the interval containing it:
    /// jump to the slot's interval, then scan forward.
    pub fn locate(&self, envelope: &Envelope, u: Float) -> usize {
        let size = self.slots.len();
        let slot = ((u / envelope.total_hat() * size as Float) as usize).min(size - 1);

        let n = envelope.n();
        let mut i = self.slots[slot];
        while u >= envelope.interval(i).a_cum() && i + 1 < n {
            i += 1;
        }
        i
    }
}
