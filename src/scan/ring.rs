//! Circular buffer of packed rows.

use crate::codec::PackedRow;
use crate::util::{PbmGrepError, PbmGrepResult};

/// Fixed-capacity ring holding the most recent `cycle_rows` packed rows.
///
/// Image row `y` lives in slot `y % cycle_rows` until it is overwritten by
/// row `y + cycle_rows`.
#[derive(Clone, Debug)]
pub struct RowRing {
    slots: Vec<PackedRow>,
    next_row: usize,
}

impl RowRing {
    /// Allocates a ring for rows of `width` pixels.
    pub fn new(width: usize, cycle_rows: usize) -> PbmGrepResult<Self> {
        if cycle_rows == 0 {
            return Err(PbmGrepError::InvalidInput("ring needs at least one row"));
        }
        Ok(Self {
            slots: vec![PackedRow::new(width); cycle_rows],
            next_row: 0,
        })
    }

    /// Returns the number of slots.
    pub fn cycle_rows(&self) -> usize {
        self.slots.len()
    }

    /// Returns the words per row.
    pub fn cols32(&self) -> usize {
        self.slots[0].cols32()
    }

    /// Returns how many rows have been pushed so far.
    pub fn rows_seen(&self) -> usize {
        self.next_row
    }

    /// Packs the next image row into its slot and returns its row index.
    pub fn push(&mut self, bits: &[u8]) -> PbmGrepResult<usize> {
        let y = self.next_row;
        let slot = y % self.slots.len();
        self.slots[slot].pack(bits)?;
        self.next_row += 1;
        Ok(y)
    }

    /// Returns image row `y` if it is still held by the ring.
    pub fn row(&self, y: usize) -> Option<&PackedRow> {
        if y >= self.next_row || y + self.slots.len() < self.next_row {
            return None;
        }
        self.slots.get(y % self.slots.len())
    }
}
