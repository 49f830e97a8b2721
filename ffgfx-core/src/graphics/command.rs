//! Command buffer arena
//!
//! Commands are written sequentially as 64-bit dwords; the transfer engine
//! moves whole 128-bit qwords, so a finalized buffer is always padded to an
//! even dword count. Slots reserved ahead of their content are identified by
//! offset, never by address, and every write is bounds-checked against the
//! fixed capacity.

use thiserror::Error;

/// A write would run past the end of the buffer.
///
/// The draw path sizes batches so this never happens; it is surfaced only as
/// a diagnostic for immediate register writes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("command buffer overflow: need {needed} dwords, {available} left")]
pub struct Overflow {
    pub needed: usize,
    pub available: usize,
}

/// A reserved, not yet written, run of dwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSlot {
    pub offset: usize,
    pub dwords: usize,
}

#[derive(Debug, Clone)]
pub struct CommandBuffer {
    words: Vec<u64>,
    cursor: usize,
}

impl CommandBuffer {
    pub fn new(capacity_qwords: usize) -> Self {
        Self {
            words: vec![0; capacity_qwords * 2],
            cursor: 0,
        }
    }

    pub fn capacity_qwords(&self) -> usize {
        self.words.len() / 2
    }

    /// Write position in dwords.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Qwords written so far, counting a half-filled trailing qword.
    pub fn len_qwords(&self) -> usize {
        self.cursor.div_ceil(2)
    }

    pub fn remaining_dwords(&self) -> usize {
        self.words.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn clear(&mut self) {
        self.cursor = 0;
    }

    fn check(&self, dwords: usize) -> Result<(), Overflow> {
        if dwords > self.remaining_dwords() {
            Err(Overflow {
                needed: dwords,
                available: self.remaining_dwords(),
            })
        } else {
            Ok(())
        }
    }

    #[inline]
    pub fn push(&mut self, dword: u64) -> Result<(), Overflow> {
        self.check(1)?;
        self.words[self.cursor] = dword;
        self.cursor += 1;
        Ok(())
    }

    pub fn extend(&mut self, dwords: &[u64]) -> Result<(), Overflow> {
        self.check(dwords.len())?;
        self.words[self.cursor..self.cursor + dwords.len()].copy_from_slice(dwords);
        self.cursor += dwords.len();
        Ok(())
    }

    /// Pad to a qword boundary, then write one full qword.
    pub fn push_qword(&mut self, lo: u64, hi: u64) -> Result<(), Overflow> {
        self.align_qword()?;
        self.extend(&[lo, hi])
    }

    /// Pad with a zero dword if the cursor sits mid-qword.
    pub fn align_qword(&mut self) -> Result<(), Overflow> {
        if self.cursor % 2 == 1 {
            self.push(0)?;
        }
        Ok(())
    }

    /// Skip past `dwords` without writing them yet.
    pub fn reserve(&mut self, dwords: usize) -> Result<HeaderSlot, Overflow> {
        self.check(dwords)?;
        let slot = HeaderSlot {
            offset: self.cursor,
            dwords,
        };
        self.words[self.cursor..self.cursor + dwords].fill(0);
        self.cursor += dwords;
        Ok(slot)
    }

    /// Fill a reserved slot. Content shorter than the slot is zero padded.
    pub fn patch(&mut self, slot: HeaderSlot, content: &[u64]) {
        debug_assert!(content.len() <= slot.dwords);
        let n = content.len().min(slot.dwords);
        self.words[slot.offset..slot.offset + n].copy_from_slice(&content[..n]);
    }

    /// Give back a reserved slot that turned out to be unnecessary. Only
    /// valid while nothing has been written after it.
    pub fn rollback(&mut self, slot: HeaderSlot) {
        debug_assert_eq!(self.cursor, slot.offset + slot.dwords);
        self.cursor = slot.offset;
    }

    pub fn words(&self) -> &[u64] {
        &self.words[..self.cursor]
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.words())
    }
}
