//! GPU local memory allocation (4 MiB)
//!
//! Surfaces and textures are placed once at startup and never freed, so a
//! bump allocator is all that is needed. Addresses are in 32-bit words.

use super::PixelFormat;

pub const VRAM_WORDS: u32 = 1024 * 1024;
/// A page is 64x32 pixels at 32 bpp.
pub const PAGE_WORDS: u32 = 2048;
/// A block is 8x8 pixels at 32 bpp.
pub const BLOCK_WORDS: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Page,
    Block,
}

#[derive(Debug, Clone)]
pub struct VramAllocator {
    next: u32,
}

impl Default for VramAllocator {
    fn default() -> Self {
        Self::new()
    }
}

fn align_up(value: u32, to: u32) -> u32 {
    value.div_ceil(to) * to
}

impl VramAllocator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Words needed for a `width`x`height` region, rounded to whole pages.
    pub fn size_words(width: u32, height: u32, psm: PixelFormat) -> u32 {
        let (page_w, page_h) = match psm {
            PixelFormat::Psm16 => (64, 64),
            _ => (64, 32),
        };
        let w = align_up(width, page_w);
        let h = align_up(height, page_h);
        match psm {
            PixelFormat::Psm16 => w * h / 2,
            _ => w * h,
        }
    }

    /// Reserve a region, or `None` if local memory is exhausted.
    pub fn allocate(
        &mut self,
        width: u32,
        height: u32,
        psm: PixelFormat,
        alignment: Alignment,
    ) -> Option<u32> {
        let align = match alignment {
            Alignment::Page => PAGE_WORDS,
            Alignment::Block => BLOCK_WORDS,
        };
        let base = align_up(self.next, align);
        let end = base.checked_add(Self::size_words(width, height, psm))?;
        if end > VRAM_WORDS {
            return None;
        }
        self.next = end;
        Some(base)
    }

    /// Claim everything left, aligned to `alignment`. Returns the base
    /// address and the number of words.
    pub fn allocate_rest(&mut self, alignment: Alignment) -> Option<(u32, u32)> {
        let align = match alignment {
            Alignment::Page => PAGE_WORDS,
            Alignment::Block => BLOCK_WORDS,
        };
        let base = align_up(self.next, align);
        if base >= VRAM_WORDS {
            return None;
        }
        self.next = VRAM_WORDS;
        Some((base, VRAM_WORDS - base))
    }

    /// Words left after the last allocation.
    pub fn remaining_words(&self) -> u32 {
        VRAM_WORDS - self.next
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}
