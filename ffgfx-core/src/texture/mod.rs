//! CPU-side texture storage
//!
//! Textures live in main memory and are copied into the single GPU texture
//! slot when bound. Sizes are fixed at creation; sub-rectangles can be
//! rewritten later, which bumps the texture's revision so the next bind
//! knows the GPU copy is stale.

use crate::error::{GfxError, ResourceKind, Result};
use log::debug;
use std::collections::HashMap;

/// Per-texture metadata block accounted alongside the pixels.
pub const TEXTURE_HEADER_BYTES: usize = 64;
pub const MAX_TEXTURE_DIM: u32 = 1024;
pub const MAX_TEXTURE_PIXELS: u32 = 512 * 512;

/// Borrowed 32-bit RGBA image, `width * height` pixels laid out in rows of
/// `row_width` pixels (`row_width >= width`).
#[derive(Debug, Clone, Copy)]
pub struct Bitmap<'a> {
    pub width: u32,
    pub height: u32,
    pub row_width: u32,
    pub pixels: &'a [u32],
}

impl<'a> Bitmap<'a> {
    /// Tightly packed rows.
    pub fn new(width: u32, height: u32, pixels: &'a [u32]) -> Self {
        Self {
            width,
            height,
            row_width: width,
            pixels,
        }
    }

    pub fn with_row_width(mut self, row_width: u32) -> Self {
        self.row_width = row_width;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.row_width < self.width {
            return Err(GfxError::InvalidArgument(format!(
                "row width {} narrower than image width {}",
                self.row_width, self.width
            )));
        }
        let needed = if self.height == 0 {
            0
        } else {
            (self.height as usize - 1) * self.row_width as usize + self.width as usize
        };
        if self.pixels.len() < needed {
            return Err(GfxError::InvalidArgument(format!(
                "bitmap has {} pixels, {}x{} with stride {} needs {}",
                self.pixels.len(),
                self.width,
                self.height,
                self.row_width,
                needed
            )));
        }
        Ok(())
    }
}

/// Smallest `n` with `1 << n >= value`.
pub fn log2_ceil(value: u32) -> u32 {
    value.max(1).next_power_of_two().trailing_zeros()
}

/// Copy `width`x`height` pixels between buffers with independent strides.
pub fn copy_rows(
    dst: &mut [u32],
    dst_stride: usize,
    src: &[u32],
    src_stride: usize,
    width: usize,
    height: usize,
) {
    for row in 0..height {
        let s = row * src_stride;
        let d = row * dst_stride;
        dst[d..d + width].copy_from_slice(&src[s..s + width]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone)]
pub struct Texture {
    width: u32,
    height: u32,
    log2_width: u32,
    log2_height: u32,
    pixels: Vec<u32>,
    revision: u32,
}

impl Texture {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn log2_width(&self) -> u32 {
        self.log2_width
    }

    pub fn log2_height(&self) -> u32 {
        self.log2_height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Incremented by every region update.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn footprint_bytes(&self) -> usize {
        footprint(self.width, self.height)
    }
}

fn footprint(width: u32, height: u32) -> usize {
    TEXTURE_HEADER_BYTES + width as usize * height as usize * 4
}

#[derive(Debug)]
pub struct TexturePool {
    textures: HashMap<u32, Texture>,
    next_id: u32,
    used_bytes: usize,
    budget_bytes: usize,
}

impl TexturePool {
    pub fn new(budget_bytes: usize) -> Self {
        Self {
            textures: HashMap::new(),
            next_id: 1,
            used_bytes: 0,
            budget_bytes,
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn create(&mut self, bmp: &Bitmap<'_>) -> Result<TextureId> {
        if bmp.width == 0
            || bmp.height == 0
            || bmp.width > MAX_TEXTURE_DIM
            || bmp.height > MAX_TEXTURE_DIM
            || bmp.width * bmp.height > MAX_TEXTURE_PIXELS
        {
            return Err(GfxError::InvalidArgument(format!(
                "unsupported texture size {}x{}",
                bmp.width, bmp.height
            )));
        }
        bmp.validate()?;

        let bytes = footprint(bmp.width, bmp.height);
        if self.used_bytes + bytes > self.budget_bytes {
            return Err(GfxError::AllocationFailure {
                what: ResourceKind::Texture,
                bytes,
            });
        }

        let count = (bmp.width * bmp.height) as usize;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(count)
            .map_err(|_| GfxError::AllocationFailure {
                what: ResourceKind::Texture,
                bytes,
            })?;
        pixels.resize(count, 0);
        copy_rows(
            &mut pixels,
            bmp.width as usize,
            bmp.pixels,
            bmp.row_width as usize,
            bmp.width as usize,
            bmp.height as usize,
        );

        let texture = Texture {
            width: bmp.width,
            height: bmp.height,
            log2_width: log2_ceil(bmp.width),
            log2_height: log2_ceil(bmp.height),
            pixels,
            revision: 0,
        };
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.used_bytes += bytes;
        self.textures.insert(id, texture);
        debug!("Created texture {} ({}x{})", id, bmp.width, bmp.height);
        Ok(TextureId(id))
    }

    /// Overwrite a sub-rectangle of the CPU copy in place.
    pub fn update_region(&mut self, id: TextureId, x: u32, y: u32, part: &Bitmap<'_>) -> Result<()> {
        part.validate()?;
        let tex = self.get_mut(id)?;
        let fits_x = x.checked_add(part.width).is_some_and(|end| end <= tex.width);
        let fits_y = y.checked_add(part.height).is_some_and(|end| end <= tex.height);
        if !fits_x || !fits_y {
            return Err(GfxError::InvalidArgument(format!(
                "region {}x{} at ({}, {}) outside {}x{} texture",
                part.width, part.height, x, y, tex.width, tex.height
            )));
        }
        let stride = tex.width as usize;
        let start = y as usize * stride + x as usize;
        copy_rows(
            &mut tex.pixels[start..],
            stride,
            part.pixels,
            part.row_width as usize,
            part.width as usize,
            part.height as usize,
        );
        tex.revision = tex.revision.wrapping_add(1);
        Ok(())
    }

    pub fn get(&self, id: TextureId) -> Result<&Texture> {
        self.textures.get(&id.0).ok_or(GfxError::InvalidHandle {
            kind: ResourceKind::Texture,
            id: id.0,
        })
    }

    fn get_mut(&mut self, id: TextureId) -> Result<&mut Texture> {
        self.textures.get_mut(&id.0).ok_or(GfxError::InvalidHandle {
            kind: ResourceKind::Texture,
            id: id.0,
        })
    }

    pub fn delete(&mut self, id: TextureId) -> bool {
        match self.textures.remove(&id.0) {
            Some(tex) => {
                self.used_bytes -= tex.footprint_bytes();
                true
            }
            None => false,
        }
    }

    /// Drop every texture except `keep`.
    pub fn retain(&mut self, keep: TextureId) {
        self.textures.retain(|&id, _| id == keep.0);
        self.used_bytes = self.textures.values().map(Texture::footprint_bytes).sum();
    }
}
