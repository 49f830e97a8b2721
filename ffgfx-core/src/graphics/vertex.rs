//! Vertex formats, vertex buffers and colour preprocessing
//!
//! Vertex colours are rewritten once per lock cycle, at unlock time, to
//! compensate for the blend unit: both the texture-modulate and the alpha
//! blend stages divide by 128 instead of 255, so halving the inputs up front
//! gives the same visual result as a conventional GPU.

use crate::error::{GfxError, ResourceKind, Result};
use crate::graphics::math::Vec3;
use bytemuck::{Pod, Zeroable};
use log::debug;
use std::collections::HashMap;

// ── Packed colour ───────────────────────────────────────────────

pub const PACKEDCOL_R_SHIFT: u32 = 0;
pub const PACKEDCOL_G_SHIFT: u32 = 8;
pub const PACKEDCOL_B_SHIFT: u32 = 16;
pub const PACKEDCOL_A_SHIFT: u32 = 24;
pub const PACKEDCOL_A_MASK: u32 = 0xFF << PACKEDCOL_A_SHIFT;

/// Pack four 8-bit channels in the RGBAQ register's byte order.
pub const fn pack_col(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) << PACKEDCOL_R_SHIFT
        | (g as u32) << PACKEDCOL_G_SHIFT
        | (b as u32) << PACKEDCOL_B_SHIFT
        | (a as u32) << PACKEDCOL_A_SHIFT
}

pub const fn col_r(col: u32) -> u8 {
    (col >> PACKEDCOL_R_SHIFT) as u8
}

pub const fn col_g(col: u32) -> u8 {
    (col >> PACKEDCOL_G_SHIFT) as u8
}

pub const fn col_b(col: u32) -> u8 {
    (col >> PACKEDCOL_B_SHIFT) as u8
}

pub const fn col_a(col: u32) -> u8 {
    (col >> PACKEDCOL_A_SHIFT) as u8
}

/// Halve the alpha channel, leaving RGB untouched.
#[inline]
pub const fn halve_alpha(col: u32) -> u32 {
    let a = (col_a(col) >> 1) as u32;
    (col & !PACKEDCOL_A_MASK) | (a << PACKEDCOL_A_SHIFT)
}

/// Halve R, G and B. The mask drops each channel's low bit first so the
/// shift cannot bleed into the neighbouring channel.
#[inline]
pub const fn halve_rgb(col: u32) -> u32 {
    ((col & 0x00FE_FEFE) >> 1) | (col & PACKEDCOL_A_MASK)
}

// ── Vertex layouts ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexFormat {
    #[default]
    Coloured,
    Textured,
}

impl VertexFormat {
    /// Bytes per vertex.
    pub const fn stride(self) -> usize {
        match self {
            Self::Coloured => std::mem::size_of::<VertexColoured>(),
            Self::Textured => std::mem::size_of::<VertexTextured>(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct VertexColoured {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub col: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct VertexTextured {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub col: u32,
    pub u: f32,
    pub v: f32,
}

impl VertexColoured {
    pub const fn new(x: f32, y: f32, z: f32, col: u32) -> Self {
        Self { x, y, z, col }
    }
}

impl VertexTextured {
    pub const fn new(x: f32, y: f32, z: f32, col: u32, u: f32, v: f32) -> Self {
        Self { x, y, z, col, u, v }
    }
}

/// Read access shared by both layouts, used by the draw path.
pub trait Vertex: Pod {
    fn position(&self) -> Vec3;
    fn col(&self) -> u32;
    fn uv(&self) -> Option<(f32, f32)>;
}

impl Vertex for VertexColoured {
    #[inline]
    fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
    #[inline]
    fn col(&self) -> u32 {
        self.col
    }
    #[inline]
    fn uv(&self) -> Option<(f32, f32)> {
        None
    }
}

impl Vertex for VertexTextured {
    #[inline]
    fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
    #[inline]
    fn col(&self) -> u32 {
        self.col
    }
    #[inline]
    fn uv(&self) -> Option<(f32, f32)> {
        Some((self.u, self.v))
    }
}

// ── Preprocessing ───────────────────────────────────────────────

/// Coloured vertices only go through alpha blending: halve alpha.
pub fn preprocess_coloured(vertices: &mut [VertexColoured]) {
    for v in vertices {
        v.col = halve_alpha(v.col);
    }
}

/// Textured vertices are also modulated with the texel (`(vc * tc) >> 7`),
/// so RGB is halved as well as alpha.
pub fn preprocess_textured(vertices: &mut [VertexTextured]) {
    for v in vertices {
        v.col = halve_alpha(halve_rgb(v.col));
    }
}

// ── Vertex buffers ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferId(pub u32);

#[derive(Debug, Clone)]
pub enum VertexData {
    Coloured(Vec<VertexColoured>),
    Textured(Vec<VertexTextured>),
}

impl VertexData {
    pub fn format(&self) -> VertexFormat {
        match self {
            Self::Coloured(_) => VertexFormat::Coloured,
            Self::Textured(_) => VertexFormat::Textured,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Coloured(v) => v.len(),
            Self::Textured(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fixed-format, fixed-capacity vertex storage owned by the backend.
#[derive(Debug)]
pub struct VertexBuffer {
    data: VertexData,
    halve_colours: bool,
}

fn try_alloc<T: Zeroable + Clone>(count: usize, stride: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(count)
        .map_err(|_| GfxError::AllocationFailure {
            what: ResourceKind::VertexBuffer,
            bytes: count.saturating_mul(stride),
        })?;
    v.resize(count, T::zeroed());
    Ok(v)
}

impl VertexBuffer {
    pub fn new(format: VertexFormat, count: usize) -> Result<Self> {
        let data = match format {
            VertexFormat::Coloured => VertexData::Coloured(try_alloc(count, format.stride())?),
            VertexFormat::Textured => VertexData::Textured(try_alloc(count, format.stride())?),
        };
        Ok(Self {
            data,
            halve_colours: true,
        })
    }

    /// Targets whose blend and modulate units use the full 0..255 range
    /// turn the colour halving off.
    pub fn set_halve_colours(&mut self, enabled: bool) {
        self.halve_colours = enabled;
    }

    pub fn format(&self) -> VertexFormat {
        self.data.format()
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &VertexData {
        &self.data
    }

    /// Open a write window over the first `count` vertices. The colour
    /// preprocessing for those vertices runs when the lock is released.
    pub fn lock(&mut self, count: usize) -> Result<VertexLock<'_>> {
        if count > self.capacity() {
            return Err(GfxError::InvalidArgument(format!(
                "lock of {} vertices exceeds buffer of {}",
                count,
                self.capacity()
            )));
        }
        Ok(VertexLock {
            buffer: self,
            count,
            released: false,
        })
    }
}

/// Mutable view of a locked region.
pub enum VertexRegion<'a> {
    Coloured(&'a mut [VertexColoured]),
    Textured(&'a mut [VertexTextured]),
}

/// Scoped lock over a vertex buffer. Dropping it is equivalent to
/// [`VertexLock::unlock`].
pub struct VertexLock<'a> {
    buffer: &'a mut VertexBuffer,
    count: usize,
    released: bool,
}

impl<'a> VertexLock<'a> {
    pub fn format(&self) -> VertexFormat {
        self.buffer.format()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn region(&mut self) -> VertexRegion<'_> {
        let n = self.count;
        match &mut self.buffer.data {
            VertexData::Coloured(v) => VertexRegion::Coloured(&mut v[..n]),
            VertexData::Textured(v) => VertexRegion::Textured(&mut v[..n]),
        }
    }

    pub fn coloured_mut(&mut self) -> Option<&mut [VertexColoured]> {
        match self.region() {
            VertexRegion::Coloured(v) => Some(v),
            VertexRegion::Textured(_) => None,
        }
    }

    pub fn textured_mut(&mut self) -> Option<&mut [VertexTextured]> {
        match self.region() {
            VertexRegion::Textured(v) => Some(v),
            VertexRegion::Coloured(_) => None,
        }
    }

    /// Raw byte view of the locked region, `count * stride` bytes long.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        match self.region() {
            VertexRegion::Coloured(v) => bytemuck::cast_slice_mut(v),
            VertexRegion::Textured(v) => bytemuck::cast_slice_mut(v),
        }
    }

    pub fn unlock(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if !self.buffer.halve_colours {
            return;
        }
        let n = self.count;
        match &mut self.buffer.data {
            VertexData::Coloured(v) => preprocess_coloured(&mut v[..n]),
            VertexData::Textured(v) => preprocess_textured(&mut v[..n]),
        }
    }
}

impl Drop for VertexLock<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Owner of every vertex buffer created through the backend.
#[derive(Debug)]
pub struct VertexBufferPool {
    buffers: HashMap<u32, VertexBuffer>,
    next_id: u32,
    halve_colours: bool,
}

impl VertexBufferPool {
    pub fn new() -> Self {
        Self {
            buffers: HashMap::new(),
            next_id: 1,
            halve_colours: true,
        }
    }

    /// Buffers created afterwards skip colour halving when `enabled` is false.
    pub fn with_halved_colours(mut self, enabled: bool) -> Self {
        self.halve_colours = enabled;
        self
    }

    pub fn create(&mut self, format: VertexFormat, count: usize) -> Result<VertexBufferId> {
        let mut buffer = VertexBuffer::new(format, count)?;
        buffer.set_halve_colours(self.halve_colours);
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.buffers.insert(id, buffer);
        debug!("Created {:?} vertex buffer {} ({} vertices)", format, id, count);
        Ok(VertexBufferId(id))
    }

    pub fn get(&self, id: VertexBufferId) -> Result<&VertexBuffer> {
        self.buffers.get(&id.0).ok_or(GfxError::InvalidHandle {
            kind: ResourceKind::VertexBuffer,
            id: id.0,
        })
    }

    pub fn get_mut(&mut self, id: VertexBufferId) -> Result<&mut VertexBuffer> {
        self.buffers.get_mut(&id.0).ok_or(GfxError::InvalidHandle {
            kind: ResourceKind::VertexBuffer,
            id: id.0,
        })
    }

    pub fn delete(&mut self, id: VertexBufferId) -> bool {
        self.buffers.remove(&id.0).is_some()
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl Default for VertexBufferPool {
    fn default() -> Self {
        Self::new()
    }
}
