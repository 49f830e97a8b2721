//! Capability interface between the shared pipeline and one GPU.
//!
//! Transform, guard-band clipping, batching, dirty tracking, double
//! buffering and texture residency are hardware independent and live in
//! the backend. Everything that knows a register layout or packet format
//! goes through this trait.

use crate::graphics::clip::{Projected, Viewport};
use crate::graphics::command::{CommandBuffer, HeaderSlot, Overflow};
use crate::graphics::state::{ColorMask, Rect, RenderState};
use crate::graphics::vertex::VertexFormat;
use crate::hardware::{DepthBuffer, DisplaySurface};
use crate::texture::Texture;

/// One vertex of a triangle that passed the guard-band test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexPayload {
    /// Preprocessed packed colour.
    pub col: u32,
    pub uv: Option<(f32, f32)>,
    pub pos: Projected,
}

/// Where the bound texture sits in GPU memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureSlot {
    /// Base address in 32-bit words.
    pub address: u32,
    /// Row width the texture was transferred with, in pixels.
    pub row_width: u32,
}

pub trait HardwareTarget {
    fn name(&self) -> &'static str;

    /// Half size, in pixels, of the region the rasterizer can address.
    fn guard_band_extent(&self) -> f32;

    /// Row width the texture slot uses for a texture `width` pixels wide.
    fn texture_row_width(&self, width: u32) -> u32;

    /// Words of GPU memory a `width`x`height` texture occupies once uploaded.
    fn texture_footprint_words(&self, width: u32, height: u32) -> u32;

    /// Whether vertex colours are stored at half intensity because the
    /// blend and modulate units treat 0x80 as 1.0.
    fn halves_vertex_colours(&self) -> bool;

    // ── segment framing ─────────────────────────────────────────

    /// Reserve whatever chain header a fresh segment starts with.
    fn begin_segment(&mut self, cmd: &mut CommandBuffer) -> Result<(), Overflow>;

    /// Pad and close the segment so the transfer engine knows where it ends.
    fn terminate(&mut self, cmd: &mut CommandBuffer) -> Result<(), Overflow>;

    /// Dwords `terminate` may still append.
    fn terminate_dwords(&self) -> usize;

    // ── primitives ──────────────────────────────────────────────

    fn header_dwords(&self) -> usize;

    fn vertex_dwords(&self, format: VertexFormat) -> usize;

    /// Most vertices one primitive header can cover.
    fn max_header_vertices(&self) -> usize;

    /// Dwords of padding the header patch may append after a batch.
    fn batch_padding_dwords(&self) -> usize;

    fn emit_vertex(
        &mut self,
        cmd: &mut CommandBuffer,
        viewport: &Viewport,
        vertex: &VertexPayload,
        last_of_triangle: bool,
    ) -> Result<(), Overflow>;

    /// Fill in the reserved header once the batch's vertex count is known,
    /// padding the batch to the hardware's granularity first.
    fn patch_header(
        &mut self,
        cmd: &mut CommandBuffer,
        slot: HeaderSlot,
        vertices: usize,
        state: &RenderState,
    ) -> Result<(), Overflow>;

    // ── register groups ─────────────────────────────────────────

    /// Test/compare group.
    fn apply_test_state(
        &mut self,
        cmd: &mut CommandBuffer,
        state: &RenderState,
    ) -> Result<(), Overflow>;

    /// Primitive format/blend group.
    fn apply_format_state(
        &mut self,
        cmd: &mut CommandBuffer,
        state: &RenderState,
    ) -> Result<(), Overflow>;

    // ── immediate writes ────────────────────────────────────────

    fn write_clear(
        &mut self,
        cmd: &mut CommandBuffer,
        surface: &DisplaySurface,
        color: u32,
    ) -> Result<(), Overflow>;

    fn write_depth_write(
        &mut self,
        cmd: &mut CommandBuffer,
        zbuf: &DepthBuffer,
    ) -> Result<(), Overflow>;

    fn write_color_mask(
        &mut self,
        cmd: &mut CommandBuffer,
        surface: &DisplaySurface,
        mask: ColorMask,
    ) -> Result<(), Overflow>;

    fn write_scissor(&mut self, cmd: &mut CommandBuffer, rect: Rect) -> Result<(), Overflow>;

    /// Retarget rendering at `next` and signal end of frame.
    fn write_frame_end(
        &mut self,
        cmd: &mut CommandBuffer,
        next: &DisplaySurface,
    ) -> Result<(), Overflow>;

    // ── one-off packets ─────────────────────────────────────────

    /// Complete chain that puts the drawing environment in its start state.
    fn build_environment(
        &mut self,
        cmd: &mut CommandBuffer,
        surface: &DisplaySurface,
        zbuf: &DepthBuffer,
    ) -> Result<(), Overflow>;

    /// Dwords `build_texture_transfer` needs for `texture`.
    fn texture_transfer_dwords(&self, texture: &Texture) -> usize;

    /// Complete chain that copies `texture` into the texture slot.
    fn build_texture_transfer(
        &mut self,
        cmd: &mut CommandBuffer,
        texture: &Texture,
        slot: TextureSlot,
    ) -> Result<(), Overflow>;

    /// Point the texture unit at the freshly transferred texture.
    fn write_texture_binding(
        &mut self,
        cmd: &mut CommandBuffer,
        texture: &Texture,
        slot: TextureSlot,
    ) -> Result<(), Overflow>;
}
