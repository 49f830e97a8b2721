//! Graphics Synthesizer command generation.
//!
//! Every segment is one DMA chain of GIF packets. The chain opens with a DMA
//! tag qword that is left blank until the segment is closed and its length is
//! known. Register writes go through PACKED A+D tags; geometry goes through
//! REGLIST tags, one per batch.

use super::regs::*;
use crate::graphics::clip::Viewport;
use crate::graphics::command::{CommandBuffer, HeaderSlot, Overflow};
use crate::graphics::state::{ColorMask, Rect, RenderState};
use crate::graphics::target::{HardwareTarget, TextureSlot, VertexPayload};
use crate::graphics::vertex::VertexFormat;
use crate::hardware::{DepthBuffer, DisplaySurface, PixelFormat};
use crate::texture::Texture;

/// Half of the 4096x4096 primitive coordinate space.
pub const GS_GUARD_BAND: f32 = 2048.0;
/// Texture slot rows are never narrower than this.
pub const GS_MIN_TEXTURE_ROW: u32 = 256;
/// Alpha test reference. Vertex alpha is pre-halved, so 0x40 is the midpoint.
pub const GS_ALPHA_REF: u64 = 0x40;
/// Clears are drawn as sprites of this width.
const CLEAR_STRIP_WIDTH: i32 = 64;
/// Depth range maps [-1, 1] onto [0, 2^32).
const DEPTH_SCALE: f32 = 2_147_483_648.0;

const DMA_TAG_SLOT: HeaderSlot = HeaderSlot { offset: 0, dwords: 2 };

#[derive(Debug, Clone, Copy, Default)]
pub struct GsTarget;

impl GsTarget {
    pub fn new() -> Self {
        Self
    }
}

/// Dwords needed by `write_registers` for `count` writes, worst case.
const fn registers_dwords(count: usize) -> usize {
    1 + 2 + count * 2
}

/// One PACKED A+D GIF tag carrying `writes` as (register, value) pairs.
fn write_registers(cmd: &mut CommandBuffer, writes: &[(u64, u64)]) -> Result<(), Overflow> {
    let needed = registers_dwords(writes.len());
    if needed > cmd.remaining_dwords() {
        return Err(Overflow {
            needed,
            available: cmd.remaining_dwords(),
        });
    }
    cmd.push_qword(
        gif_tag(writes.len() as u64, false, false, 0, GIF_FLG_PACKED, 1),
        GIF_REG_AD,
    )?;
    for &(reg, value) in writes {
        cmd.push_qword(value, reg)?;
    }
    Ok(())
}

/// Close a DMA tag reserved at `slot` so it covers everything written since.
fn close_tag(cmd: &mut CommandBuffer, slot: HeaderSlot, id: u64) -> Result<(), Overflow> {
    cmd.align_qword()?;
    let qwc = (cmd.cursor() - slot.offset - slot.dwords) / 2;
    cmd.patch(slot, &[dma_tag(qwc as u64, 0, id, false, 0, false), 0]);
    Ok(())
}

fn frame_register(surface: &DisplaySurface, mask: u32) -> u64 {
    gs_frame(
        (surface.address / 2048) as u64,
        (surface.width / 64) as u64,
        surface.psm as u64,
        mask as u64,
    )
}

fn zbuf_register(zbuf: &DepthBuffer) -> u64 {
    gs_zbuf((zbuf.address / 2048) as u64, zbuf.psm as u64, zbuf.mask)
}

fn primitive_offset(surface: &DisplaySurface) -> (i32, i32) {
    (
        ftoi4(2048 - surface.width as i32 / 2),
        ftoi4(2048 - surface.height as i32 / 2),
    )
}

/// Bits set for every channel the mask disables.
pub fn frame_mask(mask: ColorMask) -> u32 {
    let mut bits = 0;
    if !mask.r {
        bits |= 0x0000_00FF;
    }
    if !mask.g {
        bits |= 0x0000_FF00;
    }
    if !mask.b {
        bits |= 0x00FF_0000;
    }
    if !mask.a {
        bits |= 0xFF00_0000;
    }
    bits
}

/// Screen-relative vertex to 12.4 fixed-point XYZ2.
///
/// The origin comes from the viewport's own x/y: `2048 - x/2` on X and its
/// negation on Y, both in sub-pixel units and wrapped to 16 bits, so the
/// Y flip lands back inside the primitive space.
pub fn finish_vertex(viewport: &Viewport, x: f32, y: f32, z: f32) -> (u16, u16, u32) {
    let origin_x = ftoi4(2048 - viewport.x / 2);
    let origin_y = -ftoi4(2048 - viewport.y / 2);
    let sx = (x * 16.0 + origin_x as f32) as i32 as u16;
    let sy = (y * -16.0 + origin_y as f32) as i32 as u16;
    let sz = ((z + 1.0) * DEPTH_SCALE) as u32;
    (sx, sy, sz)
}

impl HardwareTarget for GsTarget {
    fn name(&self) -> &'static str {
        "GS"
    }

    fn guard_band_extent(&self) -> f32 {
        GS_GUARD_BAND
    }

    fn texture_row_width(&self, width: u32) -> u32 {
        // TBW and DBW count in units of 64 pixels.
        width.max(GS_MIN_TEXTURE_ROW).div_ceil(64) * 64
    }

    fn texture_footprint_words(&self, width: u32, height: u32) -> u32 {
        self.texture_row_width(width) * height
    }

    fn halves_vertex_colours(&self) -> bool {
        true
    }

    // ── segment framing ─────────────────────────────────────────

    fn begin_segment(&mut self, cmd: &mut CommandBuffer) -> Result<(), Overflow> {
        debug_assert!(cmd.is_empty());
        cmd.reserve(DMA_TAG_SLOT.dwords)?;
        Ok(())
    }

    fn terminate(&mut self, cmd: &mut CommandBuffer) -> Result<(), Overflow> {
        close_tag(cmd, DMA_TAG_SLOT, DMA_TAG_ID_END)
    }

    fn terminate_dwords(&self) -> usize {
        1
    }

    // ── primitives ──────────────────────────────────────────────

    fn header_dwords(&self) -> usize {
        2
    }

    fn vertex_dwords(&self, format: VertexFormat) -> usize {
        match format {
            VertexFormat::Coloured => 2,
            VertexFormat::Textured => 3,
        }
    }

    fn max_header_vertices(&self) -> usize {
        GIF_MAX_NLOOP as usize
    }

    fn batch_padding_dwords(&self) -> usize {
        1
    }

    fn emit_vertex(
        &mut self,
        cmd: &mut CommandBuffer,
        viewport: &Viewport,
        vertex: &VertexPayload,
        _last_of_triangle: bool,
    ) -> Result<(), Overflow> {
        let p = vertex.pos;
        let q = p.inv_w;
        let (x, y, z) = finish_vertex(viewport, p.x, p.y, p.z);
        let rgbaq = gs_rgbaq(vertex.col, q);
        let xyz = gs_xyz(x, y, z);
        match vertex.uv {
            Some((u, v)) => cmd.extend(&[rgbaq, gs_st(u * q, v * q), xyz]),
            None => cmd.extend(&[rgbaq, xyz]),
        }
    }

    fn patch_header(
        &mut self,
        cmd: &mut CommandBuffer,
        slot: HeaderSlot,
        vertices: usize,
        state: &RenderState,
    ) -> Result<(), Overflow> {
        let (nreg, regs) = match state.format {
            VertexFormat::Coloured => (2, DRAW_RGBAQ_REGLIST),
            VertexFormat::Textured => (3, DRAW_STQ_REGLIST),
        };
        // Three registers times an odd vertex count leaves half a qword.
        cmd.align_qword()?;
        cmd.patch(
            slot,
            &[
                gif_tag(vertices as u64, true, false, 0, GIF_FLG_REGLIST, nreg),
                regs,
            ],
        );
        Ok(())
    }

    // ── register groups ─────────────────────────────────────────

    fn apply_test_state(
        &mut self,
        cmd: &mut CommandBuffer,
        state: &RenderState,
    ) -> Result<(), Overflow> {
        let atst = if state.alpha_test {
            ATEST_METHOD_GREATER_EQUAL
        } else {
            ATEST_METHOD_ALLPASS
        };
        let ztst = if state.depth_test {
            ZTEST_METHOD_GREATER_EQUAL
        } else {
            ZTEST_METHOD_ALLPASS
        };
        let test = gs_test(true, atst, GS_ALPHA_REF, ATEST_KEEP_ALL, false, false, true, ztst);
        write_registers(cmd, &[(GS_REG_TEST_1, test)])
    }

    fn apply_format_state(
        &mut self,
        cmd: &mut CommandBuffer,
        state: &RenderState,
    ) -> Result<(), Overflow> {
        let textured = state.format == VertexFormat::Textured;
        let prim = gs_prim(
            PRIM_TRIANGLE,
            PRIM_SHADE_GOURAUD,
            textured,
            false,
            state.blend,
            false,
            PRIM_MAP_ST,
            0,
            PRIM_UNFIXED,
        );
        write_registers(cmd, &[(GS_REG_PRIM, prim)])
    }

    // ── immediate writes ────────────────────────────────────────

    fn write_clear(
        &mut self,
        cmd: &mut CommandBuffer,
        surface: &DisplaySurface,
        color: u32,
    ) -> Result<(), Overflow> {
        let no_tests = gs_test(
            false,
            ATEST_METHOD_ALLPASS,
            0,
            ATEST_KEEP_ALL,
            false,
            false,
            true,
            ZTEST_METHOD_ALLPASS,
        );
        write_registers(cmd, &[(GS_REG_TEST_1, no_tests)])?;

        let (x0, y0) = (
            2048 - surface.width as i32 / 2,
            2048 - surface.height as i32 / 2,
        );
        let (x_end, y_end) = (x0 + surface.width as i32, y0 + surface.height as i32);
        let rgbaq = gs_rgbaq((color & 0x00FF_FFFF) | 0x80 << 24, 1.0);

        let mut writes = vec![
            (
                GS_REG_PRIM,
                gs_prim(PRIM_SPRITE, 0, false, false, false, false, PRIM_MAP_ST, 0, PRIM_UNFIXED),
            ),
            (GS_REG_RGBAQ, rgbaq),
        ];
        let mut x = x0;
        while x < x_end {
            let right = (x + CLEAR_STRIP_WIDTH).min(x_end);
            writes.push((GS_REG_XYZ2, gs_xyz(ftoi4(x) as u16, ftoi4(y0) as u16, 0)));
            writes.push((GS_REG_XYZ2, gs_xyz(ftoi4(right) as u16, ftoi4(y_end) as u16, 0)));
            x = right;
        }
        write_registers(cmd, &writes)
    }

    fn write_depth_write(
        &mut self,
        cmd: &mut CommandBuffer,
        zbuf: &DepthBuffer,
    ) -> Result<(), Overflow> {
        write_registers(cmd, &[(GS_REG_ZBUF_1, zbuf_register(zbuf))])
    }

    fn write_color_mask(
        &mut self,
        cmd: &mut CommandBuffer,
        surface: &DisplaySurface,
        mask: ColorMask,
    ) -> Result<(), Overflow> {
        write_registers(
            cmd,
            &[(GS_REG_FRAME_1, frame_register(surface, frame_mask(mask)))],
        )
    }

    fn write_scissor(&mut self, cmd: &mut CommandBuffer, rect: Rect) -> Result<(), Overflow> {
        let scissor = gs_scissor(
            rect.x as u64,
            (rect.x + rect.width - 1) as u64,
            rect.y as u64,
            (rect.y + rect.height - 1) as u64,
        );
        write_registers(cmd, &[(GS_REG_SCISSOR_1, scissor)])
    }

    fn write_frame_end(
        &mut self,
        cmd: &mut CommandBuffer,
        next: &DisplaySurface,
    ) -> Result<(), Overflow> {
        write_registers(
            cmd,
            &[
                (GS_REG_FRAME_1, frame_register(next, next.mask)),
                (GS_REG_FINISH, 1),
            ],
        )
    }

    // ── one-off packets ─────────────────────────────────────────

    fn build_environment(
        &mut self,
        cmd: &mut CommandBuffer,
        surface: &DisplaySurface,
        zbuf: &DepthBuffer,
    ) -> Result<(), Overflow> {
        self.begin_segment(cmd)?;
        let (ofx, ofy) = primitive_offset(surface);
        let no_tests = gs_test(
            false,
            ATEST_METHOD_ALLPASS,
            0,
            ATEST_KEEP_ALL,
            false,
            false,
            true,
            ZTEST_METHOD_ALLPASS,
        );
        // (Cs - Cd) * As >> 7 + Cd
        let alpha = gs_alpha(
            BLEND_COLOR_SOURCE,
            BLEND_COLOR_DEST,
            BLEND_ALPHA_SOURCE,
            BLEND_COLOR_DEST,
            0x80,
        );
        write_registers(
            cmd,
            &[
                (GS_REG_FRAME_1, frame_register(surface, surface.mask)),
                (GS_REG_ZBUF_1, zbuf_register(zbuf)),
                (GS_REG_XYOFFSET_1, gs_xyoffset(ofx as u64, ofy as u64)),
                (
                    GS_REG_SCISSOR_1,
                    gs_scissor(0, surface.width as u64 - 1, 0, surface.height as u64 - 1),
                ),
                (GS_REG_PRMODECONT, 1),
                (GS_REG_COLCLAMP, 1),
                (GS_REG_DTHE, 0),
                (GS_REG_TEST_1, no_tests),
                (GS_REG_CLAMP_1, gs_clamp(WRAP_REPEAT, WRAP_REPEAT, 0, 0, 0, 0)),
                (
                    GS_REG_TEX1_1,
                    gs_tex1(LOD_USE_K, 0, LOD_MAG_NEAREST, LOD_MIN_NEAREST, 0, 0, 0),
                ),
                (GS_REG_ALPHA_1, alpha),
                (GS_REG_FINISH, 1),
            ],
        )?;
        self.terminate(cmd)
    }

    fn texture_transfer_dwords(&self, texture: &Texture) -> usize {
        let data_qwords = texture.pixels().len().div_ceil(4);
        let chunks = data_qwords.div_ceil(GIF_MAX_NLOOP as usize).max(1);
        // setup tag + A+D(4), per chunk tag + GIF tag, flush tag + A+D(1)
        2 + registers_dwords(4) + chunks * 4 + data_qwords * 2 + 2 + registers_dwords(1)
    }

    fn build_texture_transfer(
        &mut self,
        cmd: &mut CommandBuffer,
        texture: &Texture,
        slot: TextureSlot,
    ) -> Result<(), Overflow> {
        let needed = self.texture_transfer_dwords(texture);
        if needed > cmd.remaining_dwords() {
            return Err(Overflow {
                needed,
                available: cmd.remaining_dwords(),
            });
        }

        let mut tag = cmd.reserve(2)?;
        write_registers(
            cmd,
            &[
                (
                    GS_REG_BITBLTBUF,
                    gs_bitbltbuf(
                        0,
                        0,
                        0,
                        (slot.address / 64) as u64,
                        (slot.row_width / 64) as u64,
                        PixelFormat::Psm32 as u64,
                    ),
                ),
                (GS_REG_TRXPOS, gs_trxpos(0, 0, 0, 0, 0)),
                (
                    GS_REG_TRXREG,
                    gs_trxreg(texture.width() as u64, texture.height() as u64),
                ),
                (GS_REG_TRXDIR, TRXDIR_HOST_TO_LOCAL),
            ],
        )?;

        // Two texels per dword, four per qword.
        let texels = texture.pixels();
        let per_chunk = GIF_MAX_NLOOP as usize * 4;
        let chunk_count = texels.len().div_ceil(per_chunk);
        for (i, chunk) in texels.chunks(per_chunk).enumerate() {
            close_tag(cmd, tag, DMA_TAG_ID_CNT)?;
            tag = cmd.reserve(2)?;
            let qwords = chunk.len().div_ceil(4);
            let last = i + 1 == chunk_count;
            cmd.push_qword(gif_tag(qwords as u64, last, false, 0, GIF_FLG_IMAGE, 0), 0)?;
            for pair in chunk.chunks(2) {
                let lo = pair[0] as u64;
                let hi = pair.get(1).copied().unwrap_or(0) as u64;
                cmd.push(lo | hi << 32)?;
            }
            cmd.align_qword()?;
        }

        close_tag(cmd, tag, DMA_TAG_ID_CNT)?;
        tag = cmd.reserve(2)?;
        write_registers(cmd, &[(GS_REG_TEXFLUSH, 0)])?;
        close_tag(cmd, tag, DMA_TAG_ID_END)
    }

    fn write_texture_binding(
        &mut self,
        cmd: &mut CommandBuffer,
        texture: &Texture,
        slot: TextureSlot,
    ) -> Result<(), Overflow> {
        let tex0 = gs_tex0(
            (slot.address / 64) as u64,
            (slot.row_width / 64) as u64,
            PixelFormat::Psm32 as u64,
            texture.log2_width() as u64,
            texture.log2_height() as u64,
            TEXTURE_COMPONENTS_RGBA,
            TEXTURE_FUNCTION_MODULATE,
            0,
            0,
            CLUT_STORAGE_MODE1,
            0,
            CLUT_NO_LOAD,
        );
        write_registers(cmd, &[(GS_REG_TEX0_1, tex0)])
    }
}
