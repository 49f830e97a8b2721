//! PowerVR tile accelerator command generation.
//!
//! Render state is not held in registers here: every polygon header carries
//! the full depth, culling, blending and texture configuration, so the
//! register-group writes are empty and the header is built from the state
//! snapshot when the batch is closed. Vertices are 32-byte records in screen
//! space, each triangle its own three-vertex strip.

use super::regs::*;
use crate::graphics::clip::Viewport;
use crate::graphics::command::{CommandBuffer, HeaderSlot, Overflow};
use crate::graphics::state::{ColorMask, Rect, RenderState};
use crate::graphics::target::{HardwareTarget, TextureSlot, VertexPayload};
use crate::graphics::vertex::VertexFormat;
use crate::hardware::{DepthBuffer, DisplaySurface};
use crate::texture::Texture;
use log::debug;

/// Half extent accepted without clipping.
pub const PVR_GUARD_BAND: f32 = 1024.0;
/// Dwords in every TA record.
pub const PVR_RECORD_DWORDS: usize = 4;
/// Clip rectangles snap to tiles of this size.
pub const PVR_TILE_SIZE: i32 = 32;
/// Depth of the clear quad, behind anything with a sane `1/w`.
const CLEAR_DEPTH: f32 = 0.0001;

/// Texture fields the next polygon headers need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BoundTexture {
    usize_flag: u32,
    vsize_flag: u32,
    address_bytes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolyHeader {
    pub cmd: u32,
    pub mode1: u32,
    pub mode2: u32,
    pub mode3: u32,
}

impl PolyHeader {
    pub fn words(&self) -> [u64; PVR_RECORD_DWORDS] {
        [
            pack2(self.cmd, self.mode1),
            pack2(self.mode2, self.mode3),
            pack2(0xFFFF_FFFF, 0xFFFF_FFFF),
            pack2(0xFFFF_FFFF, 0xFFFF_FFFF),
        ]
    }

    pub fn list_type(&self) -> u32 {
        (self.cmd & PVR_TA_CMD_TYPE_MASK) >> PVR_TA_CMD_TYPE_SHIFT
    }
}

/// Blending wins over alpha testing when choosing the list.
pub fn list_for(state: &RenderState) -> u32 {
    if state.blend {
        PVR_LIST_TR_POLY
    } else if state.alpha_test {
        PVR_LIST_PT_POLY
    } else {
        PVR_LIST_OP_POLY
    }
}

#[derive(Debug, Clone)]
pub struct PvrTarget {
    width: u32,
    height: u32,
    texture: Option<BoundTexture>,
    clip_inside: bool,
}

impl PvrTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            texture: None,
            clip_inside: false,
        }
    }

    pub fn header(&self, state: &RenderState) -> PolyHeader {
        let list = list_for(state);
        let mut depth_cmp = if state.depth_test {
            PVR_DEPTHCMP_GEQUAL
        } else {
            PVR_DEPTHCMP_ALWAYS
        };
        let culling = if state.face_culling {
            PVR_CULLING_CW
        } else {
            PVR_CULLING_SMALL
        };
        let depth_write = if state.depth_write {
            PVR_DEPTHWRITE_ENABLE
        } else {
            PVR_DEPTHWRITE_DISABLE
        };
        let clip = if self.clip_inside {
            PVR_USERCLIP_INSIDE
        } else {
            PVR_USERCLIP_DISABLE
        };
        let translucent = state.blend || state.alpha_test;
        let alpha = if translucent {
            PVR_ALPHA_ENABLE
        } else {
            PVR_ALPHA_DISABLE
        };

        let (src, dst) = match list {
            PVR_LIST_OP_POLY => (PVR_BLEND_ONE, PVR_BLEND_ZERO),
            PVR_LIST_PT_POLY => {
                depth_cmp = PVR_DEPTHCMP_LEQUAL;
                (PVR_BLEND_SRCALPHA, PVR_BLEND_INVSRCALPHA)
            }
            _ => (PVR_BLEND_SRCALPHA, PVR_BLEND_INVSRCALPHA),
        };

        // The default white texture is skipped entirely.
        let texture = match (state.format, state.texturing, self.texture) {
            (VertexFormat::Textured, true, Some(tex)) => Some(tex),
            _ => None,
        };
        let txr_enable = if texture.is_some() {
            PVR_TEXTURE_ENABLE
        } else {
            PVR_TEXTURE_DISABLE
        };

        let mut cmd = PVR_CMD_POLYHDR | txr_enable << 3 | PVR_TA_CMD_STRIP6;
        cmd |= (list << PVR_TA_CMD_TYPE_SHIFT) & PVR_TA_CMD_TYPE_MASK;
        cmd |= (PVR_CLRFMT_ARGBPACKED << PVR_TA_CMD_CLRFMT_SHIFT) & PVR_TA_CMD_CLRFMT_MASK;
        cmd |= (PVR_SHADE_GOURAUD << PVR_TA_CMD_SHADE_SHIFT) & PVR_TA_CMD_SHADE_MASK;
        cmd |= (PVR_UVFMT_32BIT << PVR_TA_CMD_UVFMT_SHIFT) & PVR_TA_CMD_UVFMT_MASK;
        cmd |= (clip << PVR_TA_CMD_USERCLIP_SHIFT) & PVR_TA_CMD_USERCLIP_MASK;

        let mut mode1 = (depth_cmp << PVR_TA_PM1_DEPTHCMP_SHIFT) & PVR_TA_PM1_DEPTHCMP_MASK;
        mode1 |= (culling << PVR_TA_PM1_CULLING_SHIFT) & PVR_TA_PM1_CULLING_MASK;
        mode1 |= (depth_write << PVR_TA_PM1_DEPTHWRITE_SHIFT) & PVR_TA_PM1_DEPTHWRITE_MASK;
        mode1 |= (txr_enable << PVR_TA_PM1_TXRENABLE_SHIFT) & PVR_TA_PM1_TXRENABLE_MASK;

        let mut mode2 = (src << PVR_TA_PM2_SRCBLEND_SHIFT) & PVR_TA_PM2_SRCBLEND_MASK;
        mode2 |= (dst << PVR_TA_PM2_DSTBLEND_SHIFT) & PVR_TA_PM2_DSTBLEND_MASK;
        mode2 |= (PVR_FOG_DISABLE << PVR_TA_PM2_FOG_SHIFT) & PVR_TA_PM2_FOG_MASK;
        mode2 |= (PVR_CLRCLAMP_DISABLE << PVR_TA_PM2_CLAMP_SHIFT) & PVR_TA_PM2_CLAMP_MASK;
        mode2 |= (alpha << PVR_TA_PM2_ALPHA_SHIFT) & PVR_TA_PM2_ALPHA_MASK;

        let mut mode3 = 0;
        if let Some(tex) = texture {
            let txr_alpha = if translucent {
                PVR_TXRALPHA_ENABLE
            } else {
                PVR_TXRALPHA_DISABLE
            };
            mode2 |= (txr_alpha << PVR_TA_PM2_TXRALPHA_SHIFT) & PVR_TA_PM2_TXRALPHA_MASK;
            mode2 |= (PVR_FILTER_NEAREST << PVR_TA_PM2_FILTER_SHIFT) & PVR_TA_PM2_FILTER_MASK;
            mode2 |= (PVR_TXRENV_MODULATEALPHA << PVR_TA_PM2_TXRENV_SHIFT) & PVR_TA_PM2_TXRENV_MASK;
            mode2 |= (tex.usize_flag << PVR_TA_PM2_USIZE_SHIFT) & PVR_TA_PM2_USIZE_MASK;
            mode2 |= (tex.vsize_flag << PVR_TA_PM2_VSIZE_SHIFT) & PVR_TA_PM2_VSIZE_MASK;
            mode3 = PVR_TXRFMT_ARGB4444
                | PVR_TXRFMT_NONTWIDDLED
                | (tex.address_bytes & 0x00FF_FFF8) >> 3;
        }

        PolyHeader {
            cmd,
            mode1,
            mode2,
            mode3,
        }
    }

    /// Map a pixel rectangle onto inclusive tile bounds.
    pub fn clip_tiles(&self, rect: Rect) -> [u32; 4] {
        let vw = self.width as i32 / PVR_TILE_SIZE;
        let vh = self.height as i32 / PVR_TILE_SIZE;
        let w = rect.width.clamp(0, self.width as i32);
        let h = rect.height.clamp(0, self.height as i32);
        let (sx, sy) = (rect.x, rect.y);
        let (ex, ey) = (sx + w, sy + h);
        [
            (sx / PVR_TILE_SIZE).clamp(0, vw) as u32,
            (sy / PVR_TILE_SIZE).clamp(0, vh) as u32,
            (ex / PVR_TILE_SIZE - 1).clamp(0, vw) as u32,
            (ey / PVR_TILE_SIZE - 1).clamp(0, vh) as u32,
        ]
    }

    fn upload_size(texture: &Texture) -> (u32, u32) {
        (
            texture.width().next_power_of_two().max(8),
            texture.height().next_power_of_two().max(8),
        )
    }
}

fn vertex_record(flags: u32, x: f32, y: f32, z: f32, u: f32, v: f32, argb: u32) -> [u64; 4] {
    [
        pack2(flags, x.to_bits()),
        pack2(y.to_bits(), z.to_bits()),
        pack2(u.to_bits(), v.to_bits()),
        pack2(argb, 0),
    ]
}

impl HardwareTarget for PvrTarget {
    fn name(&self) -> &'static str {
        "PVR"
    }

    fn guard_band_extent(&self) -> f32 {
        PVR_GUARD_BAND
    }

    fn texture_row_width(&self, width: u32) -> u32 {
        width.next_power_of_two().max(8)
    }

    fn texture_footprint_words(&self, width: u32, height: u32) -> u32 {
        // 16 bits per texel
        let w = width.next_power_of_two().max(8);
        let h = height.next_power_of_two().max(8);
        w * h / 2
    }

    fn halves_vertex_colours(&self) -> bool {
        false
    }

    // ── segment framing ─────────────────────────────────────────

    fn begin_segment(&mut self, _cmd: &mut CommandBuffer) -> Result<(), Overflow> {
        Ok(())
    }

    fn terminate(&mut self, cmd: &mut CommandBuffer) -> Result<(), Overflow> {
        cmd.extend(&[PVR_CMD_EOL as u64; PVR_RECORD_DWORDS])
    }

    fn terminate_dwords(&self) -> usize {
        PVR_RECORD_DWORDS
    }

    // ── primitives ──────────────────────────────────────────────

    fn header_dwords(&self) -> usize {
        PVR_RECORD_DWORDS
    }

    fn vertex_dwords(&self, _format: VertexFormat) -> usize {
        PVR_RECORD_DWORDS
    }

    fn max_header_vertices(&self) -> usize {
        usize::MAX
    }

    fn batch_padding_dwords(&self) -> usize {
        0
    }

    fn emit_vertex(
        &mut self,
        cmd: &mut CommandBuffer,
        viewport: &Viewport,
        vertex: &VertexPayload,
        last_of_triangle: bool,
    ) -> Result<(), Overflow> {
        let p = vertex.pos;
        let flags = if last_of_triangle {
            PVR_CMD_VERTEX_EOL
        } else {
            PVR_CMD_VERTEX
        };
        let x = viewport.x as f32 + viewport.hwidth + p.x;
        let y = viewport.y as f32 + viewport.hheight - p.y;
        let (u, v) = vertex.uv.unwrap_or((0.0, 0.0));
        cmd.extend(&vertex_record(flags, x, y, p.inv_w, u, v, to_argb(vertex.col)))
    }

    fn patch_header(
        &mut self,
        cmd: &mut CommandBuffer,
        slot: HeaderSlot,
        _vertices: usize,
        state: &RenderState,
    ) -> Result<(), Overflow> {
        cmd.patch(slot, &self.header(state).words());
        Ok(())
    }

    // ── register groups ─────────────────────────────────────────

    fn apply_test_state(
        &mut self,
        _cmd: &mut CommandBuffer,
        _state: &RenderState,
    ) -> Result<(), Overflow> {
        Ok(())
    }

    fn apply_format_state(
        &mut self,
        _cmd: &mut CommandBuffer,
        _state: &RenderState,
    ) -> Result<(), Overflow> {
        Ok(())
    }

    // ── immediate writes ────────────────────────────────────────

    fn write_clear(
        &mut self,
        cmd: &mut CommandBuffer,
        surface: &DisplaySurface,
        color: u32,
    ) -> Result<(), Overflow> {
        let needed = PVR_RECORD_DWORDS * 5;
        if needed > cmd.remaining_dwords() {
            return Err(Overflow {
                needed,
                available: cmd.remaining_dwords(),
            });
        }
        let state = RenderState {
            depth_write: true,
            ..RenderState::default()
        };
        cmd.extend(&self.header(&state).words())?;
        let argb = to_argb(color) | 0xFF00_0000;
        let (w, h) = (surface.width as f32, surface.height as f32);
        let corners = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)];
        for (i, (x, y)) in corners.into_iter().enumerate() {
            let flags = if i == 3 {
                PVR_CMD_VERTEX_EOL
            } else {
                PVR_CMD_VERTEX
            };
            cmd.extend(&vertex_record(flags, x, y, CLEAR_DEPTH, 0.0, 0.0, argb))?;
        }
        Ok(())
    }

    fn write_depth_write(
        &mut self,
        _cmd: &mut CommandBuffer,
        _zbuf: &DepthBuffer,
    ) -> Result<(), Overflow> {
        // Carried by the next polygon header.
        Ok(())
    }

    fn write_color_mask(
        &mut self,
        _cmd: &mut CommandBuffer,
        _surface: &DisplaySurface,
        mask: ColorMask,
    ) -> Result<(), Overflow> {
        if mask != ColorMask::ALL {
            debug!("PVR has no per-channel write mask, ignoring {:?}", mask);
        }
        Ok(())
    }

    fn write_scissor(&mut self, cmd: &mut CommandBuffer, rect: Rect) -> Result<(), Overflow> {
        let [sx, sy, ex, ey] = self.clip_tiles(rect);
        cmd.extend(&[
            pack2(PVR_CMD_USERCLIP, 0),
            0,
            pack2(sx, sy),
            pack2(ex, ey),
        ])?;
        self.clip_inside = rect != Rect::new(0, 0, self.width as i32, self.height as i32);
        Ok(())
    }

    fn write_frame_end(
        &mut self,
        _cmd: &mut CommandBuffer,
        _next: &DisplaySurface,
    ) -> Result<(), Overflow> {
        // The scene ends with the list terminator; the display flip is the
        // device's job.
        Ok(())
    }

    // ── one-off packets ─────────────────────────────────────────

    fn build_environment(
        &mut self,
        cmd: &mut CommandBuffer,
        surface: &DisplaySurface,
        _zbuf: &DepthBuffer,
    ) -> Result<(), Overflow> {
        self.width = surface.width;
        self.height = surface.height;
        self.texture = None;
        self.write_scissor(cmd, Rect::new(0, 0, surface.width as i32, surface.height as i32))?;
        self.terminate(cmd)
    }

    fn texture_transfer_dwords(&self, texture: &Texture) -> usize {
        let (w, h) = Self::upload_size(texture);
        let texel_dwords = (w * h) as usize / 4;
        1 + texel_dwords + (1 + texel_dwords) % 2
    }

    fn build_texture_transfer(
        &mut self,
        cmd: &mut CommandBuffer,
        texture: &Texture,
        slot: TextureSlot,
    ) -> Result<(), Overflow> {
        let (w, h) = Self::upload_size(texture);
        let needed = self.texture_transfer_dwords(texture);
        if needed > cmd.remaining_dwords() {
            return Err(Overflow {
                needed,
                available: cmd.remaining_dwords(),
            });
        }
        cmd.push(txr_dma_header(slot.address * 4, w * h * 2))?;

        let src = texture.pixels();
        let tw = texture.width() as usize;
        let th = texture.height() as usize;
        let mut row = vec![0u16; w as usize];
        for y in 0..h as usize {
            row.fill(0);
            if y < th {
                for (dst, &px) in row.iter_mut().zip(&src[y * tw..(y + 1) * tw]) {
                    *dst = to_argb4444(px);
                }
            }
            for quad in row.chunks(4) {
                let dw = quad
                    .iter()
                    .enumerate()
                    .fold(0u64, |acc, (i, &t)| acc | (t as u64) << (i * 16));
                cmd.push(dw)?;
            }
        }
        cmd.align_qword()
    }

    fn write_texture_binding(
        &mut self,
        _cmd: &mut CommandBuffer,
        texture: &Texture,
        slot: TextureSlot,
    ) -> Result<(), Overflow> {
        let (w, h) = Self::upload_size(texture);
        self.texture = Some(BoundTexture {
            usize_flag: dimension_flag(w),
            vsize_flag: dimension_flag(h),
            address_bytes: slot.address * 4,
        });
        Ok(())
    }
}
