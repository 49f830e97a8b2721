//! The render context.
//!
//! `Backend` owns everything a frame needs: the double-buffered command
//! stream, matrices and viewport, the render-state snapshot, texture and
//! vertex buffer pools, and the texture slot. State setters and draws never
//! fail; running out of command space forces a mid-frame flush instead.

use crate::config::BackendConfig;
use crate::error::{GfxError, ResourceKind, Result};
use crate::graphics::clip::Viewport;
use crate::graphics::command::{CommandBuffer, Overflow};
use crate::graphics::draw::{emit_quads, max_batch_vertices, worst_case_dwords};
use crate::graphics::math::Matrix;
use crate::graphics::state::{ColorMask, DirtyGroups, Rect, RenderState, StateTracker};
use crate::graphics::submit::Submitter;
use crate::graphics::target::{HardwareTarget, TextureSlot};
use crate::graphics::vertex::{
    Vertex, VertexBufferId, VertexBufferPool, VertexData, VertexFormat, VertexLock,
};
use crate::hardware::vram::{Alignment, VramAllocator};
use crate::hardware::{DepthBuffer, DisplaySurface, GpuDevice, PixelFormat};
use crate::texture::{Bitmap, TextureId, TexturePool};
use crate::video::FrameLimiter;
use log::{debug, error, info, trace, warn};
use serde::Serialize;

/// Space kept free for a single immediate register write.
pub const IMMEDIATE_RESERVE_DWORDS: usize = 256;
/// Qwords of the reusable buffer one-off chains are built in.
const UPLOAD_INITIAL_QWORDS: usize = 256;
const WHITE_TEXTURE_SIZE: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixSlot {
    View,
    Projection,
}

/// Counters for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub batches: usize,
    pub triangles: usize,
    pub culled: usize,
    pub forced_flushes: usize,
    pub texture_uploads: usize,
    pub chains: usize,
}

/// Texture memory left after the surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TextureArea {
    address: u32,
    words: u32,
}

pub struct Backend<T: HardwareTarget, D: GpuDevice> {
    target: T,
    device: D,
    config: BackendConfig,
    submitter: Submitter,
    /// One-off chains (environment, texture uploads) are built here so the
    /// frame buffers never carry them.
    upload: CommandBuffer,
    zbuf: DepthBuffer,
    texture_area: TextureArea,

    state: StateTracker,
    viewport: Viewport,
    view: Matrix,
    projection: Matrix,
    mvp: Matrix,

    textures: TexturePool,
    white_texture: TextureId,
    /// Texture and revision currently in the slot.
    resident: Option<(TextureId, u32)>,
    buffers: VertexBufferPool,
    bound_buffer: Option<VertexBufferId>,

    limiter: FrameLimiter,
    vsync: bool,
    frames: u64,
    stats: FrameStats,
    last_stats: FrameStats,
}

fn vram_failure(words: u32) -> GfxError {
    GfxError::AllocationFailure {
        what: ResourceKind::Vram,
        bytes: words as usize * 4,
    }
}

/// Make sure `dwords` fit in the current segment, flushing if not.
fn ensure_space<T, D>(
    submitter: &mut Submitter,
    target: &mut T,
    device: &mut D,
    stats: &mut FrameStats,
    dwords: usize,
) -> std::result::Result<(), Overflow>
where
    T: HardwareTarget,
    D: GpuDevice,
{
    if submitter.fits(target, dwords) {
        return Ok(());
    }
    warn!("Command buffer full, forcing flush");
    stats.forced_flushes += 1;
    stats.chains += 1;
    submitter.flush(target, device)
}

/// Write a small packet into the frame's command stream. Errors are logged,
/// never returned.
fn write_immediate<T, D, F>(
    submitter: &mut Submitter,
    target: &mut T,
    device: &mut D,
    stats: &mut FrameStats,
    what: &str,
    write: F,
) where
    T: HardwareTarget,
    D: GpuDevice,
    F: FnOnce(&mut T, &mut CommandBuffer) -> std::result::Result<(), Overflow>,
{
    let result = ensure_space(submitter, target, device, stats, IMMEDIATE_RESERVE_DWORDS)
        .and_then(|()| write(target, submitter.current_mut()));
    if let Err(err) = result {
        error!("Dropped {} write: {}", what, err);
    }
}

impl<T: HardwareTarget, D: GpuDevice> Backend<T, D> {
    /// Lay out video memory, send the drawing environment and open the
    /// first segment.
    pub fn new(mut target: T, mut device: D, config: BackendConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| GfxError::InvalidArgument(e.to_string()))?;
        let (width, height) = (config.width, config.height);

        let mut vram = VramAllocator::new();
        let surface_words = VramAllocator::size_words(width, height, PixelFormat::Psm32);
        let surface = |vram: &mut VramAllocator| -> Result<DisplaySurface> {
            let address = vram
                .allocate(width, height, PixelFormat::Psm32, Alignment::Page)
                .ok_or_else(|| vram_failure(surface_words))?;
            Ok(DisplaySurface {
                address,
                width,
                height,
                psm: PixelFormat::Psm32,
                mask: 0,
            })
        };
        let surfaces = [surface(&mut vram)?, surface(&mut vram)?];
        let zbuf = DepthBuffer {
            address: vram
                .allocate(width, height, PixelFormat::Psmz32, Alignment::Page)
                .ok_or_else(|| vram_failure(surface_words))?,
            psm: PixelFormat::Psmz32,
            mask: true,
        };
        let (address, words) = vram
            .allocate_rest(Alignment::Block)
            .ok_or_else(|| vram_failure(1))?;
        let texture_area = TextureArea { address, words };
        debug!(
            "VRAM: surfaces at {:#x}/{:#x}, depth at {:#x}, textures at {:#x} ({} words)",
            surfaces[0].address, surfaces[1].address, zbuf.address, address, words
        );

        let mut upload = CommandBuffer::new(UPLOAD_INITIAL_QWORDS);
        target.build_environment(&mut upload, &surfaces[0], &zbuf)?;
        device.send_chain(upload.words());
        device.wait_transfer();

        let mut submitter = Submitter::new(
            config.packet_qwords,
            config.flush_threshold_qwords,
            surfaces,
        );
        submitter.start(&mut target)?;

        let mut textures = TexturePool::new(config.texture_memory_bytes);
        let white = vec![0xFFFF_FFFFu32; (WHITE_TEXTURE_SIZE * WHITE_TEXTURE_SIZE) as usize];
        let white_texture =
            textures.create(&Bitmap::new(WHITE_TEXTURE_SIZE, WHITE_TEXTURE_SIZE, &white))?;

        let mut state = StateTracker::new();
        state.record_scissor(Rect::new(0, 0, width as i32, height as i32));

        info!(
            "Initialized {} backend, {}x{}, 2 x {} qword command buffers",
            target.name(),
            width,
            height,
            config.packet_qwords
        );

        Ok(Self {
            buffers: VertexBufferPool::new().with_halved_colours(target.halves_vertex_colours()),
            target,
            device,
            submitter,
            upload,
            zbuf,
            texture_area,
            state,
            viewport: Viewport::new(0, 0, width as i32, height as i32),
            view: Matrix::IDENTITY,
            projection: Matrix::IDENTITY,
            mvp: Matrix::IDENTITY,
            textures,
            white_texture,
            resident: None,
            bound_buffer: None,
            limiter: FrameLimiter::new(config.min_frame_ms),
            vsync: config.vsync,
            frames: 0,
            stats: FrameStats::default(),
            last_stats: FrameStats::default(),
            config,
        })
    }

    // ── lifecycle ───────────────────────────────────────────────

    /// Release every texture and vertex buffer. The backend stays usable.
    pub fn shutdown(&mut self) {
        info!(
            "Shutting down {} backend after {} frames",
            self.target.name(),
            self.frames
        );
        self.buffers =
            VertexBufferPool::new().with_halved_colours(self.target.halves_vertex_colours());
        self.bound_buffer = None;
        self.textures.retain(self.white_texture);
        self.resident = None;
        self.state.set_texturing(false);
    }

    pub fn on_device_lost(&mut self) {
        info!("Device lost");
    }

    /// Resend the drawing environment and forget everything the GPU held.
    /// The segment being built is discarded.
    pub fn on_device_restored(&mut self) -> bool {
        self.upload.clear();
        let surface = *self.submitter.render_surface();
        if let Err(err) = self
            .target
            .build_environment(&mut self.upload, &surface, &self.zbuf)
        {
            error!("Failed to rebuild environment: {}", err);
            return false;
        }
        self.device.send_chain(self.upload.words());
        self.device.wait_transfer();
        self.stats.chains += 1;

        if let Err(err) = self.submitter.start(&mut self.target) {
            error!("Failed to reopen command buffer: {}", err);
            return false;
        }
        self.resident = None;
        self.state.invalidate(DirtyGroups {
            state: true,
            format: true,
        });
        info!("Device restored");
        true
    }

    // ── textures ────────────────────────────────────────────────

    /// Mipmaps are not supported; the flag is accepted and ignored.
    pub fn create_texture(&mut self, bmp: &Bitmap<'_>, mipmaps: bool) -> Result<TextureId> {
        if mipmaps {
            debug!("Mipmaps requested for {}x{} texture, ignoring", bmp.width, bmp.height);
        }
        let words = self.target.texture_footprint_words(bmp.width, bmp.height);
        if words > self.texture_area.words {
            return Err(vram_failure(words));
        }
        self.textures.create(bmp)
    }

    /// Rewrite part of a texture. The GPU copy is refreshed on the next bind.
    pub fn update_texture_region(
        &mut self,
        id: TextureId,
        x: u32,
        y: u32,
        part: &Bitmap<'_>,
    ) -> Result<()> {
        self.textures.update_region(id, x, y, part)
    }

    pub fn delete_texture(&mut self, id: TextureId) -> bool {
        if id == self.white_texture {
            warn!("Refusing to delete the default texture");
            return false;
        }
        if self.resident.is_some_and(|(resident, _)| resident == id) {
            self.resident = None;
        }
        self.textures.delete(id)
    }

    /// Make `texture` (or the white default) the one primitives sample.
    /// Uploads only when the slot holds something else or a stale copy.
    pub fn bind_texture(&mut self, texture: Option<TextureId>) -> Result<()> {
        let id = texture.unwrap_or(self.white_texture);
        let tex = self.textures.get(id)?;
        self.state.set_texturing(id != self.white_texture);

        let key = (id, tex.revision());
        if self.resident == Some(key) {
            return Ok(());
        }

        // The slot is about to be overwritten; draws already queued must
        // reach the GPU first.
        self.submitter.flush(&mut self.target, &mut self.device)?;
        self.stats.chains += 1;

        let slot = TextureSlot {
            address: self.texture_area.address,
            row_width: self.target.texture_row_width(tex.width()),
        };
        let needed = self.target.texture_transfer_dwords(tex);
        if self.upload.capacity_qwords() * 2 < needed {
            self.upload = CommandBuffer::new(needed.div_ceil(2));
        } else {
            self.upload.clear();
        }
        self.target
            .build_texture_transfer(&mut self.upload, tex, slot)?;
        self.device.send_chain(self.upload.words());
        self.device.wait_transfer();
        self.stats.texture_uploads += 1;
        self.stats.chains += 1;
        trace!("Uploaded texture {} ({}x{})", id.0, tex.width(), tex.height());

        write_immediate(
            &mut self.submitter,
            &mut self.target,
            &mut self.device,
            &mut self.stats,
            "texture binding",
            |target, cmd| target.write_texture_binding(cmd, tex, slot),
        );
        self.resident = Some(key);
        Ok(())
    }

    // ── vertex buffers ──────────────────────────────────────────

    /// Static and dynamic buffers share this path.
    pub fn create_vertex_buffer(
        &mut self,
        format: VertexFormat,
        count: usize,
    ) -> Result<VertexBufferId> {
        self.buffers.create(format, count)
    }

    /// Open the first `count` vertices for writing. Releasing the lock
    /// (explicitly or by drop) unlocks the buffer.
    pub fn lock_vertex_buffer(
        &mut self,
        id: VertexBufferId,
        count: usize,
    ) -> Result<VertexLock<'_>> {
        self.buffers.get_mut(id)?.lock(count)
    }

    pub fn delete_vertex_buffer(&mut self, id: VertexBufferId) -> bool {
        if self.bound_buffer == Some(id) {
            self.bound_buffer = None;
        }
        self.buffers.delete(id)
    }

    pub fn bind_vertex_buffer(&mut self, id: VertexBufferId) -> Result<()> {
        self.buffers.get(id)?;
        self.bound_buffer = Some(id);
        Ok(())
    }

    // ── deferred state ──────────────────────────────────────────

    pub fn set_depth_test(&mut self, enabled: bool) {
        self.state.set_depth_test(enabled);
    }

    pub fn set_alpha_test(&mut self, enabled: bool) {
        self.state.set_alpha_test(enabled);
    }

    pub fn set_blend(&mut self, enabled: bool) {
        self.state.set_blend(enabled);
    }

    pub fn set_vertex_format(&mut self, format: VertexFormat) {
        if self.state.current().format != format {
            self.state.set_vertex_format(format);
        }
    }

    pub fn set_face_culling(&mut self, enabled: bool) {
        self.state.set_face_culling(enabled);
    }

    pub fn set_fog(&mut self, enabled: bool) -> Result<()> {
        if enabled {
            return Err(GfxError::UnsupportedOperation("fog"));
        }
        Ok(())
    }

    // ── immediate state ─────────────────────────────────────────

    pub fn set_depth_write(&mut self, enabled: bool) {
        self.zbuf.mask = !enabled;
        self.state.record_depth_write(enabled);
        let zbuf = self.zbuf;
        write_immediate(
            &mut self.submitter,
            &mut self.target,
            &mut self.device,
            &mut self.stats,
            "depth write",
            |target, cmd| target.write_depth_write(cmd, &zbuf),
        );
    }

    pub fn set_color_write_mask(&mut self, r: bool, g: bool, b: bool, a: bool) {
        let mask = ColorMask { r, g, b, a };
        self.state.record_color_mask(mask);
        self.write_color_mask();
    }

    fn write_color_mask(&mut self) {
        let mask = self.state.current().color_mask;
        let surface = *self.submitter.render_surface();
        write_immediate(
            &mut self.submitter,
            &mut self.target,
            &mut self.device,
            &mut self.stats,
            "colour mask",
            |target, cmd| target.write_color_mask(cmd, &surface, mask),
        );
    }

    pub fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.viewport = Viewport::new(x, y, width, height);
    }

    pub fn set_scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        let rect = Rect::new(x, y, width, height);
        self.state.record_scissor(rect);
        write_immediate(
            &mut self.submitter,
            &mut self.target,
            &mut self.device,
            &mut self.stats,
            "scissor",
            |target, cmd| target.write_scissor(cmd, rect),
        );
    }

    pub fn clear_color(&mut self, col: u32) {
        self.state.record_clear_color(col);
    }

    /// Fill the render surface with the clear colour. The clear sprite
    /// clobbers the test and primitive registers, so both groups are
    /// restored afterwards.
    pub fn clear_buffers(&mut self) {
        let surface = *self.submitter.render_surface();
        let state = *self.state.current();
        write_immediate(
            &mut self.submitter,
            &mut self.target,
            &mut self.device,
            &mut self.stats,
            "clear",
            |target, cmd| {
                target.write_clear(cmd, &surface, state.clear_color)?;
                target.apply_test_state(cmd, &state)
            },
        );
        self.state.invalidate(DirtyGroups {
            state: false,
            format: true,
        });
    }

    pub fn on_window_resize(&mut self, width: u32, height: u32) {
        debug!("Window resized to {}x{}", width, height);
        self.set_viewport(0, 0, width as i32, height as i32);
        self.set_scissor(0, 0, width as i32, height as i32);
    }

    // ── matrices ────────────────────────────────────────────────

    pub fn load_matrix(&mut self, slot: MatrixSlot, matrix: &Matrix) {
        match slot {
            MatrixSlot::View => self.view = *matrix,
            MatrixSlot::Projection => self.projection = *matrix,
        }
        self.mvp = self.view.mul(&self.projection);
    }

    pub fn load_identity(&mut self, slot: MatrixSlot) {
        self.load_matrix(slot, &Matrix::IDENTITY);
    }

    pub fn calc_orthographic(&self, width: f32, height: f32, z_near: f32, z_far: f32) -> Matrix {
        Matrix::orthographic(width, height, z_near, z_far)
    }

    pub fn calc_perspective(&self, fov: f32, aspect: f32, z_far: f32) -> Matrix {
        Matrix::perspective(fov, aspect, z_far)
    }

    // ── drawing ─────────────────────────────────────────────────

    /// Write whichever register groups changed since the last draw.
    fn flush_state(&mut self) {
        let dirty = self.state.take_dirty();
        if !dirty.any() {
            return;
        }
        let state = *self.state.current();
        write_immediate(
            &mut self.submitter,
            &mut self.target,
            &mut self.device,
            &mut self.stats,
            "render state",
            |target, cmd| {
                if dirty.state {
                    target.apply_test_state(cmd, &state)?;
                }
                if dirty.format {
                    target.apply_format_state(cmd, &state)?;
                }
                Ok(())
            },
        );
    }

    /// Draw `count` vertices of the bound buffer as quads, starting at
    /// `start`.
    pub fn draw_indexed_triangles(&mut self, count: usize, start: usize) {
        let Some(id) = self.bound_buffer else {
            warn!("Draw with no vertex buffer bound");
            return;
        };
        let Ok(buffer) = self.buffers.get(id) else {
            warn!("Draw with deleted vertex buffer {}", id.0);
            return;
        };
        let format = self.state.current().format;
        if buffer.format() != format {
            warn!(
                "Vertex format mismatch: buffer is {:?}, state is {:?}",
                buffer.format(),
                format
            );
            return;
        }
        let Some(end) = start.checked_add(count).filter(|&end| end <= buffer.capacity()) else {
            warn!(
                "Draw of {} vertices at {} exceeds buffer of {}",
                count,
                start,
                buffer.capacity()
            );
            return;
        };

        self.flush_state();
        if self.submitter.over_threshold() {
            warn!("Too much geometry, forcing flush");
            self.stats.forced_flushes += 1;
            self.stats.chains += 1;
            if let Err(err) = self.submitter.flush(&mut self.target, &mut self.device) {
                error!("Forced flush failed: {}", err);
                return;
            }
        }

        let Ok(buffer) = self.buffers.get(id) else {
            return;
        };
        let result = match buffer.data() {
            VertexData::Coloured(v) => Self::emit_range(
                &mut self.target,
                &mut self.device,
                &mut self.submitter,
                &mut self.stats,
                &self.config,
                &self.viewport,
                &self.mvp,
                self.state.current(),
                &v[start..end],
            ),
            VertexData::Textured(v) => Self::emit_range(
                &mut self.target,
                &mut self.device,
                &mut self.submitter,
                &mut self.stats,
                &self.config,
                &self.viewport,
                &self.mvp,
                self.state.current(),
                &v[start..end],
            ),
        };
        if let Err(err) = result {
            error!("Draw aborted: {}", err);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_range<V: Vertex>(
        target: &mut T,
        device: &mut D,
        submitter: &mut Submitter,
        stats: &mut FrameStats,
        config: &BackendConfig,
        viewport: &Viewport,
        mvp: &Matrix,
        state: &RenderState,
        vertices: &[V],
    ) -> std::result::Result<(), Overflow> {
        let segment = submitter.segment_space(target);
        let batch = max_batch_vertices(target, state.format, segment, config.max_batch_vertices);
        if batch == 0 {
            warn!("Command buffer too small for a single quad");
            return Ok(());
        }

        for chunk in vertices.chunks(batch) {
            let worst = worst_case_dwords(target, state.format, chunk.len());
            if !submitter.fits(target, worst) {
                warn!("Too much geometry, forcing flush");
                stats.forced_flushes += 1;
                stats.chains += 1;
                submitter.flush(target, device)?;
            }
            let result = emit_quads(target, submitter.current_mut(), viewport, mvp, state, chunk)?;
            if result.triangles > 0 {
                stats.batches += 1;
            }
            stats.triangles += result.triangles;
            stats.culled += result.culled;
        }
        Ok(())
    }

    /// Lines are not drawn by this backend.
    pub fn draw_lines(&mut self, count: usize) {
        debug!("Ignoring line draw of {} vertices", count);
    }

    // ── frames ──────────────────────────────────────────────────

    pub fn begin_frame(&mut self) {
        debug!("--- Frame {} ---", self.frames);
    }

    /// Close and transfer the frame, wait as configured, show it and flip.
    pub fn end_frame(&mut self) {
        let finished = ensure_space(
            &mut self.submitter,
            &mut self.target,
            &mut self.device,
            &mut self.stats,
            IMMEDIATE_RESERVE_DWORDS,
        )
        .and_then(|()| {
            self.submitter
                .finish_frame(&mut self.target, &mut self.device)
        });
        if let Err(err) = finished {
            error!("Failed to finish frame: {}", err);
        }
        self.stats.chains += 1;
        if self.vsync {
            self.device.wait_vsync();
        }
        if self.limiter.is_enabled() {
            let waited = self.limiter.wait();
            trace!("Frame limiter waited {:?}", waited);
        }
        if let Err(err) = self
            .submitter
            .present_and_flip(&mut self.target, &mut self.device)
        {
            error!("Failed to start next frame: {}", err);
        }
        // The frame-end FRAME write reset the channel mask.
        if self.state.current().color_mask != ColorMask::ALL {
            self.write_color_mask();
        }

        self.frames += 1;
        self.last_stats = std::mem::take(&mut self.stats);
        debug!("End frame: {:?}", self.last_stats);
    }

    pub fn set_frame_limiter(&mut self, vsync: bool, min_frame_ms: f32) {
        self.vsync = vsync;
        self.limiter.set_min_frame_ms(min_frame_ms);
        self.limiter.reset();
    }

    // ── reporting ───────────────────────────────────────────────

    pub fn backend_info(&self) -> String {
        format!(
            "-- Using {} --\n\
             Display: {}x{}\n\
             Command buffers: 2 x {} qwords (flush at {})\n\
             Texture slot: {} words at {:#x}\n\
             Textures: {} ({} bytes)",
            self.target.name(),
            self.config.width,
            self.config.height,
            self.config.packet_qwords,
            self.config.flush_threshold_qwords,
            self.texture_area.words,
            self.texture_area.address,
            self.textures.len(),
            self.textures.used_bytes(),
        )
    }

    /// Local memory cannot be read back.
    pub fn take_screenshot(&mut self, _out: &mut dyn std::io::Write) -> Result<()> {
        Err(GfxError::UnsupportedOperation("screenshot"))
    }

    /// Counters of the last completed frame.
    pub fn stats(&self) -> &FrameStats {
        &self.last_stats
    }

    /// Counters of the frame being built.
    pub fn frame_stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn context(&self) -> usize {
        self.submitter.context()
    }

    pub fn render_surface(&self) -> &DisplaySurface {
        self.submitter.render_surface()
    }

    pub fn display_surface(&self) -> &DisplaySurface {
        self.submitter.display_surface()
    }

    pub fn render_state(&self) -> &RenderState {
        self.state.current()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::gs::GsTarget;
    use crate::graphics::vertex::{pack_col, VertexColoured};
    use crate::hardware::{DeviceEvent, RecordingDevice};

    fn backend() -> Backend<GsTarget, RecordingDevice> {
        Backend::new(
            GsTarget::new(),
            RecordingDevice::new(),
            BackendConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn init_sends_environment_once() {
        let b = backend();
        assert_eq!(b.device().transfers().len(), 1);
        assert_eq!(
            b.device().events(),
            &[DeviceEvent::Chain(0), DeviceEvent::WaitTransfer]
        );
        assert_eq!(b.context(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = BackendConfig {
            width: 0,
            ..Default::default()
        };
        let err = Backend::new(GsTarget::new(), RecordingDevice::new(), config)
            .err()
            .unwrap();
        assert!(matches!(err, GfxError::InvalidArgument(_)));
    }

    #[test]
    fn unsupported_operations_say_so() {
        let mut b = backend();
        let mut out = Vec::new();
        assert_eq!(
            b.take_screenshot(&mut out),
            Err(GfxError::UnsupportedOperation("screenshot"))
        );
        assert!(b.set_fog(true).is_err());
        assert!(b.set_fog(false).is_ok());
    }

    #[test]
    fn default_texture_cannot_be_deleted() {
        let mut b = backend();
        let white = b.white_texture;
        assert!(!b.delete_texture(white));
        assert!(b.bind_texture(None).is_ok());
        assert!(!b.render_state().texturing);
    }

    #[test]
    fn texture_larger_than_slot_is_refused() {
        let mut b = backend();
        let pixels = vec![0u32; 512 * 512];
        let err = b
            .create_texture(&Bitmap::new(512, 512, &pixels), false)
            .unwrap_err();
        assert!(matches!(
            err,
            GfxError::AllocationFailure {
                what: ResourceKind::Vram,
                ..
            }
        ));
    }

    #[test]
    fn stats_roll_over_at_end_frame() {
        let mut b = backend();
        let vb = b.create_vertex_buffer(VertexFormat::Coloured, 4).unwrap();
        {
            let mut lock = b.lock_vertex_buffer(vb, 4).unwrap();
            let quad = [
                VertexColoured::new(-0.5, -0.5, 0.0, pack_col(255, 0, 0, 255)),
                VertexColoured::new(0.5, -0.5, 0.0, pack_col(255, 0, 0, 255)),
                VertexColoured::new(0.5, 0.5, 0.0, pack_col(255, 0, 0, 255)),
                VertexColoured::new(-0.5, 0.5, 0.0, pack_col(255, 0, 0, 255)),
            ];
            lock.coloured_mut().unwrap().copy_from_slice(&quad);
        }
        b.bind_vertex_buffer(vb).unwrap();
        b.begin_frame();
        b.draw_indexed_triangles(4, 0);
        assert_eq!(b.frame_stats().triangles, 2);
        b.end_frame();
        assert_eq!(b.stats().triangles, 2);
        assert_eq!(b.stats().batches, 1);
        assert_eq!(b.frame_stats(), &FrameStats::default());
        assert_eq!(b.frames(), 1);
    }

    #[test]
    fn draw_without_buffer_is_ignored() {
        let mut b = backend();
        b.draw_indexed_triangles(6, 0);
        assert_eq!(b.frame_stats().triangles, 0);
    }

    #[test]
    fn info_names_the_target() {
        let b = backend();
        assert!(b.backend_info().starts_with("-- Using GS --"));
    }
}
