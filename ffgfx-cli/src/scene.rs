// Synthetic scene: a grid of quads scrolling across the screen
use anyhow::{Context, Result};
use ffgfx_core::graphics::vertex::{pack_col, VertexColoured, VertexFormat, VertexTextured};
use ffgfx_core::graphics::{HardwareTarget, Matrix};
use ffgfx_core::{Backend, BackendConfig, Bitmap, FrameStats, MatrixSlot, RecordingDevice};
use indicatif::ProgressBar;
use log::{debug, info};
use serde::Serialize;

const CHECKER_SIZE: u32 = 32;
const QUAD_SIZE: f32 = 24.0;
const QUAD_GAP: f32 = 8.0;

#[derive(Debug, Clone, Copy)]
pub struct SceneOptions {
    pub frames: u64,
    pub quads: usize,
    pub textured: bool,
    pub blend: bool,
}

/// Totals over every frame of a run.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub target: String,
    pub frames: u64,
    pub batches: usize,
    pub triangles: usize,
    pub culled: usize,
    pub forced_flushes: usize,
    pub texture_uploads: usize,
    pub chains: usize,
    pub bytes_sent: usize,
    pub hazards: usize,
}

impl RunSummary {
    fn add(&mut self, stats: &FrameStats) {
        self.batches += stats.batches;
        self.triangles += stats.triangles;
        self.culled += stats.culled;
        self.forced_flushes += stats.forced_flushes;
        self.texture_uploads += stats.texture_uploads;
        self.chains += stats.chains;
    }
}

fn checkerboard() -> Vec<u32> {
    let light = pack_col(240, 240, 240, 255);
    let dark = pack_col(40, 40, 40, 255);
    (0..CHECKER_SIZE * CHECKER_SIZE)
        .map(|i| {
            let (x, y) = (i % CHECKER_SIZE, i / CHECKER_SIZE);
            if (x / 4 + y / 4) % 2 == 0 {
                light
            } else {
                dark
            }
        })
        .collect()
}

/// Quad corners laid out in rows across a `width`-wide area.
fn grid(count: usize, width: f32) -> Vec<(f32, f32, u32)> {
    let step = QUAD_SIZE + QUAD_GAP;
    let per_row = ((width / step) as usize).max(1);
    (0..count)
        .map(|i| {
            let x = (i % per_row) as f32 * step;
            let y = (i / per_row) as f32 * step;
            let shade = (i * 37 % 200) as u8 + 55;
            (x, y, pack_col(shade, 255 - shade, 128, 200))
        })
        .collect()
}

fn coloured_quads(cells: &[(f32, f32, u32)]) -> Vec<VertexColoured> {
    cells
        .iter()
        .flat_map(|&(x, y, col)| {
            [
                VertexColoured::new(x, y, -50.0, col),
                VertexColoured::new(x + QUAD_SIZE, y, -50.0, col),
                VertexColoured::new(x + QUAD_SIZE, y + QUAD_SIZE, -50.0, col),
                VertexColoured::new(x, y + QUAD_SIZE, -50.0, col),
            ]
        })
        .collect()
}

fn textured_quads(cells: &[(f32, f32, u32)]) -> Vec<VertexTextured> {
    cells
        .iter()
        .flat_map(|&(x, y, col)| {
            [
                VertexTextured::new(x, y, -50.0, col, 0.0, 0.0),
                VertexTextured::new(x + QUAD_SIZE, y, -50.0, col, 1.0, 0.0),
                VertexTextured::new(x + QUAD_SIZE, y + QUAD_SIZE, -50.0, col, 1.0, 1.0),
                VertexTextured::new(x, y + QUAD_SIZE, -50.0, col, 0.0, 1.0),
            ]
        })
        .collect()
}

/// Drive `backend` for `options.frames` frames and total up what reached
/// the device.
pub fn run<T: HardwareTarget>(
    backend: &mut Backend<T, RecordingDevice>,
    options: SceneOptions,
    width: u32,
    height: u32,
    progress: &ProgressBar,
) -> Result<RunSummary> {
    let mut summary = RunSummary {
        target: backend.target().name().to_string(),
        ..Default::default()
    };

    let ortho = backend.calc_orthographic(width as f32, height as f32, 0.0, 100.0);
    backend.load_matrix(MatrixSlot::Projection, &ortho);

    let cells = grid(options.quads, width as f32);
    let (format, count) = if options.textured {
        let pixels = checkerboard();
        let tex = backend
            .create_texture(&Bitmap::new(CHECKER_SIZE, CHECKER_SIZE, &pixels), false)
            .context("Failed to create checkerboard texture")?;
        backend.bind_texture(Some(tex))?;
        let vertices = textured_quads(&cells);
        let id = backend.create_vertex_buffer(VertexFormat::Textured, vertices.len())?;
        let mut lock = backend.lock_vertex_buffer(id, vertices.len())?;
        if let Some(dst) = lock.textured_mut() {
            dst.copy_from_slice(&vertices);
        }
        lock.unlock();
        backend.bind_vertex_buffer(id)?;
        (VertexFormat::Textured, vertices.len())
    } else {
        let vertices = coloured_quads(&cells);
        let id = backend.create_vertex_buffer(VertexFormat::Coloured, vertices.len())?;
        let mut lock = backend.lock_vertex_buffer(id, vertices.len())?;
        if let Some(dst) = lock.coloured_mut() {
            dst.copy_from_slice(&vertices);
        }
        lock.unlock();
        backend.bind_vertex_buffer(id)?;
        (VertexFormat::Coloured, vertices.len())
    };
    backend.set_vertex_format(format);
    backend.set_depth_test(true);
    backend.set_depth_write(true);
    backend.set_blend(options.blend);
    backend.clear_color(pack_col(16, 16, 48, 255));
    info!(
        "Scene: {} quads ({:?}), {} frames",
        options.quads, format, options.frames
    );

    for frame in 0..options.frames {
        let scroll = (frame % 120) as f32 * 4.0;
        backend.load_matrix(MatrixSlot::View, &Matrix::translation(scroll, 0.0, 0.0));

        backend.begin_frame();
        backend.clear_buffers();
        backend.draw_indexed_triangles(count, 0);
        backend.end_frame();

        summary.add(backend.stats());
        let device = backend.device_mut();
        summary.bytes_sent += device.transfers().iter().map(|c| c.len() * 8).sum::<usize>();
        summary.hazards = device.hazards();
        device.clear();

        debug!("Frame {}: {:?}", frame, backend.stats());
        progress.inc(1);
    }
    summary.frames = backend.frames();
    backend.shutdown();
    Ok(summary)
}

/// Build a backend for `target` and run the scene on it.
pub fn run_with<T: HardwareTarget>(
    target: T,
    config: BackendConfig,
    options: SceneOptions,
    progress: &ProgressBar,
) -> Result<RunSummary> {
    let (width, height) = (config.width, config.height);
    let mut backend = Backend::new(target, RecordingDevice::new(), config)?;
    println!("{}", backend.backend_info());
    run(&mut backend, options, width, height, progress)
}
