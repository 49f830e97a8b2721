//! Shared helpers for the integration tests: backend construction, vertex
//! setup and decoding of whatever reached the recording device.
#![allow(dead_code)]

use ffgfx_core::graphics::gs::decode::{decode_chain, GsCommand};
use ffgfx_core::graphics::vertex::{VertexBufferId, VertexColoured, VertexFormat, VertexTextured};
use ffgfx_core::graphics::HardwareTarget;
use ffgfx_core::{Backend, BackendConfig, GpuDevice, GsTarget, RecordingDevice};

pub type GsBackend = Backend<GsTarget, RecordingDevice>;

pub fn gs_backend() -> GsBackend {
    gs_backend_with(BackendConfig::default())
}

pub fn gs_backend_with(config: BackendConfig) -> GsBackend {
    Backend::new(GsTarget::new(), RecordingDevice::new(), config).unwrap()
}

/// Axis-aligned quad in object space, corners in drawing order.
pub fn quad(x0: f32, y0: f32, x1: f32, y1: f32, z: f32, col: u32) -> [VertexColoured; 4] {
    [
        VertexColoured::new(x0, y0, z, col),
        VertexColoured::new(x1, y0, z, col),
        VertexColoured::new(x1, y1, z, col),
        VertexColoured::new(x0, y1, z, col),
    ]
}

pub fn textured_quad(x0: f32, y0: f32, x1: f32, y1: f32, col: u32) -> [VertexTextured; 4] {
    [
        VertexTextured::new(x0, y0, 0.0, col, 0.0, 0.0),
        VertexTextured::new(x1, y0, 0.0, col, 1.0, 0.0),
        VertexTextured::new(x1, y1, 0.0, col, 1.0, 1.0),
        VertexTextured::new(x0, y1, 0.0, col, 0.0, 1.0),
    ]
}

/// Create, fill and bind a coloured buffer.
pub fn upload_coloured<T: HardwareTarget, D: GpuDevice>(
    backend: &mut Backend<T, D>,
    vertices: &[VertexColoured],
) -> VertexBufferId {
    let id = backend
        .create_vertex_buffer(VertexFormat::Coloured, vertices.len())
        .unwrap();
    {
        let mut lock = backend.lock_vertex_buffer(id, vertices.len()).unwrap();
        lock.coloured_mut().unwrap().copy_from_slice(vertices);
        lock.unlock();
    }
    backend.bind_vertex_buffer(id).unwrap();
    id
}

pub fn upload_textured(backend: &mut GsBackend, vertices: &[VertexTextured]) -> VertexBufferId {
    let id = backend
        .create_vertex_buffer(VertexFormat::Textured, vertices.len())
        .unwrap();
    {
        let mut lock = backend.lock_vertex_buffer(id, vertices.len()).unwrap();
        lock.textured_mut().unwrap().copy_from_slice(vertices);
    }
    backend.bind_vertex_buffer(id).unwrap();
    id
}

/// Decode every chain sent from transfer `from` onwards.
pub fn commands_since(backend: &GsBackend, from: usize) -> Vec<GsCommand> {
    backend.device().transfers()[from..]
        .iter()
        .flat_map(|chain| decode_chain(chain).unwrap())
        .collect()
}

pub fn chain_commands(backend: &GsBackend, index: usize) -> Vec<GsCommand> {
    decode_chain(&backend.device().transfers()[index]).unwrap()
}

pub fn image_count(commands: &[GsCommand]) -> usize {
    commands
        .iter()
        .filter(|c| matches!(c, GsCommand::Image { .. }))
        .count()
}
