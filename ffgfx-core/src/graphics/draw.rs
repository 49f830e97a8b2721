//! Quad batch emission.
//!
//! Vertex streams are quads: four vertices per iteration, drawn as the
//! triangles {0, 1, 2} and {2, 3, 0}. All four are transformed once, each
//! triangle is tested against the guard band on its own, and only triangles
//! that pass are emitted. The batch header is reserved up front and patched
//! with the final vertex count, or given back if nothing passed.

use crate::graphics::clip::{project, transform, GuardBand, Viewport};
use crate::graphics::command::{CommandBuffer, Overflow};
use crate::graphics::math::Matrix;
use crate::graphics::state::RenderState;
use crate::graphics::target::{HardwareTarget, VertexPayload};
use crate::graphics::vertex::{Vertex, VertexFormat};
use log::trace;

/// Triangle corners within a quad.
pub const QUAD_TRIANGLES: [[usize; 3]; 2] = [[0, 1, 2], [2, 3, 0]];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub triangles: usize,
    pub culled: usize,
}

/// Largest command footprint a batch of `vertices` can have if every
/// triangle passes.
pub fn worst_case_dwords<T: HardwareTarget + ?Sized>(
    target: &T,
    format: VertexFormat,
    vertices: usize,
) -> usize {
    let quads = vertices / 4;
    target.header_dwords()
        + quads * 6 * target.vertex_dwords(format)
        + target.batch_padding_dwords()
}

/// Largest vertex count (a multiple of four) whose worst case fits in
/// `dwords` and whose output stays under the header's vertex limit.
pub fn max_batch_vertices<T: HardwareTarget + ?Sized>(
    target: &T,
    format: VertexFormat,
    dwords: usize,
    limit: usize,
) -> usize {
    let fixed = target.header_dwords() + target.batch_padding_dwords();
    let per_quad = 6 * target.vertex_dwords(format);
    let by_space = dwords.saturating_sub(fixed) / per_quad;
    let by_header = target.max_header_vertices() / 6;
    let by_limit = limit / 4;
    by_space.min(by_header).min(by_limit) * 4
}

/// Emit one batch. The caller guarantees `worst_case_dwords` of space.
pub fn emit_quads<T, V>(
    target: &mut T,
    cmd: &mut CommandBuffer,
    viewport: &Viewport,
    mvp: &Matrix,
    state: &RenderState,
    vertices: &[V],
) -> Result<BatchResult, Overflow>
where
    T: HardwareTarget + ?Sized,
    V: Vertex,
{
    let band = GuardBand::new(viewport, target.guard_band_extent());
    let slot = cmd.reserve(target.header_dwords())?;
    let mut result = BatchResult::default();

    for quad in vertices.chunks_exact(4) {
        let clip = [
            transform(mvp, quad[0].position()),
            transform(mvp, quad[1].position()),
            transform(mvp, quad[2].position()),
            transform(mvp, quad[3].position()),
        ];

        for tri in QUAD_TRIANGLES {
            if !band.contains_all([clip[tri[0]], clip[tri[1]], clip[tri[2]]]) {
                result.culled += 1;
                continue;
            }
            for (corner, &i) in tri.iter().enumerate() {
                let payload = VertexPayload {
                    col: quad[i].col(),
                    uv: quad[i].uv(),
                    pos: project(viewport, clip[i]),
                };
                target.emit_vertex(cmd, viewport, &payload, corner == 2)?;
            }
            result.triangles += 1;
        }
    }

    if result.triangles == 0 {
        cmd.rollback(slot);
    } else {
        target.patch_header(cmd, slot, result.triangles * 3, state)?;
    }
    trace!(
        "Batch: {} triangles emitted, {} culled",
        result.triangles,
        result.culled
    );
    Ok(result)
}
