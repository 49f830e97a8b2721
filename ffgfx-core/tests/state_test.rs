// Deferred register groups and immediate state writes
mod utils;

use ffgfx_core::graphics::gs::decode::register_writes;
use ffgfx_core::graphics::gs::regs::*;
use ffgfx_core::graphics::gs::target::GS_ALPHA_REF;
use ffgfx_core::graphics::vertex::{pack_col, VertexFormat};
use utils::*;

fn test_register(alpha_test: bool, depth_test: bool) -> u64 {
    let atst = if alpha_test {
        ATEST_METHOD_GREATER_EQUAL
    } else {
        ATEST_METHOD_ALLPASS
    };
    let ztst = if depth_test {
        ZTEST_METHOD_GREATER_EQUAL
    } else {
        ZTEST_METHOD_ALLPASS
    };
    gs_test(true, atst, GS_ALPHA_REF, ATEST_KEEP_ALL, false, false, true, ztst)
}

fn white_quad_backend() -> GsBackend {
    let mut b = gs_backend();
    let col = pack_col(255, 255, 255, 255);
    upload_coloured(&mut b, &quad(-0.5, -0.5, 0.5, 0.5, 0.0, col));
    b
}

#[test]
fn toggles_between_draws_emit_one_test_packet() {
    let mut b = white_quad_backend();
    b.set_depth_test(true);
    b.set_depth_test(false);
    b.set_depth_test(true);
    b.draw_indexed_triangles(4, 0);
    b.end_frame();

    let cmds = commands_since(&b, 1);
    assert_eq!(
        register_writes(&cmds, GS_REG_TEST_1),
        vec![test_register(false, true)]
    );
}

#[test]
fn clean_state_is_not_rewritten() {
    let mut b = white_quad_backend();
    b.draw_indexed_triangles(4, 0);
    b.draw_indexed_triangles(4, 0);
    b.set_blend(true);
    b.draw_indexed_triangles(4, 0);
    b.end_frame();

    let cmds = commands_since(&b, 1);
    assert_eq!(register_writes(&cmds, GS_REG_TEST_1).len(), 1);
    let prims = register_writes(&cmds, GS_REG_PRIM);
    assert_eq!(prims.len(), 2);
    // ABE is bit 6.
    assert_eq!(prims[0] & 1 << 6, 0);
    assert_ne!(prims[1] & 1 << 6, 0);
    assert_eq!(prims[1] & 7, PRIM_TRIANGLE);
}

#[test]
fn alpha_test_uses_halved_reference() {
    let mut b = white_quad_backend();
    b.set_alpha_test(true);
    b.draw_indexed_triangles(4, 0);
    b.end_frame();

    let cmds = commands_since(&b, 1);
    let test = register_writes(&cmds, GS_REG_TEST_1);
    assert_eq!(test, vec![test_register(true, false)]);
    assert_eq!((test[0] >> 4) & 0xFF, 0x40);
}

#[test]
fn format_change_rewrites_primitive() {
    let mut b = white_quad_backend();
    b.draw_indexed_triangles(4, 0);
    b.set_vertex_format(VertexFormat::Textured);
    // The bound buffer is coloured: the draw is skipped before any state
    // is written.
    b.draw_indexed_triangles(4, 0);
    b.set_vertex_format(VertexFormat::Coloured);
    b.draw_indexed_triangles(4, 0);
    b.set_vertex_format(VertexFormat::Coloured);
    b.draw_indexed_triangles(4, 0);
    b.end_frame();

    let cmds = commands_since(&b, 1);
    // First draw, then the draw after the format changed back.
    assert_eq!(register_writes(&cmds, GS_REG_PRIM).len(), 2);
    assert_eq!(b.stats().triangles, 6);
}

#[test]
fn depth_write_is_immediate() {
    let mut b = gs_backend();
    b.set_depth_write(true);
    b.set_depth_write(false);
    b.end_frame();

    let cmds = commands_since(&b, 1);
    let zbuf = register_writes(&cmds, GS_REG_ZBUF_1);
    assert_eq!(zbuf.len(), 2);
    // ZMSK is bit 32: clear while writing, set otherwise.
    assert_eq!(zbuf[0] >> 32 & 1, 0);
    assert_eq!(zbuf[1] >> 32 & 1, 1);
}

#[test]
fn scissor_is_inclusive() {
    let mut b = gs_backend();
    b.set_scissor(10, 20, 100, 50);
    b.end_frame();

    let cmds = commands_since(&b, 1);
    assert_eq!(
        register_writes(&cmds, GS_REG_SCISSOR_1),
        vec![gs_scissor(10, 109, 20, 69)]
    );
}

#[test]
fn clear_restores_test_register() {
    let mut b = white_quad_backend();
    b.set_depth_test(true);
    b.draw_indexed_triangles(4, 0);
    b.clear_color(pack_col(10, 20, 30, 0));
    b.clear_buffers();
    b.draw_indexed_triangles(4, 0);
    b.end_frame();

    let cmds = commands_since(&b, 1);
    let test = register_writes(&cmds, GS_REG_TEST_1);
    // draw, clear's own no-test write, restore
    assert_eq!(test.len(), 3);
    assert_eq!(test[0], test_register(false, true));
    assert_eq!(test[1] >> 16 & 1, 1);
    assert_eq!(test[1] >> 17 & 3, ZTEST_METHOD_ALLPASS);
    assert_eq!(test[2], test_register(false, true));

    // Sprite PRIM from the clear, then the triangle PRIM again.
    let prims = register_writes(&cmds, GS_REG_PRIM);
    assert_eq!(prims.len(), 3);
    assert_eq!(prims[1] & 7, PRIM_SPRITE);
    assert_eq!(prims[2] & 7, PRIM_TRIANGLE);

    let rgbaq = register_writes(&cmds, GS_REG_RGBAQ);
    assert_eq!(rgbaq[0] as u32, pack_col(10, 20, 30, 0x80));
}
