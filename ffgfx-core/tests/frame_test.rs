// Frame submission: double buffering, display flips and frame pacing
mod utils;

use ffgfx_core::graphics::gs::decode::{batches, register_writes};
use ffgfx_core::graphics::gs::regs::*;
use ffgfx_core::graphics::vertex::pack_col;
use ffgfx_core::hardware::DeviceEvent;
use ffgfx_core::BackendConfig;
use std::time::{Duration, Instant};
use utils::*;

const SURFACE_WORDS: u32 = 640 * 448;

#[test]
fn contexts_alternate_and_display_follows() {
    let mut b = gs_backend();
    for frame in 0..6 {
        assert_eq!(b.context(), frame % 2);
        let rendered = b.render_surface().address;
        b.begin_frame();
        b.end_frame();
        let shown = b.device().displayed().unwrap().address;
        assert_eq!(shown, rendered);
        assert_ne!(b.render_surface().address, shown);
        assert_eq!(b.display_surface().address, shown);
    }
    assert_eq!(b.frames(), 6);
    assert_eq!(b.device().hazards(), 0);

    let displays: Vec<u32> = b
        .device()
        .events()
        .iter()
        .filter_map(|e| match e {
            DeviceEvent::Display(address) => Some(*address),
            _ => None,
        })
        .collect();
    assert_eq!(
        displays,
        vec![0, SURFACE_WORDS, 0, SURFACE_WORDS, 0, SURFACE_WORDS]
    );
}

#[test]
fn frame_sequence_waits_before_flipping() {
    let mut b = gs_backend();
    b.end_frame();
    assert_eq!(
        &b.device().events()[2..],
        &[
            DeviceEvent::Chain(1),
            DeviceEvent::WaitTransfer,
            DeviceEvent::WaitVsync,
            DeviceEvent::Display(0),
        ]
    );
}

#[test]
fn vsync_can_be_disabled() {
    let mut b = gs_backend();
    b.set_frame_limiter(false, 0.0);
    b.end_frame();
    b.end_frame();
    assert_eq!(b.device().count(&DeviceEvent::WaitVsync), 0);
    assert_eq!(b.device().count(&DeviceEvent::Display(0)), 1);
}

#[test]
fn frame_end_retargets_the_other_surface() {
    let mut b = gs_backend();
    b.end_frame();
    b.end_frame();

    // Frame 0 rendered into surface 0 and hands over to surface 1.
    let first = register_writes(&chain_commands(&b, 1), GS_REG_FRAME_1);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0] & 0x1FF, (SURFACE_WORDS / 2048) as u64);
    let second = register_writes(&chain_commands(&b, 2), GS_REG_FRAME_1);
    assert_eq!(second[0] & 0x1FF, 0);
    assert_eq!(register_writes(&chain_commands(&b, 2), GS_REG_FINISH).len(), 1);
}

#[test]
fn colour_mask_survives_the_flip() {
    let mut b = gs_backend();
    b.set_color_write_mask(true, true, true, false);
    b.end_frame();
    b.end_frame();

    let first = register_writes(&chain_commands(&b, 1), GS_REG_FRAME_1);
    // The mask write, then the unmasked frame-end write.
    assert_eq!(first.len(), 2);
    assert_eq!(first[0] >> 32, 0xFF00_0000);
    assert_eq!(first[1] >> 32, 0);

    let second = register_writes(&chain_commands(&b, 2), GS_REG_FRAME_1);
    assert_eq!(second[0] >> 32, 0xFF00_0000);
    // Points at the surface frame 1 renders into.
    assert_eq!(second[0] & 0x1FF, (SURFACE_WORDS / 2048) as u64);
}

#[test]
fn stats_describe_the_finished_frame() {
    let mut b = gs_backend();
    let col = pack_col(255, 255, 255, 255);
    upload_coloured(&mut b, &quad(-0.5, -0.5, 0.5, 0.5, 0.0, col));
    b.draw_indexed_triangles(4, 0);
    b.draw_indexed_triangles(4, 0);
    b.end_frame();
    assert_eq!(b.stats().batches, 2);
    assert_eq!(b.stats().triangles, 4);
    assert_eq!(b.stats().chains, 1);
    assert_eq!(*b.frame_stats(), Default::default());

    b.end_frame();
    assert_eq!(b.stats().batches, 0);
}

#[test]
fn limiter_enforces_minimum_frame_time() {
    let config = BackendConfig {
        vsync: false,
        min_frame_ms: 10.0,
        ..Default::default()
    };
    let mut b = gs_backend_with(config);
    b.end_frame();
    let start = Instant::now();
    b.end_frame();
    b.end_frame();
    assert!(start.elapsed() >= Duration::from_millis(18));
}

#[test]
fn device_restore_resends_environment() {
    let mut b = gs_backend();
    let col = pack_col(255, 255, 255, 255);
    upload_coloured(&mut b, &quad(-0.5, -0.5, 0.5, 0.5, 0.0, col));
    b.draw_indexed_triangles(4, 0);
    b.on_device_lost();
    assert!(b.on_device_restored());
    b.draw_indexed_triangles(4, 0);
    b.end_frame();

    assert_eq!(b.device().transfers().len(), 3);
    assert_eq!(
        register_writes(&chain_commands(&b, 1), GS_REG_XYOFFSET_1).len(),
        1
    );
    // State groups are rewritten for the restored device.
    let last = chain_commands(&b, 2);
    assert_eq!(register_writes(&last, GS_REG_TEST_1).len(), 1);
    assert_eq!(register_writes(&last, GS_REG_PRIM).len(), 1);
    assert_eq!(batches(&last).len(), 1);
}
