// The same backend driving the tile accelerator target
mod utils;

use ffgfx_core::graphics::pvr::regs::*;
use ffgfx_core::graphics::vertex::{pack_col, VertexFormat};
use ffgfx_core::texture::Bitmap;
use ffgfx_core::{Backend, BackendConfig, PvrTarget, RecordingDevice};
use utils::*;

type PvrBackend = Backend<PvrTarget, RecordingDevice>;

fn pvr_backend() -> PvrBackend {
    let config = BackendConfig {
        target: ffgfx_core::TargetKind::Pvr,
        ..Default::default()
    };
    Backend::new(PvrTarget::new(640, 448), RecordingDevice::new(), config).unwrap()
}

fn word(lo_hi: u64, high: bool) -> u32 {
    if high {
        (lo_hi >> 32) as u32
    } else {
        lo_hi as u32
    }
}

#[test]
fn environment_is_a_full_screen_clip() {
    let b = pvr_backend();
    let env = &b.device().transfers()[0];
    assert_eq!(env.len(), 8);
    assert_eq!(word(env[0], false), PVR_CMD_USERCLIP);
    // 640x448 is 20x14 tiles.
    assert_eq!(env[3], pack2(19, 13));
    assert!(env[4..].iter().all(|&w| w == 0));
}

#[test]
fn quad_becomes_two_strips_under_one_header() {
    let mut b = pvr_backend();
    let col = pack_col(200, 100, 50, 255);
    upload_coloured(&mut b, &quad(-0.5, -0.5, 0.5, 0.5, 0.0, col));
    b.draw_indexed_triangles(4, 0);
    b.end_frame();

    let frame = &b.device().transfers()[1];
    // Header, six vertex records, end of list.
    assert_eq!(frame.len(), 32);
    assert_eq!(word(frame[0], false) & PVR_CMD_POLYHDR, PVR_CMD_POLYHDR);

    let records: Vec<&[u64]> = frame[4..28].chunks(4).collect();
    let flags: Vec<u32> = records.iter().map(|r| word(r[0], false)).collect();
    assert_eq!(
        flags,
        vec![
            PVR_CMD_VERTEX,
            PVR_CMD_VERTEX,
            PVR_CMD_VERTEX_EOL,
            PVR_CMD_VERTEX,
            PVR_CMD_VERTEX,
            PVR_CMD_VERTEX_EOL,
        ]
    );

    let first = records[0];
    assert_eq!(f32::from_bits(word(first[0], true)), 160.0);
    assert_eq!(f32::from_bits(word(first[1], false)), 336.0);
    assert_eq!(f32::from_bits(word(first[1], true)), 1.0);
    // Colour goes through untouched apart from the channel order.
    assert_eq!(word(first[3], false), to_argb(col));

    assert!(frame[28..].iter().all(|&w| w == 0));
    assert_eq!(b.stats().triangles, 2);
}

#[test]
fn state_changes_only_touch_headers() {
    let mut b = pvr_backend();
    let col = pack_col(255, 255, 255, 255);
    upload_coloured(&mut b, &quad(-0.5, -0.5, 0.5, 0.5, 0.0, col));
    b.set_depth_test(true);
    b.set_blend(true);
    b.draw_indexed_triangles(4, 0);
    b.end_frame();

    let frame = &b.device().transfers()[1];
    assert_eq!(frame.len(), 32);
    let cmd = word(frame[0], false);
    assert_eq!(
        (cmd & PVR_TA_CMD_TYPE_MASK) >> PVR_TA_CMD_TYPE_SHIFT,
        PVR_LIST_TR_POLY
    );
    let mode1 = word(frame[0], true);
    assert_eq!(mode1 >> PVR_TA_PM1_DEPTHCMP_SHIFT, PVR_DEPTHCMP_GEQUAL);
}

#[test]
fn textured_draw_references_upload() {
    let mut b = pvr_backend();
    let pixels = vec![0xFFFF_FFFFu32; 16 * 16];
    let tex = b
        .create_texture(&Bitmap::new(16, 16, &pixels), false)
        .unwrap();
    b.bind_texture(Some(tex)).unwrap();
    b.set_vertex_format(VertexFormat::Textured);
    let col = pack_col(255, 255, 255, 255);
    let id = b
        .create_vertex_buffer(VertexFormat::Textured, 4)
        .unwrap();
    {
        let mut lock = b.lock_vertex_buffer(id, 4).unwrap();
        lock.textured_mut()
            .unwrap()
            .copy_from_slice(&textured_quad(-0.5, -0.5, 0.5, 0.5, col));
    }
    b.bind_vertex_buffer(id).unwrap();
    b.draw_indexed_triangles(4, 0);
    b.end_frame();

    // Environment, flushed segment, texture block, frame.
    let transfers = b.device().transfers();
    assert_eq!(transfers.len(), 4);
    let upload = &transfers[2];
    // 16x16 texels at two bytes each.
    assert_eq!(word(upload[0], true), 512);
    assert_eq!(upload[1], u64::MAX);

    let frame = &transfers[3];
    let mode1 = word(frame[0], true);
    assert_ne!(mode1 & PVR_TA_PM1_TXRENABLE_MASK, 0);
    let mode3 = word(frame[1], true);
    assert_eq!(mode3 & 0x1F_FFFF, (word(upload[0], false) & 0x00FF_FFF8) >> 3);
    // Second vertex carries u = 1, v = 0.
    assert_eq!(f32::from_bits(word(frame[10], false)), 1.0);
    assert_eq!(f32::from_bits(word(frame[10], true)), 0.0);
}

#[test]
fn flips_without_gs_registers() {
    let mut b = pvr_backend();
    b.end_frame();
    b.end_frame();
    // Only the list terminator per frame.
    assert_eq!(b.device().transfers()[1], vec![0; 4]);
    assert_eq!(b.device().displayed().unwrap().address, 640 * 448);
    assert_eq!(b.device().hazards(), 0);
    assert!(b.backend_info().starts_with("-- Using PVR --"));
}
