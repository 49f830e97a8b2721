// Texture residency and upload chains
mod utils;

use ffgfx_core::graphics::gs::decode::{batches, image_texels, register_writes};
use ffgfx_core::graphics::gs::regs::*;
use ffgfx_core::graphics::vertex::{pack_col, VertexFormat};
use ffgfx_core::texture::Bitmap;
use ffgfx_core::{GfxError, TextureId};
use utils::*;

const BASE: u32 = 0x1111_1111;
const PATCH: u32 = 0xAABB_CCDD;

fn texture_16(b: &mut GsBackend) -> TextureId {
    let pixels = vec![BASE; 256];
    b.create_texture(&Bitmap::new(16, 16, &pixels), false).unwrap()
}

fn uploads(b: &GsBackend) -> Vec<usize> {
    (0..b.device().transfers().len())
        .filter(|&i| image_count(&chain_commands(b, i)) > 0)
        .collect()
}

#[test]
fn rebinding_resident_texture_is_free() {
    let mut b = gs_backend();
    let tex = texture_16(&mut b);
    b.bind_texture(Some(tex)).unwrap();
    b.bind_texture(Some(tex)).unwrap();
    assert_eq!(b.frame_stats().texture_uploads, 1);
    b.end_frame();

    assert_eq!(image_count(&commands_since(&b, 1)), 1);
    assert_eq!(b.device().hazards(), 0);
}

#[test]
fn binding_flushes_queued_draws_first() {
    let mut b = gs_backend();
    let col = pack_col(255, 255, 255, 255);
    upload_coloured(&mut b, &quad(-0.5, -0.5, 0.5, 0.5, 0.0, col));
    b.draw_indexed_triangles(4, 0);
    let tex = texture_16(&mut b);
    b.bind_texture(Some(tex)).unwrap();

    // Environment, the segment holding the draw, then the upload.
    let transfers = b.device().transfers().len();
    assert_eq!(transfers, 3);
    assert_eq!(batches(&chain_commands(&b, 1)).len(), 1);
    assert_eq!(uploads(&b), vec![2]);
}

#[test]
fn region_update_forces_reupload() {
    let mut b = gs_backend();
    let tex = texture_16(&mut b);
    b.bind_texture(Some(tex)).unwrap();
    b.update_texture_region(tex, 0, 0, &Bitmap::new(4, 4, &[PATCH; 16]))
        .unwrap();
    b.bind_texture(Some(tex)).unwrap();
    assert_eq!(b.frame_stats().texture_uploads, 2);

    let last = *uploads(&b).last().unwrap();
    let texels = image_texels(&chain_commands(&b, last));
    assert_eq!(texels.len(), 256);
    assert_eq!(texels[0], PATCH);
    assert_eq!(texels[3], PATCH);
    assert_eq!(texels[4], BASE);
    assert_eq!(texels[16], PATCH);
    assert_eq!(texels[4 * 16], BASE);
}

#[test]
fn upload_targets_texture_area() {
    let mut b = gs_backend();
    let tex = texture_16(&mut b);
    b.bind_texture(Some(tex)).unwrap();
    b.end_frame();

    let upload = chain_commands(&b, 2);
    let blit = register_writes(&upload, GS_REG_BITBLTBUF);
    assert_eq!(blit.len(), 1);
    // Both framebuffers and the depth buffer come first.
    let base = 3 * 640 * 448 / 64;
    assert_eq!(blit[0] >> 32 & 0x3FFF, base as u64);
    assert_eq!(
        register_writes(&upload, GS_REG_TRXREG),
        vec![gs_trxreg(16, 16)]
    );
    assert_eq!(register_writes(&upload, GS_REG_TEXFLUSH).len(), 1);

    let frame = commands_since(&b, 3);
    let tex0 = register_writes(&frame, GS_REG_TEX0_1);
    assert_eq!(tex0.len(), 1);
    assert_eq!(tex0[0] & 0x3FFF, base as u64);
    // Rows padded to 256 texels, 16x16 image.
    assert_eq!(tex0[0] >> 14 & 0x3F, 4);
    assert_eq!(tex0[0] >> 26 & 0xF, 4);
    assert_eq!(tex0[0] >> 30 & 0xF, 4);
}

#[test]
fn textured_draw_enables_mapping() {
    let mut b = gs_backend();
    let tex = texture_16(&mut b);
    b.bind_texture(Some(tex)).unwrap();
    assert!(b.render_state().texturing);
    b.set_vertex_format(VertexFormat::Textured);
    let col = pack_col(255, 255, 255, 255);
    upload_textured(&mut b, &textured_quad(-0.5, -0.5, 0.5, 0.5, col));
    b.draw_indexed_triangles(4, 0);
    b.end_frame();

    let frame = commands_since(&b, 3);
    let prims = register_writes(&frame, GS_REG_PRIM);
    assert_eq!(prims.len(), 1);
    // TME is bit 4.
    assert_ne!(prims[0] & 1 << 4, 0);

    let verts = batches(&frame)[0];
    assert_eq!(verts.len(), 6);
    let st = verts[1].st.unwrap();
    assert_eq!(f32::from_bits(st as u32), 1.0);
    assert_eq!(f32::from_bits((st >> 32) as u32), 0.0);
}

#[test]
fn default_texture_disables_texturing() {
    let mut b = gs_backend();
    let tex = texture_16(&mut b);
    b.bind_texture(Some(tex)).unwrap();
    b.bind_texture(None).unwrap();
    assert!(!b.render_state().texturing);
    assert_eq!(b.frame_stats().texture_uploads, 2);
}

#[test]
fn deleting_resident_texture_empties_slot() {
    let mut b = gs_backend();
    let tex = texture_16(&mut b);
    b.bind_texture(Some(tex)).unwrap();
    assert!(b.delete_texture(tex));
    assert!(matches!(
        b.bind_texture(Some(tex)),
        Err(GfxError::InvalidHandle { .. })
    ));

    // A new texture may reuse the same pixels; it still has to be uploaded.
    let again = texture_16(&mut b);
    b.bind_texture(Some(again)).unwrap();
    assert_eq!(b.frame_stats().texture_uploads, 2);
}

#[test]
fn oversized_texture_does_not_fit_the_area() {
    let mut b = gs_backend();
    let pixels = vec![0u32; 512 * 512];
    let err = b
        .create_texture(&Bitmap::new(512, 512, &pixels), false)
        .unwrap_err();
    assert!(matches!(err, GfxError::AllocationFailure { .. }));

    // 256x256 needs 65536 words and fits.
    let pixels = vec![0u32; 256 * 256];
    assert!(b
        .create_texture(&Bitmap::new(256, 256, &pixels), true)
        .is_ok());
}

#[test]
fn large_texture_upload_carries_every_texel() {
    let mut b = gs_backend();
    let pixels: Vec<u32> = (0..64 * 64).map(|i| 0xFF00_0000 | i).collect();
    let tex = b
        .create_texture(&Bitmap::new(64, 64, &pixels), false)
        .unwrap();
    b.bind_texture(Some(tex)).unwrap();
    assert_eq!(uploads(&b), vec![2]);

    let upload = chain_commands(&b, 2);
    assert_eq!(image_texels(&upload), pixels);
    assert_eq!(
        register_writes(&upload, GS_REG_TRXREG),
        vec![gs_trxreg(64, 64)]
    );
    assert_eq!(register_writes(&upload, GS_REG_TEXFLUSH).len(), 1);
}

#[test]
fn region_offset_past_u32_range_is_rejected() {
    let mut b = gs_backend();
    let tex = texture_16(&mut b);
    let err = b.update_texture_region(tex, u32::MAX, 0, &Bitmap::new(2, 1, &[PATCH; 2]));
    assert!(matches!(err, Err(GfxError::InvalidArgument(_))));
    b.bind_texture(Some(tex)).unwrap();
    b.end_frame();
    let texels = image_texels(&chain_commands(&b, 2));
    assert!(texels.iter().all(|&t| t == BASE));
}
