//! GS register, GIF tag and DMA tag encodings
//!
//! Field layouts follow the Graphics Synthesizer's privileged/general
//! register map. Every packer masks its inputs to the field width.

// ── GIF ─────────────────────────────────────────────────────────

pub const GIF_FLG_PACKED: u64 = 0;
pub const GIF_FLG_REGLIST: u64 = 1;
pub const GIF_FLG_IMAGE: u64 = 2;

/// Register descriptors used in GIF tag REGS fields.
pub const GIF_REG_PRIM: u64 = 0x00;
pub const GIF_REG_RGBAQ: u64 = 0x01;
pub const GIF_REG_ST: u64 = 0x02;
pub const GIF_REG_XYZ2: u64 = 0x05;
pub const GIF_REG_AD: u64 = 0x0E;

/// REGS for coloured vertices: RGBAQ, XYZ2.
pub const DRAW_RGBAQ_REGLIST: u64 = GIF_REG_RGBAQ | GIF_REG_XYZ2 << 4;
/// REGS for textured vertices: RGBAQ, ST, XYZ2.
pub const DRAW_STQ_REGLIST: u64 = GIF_REG_RGBAQ | GIF_REG_ST << 4 | GIF_REG_XYZ2 << 8;

/// Largest NLOOP a GIF tag can carry.
pub const GIF_MAX_NLOOP: u64 = 0x7FFF;

/// Low dword of a GIF tag.
pub const fn gif_tag(nloop: u64, eop: bool, pre: bool, prim: u64, flg: u64, nreg: u64) -> u64 {
    (nloop & 0x7FFF)
        | (eop as u64) << 15
        | (pre as u64) << 46
        | (prim & 0x7FF) << 47
        | (flg & 0x3) << 58
        | (nreg & 0xF) << 60
}

// ── General purpose registers (A+D addresses) ───────────────────

pub const GS_REG_PRIM: u64 = 0x00;
pub const GS_REG_RGBAQ: u64 = 0x01;
pub const GS_REG_XYZ2: u64 = 0x05;
pub const GS_REG_TEX0_1: u64 = 0x06;
pub const GS_REG_CLAMP_1: u64 = 0x08;
pub const GS_REG_TEX1_1: u64 = 0x14;
pub const GS_REG_XYOFFSET_1: u64 = 0x18;
pub const GS_REG_PRMODECONT: u64 = 0x1A;
pub const GS_REG_TEXFLUSH: u64 = 0x3F;
pub const GS_REG_SCISSOR_1: u64 = 0x40;
pub const GS_REG_ALPHA_1: u64 = 0x42;
pub const GS_REG_DTHE: u64 = 0x45;
pub const GS_REG_COLCLAMP: u64 = 0x46;
pub const GS_REG_TEST_1: u64 = 0x47;
pub const GS_REG_FRAME_1: u64 = 0x4C;
pub const GS_REG_ZBUF_1: u64 = 0x4E;
pub const GS_REG_BITBLTBUF: u64 = 0x50;
pub const GS_REG_TRXPOS: u64 = 0x51;
pub const GS_REG_TRXREG: u64 = 0x52;
pub const GS_REG_TRXDIR: u64 = 0x53;
pub const GS_REG_FINISH: u64 = 0x61;

// PRIM
pub const PRIM_TRIANGLE: u64 = 3;
pub const PRIM_SPRITE: u64 = 6;
pub const PRIM_SHADE_GOURAUD: u64 = 1;
pub const PRIM_MAP_ST: u64 = 0;
pub const PRIM_UNFIXED: u64 = 0;

#[allow(clippy::too_many_arguments)]
pub const fn gs_prim(
    prim: u64,
    iip: u64,
    tme: bool,
    fge: bool,
    abe: bool,
    aa1: bool,
    fst: u64,
    ctxt: u64,
    fix: u64,
) -> u64 {
    (prim & 0x7)
        | (iip & 1) << 3
        | (tme as u64) << 4
        | (fge as u64) << 5
        | (abe as u64) << 6
        | (aa1 as u64) << 7
        | (fst & 1) << 8
        | (ctxt & 1) << 9
        | (fix & 1) << 10
}

// TEST
pub const ATEST_METHOD_ALLPASS: u64 = 1;
pub const ATEST_METHOD_GREATER_EQUAL: u64 = 5;
pub const ATEST_KEEP_ALL: u64 = 0;
pub const ZTEST_METHOD_ALLPASS: u64 = 1;
pub const ZTEST_METHOD_GREATER_EQUAL: u64 = 2;

#[allow(clippy::too_many_arguments)]
pub const fn gs_test(
    ate: bool,
    atst: u64,
    aref: u64,
    afail: u64,
    date: bool,
    datm: bool,
    zte: bool,
    ztst: u64,
) -> u64 {
    (ate as u64)
        | (atst & 0x7) << 1
        | (aref & 0xFF) << 4
        | (afail & 0x3) << 12
        | (date as u64) << 14
        | (datm as u64) << 15
        | (zte as u64) << 16
        | (ztst & 0x3) << 17
}

// ALPHA: ((A - B) * C >> 7) + D
pub const BLEND_COLOR_SOURCE: u64 = 0;
pub const BLEND_COLOR_DEST: u64 = 1;
pub const BLEND_ALPHA_SOURCE: u64 = 0;

pub const fn gs_alpha(a: u64, b: u64, c: u64, d: u64, fix: u64) -> u64 {
    (a & 3) | (b & 3) << 2 | (c & 3) << 4 | (d & 3) << 6 | (fix & 0xFF) << 32
}

// CLAMP
pub const WRAP_REPEAT: u64 = 0;

pub const fn gs_clamp(wms: u64, wmt: u64, minu: u64, maxu: u64, minv: u64, maxv: u64) -> u64 {
    (wms & 3)
        | (wmt & 3) << 2
        | (minu & 0x3FF) << 4
        | (maxu & 0x3FF) << 14
        | (minv & 0x3FF) << 24
        | (maxv & 0x3FF) << 34
}

// TEX1
pub const LOD_USE_K: u64 = 0;
pub const LOD_MAG_NEAREST: u64 = 0;
pub const LOD_MIN_NEAREST: u64 = 0;

pub const fn gs_tex1(lcm: u64, mxl: u64, mmag: u64, mmin: u64, mtba: u64, l: u64, k: u64) -> u64 {
    (lcm & 1)
        | (mxl & 7) << 2
        | (mmag & 1) << 5
        | (mmin & 7) << 6
        | (mtba & 1) << 9
        | (l & 3) << 19
        | (k & 0xFFF) << 32
}

// TEX0
pub const TEXTURE_COMPONENTS_RGBA: u64 = 1;
pub const TEXTURE_FUNCTION_MODULATE: u64 = 0;
pub const CLUT_STORAGE_MODE1: u64 = 0;
pub const CLUT_NO_LOAD: u64 = 0;

#[allow(clippy::too_many_arguments)]
pub const fn gs_tex0(
    tbp: u64,
    tbw: u64,
    psm: u64,
    tw: u64,
    th: u64,
    tcc: u64,
    tfx: u64,
    cbp: u64,
    cpsm: u64,
    csm: u64,
    csa: u64,
    cld: u64,
) -> u64 {
    (tbp & 0x3FFF)
        | (tbw & 0x3F) << 14
        | (psm & 0x3F) << 20
        | (tw & 0xF) << 26
        | (th & 0xF) << 30
        | (tcc & 1) << 34
        | (tfx & 3) << 35
        | (cbp & 0x3FFF) << 37
        | (cpsm & 0xF) << 51
        | (csm & 1) << 55
        | (csa & 0x1F) << 56
        | (cld & 7) << 61
}

pub const fn gs_scissor(x0: u64, x1: u64, y0: u64, y1: u64) -> u64 {
    (x0 & 0x7FF) | (x1 & 0x7FF) << 16 | (y0 & 0x7FF) << 32 | (y1 & 0x7FF) << 48
}

pub const fn gs_frame(fbp: u64, fbw: u64, psm: u64, fbmsk: u64) -> u64 {
    (fbp & 0x1FF) | (fbw & 0x3F) << 16 | (psm & 0x3F) << 24 | (fbmsk & 0xFFFF_FFFF) << 32
}

pub const fn gs_zbuf(zbp: u64, psm: u64, zmsk: bool) -> u64 {
    (zbp & 0x1FF) | (psm & 0xF) << 24 | (zmsk as u64) << 32
}

pub const fn gs_xyoffset(ofx: u64, ofy: u64) -> u64 {
    (ofx & 0xFFFF) | (ofy & 0xFFFF) << 32
}

pub const fn gs_xyz(x: u16, y: u16, z: u32) -> u64 {
    x as u64 | (y as u64) << 16 | (z as u64) << 32
}

pub fn gs_rgbaq(col: u32, q: f32) -> u64 {
    col as u64 | (q.to_bits() as u64) << 32
}

pub fn gs_st(s: f32, t: f32) -> u64 {
    s.to_bits() as u64 | (t.to_bits() as u64) << 32
}

pub const fn gs_bitbltbuf(sbp: u64, sbw: u64, spsm: u64, dbp: u64, dbw: u64, dpsm: u64) -> u64 {
    (sbp & 0x3FFF)
        | (sbw & 0x3F) << 16
        | (spsm & 0x3F) << 24
        | (dbp & 0x3FFF) << 32
        | (dbw & 0x3F) << 48
        | (dpsm & 0x3F) << 56
}

pub const fn gs_trxpos(ssax: u64, ssay: u64, dsax: u64, dsay: u64, dir: u64) -> u64 {
    (ssax & 0x7FF) | (ssay & 0x7FF) << 16 | (dsax & 0x7FF) << 32 | (dsay & 0x7FF) << 48 | (dir & 3) << 59
}

pub const fn gs_trxreg(rrw: u64, rrh: u64) -> u64 {
    (rrw & 0xFFF) | (rrh & 0xFFF) << 32
}

/// Host to local memory.
pub const TRXDIR_HOST_TO_LOCAL: u64 = 0;

// ── DMA tags ────────────────────────────────────────────────────

pub const DMA_TAG_ID_CNT: u64 = 1;
pub const DMA_TAG_ID_END: u64 = 7;

pub const fn dma_tag(qwc: u64, pce: u64, id: u64, irq: bool, addr: u64, spr: bool) -> u64 {
    (qwc & 0xFFFF)
        | (pce & 3) << 26
        | (id & 7) << 28
        | (irq as u64) << 31
        | (addr & 0x7FFF_FFFF) << 32
        | (spr as u64) << 63
}

/// Chain-ending tag followed by `qwc` qwords of payload.
pub const fn dma_tag_end(qwc: u64) -> u64 {
    dma_tag(qwc, 0, DMA_TAG_ID_END, false, 0, false)
}

/// Float to 12.4 fixed point.
pub const fn ftoi4(x: i32) -> i32 {
    x << 4
}
