//! Tile accelerator command words and polygon header fields

pub const PVR_CMD_POLYHDR: u32 = 0x8084_0000;
pub const PVR_CMD_VERTEX: u32 = 0xE000_0000;
pub const PVR_CMD_VERTEX_EOL: u32 = 0xF000_0000;
pub const PVR_CMD_USERCLIP: u32 = 0x2000_0000;
/// A zeroed 32-byte block closes the current list.
pub const PVR_CMD_EOL: u32 = 0;

// cmd word
pub const PVR_TA_CMD_TYPE_SHIFT: u32 = 24;
pub const PVR_TA_CMD_TYPE_MASK: u32 = 7 << PVR_TA_CMD_TYPE_SHIFT;
pub const PVR_TA_CMD_USERCLIP_SHIFT: u32 = 16;
pub const PVR_TA_CMD_USERCLIP_MASK: u32 = 3 << PVR_TA_CMD_USERCLIP_SHIFT;
pub const PVR_TA_CMD_CLRFMT_SHIFT: u32 = 4;
pub const PVR_TA_CMD_CLRFMT_MASK: u32 = 7 << PVR_TA_CMD_CLRFMT_SHIFT;
pub const PVR_TA_CMD_SHADE_SHIFT: u32 = 1;
pub const PVR_TA_CMD_SHADE_MASK: u32 = 1 << PVR_TA_CMD_SHADE_SHIFT;
pub const PVR_TA_CMD_UVFMT_SHIFT: u32 = 0;
pub const PVR_TA_CMD_UVFMT_MASK: u32 = 1 << PVR_TA_CMD_UVFMT_SHIFT;
/// Six-vertex strip length, always forced on.
pub const PVR_TA_CMD_STRIP6: u32 = 0xC_0000;

// mode 1
pub const PVR_TA_PM1_DEPTHCMP_SHIFT: u32 = 29;
pub const PVR_TA_PM1_DEPTHCMP_MASK: u32 = 7 << PVR_TA_PM1_DEPTHCMP_SHIFT;
pub const PVR_TA_PM1_CULLING_SHIFT: u32 = 27;
pub const PVR_TA_PM1_CULLING_MASK: u32 = 3 << PVR_TA_PM1_CULLING_SHIFT;
pub const PVR_TA_PM1_DEPTHWRITE_SHIFT: u32 = 26;
pub const PVR_TA_PM1_DEPTHWRITE_MASK: u32 = 1 << PVR_TA_PM1_DEPTHWRITE_SHIFT;
pub const PVR_TA_PM1_TXRENABLE_SHIFT: u32 = 25;
pub const PVR_TA_PM1_TXRENABLE_MASK: u32 = 1 << PVR_TA_PM1_TXRENABLE_SHIFT;

// mode 2
pub const PVR_TA_PM2_SRCBLEND_SHIFT: u32 = 29;
pub const PVR_TA_PM2_SRCBLEND_MASK: u32 = 7 << PVR_TA_PM2_SRCBLEND_SHIFT;
pub const PVR_TA_PM2_DSTBLEND_SHIFT: u32 = 26;
pub const PVR_TA_PM2_DSTBLEND_MASK: u32 = 7 << PVR_TA_PM2_DSTBLEND_SHIFT;
pub const PVR_TA_PM2_FOG_SHIFT: u32 = 22;
pub const PVR_TA_PM2_FOG_MASK: u32 = 3 << PVR_TA_PM2_FOG_SHIFT;
pub const PVR_TA_PM2_CLAMP_SHIFT: u32 = 21;
pub const PVR_TA_PM2_CLAMP_MASK: u32 = 1 << PVR_TA_PM2_CLAMP_SHIFT;
pub const PVR_TA_PM2_ALPHA_SHIFT: u32 = 20;
pub const PVR_TA_PM2_ALPHA_MASK: u32 = 1 << PVR_TA_PM2_ALPHA_SHIFT;
pub const PVR_TA_PM2_TXRALPHA_SHIFT: u32 = 19;
pub const PVR_TA_PM2_TXRALPHA_MASK: u32 = 1 << PVR_TA_PM2_TXRALPHA_SHIFT;
pub const PVR_TA_PM2_FILTER_SHIFT: u32 = 12;
pub const PVR_TA_PM2_FILTER_MASK: u32 = 3 << PVR_TA_PM2_FILTER_SHIFT;
pub const PVR_TA_PM2_TXRENV_SHIFT: u32 = 6;
pub const PVR_TA_PM2_TXRENV_MASK: u32 = 3 << PVR_TA_PM2_TXRENV_SHIFT;
pub const PVR_TA_PM2_USIZE_SHIFT: u32 = 3;
pub const PVR_TA_PM2_USIZE_MASK: u32 = 7 << PVR_TA_PM2_USIZE_SHIFT;
pub const PVR_TA_PM2_VSIZE_SHIFT: u32 = 0;
pub const PVR_TA_PM2_VSIZE_MASK: u32 = 7 << PVR_TA_PM2_VSIZE_SHIFT;

// Field values
pub const PVR_LIST_OP_POLY: u32 = 0;
pub const PVR_LIST_TR_POLY: u32 = 2;
pub const PVR_LIST_PT_POLY: u32 = 4;

pub const PVR_CLRFMT_ARGBPACKED: u32 = 0;
pub const PVR_SHADE_GOURAUD: u32 = 1;
pub const PVR_UVFMT_32BIT: u32 = 0;

pub const PVR_USERCLIP_DISABLE: u32 = 0;
pub const PVR_USERCLIP_INSIDE: u32 = 2;

pub const PVR_DEPTHCMP_LEQUAL: u32 = 3;
pub const PVR_DEPTHCMP_GEQUAL: u32 = 6;
pub const PVR_DEPTHCMP_ALWAYS: u32 = 7;

pub const PVR_CULLING_SMALL: u32 = 1;
pub const PVR_CULLING_CW: u32 = 3;

pub const PVR_DEPTHWRITE_ENABLE: u32 = 0;
pub const PVR_DEPTHWRITE_DISABLE: u32 = 1;

pub const PVR_TEXTURE_DISABLE: u32 = 0;
pub const PVR_TEXTURE_ENABLE: u32 = 1;

pub const PVR_BLEND_ZERO: u32 = 0;
pub const PVR_BLEND_ONE: u32 = 1;
pub const PVR_BLEND_SRCALPHA: u32 = 4;
pub const PVR_BLEND_INVSRCALPHA: u32 = 5;

pub const PVR_FOG_DISABLE: u32 = 2;
pub const PVR_CLRCLAMP_DISABLE: u32 = 0;

pub const PVR_ALPHA_DISABLE: u32 = 0;
pub const PVR_ALPHA_ENABLE: u32 = 1;

pub const PVR_TXRALPHA_ENABLE: u32 = 0;
pub const PVR_TXRALPHA_DISABLE: u32 = 1;

pub const PVR_FILTER_NEAREST: u32 = 0;
pub const PVR_TXRENV_MODULATEALPHA: u32 = 3;

/// Mode 3 texture format word: ARGB4444, stored row-major.
pub const PVR_TXRFMT_ARGB4444: u32 = 2 << 27;
pub const PVR_TXRFMT_NONTWIDDLED: u32 = 1 << 26;

/// Texture dimension field: 8 -> 0 through 1024 -> 7.
pub const fn dimension_flag(size: u32) -> u32 {
    let s = if size > 8 { size } else { 8 };
    let log2 = 31 - s.leading_zeros();
    log2 - 3
}

/// Pack a 32-bit RGBA colour (R in the low byte) into ARGB order.
pub const fn to_argb(col: u32) -> u32 {
    let r = col & 0xFF;
    let g = (col >> 8) & 0xFF;
    let b = (col >> 16) & 0xFF;
    let a = col >> 24;
    a << 24 | r << 16 | g << 8 | b
}

/// Reduce a 32-bit RGBA colour to ARGB4444.
pub const fn to_argb4444(col: u32) -> u16 {
    let r = (col & 0xFF) >> 4;
    let g = ((col >> 8) & 0xFF) >> 4;
    let b = ((col >> 16) & 0xFF) >> 4;
    let a = (col >> 24) >> 4;
    (a << 12 | r << 8 | g << 4 | b) as u16
}

/// Two 32-bit words into one little-endian dword.
pub const fn pack2(lo: u32, hi: u32) -> u64 {
    lo as u64 | (hi as u64) << 32
}

/// Texture memory is written by DMA outside the TA. The block opens with
/// one dword naming the destination byte address and the byte count.
pub const fn txr_dma_header(address_bytes: u32, length_bytes: u32) -> u64 {
    pack2(address_bytes, length_bytes)
}
