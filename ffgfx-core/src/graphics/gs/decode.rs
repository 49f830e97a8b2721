//! Decoder for the DMA chains `GsTarget` produces.
//!
//! Walks CNT/END tags and the GIF packets inside them, turning A+D writes,
//! REGLIST batches and IMAGE transfers back into typed commands. Used by the
//! tests and the CLI to inspect what reached the device.

use super::regs::*;
use smallvec::SmallVec;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("chain truncated at dword {at}")]
    Truncated { at: usize },
    #[error("unsupported DMA tag id {id} at dword {at}")]
    UnsupportedTag { id: u64, at: usize },
    #[error("unsupported GIF packet at dword {at}")]
    UnsupportedPacket { at: usize },
}

/// One vertex of a REGLIST batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GsVertex {
    pub rgbaq: u64,
    pub st: Option<u64>,
    pub xyz: u64,
}

impl GsVertex {
    /// 12.4 fixed-point X.
    pub fn x(&self) -> u16 {
        self.xyz as u16
    }

    pub fn y(&self) -> u16 {
        (self.xyz >> 16) as u16
    }

    pub fn z(&self) -> u32 {
        (self.xyz >> 32) as u32
    }

    pub fn col(&self) -> u32 {
        self.rgbaq as u32
    }

    pub fn q(&self) -> f32 {
        f32::from_bits((self.rgbaq >> 32) as u32)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GsCommand {
    /// A+D write of `value` to general register `reg`.
    Register { reg: u64, value: u64 },
    /// One REGLIST batch.
    Vertices { vertices: Vec<GsVertex> },
    /// Host-to-local image data, in dwords.
    Image { data: Vec<u64> },
}

fn read(words: &[u64], at: usize) -> Result<u64, DecodeError> {
    words.get(at).copied().ok_or(DecodeError::Truncated { at })
}

/// Decode a complete chain, following CNT tags until END.
pub fn decode_chain(words: &[u64]) -> Result<Vec<GsCommand>, DecodeError> {
    let mut out = Vec::new();
    let mut at = 0;
    loop {
        let tag = read(words, at)?;
        let qwc = (tag & 0xFFFF) as usize;
        let id = (tag >> 28) & 7;
        let start = at + 2;
        let end = start + qwc * 2;
        if end > words.len() {
            return Err(DecodeError::Truncated { at: words.len() });
        }
        decode_gif(&words[start..end], start, &mut out)?;
        match id {
            DMA_TAG_ID_END => return Ok(out),
            DMA_TAG_ID_CNT => at = end,
            _ => return Err(DecodeError::UnsupportedTag { id, at }),
        }
    }
}

/// Decode GIF packets. `base` is only used for error positions.
pub fn decode_gif(
    words: &[u64],
    base: usize,
    out: &mut Vec<GsCommand>,
) -> Result<(), DecodeError> {
    let mut i = 0;
    while i < words.len() {
        let tag = read(words, i)?;
        let regs_word = read(words, i + 1)?;
        let nloop = (tag & 0x7FFF) as usize;
        let flg = (tag >> 58) & 3;
        let nreg = match (tag >> 60) as usize {
            0 => 16,
            n => n,
        };
        let regs: SmallVec<[u64; 16]> = (0..nreg).map(|r| (regs_word >> (r * 4)) & 0xF).collect();
        i += 2;

        match flg {
            GIF_FLG_PACKED => {
                if nreg != 1 || regs[0] != GIF_REG_AD {
                    return Err(DecodeError::UnsupportedPacket { at: base + i - 2 });
                }
                for _ in 0..nloop {
                    let value = read(words, i)?;
                    let reg = read(words, i + 1)? & 0xFF;
                    out.push(GsCommand::Register { reg, value });
                    i += 2;
                }
            }
            GIF_FLG_REGLIST => {
                let mut vertices = Vec::with_capacity(nloop);
                for _ in 0..nloop {
                    let mut v = GsVertex::default();
                    for &reg in &regs {
                        let value = read(words, i)?;
                        match reg {
                            GIF_REG_RGBAQ => v.rgbaq = value,
                            GIF_REG_ST => v.st = Some(value),
                            GIF_REG_XYZ2 => v.xyz = value,
                            _ => return Err(DecodeError::UnsupportedPacket { at: base + i }),
                        }
                        i += 1;
                    }
                    vertices.push(v);
                }
                // REGLIST data is padded out to a whole qword.
                i += i % 2;
                out.push(GsCommand::Vertices { vertices });
            }
            GIF_FLG_IMAGE => {
                let end = i + nloop * 2;
                if end > words.len() {
                    return Err(DecodeError::Truncated { at: base + words.len() });
                }
                out.push(GsCommand::Image {
                    data: words[i..end].to_vec(),
                });
                i = end;
            }
            _ => return Err(DecodeError::UnsupportedPacket { at: base + i - 2 }),
        }
    }
    Ok(())
}

/// Values written to `reg`, in order.
pub fn register_writes(commands: &[GsCommand], reg: u64) -> Vec<u64> {
    commands
        .iter()
        .filter_map(|c| match c {
            GsCommand::Register { reg: r, value } if *r == reg => Some(*value),
            _ => None,
        })
        .collect()
}

/// Every REGLIST batch, in order.
pub fn batches(commands: &[GsCommand]) -> Vec<&[GsVertex]> {
    commands
        .iter()
        .filter_map(|c| match c {
            GsCommand::Vertices { vertices } => Some(vertices.as_slice()),
            _ => None,
        })
        .collect()
}

/// Texels carried by every IMAGE packet, unpacked to 32-bit pixels.
pub fn image_texels(commands: &[GsCommand]) -> Vec<u32> {
    commands
        .iter()
        .filter_map(|c| match c {
            GsCommand::Image { data } => Some(data),
            _ => None,
        })
        .flat_map(|data| data.iter().flat_map(|dw| [*dw as u32, (*dw >> 32) as u32]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::target::GsTarget;
    use super::*;
    use crate::graphics::command::CommandBuffer;
    use crate::graphics::state::Rect;
    use crate::graphics::target::HardwareTarget;

    #[test]
    fn decodes_register_writes() {
        let mut gs = GsTarget::new();
        let mut cmd = CommandBuffer::new(32);
        gs.begin_segment(&mut cmd).unwrap();
        gs.write_scissor(&mut cmd, Rect::new(8, 4, 100, 50)).unwrap();
        gs.terminate(&mut cmd).unwrap();

        let cmds = decode_chain(cmd.words()).unwrap();
        let scissor = register_writes(&cmds, GS_REG_SCISSOR_1);
        assert_eq!(scissor, vec![gs_scissor(8, 107, 4, 53)]);
    }

    #[test]
    fn truncated_chain_is_an_error() {
        let words = [dma_tag_end(4), 0, 0, 0];
        assert!(matches!(
            decode_chain(&words),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let words = [dma_tag(0, 0, 3, false, 0, false), 0];
        assert_eq!(
            decode_chain(&words),
            Err(DecodeError::UnsupportedTag { id: 3, at: 0 })
        );
    }
}
