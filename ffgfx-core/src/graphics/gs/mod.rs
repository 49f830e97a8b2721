//! Graphics Synthesizer target
pub mod decode;
pub mod regs;
pub mod target;

pub use target::GsTarget;
