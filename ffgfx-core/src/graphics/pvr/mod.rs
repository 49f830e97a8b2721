//! PowerVR tile accelerator target
pub mod regs;
pub mod target;

pub use target::PvrTarget;
