//! Immediate-mode rendering backend for fixed-function console GPUs.
//!
//! Vertices are transformed and guard-band tested on the CPU, packed into
//! hardware command packets, and handed to the GPU through a pair of
//! alternating command buffers. The register and packet formats of each GPU
//! live behind [`graphics::HardwareTarget`].

pub mod config;
pub mod error;
pub mod graphics;
pub mod hardware;
pub mod texture;
pub mod video;

pub use config::{BackendConfig, TargetKind};
pub use error::{GfxError, ResourceKind, Result};
pub use graphics::{Backend, FrameStats, GsTarget, MatrixSlot, PvrTarget};
pub use hardware::{GpuDevice, RecordingDevice};
pub use texture::{Bitmap, TextureId};
