//! GPU-side collaborators: the transfer/display device and its local memory
pub mod recording;
pub mod vram;

pub use recording::{DeviceEvent, RecordingDevice};
pub use vram::VramAllocator;

/// Pixel storage mode of a surface or texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PixelFormat {
    Psm32 = 0x00,
    Psm24 = 0x01,
    Psm16 = 0x02,
    Psmz32 = 0x30,
}

/// A colour surface in GPU-local memory that can be rendered to and
/// scanned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySurface {
    /// Base address in 32-bit words.
    pub address: u32,
    pub width: u32,
    pub height: u32,
    pub psm: PixelFormat,
    /// Bits set here are protected from writes.
    pub mask: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthBuffer {
    /// Base address in 32-bit words.
    pub address: u32,
    pub psm: PixelFormat,
    /// Depth writes are suppressed while set.
    pub mask: bool,
}

/// The asynchronous consumer side: a transfer engine feeding the GPU, and
/// the display controller.
///
/// All calls come from the single producer thread. `send_chain` only starts
/// a transfer; the producer must call `wait_transfer` before touching the
/// source memory again.
pub trait GpuDevice {
    /// Start transferring a finalized command chain.
    fn send_chain(&mut self, words: &[u64]);

    /// Block until the transfer engine has drained the last chain. This is
    /// not a GPU-idle wait.
    fn wait_transfer(&mut self);

    fn wait_vsync(&mut self);

    /// Point the display output at `surface`.
    fn set_display_surface(&mut self, surface: &DisplaySurface);
}

impl<D: GpuDevice + ?Sized> GpuDevice for Box<D> {
    fn send_chain(&mut self, words: &[u64]) {
        (**self).send_chain(words)
    }

    fn wait_transfer(&mut self) {
        (**self).wait_transfer()
    }

    fn wait_vsync(&mut self) {
        (**self).wait_vsync()
    }

    fn set_display_surface(&mut self, surface: &DisplaySurface) {
        (**self).set_display_surface(surface)
    }
}
