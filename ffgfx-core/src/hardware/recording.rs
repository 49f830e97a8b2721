//! In-memory `GpuDevice` that records everything sent to it.
//!
//! Used by the tests and the CLI in place of real hardware. Transfers
//! complete instantly, but the device still tracks whether the producer
//! waited for each one before kicking the next: a chain sent while another
//! is in flight counts as a hazard.
use super::{DisplaySurface, GpuDevice};
use log::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Index into `RecordingDevice::transfers`.
    Chain(usize),
    WaitTransfer,
    WaitVsync,
    /// Display switched to the surface at this address.
    Display(u32),
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    transfers: Vec<Vec<u64>>,
    events: Vec<DeviceEvent>,
    displayed: Option<DisplaySurface>,
    in_flight: bool,
    hazards: usize,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every chain, in the order sent.
    pub fn transfers(&self) -> &[Vec<u64>] {
        &self.transfers
    }

    pub fn events(&self) -> &[DeviceEvent] {
        &self.events
    }

    pub fn displayed(&self) -> Option<&DisplaySurface> {
        self.displayed.as_ref()
    }

    /// Chains kicked while the previous one had not been waited for.
    pub fn hazards(&self) -> usize {
        self.hazards
    }

    pub fn count(&self, event: &DeviceEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn clear(&mut self) {
        self.transfers.clear();
        self.events.clear();
    }
}

impl GpuDevice for RecordingDevice {
    fn send_chain(&mut self, words: &[u64]) {
        if self.in_flight {
            self.hazards += 1;
        }
        self.in_flight = true;
        trace!("DMA chain {} ({} dwords)", self.transfers.len(), words.len());
        self.events.push(DeviceEvent::Chain(self.transfers.len()));
        self.transfers.push(words.to_vec());
    }

    fn wait_transfer(&mut self) {
        self.in_flight = false;
        self.events.push(DeviceEvent::WaitTransfer);
    }

    fn wait_vsync(&mut self) {
        self.events.push(DeviceEvent::WaitVsync);
    }

    fn set_display_surface(&mut self, surface: &DisplaySurface) {
        self.displayed = Some(*surface);
        self.events.push(DeviceEvent::Display(surface.address));
    }
}
