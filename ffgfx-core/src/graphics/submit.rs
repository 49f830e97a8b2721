//! Double-buffered command submission.
//!
//! Two command buffers, two colour surfaces. `context` names the pair being
//! filled and rendered to; the other surface is on screen. A segment is
//! handed to the device with `send_chain` and always waited for with
//! `wait_transfer` before its storage is written again, so the producer
//! never touches memory the transfer engine is still reading.

use crate::graphics::command::{CommandBuffer, Overflow};
use crate::graphics::target::HardwareTarget;
use crate::hardware::{DisplaySurface, GpuDevice};
use log::{debug, trace};

pub struct Submitter {
    buffers: [CommandBuffer; 2],
    surfaces: [DisplaySurface; 2],
    context: usize,
    threshold_dwords: usize,
    /// Cursor of a freshly opened segment.
    base: usize,
    chains: usize,
}

impl Submitter {
    pub fn new(
        packet_qwords: usize,
        threshold_qwords: usize,
        surfaces: [DisplaySurface; 2],
    ) -> Self {
        Self {
            buffers: [
                CommandBuffer::new(packet_qwords),
                CommandBuffer::new(packet_qwords),
            ],
            surfaces,
            context: 0,
            threshold_dwords: threshold_qwords * 2,
            base: 0,
            chains: 0,
        }
    }

    pub fn context(&self) -> usize {
        self.context
    }

    /// Surface the current buffer draws into.
    pub fn render_surface(&self) -> &DisplaySurface {
        &self.surfaces[self.context]
    }

    /// Surface the display shows while the current frame is built.
    pub fn display_surface(&self) -> &DisplaySurface {
        &self.surfaces[self.context ^ 1]
    }

    pub fn current(&self) -> &CommandBuffer {
        &self.buffers[self.context]
    }

    pub fn current_mut(&mut self) -> &mut CommandBuffer {
        &mut self.buffers[self.context]
    }

    /// Chains handed to the device so far.
    pub fn chains_sent(&self) -> usize {
        self.chains
    }

    /// Open a fresh segment in the current buffer.
    pub fn start<T: HardwareTarget + ?Sized>(&mut self, target: &mut T) -> Result<(), Overflow> {
        let cmd = &mut self.buffers[self.context];
        cmd.clear();
        target.begin_segment(cmd)?;
        self.base = cmd.cursor();
        Ok(())
    }

    /// Dwords an empty segment offers once its terminator is accounted for.
    pub fn segment_space<T: HardwareTarget + ?Sized>(&self, target: &T) -> usize {
        let capacity = self.current().capacity_qwords() * 2;
        capacity.saturating_sub(self.base + target.terminate_dwords())
    }

    pub fn over_threshold(&self) -> bool {
        self.current().cursor() > self.threshold_dwords
    }

    /// Whether `dwords` more still leave room to close the segment.
    pub fn fits<T: HardwareTarget + ?Sized>(&self, target: &T, dwords: usize) -> bool {
        dwords + target.terminate_dwords() <= self.current().remaining_dwords()
    }

    fn send<T, D>(&mut self, target: &mut T, device: &mut D) -> Result<(), Overflow>
    where
        T: HardwareTarget + ?Sized,
        D: GpuDevice + ?Sized,
    {
        let cmd = &mut self.buffers[self.context];
        target.terminate(cmd)?;
        trace!(
            "Sending segment from buffer {} ({} qwords)",
            self.context,
            cmd.len_qwords()
        );
        device.send_chain(cmd.words());
        device.wait_transfer();
        self.chains += 1;
        Ok(())
    }

    /// Close and transfer the current segment, then reopen the same buffer.
    /// Does not flip.
    pub fn flush<T, D>(&mut self, target: &mut T, device: &mut D) -> Result<(), Overflow>
    where
        T: HardwareTarget + ?Sized,
        D: GpuDevice + ?Sized,
    {
        self.send(target, device)?;
        self.start(target)
    }

    /// Retarget rendering at the other surface, close the frame's last
    /// segment and transfer it.
    pub fn finish_frame<T, D>(&mut self, target: &mut T, device: &mut D) -> Result<(), Overflow>
    where
        T: HardwareTarget + ?Sized,
        D: GpuDevice + ?Sized,
    {
        let next = self.surfaces[self.context ^ 1];
        target.write_frame_end(&mut self.buffers[self.context], &next)?;
        self.send(target, device)
    }

    /// Show the finished surface, swap roles and open the next frame's
    /// first segment.
    pub fn present_and_flip<T, D>(&mut self, target: &mut T, device: &mut D) -> Result<(), Overflow>
    where
        T: HardwareTarget + ?Sized,
        D: GpuDevice + ?Sized,
    {
        device.set_display_surface(&self.surfaces[self.context]);
        self.context ^= 1;
        debug!("Flipped to context {}", self.context);
        self.start(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::gs::GsTarget;
    use crate::hardware::{DeviceEvent, PixelFormat, RecordingDevice};

    fn surfaces() -> [DisplaySurface; 2] {
        let s = DisplaySurface {
            address: 0,
            width: 640,
            height: 448,
            psm: PixelFormat::Psm32,
            mask: 0,
        };
        [
            s,
            DisplaySurface {
                address: 640 * 448,
                ..s
            },
        ]
    }

    #[test]
    fn flip_alternates_and_never_renders_to_displayed() {
        let mut gs = GsTarget::new();
        let mut dev = RecordingDevice::new();
        let mut sub = Submitter::new(256, 200, surfaces());
        sub.start(&mut gs).unwrap();
        for frame in 0..4 {
            assert_eq!(sub.context(), frame % 2);
            sub.finish_frame(&mut gs, &mut dev).unwrap();
            sub.present_and_flip(&mut gs, &mut dev).unwrap();
            let shown = dev.displayed().unwrap().address;
            assert_ne!(shown, sub.render_surface().address);
            assert_eq!(shown, sub.display_surface().address);
        }
        assert_eq!(dev.hazards(), 0);
        assert_eq!(sub.chains_sent(), 4);
    }

    #[test]
    fn flush_reopens_same_buffer() {
        let mut gs = GsTarget::new();
        let mut dev = RecordingDevice::new();
        let mut sub = Submitter::new(64, 32, surfaces());
        sub.start(&mut gs).unwrap();
        sub.current_mut().extend(&[0; 4]).unwrap();
        sub.flush(&mut gs, &mut dev).unwrap();
        assert_eq!(sub.context(), 0);
        // Only the blank DMA tag of the new segment.
        assert_eq!(sub.current().cursor(), 2);
        assert_eq!(
            dev.events(),
            &[DeviceEvent::Chain(0), DeviceEvent::WaitTransfer]
        );
    }

    #[test]
    fn threshold_and_fit_checks() {
        let mut gs = GsTarget::new();
        let mut sub = Submitter::new(16, 4, surfaces());
        sub.start(&mut gs).unwrap();
        assert!(!sub.over_threshold());
        sub.current_mut().extend(&[0; 8]).unwrap();
        assert!(sub.over_threshold());
        // 32 dwords total, 10 used, one kept for the terminator
        assert!(sub.fits(&gs, 21));
        assert!(!sub.fits(&gs, 22));
        // blank DMA tag and END padding
        assert_eq!(sub.segment_space(&gs), 32 - 2 - 1);
    }
}
