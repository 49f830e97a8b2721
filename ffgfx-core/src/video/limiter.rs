//! Frame pacing: enforces a minimum time between end-of-frame calls.
use std::time::{Duration, Instant};

pub struct FrameLimiter {
    last_frame: Instant,
    min_frame_ns: u64,
    frames: u32,
}

impl FrameLimiter {
    pub fn new(min_frame_ms: f32) -> Self {
        Self {
            last_frame: Instant::now(),
            min_frame_ns: Self::to_ns(min_frame_ms),
            frames: 0,
        }
    }

    fn to_ns(ms: f32) -> u64 {
        (ms.max(0.0) as f64 * 1_000_000.0) as u64
    }

    pub fn set_min_frame_ms(&mut self, ms: f32) {
        self.min_frame_ns = Self::to_ns(ms);
    }

    pub fn is_enabled(&self) -> bool {
        self.min_frame_ns > 0
    }

    /// Block until at least the minimum frame time has passed since the
    /// previous call. Returns the time spent waiting.
    pub fn wait(&mut self) -> Duration {
        let start = Instant::now();
        let elapsed = self.last_frame.elapsed().as_nanos() as u64;
        if elapsed < self.min_frame_ns {
            let remaining = self.min_frame_ns - elapsed;
            // Sleep most of it, spin the rest
            if remaining > 1_000_000 {
                std::thread::sleep(Duration::from_nanos(remaining - 500_000));
            }
            while (self.last_frame.elapsed().as_nanos() as u64) < self.min_frame_ns {
                std::hint::spin_loop();
            }
        }
        self.last_frame = Instant::now();
        self.frames = self.frames.wrapping_add(1);
        start.elapsed()
    }

    /// Restart the measurement without waiting.
    pub fn reset(&mut self) {
        self.last_frame = Instant::now();
    }

    pub fn frame_count(&self) -> u32 {
        self.frames
    }
}
