//! Display pacing
pub mod limiter;

pub use limiter::FrameLimiter;
