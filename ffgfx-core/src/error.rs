//! Backend error types.
//!
//! Resource calls (texture and vertex buffer creation, locking, region
//! updates) return [`Result`]. State setters and draw calls are infallible:
//! command-buffer overflow is absorbed by a forced mid-frame flush and never
//! reaches the caller.

use crate::graphics::command::Overflow;
use thiserror::Error;

/// Kind of resource a handle refers to, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Texture,
    VertexBuffer,
    Vram,
    CommandBuffer,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Texture => write!(f, "texture"),
            Self::VertexBuffer => write!(f, "vertex buffer"),
            Self::Vram => write!(f, "video memory"),
            Self::CommandBuffer => write!(f, "command buffer"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GfxError {
    /// Texture or vertex storage could not be reserved.
    ///
    /// Returned instead of aborting, so the caller can fall back (drop
    /// detail, free something, retry later).
    #[error("allocation failure: {bytes} bytes for {what}")]
    AllocationFailure { what: ResourceKind, bytes: usize },

    /// The hardware path has no implementation for this operation.
    #[error("operation not supported: {0}")]
    UnsupportedOperation(&'static str),

    /// Handle was deleted or never issued by this backend.
    #[error("invalid {kind} handle {id}")]
    InvalidHandle { kind: ResourceKind, id: u32 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Only one-off packets built outside the draw path can surface this.
impl From<Overflow> for GfxError {
    fn from(err: Overflow) -> Self {
        GfxError::AllocationFailure {
            what: ResourceKind::CommandBuffer,
            bytes: err.needed * 8,
        }
    }
}

pub type Result<T> = std::result::Result<T, GfxError>;
