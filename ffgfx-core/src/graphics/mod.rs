pub mod backend;
pub mod clip;
pub mod command;
pub mod draw;
pub mod gs;
pub mod math;
pub mod pvr;
pub mod state;
pub mod submit;
pub mod target;
pub mod vertex;

pub use backend::{Backend, FrameStats, MatrixSlot};
pub use clip::Viewport;
pub use command::CommandBuffer;
pub use gs::GsTarget;
pub use math::Matrix;
pub use pvr::PvrTarget;
pub use state::{ColorMask, Rect, RenderState};
pub use target::HardwareTarget;
pub use vertex::{VertexColoured, VertexFormat, VertexTextured};
