mod buffers;
mod context;
mod render;

pub use buffers::{FieldUniform, SieveBuffers};
pub use context::GpuContext;
pub use render::RenderPipeline;
