// VIEW: Rendering and graphics
pub mod gpu_init;
pub mod pipelines;
pub mod render;
pub mod textures;
pub mod uniforms;

pub use gpu_init::GpuContext;
pub use render::{Overlay, Renderer};
