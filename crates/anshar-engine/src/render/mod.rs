//! GPU rendering subsystem.
//!
//! The scene renderer owns every GPU resource derived from a loaded scene
//! (vertex buffers, textures, uniform buffers, the pipeline) and issues draw
//! calls via wgpu. Geometry it does not own; scenes stay immutable on the CPU
//! side after upload.

mod ctx;
mod scene_renderer;

pub use ctx::{RenderCtx, RenderTarget};
pub use scene_renderer::SceneRenderer;
