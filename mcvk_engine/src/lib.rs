/*!
# mcvk Engine

Frame lifecycle and resource ownership for a single-pipeline rasterizer.

Every GPU call goes through the [`GraphicsBackend`](device::GraphicsBackend)
trait; the Vulkan implementation lives in `mcvk_engine_vulkan`. This crate
owns the ordering rules: which object is built from which, who releases it,
and in what order.

## Architecture

- **accelerator**: queue family discovery and best-accelerator selection
- **context**: logical device, its two queues and the capability token
  every dependent holds
- **swapchain**: presentable images, views, framebuffers and the
  image-available semaphore
- **pipeline**: render pass, pipeline layout and graphics pipeline
- **sync**: fences and semaphores
- **frame**: command pool, command buffer and the record/submit/present step
- **renderer**: builds everything in dependency order and drives the loop
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod lifecycle;
pub mod log;
pub mod device;
pub mod accelerator;
pub mod context;
pub mod sync;
pub mod swapchain;
pub mod shader;
pub mod pipeline;
pub mod frame;
pub mod window;
pub mod renderer;

#[cfg(test)]
mod test_support;

// Main mcvk namespace module
pub mod mcvk {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine services
    pub use crate::engine::Engine;
    pub use crate::config::{Config, DebugSeverity};

    // Frame loop
    pub use crate::renderer::{FrameStats, Renderer};
    pub use crate::frame::PresentOutcome;
    pub use crate::shader::{FileShaderLoader, ShaderBytecode, ShaderLoader};
    pub use crate::window::{DrawableSize, Window};

    // Logging sub-module (types only; the engine_* macros are exported at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Backend seam
    pub mod backend {
        pub use crate::device::*;
    }
}
