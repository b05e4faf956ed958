/*!
# mcvk Engine - Vulkan Backend

Vulkan implementation of the mcvk engine's `GraphicsBackend`, built on `ash`.

[`VulkanInstance`] loads the library, creates the instance and the window
surface (through `ash-window`) and, with the `vulkan-validation` feature,
installs a debug messenger forwarding validation messages to the engine
logger. [`VulkanBackend`] owns the instance and implements every device call
the engine makes.

# Example

```no_run
use std::sync::Arc;
use mcvk_engine::mcvk::{Config, Renderer, ShaderBytecode};
use mcvk_engine::mcvk::backend::GraphicsBackend;
use mcvk_engine_vulkan::{VulkanBackend, VulkanInstance};
# fn run(window: &winit::window::Window, size: &dyn mcvk_engine::mcvk::DrawableSize) -> mcvk_engine::mcvk::Result<()> {
let config = Config::default();
let backend = VulkanBackend::new(VulkanInstance::new(window, &config)?);
let shaders = ShaderBytecode::from_config(&config)?;
let backend_dyn: Arc<dyn GraphicsBackend> = backend.clone();
let mut renderer = Renderer::new(backend_dyn, backend.surface(), size, &shaders)?;
renderer.draw_frame()?;
# Ok(())
# }
```
*/

mod vulkan_backend;
mod vulkan_debug;
mod vulkan_format;
mod vulkan_instance;

pub use vulkan_backend::VulkanBackend;
pub use vulkan_instance::{VulkanInstance, VALIDATION_LAYER};

// Re-export validation statistics
pub use vulkan_debug::{print_validation_stats_report, validation_stats, ValidationStats};
