//! Integration tests for VulkanBackend
//!
//! These tests drive the engine against a real Vulkan driver.
//! All tests require a GPU and are marked with #[ignore].
//!
//! Run with: cargo test --test vulkan_backend_tests -- --ignored

use std::path::Path;
use std::sync::Arc;

use mcvk_engine::accelerator::select_best_accelerator;
use mcvk_engine::context::LogicalContext;
use mcvk_engine::mcvk::backend::GraphicsBackend;
use mcvk_engine::mcvk::{Config, DrawableSize, Error, FileShaderLoader, Renderer, ShaderBytecode};
use mcvk_engine::swapchain::Swapchain;
use mcvk_engine::sync::create_fence;
use mcvk_engine_vulkan::{VulkanBackend, VulkanInstance};
use winit::event_loop::EventLoop;
use winit::window::Window;

/// Helper to create a hidden test window
#[allow(deprecated)]
fn create_test_window() -> (Window, EventLoop<()>) {
    let event_loop = EventLoop::new().unwrap();
    let window_attrs = Window::default_attributes()
        .with_title("mcvk Vulkan Test")
        .with_inner_size(winit::dpi::PhysicalSize::new(500, 500))
        .with_visible(false);
    let window = event_loop.create_window(window_attrs).unwrap();
    (window, event_loop)
}

struct WindowSize<'a>(&'a Window);

impl DrawableSize for WindowSize<'_> {
    fn drawable_size(&self) -> (u32, u32) {
        let size = self.0.inner_size();
        (size.width, size.height)
    }
}

fn create_backend(window: &Window) -> Arc<VulkanBackend> {
    let config = Config::default().with_validation(false);
    VulkanBackend::new(VulkanInstance::new(window, &config).unwrap())
}

// ============================================================================
// INSTANCE / ACCELERATOR TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_instance_creates_surface() {
    let (window, _event_loop) = create_test_window();
    let backend = create_backend(&window);

    assert!(!backend.surface().is_null());
    assert!(!backend.instance().validation_enabled());
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_select_accelerator() {
    let (window, _event_loop) = create_test_window();
    let backend = create_backend(&window);

    let selection = select_best_accelerator(backend.as_ref(), backend.surface()).unwrap();

    assert!(selection.chosen.meets_requirements());
    assert!(!selection.chosen.name.is_empty());
    assert!(selection.chosen.queue_family_indices.is_complete());
}

// ============================================================================
// CONTEXT / SWAPCHAIN TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_context_and_swapchain_lifecycle() {
    let (window, _event_loop) = create_test_window();
    let backend = create_backend(&window);
    let selection = select_best_accelerator(backend.as_ref(), backend.surface()).unwrap();
    let indices = selection.chosen.queue_family_indices;

    let backend_dyn: Arc<dyn GraphicsBackend> = backend.clone();
    let mut context = LogicalContext::create(backend_dyn, &selection.chosen).unwrap();
    assert_eq!(backend.live_device_count(), 1);

    {
        let mut swapchain = Swapchain::create(
            &selection.chosen,
            backend.surface(),
            &WindowSize(&window),
            &indices,
            &context,
        )
        .unwrap();
        assert!(swapchain.is_compatible());
        assert!(swapchain.size() >= 1);
        assert_eq!(swapchain.image_view_count(), swapchain.size());

        let mut fence = create_fence(&context, true).unwrap();
        fence.wait(&context).unwrap();
        fence.reset(&context).unwrap();
        fence.release();

        swapchain.destroy();
    }

    context.wait_idle().unwrap();
    context.destroy();
    assert_eq!(backend.live_device_count(), 0);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_rejects_invalid_spirv() {
    let (window, _event_loop) = create_test_window();
    let backend = create_backend(&window);
    let selection = select_best_accelerator(backend.as_ref(), backend.surface()).unwrap();
    let backend_dyn: Arc<dyn GraphicsBackend> = backend.clone();
    let mut context = LogicalContext::create(backend_dyn, &selection.chosen).unwrap();

    let result = backend.create_shader_module(context.device(), &[1, 2, 3]);

    assert!(matches!(result, Err(Error::InvalidResource(_))));
    context.destroy();
}

// ============================================================================
// FRAME LOOP TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU and compiled demo shaders
fn test_vulkan_renderer_draws_frames() {
    let shader_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../mcvk_demo/shaders");
    let (vertex, fragment) = (shader_dir.join("vert.spv"), shader_dir.join("frag.spv"));
    if !vertex.exists() || !fragment.exists() {
        eprintln!("compiled shaders not found in {}, skipping", shader_dir.display());
        return;
    }

    let (window, _event_loop) = create_test_window();
    let backend = create_backend(&window);
    let shaders = ShaderBytecode::load(&FileShaderLoader, &vertex, &fragment).unwrap();
    let backend_dyn: Arc<dyn GraphicsBackend> = backend.clone();

    let mut renderer = Renderer::new(backend_dyn, backend.surface(), &WindowSize(&window), &shaders).unwrap();
    for _ in 0..3 {
        renderer.draw_frame().unwrap();
    }
    renderer.shutdown();

    assert_eq!(renderer.stats().frames_submitted, 3);
    assert_eq!(backend.live_device_count(), 0);
}
