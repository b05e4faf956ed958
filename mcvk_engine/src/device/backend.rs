/// GraphicsBackend trait - the seam between the engine and a graphics API
///
/// The engine owns ordering, ownership and policy; a backend only executes
/// calls. Device-level functions take the [`DeviceHandle`] they operate on.
/// Destroy functions are infallible and are never called on a null handle.

use crate::error::Result;
use super::handles::*;
use super::types::*;

/// Graphics API abstraction used by every engine component
pub trait GraphicsBackend: Send + Sync {
    // ===== ACCELERATORS =====

    /// List every physical accelerator visible to the instance
    fn enumerate_accelerators(&self) -> Result<Vec<PhysicalDeviceHandle>>;

    fn accelerator_properties(&self, accelerator: PhysicalDeviceHandle) -> AcceleratorProperties;

    /// Queue families in index order, with presentation support against `surface`
    fn queue_families(
        &self,
        accelerator: PhysicalDeviceHandle,
        surface: SurfaceHandle,
    ) -> Result<Vec<QueueFamilyProperties>>;

    // ===== DEVICE =====

    fn create_device(&self, accelerator: PhysicalDeviceHandle, desc: &DeviceDesc) -> Result<DeviceHandle>;

    fn destroy_device(&self, device: DeviceHandle);

    fn get_queue(&self, device: DeviceHandle, family_index: u32, queue_index: u32) -> QueueHandle;

    /// Block until every queue of the device is idle
    fn device_wait_idle(&self, device: DeviceHandle) -> Result<()>;

    // ===== SURFACE QUERIES =====

    fn surface_capabilities(
        &self,
        accelerator: PhysicalDeviceHandle,
        surface: SurfaceHandle,
    ) -> Result<SurfaceCapabilities>;

    fn surface_formats(
        &self,
        accelerator: PhysicalDeviceHandle,
        surface: SurfaceHandle,
    ) -> Result<Vec<SurfaceFormat>>;

    fn surface_present_modes(
        &self,
        accelerator: PhysicalDeviceHandle,
        surface: SurfaceHandle,
    ) -> Result<Vec<PresentMode>>;

    // ===== SWAPCHAIN =====

    fn create_swapchain(&self, device: DeviceHandle, desc: &SwapchainDesc) -> Result<SwapchainHandle>;

    fn destroy_swapchain(&self, device: DeviceHandle, swapchain: SwapchainHandle);

    /// Images owned by the swapchain, in presentation index order
    fn swapchain_images(&self, device: DeviceHandle, swapchain: SwapchainHandle) -> Result<Vec<ImageHandle>>;

    /// Acquire the next presentable image, signaling `signal` when it is ready
    fn acquire_next_image(
        &self,
        device: DeviceHandle,
        swapchain: SwapchainHandle,
        timeout: u64,
        signal: SemaphoreHandle,
    ) -> Result<AcquiredImage>;

    // ===== IMAGE VIEWS / FRAMEBUFFERS =====

    /// 2D color view with identity swizzle, one mip level and one layer
    fn create_image_view(&self, device: DeviceHandle, image: ImageHandle, format: PixelFormat) -> Result<ImageViewHandle>;

    fn destroy_image_view(&self, device: DeviceHandle, view: ImageViewHandle);

    /// Single-attachment, single-layer framebuffer
    fn create_framebuffer(
        &self,
        device: DeviceHandle,
        render_pass: RenderPassHandle,
        view: ImageViewHandle,
        extent: Extent2D,
    ) -> Result<FramebufferHandle>;

    fn destroy_framebuffer(&self, device: DeviceHandle, framebuffer: FramebufferHandle);

    // ===== PIPELINE =====

    fn create_render_pass(&self, device: DeviceHandle, desc: &RenderPassDesc) -> Result<RenderPassHandle>;

    fn destroy_render_pass(&self, device: DeviceHandle, render_pass: RenderPassHandle);

    fn create_shader_module(&self, device: DeviceHandle, bytecode: &[u8]) -> Result<ShaderModuleHandle>;

    fn destroy_shader_module(&self, device: DeviceHandle, module: ShaderModuleHandle);

    /// Layout with no descriptor sets and no push constants
    fn create_pipeline_layout(&self, device: DeviceHandle) -> Result<PipelineLayoutHandle>;

    fn destroy_pipeline_layout(&self, device: DeviceHandle, layout: PipelineLayoutHandle);

    fn create_graphics_pipeline(&self, device: DeviceHandle, desc: &GraphicsPipelineDesc) -> Result<PipelineHandle>;

    fn destroy_pipeline(&self, device: DeviceHandle, pipeline: PipelineHandle);

    // ===== SYNCHRONIZATION =====

    fn create_semaphore(&self, device: DeviceHandle) -> Result<SemaphoreHandle>;

    fn destroy_semaphore(&self, device: DeviceHandle, semaphore: SemaphoreHandle);

    fn create_fence(&self, device: DeviceHandle, signaled: bool) -> Result<FenceHandle>;

    fn destroy_fence(&self, device: DeviceHandle, fence: FenceHandle);

    fn wait_for_fence(&self, device: DeviceHandle, fence: FenceHandle, timeout: u64) -> Result<()>;

    fn reset_fence(&self, device: DeviceHandle, fence: FenceHandle) -> Result<()>;

    // ===== COMMANDS =====

    /// Pool whose buffers can be reset individually
    fn create_command_pool(&self, device: DeviceHandle, family_index: u32) -> Result<CommandPoolHandle>;

    /// Also frees every buffer allocated from the pool
    fn destroy_command_pool(&self, device: DeviceHandle, pool: CommandPoolHandle);

    /// Allocate one primary command buffer
    fn allocate_command_buffer(&self, device: DeviceHandle, pool: CommandPoolHandle) -> Result<CommandBufferHandle>;

    fn reset_command_buffer(&self, device: DeviceHandle, buffer: CommandBufferHandle) -> Result<()>;

    /// Begin recording for a single submission
    fn begin_command_buffer(&self, device: DeviceHandle, buffer: CommandBufferHandle) -> Result<()>;

    fn end_command_buffer(&self, device: DeviceHandle, buffer: CommandBufferHandle) -> Result<()>;

    fn cmd_begin_render_pass(&self, device: DeviceHandle, buffer: CommandBufferHandle, begin: &RenderPassBegin);

    fn cmd_bind_pipeline(&self, device: DeviceHandle, buffer: CommandBufferHandle, pipeline: PipelineHandle);

    fn cmd_set_viewport(&self, device: DeviceHandle, buffer: CommandBufferHandle, viewport: Viewport);

    fn cmd_set_scissor(&self, device: DeviceHandle, buffer: CommandBufferHandle, scissor: Rect2D);

    fn cmd_draw(
        &self,
        device: DeviceHandle,
        buffer: CommandBufferHandle,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    );

    fn cmd_end_render_pass(&self, device: DeviceHandle, buffer: CommandBufferHandle);

    // ===== QUEUES =====

    fn queue_submit(&self, device: DeviceHandle, queue: QueueHandle, submit: &SubmitDesc) -> Result<()>;

    fn queue_present(&self, device: DeviceHandle, queue: QueueHandle, present: &PresentDesc) -> Result<()>;
}
