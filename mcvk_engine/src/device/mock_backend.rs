/// Mock GraphicsBackend for unit tests (no GPU required)
///
/// Hands out unique handles, records every call, tracks which objects are
/// alive and flags destroy-after-destroy and destroy-after-device mistakes.
/// Any operation can be made to fail with [`MockBackend::fail_on`].

use std::sync::{Mutex, MutexGuard};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use super::backend::GraphicsBackend;
use super::handles::*;
use super::types::*;

// ============================================================================
// Mock Accelerator
// ============================================================================

/// Everything the mock reports about one physical accelerator
#[derive(Debug, Clone)]
pub struct MockAccelerator {
    pub properties: AcceleratorProperties,
    pub queue_families: Vec<QueueFamilyProperties>,
    pub capabilities: SurfaceCapabilities,
    pub formats: Vec<SurfaceFormat>,
    pub present_modes: Vec<PresentMode>,
}

pub const GIB: u64 = 1024 * 1024 * 1024;

impl MockAccelerator {
    pub fn new(name: &str, class: DeviceClass) -> Self {
        Self {
            properties: AcceleratorProperties {
                name: name.to_string(),
                class,
                geometry_shader: true,
                max_image_dimension_2d: 16384,
                memory_heaps: vec![
                    MemoryHeap { size: 16 * GIB, device_local: false },
                    MemoryHeap { size: 8 * GIB, device_local: true },
                ],
            },
            queue_families: vec![QueueFamilyProperties { graphics: true, presentation: true }],
            capabilities: SurfaceCapabilities {
                min_image_count: 2,
                max_image_count: 8,
                current_extent: Extent2D::new(800, 600),
                min_image_extent: Extent2D::new(1, 1),
                max_image_extent: Extent2D::new(4096, 4096),
            },
            formats: vec![
                SurfaceFormat { format: PixelFormat::B8G8R8A8_UNORM, color_space: ColorSpace::SrgbNonlinear },
                SurfaceFormat { format: PixelFormat::B8G8R8A8_SRGB, color_space: ColorSpace::SrgbNonlinear },
            ],
            present_modes: vec![PresentMode::Fifo, PresentMode::Mailbox],
        }
    }

    pub fn discrete(name: &str) -> Self {
        Self::new(name, DeviceClass::Discrete)
    }

    pub fn integrated(name: &str) -> Self {
        Self::new(name, DeviceClass::Integrated)
    }

    pub fn with_geometry_shader(mut self, supported: bool) -> Self {
        self.properties.geometry_shader = supported;
        self
    }

    pub fn with_max_image_dimension(mut self, dimension: u32) -> Self {
        self.properties.max_image_dimension_2d = dimension;
        self
    }

    pub fn with_heaps(mut self, heaps: Vec<MemoryHeap>) -> Self {
        self.properties.memory_heaps = heaps;
        self
    }

    /// Replace the heaps with a single device-local heap of `size` bytes
    pub fn with_device_local_heap(self, size: u64) -> Self {
        self.with_heaps(vec![MemoryHeap { size, device_local: true }])
    }

    pub fn with_queue_families(mut self, families: Vec<QueueFamilyProperties>) -> Self {
        self.queue_families = families;
        self
    }

    pub fn with_capabilities(mut self, capabilities: SurfaceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_formats(mut self, formats: Vec<SurfaceFormat>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_present_modes(mut self, modes: Vec<PresentMode>) -> Self {
        self.present_modes = modes;
        self
    }
}

// ============================================================================
// Mock Backend
// ============================================================================

#[derive(Default)]
struct MockState {
    accelerators: Vec<MockAccelerator>,
    next_handle: u64,
    failures: FxHashSet<&'static str>,
    calls: Vec<String>,

    /// raw handle -> kind, for every owned object currently alive
    live: FxHashMap<u64, &'static str>,
    destroyed: Vec<(&'static str, u64)>,
    double_destroys: Vec<(&'static str, u64)>,
    /// Objects destroyed through a device that was already gone
    orphan_destroys: Vec<(&'static str, u64)>,

    fences: FxHashMap<u64, bool>,
    swapchain_images: FxHashMap<u64, Vec<ImageHandle>>,
    next_image: u32,

    device_descs: Vec<DeviceDesc>,
    swapchain_descs: Vec<SwapchainDesc>,
    render_pass_descs: Vec<RenderPassDesc>,
    pipeline_descs: Vec<GraphicsPipelineDesc>,
    framebuffer_extents: Vec<Extent2D>,
    submits: Vec<SubmitDesc>,
    presents: Vec<PresentDesc>,
}

impl MockState {
    fn allocate(&mut self, kind: &'static str) -> u64 {
        self.next_handle += 1;
        let raw = 1000 + self.next_handle;
        self.live.insert(raw, kind);
        raw
    }

    fn release(&mut self, kind: &'static str, device: DeviceHandle, raw: u64) {
        self.calls.push(format!("destroy_{}", kind));
        if kind != "device" && !self.live.contains_key(&device.as_raw()) {
            self.orphan_destroys.push((kind, raw));
        }
        match self.live.remove(&raw) {
            Some(_) => self.destroyed.push((kind, raw)),
            None => self.double_destroys.push((kind, raw)),
        }
    }

    fn accelerator(&self, handle: PhysicalDeviceHandle) -> &MockAccelerator {
        &self.accelerators[(handle.as_raw() - 1) as usize]
    }
}

pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new(accelerators: Vec<MockAccelerator>) -> Self {
        Self {
            state: Mutex::new(MockState {
                accelerators,
                ..Default::default()
            }),
        }
    }

    /// One discrete accelerator with a single graphics+present family
    pub fn single() -> Self {
        Self::new(vec![MockAccelerator::discrete("Mock GPU")])
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    fn check(&self, op: &'static str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(op.to_string());
        if state.failures.contains(op) {
            Err(Error::BackendError(format!("mock failure: {}", op)))
        } else {
            Ok(())
        }
    }

    // ===== TEST CONTROLS =====

    /// Make every later call of `op` fail
    pub fn fail_on(&self, op: &'static str) {
        self.state().failures.insert(op);
    }

    pub fn clear_failure(&self, op: &'static str) {
        self.state().failures.remove(op);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Number of calls whose name starts with `prefix`
    pub fn call_count(&self, prefix: &str) -> usize {
        self.state().calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn live_count(&self, kind: &str) -> usize {
        self.state().live.values().filter(|k| **k == kind).count()
    }

    pub fn total_live(&self) -> usize {
        self.state().live.len()
    }

    pub fn is_live(&self, raw: u64) -> bool {
        self.state().live.contains_key(&raw)
    }

    /// Kinds of destroyed objects, in destruction order
    pub fn destroyed_kinds(&self) -> Vec<&'static str> {
        self.state().destroyed.iter().map(|(kind, _)| *kind).collect()
    }

    pub fn double_destroys(&self) -> Vec<(&'static str, u64)> {
        self.state().double_destroys.clone()
    }

    pub fn orphan_destroys(&self) -> Vec<(&'static str, u64)> {
        self.state().orphan_destroys.clone()
    }

    pub fn fence_signaled(&self, fence: FenceHandle) -> bool {
        self.state().fences.get(&fence.as_raw()).copied().unwrap_or(false)
    }

    /// Index returned by the next acquisition (wraps around the image count)
    pub fn set_next_image(&self, index: u32) {
        self.state().next_image = index;
    }

    pub fn last_device_desc(&self) -> Option<DeviceDesc> {
        self.state().device_descs.last().cloned()
    }

    pub fn last_swapchain_desc(&self) -> Option<SwapchainDesc> {
        self.state().swapchain_descs.last().cloned()
    }

    pub fn last_render_pass_desc(&self) -> Option<RenderPassDesc> {
        self.state().render_pass_descs.last().copied()
    }

    pub fn last_pipeline_desc(&self) -> Option<GraphicsPipelineDesc> {
        self.state().pipeline_descs.last().cloned()
    }

    pub fn framebuffer_extents(&self) -> Vec<Extent2D> {
        self.state().framebuffer_extents.clone()
    }

    pub fn submits(&self) -> Vec<SubmitDesc> {
        self.state().submits.clone()
    }

    pub fn presents(&self) -> Vec<PresentDesc> {
        self.state().presents.clone()
    }
}

impl GraphicsBackend for MockBackend {
    fn enumerate_accelerators(&self) -> Result<Vec<PhysicalDeviceHandle>> {
        self.check("enumerate_accelerators")?;
        let count = self.state().accelerators.len() as u64;
        Ok((1..=count).map(PhysicalDeviceHandle::from_raw).collect())
    }

    fn accelerator_properties(&self, accelerator: PhysicalDeviceHandle) -> AcceleratorProperties {
        self.state().accelerator(accelerator).properties.clone()
    }

    fn queue_families(
        &self,
        accelerator: PhysicalDeviceHandle,
        _surface: SurfaceHandle,
    ) -> Result<Vec<QueueFamilyProperties>> {
        self.check("queue_families")?;
        Ok(self.state().accelerator(accelerator).queue_families.clone())
    }

    fn create_device(&self, _accelerator: PhysicalDeviceHandle, desc: &DeviceDesc) -> Result<DeviceHandle> {
        self.check("create_device")?;
        let mut state = self.state();
        state.device_descs.push(desc.clone());
        Ok(DeviceHandle::from_raw(state.allocate("device")))
    }

    fn destroy_device(&self, device: DeviceHandle) {
        self.state().release("device", device, device.as_raw());
    }

    fn get_queue(&self, device: DeviceHandle, family_index: u32, queue_index: u32) -> QueueHandle {
        self.state().calls.push(format!("get_queue({}, {})", family_index, queue_index));
        QueueHandle::from_raw((device.as_raw() << 16) | ((family_index as u64) << 8) | queue_index as u64)
    }

    fn device_wait_idle(&self, _device: DeviceHandle) -> Result<()> {
        self.check("device_wait_idle")
    }

    fn surface_capabilities(
        &self,
        accelerator: PhysicalDeviceHandle,
        _surface: SurfaceHandle,
    ) -> Result<SurfaceCapabilities> {
        self.check("surface_capabilities")?;
        Ok(self.state().accelerator(accelerator).capabilities)
    }

    fn surface_formats(
        &self,
        accelerator: PhysicalDeviceHandle,
        _surface: SurfaceHandle,
    ) -> Result<Vec<SurfaceFormat>> {
        self.check("surface_formats")?;
        Ok(self.state().accelerator(accelerator).formats.clone())
    }

    fn surface_present_modes(
        &self,
        accelerator: PhysicalDeviceHandle,
        _surface: SurfaceHandle,
    ) -> Result<Vec<PresentMode>> {
        self.check("surface_present_modes")?;
        Ok(self.state().accelerator(accelerator).present_modes.clone())
    }

    fn create_swapchain(&self, _device: DeviceHandle, desc: &SwapchainDesc) -> Result<SwapchainHandle> {
        self.check("create_swapchain")?;
        let mut state = self.state();
        state.swapchain_descs.push(desc.clone());
        let raw = state.allocate("swapchain");
        let images = (0..desc.min_image_count)
            .map(|i| ImageHandle::from_raw(raw * 100 + i as u64))
            .collect();
        state.swapchain_images.insert(raw, images);
        Ok(SwapchainHandle::from_raw(raw))
    }

    fn destroy_swapchain(&self, device: DeviceHandle, swapchain: SwapchainHandle) {
        self.state().release("swapchain", device, swapchain.as_raw());
    }

    fn swapchain_images(&self, _device: DeviceHandle, swapchain: SwapchainHandle) -> Result<Vec<ImageHandle>> {
        self.check("swapchain_images")?;
        Ok(self.state().swapchain_images.get(&swapchain.as_raw()).cloned().unwrap_or_default())
    }

    fn acquire_next_image(
        &self,
        _device: DeviceHandle,
        swapchain: SwapchainHandle,
        timeout: u64,
        signal: SemaphoreHandle,
    ) -> Result<AcquiredImage> {
        self.check("acquire_next_image")?;
        let mut state = self.state();
        state.calls.push(format!("acquire(timeout={}, signal={})", timeout, signal.as_raw()));
        let count = state.swapchain_images.get(&swapchain.as_raw()).map_or(0, |i| i.len() as u32);
        if count == 0 {
            return Err(Error::BackendError("mock swapchain has no images".to_string()));
        }
        let index = state.next_image % count;
        state.next_image = index + 1;
        Ok(AcquiredImage { index, suboptimal: false })
    }

    fn create_image_view(&self, _device: DeviceHandle, _image: ImageHandle, _format: PixelFormat) -> Result<ImageViewHandle> {
        self.check("create_image_view")?;
        Ok(ImageViewHandle::from_raw(self.state().allocate("image_view")))
    }

    fn destroy_image_view(&self, device: DeviceHandle, view: ImageViewHandle) {
        self.state().release("image_view", device, view.as_raw());
    }

    fn create_framebuffer(
        &self,
        _device: DeviceHandle,
        _render_pass: RenderPassHandle,
        _view: ImageViewHandle,
        extent: Extent2D,
    ) -> Result<FramebufferHandle> {
        self.check("create_framebuffer")?;
        let mut state = self.state();
        state.framebuffer_extents.push(extent);
        Ok(FramebufferHandle::from_raw(state.allocate("framebuffer")))
    }

    fn destroy_framebuffer(&self, device: DeviceHandle, framebuffer: FramebufferHandle) {
        self.state().release("framebuffer", device, framebuffer.as_raw());
    }

    fn create_render_pass(&self, _device: DeviceHandle, desc: &RenderPassDesc) -> Result<RenderPassHandle> {
        self.check("create_render_pass")?;
        let mut state = self.state();
        state.render_pass_descs.push(*desc);
        Ok(RenderPassHandle::from_raw(state.allocate("render_pass")))
    }

    fn destroy_render_pass(&self, device: DeviceHandle, render_pass: RenderPassHandle) {
        self.state().release("render_pass", device, render_pass.as_raw());
    }

    fn create_shader_module(&self, _device: DeviceHandle, _bytecode: &[u8]) -> Result<ShaderModuleHandle> {
        self.check("create_shader_module")?;
        Ok(ShaderModuleHandle::from_raw(self.state().allocate("shader_module")))
    }

    fn destroy_shader_module(&self, device: DeviceHandle, module: ShaderModuleHandle) {
        self.state().release("shader_module", device, module.as_raw());
    }

    fn create_pipeline_layout(&self, _device: DeviceHandle) -> Result<PipelineLayoutHandle> {
        self.check("create_pipeline_layout")?;
        Ok(PipelineLayoutHandle::from_raw(self.state().allocate("pipeline_layout")))
    }

    fn destroy_pipeline_layout(&self, device: DeviceHandle, layout: PipelineLayoutHandle) {
        self.state().release("pipeline_layout", device, layout.as_raw());
    }

    fn create_graphics_pipeline(&self, _device: DeviceHandle, desc: &GraphicsPipelineDesc) -> Result<PipelineHandle> {
        self.check("create_graphics_pipeline")?;
        let mut state = self.state();
        state.pipeline_descs.push(desc.clone());
        Ok(PipelineHandle::from_raw(state.allocate("pipeline")))
    }

    fn destroy_pipeline(&self, device: DeviceHandle, pipeline: PipelineHandle) {
        self.state().release("pipeline", device, pipeline.as_raw());
    }

    fn create_semaphore(&self, _device: DeviceHandle) -> Result<SemaphoreHandle> {
        self.check("create_semaphore")?;
        Ok(SemaphoreHandle::from_raw(self.state().allocate("semaphore")))
    }

    fn destroy_semaphore(&self, device: DeviceHandle, semaphore: SemaphoreHandle) {
        self.state().release("semaphore", device, semaphore.as_raw());
    }

    fn create_fence(&self, _device: DeviceHandle, signaled: bool) -> Result<FenceHandle> {
        self.check("create_fence")?;
        let mut state = self.state();
        let raw = state.allocate("fence");
        state.fences.insert(raw, signaled);
        Ok(FenceHandle::from_raw(raw))
    }

    fn destroy_fence(&self, device: DeviceHandle, fence: FenceHandle) {
        let mut state = self.state();
        state.fences.remove(&fence.as_raw());
        state.release("fence", device, fence.as_raw());
    }

    fn wait_for_fence(&self, _device: DeviceHandle, fence: FenceHandle, timeout: u64) -> Result<()> {
        self.check("wait_for_fence")?;
        let mut state = self.state();
        state.calls.push(format!("wait(timeout={})", timeout));
        match state.fences.get(&fence.as_raw()) {
            Some(true) => Ok(()),
            // A real wait would never return
            _ => Err(Error::BackendError("mock: waiting on an unsignaled fence".to_string())),
        }
    }

    fn reset_fence(&self, _device: DeviceHandle, fence: FenceHandle) -> Result<()> {
        self.check("reset_fence")?;
        self.state().fences.insert(fence.as_raw(), false);
        Ok(())
    }

    fn create_command_pool(&self, _device: DeviceHandle, family_index: u32) -> Result<CommandPoolHandle> {
        self.check("create_command_pool")?;
        let mut state = self.state();
        state.calls.push(format!("command_pool(family={})", family_index));
        Ok(CommandPoolHandle::from_raw(state.allocate("command_pool")))
    }

    fn destroy_command_pool(&self, device: DeviceHandle, pool: CommandPoolHandle) {
        self.state().release("command_pool", device, pool.as_raw());
    }

    fn allocate_command_buffer(&self, _device: DeviceHandle, pool: CommandPoolHandle) -> Result<CommandBufferHandle> {
        self.check("allocate_command_buffer")?;
        Ok(CommandBufferHandle::from_raw(pool.as_raw() * 10 + 1))
    }

    fn reset_command_buffer(&self, _device: DeviceHandle, _buffer: CommandBufferHandle) -> Result<()> {
        self.check("reset_command_buffer")
    }

    fn begin_command_buffer(&self, _device: DeviceHandle, _buffer: CommandBufferHandle) -> Result<()> {
        self.check("begin_command_buffer")
    }

    fn end_command_buffer(&self, _device: DeviceHandle, _buffer: CommandBufferHandle) -> Result<()> {
        self.check("end_command_buffer")
    }

    fn cmd_begin_render_pass(&self, _device: DeviceHandle, _buffer: CommandBufferHandle, begin: &RenderPassBegin) {
        self.state().calls.push(format!(
            "cmd_begin_render_pass(fb={}, area={}x{}, clear={:?})",
            begin.framebuffer.as_raw(),
            begin.render_area.extent.width,
            begin.render_area.extent.height,
            begin.clear_color.0
        ));
    }

    fn cmd_bind_pipeline(&self, _device: DeviceHandle, _buffer: CommandBufferHandle, pipeline: PipelineHandle) {
        self.state().calls.push(format!("cmd_bind_pipeline({})", pipeline.as_raw()));
    }

    fn cmd_set_viewport(&self, _device: DeviceHandle, _buffer: CommandBufferHandle, viewport: Viewport) {
        self.state().calls.push(format!(
            "cmd_set_viewport({}, {}, {}, {}, {}, {})",
            viewport.x, viewport.y, viewport.width, viewport.height, viewport.min_depth, viewport.max_depth
        ));
    }

    fn cmd_set_scissor(&self, _device: DeviceHandle, _buffer: CommandBufferHandle, scissor: Rect2D) {
        self.state().calls.push(format!(
            "cmd_set_scissor({}, {}, {}, {})",
            scissor.x, scissor.y, scissor.extent.width, scissor.extent.height
        ));
    }

    fn cmd_draw(
        &self,
        _device: DeviceHandle,
        _buffer: CommandBufferHandle,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        self.state().calls.push(format!(
            "cmd_draw({}, {}, {}, {})",
            vertex_count, instance_count, first_vertex, first_instance
        ));
    }

    fn cmd_end_render_pass(&self, _device: DeviceHandle, _buffer: CommandBufferHandle) {
        self.state().calls.push("cmd_end_render_pass".to_string());
    }

    fn queue_submit(&self, _device: DeviceHandle, _queue: QueueHandle, submit: &SubmitDesc) -> Result<()> {
        self.check("queue_submit")?;
        let mut state = self.state();
        state.submits.push(submit.clone());
        if !submit.fence.is_null() {
            state.fences.insert(submit.fence.as_raw(), true);
        }
        Ok(())
    }

    fn queue_present(&self, _device: DeviceHandle, _queue: QueueHandle, present: &PresentDesc) -> Result<()> {
        self.check("queue_present")?;
        self.state().presents.push(present.clone());
        Ok(())
    }
}
