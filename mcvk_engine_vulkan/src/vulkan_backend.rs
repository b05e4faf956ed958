/// VulkanBackend - `ash` implementation of the engine's GraphicsBackend
///
/// Owns the [`VulkanInstance`] and the function tables of every logical
/// device created through it. Engine handles are the raw `vk` handle values.
///
/// Failures come back as `Error::BackendError` without logging; the engine
/// layer that issued the call logs them with its own context.

use std::io::Cursor;
use std::mem::ManuallyDrop;
use std::sync::{Arc, RwLock};

use ash::vk;
use ash::vk::Handle;
use rustc_hash::FxHashMap;

use mcvk_engine::mcvk::{Error, Result};
use mcvk_engine::mcvk::backend::*;
use mcvk_engine::{engine_diagnostic, engine_error, engine_warn};

use crate::vulkan_format::*;
use crate::vulkan_instance::VulkanInstance;

const SOURCE: &str = "mcvk::vulkan";

/// Function tables of one logical device
struct DeviceFns {
    physical_device: vk::PhysicalDevice,
    device: ash::Device,
    swapchain: ash::khr::swapchain::Device,
}

fn vk_error(operation: &str, result: vk::Result) -> Error {
    Error::BackendError(format!("{} failed: {:?}", operation, result))
}

pub struct VulkanBackend {
    devices: RwLock<FxHashMap<u64, Arc<DeviceFns>>>,
    /// Dropped last, and only once every device is gone
    instance: ManuallyDrop<VulkanInstance>,
}

impl VulkanBackend {
    pub fn new(instance: VulkanInstance) -> Arc<Self> {
        Arc::new(Self {
            devices: RwLock::new(FxHashMap::default()),
            instance: ManuallyDrop::new(instance),
        })
    }

    /// Surface created with the instance
    pub fn surface(&self) -> SurfaceHandle {
        self.instance.surface()
    }

    pub fn instance(&self) -> &VulkanInstance {
        &self.instance
    }

    /// Number of logical devices not yet destroyed
    pub fn live_device_count(&self) -> usize {
        self.devices.read().map_or(0, |devices| devices.len())
    }

    fn device(&self, handle: DeviceHandle) -> Result<Arc<DeviceFns>> {
        let devices = self
            .devices
            .read()
            .map_err(|_| Error::BackendError("device table poisoned".to_string()))?;
        devices
            .get(&handle.as_raw())
            .cloned()
            .ok_or_else(|| Error::InvalidResource(format!("unknown device {:#x}", handle.as_raw())))
    }

    /// Device lookup for calls that cannot report failure
    fn device_or_log(&self, handle: DeviceHandle, operation: &str) -> Option<Arc<DeviceFns>> {
        match self.device(handle) {
            Ok(fns) => Some(fns),
            Err(e) => {
                engine_error!(SOURCE, "{} skipped: {}", operation, e);
                None
            }
        }
    }

    fn surface_loader(&self) -> &ash::khr::surface::Instance {
        self.instance.surface_loader()
    }
}

impl GraphicsBackend for VulkanBackend {
    // ===== ACCELERATORS =====

    fn enumerate_accelerators(&self) -> Result<Vec<PhysicalDeviceHandle>> {
        let physical_devices = unsafe { self.instance.instance().enumerate_physical_devices() }
            .map_err(|e| vk_error("vkEnumeratePhysicalDevices", e))?;
        Ok(physical_devices
            .into_iter()
            .map(|pd| PhysicalDeviceHandle::from_raw(pd.as_raw()))
            .collect())
    }

    fn accelerator_properties(&self, accelerator: PhysicalDeviceHandle) -> AcceleratorProperties {
        let instance = self.instance.instance();
        let physical_device = vk::PhysicalDevice::from_raw(accelerator.as_raw());
        let (properties, features, memory) = unsafe {
            (
                instance.get_physical_device_properties(physical_device),
                instance.get_physical_device_features(physical_device),
                instance.get_physical_device_memory_properties(physical_device),
            )
        };

        let name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "Unknown".to_string());

        let heap_count = (memory.memory_heap_count as usize).min(memory.memory_heaps.len());
        let memory_heaps = memory.memory_heaps[..heap_count]
            .iter()
            .map(|heap| MemoryHeap {
                size: heap.size,
                device_local: heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL),
            })
            .collect();

        AcceleratorProperties {
            name,
            class: device_class_from_vk(properties.device_type),
            geometry_shader: features.geometry_shader == vk::TRUE,
            max_image_dimension_2d: properties.limits.max_image_dimension2_d,
            memory_heaps,
        }
    }

    fn queue_families(
        &self,
        accelerator: PhysicalDeviceHandle,
        surface: SurfaceHandle,
    ) -> Result<Vec<QueueFamilyProperties>> {
        let physical_device = vk::PhysicalDevice::from_raw(accelerator.as_raw());
        let surface = vk::SurfaceKHR::from_raw(surface.as_raw());
        let families = unsafe {
            self.instance
                .instance()
                .get_physical_device_queue_family_properties(physical_device)
        };

        families
            .iter()
            .enumerate()
            .map(|(index, family)| {
                let presentation = unsafe {
                    self.surface_loader()
                        .get_physical_device_surface_support(physical_device, index as u32, surface)
                }
                .map_err(|e| vk_error("vkGetPhysicalDeviceSurfaceSupportKHR", e))?;
                Ok(QueueFamilyProperties {
                    graphics: family.queue_flags.contains(vk::QueueFlags::GRAPHICS),
                    presentation,
                })
            })
            .collect()
    }

    // ===== DEVICE =====

    fn create_device(&self, accelerator: PhysicalDeviceHandle, desc: &DeviceDesc) -> Result<DeviceHandle> {
        let physical_device = vk::PhysicalDevice::from_raw(accelerator.as_raw());

        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = desc
            .queues
            .iter()
            .map(|request| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(request.family_index)
                    .queue_priorities(&request.priorities)
            })
            .collect();

        let extension_names = if desc.swapchain {
            vec![ash::khr::swapchain::NAME.as_ptr()]
        } else {
            vec![]
        };

        let features = vk::PhysicalDeviceFeatures::default().geometry_shader(desc.geometry_shader);

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features);

        let instance = self.instance.instance();
        let device = unsafe { instance.create_device(physical_device, &create_info, None) }
            .map_err(|e| vk_error("vkCreateDevice", e))?;
        let swapchain = ash::khr::swapchain::Device::new(instance, &device);

        let handle = DeviceHandle::from_raw(device.handle().as_raw());
        let fns = Arc::new(DeviceFns { physical_device, device, swapchain });
        match self.devices.write() {
            Ok(mut devices) => {
                devices.insert(handle.as_raw(), fns);
            }
            Err(_) => {
                unsafe { fns.device.destroy_device(None) };
                return Err(Error::BackendError("device table poisoned".to_string()));
            }
        }

        engine_diagnostic!(SOURCE, "Logical device {:#x} created", handle.as_raw());
        Ok(handle)
    }

    fn destroy_device(&self, device: DeviceHandle) {
        let removed = self
            .devices
            .write()
            .ok()
            .and_then(|mut devices| devices.remove(&device.as_raw()));
        match removed {
            Some(fns) => unsafe { fns.device.destroy_device(None) },
            None => engine_error!(SOURCE, "destroy_device: unknown device {:#x}", device.as_raw()),
        }
    }

    fn get_queue(&self, device: DeviceHandle, family_index: u32, queue_index: u32) -> QueueHandle {
        match self.device_or_log(device, "get_queue") {
            Some(fns) => {
                let queue = unsafe { fns.device.get_device_queue(family_index, queue_index) };
                QueueHandle::from_raw(queue.as_raw())
            }
            None => QueueHandle::NULL,
        }
    }

    fn device_wait_idle(&self, device: DeviceHandle) -> Result<()> {
        let fns = self.device(device)?;
        unsafe { fns.device.device_wait_idle() }.map_err(|e| vk_error("vkDeviceWaitIdle", e))
    }

    // ===== SURFACE QUERIES =====

    fn surface_capabilities(
        &self,
        accelerator: PhysicalDeviceHandle,
        surface: SurfaceHandle,
    ) -> Result<SurfaceCapabilities> {
        let caps = unsafe {
            self.surface_loader().get_physical_device_surface_capabilities(
                vk::PhysicalDevice::from_raw(accelerator.as_raw()),
                vk::SurfaceKHR::from_raw(surface.as_raw()),
            )
        }
        .map_err(|e| vk_error("vkGetPhysicalDeviceSurfaceCapabilitiesKHR", e))?;
        Ok(surface_capabilities_from_vk(&caps))
    }

    fn surface_formats(
        &self,
        accelerator: PhysicalDeviceHandle,
        surface: SurfaceHandle,
    ) -> Result<Vec<SurfaceFormat>> {
        let formats = unsafe {
            self.surface_loader().get_physical_device_surface_formats(
                vk::PhysicalDevice::from_raw(accelerator.as_raw()),
                vk::SurfaceKHR::from_raw(surface.as_raw()),
            )
        }
        .map_err(|e| vk_error("vkGetPhysicalDeviceSurfaceFormatsKHR", e))?;
        Ok(formats.iter().map(surface_format_from_vk).collect())
    }

    fn surface_present_modes(
        &self,
        accelerator: PhysicalDeviceHandle,
        surface: SurfaceHandle,
    ) -> Result<Vec<PresentMode>> {
        let modes = unsafe {
            self.surface_loader().get_physical_device_surface_present_modes(
                vk::PhysicalDevice::from_raw(accelerator.as_raw()),
                vk::SurfaceKHR::from_raw(surface.as_raw()),
            )
        }
        .map_err(|e| vk_error("vkGetPhysicalDeviceSurfacePresentModesKHR", e))?;
        Ok(modes.into_iter().filter_map(present_mode_from_vk).collect())
    }

    // ===== SWAPCHAIN =====

    fn create_swapchain(&self, device: DeviceHandle, desc: &SwapchainDesc) -> Result<SwapchainHandle> {
        let fns = self.device(device)?;
        let surface = vk::SurfaceKHR::from_raw(desc.surface.as_raw());

        // Keep whatever transform the surface currently has
        let caps = unsafe {
            self.surface_loader()
                .get_physical_device_surface_capabilities(fns.physical_device, surface)
        }
        .map_err(|e| vk_error("vkGetPhysicalDeviceSurfaceCapabilitiesKHR", e))?;

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(desc.min_image_count)
            .image_format(pixel_format_to_vk(desc.format.format))
            .image_color_space(color_space_to_vk(desc.format.color_space))
            .image_extent(extent_to_vk(desc.extent))
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode_to_vk(&desc.sharing_mode))
            .queue_family_indices(desc.sharing_mode.queue_family_indices())
            .pre_transform(caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode_to_vk(desc.present_mode))
            .clipped(desc.clipped)
            .old_swapchain(vk::SwapchainKHR::null());

        let swapchain = unsafe { fns.swapchain.create_swapchain(&create_info, None) }
            .map_err(|e| vk_error("vkCreateSwapchainKHR", e))?;
        Ok(SwapchainHandle::from_raw(swapchain.as_raw()))
    }

    fn destroy_swapchain(&self, device: DeviceHandle, swapchain: SwapchainHandle) {
        if let Some(fns) = self.device_or_log(device, "destroy_swapchain") {
            unsafe {
                fns.swapchain
                    .destroy_swapchain(vk::SwapchainKHR::from_raw(swapchain.as_raw()), None)
            };
        }
    }

    fn swapchain_images(&self, device: DeviceHandle, swapchain: SwapchainHandle) -> Result<Vec<ImageHandle>> {
        let fns = self.device(device)?;
        let images = unsafe {
            fns.swapchain
                .get_swapchain_images(vk::SwapchainKHR::from_raw(swapchain.as_raw()))
        }
        .map_err(|e| vk_error("vkGetSwapchainImagesKHR", e))?;
        Ok(images.into_iter().map(|image| ImageHandle::from_raw(image.as_raw())).collect())
    }

    fn acquire_next_image(
        &self,
        device: DeviceHandle,
        swapchain: SwapchainHandle,
        timeout: u64,
        signal: SemaphoreHandle,
    ) -> Result<AcquiredImage> {
        let fns = self.device(device)?;
        let (index, suboptimal) = unsafe {
            fns.swapchain.acquire_next_image(
                vk::SwapchainKHR::from_raw(swapchain.as_raw()),
                timeout,
                vk::Semaphore::from_raw(signal.as_raw()),
                vk::Fence::null(),
            )
        }
        .map_err(|e| vk_error("vkAcquireNextImageKHR", e))?;
        Ok(AcquiredImage { index, suboptimal })
    }

    // ===== IMAGE VIEWS / FRAMEBUFFERS =====

    fn create_image_view(&self, device: DeviceHandle, image: ImageHandle, format: PixelFormat) -> Result<ImageViewHandle> {
        let fns = self.device(device)?;
        let create_info = vk::ImageViewCreateInfo::default()
            .image(vk::Image::from_raw(image.as_raw()))
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(pixel_format_to_vk(format))
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        let view = unsafe { fns.device.create_image_view(&create_info, None) }
            .map_err(|e| vk_error("vkCreateImageView", e))?;
        Ok(ImageViewHandle::from_raw(view.as_raw()))
    }

    fn destroy_image_view(&self, device: DeviceHandle, view: ImageViewHandle) {
        if let Some(fns) = self.device_or_log(device, "destroy_image_view") {
            unsafe { fns.device.destroy_image_view(vk::ImageView::from_raw(view.as_raw()), None) };
        }
    }

    fn create_framebuffer(
        &self,
        device: DeviceHandle,
        render_pass: RenderPassHandle,
        view: ImageViewHandle,
        extent: Extent2D,
    ) -> Result<FramebufferHandle> {
        let fns = self.device(device)?;
        let attachments = [vk::ImageView::from_raw(view.as_raw())];
        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(vk::RenderPass::from_raw(render_pass.as_raw()))
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { fns.device.create_framebuffer(&create_info, None) }
            .map_err(|e| vk_error("vkCreateFramebuffer", e))?;
        Ok(FramebufferHandle::from_raw(framebuffer.as_raw()))
    }

    fn destroy_framebuffer(&self, device: DeviceHandle, framebuffer: FramebufferHandle) {
        if let Some(fns) = self.device_or_log(device, "destroy_framebuffer") {
            unsafe {
                fns.device
                    .destroy_framebuffer(vk::Framebuffer::from_raw(framebuffer.as_raw()), None)
            };
        }
    }

    // ===== PIPELINE =====

    fn create_render_pass(&self, device: DeviceHandle, desc: &RenderPassDesc) -> Result<RenderPassHandle> {
        let fns = self.device(device)?;
        let color = &desc.color_attachment;

        let attachments = [vk::AttachmentDescription::default()
            .format(pixel_format_to_vk(color.format))
            .samples(sample_count_to_vk(color.samples))
            .load_op(load_op_to_vk(color.load_op))
            .store_op(store_op_to_vk(color.store_op))
            .stencil_load_op(load_op_to_vk(color.stencil_load_op))
            .stencil_store_op(store_op_to_vk(color.stencil_store_op))
            .initial_layout(image_layout_to_vk(color.initial_layout))
            .final_layout(image_layout_to_vk(color.final_layout))];

        let color_refs = [vk::AttachmentReference {
            attachment: 0,
            layout: image_layout_to_vk(desc.subpass_layout),
        }];

        let subpasses = [vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs)];

        let dependencies: Vec<vk::SubpassDependency> = if desc.external_dependency {
            vec![vk::SubpassDependency {
                src_subpass: vk::SUBPASS_EXTERNAL,
                dst_subpass: 0,
                src_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                dst_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                src_access_mask: vk::AccessFlags::empty(),
                dst_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                dependency_flags: vk::DependencyFlags::empty(),
            }]
        } else {
            vec![]
        };

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe { fns.device.create_render_pass(&create_info, None) }
            .map_err(|e| vk_error("vkCreateRenderPass", e))?;
        Ok(RenderPassHandle::from_raw(render_pass.as_raw()))
    }

    fn destroy_render_pass(&self, device: DeviceHandle, render_pass: RenderPassHandle) {
        if let Some(fns) = self.device_or_log(device, "destroy_render_pass") {
            unsafe {
                fns.device
                    .destroy_render_pass(vk::RenderPass::from_raw(render_pass.as_raw()), None)
            };
        }
    }

    fn create_shader_module(&self, device: DeviceHandle, bytecode: &[u8]) -> Result<ShaderModuleHandle> {
        let fns = self.device(device)?;
        let code = ash::util::read_spv(&mut Cursor::new(bytecode))
            .map_err(|e| Error::InvalidResource(format!("Invalid SPIR-V bytecode: {}", e)))?;
        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);

        let module = unsafe { fns.device.create_shader_module(&create_info, None) }
            .map_err(|e| vk_error("vkCreateShaderModule", e))?;
        Ok(ShaderModuleHandle::from_raw(module.as_raw()))
    }

    fn destroy_shader_module(&self, device: DeviceHandle, module: ShaderModuleHandle) {
        if let Some(fns) = self.device_or_log(device, "destroy_shader_module") {
            unsafe {
                fns.device
                    .destroy_shader_module(vk::ShaderModule::from_raw(module.as_raw()), None)
            };
        }
    }

    fn create_pipeline_layout(&self, device: DeviceHandle) -> Result<PipelineLayoutHandle> {
        let fns = self.device(device)?;
        let create_info = vk::PipelineLayoutCreateInfo::default();
        let layout = unsafe { fns.device.create_pipeline_layout(&create_info, None) }
            .map_err(|e| vk_error("vkCreatePipelineLayout", e))?;
        Ok(PipelineLayoutHandle::from_raw(layout.as_raw()))
    }

    fn destroy_pipeline_layout(&self, device: DeviceHandle, layout: PipelineLayoutHandle) {
        if let Some(fns) = self.device_or_log(device, "destroy_pipeline_layout") {
            unsafe {
                fns.device
                    .destroy_pipeline_layout(vk::PipelineLayout::from_raw(layout.as_raw()), None)
            };
        }
    }

    fn create_graphics_pipeline(&self, device: DeviceHandle, desc: &GraphicsPipelineDesc) -> Result<PipelineHandle> {
        let fns = self.device(device)?;

        let entry_points = desc
            .stages
            .iter()
            .map(|stage| std::ffi::CString::new(stage.entry_point.as_str()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::InvalidResource(format!("Invalid shader entry point: {}", e)))?;

        let stages: Vec<vk::PipelineShaderStageCreateInfo> = desc
            .stages
            .iter()
            .zip(&entry_points)
            .map(|(stage, entry_point)| {
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(shader_stage_to_vk(stage.stage))
                    .module(vk::ShaderModule::from_raw(stage.module.as_raw()))
                    .name(entry_point)
            })
            .collect();

        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default();

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(desc.topology))
            .primitive_restart_enable(desc.primitive_restart);

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(desc.viewport_count)
            .scissor_count(desc.scissor_count);

        let raster = &desc.rasterization;
        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(raster.depth_clamp)
            .rasterizer_discard_enable(raster.rasterizer_discard)
            .polygon_mode(polygon_mode_to_vk(raster.polygon_mode))
            .line_width(raster.line_width)
            .cull_mode(cull_mode_to_vk(raster.cull_mode))
            .front_face(front_face_to_vk(raster.front_face))
            .depth_bias_enable(raster.depth_bias);

        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(sample_count_to_vk(desc.samples));

        let blend = &desc.blend;
        let blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(blend.enable)
            .src_color_blend_factor(blend_factor_to_vk(blend.src_color))
            .dst_color_blend_factor(blend_factor_to_vk(blend.dst_color))
            .color_blend_op(blend_op_to_vk(blend.color_op))
            .src_alpha_blend_factor(blend_factor_to_vk(blend.src_alpha))
            .dst_alpha_blend_factor(blend_factor_to_vk(blend.dst_alpha))
            .alpha_blend_op(blend_op_to_vk(blend.alpha_op))
            .color_write_mask(color_write_mask_to_vk(blend.write_mask))];

        let color_blend = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .color_blend_state(&color_blend)
            .dynamic_state(&dynamic_state)
            .layout(vk::PipelineLayout::from_raw(desc.layout.as_raw()))
            .render_pass(vk::RenderPass::from_raw(desc.render_pass.as_raw()))
            .subpass(desc.subpass);

        let pipelines = unsafe {
            fns.device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
        }
        .map_err(|(_, e)| vk_error("vkCreateGraphicsPipelines", e))?;

        pipelines
            .first()
            .map(|pipeline| PipelineHandle::from_raw(pipeline.as_raw()))
            .ok_or_else(|| Error::BackendError("vkCreateGraphicsPipelines returned no pipeline".to_string()))
    }

    fn destroy_pipeline(&self, device: DeviceHandle, pipeline: PipelineHandle) {
        if let Some(fns) = self.device_or_log(device, "destroy_pipeline") {
            unsafe { fns.device.destroy_pipeline(vk::Pipeline::from_raw(pipeline.as_raw()), None) };
        }
    }

    // ===== SYNCHRONIZATION =====

    fn create_semaphore(&self, device: DeviceHandle) -> Result<SemaphoreHandle> {
        let fns = self.device(device)?;
        let semaphore = unsafe {
            fns.device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
        }
        .map_err(|e| vk_error("vkCreateSemaphore", e))?;
        Ok(SemaphoreHandle::from_raw(semaphore.as_raw()))
    }

    fn destroy_semaphore(&self, device: DeviceHandle, semaphore: SemaphoreHandle) {
        if let Some(fns) = self.device_or_log(device, "destroy_semaphore") {
            unsafe {
                fns.device
                    .destroy_semaphore(vk::Semaphore::from_raw(semaphore.as_raw()), None)
            };
        }
    }

    fn create_fence(&self, device: DeviceHandle, signaled: bool) -> Result<FenceHandle> {
        let fns = self.device(device)?;
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let fence = unsafe {
            fns.device
                .create_fence(&vk::FenceCreateInfo::default().flags(flags), None)
        }
        .map_err(|e| vk_error("vkCreateFence", e))?;
        Ok(FenceHandle::from_raw(fence.as_raw()))
    }

    fn destroy_fence(&self, device: DeviceHandle, fence: FenceHandle) {
        if let Some(fns) = self.device_or_log(device, "destroy_fence") {
            unsafe { fns.device.destroy_fence(vk::Fence::from_raw(fence.as_raw()), None) };
        }
    }

    fn wait_for_fence(&self, device: DeviceHandle, fence: FenceHandle, timeout: u64) -> Result<()> {
        let fns = self.device(device)?;
        let fences = [vk::Fence::from_raw(fence.as_raw())];
        unsafe { fns.device.wait_for_fences(&fences, true, timeout) }
            .map_err(|e| vk_error("vkWaitForFences", e))
    }

    fn reset_fence(&self, device: DeviceHandle, fence: FenceHandle) -> Result<()> {
        let fns = self.device(device)?;
        let fences = [vk::Fence::from_raw(fence.as_raw())];
        unsafe { fns.device.reset_fences(&fences) }.map_err(|e| vk_error("vkResetFences", e))
    }

    // ===== COMMANDS =====

    fn create_command_pool(&self, device: DeviceHandle, family_index: u32) -> Result<CommandPoolHandle> {
        let fns = self.device(device)?;
        let create_info = vk::CommandPoolCreateInfo::default()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(family_index);
        let pool = unsafe { fns.device.create_command_pool(&create_info, None) }
            .map_err(|e| vk_error("vkCreateCommandPool", e))?;
        Ok(CommandPoolHandle::from_raw(pool.as_raw()))
    }

    fn destroy_command_pool(&self, device: DeviceHandle, pool: CommandPoolHandle) {
        if let Some(fns) = self.device_or_log(device, "destroy_command_pool") {
            unsafe {
                fns.device
                    .destroy_command_pool(vk::CommandPool::from_raw(pool.as_raw()), None)
            };
        }
    }

    fn allocate_command_buffer(&self, device: DeviceHandle, pool: CommandPoolHandle) -> Result<CommandBufferHandle> {
        let fns = self.device(device)?;
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(vk::CommandPool::from_raw(pool.as_raw()))
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let buffers = unsafe { fns.device.allocate_command_buffers(&allocate_info) }
            .map_err(|e| vk_error("vkAllocateCommandBuffers", e))?;
        buffers
            .first()
            .map(|buffer| CommandBufferHandle::from_raw(buffer.as_raw()))
            .ok_or_else(|| Error::BackendError("vkAllocateCommandBuffers returned no buffer".to_string()))
    }

    fn reset_command_buffer(&self, device: DeviceHandle, buffer: CommandBufferHandle) -> Result<()> {
        let fns = self.device(device)?;
        unsafe {
            fns.device.reset_command_buffer(
                vk::CommandBuffer::from_raw(buffer.as_raw()),
                vk::CommandBufferResetFlags::empty(),
            )
        }
        .map_err(|e| vk_error("vkResetCommandBuffer", e))
    }

    fn begin_command_buffer(&self, device: DeviceHandle, buffer: CommandBufferHandle) -> Result<()> {
        let fns = self.device(device)?;
        unsafe {
            fns.device.begin_command_buffer(
                vk::CommandBuffer::from_raw(buffer.as_raw()),
                &vk::CommandBufferBeginInfo::default(),
            )
        }
        .map_err(|e| vk_error("vkBeginCommandBuffer", e))
    }

    fn end_command_buffer(&self, device: DeviceHandle, buffer: CommandBufferHandle) -> Result<()> {
        let fns = self.device(device)?;
        unsafe { fns.device.end_command_buffer(vk::CommandBuffer::from_raw(buffer.as_raw())) }
            .map_err(|e| vk_error("vkEndCommandBuffer", e))
    }

    fn cmd_begin_render_pass(&self, device: DeviceHandle, buffer: CommandBufferHandle, begin: &RenderPassBegin) {
        let Some(fns) = self.device_or_log(device, "cmd_begin_render_pass") else {
            return;
        };
        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue { float32: begin.clear_color.0 },
        }];
        let area = begin.render_area;
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk::RenderPass::from_raw(begin.render_pass.as_raw()))
            .framebuffer(vk::Framebuffer::from_raw(begin.framebuffer.as_raw()))
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: area.x, y: area.y },
                extent: extent_to_vk(area.extent),
            })
            .clear_values(&clear_values);

        unsafe {
            fns.device.cmd_begin_render_pass(
                vk::CommandBuffer::from_raw(buffer.as_raw()),
                &begin_info,
                vk::SubpassContents::INLINE,
            )
        };
    }

    fn cmd_bind_pipeline(&self, device: DeviceHandle, buffer: CommandBufferHandle, pipeline: PipelineHandle) {
        if let Some(fns) = self.device_or_log(device, "cmd_bind_pipeline") {
            unsafe {
                fns.device.cmd_bind_pipeline(
                    vk::CommandBuffer::from_raw(buffer.as_raw()),
                    vk::PipelineBindPoint::GRAPHICS,
                    vk::Pipeline::from_raw(pipeline.as_raw()),
                )
            };
        }
    }

    fn cmd_set_viewport(&self, device: DeviceHandle, buffer: CommandBufferHandle, viewport: Viewport) {
        if let Some(fns) = self.device_or_log(device, "cmd_set_viewport") {
            let viewports = [vk::Viewport {
                x: viewport.x,
                y: viewport.y,
                width: viewport.width,
                height: viewport.height,
                min_depth: viewport.min_depth,
                max_depth: viewport.max_depth,
            }];
            unsafe {
                fns.device
                    .cmd_set_viewport(vk::CommandBuffer::from_raw(buffer.as_raw()), 0, &viewports)
            };
        }
    }

    fn cmd_set_scissor(&self, device: DeviceHandle, buffer: CommandBufferHandle, scissor: Rect2D) {
        if let Some(fns) = self.device_or_log(device, "cmd_set_scissor") {
            let scissors = [vk::Rect2D {
                offset: vk::Offset2D { x: scissor.x, y: scissor.y },
                extent: extent_to_vk(scissor.extent),
            }];
            unsafe {
                fns.device
                    .cmd_set_scissor(vk::CommandBuffer::from_raw(buffer.as_raw()), 0, &scissors)
            };
        }
    }

    fn cmd_draw(
        &self,
        device: DeviceHandle,
        buffer: CommandBufferHandle,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        if let Some(fns) = self.device_or_log(device, "cmd_draw") {
            unsafe {
                fns.device.cmd_draw(
                    vk::CommandBuffer::from_raw(buffer.as_raw()),
                    vertex_count,
                    instance_count,
                    first_vertex,
                    first_instance,
                )
            };
        }
    }

    fn cmd_end_render_pass(&self, device: DeviceHandle, buffer: CommandBufferHandle) {
        if let Some(fns) = self.device_or_log(device, "cmd_end_render_pass") {
            unsafe { fns.device.cmd_end_render_pass(vk::CommandBuffer::from_raw(buffer.as_raw())) };
        }
    }

    // ===== QUEUES =====

    fn queue_submit(&self, device: DeviceHandle, queue: QueueHandle, submit: &SubmitDesc) -> Result<()> {
        let fns = self.device(device)?;

        let wait_semaphores: Vec<vk::Semaphore> = submit
            .wait_semaphores
            .iter()
            .map(|(semaphore, _)| vk::Semaphore::from_raw(semaphore.as_raw()))
            .collect();
        let wait_stages: Vec<vk::PipelineStageFlags> = submit
            .wait_semaphores
            .iter()
            .map(|(_, stage)| pipeline_stage_to_vk(*stage))
            .collect();
        let command_buffers: Vec<vk::CommandBuffer> = submit
            .command_buffers
            .iter()
            .map(|buffer| vk::CommandBuffer::from_raw(buffer.as_raw()))
            .collect();
        let signal_semaphores: Vec<vk::Semaphore> = submit
            .signal_semaphores
            .iter()
            .map(|semaphore| vk::Semaphore::from_raw(semaphore.as_raw()))
            .collect();

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            fns.device.queue_submit(
                vk::Queue::from_raw(queue.as_raw()),
                &[submit_info],
                vk::Fence::from_raw(submit.fence.as_raw()),
            )
        }
        .map_err(|e| vk_error("vkQueueSubmit", e))
    }

    fn queue_present(&self, device: DeviceHandle, queue: QueueHandle, present: &PresentDesc) -> Result<()> {
        let fns = self.device(device)?;

        let wait_semaphores: Vec<vk::Semaphore> = present
            .wait_semaphores
            .iter()
            .map(|semaphore| vk::Semaphore::from_raw(semaphore.as_raw()))
            .collect();
        let swapchains = [vk::SwapchainKHR::from_raw(present.swapchain.as_raw())];
        let image_indices = [present.image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            fns.swapchain
                .queue_present(vk::Queue::from_raw(queue.as_raw()), &present_info)
        }
        .map(|_suboptimal| ())
        .map_err(|e| vk_error("vkQueuePresentKHR", e))
    }
}

impl Drop for VulkanBackend {
    fn drop(&mut self) {
        let leaked = self.live_device_count();
        if leaked > 0 {
            // The instance cannot be destroyed under a live device
            engine_warn!(SOURCE, "{} logical device(s) still alive, leaking the Vulkan instance", leaked);
            return;
        }
        unsafe { ManuallyDrop::drop(&mut self.instance) };
    }
}
