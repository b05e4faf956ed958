/// Immutable capability snapshot of one physical accelerator

use crate::device::{DeviceClass, GraphicsBackend, PhysicalDeviceHandle, SurfaceHandle};
use crate::error::Result;
use super::queue_family::QueueFamilyIndices;

/// Everything the selector needs to know about an accelerator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceleratorInfo {
    pub handle: PhysicalDeviceHandle,
    pub name: String,
    pub class: DeviceClass,
    pub geometry_shader: bool,
    pub max_image_dimension_2d: u32,
    /// Size of the first device-local heap, `None` when no heap is device-local
    pub device_local_heap_size: Option<u64>,
    pub queue_family_indices: QueueFamilyIndices,
}

impl AcceleratorInfo {
    /// Query properties and queue families of `handle` against `surface`
    pub fn query(
        backend: &dyn GraphicsBackend,
        handle: PhysicalDeviceHandle,
        surface: SurfaceHandle,
    ) -> Result<Self> {
        let properties = backend.accelerator_properties(handle);
        let families = backend.queue_families(handle, surface)?;

        Ok(Self {
            handle,
            device_local_heap_size: properties
                .memory_heaps
                .iter()
                .find(|heap| heap.device_local)
                .map(|heap| heap.size),
            name: properties.name,
            class: properties.class,
            geometry_shader: properties.geometry_shader,
            max_image_dimension_2d: properties.max_image_dimension_2d,
            queue_family_indices: QueueFamilyIndices::from_families(&families),
        })
    }

    /// Hard requirements: geometry shaders and a complete queue mapping
    pub fn meets_requirements(&self) -> bool {
        self.geometry_shader && self.queue_family_indices.is_complete()
    }
}
