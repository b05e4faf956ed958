/// Surface support queries and the swapchain parameter choices

use bitflags::bitflags;

use crate::accelerator::QueueFamilyIndices;
use crate::device::{
    ColorSpace, Extent2D, GraphicsBackend, PhysicalDeviceHandle, PixelFormat, PresentMode,
    SharingMode, SurfaceCapabilities, SurfaceFormat, SurfaceHandle,
};
use crate::error::Result;
use crate::engine_err;

bitflags! {
    /// Surface support facts required before a swapchain can be built
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Compatibility: u8 {
        /// At least one surface format is reported
        const SURFACE_FORMATS = 1 << 0;
        /// At least one present mode is reported
        const PRESENT_MODES = 1 << 1;
    }
}

/// What a surface supports on one accelerator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapchainSupport {
    pub capabilities: SurfaceCapabilities,
    pub formats: Vec<SurfaceFormat>,
    pub present_modes: Vec<PresentMode>,
}

impl SwapchainSupport {
    /// Query capabilities, formats and present modes
    ///
    /// A failing capability query is recoverable for the caller: it is
    /// logged and returned as `Error::BackendError`.
    pub fn query(
        backend: &dyn GraphicsBackend,
        accelerator: PhysicalDeviceHandle,
        surface: SurfaceHandle,
    ) -> Result<Self> {
        let capabilities = backend
            .surface_capabilities(accelerator, surface)
            .map_err(|e| engine_err!("mcvk::swapchain", "Failed to query surface capabilities: {}", e))?;
        let formats = backend
            .surface_formats(accelerator, surface)
            .map_err(|e| engine_err!("mcvk::swapchain", "Failed to query surface formats: {}", e))?;
        let present_modes = backend
            .surface_present_modes(accelerator, surface)
            .map_err(|e| engine_err!("mcvk::swapchain", "Failed to query present modes: {}", e))?;

        Ok(Self { capabilities, formats, present_modes })
    }

    pub fn compatibility(&self) -> Compatibility {
        let mut compatibility = Compatibility::empty();
        compatibility.set(Compatibility::SURFACE_FORMATS, !self.formats.is_empty());
        compatibility.set(Compatibility::PRESENT_MODES, !self.present_modes.is_empty());
        compatibility
    }
}

/// `B8G8R8A8_SRGB` in the sRGB nonlinear space if offered, else the first format
///
/// Returns `None` only for an empty list.
pub fn choose_surface_format(formats: &[SurfaceFormat]) -> Option<SurfaceFormat> {
    formats
        .iter()
        .find(|f| f.format == PixelFormat::B8G8R8A8_SRGB && f.color_space == ColorSpace::SrgbNonlinear)
        .or_else(|| formats.first())
        .copied()
}

/// Mailbox if offered, else FIFO (always available)
pub fn choose_present_mode(modes: &[PresentMode]) -> PresentMode {
    if modes.contains(&PresentMode::Mailbox) {
        PresentMode::Mailbox
    } else {
        PresentMode::Fifo
    }
}

/// Current surface extent, or the drawable size clamped into the allowed range
/// when the surface leaves the choice to the application
pub fn choose_extent(capabilities: &SurfaceCapabilities, drawable: (u32, u32)) -> Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    let (width, height) = drawable;
    Extent2D {
        width: width
            .max(capabilities.min_image_extent.width)
            .min(capabilities.max_image_extent.width),
        height: height
            .max(capabilities.min_image_extent.height)
            .min(capabilities.max_image_extent.height),
    }
}

/// One more image than the minimum, within the maximum (0 = unbounded)
pub fn choose_image_count(capabilities: &SurfaceCapabilities) -> u32 {
    let desired = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        desired.min(capabilities.max_image_count)
    } else {
        desired
    }
}

/// Concurrent sharing across distinct families, exclusive otherwise
pub fn choose_sharing_mode(indices: &QueueFamilyIndices) -> SharingMode {
    match (indices.graphics, indices.presentation) {
        (Some(graphics), Some(presentation)) if graphics != presentation => {
            SharingMode::Concurrent(vec![graphics, presentation])
        }
        _ => SharingMode::Exclusive,
    }
}

#[cfg(test)]
#[path = "swapchain_support_tests.rs"]
mod tests;
