/// Presentation surface resources

mod swapchain;
mod swapchain_support;

pub use swapchain::Swapchain;
pub use swapchain_support::{
    choose_extent, choose_image_count, choose_present_mode, choose_sharing_mode,
    choose_surface_format, Compatibility, SwapchainSupport,
};
