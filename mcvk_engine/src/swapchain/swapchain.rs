/// Swapchain - presentable images, their views and framebuffers
///
/// Built in two phases: [`Swapchain::create`] produces the swapchain object,
/// its images, one view per image and the image-available semaphore;
/// [`Swapchain::initialize_framebuffers`] adds one framebuffer per view once
/// the render pass exists.
///
/// A surface that reports no formats or no present modes, a failing
/// capability query, or a dead logical context leave the swapchain
/// *incomplete*: it owns no GPU objects and [`Swapchain::is_created`] is false.

use crate::accelerator::{AcceleratorInfo, QueueFamilyIndices};
use crate::context::{ContextToken, LogicalContext};
use crate::device::{
    Extent2D, FramebufferHandle, ImageHandle, ImageViewHandle, PixelFormat, PresentMode,
    RenderPassHandle, SemaphoreHandle, SharingMode, SurfaceFormat, SurfaceHandle,
    SwapchainDesc, SwapchainHandle, UniqueHandle,
};
use crate::error::{Error, Result};
use crate::sync::INFINITE_TIMEOUT;
use crate::window::DrawableSize;
use crate::{engine_diagnostic, engine_error, engine_fatal_err, engine_init_err, lifecycle_assert};
use super::swapchain_support::{
    choose_extent, choose_image_count, choose_present_mode, choose_sharing_mode,
    choose_surface_format, Compatibility, SwapchainSupport,
};

const SOURCE: &str = "mcvk::swapchain";

pub struct Swapchain {
    token: Option<ContextToken>,
    compatibility: Compatibility,

    // Destruction order: semaphore, framebuffers, views, swapchain
    image_available: UniqueHandle<SemaphoreHandle>,
    framebuffers: Vec<UniqueHandle<FramebufferHandle>>,
    image_views: Vec<UniqueHandle<ImageViewHandle>>,
    swapchain: UniqueHandle<SwapchainHandle>,
    images: Vec<ImageHandle>,

    surface_format: Option<SurfaceFormat>,
    present_mode: Option<PresentMode>,
    extent: Extent2D,
    sharing_mode: SharingMode,

    views_initialized: bool,
    framebuffers_initialized: bool,
}

impl Swapchain {
    fn incomplete(compatibility: Compatibility) -> Self {
        Self {
            token: None,
            compatibility,
            image_available: UniqueHandle::null(),
            framebuffers: Vec::new(),
            image_views: Vec::new(),
            swapchain: UniqueHandle::null(),
            images: Vec::new(),
            surface_format: None,
            present_mode: None,
            extent: Extent2D::default(),
            sharing_mode: SharingMode::Exclusive,
            views_initialized: false,
            framebuffers_initialized: false,
        }
    }

    /// Build the swapchain, its image views and its image-available semaphore
    ///
    /// Recoverable problems are logged and yield an incomplete swapchain.
    /// Failing to create the swapchain object, a view or the semaphore is
    /// unrecoverable.
    pub fn create(
        accelerator: &AcceleratorInfo,
        surface: SurfaceHandle,
        window: &dyn DrawableSize,
        queue_family_indices: &QueueFamilyIndices,
        context: &LogicalContext,
    ) -> Result<Self> {
        let Some(token) = context.token() else {
            engine_error!(SOURCE, "Logical context is not alive, swapchain left incomplete");
            return Ok(Self::incomplete(Compatibility::empty()));
        };

        let support = match SwapchainSupport::query(token.backend(), accelerator.handle, surface) {
            Ok(support) => support,
            Err(_) => {
                // Already logged by the query
                return Ok(Self::incomplete(Compatibility::empty()));
            }
        };

        let compatibility = support.compatibility();
        if !compatibility.contains(Compatibility::SURFACE_FORMATS) {
            engine_error!(SOURCE, "Surface reports no formats on '{}'", accelerator.name);
            return Ok(Self::incomplete(compatibility));
        }
        if !compatibility.contains(Compatibility::PRESENT_MODES) {
            engine_error!(SOURCE, "Surface reports no present modes on '{}'", accelerator.name);
            return Ok(Self::incomplete(compatibility));
        }

        if token.device().is_null() {
            engine_error!(SOURCE, "Null logical device, swapchain left incomplete");
            return Ok(Self::incomplete(compatibility));
        }

        let Some(surface_format) = choose_surface_format(&support.formats) else {
            return Ok(Self::incomplete(compatibility));
        };
        let present_mode = choose_present_mode(&support.present_modes);
        let extent = choose_extent(&support.capabilities, window.drawable_size());
        let image_count = choose_image_count(&support.capabilities);
        let sharing_mode = choose_sharing_mode(queue_family_indices);

        engine_diagnostic!(
            SOURCE,
            "Creating swapchain: {:?}/{:?}, {:?}, {}x{}, {} image(s), {:?}",
            surface_format.format,
            surface_format.color_space,
            present_mode,
            extent.width,
            extent.height,
            image_count,
            sharing_mode
        );

        let desc = SwapchainDesc {
            surface,
            min_image_count: image_count,
            format: surface_format,
            extent,
            present_mode,
            sharing_mode: sharing_mode.clone(),
            clipped: true,
        };

        let backend = token.backend();
        let device = token.device();

        let handle = backend
            .create_swapchain(device, &desc)
            .map_err(|e| engine_init_err!(SOURCE, "Failed to create swapchain: {}", e))?;
        let swapchain = UniqueHandle::new(token.clone(), handle);

        let images = backend
            .swapchain_images(device, handle)
            .map_err(|e| engine_init_err!(SOURCE, "Failed to get swapchain images: {}", e))?;

        let mut result = Self {
            token: Some(token.clone()),
            compatibility,
            image_available: UniqueHandle::null(),
            framebuffers: Vec::new(),
            image_views: Vec::new(),
            swapchain,
            images,
            surface_format: Some(surface_format),
            present_mode: Some(present_mode),
            extent,
            sharing_mode,
            views_initialized: false,
            framebuffers_initialized: false,
        };

        result.initialize_image_views()?;

        let semaphore = backend
            .create_semaphore(device)
            .map_err(|e| engine_init_err!(SOURCE, "Failed to create image-available semaphore: {}", e))?;
        result.image_available = UniqueHandle::new(token, semaphore);

        Ok(result)
    }

    fn initialize_image_views(&mut self) -> Result<()> {
        if !lifecycle_assert!(!self.views_initialized, SOURCE, "image views initialized twice") {
            return Err(Error::InvalidResource("image views already initialized".to_string()));
        }
        let (Some(token), Some(format)) = (self.token.clone(), self.surface_format) else {
            return Err(Error::InvalidResource("swapchain is incomplete".to_string()));
        };

        self.image_views.reserve(self.images.len());
        for &image in &self.images {
            let view = token
                .backend()
                .create_image_view(token.device(), image, format.format)
                .map_err(|e| engine_init_err!(SOURCE, "Failed to create image view: {}", e))?;
            self.image_views.push(UniqueHandle::new(token.clone(), view));
        }
        self.views_initialized = true;
        Ok(())
    }

    /// Create one framebuffer per image view against `render_pass`
    ///
    /// Second construction phase; must be called exactly once.
    pub fn initialize_framebuffers(&mut self, render_pass: RenderPassHandle) -> Result<()> {
        if !lifecycle_assert!(!self.framebuffers_initialized, SOURCE, "framebuffers initialized twice") {
            return Err(Error::InvalidResource("framebuffers already initialized".to_string()));
        }
        let Some(token) = self.token.clone() else {
            return Err(engine_init_err!(SOURCE, "Cannot create framebuffers on an incomplete swapchain"));
        };

        self.framebuffers.reserve(self.image_views.len());
        for view in &self.image_views {
            let framebuffer = token
                .backend()
                .create_framebuffer(token.device(), render_pass, view.get(), self.extent)
                .map_err(|e| engine_init_err!(SOURCE, "Failed to create framebuffer: {}", e))?;
            self.framebuffers.push(UniqueHandle::new(token.clone(), framebuffer));
        }
        self.framebuffers_initialized = true;
        engine_diagnostic!(SOURCE, "{} framebuffer(s) created", self.framebuffers.len());
        Ok(())
    }

    /// Wait indefinitely for the next presentable image
    ///
    /// Signals the image-available semaphore and returns the image index.
    pub fn acquire_next_image(&self) -> Result<u32> {
        let Some(token) = &self.token else {
            return Err(engine_fatal_err!(SOURCE, "Cannot acquire from an incomplete swapchain"));
        };
        let acquired = token
            .backend()
            .acquire_next_image(
                token.device(),
                self.swapchain.get(),
                INFINITE_TIMEOUT,
                self.image_available.get(),
            )
            .map_err(|e| engine_fatal_err!(SOURCE, "Failed to acquire next image: {}", e))?;
        Ok(acquired.index)
    }

    /// Framebuffer of image `index`
    pub fn framebuffer_at(&self, index: usize) -> Result<FramebufferHandle> {
        let count = self.framebuffers.len();
        if !lifecycle_assert!(index < count, SOURCE, "framebuffer index {} out of range ({})", index, count) {
            return Err(Error::InvalidResource(format!(
                "framebuffer index {} out of range ({})",
                index, count
            )));
        }
        Ok(self.framebuffers[index].get())
    }

    // ===== QUERIES =====

    /// Both surface formats and present modes are available
    pub fn is_compatible(&self) -> bool {
        self.compatibility.contains(Compatibility::all())
    }

    pub fn compatibility(&self) -> Compatibility {
        self.compatibility
    }

    /// The swapchain object exists
    pub fn is_created(&self) -> bool {
        self.swapchain.is_live()
    }

    /// Number of swapchain images
    pub fn size(&self) -> usize {
        self.images.len()
    }

    pub fn image_view_count(&self) -> usize {
        self.image_views.iter().filter(|v| v.is_live()).count()
    }

    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.iter().filter(|f| f.is_live()).count()
    }

    pub fn handle(&self) -> SwapchainHandle {
        self.swapchain.get()
    }

    pub fn image_available(&self) -> SemaphoreHandle {
        self.image_available.get()
    }

    pub fn surface_format(&self) -> Option<SurfaceFormat> {
        self.surface_format
    }

    pub fn format(&self) -> Option<PixelFormat> {
        self.surface_format.map(|f| f.format)
    }

    pub fn present_mode(&self) -> Option<PresentMode> {
        self.present_mode
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    pub fn sharing_mode(&self) -> &SharingMode {
        &self.sharing_mode
    }

    // ===== TEARDOWN =====

    pub fn release_semaphore(&mut self) {
        self.image_available.release();
    }

    pub fn release_framebuffers(&mut self) {
        for framebuffer in &mut self.framebuffers {
            framebuffer.release();
        }
    }

    pub fn release_image_views(&mut self) {
        for view in &mut self.image_views {
            view.release();
        }
    }

    /// Release everything: semaphore, framebuffers, views, swapchain object
    ///
    /// Already released parts are skipped; calling it again is a no-op.
    pub fn destroy(&mut self) {
        self.release_semaphore();
        self.release_framebuffers();
        self.release_image_views();
        if self.swapchain.release() {
            engine_diagnostic!(SOURCE, "Swapchain destroyed");
        }
        self.token = None;
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "swapchain_tests.rs"]
mod tests;
