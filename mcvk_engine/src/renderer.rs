/// Renderer - builds every frame resource in dependency order and drives
/// the frame loop
///
/// Construction order: accelerator -> logical context -> swapchain ->
/// pipeline (swapchain format) -> framebuffers -> frame driver -> in-flight
/// fence. Shutdown waits for the device to go idle, then releases in reverse
/// dependency order.

use std::sync::Arc;

use crate::accelerator::{select_best_accelerator, AcceleratorInfo, AcceleratorSelection};
use crate::context::LogicalContext;
use crate::device::{GraphicsBackend, SurfaceHandle};
use crate::error::Result;
use crate::frame::{FrameDriver, PresentOutcome};
use crate::pipeline::RenderPipeline;
use crate::shader::ShaderBytecode;
use crate::swapchain::Swapchain;
use crate::sync::{create_fence, Fence};
use crate::window::{DrawableSize, Window};
use crate::{engine_error, engine_info, engine_init_err};

const SOURCE: &str = "mcvk::Renderer";

/// Frame counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub frames_submitted: u64,
    pub frames_presented: u64,
    /// Frames whose presentation failed
    pub frames_dropped: u64,
}

pub struct Renderer {
    fence: Fence,
    driver: FrameDriver,
    pipeline: RenderPipeline,
    swapchain: Swapchain,
    context: LogicalContext,
    selection: AcceleratorSelection,
    surface: SurfaceHandle,
    stats: FrameStats,
    shut_down: bool,
}

impl Renderer {
    /// Build all frame resources for `surface`
    ///
    /// Fails with an unrecoverable error when no usable accelerator exists,
    /// when the surface offers no usable format or present mode, or when
    /// any GPU object cannot be created.
    pub fn new(
        backend: Arc<dyn GraphicsBackend>,
        surface: SurfaceHandle,
        window: &dyn DrawableSize,
        shaders: &ShaderBytecode,
    ) -> Result<Self> {
        let selection = select_best_accelerator(backend.as_ref(), surface)?;
        let accelerator = &selection.chosen;
        let indices = accelerator.queue_family_indices;

        let context = LogicalContext::create(backend, accelerator)?;

        let mut swapchain = Swapchain::create(accelerator, surface, window, &indices, &context)?;
        if !swapchain.is_compatible() || !swapchain.is_created() {
            return Err(engine_init_err!(
                SOURCE,
                "Surface is not usable on '{}' (compatibility: {:?})",
                accelerator.name,
                swapchain.compatibility()
            ));
        }
        let format = swapchain
            .format()
            .ok_or_else(|| engine_init_err!(SOURCE, "Swapchain has no image format"))?;

        let pipeline = RenderPipeline::create(&context, format, shaders)?;
        swapchain.initialize_framebuffers(pipeline.render_pass())?;

        let graphics_family = indices
            .graphics
            .ok_or_else(|| engine_init_err!(SOURCE, "No graphics queue family"))?;
        let driver = FrameDriver::create(&context, graphics_family)?;
        let fence = create_fence(&context, true)?;

        engine_info!(
            SOURCE,
            "Renderer ready on '{}': {} swapchain image(s), {}x{}",
            accelerator.name,
            swapchain.size(),
            swapchain.extent().width,
            swapchain.extent().height
        );

        Ok(Self {
            fence,
            driver,
            pipeline,
            swapchain,
            context,
            selection,
            surface,
            stats: FrameStats::default(),
            shut_down: false,
        })
    }

    /// Render and present one frame
    ///
    /// Waits for the previous frame's fence, acquires an image, records,
    /// submits and presents. Every error returned here is unrecoverable;
    /// a failed presentation is reported as [`PresentOutcome::Dropped`].
    pub fn draw_frame(&mut self) -> Result<PresentOutcome> {
        self.fence.wait(&self.context)?;
        self.fence.reset(&self.context)?;

        let image_index = self.swapchain.acquire_next_image()?;

        self.driver.reset()?;
        self.driver.record(image_index, &self.swapchain, &self.pipeline)?;
        let outcome = self.driver.submit(&self.swapchain, &self.context, &self.fence, image_index)?;

        self.stats.frames_submitted += 1;
        match outcome {
            PresentOutcome::Presented => self.stats.frames_presented += 1,
            PresentOutcome::Dropped => self.stats.frames_dropped += 1,
        }
        Ok(outcome)
    }

    /// Poll and draw until the window asks to close, then drain the device
    pub fn run(&mut self, window: &mut dyn Window) -> Result<()> {
        while !window.should_close() {
            window.poll_events();
            self.draw_frame()?;
        }
        self.context.wait_idle()
    }

    /// Wait for the device, then release fence, frame driver, pipeline,
    /// swapchain and logical context in that order
    ///
    /// Idempotent; also run on drop.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        if let Err(e) = self.context.wait_idle() {
            engine_error!(SOURCE, "Device wait idle failed during shutdown: {}", e);
        }

        self.fence.release();
        self.driver.destroy();
        if self.pipeline.is_live() {
            self.pipeline.destroy();
        }
        self.swapchain.destroy();
        self.context.destroy();

        engine_info!(
            SOURCE,
            "Renderer shut down ({} frame(s) submitted, {} dropped)",
            self.stats.frames_submitted,
            self.stats.frames_dropped
        );
    }

    // ===== ACCESSORS =====

    pub fn accelerator(&self) -> &AcceleratorInfo {
        &self.selection.chosen
    }

    /// Qualifying accelerators that could not be ranked during selection
    pub fn comparison_failures(&self) -> &[String] {
        &self.selection.comparison_failures
    }

    pub fn context(&self) -> &LogicalContext {
        &self.context
    }

    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub fn surface(&self) -> SurfaceHandle {
        self.surface
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
