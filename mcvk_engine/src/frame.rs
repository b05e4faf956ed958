/// Frame driver - command recording, submission and presentation
///
/// Owns one command pool, its single primary command buffer and the
/// render-finished semaphore. The buffer goes through a small state machine
/// every frame:
///
/// ```text
/// Initial --record--> Executable --submit--> Pending --reset--> Initial
/// ```

use crate::context::{ContextToken, LogicalContext};
use crate::device::{
    ClearColor, CommandBufferHandle, CommandPoolHandle, PipelineStage, PresentDesc, Rect2D,
    RenderPassBegin, SemaphoreHandle, SubmitDesc, UniqueHandle, Viewport,
};
use crate::error::{Error, Result};
use crate::pipeline::RenderPipeline;
use crate::swapchain::Swapchain;
use crate::sync::Fence;
use crate::{engine_error, engine_fatal_err, engine_init_err, lifecycle_assert};

const SOURCE: &str = "mcvk::frame";

/// Vertices of the single hard-coded draw
pub const TRIANGLE_VERTEX_COUNT: u32 = 3;

/// Recording state of the command buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// Reset, ready to record
    Initial,
    /// Recorded, ready to submit
    Executable,
    /// Submitted; must be reset once its fence signals
    Pending,
}

/// Whether the submitted frame reached the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    /// Presentation failed; the frame was dropped and the loop goes on
    Dropped,
}

pub struct FrameDriver {
    token: Option<ContextToken>,
    // Destruction order: semaphore, pool (frees the buffer)
    render_finished: UniqueHandle<SemaphoreHandle>,
    command_pool: UniqueHandle<CommandPoolHandle>,
    command_buffer: CommandBufferHandle,
    state: RecordingState,
}

impl FrameDriver {
    /// Create the command pool on `graphics_family`, its buffer and the
    /// render-finished semaphore
    pub fn create(context: &LogicalContext, graphics_family: u32) -> Result<Self> {
        let token = context
            .token()
            .ok_or_else(|| engine_init_err!(SOURCE, "Cannot create a frame driver on a destroyed context"))?;
        let backend = token.backend();
        let device = token.device();

        let pool = backend
            .create_command_pool(device, graphics_family)
            .map_err(|e| engine_init_err!(SOURCE, "Failed to create command pool: {}", e))?;
        let command_pool = UniqueHandle::new(token.clone(), pool);

        let command_buffer = backend
            .allocate_command_buffer(device, pool)
            .map_err(|e| engine_init_err!(SOURCE, "Failed to allocate command buffer: {}", e))?;

        let semaphore = backend
            .create_semaphore(device)
            .map_err(|e| engine_init_err!(SOURCE, "Failed to create render-finished semaphore: {}", e))?;
        let render_finished = UniqueHandle::new(token.clone(), semaphore);

        Ok(Self {
            token: Some(token),
            render_finished,
            command_pool,
            command_buffer,
            state: RecordingState::Initial,
        })
    }

    fn token(&self) -> Result<&ContextToken> {
        self.token
            .as_ref()
            .ok_or_else(|| engine_fatal_err!(SOURCE, "Frame driver used after destruction"))
    }

    /// Return the command buffer to the initial state
    pub fn reset(&mut self) -> Result<()> {
        let token = self.token()?;
        token
            .backend()
            .reset_command_buffer(token.device(), self.command_buffer)
            .map_err(|e| engine_fatal_err!(SOURCE, "Failed to reset command buffer: {}", e))?;
        self.state = RecordingState::Initial;
        Ok(())
    }

    /// Record the frame for swapchain image `image_index`
    ///
    /// Clears to black, binds the pipeline, sets viewport and scissor to the
    /// swapchain extent and draws one triangle.
    pub fn record(&mut self, image_index: u32, swapchain: &Swapchain, pipeline: &RenderPipeline) -> Result<()> {
        if !lifecycle_assert!(
            self.state == RecordingState::Initial,
            SOURCE,
            "recording into a command buffer in state {:?}",
            self.state
        ) {
            return Err(Error::InvalidResource(format!(
                "command buffer is {:?}, expected Initial",
                self.state
            )));
        }

        let framebuffer = swapchain.framebuffer_at(image_index as usize)?;
        let token = self.token()?.clone();
        let backend = token.backend();
        let device = token.device();
        let buffer = self.command_buffer;
        let extent = swapchain.extent();

        backend
            .begin_command_buffer(device, buffer)
            .map_err(|e| engine_fatal_err!(SOURCE, "Failed to begin command buffer: {}", e))?;

        let area = Rect2D { x: 0, y: 0, extent };
        backend.cmd_begin_render_pass(
            device,
            buffer,
            &RenderPassBegin {
                render_pass: pipeline.render_pass(),
                framebuffer,
                render_area: area,
                clear_color: ClearColor::BLACK,
            },
        );
        backend.cmd_bind_pipeline(device, buffer, pipeline.pipeline());
        backend.cmd_set_viewport(
            device,
            buffer,
            Viewport {
                x: 0.0,
                y: 0.0,
                width: extent.width as f32,
                height: extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            },
        );
        backend.cmd_set_scissor(device, buffer, area);
        backend.cmd_draw(device, buffer, TRIANGLE_VERTEX_COUNT, 1, 0, 0);
        backend.cmd_end_render_pass(device, buffer);

        backend
            .end_command_buffer(device, buffer)
            .map_err(|e| engine_fatal_err!(SOURCE, "Failed to end command buffer: {}", e))?;

        self.state = RecordingState::Executable;
        Ok(())
    }

    /// Submit the recorded buffer, then present image `image_index`
    ///
    /// The submission waits for image-available at the top of the pipe,
    /// signals render-finished and `fence`. Presentation waits for
    /// render-finished; its failure only drops the frame.
    pub fn submit(
        &mut self,
        swapchain: &Swapchain,
        context: &LogicalContext,
        fence: &Fence,
        image_index: u32,
    ) -> Result<PresentOutcome> {
        if !lifecycle_assert!(
            self.state == RecordingState::Executable,
            SOURCE,
            "submitting a command buffer in state {:?}",
            self.state
        ) {
            return Err(Error::InvalidResource(format!(
                "command buffer is {:?}, expected Executable",
                self.state
            )));
        }

        let token = self.token()?.clone();
        let backend = token.backend();
        let device = token.device();
        let render_finished = self.render_finished.get();

        let submit = SubmitDesc {
            wait_semaphores: vec![(swapchain.image_available(), PipelineStage::TopOfPipe)],
            command_buffers: vec![self.command_buffer],
            signal_semaphores: vec![render_finished],
            fence: fence.handle(),
        };
        backend
            .queue_submit(device, context.graphics_queue(), &submit)
            .map_err(|e| engine_fatal_err!(SOURCE, "Failed to submit draw command buffer: {}", e))?;
        self.state = RecordingState::Pending;

        let present = PresentDesc {
            wait_semaphores: vec![render_finished],
            swapchain: swapchain.handle(),
            image_index,
        };
        match backend.queue_present(device, context.presentation_queue(), &present) {
            Ok(()) => Ok(PresentOutcome::Presented),
            Err(e) => {
                engine_error!(SOURCE, "Failed to present image {}: {}", image_index, e);
                Ok(PresentOutcome::Dropped)
            }
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn command_buffer(&self) -> CommandBufferHandle {
        self.command_buffer
    }

    pub fn render_finished(&self) -> SemaphoreHandle {
        self.render_finished.get()
    }

    pub fn is_live(&self) -> bool {
        self.command_pool.is_live()
    }

    /// Release the render-finished semaphore, then the command pool
    pub fn destroy(&mut self) {
        self.render_finished.release();
        self.command_pool.release();
        self.command_buffer = CommandBufferHandle::NULL;
        self.token = None;
    }
}

impl Drop for FrameDriver {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
