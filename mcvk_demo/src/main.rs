//! mcvk demo - draws one triangle until the window is closed
//!
//! Usage: `mcvk_demo [vertex.spv fragment.spv]`
//! (defaults to `shaders/vert.spv` and `shaders/frag.spv`).

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::WindowId;

use mcvk_engine::mcvk::backend::GraphicsBackend;
use mcvk_engine::mcvk::{Config, DrawableSize, Engine, Renderer, Result, ShaderBytecode, Window};
use mcvk_engine::{engine_fatal, engine_info, engine_init_err, engine_warn};
use mcvk_engine_vulkan::{print_validation_stats_report, VulkanBackend, VulkanInstance};

const SOURCE: &str = "mcvk::demo";

// ===== WINDOW =====

/// winit side of the window: created on resume, flags close requests
struct WindowState {
    window: Option<winit::window::Window>,
    title: String,
    size: PhysicalSize<u32>,
    close_requested: bool,
    creation_error: Option<String>,
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attributes = winit::window::Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(self.size)
            .with_resizable(false);
        match event_loop.create_window(attributes) {
            Ok(window) => self.window = Some(window),
            Err(e) => {
                self.creation_error = Some(e.to_string());
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let WindowEvent::CloseRequested = event {
            engine_info!(SOURCE, "Close requested");
            self.close_requested = true;
            event_loop.exit();
        }
    }
}

/// Window driven by pumping the winit event loop once per frame
struct DemoWindow {
    event_loop: EventLoop<()>,
    state: WindowState,
}

impl DemoWindow {
    fn open(config: &Config) -> Result<Self> {
        let event_loop = EventLoop::new()
            .map_err(|e| engine_init_err!(SOURCE, "Failed to create event loop: {}", e))?;
        let mut window = Self {
            event_loop,
            state: WindowState {
                window: None,
                title: config.window_title.clone(),
                size: PhysicalSize::new(config.window_width, config.window_height),
                close_requested: false,
                creation_error: None,
            },
        };

        // The window only exists once the loop has delivered `resumed`
        while window.state.window.is_none() && !window.state.close_requested {
            if let Some(error) = window.state.creation_error.take() {
                return Err(engine_init_err!(SOURCE, "Failed to create window: {}", error));
            }
            window.poll_events();
        }
        if let Some(error) = window.state.creation_error.take() {
            return Err(engine_init_err!(SOURCE, "Failed to create window: {}", error));
        }
        Ok(window)
    }

    fn handle(&self) -> Result<&winit::window::Window> {
        self.state
            .window
            .as_ref()
            .ok_or_else(|| engine_init_err!(SOURCE, "Window closed before initialization"))
    }
}

impl DrawableSize for DemoWindow {
    fn drawable_size(&self) -> (u32, u32) {
        match &self.state.window {
            Some(window) => {
                let size = window.inner_size();
                (size.width, size.height)
            }
            None => (self.state.size.width, self.state.size.height),
        }
    }
}

impl Window for DemoWindow {
    fn should_close(&self) -> bool {
        self.state.close_requested
    }

    fn poll_events(&mut self) {
        let status = self.event_loop.pump_app_events(Some(Duration::ZERO), &mut self.state);
        if let PumpStatus::Exit(_) = status {
            self.state.close_requested = true;
        }
    }
}

// ===== MAIN =====

fn config_from_args() -> Config {
    let config = Config::default().with_window_title("mcvk");
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [vertex, fragment] => config.with_shaders(vertex, fragment),
        [] => config,
        _ => {
            engine_warn!(SOURCE, "Expected `mcvk_demo [vertex.spv fragment.spv]`, using default shaders");
            config
        }
    }
}

fn run(config: &Config) -> Result<()> {
    let mut window = DemoWindow::open(config)?;
    let backend = VulkanBackend::new(VulkanInstance::new(window.handle()?, config)?);
    let validation = backend.instance().validation_enabled();
    let shaders = ShaderBytecode::from_config(config)?;

    let backend_dyn: Arc<dyn GraphicsBackend> = backend.clone();
    let mut renderer = Renderer::new(backend_dyn, backend.surface(), &window, &shaders)?;
    let result = renderer.run(&mut window);
    renderer.shutdown();

    let stats = renderer.stats();
    engine_info!(
        SOURCE,
        "{} frame(s) presented, {} dropped",
        stats.frames_presented,
        stats.frames_dropped
    );
    if validation {
        print_validation_stats_report();
    }
    result
}

fn main() -> ExitCode {
    let config = config_from_args();
    Engine::initialize(&config);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            engine_fatal!(SOURCE, "{}", e);
            ExitCode::FAILURE
        }
    }
}
