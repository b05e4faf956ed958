/// Shared helpers for unit tests (no GPU required)

use std::sync::{Arc, Mutex};
use crate::log::{Logger, LogEntry, LogSeverity};
use crate::engine::Engine;

/// Logger that records every entry it receives
///
/// The global logger is process-wide: tests installing a capture must be
/// `#[serial]` and must only assert on entries matching their own messages.
#[derive(Clone, Default)]
pub struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CaptureLogger {
    /// Install a fresh capture as the engine logger and return a handle to it
    pub fn install() -> Self {
        let capture = Self::default();
        Engine::set_min_severity(LogSeverity::Diagnostic);
        Engine::set_logger(capture.clone());
        capture
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Whether an entry of `severity` contains `needle`
    pub fn contains(&self, severity: LogSeverity, needle: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.severity == severity && e.message.contains(needle))
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

// ============================================================================
// Mock GPU setup
// ============================================================================

use crate::accelerator::{select_best_accelerator, AcceleratorInfo};
use crate::context::LogicalContext;
use crate::device::mock_backend::MockBackend;
use crate::device::{GraphicsBackend, SurfaceHandle};

pub const TEST_SURFACE: SurfaceHandle = SurfaceHandle::from_raw(7);

/// Select an accelerator on `backend` and create its logical context
pub fn mock_context(backend: &Arc<MockBackend>) -> (AcceleratorInfo, LogicalContext) {
    let dyn_backend: Arc<dyn GraphicsBackend> = backend.clone();
    let accelerator = select_best_accelerator(dyn_backend.as_ref(), TEST_SURFACE)
        .unwrap()
        .chosen;
    let context = LogicalContext::create(dyn_backend, &accelerator).unwrap();
    (accelerator, context)
}

/// Window stand-in with a fixed drawable size
pub struct FixedSize(pub u32, pub u32);

impl crate::window::DrawableSize for FixedSize {
    fn drawable_size(&self) -> (u32, u32) {
        (self.0, self.1)
    }
}

/// Create a swapchain on the selected accelerator of `backend`
pub fn mock_swapchain(
    accelerator: &AcceleratorInfo,
    context: &LogicalContext,
) -> crate::swapchain::Swapchain {
    crate::swapchain::Swapchain::create(
        accelerator,
        TEST_SURFACE,
        &FixedSize(500, 500),
        &accelerator.queue_family_indices,
        context,
    )
    .unwrap()
}
