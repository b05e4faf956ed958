/// Synchronization primitives
///
/// Binary semaphores order GPU work against GPU work (acquire -> render ->
/// present). Fences let the CPU wait for the GPU. Both are owned through
/// [`UniqueHandle`] and released with their owner.

use crate::context::LogicalContext;
use crate::device::{FenceHandle, SemaphoreHandle, UniqueHandle};
use crate::error::Result;
use crate::{engine_fatal_err, engine_init_err};

/// Wait forever
pub const INFINITE_TIMEOUT: u64 = u64::MAX;

/// Owned binary semaphore
#[derive(Debug)]
pub struct Semaphore {
    handle: UniqueHandle<SemaphoreHandle>,
}

impl Semaphore {
    pub fn handle(&self) -> SemaphoreHandle {
        self.handle.get()
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_live()
    }

    /// Destroy now; later calls and the drop are no-ops
    pub fn release(&mut self) -> bool {
        self.handle.release()
    }
}

/// Owned fence
#[derive(Debug)]
pub struct Fence {
    handle: UniqueHandle<FenceHandle>,
}

impl Fence {
    pub fn handle(&self) -> FenceHandle {
        self.handle.get()
    }

    pub fn is_live(&self) -> bool {
        self.handle.is_live()
    }

    /// Block the calling thread until the fence is signaled
    pub fn wait(&self, context: &LogicalContext) -> Result<()> {
        let Some(token) = context.token() else {
            return Err(engine_fatal_err!("mcvk::sync", "Fence wait on a destroyed context"));
        };
        token
            .backend()
            .wait_for_fence(token.device(), self.handle.get(), INFINITE_TIMEOUT)
            .map_err(|e| engine_fatal_err!("mcvk::sync", "Failed to wait for fence: {}", e))
    }

    /// Return the fence to the unsignaled state
    pub fn reset(&self, context: &LogicalContext) -> Result<()> {
        let Some(token) = context.token() else {
            return Err(engine_fatal_err!("mcvk::sync", "Fence reset on a destroyed context"));
        };
        token
            .backend()
            .reset_fence(token.device(), self.handle.get())
            .map_err(|e| engine_fatal_err!("mcvk::sync", "Failed to reset fence: {}", e))
    }

    pub fn release(&mut self) -> bool {
        self.handle.release()
    }
}

/// Create a binary semaphore
pub fn create_semaphore(context: &LogicalContext) -> Result<Semaphore> {
    let token = context
        .token()
        .ok_or_else(|| engine_init_err!("mcvk::sync", "Cannot create a semaphore on a destroyed context"))?;
    let handle = token
        .backend()
        .create_semaphore(token.device())
        .map_err(|e| engine_init_err!("mcvk::sync", "Failed to create semaphore: {}", e))?;
    Ok(Semaphore { handle: UniqueHandle::new(token, handle) })
}

/// Create a fence, optionally already signaled
pub fn create_fence(context: &LogicalContext, initially_signaled: bool) -> Result<Fence> {
    let token = context
        .token()
        .ok_or_else(|| engine_init_err!("mcvk::sync", "Cannot create a fence on a destroyed context"))?;
    let handle = token
        .backend()
        .create_fence(token.device(), initially_signaled)
        .map_err(|e| engine_init_err!("mcvk::sync", "Failed to create fence: {}", e))?;
    Ok(Fence { handle: UniqueHandle::new(token, handle) })
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
