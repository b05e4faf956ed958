/// Logical context - the logical device and its two queues
///
/// Creating a context issues a [`ContextToken`]. Every GPU object created
/// from the device keeps a clone of that token for as long as it lives, so
/// the context can tell at teardown whether anything still depends on it.

use std::sync::Arc;

use crate::accelerator::{AcceleratorInfo, QueueFamilyIndices};
use crate::device::{DeviceDesc, DeviceHandle, GraphicsBackend, QueueHandle, QueueRequest};
use crate::error::Result;
use crate::{engine_diagnostic, engine_error, engine_init_err, lifecycle_assert};

struct ContextShared {
    backend: Arc<dyn GraphicsBackend>,
    device: DeviceHandle,
}

/// Capability proving a logical device is alive
///
/// Cheap to clone. Held by every object created from the device.
#[derive(Clone)]
pub struct ContextToken {
    shared: Arc<ContextShared>,
}

impl ContextToken {
    pub fn backend(&self) -> &dyn GraphicsBackend {
        self.shared.backend.as_ref()
    }

    pub fn backend_arc(&self) -> Arc<dyn GraphicsBackend> {
        Arc::clone(&self.shared.backend)
    }

    pub fn device(&self) -> DeviceHandle {
        self.shared.device
    }
}

impl std::fmt::Debug for ContextToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextToken").field("device", &self.shared.device).finish()
    }
}

/// Queue creation requests: one per distinct family, priority 1.0
pub fn queue_requests(indices: &QueueFamilyIndices) -> Vec<QueueRequest> {
    let mut families: Vec<u32> = [indices.graphics, indices.presentation]
        .into_iter()
        .flatten()
        .collect();
    families.sort_unstable();
    families.dedup();

    families
        .into_iter()
        .map(|family_index| QueueRequest { family_index, priorities: vec![1.0] })
        .collect()
}

/// Owner of the logical device
///
/// Never cloned. Must be destroyed after every dependent object.
pub struct LogicalContext {
    token: Option<ContextToken>,
    graphics_queue: QueueHandle,
    presentation_queue: QueueHandle,
    queue_family_indices: QueueFamilyIndices,
}

impl LogicalContext {
    /// Create the logical device for a qualifying accelerator
    ///
    /// Enables the geometry-shader feature and the swapchain extension and
    /// retrieves queue 0 of the graphics and presentation families.
    pub fn create(backend: Arc<dyn GraphicsBackend>, accelerator: &AcceleratorInfo) -> Result<Self> {
        let indices = accelerator.queue_family_indices;
        let (graphics_family, presentation_family) = match (indices.graphics, indices.presentation) {
            (Some(g), Some(p)) => (g, p),
            _ => {
                return Err(engine_init_err!(
                    "mcvk::context",
                    "Accelerator '{}' has no complete queue family mapping",
                    accelerator.name
                ))
            }
        };

        let desc = DeviceDesc {
            queues: queue_requests(&indices),
            geometry_shader: true,
            swapchain: true,
        };

        let device = backend.create_device(accelerator.handle, &desc).map_err(|e| {
            engine_init_err!("mcvk::context", "Failed to create logical device: {}", e)
        })?;

        let graphics_queue = backend.get_queue(device, graphics_family, 0);
        let presentation_queue = backend.get_queue(device, presentation_family, 0);

        engine_diagnostic!(
            "mcvk::context",
            "Logical device created on '{}' ({} queue famil{})",
            accelerator.name,
            desc.queues.len(),
            if desc.queues.len() == 1 { "y" } else { "ies" }
        );

        Ok(Self {
            token: Some(ContextToken {
                shared: Arc::new(ContextShared { backend, device }),
            }),
            graphics_queue,
            presentation_queue,
            queue_family_indices: indices,
        })
    }

    /// Token for creating dependent objects, `None` once destroyed
    pub fn token(&self) -> Option<ContextToken> {
        self.token.clone()
    }

    pub fn device(&self) -> DeviceHandle {
        self.token.as_ref().map_or(DeviceHandle::NULL, ContextToken::device)
    }

    pub fn graphics_queue(&self) -> QueueHandle {
        self.graphics_queue
    }

    pub fn presentation_queue(&self) -> QueueHandle {
        self.presentation_queue
    }

    pub fn queue_family_indices(&self) -> QueueFamilyIndices {
        self.queue_family_indices
    }

    pub fn is_alive(&self) -> bool {
        self.token.is_some()
    }

    /// Objects currently holding a token of this context
    pub fn dependent_count(&self) -> usize {
        self.token
            .as_ref()
            .map_or(0, |token| Arc::strong_count(&token.shared) - 1)
    }

    /// Block until the device has finished all submitted work
    pub fn wait_idle(&self) -> Result<()> {
        match &self.token {
            Some(token) => token.backend().device_wait_idle(token.device()),
            None => Ok(()),
        }
    }

    /// Destroy the logical device
    ///
    /// Every dependent must have been released first. When lifecycle checks
    /// are disabled a premature call leaks the device instead of destroying it
    /// under live objects. Calling it again is a no-op.
    pub fn destroy(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };

        let dependents = Arc::strong_count(&token.shared) - 1;
        let released = lifecycle_assert!(
            dependents == 0,
            "mcvk::context",
            "logical device destroyed while {} dependent object(s) are alive",
            dependents
        );
        if !released {
            engine_error!(
                "mcvk::context",
                "Leaking logical device: {} dependent object(s) still alive",
                dependents
            );
            return;
        }

        token.backend().destroy_device(token.device());
        self.graphics_queue = QueueHandle::NULL;
        self.presentation_queue = QueueHandle::NULL;
        engine_diagnostic!("mcvk::context", "Logical device destroyed");
    }
}

impl Drop for LogicalContext {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        self.destroy();
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
