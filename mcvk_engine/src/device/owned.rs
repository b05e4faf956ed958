/// Unique ownership of device-level objects
///
/// A [`UniqueHandle`] owns one backend object and the [`ContextToken`] of the
/// device that created it. Releasing it destroys the object exactly once,
/// nulls the handle and gives the token back, which is how the logical
/// context knows its dependents are gone.

use crate::context::ContextToken;
use super::backend::GraphicsBackend;
use super::handles::*;

/// Object created from, and destroyed through, a logical device
pub trait DeviceObject: Copy + std::fmt::Debug {
    const NULL: Self;

    fn is_null(self) -> bool;

    fn destroy(self, backend: &dyn GraphicsBackend, device: DeviceHandle);
}

macro_rules! impl_device_object {
    ($($handle:ident => $destroy:ident),* $(,)?) => {
        $(
            impl DeviceObject for $handle {
                const NULL: Self = $handle::NULL;

                fn is_null(self) -> bool {
                    $handle::is_null(self)
                }

                fn destroy(self, backend: &dyn GraphicsBackend, device: DeviceHandle) {
                    backend.$destroy(device, self);
                }
            }
        )*
    };
}

impl_device_object! {
    SwapchainHandle => destroy_swapchain,
    ImageViewHandle => destroy_image_view,
    FramebufferHandle => destroy_framebuffer,
    RenderPassHandle => destroy_render_pass,
    PipelineLayoutHandle => destroy_pipeline_layout,
    PipelineHandle => destroy_pipeline,
    ShaderModuleHandle => destroy_shader_module,
    SemaphoreHandle => destroy_semaphore,
    FenceHandle => destroy_fence,
    CommandPoolHandle => destroy_command_pool,
}

/// Owning wrapper around one device object
///
/// Not `Clone`: the object has exactly one owner.
pub struct UniqueHandle<H: DeviceObject> {
    handle: H,
    token: Option<ContextToken>,
}

impl<H: DeviceObject> UniqueHandle<H> {
    /// Take ownership of `handle`, created on the device behind `token`
    pub fn new(token: ContextToken, handle: H) -> Self {
        Self { handle, token: Some(token) }
    }

    /// Empty wrapper owning nothing
    pub fn null() -> Self {
        Self { handle: H::NULL, token: None }
    }

    /// Raw handle (null once released)
    pub fn get(&self) -> H {
        self.handle
    }

    pub fn is_live(&self) -> bool {
        !self.handle.is_null()
    }

    /// Token of the owning device while the object is live
    pub fn token(&self) -> Option<&ContextToken> {
        self.token.as_ref()
    }

    /// Destroy the object if still live
    ///
    /// Returns whether something was destroyed. Safe to call repeatedly.
    pub fn release(&mut self) -> bool {
        if self.handle.is_null() {
            self.token = None;
            return false;
        }
        if let Some(token) = self.token.take() {
            self.handle.destroy(token.backend(), token.device());
        }
        self.handle = H::NULL;
        true
    }
}

impl<H: DeviceObject> std::fmt::Debug for UniqueHandle<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("UniqueHandle").field(&self.handle).finish()
    }
}

impl<H: DeviceObject> Drop for UniqueHandle<H> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
#[path = "owned_tests.rs"]
mod tests;
