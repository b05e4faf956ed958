/// Opaque GPU object handles
///
/// Every backend object is identified by a `u64` wrapped in a dedicated
/// newtype, so a fence can never be passed where a semaphore is expected.
/// `0` is the null handle for every type.

macro_rules! define_handles {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
            pub struct $name(u64);

            impl $name {
                /// The null handle
                pub const NULL: Self = Self(0);

                pub const fn from_raw(raw: u64) -> Self {
                    Self(raw)
                }

                pub const fn as_raw(self) -> u64 {
                    self.0
                }

                pub const fn is_null(self) -> bool {
                    self.0 == 0
                }
            }
        )*
    };
}

define_handles! {
    /// Physical accelerator (not owned, enumerated from the instance)
    PhysicalDeviceHandle,
    /// Logical device
    DeviceHandle,
    /// Device queue (owned by the device)
    QueueHandle,
    /// Presentation surface (owned by the instance)
    SurfaceHandle,
    SwapchainHandle,
    /// Swapchain image (owned by the swapchain)
    ImageHandle,
    ImageViewHandle,
    FramebufferHandle,
    RenderPassHandle,
    PipelineLayoutHandle,
    PipelineHandle,
    ShaderModuleHandle,
    SemaphoreHandle,
    FenceHandle,
    CommandPoolHandle,
    /// Primary command buffer (freed with its pool)
    CommandBufferHandle,
}
