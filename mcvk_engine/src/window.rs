/// Window collaborator traits
///
/// The engine never talks to a windowing library directly. The application
/// implements these traits over its window type.

/// Size of the drawable area in pixels
pub trait DrawableSize {
    fn drawable_size(&self) -> (u32, u32);
}

/// Event source driving [`Renderer::run`](crate::renderer::Renderer::run)
pub trait Window: DrawableSize {
    /// The user asked to close the window
    fn should_close(&self) -> bool;

    /// Process pending window events without blocking
    fn poll_events(&mut self);
}
