use core::time::Duration;

use crate::{
    ApiGeneration, InitializationFailure, ReadbackFailure, RenderError, StagingImage, SurfaceId,
};

/// A presentable image that can be copied into CPU memory.
pub trait BackBuffer {
    /// Blocks until the GPU has finished all work writing this buffer, or `timeout` elapses.
    ///
    /// Returns immediately for generations with an immediate submission model.
    fn wait_for_buffer_ready(&self, timeout: Duration) -> Result<(), ReadbackFailure>;

    /// Copies the buffer into a CPU readable staging resource and maps it.
    fn copy_to_staging(&self) -> Result<StagingImage, ReadbackFailure>;
}

/// Creates and drives a presentable surface for one API generation.
///
/// Methods other than [`initialize`](Self::initialize) and [`destroy`](Self::destroy) require
/// an initialized renderer.
pub trait RendererCapability {
    /// The generation this renderer targets.
    fn generation(&self) -> ApiGeneration;

    /// Creates the device, swapchain, and any queue or fence for a native surface.
    fn initialize(
        &mut self,
        surface: SurfaceId,
        width: u32,
        height: u32,
    ) -> Result<(), InitializationFailure>;

    /// Records clearing the current back buffer to `color`.
    fn render(&mut self, color: [f32; 4]) -> Result<(), RenderError>;

    /// Presents the current back buffer.
    fn present(&mut self) -> Result<(), RenderError>;

    /// The back buffer most recently handed to present.
    fn current_back_buffer(&self) -> Result<Box<dyn BackBuffer + '_>, ReadbackFailure>;

    /// Blocks until all submitted work has completed, or `timeout` elapses.
    fn wait_for_buffer_ready(&self, timeout: Duration) -> Result<(), RenderError>;

    /// Recreates the back buffers at a new size.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError>;

    /// Releases every resource, after which the renderer may be initialized again.
    fn destroy(&mut self);

    /// If the renderer currently holds an initialized device.
    fn is_initialized(&self) -> bool;
}

/// The native window backing a presentable surface.
pub trait SurfaceWindow {
    /// Identity of the window.
    fn surface_id(&self) -> SurfaceId;

    /// Makes the window visible.
    fn show(&self);
}
