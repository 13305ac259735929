use tracing::{info, instrument};

use crate::{
    ApiGeneration, InitializationFailure, RenderError, RendererCapability, SurfaceId,
    SurfaceWindow,
};

/// Colours the self test surface cycles through, one per rendered frame.
const PALETTE: [[f32; 4]; 8] = [
    [1.0, 0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0, 1.0],
    [0.0, 0.0, 1.0, 1.0],
    [1.0, 1.0, 0.0, 1.0],
    [0.0, 1.0, 1.0, 1.0],
    [1.0, 0.0, 1.0, 1.0],
    [1.0, 1.0, 1.0, 1.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// A window with a renderer attached that presents known content every frame.
///
/// Serves as a capture target when no external application is named.
pub struct SelfTestSurface {
    window: Box<dyn SurfaceWindow>,
    renderer: Box<dyn RendererCapability>,
    size: [u32; 2],
    frames_rendered: u64,
}

impl SelfTestSurface {
    /// Creates a surface over a native window, nothing is initialized yet.
    pub fn new(window: Box<dyn SurfaceWindow>, renderer: Box<dyn RendererCapability>) -> Self {
        Self {
            window,
            renderer,
            size: [0, 0],
            frames_rendered: 0,
        }
    }

    /// The colour the frame with the given number is cleared to.
    pub fn frame_color(frame: u64) -> [f32; 4] {
        PALETTE[(frame % PALETTE.len() as u64) as usize]
    }

    /// Creates the renderer's device and swapchain for the window.
    #[instrument("SelfTestSurface::initialize", skip(self), err)]
    pub fn initialize(&mut self, width: u32, height: u32) -> Result<(), InitializationFailure> {
        self.renderer
            .initialize(self.window.surface_id(), width, height)?;
        self.size = [width, height];
        self.frames_rendered = 0;

        info!(
            "Initialized {} self test surface {} at {width}x{height}",
            self.renderer.generation(),
            self.window.surface_id()
        );

        Ok(())
    }

    /// Makes the window visible.
    pub fn show(&self) {
        self.window.show();
    }

    /// Clears the back buffer to the next palette colour and presents it.
    pub fn render_frame(&mut self) -> Result<(), RenderError> {
        let color = Self::frame_color(self.frames_rendered);
        self.renderer.render(color)?;
        self.renderer.present()?;
        self.frames_rendered += 1;

        Ok(())
    }

    /// Recreates the back buffers at a new size.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if self.size == [width, height] {
            return Ok(());
        }

        self.renderer.resize(width, height)?;
        self.size = [width, height];

        Ok(())
    }

    /// Releases the renderer's device and swapchain.
    pub fn uninitialize(&mut self) {
        if self.renderer.is_initialized() {
            self.renderer.destroy();
            info!("Uninitialized {} self test surface", self.generation());
        }
    }

    /// Identity of the window.
    pub fn surface_id(&self) -> SurfaceId {
        self.window.surface_id()
    }

    /// The generation of the attached renderer.
    pub fn generation(&self) -> ApiGeneration {
        self.renderer.generation()
    }

    /// The attached renderer.
    pub fn renderer(&self) -> &dyn RendererCapability {
        self.renderer.as_ref()
    }

    /// The current surface size.
    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    /// Number of frames presented since initialization.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

impl Drop for SelfTestSurface {
    fn drop(&mut self) {
        if self.renderer.is_initialized() {
            self.renderer.destroy();
        }
    }
}
