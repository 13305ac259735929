use alloc::sync::Arc;
use core::time::Duration;

use present_capture::{
    ApiGeneration, BackBuffer, InitializationFailure, PixelFormat, ReadbackFailure, RenderError,
    RendererCapability, SurfaceId,
};

use super::{PresentStatus, SoftwareDriver, SoftwareSwapChain};

/// A renderer drawing into a software swapchain.
pub struct SoftwareRenderer {
    driver: Arc<SoftwareDriver>,
    format: PixelFormat,
    swap_chain: Option<SoftwareSwapChain>,
    last_status: Option<PresentStatus>,
}

impl SoftwareRenderer {
    /// Creates a renderer with 8 bit BGRA back buffers.
    pub fn new(driver: &Arc<SoftwareDriver>) -> Self {
        Self::with_format(driver, PixelFormat::Bgra8Unorm)
    }

    /// Creates a renderer with back buffers of `format`.
    pub fn with_format(driver: &Arc<SoftwareDriver>, format: PixelFormat) -> Self {
        Self {
            driver: Arc::clone(driver),
            format,
            swap_chain: None,
            last_status: None,
        }
    }

    /// The swapchain, once initialized.
    pub fn swap_chain(&self) -> Option<&SoftwareSwapChain> {
        self.swap_chain.as_ref()
    }

    /// The status the most recent present returned.
    pub fn last_status(&self) -> Option<PresentStatus> {
        self.last_status
    }

    fn initialized_swap_chain(&self) -> Result<&SoftwareSwapChain, RenderError> {
        self.swap_chain.as_ref().ok_or(RenderError::NotInitialized)
    }
}

impl RendererCapability for SoftwareRenderer {
    fn generation(&self) -> ApiGeneration {
        self.driver.generation()
    }

    fn initialize(
        &mut self,
        surface: SurfaceId,
        width: u32,
        height: u32,
    ) -> Result<(), InitializationFailure> {
        if self.swap_chain.is_some() {
            return Err(InitializationFailure::AlreadyInitialized);
        }

        if !self.driver.is_live(surface) {
            return Err(InitializationFailure::InvalidSurface(surface));
        }

        let swap_chain =
            SoftwareSwapChain::new(self.generation(), surface, width, height, self.format)?;
        self.swap_chain = Some(swap_chain);
        self.last_status = None;

        Ok(())
    }

    fn render(&mut self, color: [f32; 4]) -> Result<(), RenderError> {
        self.initialized_swap_chain()?.clear(color);
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let status = self.driver.present(self.initialized_swap_chain()?);
        self.last_status = Some(status);
        Ok(())
    }

    fn current_back_buffer(&self) -> Result<Box<dyn BackBuffer + '_>, ReadbackFailure> {
        let swap_chain = self
            .swap_chain
            .as_ref()
            .ok_or(ReadbackFailure::NothingPresented)?;
        let index = swap_chain
            .presented_index()
            .ok_or(ReadbackFailure::NothingPresented)?;

        Ok(Box::new(swap_chain.back_buffer(index)))
    }

    fn wait_for_buffer_ready(&self, timeout: Duration) -> Result<(), RenderError> {
        if self.initialized_swap_chain()?.wait_idle(timeout) {
            Ok(())
        } else {
            Err(RenderError::Timeout(timeout))
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.initialized_swap_chain()?.resize(width, height);
        Ok(())
    }

    fn destroy(&mut self) {
        self.swap_chain = None;
        self.last_status = None;
    }

    fn is_initialized(&self) -> bool {
        self.swap_chain.is_some()
    }
}
