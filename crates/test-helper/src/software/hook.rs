use alloc::sync::Arc;

use present_capture::{
    ApiGeneration, HookError, InterceptionProvider, PresentObserver, SurfaceId,
};

use super::SoftwareDriver;

/// Intercepts the presentation slot of a software driver.
pub struct SoftwareHook {
    driver: Arc<SoftwareDriver>,
}

impl SoftwareHook {
    /// Creates a provider for `driver`.
    pub fn new(driver: &Arc<SoftwareDriver>) -> Self {
        Self {
            driver: Arc::clone(driver),
        }
    }
}

impl InterceptionProvider for SoftwareHook {
    fn generation(&self) -> ApiGeneration {
        self.driver.generation()
    }

    fn install(&self, observer: Arc<dyn PresentObserver>) -> Result<(), HookError> {
        self.driver.patch(observer)
    }

    fn remove(&self) -> Result<(), HookError> {
        self.driver.restore();
        Ok(())
    }

    fn is_live_surface(&self, surface: SurfaceId) -> bool {
        self.driver.is_live(surface)
    }
}
