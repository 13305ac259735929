use alloc::sync::Arc;

use present_capture::{SurfaceId, SurfaceWindow};

use super::SoftwareDriver;

/// A window registered with a software driver, destroyed on drop.
pub struct SoftwareWindow {
    driver: Arc<SoftwareDriver>,
    id: SurfaceId,
}

impl SoftwareWindow {
    pub(super) fn new(driver: Arc<SoftwareDriver>, id: SurfaceId) -> Self {
        Self { driver, id }
    }

    /// Identity of the window.
    pub fn id(&self) -> SurfaceId {
        self.id
    }
}

impl SurfaceWindow for SoftwareWindow {
    fn surface_id(&self) -> SurfaceId {
        self.id
    }

    fn show(&self) {
        self.driver.set_visible(self.id, true);
    }
}

impl Drop for SoftwareWindow {
    fn drop(&mut self) {
        self.driver.destroy_window(self.id);
    }
}
