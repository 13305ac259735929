use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, AtomicIsize, AtomicU32, AtomicU64, Ordering};
use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};
use present_capture::{
    ApiGeneration, HookError, PlatformError, PresentObserver, SurfaceId, dispatch_present,
};

use super::{SoftwareSwapChain, SoftwareWindow};

/// Status of a successful present.
pub const S_OK: i32 = 0;

/// Status of a present to a window that is not visible.
pub const DXGI_STATUS_OCCLUDED: i32 = 0x087A0001;

const E_ACCESSDENIED: i32 = 0x80070005_u32 as i32;

/// The result of the original presentation routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentStatus {
    /// Number of frames the swapchain has presented, including this one.
    pub frame: u64,

    /// Status code of the call.
    pub code: i32,
}

enum PresentSlot {
    Original,
    Detour(Arc<dyn PresentObserver>),
}

/// A software graphics driver shared by every window, swapchain, and hook created from it.
pub struct SoftwareDriver {
    generation: ApiGeneration,

    present_slot: RwLock<PresentSlot>,
    refuse_patch: AtomicBool,
    patch_count: AtomicU32,
    restore_count: AtomicU32,
    original_calls: AtomicU64,

    /// Live windows and their visibility.
    windows: Mutex<HashMap<SurfaceId, bool>>,
    next_window: AtomicIsize,
}

impl SoftwareDriver {
    /// Creates a driver for one API generation.
    pub fn new(generation: ApiGeneration) -> Arc<Self> {
        Arc::new(Self {
            generation,

            present_slot: RwLock::new(PresentSlot::Original),
            refuse_patch: AtomicBool::new(false),
            patch_count: AtomicU32::new(0),
            restore_count: AtomicU32::new(0),
            original_calls: AtomicU64::new(0),

            windows: Mutex::new(HashMap::new()),
            next_window: AtomicIsize::new(0x10000),
        })
    }

    /// The generation of this driver.
    pub fn generation(&self) -> ApiGeneration {
        self.generation
    }

    /// Creates a hidden window.
    pub fn create_window(self: &Arc<Self>) -> SoftwareWindow {
        let id = SurfaceId(self.next_window.fetch_add(0x10, Ordering::AcqRel));
        self.windows.lock().insert(id, false);
        SoftwareWindow::new(Arc::clone(self), id)
    }

    /// Destroys a window, its identity no longer refers to a live surface.
    pub fn destroy_window(&self, id: SurfaceId) {
        self.windows.lock().remove(&id);
    }

    /// If `id` refers to a live window.
    pub fn is_live(&self, id: SurfaceId) -> bool {
        self.windows.lock().contains_key(&id)
    }

    /// If `id` refers to a live, visible window.
    pub fn is_visible(&self, id: SurfaceId) -> bool {
        self.windows.lock().get(&id).copied().unwrap_or(false)
    }

    pub(super) fn set_visible(&self, id: SurfaceId, visible: bool) {
        if let Some(window) = self.windows.lock().get_mut(&id) {
            *window = visible;
        }
    }

    /// Makes every following patch attempt fail, or succeed again.
    pub fn refuse_patch(&self, refuse: bool) {
        self.refuse_patch.store(refuse, Ordering::Release);
    }

    /// Number of times the presentation slot was patched.
    pub fn patch_count(&self) -> u32 {
        self.patch_count.load(Ordering::Acquire)
    }

    /// Number of times the original presentation routine was restored.
    pub fn restore_count(&self) -> u32 {
        self.restore_count.load(Ordering::Acquire)
    }

    /// Number of calls that reached the original presentation routine.
    pub fn original_calls(&self) -> u64 {
        self.original_calls.load(Ordering::Acquire)
    }

    /// If the presentation slot currently holds a detour.
    pub fn is_patched(&self) -> bool {
        matches!(*self.present_slot.read(), PresentSlot::Detour(_))
    }

    pub(super) fn patch(&self, observer: Arc<dyn PresentObserver>) -> Result<(), HookError> {
        if self.refuse_patch.load(Ordering::Acquire) {
            return Err(HookError::PatchFailed(PlatformError::new(
                "VirtualProtect",
                E_ACCESSDENIED,
                "Access is denied.",
            )));
        }

        *self.present_slot.write() = PresentSlot::Detour(observer);
        self.patch_count.fetch_add(1, Ordering::AcqRel);

        Ok(())
    }

    pub(super) fn restore(&self) {
        let mut slot = self.present_slot.write();
        if matches!(*slot, PresentSlot::Detour(_)) {
            *slot = PresentSlot::Original;
            self.restore_count.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Calls the presentation routine currently in the slot for `swap_chain`.
    pub fn present(&self, swap_chain: &SoftwareSwapChain) -> PresentStatus {
        let observer = match &*self.present_slot.read() {
            PresentSlot::Original => None,
            PresentSlot::Detour(observer) => Some(Arc::clone(observer)),
        };

        dispatch_present(observer.as_deref(), swap_chain, || {
            self.original_present(swap_chain)
        })
    }

    fn original_present(&self, swap_chain: &SoftwareSwapChain) -> PresentStatus {
        self.original_calls.fetch_add(1, Ordering::AcqRel);

        let frame = swap_chain.advance();
        let code = if self.is_visible(swap_chain.surface()) {
            S_OK
        } else {
            DXGI_STATUS_OCCLUDED
        };

        PresentStatus { frame, code }
    }
}
