use alloc::sync::Arc;

use parking_lot::{RwLock, const_rwlock};
use present_capture::{
    ApiGeneration, HookError, InterceptionProvider, PresentObserver, SurfaceId,
};
use tracing::{info, instrument};

use crate::is_live_window;
use vtable::PresentSlot;

mod detour;
mod vtable;

/// Every DXGI swapchain shares one `Present` slot, so both generations share this table.
static HOOK: RwLock<HookTable> = const_rwlock(HookTable::new());

struct HookTable {
    /// Discovered once and kept, so late calls through a stale pointer can still forward.
    slot: Option<PresentSlot>,
    patched: bool,
    observers: [Option<Arc<dyn PresentObserver>>; 2],
}

impl HookTable {
    const fn new() -> Self {
        Self {
            slot: None,
            patched: false,
            observers: [None, None],
        }
    }
}

fn generation_index(generation: ApiGeneration) -> usize {
    match generation {
        ApiGeneration::D3D11 => 0,
        ApiGeneration::D3D12 => 1,
    }
}

/// Intercepts `IDXGISwapChain::Present` for swapchains of one generation.
///
/// The slot is patched while any generation is installed and restored once the last one is
/// removed.
pub struct DxgiPresentHook {
    generation: ApiGeneration,
}

impl DxgiPresentHook {
    /// Creates a provider for `generation`.
    pub fn new(generation: ApiGeneration) -> Self {
        Self { generation }
    }

    /// If the shared `Present` slot currently points at the detour.
    pub fn is_patched() -> bool {
        let table = HOOK.read();

        match table.slot {
            Some(slot) => slot.current() == detour::present as usize,
            None => false,
        }
    }
}

impl InterceptionProvider for DxgiPresentHook {
    fn generation(&self) -> ApiGeneration {
        self.generation
    }

    #[instrument("DxgiPresentHook::install", skip_all, fields(generation = %self.generation), err)]
    fn install(&self, observer: Arc<dyn PresentObserver>) -> Result<(), HookError> {
        let mut table = HOOK.write();
        let index = generation_index(self.generation);

        if table.observers[index].is_some() {
            return Err(HookError::AlreadyHooked(self.generation));
        }

        if !table.patched {
            let slot = match table.slot {
                Some(slot) => slot,
                None => {
                    let slot = PresentSlot::discover().map_err(HookError::PatchFailed)?;
                    table.slot = Some(slot);
                    slot
                }
            };

            slot.patch(detour::present)
                .map_err(HookError::PatchFailed)?;
            table.patched = true;
            info!("Patched IDXGISwapChain::Present");
        }

        table.observers[index] = Some(observer);

        Ok(())
    }

    #[instrument("DxgiPresentHook::remove", skip_all, fields(generation = %self.generation), err)]
    fn remove(&self) -> Result<(), HookError> {
        let mut table = HOOK.write();
        table.observers[generation_index(self.generation)] = None;

        if !table.patched || table.observers.iter().any(Option::is_some) {
            return Ok(());
        }

        if let Some(slot) = table.slot {
            slot.restore().map_err(HookError::PatchFailed)?;
            info!("Restored IDXGISwapChain::Present");
        }
        table.patched = false;

        Ok(())
    }

    fn is_live_surface(&self, surface: SurfaceId) -> bool {
        is_live_window(surface)
    }
}
