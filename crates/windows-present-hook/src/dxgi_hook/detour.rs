use core::{ffi::c_void, panic::AssertUnwindSafe};
use std::panic;

use present_capture::{
    ApiGeneration, BackBuffer, PresentObserver, PresentedSurface, ReadbackFailure, SurfaceId,
    dispatch_present,
};
use tracing::error;
use windows::Win32::Graphics::{
    Direct3D11::ID3D11Device,
    Direct3D12::ID3D12CommandQueue,
    Dxgi::{DXGI_ERROR_INVALID_CALL, IDXGISwapChain},
};
use windows_core::{HRESULT, Interface};

use super::{HOOK, generation_index};
use crate::{D3D11BackBuffer, D3D12BackBuffer, surface_id};

/// Replacement for `IDXGISwapChain::Present`.
///
/// The observer of the presenting device's generation sees the swapchain first, then the
/// original is called exactly once with the untouched arguments.
pub(super) unsafe extern "system" fn present(
    this: *mut c_void,
    sync_interval: u32,
    flags: u32,
) -> HRESULT {
    let (original, observers) = {
        let table = HOOK.read();
        (
            table.slot.map(|slot| slot.original()),
            table.observers.clone(),
        )
    };

    let Some(original) = original else {
        return DXGI_ERROR_INVALID_CALL;
    };
    let forward = || unsafe { original(this, sync_interval, flags) };

    if observers.iter().all(Option::is_none) {
        return forward();
    }

    let Some(swap_chain) = (unsafe { IDXGISwapChain::from_raw_borrowed(&this) }) else {
        return forward();
    };

    let Some(generation) = generation_of(swap_chain) else {
        return forward();
    };

    let observer = observers[generation_index(generation)]
        .as_deref()
        .map(ContainedObserver);
    let surface = HookedSurface {
        swap_chain,
        generation,
    };

    dispatch_present(
        observer.as_ref().map(|observer| observer as &dyn PresentObserver),
        &surface,
        forward,
    )
}

/// The generation of the device a swapchain presents for.
///
/// A Direct3D 12 swapchain reports its command queue as the device.
fn generation_of(swap_chain: &IDXGISwapChain) -> Option<ApiGeneration> {
    if unsafe { swap_chain.GetDevice::<ID3D12CommandQueue>() }.is_ok() {
        Some(ApiGeneration::D3D12)
    } else if unsafe { swap_chain.GetDevice::<ID3D11Device>() }.is_ok() {
        Some(ApiGeneration::D3D11)
    } else {
        None
    }
}

/// Keeps a panicking observer from unwinding into the caller of `Present`.
struct ContainedObserver<'a>(&'a dyn PresentObserver);

impl PresentObserver for ContainedObserver<'_> {
    fn on_present(&self, surface: &dyn PresentedSurface) {
        if panic::catch_unwind(AssertUnwindSafe(|| self.0.on_present(surface))).is_err() {
            error!("Present observer panicked, forwarding the call");
        }
    }
}

/// A swapchain in the middle of a `Present` call.
struct HookedSurface<'a> {
    swap_chain: &'a IDXGISwapChain,
    generation: ApiGeneration,
}

impl PresentedSurface for HookedSurface<'_> {
    fn surface_id(&self) -> Option<SurfaceId> {
        let desc = unsafe { self.swap_chain.GetDesc() }.ok()?;
        let surface = surface_id(desc.OutputWindow);

        (!surface.is_null()).then_some(surface)
    }

    fn back_buffer(&self) -> Result<Box<dyn BackBuffer + '_>, ReadbackFailure> {
        match self.generation {
            ApiGeneration::D3D11 => Ok(Box::new(D3D11BackBuffer::from_swap_chain(
                self.swap_chain,
            )?)),
            ApiGeneration::D3D12 => Ok(Box::new(D3D12BackBuffer::from_swap_chain(
                self.swap_chain,
            )?)),
        }
    }
}
