pub use back_buffer::D3D12BackBuffer;
pub use renderer::D3D12Renderer;

use core::mem::{ManuallyDrop, transmute_copy};

use present_capture::PlatformError;
use windows::Win32::Graphics::{
    Direct3D::D3D_FEATURE_LEVEL_11_0,
    Direct3D12::{
        D3D12_RESOURCE_BARRIER, D3D12_RESOURCE_BARRIER_0, D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
        D3D12_RESOURCE_BARRIER_FLAG_NONE, D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        D3D12_RESOURCE_STATES, D3D12_RESOURCE_TRANSITION_BARRIER, D3D12CreateDevice,
        ID3D12Device, ID3D12Resource,
    },
    Dxgi::{DXGI_ERROR_UNSUPPORTED, IDXGIAdapter, IDXGIFactory4},
};

use crate::{Label, result::missing};

mod back_buffer;
mod fence;
mod renderer;

/// Creates a device on the default adapter, falling back to WARP.
pub(crate) fn create_device(factory: &IDXGIFactory4) -> Result<ID3D12Device, PlatformError> {
    let mut device: Option<ID3D12Device> = None;

    match unsafe { D3D12CreateDevice(None, D3D_FEATURE_LEVEL_11_0, &mut device) }
        .label("D3D12CreateDevice")
    {
        Ok(()) => device.ok_or_else(|| missing("D3D12CreateDevice")),

        Err(e) if e.code == DXGI_ERROR_UNSUPPORTED.0 => {
            let adapter: IDXGIAdapter =
                unsafe { factory.EnumWarpAdapter() }.label("IDXGIFactory4::EnumWarpAdapter")?;

            let mut device: Option<ID3D12Device> = None;
            unsafe { D3D12CreateDevice(&adapter, D3D_FEATURE_LEVEL_11_0, &mut device) }
                .label("D3D12CreateDevice")?;

            device.ok_or_else(|| missing("D3D12CreateDevice"))
        }

        Err(e) => Err(e),
    }
}

/// A transition of every subresource between two states.
///
/// The barrier borrows `resource` without adding a reference.
pub(crate) fn transition_barrier(
    resource: &ID3D12Resource,
    before: D3D12_RESOURCE_STATES,
    after: D3D12_RESOURCE_STATES,
) -> D3D12_RESOURCE_BARRIER {
    D3D12_RESOURCE_BARRIER {
        Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
        Anonymous: D3D12_RESOURCE_BARRIER_0 {
            Transition: ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                pResource: unsafe { transmute_copy(resource) },
                Subresource: D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
                StateBefore: before,
                StateAfter: after,
            }),
        },
    }
}
