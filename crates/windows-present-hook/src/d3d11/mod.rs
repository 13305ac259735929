pub use back_buffer::D3D11BackBuffer;
pub use renderer::D3D11Renderer;

use present_capture::PlatformError;
use windows::Win32::{
    Foundation::HMODULE,
    Graphics::{
        Direct3D::{D3D_DRIVER_TYPE, D3D_DRIVER_TYPE_HARDWARE, D3D_DRIVER_TYPE_WARP},
        Direct3D11::{
            D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_SDK_VERSION, D3D11CreateDeviceAndSwapChain,
            ID3D11Device, ID3D11DeviceContext,
        },
        Dxgi::{DXGI_ERROR_UNSUPPORTED, DXGI_SWAP_CHAIN_DESC, IDXGISwapChain},
    },
};

use crate::{Label, result::missing};

mod back_buffer;
mod renderer;

/// A device, its immediate context, and a swapchain presenting to a window.
pub(crate) struct DeviceAndSwapChain {
    pub device: ID3D11Device,
    pub context: ID3D11DeviceContext,
    pub swap_chain: IDXGISwapChain,
}

/// Creates a device and swapchain on the hardware adapter, falling back to WARP.
pub(crate) fn create_device_and_swap_chain(
    desc: &DXGI_SWAP_CHAIN_DESC,
) -> Result<DeviceAndSwapChain, PlatformError> {
    match create_with_driver(desc, D3D_DRIVER_TYPE_HARDWARE) {
        Err(e) if e.code == DXGI_ERROR_UNSUPPORTED.0 => {
            create_with_driver(desc, D3D_DRIVER_TYPE_WARP)
        }
        result => result,
    }
}

fn create_with_driver(
    desc: &DXGI_SWAP_CHAIN_DESC,
    driver_type: D3D_DRIVER_TYPE,
) -> Result<DeviceAndSwapChain, PlatformError> {
    let mut device = None;
    let mut context = None;
    let mut swap_chain = None;

    unsafe {
        D3D11CreateDeviceAndSwapChain(
            None,
            driver_type,
            HMODULE::default(),
            D3D11_CREATE_DEVICE_BGRA_SUPPORT,
            None,
            D3D11_SDK_VERSION,
            Some(desc),
            Some(&mut swap_chain),
            Some(&mut device),
            None,
            Some(&mut context),
        )
    }
    .label("D3D11CreateDeviceAndSwapChain")?;

    Ok(DeviceAndSwapChain {
        device: device.ok_or_else(|| missing("D3D11CreateDeviceAndSwapChain"))?,
        context: context.ok_or_else(|| missing("D3D11CreateDeviceAndSwapChain"))?,
        swap_chain: swap_chain.ok_or_else(|| missing("D3D11CreateDeviceAndSwapChain"))?,
    })
}
