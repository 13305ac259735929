use core::{ffi::c_void, mem};

use present_capture::PlatformError;
use tracing::debug;
use windows::Win32::{
    Graphics::Dxgi::{
        Common::{DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_MODE_DESC, DXGI_SAMPLE_DESC},
        DXGI_SWAP_CHAIN_DESC, DXGI_SWAP_EFFECT_DISCARD, DXGI_USAGE_RENDER_TARGET_OUTPUT,
    },
    System::Memory::{PAGE_EXECUTE_READWRITE, PAGE_PROTECTION_FLAGS, VirtualProtect},
};
use windows_core::{HRESULT, Interface};

use crate::{Label, StaticWindow, d3d11::create_device_and_swap_chain};

/// Signature of `IDXGISwapChain::Present`.
pub(super) type PresentFn =
    unsafe extern "system" fn(this: *mut c_void, sync_interval: u32, flags: u32) -> HRESULT;

/// Index of `Present` in the `IDXGISwapChain` vtable, after the three `IUnknown`, four
/// `IDXGIObject`, and one `IDXGIDeviceSubObject` methods.
const PRESENT_INDEX: usize = 8;

/// The `Present` entry of the vtable shared by every DXGI swapchain in the process.
#[derive(Clone, Copy)]
pub(super) struct PresentSlot {
    entry: usize,
    original: PresentFn,
}

impl PresentSlot {
    /// Finds the entry through a throw away swapchain on a hidden window.
    pub fn discover() -> Result<Self, PlatformError> {
        let window = StaticWindow::new("Present Hook", 64, 64)?;

        let desc = DXGI_SWAP_CHAIN_DESC {
            BufferDesc: DXGI_MODE_DESC {
                Width: 64,
                Height: 64,
                Format: DXGI_FORMAT_B8G8R8A8_UNORM,
                ..DXGI_MODE_DESC::default()
            },
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: 1,
            OutputWindow: window.hwnd(),
            Windowed: true.into(),
            SwapEffect: DXGI_SWAP_EFFECT_DISCARD,
            Flags: 0,
        };

        let swap_chain = create_device_and_swap_chain(&desc)?.swap_chain;

        let slot = unsafe {
            let vtable = *(swap_chain.as_raw() as *const *const usize);
            let entry = vtable.add(PRESENT_INDEX);
            let original = mem::transmute::<usize, PresentFn>(*entry);

            Self {
                entry: entry as usize,
                original,
            }
        };

        debug!("Found IDXGISwapChain::Present at {:#x}", slot.original as usize);

        Ok(slot)
    }

    /// The implementation the slot held when it was discovered.
    pub fn original(&self) -> PresentFn {
        self.original
    }

    /// The function the slot currently points to.
    pub fn current(&self) -> usize {
        unsafe { (self.entry as *const usize).read_volatile() }
    }

    /// Points the slot at `detour`.
    pub fn patch(&self, detour: PresentFn) -> Result<(), PlatformError> {
        self.write(detour as usize)
    }

    /// Points the slot back at the original `Present`.
    pub fn restore(&self) -> Result<(), PlatformError> {
        self.write(self.original as usize)
    }

    fn write(&self, function: usize) -> Result<(), PlatformError> {
        let entry = self.entry as *mut usize;
        let size = mem::size_of::<usize>();

        let mut previous = PAGE_PROTECTION_FLAGS::default();
        unsafe {
            VirtualProtect(
                entry as *const c_void,
                size,
                PAGE_EXECUTE_READWRITE,
                &mut previous,
            )
        }
        .label("VirtualProtect")?;

        unsafe { entry.write_volatile(function) };

        let mut unused = PAGE_PROTECTION_FLAGS::default();
        unsafe { VirtualProtect(entry as *const c_void, size, previous, &mut unused) }
            .label("VirtualProtect")?;

        Ok(())
    }
}
