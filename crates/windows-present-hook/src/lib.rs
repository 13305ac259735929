//! # Windows Present Hook
//! Direct3D 11 and Direct3D 12 backends for present capture: renderers presenting to a native
//! window, readback of DXGI back buffers, and the detour of the shared DXGI `Present` slot.
//!

#![cfg(windows)]

extern crate alloc;

use present_capture::{ApiGeneration, InterceptionProvider, RendererCapability};

pub use d3d11::{D3D11BackBuffer, D3D11Renderer};
pub use d3d12::{D3D12BackBuffer, D3D12Renderer};
pub use dxgi_hook::DxgiPresentHook;
pub use result::Label;
pub use window::{StaticWindow, hwnd, is_live_window, surface_id};

mod d3d11;
mod d3d12;
mod dxgi_hook;
mod format;
mod result;
mod window;

/// Creates the renderer for a generation.
pub fn create_renderer(generation: ApiGeneration) -> Box<dyn RendererCapability> {
    match generation {
        ApiGeneration::D3D11 => Box::new(D3D11Renderer::new()),
        ApiGeneration::D3D12 => Box::new(D3D12Renderer::new()),
    }
}

/// Creates the interception provider for a generation.
pub fn create_interception_provider(generation: ApiGeneration) -> Box<dyn InterceptionProvider> {
    Box::new(DxgiPresentHook::new(generation))
}
