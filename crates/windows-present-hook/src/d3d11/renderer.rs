use core::time::Duration;

use present_capture::{
    ApiGeneration, BackBuffer, InitializationFailure, PlatformError, ReadbackFailure, RenderError,
    RendererCapability, SurfaceId,
};
use tracing::{debug, instrument};
use windows::Win32::Graphics::{
    Direct3D11::{ID3D11Device, ID3D11DeviceContext, ID3D11RenderTargetView, ID3D11Texture2D},
    Dxgi::{
        Common::{
            DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_FORMAT_UNKNOWN, DXGI_MODE_DESC, DXGI_RATIONAL,
            DXGI_SAMPLE_DESC,
        },
        DXGI_PRESENT, DXGI_SWAP_CHAIN_DESC, DXGI_SWAP_CHAIN_FLAG, DXGI_SWAP_EFFECT_SEQUENTIAL,
        DXGI_USAGE_RENDER_TARGET_OUTPUT, IDXGISwapChain,
    },
};

use super::{D3D11BackBuffer, DeviceAndSwapChain, create_device_and_swap_chain};
use crate::{Label, hwnd, is_live_window, result::missing};

struct Resources {
    device: ID3D11Device,
    context: ID3D11DeviceContext,
    swap_chain: IDXGISwapChain,
    render_target: Option<ID3D11RenderTargetView>,
    size: [u32; 2],
    presented: bool,
}

/// Clears and presents a single buffered Direct3D 11 swapchain.
///
/// The swapchain uses the sequential blit model so the back buffer keeps the presented image
/// until the next frame is recorded.
#[derive(Default)]
pub struct D3D11Renderer {
    resources: Option<Resources>,
}

impl D3D11Renderer {
    /// Creates an uninitialized renderer.
    pub fn new() -> Self {
        Self::default()
    }

    fn resources(&self) -> Result<&Resources, RenderError> {
        self.resources.as_ref().ok_or(RenderError::NotInitialized)
    }

    fn resources_mut(&mut self) -> Result<&mut Resources, RenderError> {
        self.resources.as_mut().ok_or(RenderError::NotInitialized)
    }
}

impl Resources {
    fn create_render_target(&mut self) -> Result<(), PlatformError> {
        let back_buffer: ID3D11Texture2D =
            unsafe { self.swap_chain.GetBuffer(0) }.label("IDXGISwapChain::GetBuffer")?;

        let mut render_target = None;
        unsafe {
            self.device
                .CreateRenderTargetView(&back_buffer, None, Some(&mut render_target))
        }
        .label("ID3D11Device::CreateRenderTargetView")?;

        self.render_target = Some(
            render_target.ok_or_else(|| missing("ID3D11Device::CreateRenderTargetView"))?,
        );

        Ok(())
    }
}

impl RendererCapability for D3D11Renderer {
    fn generation(&self) -> ApiGeneration {
        ApiGeneration::D3D11
    }

    #[instrument("D3D11Renderer::initialize", skip(self), err)]
    fn initialize(
        &mut self,
        surface: SurfaceId,
        width: u32,
        height: u32,
    ) -> Result<(), InitializationFailure> {
        if self.resources.is_some() {
            return Err(InitializationFailure::AlreadyInitialized);
        }

        if !is_live_window(surface) {
            return Err(InitializationFailure::InvalidSurface(surface));
        }

        if width == 0 || height == 0 {
            return Err(InitializationFailure::InvalidSize { width, height });
        }

        let desc = DXGI_SWAP_CHAIN_DESC {
            BufferDesc: DXGI_MODE_DESC {
                Width: width,
                Height: height,
                RefreshRate: DXGI_RATIONAL {
                    Numerator: 0,
                    Denominator: 1,
                },
                Format: DXGI_FORMAT_B8G8R8A8_UNORM,
                ..DXGI_MODE_DESC::default()
            },
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: 1,
            OutputWindow: hwnd(surface),
            Windowed: true.into(),
            SwapEffect: DXGI_SWAP_EFFECT_SEQUENTIAL,
            Flags: 0,
        };

        let DeviceAndSwapChain {
            device,
            context,
            swap_chain,
        } = create_device_and_swap_chain(&desc).map_err(InitializationFailure::CreateDevice)?;

        let mut resources = Resources {
            device,
            context,
            swap_chain,
            render_target: None,
            size: [width, height],
            presented: false,
        };
        resources
            .create_render_target()
            .map_err(InitializationFailure::CreateRenderTargets)?;

        self.resources = Some(resources);
        debug!("Created Direct3D 11 swapchain for {surface}");

        Ok(())
    }

    fn render(&mut self, color: [f32; 4]) -> Result<(), RenderError> {
        let resources = self.resources()?;
        let render_target = resources
            .render_target
            .as_ref()
            .ok_or(RenderError::NotInitialized)?;

        unsafe {
            resources
                .context
                .OMSetRenderTargets(Some(&[Some(render_target.clone())]), None);
            resources.context.ClearRenderTargetView(render_target, &color);
        }

        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let resources = self.resources_mut()?;

        unsafe { resources.swap_chain.Present(1, DXGI_PRESENT(0)) }
            .ok()
            .label("IDXGISwapChain::Present")
            .map_err(RenderError::Present)?;
        resources.presented = true;

        Ok(())
    }

    fn current_back_buffer(&self) -> Result<Box<dyn BackBuffer + '_>, ReadbackFailure> {
        let resources = self
            .resources
            .as_ref()
            .filter(|resources| resources.presented)
            .ok_or(ReadbackFailure::NothingPresented)?;

        Ok(Box::new(D3D11BackBuffer::from_swap_chain(
            &resources.swap_chain,
        )?))
    }

    fn wait_for_buffer_ready(&self, _timeout: Duration) -> Result<(), RenderError> {
        self.resources()?;
        Ok(())
    }

    #[instrument("D3D11Renderer::resize", skip(self), err)]
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        let resources = self.resources_mut()?;

        if width == 0 || height == 0 || resources.size == [width, height] {
            return Ok(());
        }

        unsafe { resources.context.OMSetRenderTargets(None, None) };
        resources.render_target = None;

        unsafe {
            resources.swap_chain.ResizeBuffers(
                0,
                width,
                height,
                DXGI_FORMAT_UNKNOWN,
                DXGI_SWAP_CHAIN_FLAG(0),
            )
        }
        .label("IDXGISwapChain::ResizeBuffers")
        .map_err(RenderError::Resize)?;

        resources
            .create_render_target()
            .map_err(RenderError::Resize)?;
        resources.size = [width, height];
        resources.presented = false;

        Ok(())
    }

    fn destroy(&mut self) {
        if let Some(resources) = self.resources.take() {
            unsafe {
                resources.context.OMSetRenderTargets(None, None);
                resources.context.ClearState();
                resources.context.Flush();
            }
        }
    }

    fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }
}
