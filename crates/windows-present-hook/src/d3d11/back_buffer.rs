use core::{slice, time::Duration};

use present_capture::{BackBuffer, PlatformError, ReadbackFailure, StagingImage};
use tracing::trace;
use windows::Win32::Graphics::{
    Direct3D11::{
        D3D11_CPU_ACCESS_READ, D3D11_MAP_READ, D3D11_MAPPED_SUBRESOURCE, D3D11_TEXTURE2D_DESC,
        D3D11_USAGE_DEFAULT, D3D11_USAGE_STAGING, ID3D11Device, ID3D11DeviceContext,
        ID3D11Resource, ID3D11Texture2D,
    },
    Dxgi::{Common::DXGI_SAMPLE_DESC, IDXGISwapChain},
};
use windows_core::Interface;

use crate::{Label, format::pixel_format, result::missing};

/// The current back buffer of a Direct3D 11 swapchain.
///
/// Direct3D 11 executes on an immediate context, so the buffer is ready as soon as present is
/// called.
pub struct D3D11BackBuffer {
    device: ID3D11Device,
    context: ID3D11DeviceContext,
    texture: ID3D11Texture2D,
}

impl D3D11BackBuffer {
    /// Resolves the current back buffer of a swapchain created on a Direct3D 11 device.
    pub fn from_swap_chain(swap_chain: &IDXGISwapChain) -> Result<Self, ReadbackFailure> {
        let device: ID3D11Device = unsafe { swap_chain.GetDevice() }
            .label("IDXGISwapChain::GetDevice")
            .map_err(ReadbackFailure::NoBackBuffer)?;

        let context = unsafe { device.GetImmediateContext() }
            .label("ID3D11Device::GetImmediateContext")
            .map_err(ReadbackFailure::NoBackBuffer)?;

        let texture: ID3D11Texture2D = unsafe { swap_chain.GetBuffer(0) }
            .label("IDXGISwapChain::GetBuffer")
            .map_err(ReadbackFailure::NoBackBuffer)?;

        Ok(Self {
            device,
            context,
            texture,
        })
    }

    fn create_texture(
        &self,
        desc: &D3D11_TEXTURE2D_DESC,
    ) -> Result<ID3D11Texture2D, PlatformError> {
        let mut texture = None;
        unsafe { self.device.CreateTexture2D(desc, None, Some(&mut texture)) }
            .label("ID3D11Device::CreateTexture2D")?;

        texture.ok_or_else(|| missing("ID3D11Device::CreateTexture2D"))
    }

    /// A single sampled copy of the back buffer.
    fn resolved_source(
        &self,
        source_desc: &D3D11_TEXTURE2D_DESC,
    ) -> Result<ID3D11Texture2D, PlatformError> {
        if source_desc.SampleDesc.Count <= 1 {
            return Ok(self.texture.clone());
        }

        trace!(
            "Resolving back buffer with {} samples",
            source_desc.SampleDesc.Count
        );

        let resolved_desc = D3D11_TEXTURE2D_DESC {
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Usage: D3D11_USAGE_DEFAULT,
            BindFlags: 0,
            CPUAccessFlags: 0,
            MiscFlags: 0,
            ..*source_desc
        };
        let resolved = self.create_texture(&resolved_desc)?;

        let resolved_resource: ID3D11Resource = resolved.cast().label("Interface::cast")?;
        let source_resource: ID3D11Resource = self.texture.cast().label("Interface::cast")?;
        unsafe {
            self.context.ResolveSubresource(
                Some(&resolved_resource),
                0,
                Some(&source_resource),
                0,
                source_desc.Format,
            )
        };

        Ok(resolved)
    }
}

impl BackBuffer for D3D11BackBuffer {
    fn wait_for_buffer_ready(&self, _timeout: Duration) -> Result<(), ReadbackFailure> {
        Ok(())
    }

    fn copy_to_staging(&self) -> Result<StagingImage, ReadbackFailure> {
        let mut source_desc = D3D11_TEXTURE2D_DESC::default();
        unsafe { self.texture.GetDesc(&mut source_desc) };

        let format = pixel_format(source_desc.Format)?;
        let source = self
            .resolved_source(&source_desc)
            .map_err(ReadbackFailure::Copy)?;

        let staging_desc = D3D11_TEXTURE2D_DESC {
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            BindFlags: 0,
            MiscFlags: 0,
            Usage: D3D11_USAGE_STAGING,
            CPUAccessFlags: D3D11_CPU_ACCESS_READ.0 as u32,
            ..source_desc
        };
        let staging = self
            .create_texture(&staging_desc)
            .map_err(ReadbackFailure::Copy)?;

        let staging_resource: ID3D11Resource = staging
            .cast()
            .label("Interface::cast")
            .map_err(ReadbackFailure::Copy)?;
        let source_resource: ID3D11Resource = source
            .cast()
            .label("Interface::cast")
            .map_err(ReadbackFailure::Copy)?;
        unsafe {
            self.context
                .CopyResource(Some(&staging_resource), Some(&source_resource))
        };

        let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
        unsafe {
            self.context.Map(
                Some(&staging_resource),
                0,
                D3D11_MAP_READ,
                0,
                Some(&mut mapped),
            )
        }
        .label("ID3D11DeviceContext::Map")
        .map_err(ReadbackFailure::Map)?;

        let row_pitch = mapped.RowPitch as usize;
        let row_bytes = staging_desc.Width as usize * format.bytes_per_pixel();
        let len = match (staging_desc.Height as usize).checked_sub(1) {
            Some(full_rows) => full_rows * row_pitch + row_bytes,
            None => 0,
        };

        let data = if mapped.pData.is_null() || len == 0 {
            Vec::new()
        } else {
            unsafe { slice::from_raw_parts(mapped.pData as *const u8, len) }.to_vec()
        };

        unsafe { self.context.Unmap(Some(&staging_resource), 0) };

        Ok(StagingImage {
            width: staging_desc.Width,
            height: staging_desc.Height,
            format,
            row_pitch,
            data,
        })
    }
}
