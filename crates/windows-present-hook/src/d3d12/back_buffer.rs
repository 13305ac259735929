use core::{mem::transmute_copy, ptr, slice, time::Duration};

use present_capture::{BackBuffer, PlatformError, ReadbackFailure, StagingImage};
use windows::Win32::Graphics::{
    Direct3D12::{
        D3D12_COMMAND_LIST_TYPE_DIRECT, D3D12_HEAP_FLAG_NONE, D3D12_HEAP_PROPERTIES,
        D3D12_HEAP_TYPE_READBACK, D3D12_PLACED_SUBRESOURCE_FOOTPRINT, D3D12_RESOURCE_DESC,
        D3D12_RESOURCE_DIMENSION_BUFFER, D3D12_RESOURCE_STATE_COPY_DEST,
        D3D12_RESOURCE_STATE_COPY_SOURCE, D3D12_RESOURCE_STATE_PRESENT,
        D3D12_TEXTURE_COPY_LOCATION, D3D12_TEXTURE_COPY_LOCATION_0,
        D3D12_TEXTURE_COPY_TYPE_PLACED_FOOTPRINT, D3D12_TEXTURE_COPY_TYPE_SUBRESOURCE_INDEX,
        D3D12_TEXTURE_LAYOUT_ROW_MAJOR, ID3D12CommandAllocator, ID3D12CommandList,
        ID3D12CommandQueue, ID3D12Device, ID3D12GraphicsCommandList, ID3D12Resource,
    },
    Dxgi::{
        Common::{DXGI_FORMAT_UNKNOWN, DXGI_SAMPLE_DESC},
        IDXGISwapChain, IDXGISwapChain3,
    },
};
use windows_core::Interface;

use super::{fence::GpuFence, transition_barrier};
use crate::{Label, format::pixel_format, result::missing};

/// How long a copy into the readback heap may take.
const COPY_TIMEOUT: Duration = Duration::from_millis(1000);

/// A back buffer of a Direct3D 12 swapchain, read back through the queue that presents it.
///
/// Work on a queue executes in submission order, so signalling a fence on the presenting queue
/// and waiting on it covers every frame submitted before present.
pub struct D3D12BackBuffer {
    device: ID3D12Device,
    queue: ID3D12CommandQueue,
    resource: ID3D12Resource,
    fence: GpuFence,
}

impl D3D12BackBuffer {
    /// Resolves the back buffer a swapchain is about to present.
    ///
    /// A Direct3D 12 swapchain reports the command queue it was created with as its device.
    pub fn from_swap_chain(swap_chain: &IDXGISwapChain) -> Result<Self, ReadbackFailure> {
        let queue: ID3D12CommandQueue = unsafe { swap_chain.GetDevice() }
            .label("IDXGISwapChain::GetDevice")
            .map_err(ReadbackFailure::NoBackBuffer)?;

        let swap_chain_3: IDXGISwapChain3 = swap_chain
            .cast()
            .label("Interface::cast")
            .map_err(ReadbackFailure::NoBackBuffer)?;
        let index = unsafe { swap_chain_3.GetCurrentBackBufferIndex() };

        Self::from_queue(&queue, swap_chain, index)
    }

    /// Resolves buffer `index` of a swapchain presented through `queue`.
    pub fn from_queue(
        queue: &ID3D12CommandQueue,
        swap_chain: &IDXGISwapChain,
        index: u32,
    ) -> Result<Self, ReadbackFailure> {
        let mut device: Option<ID3D12Device> = None;
        unsafe { queue.GetDevice(&mut device) }
            .label("ID3D12CommandQueue::GetDevice")
            .map_err(ReadbackFailure::NoBackBuffer)?;
        let device = device
            .ok_or_else(|| missing("ID3D12CommandQueue::GetDevice"))
            .map_err(ReadbackFailure::NoBackBuffer)?;

        let resource: ID3D12Resource = unsafe { swap_chain.GetBuffer(index) }
            .label("IDXGISwapChain::GetBuffer")
            .map_err(ReadbackFailure::NoBackBuffer)?;

        let fence = GpuFence::new(&device).map_err(ReadbackFailure::Wait)?;

        Ok(Self {
            device,
            queue: queue.clone(),
            resource,
            fence,
        })
    }

    fn create_readback_buffer(&self, size: u64) -> Result<ID3D12Resource, PlatformError> {
        let heap_properties = D3D12_HEAP_PROPERTIES {
            Type: D3D12_HEAP_TYPE_READBACK,
            ..D3D12_HEAP_PROPERTIES::default()
        };

        let desc = D3D12_RESOURCE_DESC {
            Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
            Width: size,
            Height: 1,
            DepthOrArraySize: 1,
            MipLevels: 1,
            Format: DXGI_FORMAT_UNKNOWN,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
            ..D3D12_RESOURCE_DESC::default()
        };

        let mut buffer: Option<ID3D12Resource> = None;
        unsafe {
            self.device.CreateCommittedResource(
                &heap_properties,
                D3D12_HEAP_FLAG_NONE,
                &desc,
                D3D12_RESOURCE_STATE_COPY_DEST,
                None,
                &mut buffer,
            )
        }
        .label("ID3D12Device::CreateCommittedResource")?;

        buffer.ok_or_else(|| missing("ID3D12Device::CreateCommittedResource"))
    }

    /// Records and submits the copy of the back buffer into `readback`.
    fn submit_copy(
        &self,
        readback: &ID3D12Resource,
        footprint: D3D12_PLACED_SUBRESOURCE_FOOTPRINT,
    ) -> Result<(), PlatformError> {
        let allocator: ID3D12CommandAllocator =
            unsafe { self.device.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT) }
                .label("ID3D12Device::CreateCommandAllocator")?;

        let list: ID3D12GraphicsCommandList = unsafe {
            self.device
                .CreateCommandList(0, D3D12_COMMAND_LIST_TYPE_DIRECT, &allocator, None)
        }
        .label("ID3D12Device::CreateCommandList")?;

        let destination = D3D12_TEXTURE_COPY_LOCATION {
            pResource: unsafe { transmute_copy(readback) },
            Type: D3D12_TEXTURE_COPY_TYPE_PLACED_FOOTPRINT,
            Anonymous: D3D12_TEXTURE_COPY_LOCATION_0 {
                PlacedFootprint: footprint,
            },
        };

        let source = D3D12_TEXTURE_COPY_LOCATION {
            pResource: unsafe { transmute_copy(&self.resource) },
            Type: D3D12_TEXTURE_COPY_TYPE_SUBRESOURCE_INDEX,
            Anonymous: D3D12_TEXTURE_COPY_LOCATION_0 {
                SubresourceIndex: 0,
            },
        };

        unsafe {
            list.ResourceBarrier(&[transition_barrier(
                &self.resource,
                D3D12_RESOURCE_STATE_PRESENT,
                D3D12_RESOURCE_STATE_COPY_SOURCE,
            )]);
            list.CopyTextureRegion(&destination, 0, 0, 0, &source, None);
            list.ResourceBarrier(&[transition_barrier(
                &self.resource,
                D3D12_RESOURCE_STATE_COPY_SOURCE,
                D3D12_RESOURCE_STATE_PRESENT,
            )]);
        }

        unsafe { list.Close() }.label("ID3D12GraphicsCommandList::Close")?;

        let list: ID3D12CommandList = list.cast().label("Interface::cast")?;
        unsafe { self.queue.ExecuteCommandLists(&[Some(list)]) };

        Ok(())
    }
}

impl BackBuffer for D3D12BackBuffer {
    fn wait_for_buffer_ready(&self, timeout: Duration) -> Result<(), ReadbackFailure> {
        if self
            .fence
            .flush(&self.queue, timeout)
            .map_err(ReadbackFailure::Wait)?
        {
            Ok(())
        } else {
            Err(ReadbackFailure::Timeout(timeout))
        }
    }

    fn copy_to_staging(&self) -> Result<StagingImage, ReadbackFailure> {
        let desc = unsafe { self.resource.GetDesc() };
        let format = pixel_format(desc.Format)?;

        let mut footprint = D3D12_PLACED_SUBRESOURCE_FOOTPRINT::default();
        let mut total_bytes = 0u64;
        unsafe {
            self.device.GetCopyableFootprints(
                &desc,
                0,
                1,
                0,
                Some(&mut footprint),
                None,
                None,
                Some(&mut total_bytes),
            )
        };

        let readback = self
            .create_readback_buffer(total_bytes)
            .map_err(ReadbackFailure::Copy)?;
        self.submit_copy(&readback, footprint)
            .map_err(ReadbackFailure::Copy)?;

        if !self
            .fence
            .flush(&self.queue, COPY_TIMEOUT)
            .map_err(ReadbackFailure::Wait)?
        {
            return Err(ReadbackFailure::Timeout(COPY_TIMEOUT));
        }

        let mut mapped = ptr::null_mut();
        unsafe { readback.Map(0, None, Some(&mut mapped)) }
            .label("ID3D12Resource::Map")
            .map_err(ReadbackFailure::Map)?;

        let len = usize::try_from(total_bytes).unwrap_or(0);
        let data = if mapped.is_null() || len == 0 {
            Vec::new()
        } else {
            unsafe { slice::from_raw_parts(mapped as *const u8, len) }.to_vec()
        };

        unsafe { readback.Unmap(0, None) };

        Ok(StagingImage {
            width: footprint.Footprint.Width,
            height: footprint.Footprint.Height,
            format,
            row_pitch: footprint.Footprint.RowPitch as usize,
            data,
        })
    }
}
