use core::time::Duration;

use present_capture::{
    ApiGeneration, BackBuffer, InitializationFailure, PlatformError, ReadbackFailure, RenderError,
    RendererCapability, SurfaceId,
};
use tracing::{debug, error, instrument};
use windows::Win32::Graphics::{
    Direct3D12::{
        D3D12_COMMAND_LIST_TYPE_DIRECT, D3D12_COMMAND_QUEUE_DESC, D3D12_CPU_DESCRIPTOR_HANDLE,
        D3D12_DESCRIPTOR_HEAP_DESC, D3D12_DESCRIPTOR_HEAP_TYPE_RTV, D3D12_RESOURCE_STATE_PRESENT,
        D3D12_RESOURCE_STATE_RENDER_TARGET, ID3D12CommandAllocator, ID3D12CommandList,
        ID3D12CommandQueue, ID3D12DescriptorHeap, ID3D12Device, ID3D12GraphicsCommandList,
        ID3D12Resource,
    },
    Dxgi::{
        Common::{DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_FORMAT_UNKNOWN, DXGI_SAMPLE_DESC},
        CreateDXGIFactory2, DXGI_CREATE_FACTORY_FLAGS, DXGI_PRESENT, DXGI_SWAP_CHAIN_DESC1,
        DXGI_SWAP_CHAIN_FLAG, DXGI_SWAP_EFFECT_FLIP_DISCARD, DXGI_USAGE_RENDER_TARGET_OUTPUT,
        IDXGIFactory4, IDXGISwapChain1, IDXGISwapChain3,
    },
};
use windows_core::Interface;

use super::{D3D12BackBuffer, create_device, fence::GpuFence, transition_barrier};
use crate::{Label, hwnd, is_live_window, result::missing};

/// Number of buffers in the flip model swapchain.
const BUFFER_COUNT: u32 = 2;

/// How long present may wait for the GPU to finish the frame.
const PRESENT_TIMEOUT: Duration = Duration::from_millis(1000);

struct Resources {
    device: ID3D12Device,
    queue: ID3D12CommandQueue,
    swap_chain: IDXGISwapChain3,
    rtv_heap: ID3D12DescriptorHeap,
    rtv_size: usize,
    buffers: Vec<ID3D12Resource>,
    allocator: ID3D12CommandAllocator,
    list: ID3D12GraphicsCommandList,
    fence: GpuFence,
    size: [u32; 2],
    presented: Option<u32>,
}

/// Clears and presents a flip model Direct3D 12 swapchain through a direct queue.
///
/// Submission is asynchronous, every present signals a fence and waits on it with a bound.
#[derive(Default)]
pub struct D3D12Renderer {
    resources: Option<Resources>,
}

impl D3D12Renderer {
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
    fn create(surface: SurfaceId, width: u32, height: u32) -> Result<Self, InitializationFailure> {
        let factory: IDXGIFactory4 = unsafe { CreateDXGIFactory2(DXGI_CREATE_FACTORY_FLAGS(0)) }
            .label("CreateDXGIFactory2")
            .map_err(InitializationFailure::CreateDevice)?;

        let device = create_device(&factory).map_err(InitializationFailure::CreateDevice)?;

        let queue: ID3D12CommandQueue = unsafe {
            device.CreateCommandQueue(&D3D12_COMMAND_QUEUE_DESC {
                Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                ..D3D12_COMMAND_QUEUE_DESC::default()
            })
        }
        .label("ID3D12Device::CreateCommandQueue")
        .map_err(InitializationFailure::CreateQueue)?;

        let desc = DXGI_SWAP_CHAIN_DESC1 {
            Width: width,
            Height: height,
            Format: DXGI_FORMAT_B8G8R8A8_UNORM,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: BUFFER_COUNT,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
            ..DXGI_SWAP_CHAIN_DESC1::default()
        };

        let swap_chain: IDXGISwapChain1 = unsafe {
            factory.CreateSwapChainForHwnd(&queue, hwnd(surface), &desc, None, None)
        }
        .label("IDXGIFactory2::CreateSwapChainForHwnd")
        .map_err(InitializationFailure::CreateSurface)?;
        let swap_chain: IDXGISwapChain3 = swap_chain
            .cast()
            .label("Interface::cast")
            .map_err(InitializationFailure::CreateSurface)?;

        let rtv_heap: ID3D12DescriptorHeap = unsafe {
            device.CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
                Type: D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
                NumDescriptors: BUFFER_COUNT,
                ..D3D12_DESCRIPTOR_HEAP_DESC::default()
            })
        }
        .label("ID3D12Device::CreateDescriptorHeap")
        .map_err(InitializationFailure::CreateRenderTargets)?;
        let rtv_size =
            unsafe { device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_RTV) }
                as usize;

        let allocator: ID3D12CommandAllocator =
            unsafe { device.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT) }
                .label("ID3D12Device::CreateCommandAllocator")
                .map_err(InitializationFailure::CreateQueue)?;

        let list: ID3D12GraphicsCommandList = unsafe {
            device.CreateCommandList(0, D3D12_COMMAND_LIST_TYPE_DIRECT, &allocator, None)
        }
        .label("ID3D12Device::CreateCommandList")
        .map_err(InitializationFailure::CreateQueue)?;
        unsafe { list.Close() }
            .label("ID3D12GraphicsCommandList::Close")
            .map_err(InitializationFailure::CreateQueue)?;

        let fence = GpuFence::new(&device).map_err(InitializationFailure::CreateFence)?;

        let mut resources = Self {
            device,
            queue,
            swap_chain,
            rtv_heap,
            rtv_size,
            buffers: Vec::new(),
            allocator,
            list,
            fence,
            size: [width, height],
            presented: None,
        };
        resources
            .create_render_targets()
            .map_err(InitializationFailure::CreateRenderTargets)?;

        Ok(resources)
    }

    fn rtv_handle(&self, index: u32) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        let start = unsafe { self.rtv_heap.GetCPUDescriptorHandleForHeapStart() };

        D3D12_CPU_DESCRIPTOR_HANDLE {
            ptr: start.ptr + index as usize * self.rtv_size,
        }
    }

    fn create_render_targets(&mut self) -> Result<(), PlatformError> {
        self.buffers.clear();

        for index in 0..BUFFER_COUNT {
            let buffer: ID3D12Resource = unsafe { self.swap_chain.GetBuffer(index) }
                .label("IDXGISwapChain::GetBuffer")?;

            unsafe {
                self.device
                    .CreateRenderTargetView(&buffer, None, self.rtv_handle(index))
            };

            self.buffers.push(buffer);
        }

        Ok(())
    }

    fn record_clear(&self, color: [f32; 4]) -> Result<(), PlatformError> {
        let index = unsafe { self.swap_chain.GetCurrentBackBufferIndex() };
        let buffer = self
            .buffers
            .get(index as usize)
            .ok_or_else(|| missing("IDXGISwapChain3::GetCurrentBackBufferIndex"))?;

        unsafe { self.allocator.Reset() }.label("ID3D12CommandAllocator::Reset")?;
        unsafe { self.list.Reset(&self.allocator, None) }
            .label("ID3D12GraphicsCommandList::Reset")?;

        unsafe {
            self.list.ResourceBarrier(&[transition_barrier(
                buffer,
                D3D12_RESOURCE_STATE_PRESENT,
                D3D12_RESOURCE_STATE_RENDER_TARGET,
            )]);
            self.list
                .ClearRenderTargetView(self.rtv_handle(index), &color, None);
            self.list.ResourceBarrier(&[transition_barrier(
                buffer,
                D3D12_RESOURCE_STATE_RENDER_TARGET,
                D3D12_RESOURCE_STATE_PRESENT,
            )]);
        }

        unsafe { self.list.Close() }.label("ID3D12GraphicsCommandList::Close")?;

        let list: ID3D12CommandList = self.list.cast().label("Interface::cast")?;
        unsafe { self.queue.ExecuteCommandLists(&[Some(list)]) };

        Ok(())
    }

    /// Waits for every submitted frame, `false` if `timeout` elapsed first.
    fn wait_idle(&self, timeout: Duration) -> Result<bool, PlatformError> {
        self.fence.flush(&self.queue, timeout)
    }
}

impl RendererCapability for D3D12Renderer {
    fn generation(&self) -> ApiGeneration {
        ApiGeneration::D3D12
    }

    #[instrument("D3D12Renderer::initialize", skip(self), err)]
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

        self.resources = Some(Resources::create(surface, width, height)?);
        debug!("Created Direct3D 12 swapchain for {surface}");

        Ok(())
    }

    fn render(&mut self, color: [f32; 4]) -> Result<(), RenderError> {
        self.resources()?
            .record_clear(color)
            .map_err(RenderError::Record)
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let resources = self.resources_mut()?;
        let index = unsafe { resources.swap_chain.GetCurrentBackBufferIndex() };

        unsafe { resources.swap_chain.Present(1, DXGI_PRESENT(0)) }
            .ok()
            .label("IDXGISwapChain::Present")
            .map_err(RenderError::Present)?;
        resources.presented = Some(index);

        if !resources
            .wait_idle(PRESENT_TIMEOUT)
            .map_err(RenderError::Present)?
        {
            return Err(RenderError::Timeout(PRESENT_TIMEOUT));
        }

        Ok(())
    }

    fn current_back_buffer(&self) -> Result<Box<dyn BackBuffer + '_>, ReadbackFailure> {
        let resources = self
            .resources
            .as_ref()
            .ok_or(ReadbackFailure::NothingPresented)?;
        let index = resources
            .presented
            .ok_or(ReadbackFailure::NothingPresented)?;

        Ok(Box::new(D3D12BackBuffer::from_queue(
            &resources.queue,
            &resources.swap_chain,
            index,
        )?))
    }

    fn wait_for_buffer_ready(&self, timeout: Duration) -> Result<(), RenderError> {
        if self
            .resources()?
            .wait_idle(timeout)
            .map_err(RenderError::Record)?
        {
            Ok(())
        } else {
            Err(RenderError::Timeout(timeout))
        }
    }

    #[instrument("D3D12Renderer::resize", skip(self), err)]
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        let resources = self.resources_mut()?;

        if width == 0 || height == 0 || resources.size == [width, height] {
            return Ok(());
        }

        if !resources
            .wait_idle(PRESENT_TIMEOUT)
            .map_err(RenderError::Resize)?
        {
            return Err(RenderError::Timeout(PRESENT_TIMEOUT));
        }

        resources.buffers.clear();

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
            .create_render_targets()
            .map_err(RenderError::Resize)?;
        resources.size = [width, height];
        resources.presented = None;

        Ok(())
    }

    fn destroy(&mut self) {
        if let Some(resources) = self.resources.take() {
            match resources.wait_idle(PRESENT_TIMEOUT) {
                Ok(true) => {}
                Ok(false) => error!("Timed out waiting for the GPU before destroying renderer"),
                Err(e) => error!("Failed to wait for the GPU before destroying renderer:\n{e}"),
            }
        }
    }

    fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }
}

impl Drop for D3D12Renderer {
    fn drop(&mut self) {
        self.destroy();
    }
}
