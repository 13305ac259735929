use core::{cell::Cell, time::Duration};

use present_capture::PlatformError;
use tracing::error;
use windows::{
    Win32::{
        Foundation::{CloseHandle, HANDLE, WAIT_OBJECT_0, WAIT_TIMEOUT},
        Graphics::Direct3D12::{
            D3D12_FENCE_FLAG_NONE, ID3D12CommandQueue, ID3D12Device, ID3D12Fence,
        },
        System::Threading::{CreateEventW, WaitForSingleObject},
    },
    core::PCWSTR,
};

use crate::Label;

/// A fence with an event to block the CPU on.
pub(crate) struct GpuFence {
    fence: ID3D12Fence,
    event: HANDLE,
    value: Cell<u64>,
}

impl GpuFence {
    pub fn new(device: &ID3D12Device) -> Result<Self, PlatformError> {
        let fence: ID3D12Fence = unsafe { device.CreateFence(0, D3D12_FENCE_FLAG_NONE) }
            .label("ID3D12Device::CreateFence")?;

        let event =
            unsafe { CreateEventW(None, false, false, PCWSTR::null()) }.label("CreateEventW")?;

        Ok(Self {
            fence,
            event,
            value: Cell::new(0),
        })
    }

    /// Signals the next fence value on a queue, returning the value.
    pub fn signal(&self, queue: &ID3D12CommandQueue) -> Result<u64, PlatformError> {
        let value = self.value.get() + 1;
        unsafe { queue.Signal(&self.fence, value) }.label("ID3D12CommandQueue::Signal")?;
        self.value.set(value);

        Ok(value)
    }

    /// Blocks until the fence reaches `value`, returns `false` if `timeout` elapsed first.
    pub fn wait(&self, value: u64, timeout: Duration) -> Result<bool, PlatformError> {
        if unsafe { self.fence.GetCompletedValue() } >= value {
            return Ok(true);
        }

        unsafe { self.fence.SetEventOnCompletion(value, self.event) }
            .label("ID3D12Fence::SetEventOnCompletion")?;

        // u32::MAX would wait forever
        let milliseconds = timeout.as_millis().min(u128::from(u32::MAX - 1)) as u32;

        match unsafe { WaitForSingleObject(self.event, milliseconds) } {
            WAIT_OBJECT_0 => Ok(true),
            WAIT_TIMEOUT => Ok(false),
            _ => Err(windows_result::Error::from_win32()).label("WaitForSingleObject"),
        }
    }

    /// Signals and waits for everything submitted to a queue so far.
    pub fn flush(
        &self,
        queue: &ID3D12CommandQueue,
        timeout: Duration,
    ) -> Result<bool, PlatformError> {
        let value = self.signal(queue)?;
        self.wait(value, timeout)
    }
}

impl Drop for GpuFence {
    fn drop(&mut self) {
        if let Err(e) = unsafe { CloseHandle(self.event) } {
            error!("Failed to close fence event:\n{e}");
        }
    }
}
