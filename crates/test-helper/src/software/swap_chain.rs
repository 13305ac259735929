use core::{
    sync::atomic::{AtomicBool, AtomicU32, Ordering},
    time::Duration,
};
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use present_capture::{
    ApiGeneration, BackBuffer, InitializationFailure, PixelFormat, PlatformError,
    PresentedSurface, ReadbackFailure, StagingImage, SubmissionModel, SurfaceId,
};

use super::encode_color;

/// Number of back buffers in every software swapchain.
pub const BUFFER_COUNT: usize = 2;

/// Row pitch alignment of software back buffers, matching the D3D12 footprint alignment.
pub const PITCH_ALIGNMENT: usize = 256;

/// Value of the bytes padding each row out to the pitch.
pub const PADDING_BYTE: u8 = 0xCD;

const DXGI_ERROR_DEVICE_REMOVED: i32 = 0x887A0005_u32 as i32;

/// A swapchain whose buffers live in CPU memory.
pub struct SoftwareSwapChain {
    generation: ApiGeneration,
    surface: SurfaceId,
    state: Mutex<State>,
    fence: Fence,
    failing_copies: AtomicU32,
}

struct State {
    width: u32,
    height: u32,
    format: PixelFormat,
    row_pitch: usize,
    buffers: Vec<Vec<u8>>,
    index: usize,
    presented: Option<usize>,
    frames: u64,
}

/// Completed work tracking for queued generations.
struct Fence {
    submitted: Mutex<u64>,
    completed: Mutex<u64>,
    signalled: Condvar,
    stalled: AtomicBool,
}

impl SoftwareSwapChain {
    /// Creates a swapchain presenting to `surface`.
    pub fn new(
        generation: ApiGeneration,
        surface: SurfaceId,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self, InitializationFailure> {
        let state = State::new(width, height, format)?;

        Ok(Self {
            generation,
            surface,
            state: Mutex::new(state),
            fence: Fence {
                submitted: Mutex::new(0),
                completed: Mutex::new(0),
                signalled: Condvar::new(),
                stalled: AtomicBool::new(false),
            },
            failing_copies: AtomicU32::new(0),
        })
    }

    /// The surface this swapchain presents to.
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// Width and height of the back buffers.
    pub fn size(&self) -> [u32; 2] {
        let state = self.state.lock();
        [state.width, state.height]
    }

    /// Pixel format of the back buffers.
    pub fn format(&self) -> PixelFormat {
        self.state.lock().format
    }

    /// Distance in bytes between rows of the back buffers.
    pub fn row_pitch(&self) -> usize {
        self.state.lock().row_pitch
    }

    /// Index of the buffer the next frame is rendered into.
    pub fn current_index(&self) -> usize {
        self.state.lock().index
    }

    /// Index of the buffer most recently presented.
    pub fn presented_index(&self) -> Option<usize> {
        self.state.lock().presented
    }

    /// Number of frames presented.
    pub fn frames_presented(&self) -> u64 {
        self.state.lock().frames
    }

    /// Clears the current back buffer to `color`.
    pub fn clear(&self, color: [f32; 4]) {
        let texel = encode_color(self.format(), color);
        self.paint_texels(|_, _| texel.clone());
    }

    /// Writes every pixel of the current back buffer from an 8 bit RGBA colour.
    pub fn paint(&self, pixel: impl Fn(u32, u32) -> [u8; 4]) {
        let format = self.format();
        self.paint_texels(|x, y| encode_color(format, pixel(x, y).map(|v| f32::from(v) / 255.0)));
    }

    fn paint_texels(&self, texel: impl Fn(u32, u32) -> Vec<u8>) {
        {
            let mut state = self.state.lock();
            let bytes_per_pixel = state.format.bytes_per_pixel();
            let (width, height, row_pitch, index) =
                (state.width, state.height, state.row_pitch, state.index);
            let buffer = &mut state.buffers[index];

            for y in 0..height {
                for x in 0..width {
                    let start = y as usize * row_pitch + x as usize * bytes_per_pixel;
                    buffer[start..start + bytes_per_pixel].copy_from_slice(&texel(x, y));
                }
            }
        }

        self.submit();
    }

    /// Hands the current buffer to the display and moves on to the next one.
    ///
    /// Returns the number of frames presented so far.
    pub fn advance(&self) -> u64 {
        let mut state = self.state.lock();
        state.presented = Some(state.index);
        state.index = (state.index + 1) % BUFFER_COUNT;
        state.frames += 1;
        state.frames
    }

    /// Recreates the buffers at a new size, discarding their contents.
    ///
    /// Zero sized requests keep the current buffers, like a minimized window.
    pub fn resize(&self, width: u32, height: u32) {
        let mut state = self.state.lock();
        if [state.width, state.height] == [width, height] {
            return;
        }

        if let Ok(resized) = State::new(width, height, state.format) {
            *state = resized;
        }
    }

    /// Stops the fence from completing submitted work, or resumes it.
    pub fn set_stalled(&self, stalled: bool) {
        self.fence.stalled.store(stalled, Ordering::Release);
        if !stalled {
            let submitted = *self.fence.submitted.lock();
            self.fence.complete(submitted);
        }
    }

    /// Makes the next `count` staging copies fail.
    pub fn fail_next_copies(&self, count: u32) {
        self.failing_copies.store(count, Ordering::Release);
    }

    /// Blocks until submitted work completed, returns false when `timeout` elapses first.
    ///
    /// Always true for immediate generations.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        if self.generation.submission_model() == SubmissionModel::Immediate {
            return true;
        }

        let target = *self.fence.submitted.lock();
        let deadline = Instant::now() + timeout;

        let mut completed = self.fence.completed.lock();
        while *completed < target {
            if self
                .fence
                .signalled
                .wait_until(&mut completed, deadline)
                .timed_out()
            {
                return *completed >= target;
            }
        }

        true
    }

    /// Copies a buffer into a staging image with the swapchain's padded pitch.
    pub fn copy_to_staging(&self, index: usize) -> Result<StagingImage, ReadbackFailure> {
        let failing = self
            .failing_copies
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(ReadbackFailure::Copy(PlatformError::new(
                "CopyResource",
                DXGI_ERROR_DEVICE_REMOVED,
                "The GPU device instance has been suspended.",
            )));
        }

        let state = self.state.lock();
        Ok(StagingImage {
            width: state.width,
            height: state.height,
            format: state.format,
            row_pitch: state.row_pitch,
            data: state.buffers[index].clone(),
        })
    }

    /// The buffer at `index` as a back buffer.
    pub fn back_buffer(&self, index: usize) -> SoftwareBackBuffer<'_> {
        SoftwareBackBuffer {
            swap_chain: self,
            index,
        }
    }

    fn submit(&self) {
        let submitted = {
            let mut submitted = self.fence.submitted.lock();
            *submitted += 1;
            *submitted
        };

        if !self.fence.stalled.load(Ordering::Acquire) {
            self.fence.complete(submitted);
        }
    }
}

impl State {
    fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self, InitializationFailure> {
        if width == 0 || height == 0 {
            return Err(InitializationFailure::InvalidSize { width, height });
        }

        let row_bytes = width as usize * format.bytes_per_pixel();
        let row_pitch = row_bytes.div_ceil(PITCH_ALIGNMENT) * PITCH_ALIGNMENT;
        let buffer = vec![PADDING_BYTE; row_pitch * height as usize];

        Ok(Self {
            width,
            height,
            format,
            row_pitch,
            buffers: vec![buffer; BUFFER_COUNT],
            index: 0,
            presented: None,
            frames: 0,
        })
    }
}

impl Fence {
    fn complete(&self, value: u64) {
        let mut completed = self.completed.lock();
        if *completed < value {
            *completed = value;
        }
        self.signalled.notify_all();
    }
}

/// One buffer of a software swapchain.
pub struct SoftwareBackBuffer<'a> {
    swap_chain: &'a SoftwareSwapChain,
    index: usize,
}

impl BackBuffer for SoftwareBackBuffer<'_> {
    fn wait_for_buffer_ready(&self, timeout: Duration) -> Result<(), ReadbackFailure> {
        if self.swap_chain.wait_idle(timeout) {
            Ok(())
        } else {
            Err(ReadbackFailure::Timeout(timeout))
        }
    }

    fn copy_to_staging(&self) -> Result<StagingImage, ReadbackFailure> {
        self.swap_chain.copy_to_staging(self.index)
    }
}

impl PresentedSurface for SoftwareSwapChain {
    fn surface_id(&self) -> Option<SurfaceId> {
        Some(self.surface)
    }

    fn back_buffer(&self) -> Result<Box<dyn BackBuffer + '_>, ReadbackFailure> {
        Ok(Box::new(SoftwareBackBuffer {
            swap_chain: self,
            index: self.current_index(),
        }))
    }
}
