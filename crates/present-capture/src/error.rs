use core::time::Duration;
use std::path::PathBuf;

use thiserror::Error;

use crate::{ApiGeneration, SurfaceId};

/// A failed platform call, carrying the call name and the status code it returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{call} failed with status {code:#010x}: {message}")]
pub struct PlatformError {
    /// Name of the failing call.
    pub call: &'static str,

    /// Raw status code.
    pub code: i32,

    /// Message for the status code.
    pub message: String,
}

impl PlatformError {
    /// Creates a new platform error.
    pub fn new(call: &'static str, code: i32, message: impl Into<String>) -> Self {
        Self {
            call,
            code,
            message: message.into(),
        }
    }
}

/// Device, surface, or queue creation failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InitializationFailure {
    #[error("Failed to create device:\n{0}")]
    CreateDevice(#[source] PlatformError),

    #[error("Failed to create swapchain:\n{0}")]
    CreateSurface(#[source] PlatformError),

    #[error("Failed to create command queue:\n{0}")]
    CreateQueue(#[source] PlatformError),

    #[error("Failed to create fence:\n{0}")]
    CreateFence(#[source] PlatformError),

    #[error("Failed to create render targets:\n{0}")]
    CreateRenderTargets(#[source] PlatformError),

    #[error("Surface size {width}x{height} is invalid")]
    InvalidSize { width: u32, height: u32 },

    #[error("Renderer is already initialized")]
    AlreadyInitialized,

    #[error("Surface {0} is not a valid window")]
    InvalidSurface(SurfaceId),
}

/// Recording, presenting, or resizing an initialized renderer failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RenderError {
    #[error("Renderer is not initialized")]
    NotInitialized,

    #[error("Failed to record commands:\n{0}")]
    Record(#[source] PlatformError),

    #[error("Failed to present:\n{0}")]
    Present(#[source] PlatformError),

    #[error("Failed to resize buffers:\n{0}")]
    Resize(#[source] PlatformError),

    #[error("Timed out after {0:?} waiting for the GPU")]
    Timeout(Duration),
}

/// Installing or removing the presentation interception failed.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("The {0} presentation call is already hooked")]
    AlreadyHooked(ApiGeneration),

    #[error("Failed to patch the presentation call:\n{0}")]
    PatchFailed(#[source] PlatformError),
}

/// A capture request was rejected, no session state was changed.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("The {0} presentation call is not hooked")]
    NotHooked(ApiGeneration),

    #[error("A capture of surface {target} is still in progress")]
    AlreadyCapturing { target: SurfaceId },

    #[error("Frame count must be positive, got {frame_count}")]
    InvalidArgument { frame_count: i64 },

    #[error("Target surface {0} could not be found")]
    TargetNotFound(SurfaceId),
}

/// Copying a presented image into CPU memory failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReadbackFailure {
    #[error("The surface has no current back buffer:\n{0}")]
    NoBackBuffer(#[source] PlatformError),

    #[error("Nothing has been presented yet")]
    NothingPresented,

    #[error("Failed to copy the back buffer to staging:\n{0}")]
    Copy(#[source] PlatformError),

    #[error("Failed to map the staging buffer:\n{0}")]
    Map(#[source] PlatformError),

    #[error("Failed to wait for the back buffer:\n{0}")]
    Wait(#[source] PlatformError),

    #[error("Timed out after {0:?} waiting for the back buffer")]
    Timeout(Duration),

    #[error("Back buffer format {0} is not supported")]
    UnsupportedFormat(String),

    #[error(
        "Staging buffer of {len} bytes cannot hold {height} rows of {row_bytes} bytes at pitch {row_pitch}"
    )]
    StagingLayout {
        len: usize,
        height: u32,
        row_bytes: usize,
        row_pitch: usize,
    },
}

/// Encoding or writing a frame image failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteFailure {
    #[error("Destination {0:?} is not an existing directory")]
    MissingDirectory(PathBuf),

    #[error("Failed to write {path:?}:\n{source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Capturing a single frame failed.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Readback(#[from] ReadbackFailure),

    #[error(transparent)]
    Write(#[from] WriteFailure),
}
