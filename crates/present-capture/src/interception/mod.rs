use core::time::Duration;

use crate::{OutputFormat, SurfaceId};

pub use engine::InterceptionEngine;
pub use provider::{InterceptionProvider, PresentObserver, PresentedSurface, dispatch_present};

mod engine;
mod observer;
mod provider;

/// Lifecycle state of an interception engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookState {
    /// The presentation call is not patched.
    Uninstalled,

    /// The presentation call is patched, no capture is armed.
    Installed,

    /// The presentation call is patched and a capture session is armed.
    Capturing {
        /// The surface being captured.
        target: SurfaceId,
    },
}

/// Settings applied to every frame captured by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Bound on waiting for the GPU to finish with a back buffer.
    pub buffer_ready_timeout: Duration,

    /// Format frames are written in.
    pub output_format: OutputFormat,
}

impl CaptureSettings {
    /// Default bound on waiting for a back buffer.
    pub const DEFAULT_BUFFER_READY_TIMEOUT: Duration = Duration::from_millis(1000);
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            buffer_ready_timeout: Self::DEFAULT_BUFFER_READY_TIMEOUT,
            output_format: OutputFormat::default(),
        }
    }
}
