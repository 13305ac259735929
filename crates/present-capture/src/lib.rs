//! # Present Capture
//! Intercepts the presentation call of a graphics surface and writes the frames it presents
//! to disk, for either Direct3D generation.
//!
//! The crate is platform neutral. The graphics API specifics live behind three seams:
//! - [`RendererCapability`] creates and drives a presentable surface.
//! - [`InterceptionProvider`] patches and restores the shared presentation entry point.
//! - [`BackBuffer`] copies a presented image into CPU memory.
//!

extern crate alloc;

pub use capture_session::{CaptureProgress, CaptureSession};
pub use error::{
    CaptureError, FrameError, HookError, InitializationFailure, PlatformError, ReadbackFailure,
    RenderError, WriteFailure,
};
pub use generation::{ApiGeneration, SubmissionModel, UnsupportedGeneration};
pub use interception::{
    CaptureSettings, HookState, InterceptionEngine, InterceptionProvider, PresentObserver,
    PresentedSurface, dispatch_present,
};
pub use readback::{
    Frame, OutputFormat, PixelFormat, StagingImage, UnsupportedOutputFormat, capture,
    frame_file_name, write_frame,
};
pub use renderer::{BackBuffer, RendererCapability, SurfaceWindow};
pub use self_test_surface::SelfTestSurface;
pub use surface_id::SurfaceId;

mod capture_session;
mod error;
mod generation;
mod interception;
mod readback;
mod renderer;
mod self_test_surface;
mod surface_id;
