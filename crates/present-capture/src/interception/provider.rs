use alloc::sync::Arc;

use crate::{ApiGeneration, BackBuffer, HookError, ReadbackFailure, SurfaceId};

/// A surface observed in the middle of a presentation call.
pub trait PresentedSurface {
    /// Identity of the native surface the call presents to, if it can be determined.
    fn surface_id(&self) -> Option<SurfaceId>;

    /// The back buffer being presented.
    fn back_buffer(&self) -> Result<Box<dyn BackBuffer + '_>, ReadbackFailure>;
}

/// Receives every intercepted presentation call before it is forwarded.
pub trait PresentObserver: Send + Sync {
    /// Called on the presenting thread, before the original call.
    ///
    /// Must not fail, whatever happens is handled inside.
    fn on_present(&self, surface: &dyn PresentedSurface);
}

/// Patches and restores the presentation entry point of one API generation.
pub trait InterceptionProvider: Send + Sync {
    /// The generation whose calls this provider intercepts.
    fn generation(&self) -> ApiGeneration;

    /// Routes every future presentation call through `observer` before the original.
    ///
    /// Implementations must not hold their own locks while calling the observer.
    fn install(&self, observer: Arc<dyn PresentObserver>) -> Result<(), HookError>;

    /// Restores the original entry point.
    fn remove(&self) -> Result<(), HookError>;

    /// If `surface` currently identifies a live native surface.
    fn is_live_surface(&self, surface: SurfaceId) -> bool;
}

/// Shows an intercepted call to the observer, then forwards it to the original exactly once.
///
/// The value of `forward` is returned unchanged.
pub fn dispatch_present<R>(
    observer: Option<&dyn PresentObserver>,
    surface: &dyn PresentedSurface,
    forward: impl FnOnce() -> R,
) -> R {
    if let Some(observer) = observer {
        observer.on_present(surface);
    }

    forward()
}
