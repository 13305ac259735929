use alloc::sync::Arc;
use std::path::Path;

use tracing::{error, info, instrument};

use crate::{
    ApiGeneration, CaptureError, CaptureProgress, CaptureSession, CaptureSettings, HookError,
    HookState, InterceptionProvider, PresentObserver, SurfaceId,
};

use super::observer::Dispatcher;

/// Owns the interception of one API generation and the capture session armed on it.
///
/// Dropping the engine unhooks it.
pub struct InterceptionEngine {
    provider: Box<dyn InterceptionProvider>,
    dispatcher: Arc<Dispatcher>,
}

impl InterceptionEngine {
    /// Creates an engine that is not yet hooked.
    pub fn new(provider: Box<dyn InterceptionProvider>, settings: CaptureSettings) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(provider.generation(), settings));

        Self {
            provider,
            dispatcher,
        }
    }

    /// The generation this engine intercepts.
    pub fn generation(&self) -> ApiGeneration {
        self.dispatcher.generation
    }

    /// The settings applied to every captured frame.
    pub fn settings(&self) -> CaptureSettings {
        self.dispatcher.settings
    }

    /// Patches the presentation entry point so every call passes through the engine.
    #[instrument("InterceptionEngine::hook", skip_all, err)]
    pub fn hook(&self) -> Result<(), HookError> {
        let mut installed = self.dispatcher.installed.write();
        if *installed {
            return Err(HookError::AlreadyHooked(self.generation()));
        }

        let observer: Arc<dyn PresentObserver> = Arc::clone(&self.dispatcher) as _;
        self.provider.install(observer)?;
        *installed = true;

        info!("Hooked {} presentation", self.generation());

        Ok(())
    }

    /// Restores the original presentation entry point and disarms any armed session.
    ///
    /// Waits for calls currently being observed to finish. Does nothing when not hooked.
    #[instrument("InterceptionEngine::unhook", skip_all, err)]
    pub fn unhook(&self) -> Result<(), HookError> {
        let mut installed = self.dispatcher.installed.write();
        if !*installed {
            return Ok(());
        }

        self.provider.remove()?;
        *installed = false;

        if let Some(session) = self.dispatcher.session.lock().as_ref() {
            session.abort();
        }

        info!("Unhooked {} presentation", self.generation());

        Ok(())
    }

    /// Arms a session writing the next `frame_count` frames presented to `target` into
    /// `destination`.
    ///
    /// Nothing changes when the request is rejected.
    #[instrument("InterceptionEngine::capture_frames", skip(self, destination), err)]
    pub fn capture_frames(
        &self,
        target: SurfaceId,
        destination: impl AsRef<Path>,
        frame_count: i64,
    ) -> Result<(), CaptureError> {
        let requested = u32::try_from(frame_count)
            .ok()
            .filter(|count| *count > 0)
            .ok_or(CaptureError::InvalidArgument { frame_count })?;

        let installed = self.dispatcher.installed.read();
        if !*installed {
            return Err(CaptureError::NotHooked(self.generation()));
        }

        let mut session = self.dispatcher.session.lock();
        if let Some(active) = session.as_ref().filter(|session| session.is_armed()) {
            return Err(CaptureError::AlreadyCapturing {
                target: active.target(),
            });
        }

        if target.is_null() || !self.provider.is_live_surface(target) {
            return Err(CaptureError::TargetNotFound(target));
        }

        let destination = destination.as_ref();
        *session = Some(Arc::new(CaptureSession::new(
            target,
            destination,
            requested,
        )));

        info!("Capturing {requested} frames of surface {target} into {destination:?}");

        Ok(())
    }

    /// The current lifecycle state.
    pub fn state(&self) -> HookState {
        let installed = self.dispatcher.installed.read();
        if !*installed {
            return HookState::Uninstalled;
        }

        match self.dispatcher.armed_session() {
            Some(session) => HookState::Capturing {
                target: session.target(),
            },
            None => HookState::Installed,
        }
    }

    /// Progress of the most recently armed session.
    pub fn capture_progress(&self) -> Option<CaptureProgress> {
        self.dispatcher
            .session
            .lock()
            .as_ref()
            .map(|session| session.progress())
    }
}

impl Drop for InterceptionEngine {
    fn drop(&mut self) {
        if let Err(e) = self.unhook() {
            error!("Failed to unhook {} presentation:\n{e}", self.generation());
        }
    }
}
