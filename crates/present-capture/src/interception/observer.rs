use alloc::sync::Arc;
use std::path::PathBuf;

use parking_lot::{Mutex, RwLock};
use tracing::{error, info, info_span, trace};

use crate::{
    ApiGeneration, CaptureSession, CaptureSettings, FrameError, PresentObserver, PresentedSurface,
    capture, write_frame,
};

/// Shared state between an engine and the detour of its provider.
///
/// Lock order is `installed` then `session`.
pub(super) struct Dispatcher {
    pub generation: ApiGeneration,
    pub settings: CaptureSettings,

    /// If the provider is installed. Held for reading for the duration of every observation,
    /// so taking it for writing waits for in-flight calls to finish.
    pub installed: RwLock<bool>,

    /// The most recently armed session, kept after it is spent for progress reporting.
    pub session: Mutex<Option<Arc<CaptureSession>>>,
}

impl Dispatcher {
    pub fn new(generation: ApiGeneration, settings: CaptureSettings) -> Self {
        Self {
            generation,
            settings,
            installed: RwLock::new(false),
            session: Mutex::new(None),
        }
    }

    pub fn armed_session(&self) -> Option<Arc<CaptureSession>> {
        self.session
            .lock()
            .as_ref()
            .filter(|session| session.is_armed())
            .map(Arc::clone)
    }

    fn capture_frame(
        &self,
        surface: &dyn PresentedSurface,
        session: &CaptureSession,
        sequence: u32,
    ) -> Result<PathBuf, FrameError> {
        let back_buffer = surface.back_buffer()?;
        let frame = capture(back_buffer.as_ref(), self.settings.buffer_ready_timeout)?;
        let path = write_frame(
            &frame,
            session.destination(),
            sequence,
            self.settings.output_format,
        )?;

        Ok(path)
    }
}

impl PresentObserver for Dispatcher {
    fn on_present(&self, surface: &dyn PresentedSurface) {
        let installed = self.installed.read();
        if !*installed {
            return;
        }

        let Some(session) = self.armed_session() else {
            return;
        };

        if surface.surface_id() != Some(session.target()) {
            return;
        }

        let Some(sequence) = session.claim() else {
            return;
        };

        let target = session.target();
        let _span = info_span!("capture_frame", %target, sequence).entered();

        match self.capture_frame(surface, &session, sequence) {
            Ok(path) => {
                session.record_written();
                trace!("Captured frame {sequence} to {path:?}");
            }

            Err(e) => {
                session.record_failed();
                error!("Failed to capture frame {sequence} of surface {target}:\n{e}");
            }
        }

        if sequence + 1 == session.frame_count() {
            let progress = session.progress();
            info!(
                "{} capture of surface {target} complete, wrote {} of {} frames",
                self.generation, progress.written, progress.requested
            );
        }

        drop(installed);
    }
}
