use alloc::sync::Arc;

use present_capture::{
    CaptureError, HookError, InitializationFailure, InterceptionEngine, SelfTestSurface, SurfaceId,
    SurfaceWindow,
};
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    error::OsError,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    raw_window_handle::{HasWindowHandle, RawWindowHandle},
    window::{Window, WindowId},
};
use windows_present_hook::{create_interception_provider, create_renderer};

use crate::{failure::report, settings::Settings, target::resolve_target};

/// Title of the self test window.
pub const WINDOW_TITLE: &str = "DirectX Black Box Window";

/// The winit window the self test surface presents to.
struct NativeWindow(Arc<Window>);

impl SurfaceWindow for NativeWindow {
    fn surface_id(&self) -> SurfaceId {
        match self.0.window_handle().map(|handle| handle.as_raw()) {
            Ok(RawWindowHandle::Win32(handle)) => SurfaceId(handle.hwnd.get()),
            _ => SurfaceId::NULL,
        }
    }

    fn show(&self) {
        self.0.set_visible(true);
    }
}

struct Running {
    window: Arc<Window>,
    surface: SelfTestSurface,
    engine: InterceptionEngine,
    reported_complete: bool,
}

/// Renders the self test surface while the armed capture runs.
pub struct FrameGrabber {
    settings: Settings,
    running: Option<Running>,
    failed: bool,
}

impl FrameGrabber {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            running: None,
            failed: false,
        }
    }

    /// If setup or rendering failed.
    pub fn failed(&self) -> bool {
        self.failed
    }

    #[instrument("FrameGrabber::start", skip_all, err)]
    fn start(&self, event_loop: &ActiveEventLoop) -> Result<Running, Error> {
        let settings = &self.settings;

        let window_attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(settings.width, settings.height))
            .with_visible(false);
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let mut surface = SelfTestSurface::new(
            Box::new(NativeWindow(Arc::clone(&window))),
            create_renderer(settings.generation),
        );
        surface.initialize(settings.width, settings.height)?;

        let target = resolve_target(&settings.target, surface.surface_id());

        surface.show();

        let engine = InterceptionEngine::new(
            create_interception_provider(settings.generation),
            settings.capture,
        );
        engine.hook()?;
        engine.capture_frames(target, &settings.output_directory, settings.frame_count)?;

        info!(
            "Capturing {} frames of {target} into {:?}",
            settings.frame_count, settings.output_directory
        );

        window.request_redraw();

        Ok(Running {
            window,
            surface,
            engine,
            reported_complete: false,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop) {
        self.failed = true;
        event_loop.exit();
    }
}

impl Running {
    fn log_completion(&mut self) {
        if self.reported_complete {
            return;
        }

        let Some(progress) = self.engine.capture_progress() else {
            return;
        };

        if progress.is_complete() {
            self.reported_complete = true;

            if progress.failed == 0 {
                info!("Captured {} frames", progress.written);
            } else {
                warn!(
                    "Captured {} of {} frames, {} failed",
                    progress.written, progress.requested, progress.failed
                );
            }
        }
    }
}

impl ApplicationHandler for FrameGrabber {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() || self.failed {
            return;
        }

        match self.start(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                report(e, "Could not start capturing");
                self.fail(event_loop);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        if running.window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if let Err(e) = running.surface.resize(size.width, size.height) {
                    error!("Failed to resize the self test surface:\n{e}");
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = running.surface.render_frame() {
                    error!("Failed to render the self test surface:\n{e}");
                    self.failed = true;
                    event_loop.exit();
                    return;
                }

                running.log_completion();
                running.window.request_redraw();
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut running) = self.running.take() {
            if let Err(e) = running.engine.unhook() {
                error!("Failed to unhook:\n{e}");
            }

            running.surface.uninitialize();
            info!("Shut down");
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to create window:\n{0}")]
    CreateWindow(#[from] OsError),

    #[error("Failed to initialize the self test surface:\n{0}")]
    Initialize(#[from] InitializationFailure),

    #[error("Failed to hook presentation:\n{0}")]
    Hook(#[from] HookError),

    #[error("Failed to arm the capture:\n{0}")]
    Capture(#[from] CaptureError),
}
