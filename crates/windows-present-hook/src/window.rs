use core::ffi::c_void;

use present_capture::{PlatformError, SurfaceId, SurfaceWindow};
use tracing::error;
use windows::{
    Win32::{
        Foundation::HWND,
        UI::WindowsAndMessaging::{
            CreateWindowExW, DestroyWindow, IsWindow, SW_SHOW, ShowWindow, WINDOW_EX_STYLE,
            WS_OVERLAPPEDWINDOW,
        },
    },
    core::{HSTRING, w},
};

use crate::Label;

/// The window handle a surface identity refers to.
pub fn hwnd(surface: SurfaceId) -> HWND {
    HWND(surface.0 as *mut c_void)
}

/// The surface identity of a window handle.
pub fn surface_id(hwnd: HWND) -> SurfaceId {
    SurfaceId(hwnd.0 as isize)
}

/// If a surface identity refers to an existing window.
pub fn is_live_window(surface: SurfaceId) -> bool {
    if surface.is_null() {
        return false;
    }

    unsafe { IsWindow(Some(hwnd(surface))) }.as_bool()
}

/// A window of the system `STATIC` class, created hidden and destroyed on drop.
pub struct StaticWindow(HWND);

impl StaticWindow {
    /// Creates a hidden window.
    pub fn new(title: &str, width: i32, height: i32) -> Result<Self, PlatformError> {
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                w!("STATIC"),
                &HSTRING::from(title),
                WS_OVERLAPPEDWINDOW,
                0,
                0,
                width,
                height,
                None,
                None,
                None,
                None,
            )
        }
        .label("CreateWindowExW")?;

        Ok(Self(hwnd))
    }

    /// The window handle.
    pub fn hwnd(&self) -> HWND {
        self.0
    }
}

impl SurfaceWindow for StaticWindow {
    fn surface_id(&self) -> SurfaceId {
        surface_id(self.0)
    }

    fn show(&self) {
        let _ = unsafe { ShowWindow(self.0, SW_SHOW) };
    }
}

impl Drop for StaticWindow {
    fn drop(&mut self) {
        if let Err(e) = unsafe { DestroyWindow(self.0) } {
            error!("Failed to destroy window:\n{e}");
        }
    }
}
