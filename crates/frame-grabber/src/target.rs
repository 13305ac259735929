use present_capture::SurfaceId;
use tracing::{debug, warn};
use windows::{
    Win32::{
        Foundation::{HWND, LPARAM},
        UI::WindowsAndMessaging::{
            EnumWindows, FindWindowW, GetWindowTextLengthW, GetWindowThreadProcessId,
            IsWindowVisible,
        },
    },
    core::HSTRING,
};
use windows_core::BOOL;
use windows_present_hook::surface_id;

use crate::settings::TargetSelector;

/// Resolves the surface to capture, [`SurfaceId::NULL`] if nothing matches.
///
/// `self_test` is returned for [`TargetSelector::SelfTest`].
pub fn resolve_target(selector: &TargetSelector, self_test: SurfaceId) -> SurfaceId {
    let target = match selector {
        TargetSelector::SelfTest => self_test,
        TargetSelector::Title(title) => find_by_title(title),
        TargetSelector::ProcessId(pid) => find_by_process(*pid),
    };

    debug!("Resolved {selector:?} to {target}");

    target
}

/// The top level window with exactly this title.
fn find_by_title(title: &str) -> SurfaceId {
    match unsafe { FindWindowW(None, &HSTRING::from(title)) } {
        Ok(hwnd) => surface_id(hwnd),
        Err(_) => SurfaceId::NULL,
    }
}

/// The first visible, titled, top level window of a process in Z order.
fn find_by_process(pid: u32) -> SurfaceId {
    let mut search = ProcessSearch {
        pid,
        windows: Vec::new(),
    };

    // Fails when the callback stops the enumeration early, which it never does.
    let _ = unsafe {
        EnumWindows(
            Some(collect_process_window),
            LPARAM(&mut search as *mut ProcessSearch as isize),
        )
    };

    if search.windows.len() > 1 {
        warn!(
            "Process {pid} has {} visible windows, capturing the topmost",
            search.windows.len()
        );
    }

    search
        .windows
        .first()
        .map_or(SurfaceId::NULL, |hwnd| surface_id(*hwnd))
}

struct ProcessSearch {
    pid: u32,
    windows: Vec<HWND>,
}

unsafe extern "system" fn collect_process_window(hwnd: HWND, search: LPARAM) -> BOOL {
    let search = unsafe { &mut *(search.0 as *mut ProcessSearch) };

    let mut pid = 0;
    unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };

    if pid == search.pid
        && unsafe { IsWindowVisible(hwnd) }.as_bool()
        && unsafe { GetWindowTextLengthW(hwnd) } > 0
    {
        search.windows.push(hwnd);
    }

    true.into()
}
