use tracing::error;
use windows::{
    Win32::UI::WindowsAndMessaging::{
        MB_ICONERROR, MB_OK, MB_SETFOREGROUND, MESSAGEBOX_RESULT, MESSAGEBOX_STYLE, MessageBoxW,
    },
    core::{HSTRING, h},
};

/// Display a Windows message box.
pub fn display_message(message: &str, style: MESSAGEBOX_STYLE) -> MESSAGEBOX_RESULT {
    unsafe {
        let message = HSTRING::from(message);

        MessageBoxW(None, &message, h!("Frame Grabber"), style)
    }
}

/// Logs an error and shows it to the user.
pub fn report<Err: core::fmt::Display>(error: Err, message: &str) {
    error!("{message}:\n{error}");

    let user_message = format!(
        "ERROR:\n{message}.\n\n{error}\n\nSee the logs for more details, Frame Grabber will exit."
    );
    display_message(&user_message, MB_ICONERROR | MB_OK | MB_SETFOREGROUND);
}

pub trait Failure<T> {
    /// Reports the error, `None` if there was one.
    fn report(self, message: &str) -> Option<T>;
}

impl<T, E: core::fmt::Display> Failure<T> for Result<T, E> {
    fn report(self, message: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                report(error, message);
                None
            }
        }
    }
}
