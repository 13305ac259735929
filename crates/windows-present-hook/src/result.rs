use present_capture::PlatformError;

/// Labels a Windows result with the call that produced it.
pub trait Label<T> {
    /// Converts the error into a [`PlatformError`] naming `call`.
    fn label(self, call: &'static str) -> Result<T, PlatformError>;
}

impl<T> Label<T> for windows_result::Result<T> {
    fn label(self, call: &'static str) -> Result<T, PlatformError> {
        self.map_err(|error| PlatformError::new(call, error.code().0, error.message()))
    }
}

/// A platform error for a call that succeeded but returned nothing.
pub(crate) fn missing(call: &'static str) -> PlatformError {
    const E_POINTER: i32 = 0x80004003_u32 as i32;

    PlatformError::new(call, E_POINTER, "The call returned no object")
}
