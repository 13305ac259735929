use core::fmt;

/// Opaque identity of a native surface, the raw window handle on Windows.
///
/// Resolved once when a capture is armed and compared against the surface of every intercepted
/// presentation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub isize);

impl SurfaceId {
    /// The identity of no surface, what an unresolved target is represented by.
    pub const NULL: Self = Self(0);

    /// If this identity refers to no surface.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
