//! A software graphics driver.
//!
//! Back buffers live in CPU memory with rows padded to a 256 byte pitch. The driver owns a
//! single presentation slot that a [`SoftwareHook`] patches, and a registry of live windows.
//! Queued generations track submitted work with a fence that can be stalled to simulate a GPU
//! that never finishes.

pub use driver::{DXGI_STATUS_OCCLUDED, PresentStatus, S_OK, SoftwareDriver};
pub use hook::SoftwareHook;
pub use renderer::SoftwareRenderer;
pub use swap_chain::{
    BUFFER_COUNT, PADDING_BYTE, PITCH_ALIGNMENT, SoftwareBackBuffer, SoftwareSwapChain,
};
pub use texel::encode_color;
pub use window::SoftwareWindow;

mod driver;
mod hook;
mod renderer;
mod swap_chain;
mod texel;
mod window;
