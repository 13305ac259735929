use core::time::Duration;

use tracing::instrument;

use crate::{BackBuffer, ReadbackFailure};

pub use frame::Frame;
pub use pixel_format::PixelFormat;
pub use staging::StagingImage;
pub use write_frame::{OutputFormat, UnsupportedOutputFormat, frame_file_name, write_frame};

mod frame;
mod pixel_format;
mod staging;
mod write_frame;

/// Copies the image a back buffer currently holds into CPU memory.
///
/// Waits until the GPU has finished with the buffer, bounded by `timeout`, then copies it
/// through a staging resource and packs the rows tightly.
#[instrument("readback::capture", skip_all, err)]
pub fn capture(back_buffer: &dyn BackBuffer, timeout: Duration) -> Result<Frame, ReadbackFailure> {
    back_buffer.wait_for_buffer_ready(timeout)?;
    let staging = back_buffer.copy_to_staging()?;
    Frame::from_staging(staging)
}
