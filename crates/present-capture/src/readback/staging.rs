use crate::{PixelFormat, ReadbackFailure};

/// The raw contents of a mapped staging resource.
///
/// Rows start `row_pitch` bytes apart. The pitch is chosen by the driver and may be wider than
/// the pixel data of a row.
#[derive(Debug, Clone)]
pub struct StagingImage {
    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// Pixel layout.
    pub format: PixelFormat,

    /// Distance in bytes between the start of consecutive rows.
    pub row_pitch: usize,

    /// The mapped bytes.
    pub data: Vec<u8>,
}

impl StagingImage {
    /// Number of bytes of pixel data in a single row.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// Checks the mapped bytes are large enough to hold every row at the given pitch.
    pub fn validate(&self) -> Result<(), ReadbackFailure> {
        let row_bytes = self.row_bytes();

        let layout_error = || ReadbackFailure::StagingLayout {
            len: self.data.len(),
            height: self.height,
            row_bytes,
            row_pitch: self.row_pitch,
        };

        if self.row_pitch < row_bytes {
            return Err(layout_error());
        }

        // The last row does not need padding after it.
        let required = match (self.height as usize).checked_sub(1) {
            Some(full_rows) => full_rows
                .checked_mul(self.row_pitch)
                .and_then(|bytes| bytes.checked_add(row_bytes))
                .ok_or_else(layout_error)?,
            None => 0,
        };

        if self.data.len() < required {
            return Err(layout_error());
        }

        Ok(())
    }
}
