use core::{fmt, str::FromStr};
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{Frame, WriteFailure};

/// Image format frames are written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless PNG, 16 bits per channel for high precision sources.
    #[default]
    Png,

    /// Uncompressed bitmap, always 8 bits per channel.
    Bmp,
}

impl OutputFormat {
    /// The file extension for this format.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Bmp => "bmp",
        }
    }

    const fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Bmp => ImageFormat::Bmp,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = UnsupportedOutputFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "bmp" => Ok(Self::Bmp),
            _ => Err(UnsupportedOutputFormat(value.to_string())),
        }
    }
}

/// The requested output format is neither PNG nor BMP.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Output format must be 'png' or 'bmp', got '{0}'")]
pub struct UnsupportedOutputFormat(pub String);

/// The file name of the frame with a given sequence number.
pub fn frame_file_name(sequence: u32, format: OutputFormat) -> String {
    format!("frame-{sequence}.{}", format.extension())
}

/// Writes a frame into `destination` as `frame-{sequence}.{extension}`.
///
/// An existing file with the same name is overwritten.
#[instrument("readback::write_frame", skip(frame), err)]
pub fn write_frame(
    frame: &Frame,
    destination: &Path,
    sequence: u32,
    format: OutputFormat,
) -> Result<PathBuf, WriteFailure> {
    if !destination.is_dir() {
        return Err(WriteFailure::MissingDirectory(destination.to_path_buf()));
    }

    let path = destination.join(frame_file_name(sequence, format));

    let image = match format {
        OutputFormat::Png => frame.to_image(),
        OutputFormat::Bmp => DynamicImage::ImageRgba8(frame.to_rgba8()),
    };

    image
        .save_with_format(&path, format.image_format())
        .map_err(|source| WriteFailure::Encode {
            path: path.clone(),
            source,
        })?;

    debug!("Wrote {}x{} frame to {path:?}", frame.width(), frame.height());

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        assert_eq!(frame_file_name(0, OutputFormat::Png), "frame-0.png");
        assert_eq!(frame_file_name(12, OutputFormat::Bmp), "frame-12.bmp");
    }

    #[test]
    fn parses_output_formats() {
        assert_eq!("PNG".parse(), Ok(OutputFormat::Png));
        assert_eq!("bmp".parse(), Ok(OutputFormat::Bmp));
        assert_eq!(
            "jpeg".parse::<OutputFormat>(),
            Err(UnsupportedOutputFormat("jpeg".to_string()))
        );
    }
}
