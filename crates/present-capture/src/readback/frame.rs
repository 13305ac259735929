use half::f16;
use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};

use crate::{PixelFormat, ReadbackFailure, StagingImage};

/// A presented image copied into CPU memory with tightly packed rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Frame {
    /// Packs the rows of a staging image, dropping any padding the row pitch adds.
    pub fn from_staging(staging: StagingImage) -> Result<Self, ReadbackFailure> {
        staging.validate()?;

        let row_bytes = staging.row_bytes();

        let data = if staging.row_pitch == row_bytes {
            let mut data = staging.data;
            data.truncate(row_bytes * staging.height as usize);
            data
        } else {
            let mut data = Vec::with_capacity(row_bytes * staging.height as usize);
            for row in 0..staging.height as usize {
                let start = row * staging.row_pitch;
                data.extend_from_slice(&staging.data[start..start + row_bytes]);
            }
            data
        };

        Ok(Self {
            width: staging.width,
            height: staging.height,
            format: staging.format,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The pixel layout of the source back buffer.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// The packed pixel bytes, in the source layout.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Iterator over the packed rows.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let row_bytes = self.width as usize * self.format.bytes_per_pixel();
        self.data.chunks_exact(row_bytes.max(1))
    }

    /// The pixel at `(x, y)` converted to 8 bit RGBA.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }

        Some(self.rgba8(x, y))
    }

    /// Converts the frame into an image, 16 bits per channel for high precision sources.
    pub fn to_image(&self) -> DynamicImage {
        if self.format.is_high_precision() {
            let image: ImageBuffer<Rgba<u16>, Vec<u16>> =
                ImageBuffer::from_fn(self.width, self.height, |x, y| Rgba(self.rgba16(x, y)));
            DynamicImage::ImageRgba16(image)
        } else {
            DynamicImage::ImageRgba8(self.to_rgba8())
        }
    }

    /// Converts the frame into an 8 bit per channel image.
    pub fn to_rgba8(&self) -> RgbaImage {
        ImageBuffer::from_fn(self.width, self.height, |x, y| Rgba(self.rgba8(x, y)))
    }

    fn texel(&self, x: u32, y: u32) -> &[u8] {
        let bytes_per_pixel = self.format.bytes_per_pixel();
        let start = (y as usize * self.width as usize + x as usize) * bytes_per_pixel;
        &self.data[start..start + bytes_per_pixel]
    }

    fn rgba8(&self, x: u32, y: u32) -> [u8; 4] {
        let texel = self.texel(x, y);

        match self.format {
            PixelFormat::Bgra8Unorm => [texel[2], texel[1], texel[0], texel[3]],
            PixelFormat::Rgba8Unorm => [texel[0], texel[1], texel[2], texel[3]],
            PixelFormat::Rgb10A2Unorm => {
                let [r, g, b, a] = unpack_rgb10a2(texel);
                [(r >> 2) as u8, (g >> 2) as u8, (b >> 2) as u8, a as u8 * 0x55]
            }
            PixelFormat::Rgba16Float => unpack_rgba16f(texel).map(|v| (v * 255.0).round() as u8),
        }
    }

    fn rgba16(&self, x: u32, y: u32) -> [u16; 4] {
        let texel = self.texel(x, y);

        match self.format {
            PixelFormat::Rgb10A2Unorm => {
                let [r, g, b, a] = unpack_rgb10a2(texel);
                [widen_10(r), widen_10(g), widen_10(b), a as u16 * 0x5555]
            }
            PixelFormat::Rgba16Float => {
                unpack_rgba16f(texel).map(|v| (v * 65535.0).round() as u16)
            }
            PixelFormat::Bgra8Unorm | PixelFormat::Rgba8Unorm => {
                self.rgba8(x, y).map(|v| u16::from(v) * 0x101)
            }
        }
    }
}

/// Splits a packed 10:10:10:2 texel into its red, green, blue, and alpha fields.
fn unpack_rgb10a2(texel: &[u8]) -> [u32; 4] {
    let packed = u32::from_le_bytes([texel[0], texel[1], texel[2], texel[3]]);

    [
        packed & 0x3FF,
        (packed >> 10) & 0x3FF,
        (packed >> 20) & 0x3FF,
        packed >> 30,
    ]
}

/// Replicates the high bits of a 10 bit value into the low bits of a 16 bit value.
fn widen_10(value: u32) -> u16 {
    ((value << 6) | (value >> 4)) as u16
}

/// Decodes four half floats clamped to the displayable `[0, 1]` range.
fn unpack_rgba16f(texel: &[u8]) -> [f32; 4] {
    let channel = |i: usize| {
        let value = f16::from_le_bytes([texel[i * 2], texel[i * 2 + 1]]).to_f32();
        if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
    };

    [channel(0), channel(1), channel(2), channel(3)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_pixel(format: PixelFormat, texel: &[u8]) -> Frame {
        Frame::from_staging(StagingImage {
            width: 1,
            height: 1,
            format,
            row_pitch: texel.len(),
            data: texel.to_vec(),
        })
        .unwrap()
    }

    #[test]
    fn bgra_is_swizzled() {
        let frame = single_pixel(PixelFormat::Bgra8Unorm, &[1, 2, 3, 4]);
        assert_eq!(frame.pixel(0, 0), Some([3, 2, 1, 4]));
    }

    #[test]
    fn out_of_bounds_pixel_is_none() {
        let frame = single_pixel(PixelFormat::Rgba8Unorm, &[1, 2, 3, 4]);
        assert_eq!(frame.pixel(1, 0), None);
        assert_eq!(frame.pixel(0, 1), None);
    }

    #[test]
    fn rgb10a2_extremes() {
        let white = single_pixel(PixelFormat::Rgb10A2Unorm, &u32::MAX.to_le_bytes());
        assert_eq!(white.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(white.rgba16(0, 0), [u16::MAX; 4]);

        let red: u32 = 0x3FF | (0b11 << 30);
        let red = single_pixel(PixelFormat::Rgb10A2Unorm, &u32::to_le_bytes(red));
        assert_eq!(red.pixel(0, 0), Some([255, 0, 0, 255]));
    }

    #[test]
    fn half_float_is_clamped() {
        let texel: Vec<u8> = [2.0, 0.5, -1.0, 1.0]
            .into_iter()
            .flat_map(|v| f16::from_f32(v).to_le_bytes())
            .collect();
        let frame = single_pixel(PixelFormat::Rgba16Float, &texel);

        assert_eq!(frame.pixel(0, 0), Some([255, 128, 0, 255]));
        assert_eq!(frame.rgba16(0, 0), [u16::MAX, 32768, 0, u16::MAX]);
    }

    #[test]
    fn high_precision_sources_keep_16_bits() {
        let frame = single_pixel(PixelFormat::Rgba16Float, &[0; 8]);
        assert!(matches!(frame.to_image(), DynamicImage::ImageRgba16(_)));

        let frame = single_pixel(PixelFormat::Bgra8Unorm, &[0; 4]);
        assert!(matches!(frame.to_image(), DynamicImage::ImageRgba8(_)));
    }
}
