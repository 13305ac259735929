use core::fmt;

/// Pixel layout of a back buffer that can be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8 bits per channel, stored blue, green, red, alpha.
    Bgra8Unorm,

    /// 8 bits per channel, stored red, green, blue, alpha.
    Rgba8Unorm,

    /// 10 bits per colour channel and 2 bits of alpha, packed little endian into 32 bits.
    Rgb10A2Unorm,

    /// 16 bit float per channel, stored red, green, blue, alpha.
    Rgba16Float,
}

impl PixelFormat {
    /// Size of a single pixel in bytes.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bgra8Unorm | Self::Rgba8Unorm | Self::Rgb10A2Unorm => 4,
            Self::Rgba16Float => 8,
        }
    }

    /// If the format carries more than 8 bits of precision per colour channel.
    pub const fn is_high_precision(self) -> bool {
        matches!(self, Self::Rgb10A2Unorm | Self::Rgba16Float)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bgra8Unorm => "B8G8R8A8_UNORM",
            Self::Rgba8Unorm => "R8G8B8A8_UNORM",
            Self::Rgb10A2Unorm => "R10G10B10A2_UNORM",
            Self::Rgba16Float => "R16G16B16A16_FLOAT",
        };

        f.write_str(name)
    }
}
