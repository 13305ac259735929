use half::f16;
use present_capture::PixelFormat;

/// Encodes a normalized RGBA colour as a single texel of `format`.
pub fn encode_color(format: PixelFormat, color: [f32; 4]) -> Vec<u8> {
    let unorm = |value: f32, max: f32| (value.clamp(0.0, 1.0) * max).round() as u32;

    match format {
        PixelFormat::Bgra8Unorm => {
            let [r, g, b, a] = color.map(|v| unorm(v, 255.0) as u8);
            vec![b, g, r, a]
        }

        PixelFormat::Rgba8Unorm => color.map(|v| unorm(v, 255.0) as u8).to_vec(),

        PixelFormat::Rgb10A2Unorm => {
            let [r, g, b] = [color[0], color[1], color[2]].map(|v| unorm(v, 1023.0));
            let a = unorm(color[3], 3.0);
            (r | (g << 10) | (b << 20) | (a << 30)).to_le_bytes().to_vec()
        }

        PixelFormat::Rgba16Float => color
            .iter()
            .flat_map(|v| f16::from_f32(*v).to_le_bytes())
            .collect(),
    }
}
