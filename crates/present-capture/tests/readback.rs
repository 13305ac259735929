//! Readback of software back buffers and writing frames to disk.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use image::{DynamicImage, GenericImageView};
use present_capture::{
    ApiGeneration, CaptureSettings, InterceptionEngine, OutputFormat, PixelFormat,
    ReadbackFailure, RendererCapability, SurfaceWindow, WriteFailure, capture, write_frame,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tempfile::TempDir;
use test_helper::{
    frames::{frame_files, open_frame},
    logger::init_logger,
    software::{S_OK, SoftwareDriver, SoftwareHook, SoftwareRenderer, SoftwareWindow},
};

const TIMEOUT: Duration = Duration::from_millis(1000);

fn renderer(
    generation: ApiGeneration,
    format: PixelFormat,
    size: [u32; 2],
) -> (Arc<SoftwareDriver>, SoftwareWindow, SoftwareRenderer) {
    init_logger();

    let driver = SoftwareDriver::new(generation);
    let window = driver.create_window();
    window.show();

    let mut renderer = SoftwareRenderer::with_format(&driver, format);
    renderer
        .initialize(window.id(), size[0], size[1])
        .unwrap();

    (driver, window, renderer)
}

fn random_pixels(rng: &mut StdRng, size: [u32; 2]) -> Vec<[u8; 4]> {
    (0..size[0] * size[1]).map(|_| rng.random()).collect()
}

#[test]
fn padded_rows_never_leak() {
    let size = [13, 7];
    let (_driver, _window, mut renderer) =
        renderer(ApiGeneration::D3D12, PixelFormat::Bgra8Unorm, size);

    let swap_chain = renderer.swap_chain().unwrap();
    assert!(swap_chain.row_pitch() > size[0] as usize * 4);

    let mut rng = StdRng::seed_from_u64(0x5EED);
    let pixels = random_pixels(&mut rng, size);
    swap_chain.paint(|x, y| pixels[(y * size[0] + x) as usize]);
    renderer.present().unwrap();

    let back_buffer = renderer.current_back_buffer().unwrap();
    let frame = capture(back_buffer.as_ref(), TIMEOUT).unwrap();

    assert_eq!(frame.data().len(), 13 * 7 * 4);
    assert_eq!(frame.rows().count(), 7);
    assert!(frame.rows().all(|row| row.len() == 13 * 4));

    for y in 0..size[1] {
        for x in 0..size[0] {
            assert_eq!(
                frame.pixel(x, y),
                Some(pixels[(y * size[0] + x) as usize]),
                "pixel ({x}, {y})"
            );
        }
    }
}

#[test]
fn captured_pixels_round_trip_through_disk() {
    let size = [97, 41];
    let (driver, window, mut renderer) =
        renderer(ApiGeneration::D3D11, PixelFormat::Bgra8Unorm, size);
    let output = TempDir::new().unwrap();

    let engine = InterceptionEngine::new(
        Box::new(SoftwareHook::new(&driver)),
        CaptureSettings::default(),
    );
    engine.hook().unwrap();
    engine
        .capture_frames(window.id(), output.path(), 1)
        .unwrap();

    let mut rng = StdRng::seed_from_u64(41);
    let pixels = random_pixels(&mut rng, size);
    renderer
        .swap_chain()
        .unwrap()
        .paint(|x, y| pixels[(y * size[0] + x) as usize]);
    renderer.present().unwrap();

    let image = open_frame(output.path(), "frame-0.png");
    assert_eq!(image.dimensions(), (size[0], size[1]));

    for _ in 0..64 {
        let x = rng.random_range(0..size[0]);
        let y = rng.random_range(0..size[1]);
        assert_eq!(
            image.get_pixel(x, y).0,
            pixels[(y * size[0] + x) as usize],
            "pixel ({x}, {y})"
        );
    }
}

#[test]
fn high_precision_formats_write_16_bit_png() {
    for format in [PixelFormat::Rgba16Float, PixelFormat::Rgb10A2Unorm] {
        let (driver, window, mut renderer) = renderer(ApiGeneration::D3D12, format, [8, 8]);
        let output = TempDir::new().unwrap();

        let engine = InterceptionEngine::new(
            Box::new(SoftwareHook::new(&driver)),
            CaptureSettings::default(),
        );
        engine.hook().unwrap();
        engine
            .capture_frames(window.id(), output.path(), 1)
            .unwrap();

        renderer.render([1.0, 0.0, 1.0, 1.0]).unwrap();
        renderer.present().unwrap();

        let image = open_frame(output.path(), "frame-0.png");
        let DynamicImage::ImageRgba16(image) = image else {
            panic!("{format} was not written as 16 bit RGBA");
        };
        assert_eq!(image.get_pixel(3, 5).0, [u16::MAX, 0, u16::MAX, u16::MAX]);
    }
}

#[test]
fn bmp_output_is_8_bit() {
    let (driver, window, mut renderer) =
        renderer(ApiGeneration::D3D11, PixelFormat::Rgba16Float, [10, 6]);
    let output = TempDir::new().unwrap();

    let settings = CaptureSettings {
        output_format: OutputFormat::Bmp,
        ..CaptureSettings::default()
    };
    let engine = InterceptionEngine::new(Box::new(SoftwareHook::new(&driver)), settings);
    engine.hook().unwrap();
    engine
        .capture_frames(window.id(), output.path(), 2)
        .unwrap();

    renderer.render([0.0, 1.0, 1.0, 1.0]).unwrap();
    renderer.present().unwrap();
    renderer.render([2.0, -1.0, 0.0, 1.0]).unwrap();
    renderer.present().unwrap();

    assert_eq!(frame_files(output.path()), ["frame-0.bmp", "frame-1.bmp"]);

    let first = open_frame(output.path(), "frame-0.bmp").to_rgba8();
    assert_eq!(first.get_pixel(9, 5).0, [0, 255, 255, 255]);

    let clamped = open_frame(output.path(), "frame-1.bmp").to_rgba8();
    assert_eq!(clamped.get_pixel(0, 0).0, [255, 0, 0, 255]);
}

#[test]
fn stalled_fence_times_out() {
    let (_driver, _window, mut renderer) =
        renderer(ApiGeneration::D3D12, PixelFormat::Bgra8Unorm, [4, 4]);

    let swap_chain = renderer.swap_chain().unwrap();
    swap_chain.set_stalled(true);
    renderer.render([1.0, 1.0, 1.0, 1.0]).unwrap();
    renderer.present().unwrap();

    let timeout = Duration::from_millis(50);
    let start = Instant::now();
    let back_buffer = renderer.current_back_buffer().unwrap();
    let result = capture(back_buffer.as_ref(), timeout);

    assert!(matches!(result, Err(ReadbackFailure::Timeout(t)) if t == timeout));
    assert!(start.elapsed() >= timeout);
    assert!(start.elapsed() < Duration::from_secs(5));
    drop(back_buffer);

    renderer.swap_chain().unwrap().set_stalled(false);
    let back_buffer = renderer.current_back_buffer().unwrap();
    assert!(capture(back_buffer.as_ref(), timeout).is_ok());
}

#[test]
fn stalled_fence_consumes_budget_and_forwards() {
    let (driver, window, mut renderer) =
        renderer(ApiGeneration::D3D12, PixelFormat::Bgra8Unorm, [4, 4]);
    let output = TempDir::new().unwrap();

    let settings = CaptureSettings {
        buffer_ready_timeout: Duration::from_millis(20),
        ..CaptureSettings::default()
    };
    let engine = InterceptionEngine::new(Box::new(SoftwareHook::new(&driver)), settings);
    engine.hook().unwrap();
    engine
        .capture_frames(window.id(), output.path(), 2)
        .unwrap();

    renderer.swap_chain().unwrap().set_stalled(true);
    renderer.render([1.0, 0.0, 0.0, 1.0]).unwrap();
    renderer.present().unwrap();
    assert_eq!(renderer.last_status().unwrap().code, S_OK);

    renderer.swap_chain().unwrap().set_stalled(false);
    renderer.render([0.0, 0.0, 1.0, 1.0]).unwrap();
    renderer.present().unwrap();

    assert_eq!(frame_files(output.path()), ["frame-1.png"]);

    let progress = engine.capture_progress().unwrap();
    assert_eq!(progress.failed, 1);
    assert_eq!(progress.written, 1);
    assert!(progress.is_complete());
    assert_eq!(driver.original_calls(), 2);
}

#[test]
fn immediate_generation_never_waits() {
    let (_driver, _window, mut renderer) =
        renderer(ApiGeneration::D3D11, PixelFormat::Rgba8Unorm, [4, 4]);

    renderer.swap_chain().unwrap().set_stalled(true);
    renderer.render([0.0, 1.0, 0.0, 1.0]).unwrap();
    renderer.present().unwrap();

    renderer.wait_for_buffer_ready(Duration::ZERO).unwrap();
    let back_buffer = renderer.current_back_buffer().unwrap();
    let frame = capture(back_buffer.as_ref(), Duration::ZERO).unwrap();
    assert_eq!(frame.pixel(2, 2), Some([0, 255, 0, 255]));
}

#[test]
fn nothing_presented_has_no_back_buffer() {
    let (_driver, _window, renderer) =
        renderer(ApiGeneration::D3D11, PixelFormat::Bgra8Unorm, [4, 4]);

    assert!(matches!(
        renderer.current_back_buffer(),
        Err(ReadbackFailure::NothingPresented)
    ));
}

#[test]
fn writing_to_missing_directory_fails() {
    let (_driver, _window, mut renderer) =
        renderer(ApiGeneration::D3D11, PixelFormat::Bgra8Unorm, [4, 4]);
    renderer.render([1.0, 1.0, 0.0, 1.0]).unwrap();
    renderer.present().unwrap();

    let back_buffer = renderer.current_back_buffer().unwrap();
    let frame = capture(back_buffer.as_ref(), TIMEOUT).unwrap();

    let output = TempDir::new().unwrap();
    let missing = output.path().join("missing");

    let result = write_frame(&frame, &missing, 0, OutputFormat::Png);
    assert!(matches!(result, Err(WriteFailure::MissingDirectory(path)) if path == missing));

    let written = write_frame(&frame, output.path(), 7, OutputFormat::Png).unwrap();
    assert_eq!(written, output.path().join("frame-7.png"));
}
