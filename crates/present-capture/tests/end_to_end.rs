//! A self test surface captured through the engine, both generations.

use image::GenericImageView;
use present_capture::{
    ApiGeneration, CaptureSettings, HookState, InitializationFailure, InterceptionEngine,
    SelfTestSurface,
};
use tempfile::TempDir;
use test_helper::{
    frames::{frame_files, open_frame},
    logger::init_logger,
    software::{SoftwareDriver, SoftwareHook, SoftwareRenderer},
};

fn expected_color(frame: u64) -> [u8; 4] {
    SelfTestSurface::frame_color(frame).map(|v| (v * 255.0).round() as u8)
}

fn capture_self_test_surface(generation: ApiGeneration) {
    init_logger();

    let driver = SoftwareDriver::new(generation);
    let output = TempDir::new().unwrap();

    let mut surface = SelfTestSurface::new(
        Box::new(driver.create_window()),
        Box::new(SoftwareRenderer::new(&driver)),
    );
    surface.initialize(640, 360).unwrap();

    let engine = InterceptionEngine::new(
        Box::new(SoftwareHook::new(&driver)),
        CaptureSettings::default(),
    );
    engine.hook().unwrap();
    engine
        .capture_frames(surface.surface_id(), output.path(), 3)
        .unwrap();

    surface.show();
    for _ in 0..5 {
        surface.render_frame().unwrap();
    }

    assert_eq!(
        frame_files(output.path()),
        ["frame-0.png", "frame-1.png", "frame-2.png"]
    );

    for frame in 0..3 {
        let image = open_frame(output.path(), &format!("frame-{frame}.png"));
        assert_eq!(image.dimensions(), (640, 360));
        assert_eq!(image.get_pixel(0, 0).0, expected_color(frame));
        assert_eq!(image.get_pixel(320, 180).0, expected_color(frame));
        assert_eq!(image.get_pixel(639, 359).0, expected_color(frame));
    }

    assert_eq!(surface.frames_rendered(), 5);
    assert_eq!(engine.state(), HookState::Installed);

    engine.unhook().unwrap();
    surface.uninitialize();
    assert!(!surface.renderer().is_initialized());
}

#[test]
fn immediate_generation_end_to_end() {
    capture_self_test_surface(ApiGeneration::D3D11);
}

#[test]
fn queued_generation_end_to_end() {
    capture_self_test_surface(ApiGeneration::D3D12);
}

#[test]
fn self_test_surface_lifecycle() {
    init_logger();

    let driver = SoftwareDriver::new(ApiGeneration::D3D11);
    let mut surface = SelfTestSurface::new(
        Box::new(driver.create_window()),
        Box::new(SoftwareRenderer::new(&driver)),
    );

    assert!(matches!(
        surface.initialize(0, 720),
        Err(InitializationFailure::InvalidSize {
            width: 0,
            height: 720
        })
    ));

    surface.initialize(1280, 720).unwrap();
    assert!(matches!(
        surface.initialize(1280, 720),
        Err(InitializationFailure::AlreadyInitialized)
    ));

    surface.resize(800, 600).unwrap();
    assert_eq!(surface.size(), [800, 600]);

    surface.uninitialize();
    surface.uninitialize();
    surface.initialize(320, 240).unwrap();
    assert_eq!(surface.frames_rendered(), 0);
}

#[test]
fn destroyed_window_cannot_be_initialized() {
    init_logger();

    let driver = SoftwareDriver::new(ApiGeneration::D3D12);
    let window = driver.create_window();
    let id = window.id();
    driver.destroy_window(id);

    let mut surface =
        SelfTestSurface::new(Box::new(window), Box::new(SoftwareRenderer::new(&driver)));

    assert!(matches!(
        surface.initialize(64, 64),
        Err(InitializationFailure::InvalidSurface(surface_id)) if surface_id == id
    ));
}
