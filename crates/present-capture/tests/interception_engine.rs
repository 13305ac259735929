//! Interception engine lifecycle and capture session behaviour against the software driver.

use std::{path::Path, sync::Arc, thread};

use present_capture::{
    ApiGeneration, CaptureError, CaptureSettings, HookError, HookState, InterceptionEngine,
    RendererCapability, SelfTestSurface, SurfaceId, SurfaceWindow,
};
use tempfile::TempDir;
use test_helper::{
    frames::{frame_files, sequence_of},
    logger::init_logger,
    software::{S_OK, SoftwareDriver, SoftwareHook, SoftwareRenderer, SoftwareWindow},
};

struct Fixture {
    driver: Arc<SoftwareDriver>,
    engine: InterceptionEngine,
    renderer: SoftwareRenderer,
    window: SoftwareWindow,
    output: TempDir,
}

impl Fixture {
    fn new(generation: ApiGeneration) -> Self {
        init_logger();

        let driver = SoftwareDriver::new(generation);

        let window = driver.create_window();
        window.show();

        let mut renderer = SoftwareRenderer::new(&driver);
        renderer.initialize(window.id(), 64, 32).unwrap();

        let engine = InterceptionEngine::new(
            Box::new(SoftwareHook::new(&driver)),
            CaptureSettings::default(),
        );

        Self {
            driver,
            engine,
            renderer,
            window,
            output: TempDir::new().unwrap(),
        }
    }

    fn target(&self) -> SurfaceId {
        self.window.id()
    }

    fn output(&self) -> &Path {
        self.output.path()
    }

    fn present(&mut self, count: u64) {
        for _ in 0..count {
            let frame = self.renderer.swap_chain().unwrap().frames_presented();
            self.renderer
                .render(SelfTestSurface::frame_color(frame))
                .unwrap();
            self.renderer.present().unwrap();
            assert_eq!(self.renderer.last_status().unwrap().code, S_OK);
        }
    }

    fn files(&self) -> Vec<String> {
        frame_files(self.output())
    }
}

fn names(sequences: impl IntoIterator<Item = u32>) -> Vec<String> {
    sequences
        .into_iter()
        .map(|sequence| format!("frame-{sequence}.png"))
        .collect()
}

#[test]
fn hook_twice_fails() {
    let fixture = Fixture::new(ApiGeneration::D3D11);

    fixture.engine.hook().unwrap();
    let result = fixture.engine.hook();

    assert!(matches!(
        result,
        Err(HookError::AlreadyHooked(ApiGeneration::D3D11))
    ));
    assert_eq!(fixture.driver.patch_count(), 1);
    assert_eq!(fixture.engine.state(), HookState::Installed);
}

#[test]
fn unhook_restores_original_once() {
    let mut fixture = Fixture::new(ApiGeneration::D3D11);

    fixture.engine.hook().unwrap();
    assert!(fixture.driver.is_patched());

    fixture.engine.unhook().unwrap();
    fixture.engine.unhook().unwrap();

    assert_eq!(fixture.driver.restore_count(), 1);
    assert!(!fixture.driver.is_patched());
    assert_eq!(fixture.engine.state(), HookState::Uninstalled);

    fixture.present(3);
    assert_eq!(fixture.driver.original_calls(), 3);
    assert_eq!(fixture.renderer.last_status().unwrap().frame, 3);
}

#[test]
fn unhooked_calls_match_uninstrumented_run() {
    let mut hooked = Fixture::new(ApiGeneration::D3D12);
    let mut plain = Fixture::new(ApiGeneration::D3D12);

    hooked.engine.hook().unwrap();
    hooked.present(2);
    hooked.engine.unhook().unwrap();
    plain.present(2);

    hooked.present(2);
    plain.present(2);

    assert_eq!(hooked.renderer.last_status(), plain.renderer.last_status());
    assert_eq!(hooked.driver.original_calls(), plain.driver.original_calls());
}

#[test]
fn refused_patch_fails_and_can_retry() {
    let fixture = Fixture::new(ApiGeneration::D3D11);

    fixture.driver.refuse_patch(true);
    assert!(matches!(
        fixture.engine.hook(),
        Err(HookError::PatchFailed(_))
    ));
    assert_eq!(fixture.engine.state(), HookState::Uninstalled);

    fixture.driver.refuse_patch(false);
    fixture.engine.hook().unwrap();
    assert_eq!(fixture.engine.state(), HookState::Installed);
}

#[test]
fn rejects_non_positive_frame_count() {
    let fixture = Fixture::new(ApiGeneration::D3D11);
    fixture.engine.hook().unwrap();

    for frame_count in [0, -1, i64::MIN, i64::from(u32::MAX) + 1] {
        let result = fixture
            .engine
            .capture_frames(fixture.target(), fixture.output(), frame_count);

        assert!(matches!(
            result,
            Err(CaptureError::InvalidArgument { frame_count: rejected }) if rejected == frame_count
        ));
    }

    assert_eq!(fixture.engine.capture_progress(), None);
    assert_eq!(fixture.engine.state(), HookState::Installed);
}

#[test]
fn capture_requires_hook() {
    let fixture = Fixture::new(ApiGeneration::D3D12);

    let result = fixture
        .engine
        .capture_frames(fixture.target(), fixture.output(), 3);

    assert!(matches!(
        result,
        Err(CaptureError::NotHooked(ApiGeneration::D3D12))
    ));
    assert_eq!(fixture.engine.capture_progress(), None);
}

#[test]
fn unresolved_target_is_not_found() {
    let mut fixture = Fixture::new(ApiGeneration::D3D11);
    fixture.engine.hook().unwrap();

    for target in [SurfaceId::NULL, SurfaceId(0x7)] {
        let result = fixture.engine.capture_frames(target, fixture.output(), 3);
        assert!(matches!(result, Err(CaptureError::TargetNotFound(t)) if t == target));
    }

    fixture.present(3);

    assert!(fixture.files().is_empty());
    assert_eq!(fixture.engine.capture_progress(), None);
    assert_eq!(fixture.engine.state(), HookState::Installed);
}

#[test]
fn writes_exactly_frame_count_files() {
    let mut fixture = Fixture::new(ApiGeneration::D3D11);
    fixture.engine.hook().unwrap();
    fixture
        .engine
        .capture_frames(fixture.target(), fixture.output(), 4)
        .unwrap();

    assert_eq!(
        fixture.engine.state(),
        HookState::Capturing {
            target: fixture.target()
        }
    );

    fixture.present(4);
    assert_eq!(fixture.files(), names(0..4));

    fixture.present(2);
    assert_eq!(fixture.files(), names(0..4));

    let progress = fixture.engine.capture_progress().unwrap();
    assert!(progress.is_complete());
    assert_eq!(progress.written, 4);
    assert_eq!(progress.failed, 0);
    assert_eq!(fixture.engine.state(), HookState::Installed);
    assert_eq!(fixture.driver.original_calls(), 6);
}

#[test]
fn completed_session_can_be_rearmed() {
    let mut fixture = Fixture::new(ApiGeneration::D3D12);
    fixture.engine.hook().unwrap();

    fixture
        .engine
        .capture_frames(fixture.target(), fixture.output(), 1)
        .unwrap();
    fixture.present(1);

    let second = TempDir::new().unwrap();
    fixture
        .engine
        .capture_frames(fixture.target(), second.path(), 2)
        .unwrap();
    fixture.present(3);

    assert_eq!(fixture.files(), names(0..1));
    assert_eq!(frame_files(second.path()), names(0..2));
}

#[test]
fn second_arm_fails_without_disturbing_first() {
    let mut fixture = Fixture::new(ApiGeneration::D3D11);
    fixture.engine.hook().unwrap();
    fixture
        .engine
        .capture_frames(fixture.target(), fixture.output(), 3)
        .unwrap();

    fixture.present(1);

    let other = TempDir::new().unwrap();
    let result = fixture
        .engine
        .capture_frames(fixture.target(), other.path(), 5);
    assert!(matches!(
        result,
        Err(CaptureError::AlreadyCapturing { target }) if target == fixture.target()
    ));

    let progress = fixture.engine.capture_progress().unwrap();
    assert_eq!(progress.requested, 3);
    assert_eq!(progress.attempted, 1);
    assert_eq!(progress.remaining, 2);

    fixture.present(2);
    assert_eq!(fixture.files(), names(0..3));
    assert!(frame_files(other.path()).is_empty());
}

#[test]
fn failed_readback_consumes_budget() {
    let mut fixture = Fixture::new(ApiGeneration::D3D11);
    fixture.engine.hook().unwrap();
    fixture
        .engine
        .capture_frames(fixture.target(), fixture.output(), 3)
        .unwrap();

    fixture.renderer.swap_chain().unwrap().fail_next_copies(1);
    fixture.present(5);

    assert_eq!(fixture.files(), names(1..3));

    let progress = fixture.engine.capture_progress().unwrap();
    assert_eq!(progress.failed, 1);
    assert_eq!(progress.written, 2);
    assert!(progress.is_complete());
    assert_eq!(fixture.driver.original_calls(), 5);
    assert_eq!(fixture.renderer.last_status().unwrap().frame, 5);
}

#[test]
fn missing_destination_fails_every_frame() {
    let mut fixture = Fixture::new(ApiGeneration::D3D12);
    fixture.engine.hook().unwrap();

    let missing = fixture.output().join("missing");
    fixture
        .engine
        .capture_frames(fixture.target(), &missing, 2)
        .unwrap();

    fixture.present(3);

    assert!(!missing.exists());
    let progress = fixture.engine.capture_progress().unwrap();
    assert_eq!(progress.failed, 2);
    assert_eq!(progress.written, 0);
    assert_eq!(fixture.driver.original_calls(), 3);
}

#[test]
fn unhook_disarms_session() {
    let mut fixture = Fixture::new(ApiGeneration::D3D11);
    fixture.engine.hook().unwrap();
    fixture
        .engine
        .capture_frames(fixture.target(), fixture.output(), 5)
        .unwrap();

    fixture.present(2);
    fixture.engine.unhook().unwrap();
    fixture.present(2);

    assert_eq!(fixture.files(), names(0..2));
    assert_eq!(fixture.engine.capture_progress().unwrap().remaining, 3);

    fixture.engine.hook().unwrap();
    assert_eq!(fixture.engine.state(), HookState::Installed);

    fixture.present(1);
    assert_eq!(fixture.files(), names(0..2));
}

#[test]
fn other_surfaces_are_forwarded_untouched() {
    let mut fixture = Fixture::new(ApiGeneration::D3D11);

    let target = fixture.driver.create_window();
    fixture.engine.hook().unwrap();
    fixture
        .engine
        .capture_frames(target.id(), fixture.output(), 2)
        .unwrap();

    fixture.present(3);

    assert!(fixture.files().is_empty());
    assert_eq!(fixture.engine.capture_progress().unwrap().attempted, 0);
    assert_eq!(fixture.driver.original_calls(), 3);
}

#[test]
fn destroyed_target_stays_armed() {
    let mut fixture = Fixture::new(ApiGeneration::D3D12);

    let target = fixture.driver.create_window();
    let mut target_renderer = SoftwareRenderer::new(&fixture.driver);
    target_renderer.initialize(target.id(), 16, 16).unwrap();

    fixture.engine.hook().unwrap();
    fixture
        .engine
        .capture_frames(target.id(), fixture.output(), 3)
        .unwrap();

    target_renderer.render([1.0, 0.0, 0.0, 1.0]).unwrap();
    target_renderer.present().unwrap();

    let target_id = target.id();
    target_renderer.destroy();
    drop(target);
    assert!(!fixture.driver.is_live(target_id));

    fixture.present(3);

    assert_eq!(fixture.files(), names(0..1));
    assert_eq!(
        fixture.engine.state(),
        HookState::Capturing { target: target_id }
    );
    assert_eq!(fixture.engine.capture_progress().unwrap().remaining, 2);
}

#[test]
fn concurrent_presents_never_exceed_budget() {
    let mut fixture = Fixture::new(ApiGeneration::D3D12);
    fixture.engine.hook().unwrap();
    fixture
        .engine
        .capture_frames(fixture.target(), fixture.output(), 10)
        .unwrap();

    fixture.renderer.render([0.0, 1.0, 0.0, 1.0]).unwrap();

    let driver = &fixture.driver;
    let swap_chain = fixture.renderer.swap_chain().unwrap();
    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..20 {
                    driver.present(swap_chain);
                }
            });
        }
    });

    let files = fixture.files();
    assert_eq!(files.len(), 10);

    let mut sequences: Vec<u32> = files.iter().filter_map(|f| sequence_of(f)).collect();
    sequences.sort_unstable();
    assert_eq!(sequences, (0..10).collect::<Vec<_>>());

    assert_eq!(fixture.driver.original_calls(), 160);
    assert!(fixture.engine.capture_progress().unwrap().is_complete());
}

#[test]
fn dropping_engine_unhooks() {
    let fixture = Fixture::new(ApiGeneration::D3D11);
    fixture.engine.hook().unwrap();

    let Fixture { driver, engine, .. } = fixture;
    drop(engine);

    assert_eq!(driver.restore_count(), 1);
    assert!(!driver.is_patched());
}
