use core::time::Duration;
use std::path::PathBuf;

use present_capture::{ApiGeneration, CaptureSettings};

use crate::{cli::Cli, config::Config};

/// Which surface the captured frames come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetSelector {
    /// The window this process renders the self test surface into.
    SelfTest,

    /// The top level window with exactly this title.
    Title(String),

    /// The main window of a process.
    ProcessId(u32),
}

/// Settings of a run, the command line overriding the config file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub generation: ApiGeneration,
    pub target: TargetSelector,
    pub output_directory: PathBuf,
    pub frame_count: i64,
    pub width: u32,
    pub height: u32,
    pub capture: CaptureSettings,
}

impl Settings {
    pub fn resolve(cli: &Cli, config: Config) -> Self {
        let target = match (&cli.window_title, cli.pid) {
            (Some(title), _) => TargetSelector::Title(title.clone()),
            (None, Some(pid)) => TargetSelector::ProcessId(pid),
            (None, None) => TargetSelector::SelfTest,
        };

        Self {
            generation: cli.generation,
            target,
            output_directory: cli.output.clone().unwrap_or(config.output_directory),
            frame_count: cli.frames.unwrap_or(config.frame_count),
            width: config.width,
            height: config.height,
            capture: CaptureSettings {
                buffer_ready_timeout: Duration::from_millis(config.buffer_ready_timeout_ms),
                output_format: cli.format.unwrap_or(config.output_format),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;
    use std::path::PathBuf;

    use clap::Parser;
    use present_capture::{ApiGeneration, OutputFormat};

    use super::{Settings, TargetSelector};
    use crate::{cli::Cli, config::Config};

    #[test]
    fn config_fills_what_the_command_line_omits() {
        let cli = Cli::try_parse_from(["frame-grabber", "12"]).unwrap();
        let config = Config {
            frame_count: 7,
            output_directory: PathBuf::from("captures"),
            buffer_ready_timeout_ms: 250,
            ..Config::default()
        };

        let settings = Settings::resolve(&cli, config);

        assert_eq!(settings.generation, ApiGeneration::D3D12);
        assert_eq!(settings.target, TargetSelector::SelfTest);
        assert_eq!(settings.frame_count, 7);
        assert_eq!(settings.output_directory, PathBuf::from("captures"));
        assert_eq!(
            settings.capture.buffer_ready_timeout,
            Duration::from_millis(250)
        );
        assert_eq!(settings.capture.output_format, OutputFormat::Png);
    }

    #[test]
    fn command_line_overrides_config() {
        let cli = Cli::try_parse_from([
            "frame-grabber",
            "11",
            "--pid",
            "42",
            "--frames",
            "2",
            "--output",
            "elsewhere",
            "--format",
            "bmp",
        ])
        .unwrap();

        let settings = Settings::resolve(&cli, Config::default());

        assert_eq!(settings.target, TargetSelector::ProcessId(42));
        assert_eq!(settings.frame_count, 2);
        assert_eq!(settings.output_directory, PathBuf::from("elsewhere"));
        assert_eq!(settings.capture.output_format, OutputFormat::Bmp);
    }

    #[test]
    fn title_selects_window() {
        let cli = Cli::try_parse_from(["frame-grabber", "11", "Black Box"]).unwrap();
        let settings = Settings::resolve(&cli, Config::default());

        assert_eq!(
            settings.target,
            TargetSelector::Title(String::from("Black Box"))
        );
    }
}
