use std::path::PathBuf;

use clap::Parser;
use present_capture::{ApiGeneration, OutputFormat};

/// Default location of the config file.
pub const DEFAULT_CONFIG_PATH: &str = "frame-grabber.toml";

/// Captures frames presented through Direct3D 11 or Direct3D 12.
///
/// Without a window title or process id the frames of the built in self test window are
/// captured.
#[derive(Debug, Parser)]
#[command(name = "frame-grabber", version)]
pub struct Cli {
    /// Direct3D generation to intercept, 11 or 12.
    #[arg(default_value = "11")]
    pub generation: ApiGeneration,

    /// Exact title of the window to capture.
    pub window_title: Option<String>,

    /// Capture the main window of this process instead of a titled window.
    #[arg(long, conflicts_with = "window_title")]
    pub pid: Option<u32>,

    /// Directory the frames are written to.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of frames to capture.
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub frames: Option<i64>,

    /// Image format of the written frames.
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Path of the config file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Log everything down to trace level.
    #[arg(long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use clap::{Parser, error::ErrorKind};
    use present_capture::{ApiGeneration, OutputFormat};

    use super::Cli;

    #[test]
    fn defaults_to_immediate_generation() {
        let cli = Cli::try_parse_from(["frame-grabber"]).unwrap();

        assert_eq!(cli.generation, ApiGeneration::D3D11);
        assert_eq!(cli.window_title, None);
        assert_eq!(cli.config.to_str(), Some(super::DEFAULT_CONFIG_PATH));
        assert!(!cli.debug);
    }

    #[test]
    fn parses_every_option() {
        let cli = Cli::try_parse_from([
            "frame-grabber",
            "12",
            "Black Box",
            "--output",
            "frames",
            "--frames",
            "4",
            "--format",
            "bmp",
            "--debug",
        ])
        .unwrap();

        assert_eq!(cli.generation, ApiGeneration::D3D12);
        assert_eq!(cli.window_title.as_deref(), Some("Black Box"));
        assert_eq!(cli.output.unwrap().to_str(), Some("frames"));
        assert_eq!(cli.frames, Some(4));
        assert_eq!(cli.format, Some(OutputFormat::Bmp));
        assert!(cli.debug);
    }

    #[test]
    fn keeps_non_positive_frame_counts() {
        let cli = Cli::try_parse_from(["frame-grabber", "--frames", "-2"]).unwrap();
        assert_eq!(cli.frames, Some(-2));
    }

    #[test]
    fn rejects_other_generations() {
        let error = Cli::try_parse_from(["frame-grabber", "9"]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn title_and_pid_conflict() {
        let error =
            Cli::try_parse_from(["frame-grabber", "11", "Notepad", "--pid", "42"]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ArgumentConflict);
    }
}
