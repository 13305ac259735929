use std::{
    fs, io,
    path::{Path, PathBuf},
};

use present_capture::{CaptureSettings, OutputFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings read from the optional config file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub frame_count: i64,
    pub output_directory: PathBuf,
    pub output_format: OutputFormat,
    pub buffer_ready_timeout_ms: u64,
}

impl Config {
    /// Loads the config file, `None` if it does not exist.
    pub fn try_load_config(path: &Path) -> Result<Option<Self>, Error> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(Error::Read {
                    path: path.to_path_buf(),
                    source: error,
                });
            }
        };

        let config = toml::from_str(&contents).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Some(config))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            frame_count: 10,
            output_directory: PathBuf::from("."),
            output_format: OutputFormat::Png,
            buffer_ready_timeout_ms: CaptureSettings::DEFAULT_BUFFER_READY_TIMEOUT.as_millis()
                as u64,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read config file {path:?}:\n{source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {path:?}:\n{source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use present_capture::OutputFormat;
    use tempfile::TempDir;

    use super::{Config, Error};

    #[test]
    fn missing_file_is_none() {
        let directory = TempDir::new().unwrap();
        let path = directory.path().join("frame-grabber.toml");

        assert_eq!(Config::try_load_config(&path).unwrap(), None);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let directory = TempDir::new().unwrap();
        let path = directory.path().join("frame-grabber.toml");
        fs::write(&path, "frame_count = 3\noutput_format = \"bmp\"\n").unwrap();

        let config = Config::try_load_config(&path).unwrap().unwrap();

        assert_eq!(config.frame_count, 3);
        assert_eq!(config.output_format, OutputFormat::Bmp);
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.output_directory, PathBuf::from("."));
        assert_eq!(config.buffer_ready_timeout_ms, 1000);
    }

    #[test]
    fn invalid_file_fails_to_parse() {
        let directory = TempDir::new().unwrap();
        let path = directory.path().join("frame-grabber.toml");
        fs::write(&path, "output_format = \"gif\"\n").unwrap();

        assert!(matches!(
            Config::try_load_config(&path),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let directory = TempDir::new().unwrap();
        let path = directory.path().join("frame-grabber.toml");
        fs::write(&path, "frames = 3\n").unwrap();

        assert!(matches!(
            Config::try_load_config(&path),
            Err(Error::Parse { .. })
        ));
    }
}
