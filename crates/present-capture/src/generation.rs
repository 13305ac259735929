use core::{fmt, str::FromStr};

use thiserror::Error;

/// The graphics API generation whose presentation call is intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiGeneration {
    /// Direct3D 11, work is submitted immediately through the device context.
    D3D11,

    /// Direct3D 12, work is recorded into command lists, submitted to a queue, and tracked with
    /// fences.
    D3D12,
}

/// How a generation hands work to the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionModel {
    /// The driver serializes access to a resource, reading it back never needs an explicit wait.
    Immediate,

    /// The CPU must wait on a fence before a resource written by queued work is safe to read.
    Queued,
}

impl ApiGeneration {
    /// Both supported generations.
    pub const ALL: [Self; 2] = [Self::D3D11, Self::D3D12];

    /// How this generation submits work.
    pub const fn submission_model(self) -> SubmissionModel {
        match self {
            Self::D3D11 => SubmissionModel::Immediate,
            Self::D3D12 => SubmissionModel::Queued,
        }
    }

    /// The DirectX version number.
    pub const fn version(self) -> u32 {
        match self {
            Self::D3D11 => 11,
            Self::D3D12 => 12,
        }
    }
}

impl fmt::Display for ApiGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DirectX {}", self.version())
    }
}

impl FromStr for ApiGeneration {
    type Err = UnsupportedGeneration;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let version = normalized
            .strip_prefix("d3d")
            .or_else(|| normalized.strip_prefix("dx"))
            .unwrap_or(&normalized);

        match version {
            "11" => Ok(Self::D3D11),
            "12" => Ok(Self::D3D12),
            _ => Err(UnsupportedGeneration(value.to_string())),
        }
    }
}

/// The requested API generation is not one of the two supported values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Only DirectX 11 and DirectX 12 are supported, got '{0}'")]
pub struct UnsupportedGeneration(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_version_numbers() {
        assert_eq!("11".parse(), Ok(ApiGeneration::D3D11));
        assert_eq!(" 12 ".parse(), Ok(ApiGeneration::D3D12));
        assert_eq!("D3D12".parse(), Ok(ApiGeneration::D3D12));
        assert_eq!("dx11".parse(), Ok(ApiGeneration::D3D11));
    }

    #[test]
    fn rejects_other_versions() {
        for value in ["9", "10", "13", "", "eleven", "d3d"] {
            let result: Result<ApiGeneration, _> = value.parse();
            assert_eq!(result, Err(UnsupportedGeneration(value.to_string())));
        }
    }

    #[test]
    fn submission_models() {
        assert_eq!(
            ApiGeneration::D3D11.submission_model(),
            SubmissionModel::Immediate
        );
        assert_eq!(
            ApiGeneration::D3D12.submission_model(),
            SubmissionModel::Queued
        );
    }
}
