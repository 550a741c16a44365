use std::fmt;
use std::io;

/// Render-target creation failed.
///
/// Raised by the bind step. The camera keeps rendering straight to the display
/// for the rest of the scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// Requested size has a zero dimension.
    InvalidSize { width: u32, height: u32 },

    /// Requested size is larger than the device allows.
    ExceedsDeviceLimit { width: u32, height: u32, limit: u32 },

    /// The backend refused the request.
    Device(String),
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize { width, height } => {
                write!(f, "invalid render target size {width}x{height}")
            }
            Self::ExceedsDeviceLimit { width, height, limit } => write!(
                f,
                "render target size {width}x{height} exceeds device limit {limit}"
            ),
            Self::Device(msg) => write!(f, "render target creation failed: {msg}"),
        }
    }
}

impl std::error::Error for AllocationError {}

/// Writing a render target to disk failed.
///
/// Capture is best-effort; the composite continues regardless.
#[derive(Debug)]
pub enum CaptureError {
    /// The backend could not read the target back.
    Readback(String),

    /// Image encoding failed.
    Encode(image::ImageError),

    /// Filesystem write failed.
    Io(io::Error),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Readback(msg) => write!(f, "render target readback failed: {msg}"),
            Self::Encode(e) => write!(f, "capture encoding failed: {e}"),
            Self::Io(e) => write!(f, "capture write failed: {e}"),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Readback(_) => None,
            Self::Encode(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for CaptureError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(e: image::ImageError) -> Self {
        Self::Encode(e)
    }
}

/// Loading or persisting the configuration file failed.
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config file i/o failed: {e}"),
            Self::Parse(e) => write!(f, "config file is not valid: {e}"),
            Self::Serialize(e) => write!(f, "config serialization failed: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Serialize(e) => Some(e),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Serialize(e)
    }
}
