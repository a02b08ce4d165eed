//! Start failures

use ndi_video::PixelFormat;
use thiserror::Error;

/// Why `start` refused to begin capture.
///
/// None of these are fatal: the output is left idle and can be started again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OutputError {
    #[error("output already started")]
    AlreadyStarted,

    #[error("no video and audio available")]
    NoMedia,

    #[error("unsupported pixel format {0:?}")]
    UnsupportedFormat(PixelFormat),

    #[error("ndi sender init failed")]
    SinkInitFailed,

    #[error("data capture start failed")]
    CaptureStartFailed,
}

impl OutputError {
    /// Level the failure is logged at
    pub fn log_level(&self) -> log::Level {
        match self {
            OutputError::AlreadyStarted => log::Level::Info,
            OutputError::UnsupportedFormat(_) => log::Level::Warn,
            _ => log::Level::Error,
        }
    }
}
