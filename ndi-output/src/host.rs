//! What the output needs from the host media pipeline

use std::sync::Arc;

use ndi_audio::AudioInfo;
use ndi_video::VideoInfo;

/// Which streams the host should start pushing
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CaptureFlags {
    pub video: bool,
    pub audio: bool,
}

impl CaptureFlags {
    pub const VIDEO: u32 = 1 << 0;
    pub const AUDIO: u32 = 1 << 1;

    pub fn bits(self) -> u32 {
        let mut bits = 0;
        if self.video {
            bits |= Self::VIDEO;
        }
        if self.audio {
            bits |= Self::AUDIO;
        }
        bits
    }

    pub fn is_empty(self) -> bool {
        !self.video && !self.audio
    }
}

/// Host side of one output instance.
///
/// Lifecycle calls and frame pushes may arrive on different host threads.
pub trait MediaHost: Send + Sync {
    /// Current video format, or `None` when the host has no video source
    fn video(&self) -> Option<VideoInfo>;

    /// Current audio format, or `None` when the host has no audio source
    fn audio(&self) -> Option<AudioInfo>;

    /// Ask the host to start pushing frames. `false` means it refused.
    fn begin_capture(&self, flags: CaptureFlags) -> bool;

    fn end_capture(&self);
}

impl<T: MediaHost + ?Sized> MediaHost for Arc<T> {
    fn video(&self) -> Option<VideoInfo> {
        (**self).video()
    }

    fn audio(&self) -> Option<AudioInfo> {
        (**self).audio()
    }

    fn begin_capture(&self, flags: CaptureFlags) -> bool {
        (**self).begin_capture(flags)
    }

    fn end_capture(&self) {
        (**self).end_capture()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_flag_bits() {
        assert_eq!(CaptureFlags::default().bits(), 0);
        assert!(CaptureFlags::default().is_empty());

        let av = CaptureFlags {
            video: true,
            audio: true,
        };
        assert_eq!(av.bits(), 3);

        let audio_only = CaptureFlags {
            video: false,
            audio: true,
        };
        assert_eq!(audio_only.bits(), CaptureFlags::AUDIO);
    }
}
