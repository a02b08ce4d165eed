//! Audio data types

use std::fmt;

/// Bytes per sample; the host always delivers 32-bit float
pub const SAMPLE_SIZE: usize = std::mem::size_of::<f32>();

/// Sample layout the sink puts on the wire
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFourCC {
    /// Planar 32-bit float, one contiguous block per channel
    Fltp = u32::from_le_bytes(*b"FLTp"),
}

/// Audio format the host reports at negotiation time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: usize,
}

impl Default for AudioInfo {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
        }
    }
}

/// One block of captured audio as pushed by the host.
///
/// Each plane holds one channel. The host owns the memory for the duration
/// of the callback.
#[derive(Clone, Copy)]
pub struct AudioData<'a> {
    pub planes: &'a [&'a [f32]],
    pub frames: u32,
    /// Host clock, nanoseconds
    pub timestamp: u64,
}

impl<'a> AudioData<'a> {
    pub fn new(planes: &'a [&'a [f32]], frames: u32, timestamp: u64) -> Self {
        Self {
            planes,
            frames,
            timestamp,
        }
    }

    /// Bytes one channel occupies on the wire
    pub fn channel_stride(&self) -> usize {
        self.frames as usize * SAMPLE_SIZE
    }
}

impl fmt::Debug for AudioData<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioData")
            .field("planes", &self.planes.len())
            .field("frames", &self.frames)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}
