//! Outbound sender: wire frame descriptors and the sink library seam

use ndi_audio::AudioFourCC;
use ndi_video::FourCC;

/// Ask the sink to stamp the frame with its own clock
pub const TIMECODE_SYNTHESIZE: i64 = i64::MAX;

/// Frame-rate denominator; the numerator is `round(rate * 100)`
pub const FRAME_RATE_DENOMINATOR: i32 = 100;

/// Host nanoseconds per sink timecode unit
pub const TIMECODE_DIVISOR: u64 = 100;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Interleaved = 0,
    Progressive = 1,
}

/// Video frame as handed to the sink. Borrows either the host frame or the
/// output's conversion buffer.
#[derive(Debug, Clone, Copy)]
pub struct WireVideoFrame<'a> {
    pub xres: u32,
    pub yres: u32,
    pub fourcc: FourCC,
    pub frame_rate_n: i32,
    pub frame_rate_d: i32,
    /// 0 lets the sink assume square pixels
    pub picture_aspect_ratio: f32,
    pub frame_format: FrameFormat,
    /// 100 ns units
    pub timecode: i64,
    pub data: &'a [u8],
    pub line_stride: u32,
    pub metadata: Option<&'a str>,
}

/// Planar float audio as handed to the sink
#[derive(Debug, Clone, Copy)]
pub struct WireAudioFrame<'a> {
    pub sample_rate: u32,
    pub channels: u32,
    pub samples: u32,
    pub timecode: i64,
    pub fourcc: AudioFourCC,
    /// Bytes from the start of one channel to the next
    pub channel_stride: u32,
    pub data: &'a [u8],
    pub metadata: Option<&'a str>,
}

/// Parameters for a new sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderConfig<'a> {
    pub name: &'a str,
    pub groups: Option<&'a str>,
    /// The host already paces frames, so the sender never throttles
    pub clock_video: bool,
    pub clock_audio: bool,
}

impl<'a> SenderConfig<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            groups: None,
            clock_video: false,
            clock_audio: false,
        }
    }
}

/// An open sender. Dropping it destroys the sender.
pub trait Sender: Send + Sync {
    /// Queue a video frame and return without waiting for transmission.
    ///
    /// `frame.data` may be overwritten as soon as the next video send is
    /// issued, so the sink must be done with it by then.
    fn send_video_async(&self, frame: &WireVideoFrame<'_>);

    fn send_audio(&self, frame: &WireAudioFrame<'_>);
}

/// The loaded sink library, shared by every output
pub trait SinkLibrary: Send + Sync {
    type Sender: Sender;

    /// `None` when the library could not create the sender
    fn create_sender(&self, config: &SenderConfig<'_>) -> Option<Self::Sender>;
}

/// Rational rate the wire carries for a floating host rate.
///
/// Fractional NTSC rates come out approximate (29.97 becomes 2997/100).
pub fn frame_rate_numerator(frame_rate: f64) -> i32 {
    (frame_rate * FRAME_RATE_DENOMINATOR as f64).round() as i32
}

/// Sink timecode for a host timestamp
pub fn timecode_from_ns(timestamp_ns: u64) -> i64 {
    (timestamp_ns / TIMECODE_DIVISOR) as i64
}
