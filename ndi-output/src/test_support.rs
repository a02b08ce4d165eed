//! Recording host and sink doubles shared by the unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::{const_mutex, Mutex};

use ndi_audio::{AudioFourCC, AudioInfo};
use ndi_video::{FourCC, PixelFormat, VideoInfo};

use crate::host::{CaptureFlags, MediaHost};
use crate::sink::{Sender, SenderConfig, SinkLibrary, WireAudioFrame, WireVideoFrame};

pub struct FakeHost {
    pub video: Mutex<Option<VideoInfo>>,
    pub audio: Mutex<Option<AudioInfo>>,
    pub accept_capture: AtomicBool,
    pub begin_calls: AtomicUsize,
    pub end_calls: AtomicUsize,
    pub last_flags: Mutex<Option<CaptureFlags>>,
}

impl FakeHost {
    pub fn new(video: Option<VideoInfo>, audio: Option<AudioInfo>) -> Arc<Self> {
        Arc::new(Self {
            video: Mutex::new(video),
            audio: Mutex::new(audio),
            accept_capture: AtomicBool::new(true),
            begin_calls: AtomicUsize::new(0),
            end_calls: AtomicUsize::new(0),
            last_flags: Mutex::new(None),
        })
    }

    pub fn av(format: PixelFormat, width: u32, height: u32, frame_rate: f64) -> Arc<Self> {
        Self::new(
            Some(VideoInfo {
                format,
                width,
                height,
                frame_rate,
            }),
            Some(AudioInfo::default()),
        )
    }
}

impl MediaHost for FakeHost {
    fn video(&self) -> Option<VideoInfo> {
        *self.video.lock()
    }

    fn audio(&self) -> Option<AudioInfo> {
        *self.audio.lock()
    }

    fn begin_capture(&self, flags: CaptureFlags) -> bool {
        self.begin_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_flags.lock() = Some(flags);
        self.accept_capture.load(Ordering::SeqCst)
    }

    fn end_capture(&self) {
        self.end_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct SentVideo {
    pub sender: String,
    pub xres: u32,
    pub yres: u32,
    pub fourcc: FourCC,
    pub frame_rate_n: i32,
    pub frame_rate_d: i32,
    pub timecode: i64,
    pub line_stride: u32,
    pub data: Vec<u8>,
    pub data_ptr: usize,
}

#[derive(Debug, Clone)]
pub struct SentAudio {
    pub sample_rate: u32,
    pub channels: u32,
    pub samples: u32,
    pub channel_stride: u32,
    pub timecode: i64,
    pub fourcc: AudioFourCC,
    pub data: Vec<u8>,
}

#[derive(Default)]
pub struct SinkLog {
    pub created: AtomicUsize,
    pub destroyed: AtomicUsize,
    pub names: Mutex<Vec<String>>,
    pub videos: Mutex<Vec<SentVideo>>,
    pub audios: Mutex<Vec<SentAudio>>,
}

impl SinkLog {
    pub fn live_senders(&self) -> usize {
        self.created.load(Ordering::SeqCst) - self.destroyed.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakeSink {
    pub log: Arc<SinkLog>,
    pub fail_create: AtomicBool,
}

impl FakeSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

pub struct FakeSender {
    name: String,
    log: Arc<SinkLog>,
}

impl SinkLibrary for FakeSink {
    type Sender = FakeSender;

    fn create_sender(&self, config: &SenderConfig<'_>) -> Option<FakeSender> {
        if self.fail_create.load(Ordering::SeqCst) {
            return None;
        }

        self.log.created.fetch_add(1, Ordering::SeqCst);
        self.log.names.lock().push(config.name.to_string());
        Some(FakeSender {
            name: config.name.to_string(),
            log: self.log.clone(),
        })
    }
}

impl Sender for FakeSender {
    fn send_video_async(&self, frame: &WireVideoFrame<'_>) {
        self.log.videos.lock().push(SentVideo {
            sender: self.name.clone(),
            xres: frame.xres,
            yres: frame.yres,
            fourcc: frame.fourcc,
            frame_rate_n: frame.frame_rate_n,
            frame_rate_d: frame.frame_rate_d,
            timecode: frame.timecode,
            line_stride: frame.line_stride,
            data: frame.data.to_vec(),
            data_ptr: frame.data.as_ptr() as usize,
        });
    }

    fn send_audio(&self, frame: &WireAudioFrame<'_>) {
        self.log.audios.lock().push(SentAudio {
            sample_rate: frame.sample_rate,
            channels: frame.channels,
            samples: frame.samples,
            channel_stride: frame.channel_stride,
            timecode: frame.timecode,
            fourcc: frame.fourcc,
            data: frame.data.to_vec(),
        });
    }
}

impl Drop for FakeSender {
    fn drop(&mut self) {
        self.log.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Process-wide `log` sink. Tests share it, so each looks records up by the
/// output name it used.
struct RecordingLogger;

static LOGGER: RecordingLogger = RecordingLogger;
static RECORDS: Mutex<Vec<(Level, String)>> = const_mutex(Vec::new());
static INSTALL: Once = Once::new();

impl Log for RecordingLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        RECORDS.lock().push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

/// Start recording log output for this test binary
pub fn capture_logs() {
    INSTALL.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
}

/// Recorded messages containing `needle`
pub fn logged(needle: &str) -> Vec<(Level, String)> {
    RECORDS
        .lock()
        .iter()
        .filter(|(_, message)| message.contains(needle))
        .cloned()
        .collect()
}
