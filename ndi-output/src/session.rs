//! Output lifecycle: idle, configuring, capturing
//!
//! Format is locked in at `start` and released at `stop`. Frame callbacks
//! (see `dispatch`) only touch the negotiated state after observing
//! `Capturing`, and `stop` leaves `Capturing` before it releases anything.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use ndi_audio::{AudioInfo, AudioScratch};
use ndi_video::{negotiate_format, Converter, FourCC, PixelFormat, ScratchBuffer, VideoInfo};

use crate::error::OutputError;
use crate::host::{CaptureFlags, MediaHost};
use crate::settings::OutputSettings;
use crate::sink::{frame_rate_numerator, SenderConfig, SinkLibrary, FRAME_RATE_DENOMINATOR};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    Idle = 0,
    /// Inside `start`, between the idle check and the host accepting capture
    Configuring = 1,
    Capturing = 2,
}

impl OutputState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => OutputState::Configuring,
            2 => OutputState::Capturing,
            _ => OutputState::Idle,
        }
    }
}

/// Video format fixed for the current capture cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoDescriptor {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub frame_rate_n: i32,
    pub frame_rate_d: i32,
    pub fourcc: FourCC,
    /// Row stride of converted frames; `None` for pass-through layouts
    pub conversion_linesize: Option<u32>,
}

pub(crate) struct Conversion {
    pub(crate) converter: Converter,
    pub(crate) linesize: u32,
    pub(crate) buffer: ScratchBuffer,
}

pub(crate) struct VideoPath {
    pub(crate) descriptor: VideoDescriptor,
    /// Present exactly when the layout needs converting
    pub(crate) conversion: Option<Conversion>,
}

impl Conversion {
    /// Size the scratch buffer for one converted frame. `None` if the frame is
    /// too large to address.
    fn allocate(converter: Converter, width: u32, height: u32) -> Option<Self> {
        let linesize = converter.output_linesize(width)?;
        let buffer = ScratchBuffer::new(converter.buffer_size(linesize, height)?)?;

        Some(Self {
            converter,
            linesize,
            buffer,
        })
    }
}

impl VideoPath {
    /// A converting layout whose frame cannot be addressed counts as unsupported.
    fn negotiate(info: VideoInfo) -> Result<Self, OutputError> {
        let unsupported = OutputError::UnsupportedFormat(info.format);
        let wire = negotiate_format(info.format).ok_or(unsupported)?;

        let conversion = match wire.converter {
            Some(converter) => {
                Some(Conversion::allocate(converter, info.width, info.height).ok_or(unsupported)?)
            }
            None => None,
        };

        Ok(Self {
            descriptor: VideoDescriptor {
                format: info.format,
                width: info.width,
                height: info.height,
                frame_rate: info.frame_rate,
                frame_rate_n: frame_rate_numerator(info.frame_rate),
                frame_rate_d: FRAME_RATE_DENOMINATOR,
                fourcc: wire.fourcc,
                conversion_linesize: conversion.as_ref().map(|c| c.linesize),
            },
            conversion,
        })
    }
}

/// Audio state. The scratch buffer outlives capture cycles and is only
/// released with the output itself.
#[derive(Default)]
pub(crate) struct AudioPath {
    pub(crate) negotiated: Option<AudioInfo>,
    pub(crate) scratch: AudioScratch,
}

/// One NDI output instance, driven by the host
pub struct NdiOutput<H: MediaHost, L: SinkLibrary> {
    pub(crate) host: H,
    pub(crate) sink: Arc<L>,
    pub(crate) settings: Mutex<OutputSettings>,
    pub(crate) state: AtomicU8,
    pub(crate) sender: RwLock<Option<L::Sender>>,
    pub(crate) video: Mutex<Option<VideoPath>>,
    pub(crate) audio: Mutex<AudioPath>,
}

impl<H: MediaHost, L: SinkLibrary> NdiOutput<H, L> {
    /// Create an idle output
    pub fn new(settings: OutputSettings, host: H, sink: Arc<L>) -> Self {
        log::info!("+ndi_output_create('{}'...)", settings.name);
        let output = Self {
            host,
            sink,
            settings: Mutex::new(settings),
            state: AtomicU8::new(OutputState::Idle as u8),
            sender: RwLock::new(None),
            video: Mutex::new(None),
            audio: Mutex::new(AudioPath::default()),
        };
        log::info!("-ndi_output_create(...)");
        output
    }

    pub fn state(&self) -> OutputState {
        OutputState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_capturing(&self) -> bool {
        self.state() == OutputState::Capturing
    }

    pub fn settings(&self) -> OutputSettings {
        self.settings.lock().clone()
    }

    pub fn has_sender(&self) -> bool {
        self.sender.read().is_some()
    }

    /// Video format locked in by the last successful start
    pub fn video_descriptor(&self) -> Option<VideoDescriptor> {
        self.video.lock().as_ref().map(|video| video.descriptor)
    }

    /// Like `video_descriptor`, but gives up instead of waiting on a lifecycle call
    pub fn try_video_descriptor(&self) -> Option<VideoDescriptor> {
        self.video.try_lock()?.as_ref().map(|video| video.descriptor)
    }

    pub fn audio_info(&self) -> Option<AudioInfo> {
        self.audio.lock().negotiated
    }

    /// Size of the video conversion buffer, if one is allocated
    pub fn video_scratch_len(&self) -> Option<usize> {
        self.video
            .lock()
            .as_ref()?
            .conversion
            .as_ref()
            .map(|conversion| conversion.buffer.len())
    }

    pub fn audio_scratch_capacity(&self) -> usize {
        self.audio.lock().scratch.capacity()
    }

    pub fn audio_scratch_reallocations(&self) -> u64 {
        self.audio.lock().scratch.reallocations()
    }

    /// Replace the settings used by the next `start`.
    ///
    /// A running capture keeps the name and format it started with.
    pub fn update(&self, settings: OutputSettings) {
        log::info!("ndi_output_update('{}'...)", settings.name);
        *self.settings.lock() = settings;
    }

    /// Start capturing; `false` on any failure, which is logged
    pub fn start(&self) -> bool {
        self.try_start().is_ok()
    }

    /// Negotiate formats, open the sender and ask the host for frames.
    ///
    /// All or nothing: on error the output is idle with no sender, no
    /// conversion buffer and no negotiated formats.
    pub fn try_start(&self) -> Result<(), OutputError> {
        let settings = self.settings();
        log::info!("+ndi_output_start('{}'...)", settings.name);

        let result = self.claim_and_configure(&settings);
        match &result {
            Ok(()) => log::info!("'{}': ndi output started", settings.name),
            Err(err) => log::log!(
                err.log_level(),
                "'{}': start failed ({:?}): {}",
                settings.name,
                err,
                err
            ),
        }

        log::info!("-ndi_output_start(...)");
        result
    }

    fn claim_and_configure(&self, settings: &OutputSettings) -> Result<(), OutputError> {
        self.state
            .compare_exchange(
                OutputState::Idle as u8,
                OutputState::Configuring as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| OutputError::AlreadyStarted)?;

        match self.configure(settings) {
            Ok(()) => {
                self.state
                    .store(OutputState::Capturing as u8, Ordering::Release);
                Ok(())
            }
            Err(err) => {
                self.release();
                self.state.store(OutputState::Idle as u8, Ordering::Release);
                Err(err)
            }
        }
    }

    fn configure(&self, settings: &OutputSettings) -> Result<(), OutputError> {
        let video = self.host.video();
        let audio = self.host.audio();

        if video.is_none() && audio.is_none() {
            return Err(OutputError::NoMedia);
        }

        let mut flags = CaptureFlags::default();

        let video = match video.filter(|_| settings.uses_video) {
            Some(info) => {
                let path = VideoPath::negotiate(info)?;
                flags.video = true;
                Some(path)
            }
            None => None,
        };

        let audio = audio.filter(|_| settings.uses_audio);
        flags.audio = audio.is_some();

        if flags.is_empty() {
            log::warn!("'{}': video and audio both disabled, capturing nothing", settings.name);
        }

        let sender = self
            .sink
            .create_sender(&SenderConfig::new(&settings.name))
            .ok_or(OutputError::SinkInitFailed)?;

        *self.video.lock() = video;
        self.audio.lock().negotiated = audio;
        *self.sender.write() = Some(sender);

        if !self.host.begin_capture(flags) {
            return Err(OutputError::CaptureStartFailed);
        }

        Ok(())
    }

    /// Drop the sender and everything negotiated. The audio scratch buffer stays.
    fn release(&self) {
        let name = self.settings.lock().name.clone();

        if let Some(sender) = self.sender.write().take() {
            log::info!("+destroying sender '{}'", name);
            drop(sender);
            log::info!("-destroying sender '{}'", name);
        }

        *self.video.lock() = None;
        self.audio.lock().negotiated = None;
    }

    /// Stop capturing. Does nothing unless capturing.
    ///
    /// `_timestamp` is the host's requested stop time; the output stops
    /// immediately.
    pub fn stop(&self, _timestamp: u64) {
        log::info!("+ndi_output_stop('{}'...)", self.settings.lock().name);

        // Leave Capturing first so frame callbacks bail out before anything
        // they could be reading goes away.
        let stopped = self
            .state
            .compare_exchange(
                OutputState::Capturing as u8,
                OutputState::Idle as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();

        if stopped {
            self.host.end_capture();
            self.release();
        }

        log::info!("-ndi_output_stop(...)");
    }

    /// Tear the output down, releasing the audio scratch buffer
    pub fn destroy(self) {
        let name = self.settings.lock().name.clone();
        log::info!("+ndi_output_destroy('{}'...)", name);

        if self.is_capturing() {
            log::warn!("'{}': destroyed while capturing, stopping first", name);
            self.stop(0);
        }

        drop(self);
        log::info!("-ndi_output_destroy(...)");
    }
}
