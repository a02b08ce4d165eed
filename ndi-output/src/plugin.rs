//! The host's output vtable as a trait

use std::sync::Arc;

use ndi_audio::AudioData;
use ndi_video::VideoData;

use crate::host::{CaptureFlags, MediaHost};
use crate::session::NdiOutput;
use crate::settings::{OutputSettings, Properties};
use crate::sink::SinkLibrary;

/// Everything the host can call on an output type
pub trait OutputPlugin: Sized + Send + Sync {
    type Host: MediaHost;
    type Sink: SinkLibrary;

    /// Registration id
    const ID: &'static str;

    /// Streams the output type can carry
    const FLAGS: CaptureFlags;

    fn name() -> &'static str;
    fn properties() -> Properties;
    fn defaults() -> OutputSettings;

    fn create(settings: OutputSettings, host: Self::Host, sink: Arc<Self::Sink>) -> Self;
    fn start(&self) -> bool;
    fn update(&self, settings: OutputSettings);
    fn stop(&self, timestamp: u64);
    fn destroy(self);

    fn raw_video(&self, frame: &VideoData<'_>);
    fn raw_audio(&self, frame: &AudioData<'_>);
}

impl<H: MediaHost, L: SinkLibrary> OutputPlugin for NdiOutput<H, L> {
    type Host = H;
    type Sink = L;

    const ID: &'static str = "ndi_output";
    const FLAGS: CaptureFlags = CaptureFlags {
        video: true,
        audio: true,
    };

    fn name() -> &'static str {
        "NDI Output"
    }

    fn properties() -> Properties {
        Properties::output()
    }

    fn defaults() -> OutputSettings {
        OutputSettings::default()
    }

    fn create(settings: OutputSettings, host: H, sink: Arc<L>) -> Self {
        NdiOutput::new(settings, host, sink)
    }

    fn start(&self) -> bool {
        NdiOutput::start(self)
    }

    fn update(&self, settings: OutputSettings) {
        NdiOutput::update(self, settings)
    }

    fn stop(&self, timestamp: u64) {
        NdiOutput::stop(self, timestamp)
    }

    fn destroy(self) {
        NdiOutput::destroy(self)
    }

    fn raw_video(&self, frame: &VideoData<'_>) {
        NdiOutput::raw_video(self, frame)
    }

    fn raw_audio(&self, frame: &AudioData<'_>) {
        NdiOutput::raw_audio(self, frame)
    }
}
