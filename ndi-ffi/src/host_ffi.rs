//! C function tables for the host pipeline and the NDI library
//!
//! The plugin's C side fills these in; the adapters below turn them into the
//! `MediaHost` and `SinkLibrary` traits.

use std::ffi::CString;
use std::ptr::{self, NonNull};

use libc::{c_char, c_void};

use ndi_output::{
    AudioInfo, CaptureFlags, MediaHost, PixelFormat, Sender, SenderConfig, SinkLibrary,
    VideoInfo, WireAudioFrame, WireVideoFrame,
};

/// C-compatible video format
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct CVideoInfo {
    pub format: u32,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

/// C-compatible audio format
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct CAudioInfo {
    pub sample_rate: u32,
    pub channels: u32,
}

/// Host pipeline callbacks. Each returns `false` (or does nothing) when the
/// source is missing.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CHostCallbacks {
    pub data: *mut c_void,
    pub video_format: Option<unsafe extern "C" fn(*mut c_void, *mut CVideoInfo) -> bool>,
    pub audio_format: Option<unsafe extern "C" fn(*mut c_void, *mut CAudioInfo) -> bool>,
    pub begin_capture: Option<unsafe extern "C" fn(*mut c_void, u32) -> bool>,
    pub end_capture: Option<unsafe extern "C" fn(*mut c_void)>,
}

/// C-compatible sender creation parameters
#[repr(C)]
pub struct CSenderCreate {
    pub name: *const c_char,
    pub groups: *const c_char,
    pub clock_video: bool,
    pub clock_audio: bool,
}

/// C-compatible wire video frame
#[repr(C)]
pub struct CVideoFrame {
    pub xres: u32,
    pub yres: u32,
    pub fourcc: u32,
    pub frame_rate_n: i32,
    pub frame_rate_d: i32,
    pub picture_aspect_ratio: f32,
    pub frame_format: u32,
    pub timecode: i64,
    pub data: *const u8,
    pub line_stride: u32,
    pub metadata: *const c_char,
}

/// C-compatible wire audio frame
#[repr(C)]
pub struct CAudioFrame {
    pub sample_rate: u32,
    pub channels: u32,
    pub samples: u32,
    pub timecode: i64,
    pub fourcc: u32,
    pub data: *const u8,
    pub channel_stride: u32,
    pub metadata: *const c_char,
}

/// NDI library callbacks. `create_sender` returns null on failure.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CSinkCallbacks {
    pub data: *mut c_void,
    pub create_sender: Option<unsafe extern "C" fn(*mut c_void, *const CSenderCreate) -> *mut c_void>,
    pub destroy_sender: Option<unsafe extern "C" fn(*mut c_void, *mut c_void)>,
    pub send_video_async:
        Option<unsafe extern "C" fn(*mut c_void, *mut c_void, *const CVideoFrame)>,
    pub send_audio: Option<unsafe extern "C" fn(*mut c_void, *mut c_void, *const CAudioFrame)>,
}

/// `MediaHost` backed by C callbacks
pub struct CHost {
    callbacks: CHostCallbacks,
}

// The host promises its callbacks may be called from any of its threads.
unsafe impl Send for CHost {}
unsafe impl Sync for CHost {}

impl CHost {
    pub fn new(callbacks: CHostCallbacks) -> Self {
        Self { callbacks }
    }
}

impl MediaHost for CHost {
    fn video(&self) -> Option<VideoInfo> {
        let query = self.callbacks.video_format?;
        let mut info = CVideoInfo::default();
        if !unsafe { query(self.callbacks.data, &mut info) } {
            return None;
        }

        Some(VideoInfo {
            format: PixelFormat::from_raw(info.format),
            width: info.width,
            height: info.height,
            frame_rate: info.frame_rate,
        })
    }

    fn audio(&self) -> Option<AudioInfo> {
        let query = self.callbacks.audio_format?;
        let mut info = CAudioInfo::default();
        if !unsafe { query(self.callbacks.data, &mut info) } {
            return None;
        }

        Some(AudioInfo {
            sample_rate: info.sample_rate,
            channels: info.channels as usize,
        })
    }

    fn begin_capture(&self, flags: CaptureFlags) -> bool {
        match self.callbacks.begin_capture {
            Some(begin) => unsafe { begin(self.callbacks.data, flags.bits()) },
            None => false,
        }
    }

    fn end_capture(&self) {
        if let Some(end) = self.callbacks.end_capture {
            unsafe { end(self.callbacks.data) }
        }
    }
}

/// `SinkLibrary` backed by C callbacks; loaded once and shared by all outputs
pub struct CSink {
    callbacks: CSinkCallbacks,
}

unsafe impl Send for CSink {}
unsafe impl Sync for CSink {}

impl CSink {
    pub fn new(callbacks: CSinkCallbacks) -> Self {
        Self { callbacks }
    }
}

impl SinkLibrary for CSink {
    type Sender = CSender;

    fn create_sender(&self, config: &SenderConfig<'_>) -> Option<CSender> {
        let create = self.callbacks.create_sender?;

        // A name with an interior NUL cannot cross the boundary
        let name = CString::new(config.name).ok()?;
        let groups = match config.groups {
            Some(groups) => Some(CString::new(groups).ok()?),
            None => None,
        };

        let desc = CSenderCreate {
            name: name.as_ptr(),
            groups: groups.as_ref().map_or(ptr::null(), |g| g.as_ptr()),
            clock_video: config.clock_video,
            clock_audio: config.clock_audio,
        };

        let handle = NonNull::new(unsafe { create(self.callbacks.data, &desc) })?;
        Some(CSender {
            handle,
            callbacks: self.callbacks,
        })
    }
}

/// An NDI sender instance; destroyed on drop
pub struct CSender {
    handle: NonNull<c_void>,
    callbacks: CSinkCallbacks,
}

unsafe impl Send for CSender {}
unsafe impl Sync for CSender {}

impl Sender for CSender {
    fn send_video_async(&self, frame: &WireVideoFrame<'_>) {
        let Some(send) = self.callbacks.send_video_async else {
            return;
        };

        let c_frame = CVideoFrame {
            xres: frame.xres,
            yres: frame.yres,
            fourcc: frame.fourcc as u32,
            frame_rate_n: frame.frame_rate_n,
            frame_rate_d: frame.frame_rate_d,
            picture_aspect_ratio: frame.picture_aspect_ratio,
            frame_format: frame.frame_format as u32,
            timecode: frame.timecode,
            data: frame.data.as_ptr(),
            line_stride: frame.line_stride,
            metadata: ptr::null(),
        };

        unsafe { send(self.callbacks.data, self.handle.as_ptr(), &c_frame) }
    }

    fn send_audio(&self, frame: &WireAudioFrame<'_>) {
        let Some(send) = self.callbacks.send_audio else {
            return;
        };

        let c_frame = CAudioFrame {
            sample_rate: frame.sample_rate,
            channels: frame.channels,
            samples: frame.samples,
            timecode: frame.timecode,
            fourcc: frame.fourcc as u32,
            data: frame.data.as_ptr(),
            channel_stride: frame.channel_stride,
            metadata: ptr::null(),
        };

        unsafe { send(self.callbacks.data, self.handle.as_ptr(), &c_frame) }
    }
}

impl Drop for CSender {
    fn drop(&mut self) {
        if let Some(destroy) = self.callbacks.destroy_sender {
            unsafe { destroy(self.callbacks.data, self.handle.as_ptr()) }
        }
    }
}
