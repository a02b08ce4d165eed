//! NDI FFI - C Foreign Function Interface
//!
//! The entry points the plugin's C glue registers as the host's output
//! function table. Settings and property sheets cross the boundary as JSON.

use std::ffi::{CStr, CString};
use std::ptr;
use std::slice;
use std::sync::Arc;

use libc::c_char;

use ndi_output::{
    AudioData, NdiOutput, OutputPlugin, OutputSettings, VideoData, MAX_AV_PLANES,
};

mod host_ffi;
pub mod logger;
pub use host_ffi::*;

type FfiOutput = NdiOutput<CHost, CSink>;

/// Opaque handle to an output instance (C-compatible)
pub struct NDIOutput {
    _private: [u8; 0],
}

/// Opaque handle to the loaded NDI library (C-compatible)
pub struct NDISinkLibrary {
    _private: [u8; 0],
}

/// C-compatible raw video frame as pushed by the host
#[repr(C)]
pub struct CVideoData {
    pub data: [*const u8; MAX_AV_PLANES],
    pub linesize: [u32; MAX_AV_PLANES],
    pub timestamp: u64,
}

/// C-compatible raw audio block: one float plane per channel
#[repr(C)]
pub struct CAudioData {
    pub data: [*const f32; MAX_AV_PLANES],
    pub frames: u32,
    pub timestamp: u64,
}

fn into_c_string(text: String) -> *mut c_char {
    CString::new(text).map_or(ptr::null_mut(), CString::into_raw)
}

/// Read the host's settings blob; null or malformed input falls back to defaults
unsafe fn parse_settings(json: *const c_char) -> OutputSettings {
    if json.is_null() {
        return FfiOutput::defaults();
    }

    let parsed = CStr::from_ptr(json)
        .to_str()
        .map_err(|err| err.to_string())
        .and_then(|text| OutputSettings::from_json(text).map_err(|err| err.to_string()));

    match parsed {
        Ok(settings) => settings,
        Err(err) => {
            log::warn!("invalid output settings, using defaults: {}", err);
            FfiOutput::defaults()
        }
    }
}

// ============================================================================
// LOGGING
// ============================================================================

/// Forward log records to the host
///
/// # Safety
/// `callback` must stay callable for the life of the process.
#[no_mangle]
pub unsafe extern "C" fn ndi_rust_log_init(callback: logger::CLogCallback) -> bool {
    logger::init(callback)
}

// ============================================================================
// SINK LIBRARY API
// ============================================================================

/// Wrap the loaded NDI library's function table
///
/// # Safety
/// `callbacks` must be valid; the functions it names must outlive the handle.
#[no_mangle]
pub unsafe extern "C" fn ndi_sink_library_create(
    callbacks: *const CSinkCallbacks,
) -> *mut NDISinkLibrary {
    if callbacks.is_null() {
        return ptr::null_mut();
    }

    let sink = Arc::new(CSink::new(*callbacks));
    Arc::into_raw(sink) as *mut NDISinkLibrary
}

/// Release the caller's reference to the library handle
///
/// Outputs created from it hold their own reference.
///
/// # Safety
/// Caller must ensure ptr is valid and not already released.
#[no_mangle]
pub unsafe extern "C" fn ndi_sink_library_destroy(ptr: *mut NDISinkLibrary) {
    if !ptr.is_null() {
        drop(Arc::from_raw(ptr as *const CSink));
    }
}

// ============================================================================
// OUTPUT INFO
// ============================================================================

/// Registration id
#[no_mangle]
pub extern "C" fn ndi_output_get_id() -> *const c_char {
    "ndi_output\0".as_ptr() as *const c_char
}

/// Display name
#[no_mangle]
pub extern "C" fn ndi_output_get_name() -> *const c_char {
    "NDI Output\0".as_ptr() as *const c_char
}

/// Stream flags (`CaptureFlags` bits)
#[no_mangle]
pub extern "C" fn ndi_output_get_flags() -> u32 {
    <FfiOutput as OutputPlugin>::FLAGS.bits()
}

/// Property sheet as JSON; free with `ndi_rust_string_free`
#[no_mangle]
pub extern "C" fn ndi_output_get_properties() -> *mut c_char {
    into_c_string(FfiOutput::properties().to_json())
}

/// Default settings as JSON; free with `ndi_rust_string_free`
#[no_mangle]
pub extern "C" fn ndi_output_get_defaults() -> *mut c_char {
    into_c_string(FfiOutput::defaults().to_json())
}

/// Free a string returned by this library
///
/// # Safety
/// `text` must come from this library and not be freed twice.
#[no_mangle]
pub unsafe extern "C" fn ndi_rust_string_free(text: *mut c_char) {
    if !text.is_null() {
        drop(CString::from_raw(text));
    }
}

// ============================================================================
// OUTPUT LIFECYCLE
// ============================================================================

/// Create an idle output
///
/// # Safety
/// `host` and `sink` must be valid; `settings_json` may be null.
#[no_mangle]
pub unsafe extern "C" fn ndi_output_create(
    settings_json: *const c_char,
    host: *const CHostCallbacks,
    sink: *const NDISinkLibrary,
) -> *mut NDIOutput {
    if host.is_null() || sink.is_null() {
        return ptr::null_mut();
    }

    // Take a reference of our own; the caller keeps theirs
    let sink_ptr = sink as *const CSink;
    Arc::increment_strong_count(sink_ptr);
    let sink = Arc::from_raw(sink_ptr);

    let output = FfiOutput::create(parse_settings(settings_json), CHost::new(*host), sink);
    Box::into_raw(Box::new(output)) as *mut NDIOutput
}

/// Replace settings for the next start
///
/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn ndi_output_update(ptr: *mut NDIOutput, settings_json: *const c_char) {
    if ptr.is_null() {
        return;
    }

    let output = &*(ptr as *const FfiOutput);
    OutputPlugin::update(output, parse_settings(settings_json));
}

/// Start capturing
///
/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn ndi_output_start(ptr: *mut NDIOutput) -> bool {
    if ptr.is_null() {
        return false;
    }

    let output = &*(ptr as *const FfiOutput);
    OutputPlugin::start(output)
}

/// Stop capturing
///
/// # Safety
/// Caller must ensure ptr is valid.
#[no_mangle]
pub unsafe extern "C" fn ndi_output_stop(ptr: *mut NDIOutput, timestamp: u64) {
    if ptr.is_null() {
        return;
    }

    let output = &*(ptr as *const FfiOutput);
    OutputPlugin::stop(output, timestamp);
}

/// Destroy an output
///
/// # Safety
/// Caller must ensure ptr is valid, not already freed, and that no frame
/// callback is still running.
#[no_mangle]
pub unsafe extern "C" fn ndi_output_destroy(ptr: *mut NDIOutput) {
    if !ptr.is_null() {
        let output = Box::from_raw(ptr as *mut FfiOutput);
        OutputPlugin::destroy(*output);
    }
}

// ============================================================================
// FRAME CALLBACKS
// ============================================================================

/// Push one raw video frame
///
/// # Safety
/// `ptr` must be valid. Each non-null plane in `frame` must hold
/// `linesize * rows` bytes for the negotiated layout and height.
#[no_mangle]
pub unsafe extern "C" fn ndi_output_raw_video(ptr: *mut NDIOutput, frame: *const CVideoData) {
    if ptr.is_null() || frame.is_null() {
        return;
    }

    let output = &*(ptr as *const FfiOutput);
    let frame = &*frame;

    // Plane sizes come from the negotiated geometry; no geometry, no frame
    let Some(video) = output.try_video_descriptor() else {
        return;
    };

    let mut planes: [&[u8]; MAX_AV_PLANES] = [&[]; MAX_AV_PLANES];
    let mut count = 0;
    for plane in 0..video.format.plane_count().min(MAX_AV_PLANES) {
        let data = frame.data[plane];
        if data.is_null() {
            break;
        }

        let rows = video.format.plane_height(plane, video.height) as usize;
        planes[plane] = slice::from_raw_parts(data, frame.linesize[plane] as usize * rows);
        count = plane + 1;
    }

    OutputPlugin::raw_video(
        output,
        &VideoData::new(&planes[..count], &frame.linesize[..count], frame.timestamp),
    );
}

/// Push one block of planar float audio
///
/// # Safety
/// `ptr` must be valid. Each non-null plane in `frame` must hold `frames` samples.
#[no_mangle]
pub unsafe extern "C" fn ndi_output_raw_audio(ptr: *mut NDIOutput, frame: *const CAudioData) {
    if ptr.is_null() || frame.is_null() {
        return;
    }

    let output = &*(ptr as *const FfiOutput);
    let frame = &*frame;

    let mut planes: [&[f32]; MAX_AV_PLANES] = [&[]; MAX_AV_PLANES];
    let mut count = 0;
    for (plane, &data) in frame.data.iter().enumerate() {
        if data.is_null() {
            break;
        }
        planes[plane] = slice::from_raw_parts(data, frame.frames as usize);
        count = plane + 1;
    }

    OutputPlugin::raw_audio(
        output,
        &AudioData::new(&planes[..count], frame.frames, frame.timestamp),
    );
}

// ============================================================================
// UTILITY FUNCTIONS
// ============================================================================

/// Get library version string
#[no_mangle]
pub extern "C" fn ndi_rust_version() -> *const c_char {
    "0.1.0\0".as_ptr() as *const c_char
}
