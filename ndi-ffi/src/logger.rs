//! Route `log` records into the host's log

use std::ffi::CString;
use std::sync::OnceLock;

use libc::{c_char, c_int};
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Host log sink: level in host units, NUL-terminated message
pub type CLogCallback = unsafe extern "C" fn(c_int, *const c_char);

// Host log levels
pub const HOST_LOG_ERROR: c_int = 100;
pub const HOST_LOG_WARNING: c_int = 200;
pub const HOST_LOG_INFO: c_int = 300;
pub const HOST_LOG_DEBUG: c_int = 400;

static CALLBACK: OnceLock<CLogCallback> = OnceLock::new();
static LOGGER: HostLogger = HostLogger;

struct HostLogger;

pub fn host_level(level: Level) -> c_int {
    match level {
        Level::Error => HOST_LOG_ERROR,
        Level::Warn => HOST_LOG_WARNING,
        Level::Info => HOST_LOG_INFO,
        Level::Debug | Level::Trace => HOST_LOG_DEBUG,
    }
}

/// Host-side message text
pub fn format_record(record: &Record<'_>) -> String {
    format!("[obs-ndi] {}", record.args())
}

impl Log for HostLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record<'_>) {
        let Some(callback) = CALLBACK.get() else {
            return;
        };
        if !self.enabled(record.metadata()) {
            return;
        }

        // Interior NULs would truncate the message on the C side anyway
        let text = format_record(record).replace('\0', " ");
        if let Ok(message) = CString::new(text) {
            unsafe { callback(host_level(record.level()), message.as_ptr()) }
        }
    }

    fn flush(&self) {}
}

/// Install the host logger. Only the first call has any effect.
pub fn init(callback: CLogCallback) -> bool {
    if CALLBACK.set(callback).is_err() {
        return false;
    }

    log::set_max_level(LevelFilter::Debug);
    log::set_logger(&LOGGER).is_ok()
}
