//! NDI Output - host frames to an NDI sender
//!
//! Takes raw video and audio from the host pipeline at capture rate and
//! hands them to the sender in wire layout, without pacing of its own.
//!
//! Key pieces:
//! - Lifecycle state machine (idle, configuring, capturing) with an atomic state word
//! - Start-time format negotiation and scratch buffer sizing
//! - Frame callbacks that never wait on a lifecycle call
//! - Host and sink behind traits so either side can be swapped out

mod dispatch;
pub mod error;
pub mod host;
pub mod plugin;
pub mod session;
pub mod settings;
pub mod sink;

#[cfg(test)]
mod test_support;

pub use error::*;
pub use host::*;
pub use plugin::*;
pub use session::*;
pub use settings::*;
pub use sink::*;

pub use ndi_audio::{AudioData, AudioFourCC, AudioInfo};
pub use ndi_video::{FourCC, PixelFormat, VideoData, VideoInfo, MAX_AV_PLANES};
