//! NDI Audio - planar float repacking
//!
//! Gathers the host's per-channel float buffers into the single planar
//! block the NDI wire expects.
//!
//! Key features:
//! - Grow-only scratch buffer, no allocation in the steady state
//! - Bounds-checked copies; malformed frames are rejected, not truncated

pub mod repack;
pub mod types;

pub use repack::*;
pub use types::*;
