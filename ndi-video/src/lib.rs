//! NDI Video - frame layout and conversion
//!
//! Prepares host video frames for the NDI wire.
//!
//! Key points:
//! - Table from host pixel layout to wire FourCC
//! - SSE2 row kernel for I444 to UYVY packing, scalar fallback
//! - Zero-copy pass-through for layouts the wire accepts natively
//! - Aligned scratch memory owned by the caller

pub mod format_conversion;
pub mod scratch;
pub mod types;

pub use format_conversion::*;
pub use scratch::*;
pub use types::*;
