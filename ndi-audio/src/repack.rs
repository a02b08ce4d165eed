//! Planar audio repacking
//!
//! The host hands over one buffer per channel. The wire wants every channel
//! back to back in a single block, so each frame is copied into a scratch
//! buffer that only ever grows.

use crate::types::{AudioData, SAMPLE_SIZE};

/// Reusable sample buffer for repacked audio.
///
/// Capacity grows to the largest block seen and never shrinks. Contents are
/// not preserved across a grow.
#[derive(Debug, Default)]
pub struct AudioScratch {
    samples: Vec<f32>,
    reallocations: u64,
}

impl AudioScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current capacity in bytes
    pub fn capacity(&self) -> usize {
        self.samples.len() * SAMPLE_SIZE
    }

    /// Number of times the buffer had to be replaced by a larger one
    pub fn reallocations(&self) -> u64 {
        self.reallocations
    }

    /// Make room for `required_bytes` and return that many bytes worth of samples
    pub fn ensure(&mut self, required_bytes: usize) -> &mut [f32] {
        if required_bytes > self.capacity() {
            self.samples = vec![0.0; required_bytes.div_ceil(SAMPLE_SIZE)];
            self.reallocations += 1;
        }

        &mut self.samples[..required_bytes / SAMPLE_SIZE]
    }
}

/// Copy `channels` planes of `frame` into `scratch`, channel after channel.
///
/// Returns the packed bytes, or `None` when the frame carries fewer planes
/// than `channels` or a plane shorter than the frame count. A rejected frame
/// leaves the scratch buffer untouched.
pub fn repack_planar<'s>(
    frame: &AudioData<'_>,
    channels: usize,
    scratch: &'s mut AudioScratch,
) -> Option<&'s [u8]> {
    let frames = frame.frames as usize;
    let planes = frame.planes.get(..channels)?;
    if planes.iter().any(|plane| plane.len() < frames) {
        return None;
    }

    let packed = scratch.ensure(channels * frame.channel_stride());
    if frames > 0 {
        for (block, plane) in packed.chunks_exact_mut(frames).zip(planes) {
            block.copy_from_slice(&plane[..frames]);
        }
    }

    Some(bytemuck::cast_slice(packed))
}
