//! Host layout to wire layout conversion
//!
//! Each converter works on a half-open row range so a frame can be split
//! into bands. Rows are processed with an SSE2 kernel where available and a
//! scalar loop for the tail.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::types::{FourCC, PixelFormat};

/// Row conversion routines, one per (host layout, wire layout) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    /// Planar 4:4:4 to packed UYVY 4:2:2
    I444ToUyvy,
}

impl Converter {
    /// Row stride of the converted frame; `None` if it does not fit in a `u32`
    pub fn output_linesize(self, width: u32) -> Option<u32> {
        match self {
            Converter::I444ToUyvy => width.checked_mul(2),
        }
    }

    /// Scratch bytes to reserve for a converted frame.
    ///
    /// Twice the packed size, so a disagreeing host stride cannot run past the end.
    pub fn buffer_size(self, out_linesize: u32, height: u32) -> Option<usize> {
        match self {
            Converter::I444ToUyvy => (height as usize)
                .checked_mul(out_linesize as usize)?
                .checked_mul(2),
        }
    }

    /// Convert rows `[start_y, end_y)` of `input` into `output`
    pub fn convert(
        self,
        input: &[&[u8]],
        in_linesize: &[u32],
        start_y: u32,
        end_y: u32,
        output: &mut [u8],
        out_linesize: u32,
    ) {
        match self {
            Converter::I444ToUyvy => {
                convert_i444_to_uyvy(input, in_linesize, start_y, end_y, output, out_linesize)
            }
        }
    }
}

/// Result of matching a host layout against the wire formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireFormat {
    pub fourcc: FourCC,
    /// `None` when the host buffer can be sent as is
    pub converter: Option<Converter>,
}

/// Pick the wire format for a host layout. `None` means unsupported.
pub fn negotiate_format(format: PixelFormat) -> Option<WireFormat> {
    let (fourcc, converter) = match format {
        PixelFormat::I444 => (FourCC::UYVY, Some(Converter::I444ToUyvy)),
        PixelFormat::NV12 => (FourCC::NV12, None),
        PixelFormat::I420 => (FourCC::I420, None),
        PixelFormat::RGBA => (FourCC::RGBA, None),
        PixelFormat::BGRA => (FourCC::BGRA, None),
        PixelFormat::BGRX => (FourCC::BGRX, None),
        _ => return None,
    };

    Some(WireFormat { fourcc, converter })
}

/// Pack planar I444 into UYVY.
///
/// Every second chroma sample of each chroma plane is dropped. Rows are
/// `min(in_linesize[0], out_linesize)` source bytes wide; anything a plane or
/// the output cannot hold is truncated.
pub fn convert_i444_to_uyvy(
    input: &[&[u8]],
    in_linesize: &[u32],
    start_y: u32,
    end_y: u32,
    output: &mut [u8],
    out_linesize: u32,
) {
    let (Some(y_plane), Some(u_plane), Some(v_plane)) = (input.first(), input.get(1), input.get(2))
    else {
        return;
    };
    let (Some(&y_linesize), Some(&u_linesize), Some(&v_linesize)) =
        (in_linesize.first(), in_linesize.get(1), in_linesize.get(2))
    else {
        return;
    };

    let width = y_linesize.min(out_linesize) as usize;
    let simd = simd_available();

    for y in start_y as usize..end_y as usize {
        let (Some(y_row), Some(u_row), Some(v_row)) = (
            plane_row(y_plane, y, y_linesize as usize, width),
            plane_row(u_plane, y, u_linesize as usize, width),
            plane_row(v_plane, y, v_linesize as usize, width),
        ) else {
            break;
        };
        let Some(out_row) = plane_row_mut(output, y, out_linesize as usize) else {
            break;
        };

        convert_row_i444_to_uyvy(y_row, u_row, v_row, out_row, simd);
    }
}

fn simd_available() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        is_x86_feature_detected!("sse2")
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

fn plane_row(plane: &[u8], y: usize, linesize: usize, width: usize) -> Option<&[u8]> {
    let rest = plane.get(y.checked_mul(linesize)?..)?;
    Some(&rest[..rest.len().min(width)])
}

fn plane_row_mut(plane: &mut [u8], y: usize, linesize: usize) -> Option<&mut [u8]> {
    let rest = plane.get_mut(y.checked_mul(linesize)?..)?;
    let len = rest.len().min(linesize);
    Some(&mut rest[..len])
}

fn convert_row_i444_to_uyvy(
    y_row: &[u8],
    u_row: &[u8],
    v_row: &[u8],
    out_row: &mut [u8],
    simd: bool,
) {
    let pairs = (y_row.len() / 2)
        .min(u_row.len().div_ceil(2))
        .min(v_row.len().div_ceil(2))
        .min(out_row.len() / 4);

    // The vector kernel reads 16 chroma bytes per block, so it stops short of
    // a chroma row that ends on an odd column.
    let mut done = 0;
    #[cfg(target_arch = "x86_64")]
    if simd {
        let blocks = pairs.min(u_row.len() / 2).min(v_row.len() / 2) / 8;
        unsafe {
            convert_row_i444_to_uyvy_sse2(y_row, u_row, v_row, out_row, blocks);
        }
        done = blocks * 8;
    }
    #[cfg(not(target_arch = "x86_64"))]
    let _ = simd;

    convert_row_i444_to_uyvy_scalar(
        &y_row[done * 2..],
        &u_row[done * 2..],
        &v_row[done * 2..],
        &mut out_row[done * 4..pairs * 4],
    );
}

/// Scalar fallback implementation (portable, slower)
fn convert_row_i444_to_uyvy_scalar(y_row: &[u8], u_row: &[u8], v_row: &[u8], out_row: &mut [u8]) {
    let pixels = out_row
        .chunks_exact_mut(4)
        .zip(y_row.chunks_exact(2))
        .zip(u_row.iter().step_by(2))
        .zip(v_row.iter().step_by(2));

    for (((out, luma), &u), &v) in pixels {
        // Quality loss here: odd chroma columns are skipped.
        out[0] = u;
        out[1] = luma[0];
        out[2] = v;
        out[3] = luma[1];
    }
}

/// Pack `blocks` runs of 16 pixels with SSE2.
///
/// # Safety
/// Requires SSE2. `y_row`, `u_row` and `v_row` must hold at least
/// `blocks * 16` bytes and `out_row` at least `blocks * 32`.
#[target_feature(enable = "sse2")]
#[cfg(target_arch = "x86_64")]
unsafe fn convert_row_i444_to_uyvy_sse2(
    y_row: &[u8],
    u_row: &[u8],
    v_row: &[u8],
    out_row: &mut [u8],
    blocks: usize,
) {
    debug_assert!(y_row.len() >= blocks * 16);
    debug_assert!(u_row.len() >= blocks * 16);
    debug_assert!(v_row.len() >= blocks * 16);
    debug_assert!(out_row.len() >= blocks * 32);

    let even_mask = _mm_set1_epi16(0x00FF);
    let zero = _mm_setzero_si128();

    for block in 0..blocks {
        let x = block * 16;

        let luma = _mm_loadu_si128(y_row.as_ptr().add(x) as *const __m128i);
        let u = _mm_loadu_si128(u_row.as_ptr().add(x) as *const __m128i);
        let v = _mm_loadu_si128(v_row.as_ptr().add(x) as *const __m128i);

        // U0 U2 U4 ... U14 in the low 8 bytes
        let u_even = _mm_packus_epi16(_mm_and_si128(u, even_mask), zero);
        let v_even = _mm_packus_epi16(_mm_and_si128(v, even_mask), zero);

        // U0 V0 U2 V2 ...
        let chroma = _mm_unpacklo_epi8(u_even, v_even);

        // U0 Y0 V0 Y1 U2 Y2 V2 Y3 ...
        let lo = _mm_unpacklo_epi8(chroma, luma);
        let hi = _mm_unpackhi_epi8(chroma, luma);

        let out = out_row.as_mut_ptr().add(x * 2);
        _mm_storeu_si128(out as *mut __m128i, lo);
        _mm_storeu_si128(out.add(16) as *mut __m128i, hi);
    }
}
