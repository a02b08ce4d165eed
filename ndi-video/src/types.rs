//! Video data types and constants

/// Maximum number of planes a host frame can carry
pub const MAX_AV_PLANES: usize = 8;

/// Host pixel layout
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    None = 0,
    I420 = 1,  // Planar YUV 4:2:0
    NV12 = 2,  // Semi-planar YUV 4:2:0 (Y plane, interleaved UV)
    YVYU = 3,  // Packed YUV 4:2:2
    YUY2 = 4,  // Packed YUV 4:2:2
    UYVY = 5,  // Packed YUV 4:2:2
    RGBA = 6,  // Packed RGB
    BGRA = 7,  // Packed BGR
    BGRX = 8,  // Packed BGR (no alpha)
    Y800 = 9,  // Grayscale
    I444 = 10, // Planar YUV 4:4:4
    BGR3 = 11, // Packed BGR 24-bit
    I422 = 12, // Planar YUV 4:2:2
    I40A = 13, // Planar YUVA 4:2:0
    I42A = 14, // Planar YUVA 4:2:2
    YUVA = 15, // Planar YUVA 4:4:4
    AYUV = 16, // Packed YUVA 4:4:4
    I010 = 17, // Planar YUV 4:2:0 10-bit
    P010 = 18, // Semi-planar YUV 4:2:0 10-bit
    I210 = 19, // Planar YUV 4:2:2 10-bit
    I412 = 20, // Planar YUV 4:4:4 12-bit
    YA2L = 21, // Planar YUVA 4:4:4 12-bit
    P216 = 22, // Semi-planar YUV 4:2:2 16-bit
    P416 = 23, // Semi-planar YUV 4:4:4 16-bit
    V210 = 24, // Packed YUV 4:2:2 10-bit
    R10L = 25, // Packed RGB 10-bit
}

impl PixelFormat {
    /// Every layout the host can report, in discriminant order
    pub const ALL: [PixelFormat; 26] = [
        PixelFormat::None,
        PixelFormat::I420,
        PixelFormat::NV12,
        PixelFormat::YVYU,
        PixelFormat::YUY2,
        PixelFormat::UYVY,
        PixelFormat::RGBA,
        PixelFormat::BGRA,
        PixelFormat::BGRX,
        PixelFormat::Y800,
        PixelFormat::I444,
        PixelFormat::BGR3,
        PixelFormat::I422,
        PixelFormat::I40A,
        PixelFormat::I42A,
        PixelFormat::YUVA,
        PixelFormat::AYUV,
        PixelFormat::I010,
        PixelFormat::P010,
        PixelFormat::I210,
        PixelFormat::I412,
        PixelFormat::YA2L,
        PixelFormat::P216,
        PixelFormat::P416,
        PixelFormat::V210,
        PixelFormat::R10L,
    ];

    /// Map a raw host value. Unknown values come back as `None`.
    pub fn from_raw(raw: u32) -> PixelFormat {
        Self::ALL
            .get(raw as usize)
            .copied()
            .unwrap_or(PixelFormat::None)
    }

    /// Returns number of planes for this format
    pub fn plane_count(self) -> usize {
        match self {
            PixelFormat::None => 0,
            PixelFormat::I420
            | PixelFormat::I444
            | PixelFormat::I422
            | PixelFormat::I010
            | PixelFormat::I210
            | PixelFormat::I412 => 3,
            PixelFormat::I40A | PixelFormat::I42A | PixelFormat::YUVA | PixelFormat::YA2L => 4,
            PixelFormat::NV12 | PixelFormat::P010 | PixelFormat::P216 | PixelFormat::P416 => 2,
            _ => 1,
        }
    }

    /// Number of rows in `plane` for a frame of `height` rows.
    ///
    /// Chroma planes of the 4:2:0 layouts are vertically subsampled.
    pub fn plane_height(self, plane: usize, height: u32) -> u32 {
        if plane >= self.plane_count() {
            return 0;
        }

        let half = height.div_ceil(2);
        match (self, plane) {
            (PixelFormat::I420 | PixelFormat::I010 | PixelFormat::I40A, 1 | 2) => half,
            (PixelFormat::NV12 | PixelFormat::P010, 1) => half,
            _ => height,
        }
    }
}

/// Build an NDI-style FourCC code from its four characters
pub const fn fourcc(code: [u8; 4]) -> u32 {
    (code[0] as u32) | ((code[1] as u32) << 8) | ((code[2] as u32) << 16) | ((code[3] as u32) << 24)
}

/// Pixel layout the sink puts on the wire
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FourCC {
    UYVY = fourcc(*b"UYVY"),
    NV12 = fourcc(*b"NV12"),
    I420 = fourcc(*b"I420"),
    RGBA = fourcc(*b"RGBA"),
    BGRA = fourcc(*b"BGRA"),
    BGRX = fourcc(*b"BGRX"),
}

/// Video format the host reports at negotiation time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    /// Frames per second, as the host's floating approximation of its rational rate
    pub frame_rate: f64,
}

/// One captured frame as pushed by the host.
///
/// Planes and line sizes are indexed together. The host owns the memory;
/// it stays valid only for the duration of the callback.
#[derive(Debug, Clone, Copy)]
pub struct VideoData<'a> {
    pub planes: &'a [&'a [u8]],
    pub linesize: &'a [u32],
    /// Host clock, nanoseconds
    pub timestamp: u64,
}

impl<'a> VideoData<'a> {
    pub fn new(planes: &'a [&'a [u8]], linesize: &'a [u32], timestamp: u64) -> Self {
        Self {
            planes,
            linesize,
            timestamp,
        }
    }

    /// First plane and its row stride, if the host supplied one
    pub fn first_plane(&self) -> Option<(&'a [u8], u32)> {
        Some((*self.planes.first()?, *self.linesize.first()?))
    }
}
