//! Aligned conversion scratch memory

use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::ptr::NonNull;
use std::slice;

const FRAME_ALIGNMENT: usize = 32; // Row kernels store 16 bytes at a time; keep AVX2 headroom

/// Zeroed, 32-byte aligned byte buffer that frees itself on drop.
///
/// Sized once and never resized; a new size means a new buffer.
pub struct ScratchBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

unsafe impl Send for ScratchBuffer {}
unsafe impl Sync for ScratchBuffer {}

impl ScratchBuffer {
    /// Allocate `size` zeroed bytes.
    ///
    /// `None` if `size` is too large for an allocation. Running out of memory aborts.
    pub fn new(size: usize) -> Option<Self> {
        let layout = Layout::from_size_align(size, FRAME_ALIGNMENT).ok()?;

        if size == 0 {
            return Some(Self {
                ptr: NonNull::dangling(),
                layout,
            });
        }

        let ptr = unsafe { alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(ptr) else {
            handle_alloc_error(layout);
        };

        log::debug!("Allocated {} byte conversion buffer", size);

        Some(Self { ptr, layout })
    }

    pub fn len(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl Drop for ScratchBuffer {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            unsafe {
                dealloc(self.ptr.as_ptr(), self.layout);
            }
        }
    }
}

impl std::fmt::Debug for ScratchBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchBuffer")
            .field("len", &self.len())
            .finish()
    }
}
