//! Cache-line-aligned allocation (`spec.md` §4.L / §6 external collaborator
//! "Aligned allocator"). The huge-page path the teacher's `numa-gpu` crate
//! exposes is out of scope here (`spec.md` §1 lists NUMA/huge-page discovery
//! as an external collaborator, not part of this core); this allocator only
//! guarantees `CACHE_LINE_SIZE` alignment.

use crate::error::{Error, ErrorKind};
use crate::radix::CACHE_LINE_SIZE;
use crate::types::Tuple;
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;

/// A `Vec`-like, cache-line-aligned, zero-initialized buffer of `Tuple`s.
///
/// Scratch partitioning buffers need an alignment guarantee plain `Vec<Tuple>`
/// does not make; the scatter engine also relies on every bucket's padding
/// region being untouched zeroed memory on first use.
pub struct AlignedTupleBuffer {
    ptr: NonNull<Tuple>,
    len: usize,
    layout: Layout,
}

// Safety: `AlignedTupleBuffer` owns its allocation exclusively; sharing it
// across threads is safe as long as callers respect the disjoint write-range
// discipline the partitioner guarantees (spec.md §5).
unsafe impl Send for AlignedTupleBuffer {}
unsafe impl Sync for AlignedTupleBuffer {}

impl AlignedTupleBuffer {
    pub fn new(len: usize) -> crate::error::Result<Self> {
        let size = len
            .checked_mul(std::mem::size_of::<Tuple>())
            .ok_or_else(|| Error::from(ErrorKind::OutOfMemory("tuple buffer size overflow".into())))?;
        let size = size.max(1);
        let layout = Layout::from_size_align(size, CACHE_LINE_SIZE)
            .map_err(|e| Error::from(ErrorKind::OutOfMemory(e.to_string())))?;
        // Safety: `layout` has nonzero size.
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw as *mut Tuple)
            .ok_or_else(|| Error::from(ErrorKind::OutOfMemory(format!("{} bytes", size))))?;
        Ok(AlignedTupleBuffer { ptr, len, layout })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[Tuple] {
        // Safety: `ptr` is valid for `len` elements for the lifetime of `self`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [Tuple] {
        // Safety: exclusive access via `&mut self`.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Write a single tuple at `idx`.
    ///
    /// # Safety
    /// The caller must ensure no other thread writes or reads `idx`
    /// concurrently, and that `idx < self.len()`.
    pub unsafe fn write_at(&self, idx: usize, val: Tuple) {
        debug_assert!(idx < self.len);
        self.ptr.as_ptr().add(idx).write(val);
    }

    /// Read the tuple at `idx`.
    ///
    /// # Safety
    /// The caller must ensure `idx < self.len()` and that the slot has been
    /// written (or is still the zeroed initial value).
    pub unsafe fn read_at(&self, idx: usize) -> Tuple {
        debug_assert!(idx < self.len);
        self.ptr.as_ptr().add(idx).read()
    }
}

impl Drop for AlignedTupleBuffer {
    fn drop(&mut self) {
        // Safety: `ptr`/`layout` describe the allocation made in `new`.
        unsafe { dealloc(self.ptr.as_ptr() as *mut u8, self.layout) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_cache_line_aligned_and_zeroed() {
        let buf = AlignedTupleBuffer::new(128).unwrap();
        assert_eq!(buf.as_slice().len(), 128);
        assert_eq!(buf.ptr.as_ptr() as usize % CACHE_LINE_SIZE, 0);
        assert!(buf.as_slice().iter().all(|t| t.key == 0 && t.payload == 0));
    }

}
