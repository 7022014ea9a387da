//! The heap provider: the sole external collaborator the allocator talks to for
//! growth. Mirrors `sbrk(2)` semantics — grow by `nbytes`, return the address of
//! the first newly-added byte, never shrink.
//!
//! Two implementations are provided. [`SbrkHeap`] is the production adapter,
//! generalized from the teacher's direct `libc::sbrk` calls in `BumpAllocator`.
//! [`VecHeap`] backs the block-manager's own unit tests: it hands out addresses
//! into a fixed-capacity buffer allocated once up front, so growing it never
//! moves previously returned pointers (the same trick `memlib`-style heap
//! simulators use), and multiple `#[test]` threads each get their own heap
//! instead of fighting over the real process break.

use libc::{c_void, intptr_t, sbrk};

use crate::error::AllocError;

/// Extends a byte-addressable heap region on request. Implementors must never
/// shrink the region and must return an address for the *first newly added*
/// byte on success.
pub trait HeapProvider {
    /// Grow the heap by exactly `nbytes` bytes, returning the address of the
    /// first byte of the new region.
    fn request(&mut self, nbytes: usize) -> Result<*mut u8, AllocError>;

    /// Current break address (one past the last valid byte).
    fn break_addr(&self) -> *mut u8;
}

/// Heap provider backed by the process's real `sbrk(2)` break.
///
/// # Safety contract
/// Only one `SbrkHeap` (and therefore only one allocator built on top of it)
/// should be active per process: `sbrk` manipulates process-wide state, so two
/// independent instances would silently race over the same break.
pub struct SbrkHeap;

impl SbrkHeap {
    pub const fn new() -> Self {
        Self
    }
}

impl Default for SbrkHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapProvider for SbrkHeap {
    fn request(&mut self, nbytes: usize) -> Result<*mut u8, AllocError> {
        let addr = unsafe { sbrk(nbytes as intptr_t) };
        if addr == usize::MAX as *mut c_void {
            log::error!("sbrk({nbytes}) failed: heap provider out of memory");
            return Err(AllocError::OutOfMemory);
        }
        log::debug!(
            "sbrk({nbytes}) -> {addr:?}, new break = {:?}",
            unsafe { sbrk(0) }
        );
        Ok(addr as *mut u8)
    }

    fn break_addr(&self) -> *mut u8 {
        unsafe { sbrk(0) as *mut u8 }
    }
}

/// Heap provider backed by a fixed-capacity, never-reallocated buffer.
///
/// The buffer is allocated once, at construction, to `capacity` bytes. `request`
/// only ever advances a logical break offset within that buffer; the backing
/// storage is never moved or resized, so pointers handed out by the allocator
/// remain valid for the provider's whole lifetime.
pub struct VecHeap {
    storage: Box<[u8]>,
    brk: usize,
}

impl VecHeap {
    /// Create a heap provider with `capacity` bytes of backing storage.
    pub fn new(capacity: usize) -> Self {
        Self {
            storage: vec![0u8; capacity].into_boxed_slice(),
            brk: 0,
        }
    }

    fn base(&self) -> *mut u8 {
        self.storage.as_ptr() as *mut u8
    }
}

impl HeapProvider for VecHeap {
    fn request(&mut self, nbytes: usize) -> Result<*mut u8, AllocError> {
        let new_brk = self.brk.checked_add(nbytes).ok_or(AllocError::OutOfMemory)?;
        if new_brk > self.storage.len() {
            log::error!(
                "VecHeap exhausted: requested {nbytes}, brk {} + {nbytes} > capacity {}",
                self.brk,
                self.storage.len()
            );
            return Err(AllocError::OutOfMemory);
        }
        let addr = unsafe { self.base().add(self.brk) };
        log::debug!("VecHeap::request({nbytes}) -> {addr:?}, new brk = {new_brk}");
        self.brk = new_brk;
        Ok(addr)
    }

    fn break_addr(&self) -> *mut u8 {
        unsafe { self.base().add(self.brk) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_heap_grows_monotonically_and_never_moves() {
        let mut heap = VecHeap::new(4096);
        let first = heap.request(64).unwrap();
        let second = heap.request(64).unwrap();
        assert_eq!(unsafe { first.add(64) }, second);
    }

    #[test]
    fn vec_heap_reports_out_of_memory_past_capacity() {
        let mut heap = VecHeap::new(128);
        assert!(heap.request(64).is_ok());
        assert_eq!(heap.request(128), Err(AllocError::OutOfMemory));
    }

    #[test]
    fn vec_heap_break_addr_tracks_requests() {
        let mut heap = VecHeap::new(256);
        let base = heap.break_addr();
        heap.request(100).unwrap();
        assert_eq!(unsafe { base.add(100) }, heap.break_addr());
    }
}
