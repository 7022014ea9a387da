//! Implicit-list allocator, no coalescing: the simplest degenerate case named
//! in the block manager design. Free blocks are found by a linear forward
//! scan of every block from the prologue; a freed block is never merged with
//! its neighbors, so fragmentation accumulates under workloads that
//! interleave frees with allocations of different sizes. Kept faithful to
//! that limitation rather than patched, since it is the documented trade-off
//! of this variant, not a bug.

use crate::alloc::{adjust_size, extend_heap, Allocator};
use crate::block::{next_block, read_header, write_header, write_header_and_footer};
use crate::check::{check_heap, CheckViolation};
use crate::consts::{CHUNKSIZE, DSIZE, KEY, MINSIZE_IMPLICIT, WSIZE};
use crate::error::AllocError;
use crate::heap::HeapProvider;

pub struct ImplicitAllocator<H: HeapProvider> {
    heap: H,
    heap_listp: *mut u8,
    epilogue: *mut u8,
}

impl<H: HeapProvider> ImplicitAllocator<H> {
    pub fn new(heap: H) -> Self {
        Self {
            heap,
            heap_listp: std::ptr::null_mut(),
            epilogue: std::ptr::null_mut(),
        }
    }

    fn find_fit(&self, asize: usize) -> Option<*mut u8> {
        let mut cursor = self.heap_listp;
        loop {
            let (size, free) = unsafe { read_header(cursor) };
            if free && size >= asize {
                return Some(cursor);
            }
            if cursor == self.epilogue {
                return None;
            }
            cursor = unsafe { next_block(cursor) };
        }
    }

    fn place(&mut self, bp: *mut u8, asize: usize) {
        let (size, _) = unsafe { read_header(bp) };
        if size - asize >= MINSIZE_IMPLICIT {
            unsafe {
                write_header(bp, asize, false);
                let rest = next_block(bp);
                write_header(rest, size - asize, true);
            }
        } else {
            unsafe { write_header(bp, size, false) };
        }
    }
}

impl<H: HeapProvider> Allocator for ImplicitAllocator<H> {
    fn init(&mut self) -> Result<(), AllocError> {
        let base = self.heap.request(4 * WSIZE)?;
        unsafe {
            (base as *mut u32).write(KEY);
            let prologue_payload = base.add(2 * WSIZE);
            // the prologue has size DSIZE, so its footer word coincides with
            // its own payload address: a two-word header+footer pair with no
            // payload bytes of its own.
            write_header_and_footer(prologue_payload, DSIZE, false);
            self.heap_listp = prologue_payload;
            let epilogue_payload = prologue_payload.add(DSIZE);
            write_header(epilogue_payload, 0, false);
            self.epilogue = epilogue_payload;
        }
        let (bp, bsize) = extend_heap(&mut self.heap, CHUNKSIZE / WSIZE, false)?;
        self.epilogue = unsafe { bp.add(bsize) };
        Ok(())
    }

    fn alloc(&mut self, size: usize) -> Option<*mut u8> {
        if size == 0 {
            return None;
        }
        let asize = adjust_size(size, MINSIZE_IMPLICIT);
        if let Some(bp) = self.find_fit(asize) {
            self.place(bp, asize);
            return Some(bp);
        }
        let words = std::cmp::max(asize, CHUNKSIZE) / WSIZE;
        let (bp, bsize) = extend_heap(&mut self.heap, words, false).ok()?;
        self.epilogue = unsafe { bp.add(bsize) };
        self.place(bp, asize);
        Some(bp)
    }

    fn free(&mut self, ptr: *mut u8) -> Result<(), AllocError> {
        if ptr.is_null() {
            log::warn!("free: null pointer");
            return Err(AllocError::InvalidPointer);
        }
        let (size, free) = unsafe { read_header(ptr) };
        if free {
            log::error!("free: double free at {ptr:?}");
            return Err(AllocError::DoubleFree);
        }
        unsafe { write_header(ptr, size, true) };
        Ok(())
    }

    fn realloc(&mut self, ptr: Option<*mut u8>, size: usize) -> Option<*mut u8> {
        let Some(bp) = ptr else {
            return self.alloc(size);
        };
        if size == 0 {
            let _ = self.free(bp);
            return None;
        }
        let asize = adjust_size(size, MINSIZE_IMPLICIT);
        let (old, _) = unsafe { read_header(bp) };
        if asize == old || old.saturating_sub(asize) < MINSIZE_IMPLICIT {
            return Some(bp);
        }
        if asize < old {
            unsafe {
                write_header(bp, asize, false);
                let rest = next_block(bp);
                write_header(rest, old - asize, true);
            }
            return Some(bp);
        }
        let next = unsafe { next_block(bp) };
        let (next_size, next_free) = unsafe { read_header(next) };
        if next_free && old + next_size >= asize {
            let combined = old + next_size;
            if combined - asize >= MINSIZE_IMPLICIT {
                unsafe {
                    write_header(bp, asize, false);
                    let rest = next_block(bp);
                    write_header(rest, combined - asize, true);
                }
            } else {
                unsafe { write_header(bp, combined, false) };
            }
            return Some(bp);
        }
        let new_bp = self.alloc(size)?;
        unsafe {
            std::ptr::copy_nonoverlapping(bp, new_bp, old.saturating_sub(WSIZE).min(size));
        }
        let _ = self.free(bp);
        Some(new_bp)
    }

    fn check(&self, verbose: bool) -> Vec<CheckViolation> {
        check_heap(self.heap_listp, self.epilogue, None, false, true, verbose)
    }
}
