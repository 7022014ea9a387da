//! Explicit address-ordered free list allocator — the primary design.
//! Placement is first-fit over [`FreeList`]; coalescing is folded into
//! [`FreeList::add`] rather than being a separate pass, so there is no
//! free-standing "coalesce" step here the way there is in
//! [`ImplicitCoalescingAllocator`].
//!
//! [`ImplicitCoalescingAllocator`]: crate::alloc::ImplicitCoalescingAllocator

use crate::alloc::{adjust_size, extend_heap, Allocator};
use crate::block::{next_block, read_header, write_header, write_header_and_footer};
use crate::check::{check_heap, CheckViolation};
use crate::consts::{CHUNKSIZE, DSIZE, KEY, MINSIZE_EXPLICIT, WSIZE};
use crate::error::AllocError;
use crate::free_list::FreeList;
use crate::heap::HeapProvider;

pub struct ExplicitAllocator<H: HeapProvider> {
    heap: H,
    heap_listp: *mut u8,
    epilogue: *mut u8,
    free_list: FreeList,
}

impl<H: HeapProvider> ExplicitAllocator<H> {
    pub fn new(heap: H) -> Self {
        Self {
            heap,
            heap_listp: std::ptr::null_mut(),
            epilogue: std::ptr::null_mut(),
            free_list: FreeList::new(),
        }
    }

    /// Take `bp` out of the free list (it must already be free and present)
    /// and place `asize` bytes into it, splitting off and re-listing the
    /// remainder when it's worth keeping.
    fn place(&mut self, bp: *mut u8, asize: usize) {
        self.free_list.remove(bp);
        let (size, _) = unsafe { read_header(bp) };
        if size - asize >= MINSIZE_EXPLICIT {
            unsafe {
                write_header_and_footer(bp, asize, false);
                let rest = next_block(bp);
                write_header_and_footer(rest, size - asize, true);
            }
            // the split remainder was never coalesced against; `add` still
            // handles it correctly, it just always takes the plain-link path.
            let _ = self.free_list.add(unsafe { next_block(bp) });
        } else {
            unsafe { write_header_and_footer(bp, size, false) };
        }
    }

    fn grow_and_retry(&mut self, asize: usize) -> Option<*mut u8> {
        let words = std::cmp::max(asize, CHUNKSIZE) / WSIZE;
        let (bp, bsize) = extend_heap(&mut self.heap, words, true).ok()?;
        self.epilogue = unsafe { bp.add(bsize) };
        self.free_list.add(bp).ok()?;
        let bp = self.free_list.find_fit(asize)?;
        self.place(bp, asize);
        Some(bp)
    }
}

impl<H: HeapProvider> Allocator for ExplicitAllocator<H> {
    fn init(&mut self) -> Result<(), AllocError> {
        let base = self.heap.request(4 * WSIZE)?;
        unsafe {
            (base as *mut u32).write(KEY);
            let prologue_payload = base.add(2 * WSIZE);
            write_header_and_footer(prologue_payload, DSIZE, false);
            self.heap_listp = prologue_payload;
            let epilogue_payload = prologue_payload.add(DSIZE);
            write_header(epilogue_payload, 0, false);
            self.epilogue = epilogue_payload;
        }
        let (bp, bsize) = extend_heap(&mut self.heap, CHUNKSIZE / WSIZE, true)?;
        self.epilogue = unsafe { bp.add(bsize) };
        self.free_list.add(bp)?;
        Ok(())
    }

    fn alloc(&mut self, size: usize) -> Option<*mut u8> {
        if size == 0 {
            return None;
        }
        let asize = adjust_size(size, MINSIZE_EXPLICIT);
        if let Some(bp) = self.free_list.find_fit(asize) {
            self.place(bp, asize);
            return Some(bp);
        }
        self.grow_and_retry(asize)
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
        unsafe { write_header_and_footer(ptr, size, true) };
        self.free_list.add(ptr)
    }

    fn realloc(&mut self, ptr: Option<*mut u8>, size: usize) -> Option<*mut u8> {
        let Some(bp) = ptr else {
            return self.alloc(size);
        };
        if size == 0 {
            let _ = self.free(bp);
            return None;
        }
        let asize = adjust_size(size, MINSIZE_EXPLICIT);
        let (old, _) = unsafe { read_header(bp) };

        if asize == old || old.saturating_sub(asize) < MINSIZE_EXPLICIT {
            return Some(bp);
        }

        if asize < old {
            unsafe {
                write_header_and_footer(bp, asize, false);
                let rest = next_block(bp);
                write_header_and_footer(rest, old - asize, true);
            }
            let _ = self.free_list.add(unsafe { next_block(bp) });
            return Some(bp);
        }

        // Growing: probe the physical successor before falling back to a
        // fresh allocation, per the in-place-growth step of the design.
        let next = unsafe { next_block(bp) };
        if next != self.epilogue {
            let (next_size, next_free) = unsafe { read_header(next) };
            if next_free && old + next_size >= asize {
                self.free_list.remove(next);
                let combined = old + next_size;
                if combined - asize >= MINSIZE_EXPLICIT {
                    unsafe {
                        write_header_and_footer(bp, asize, false);
                        let rest = next_block(bp);
                        write_header_and_footer(rest, combined - asize, true);
                    }
                    let _ = self.free_list.add(unsafe { next_block(bp) });
                } else {
                    unsafe { write_header_and_footer(bp, combined, false) };
                }
                return Some(bp);
            }
        }

        let new_bp = self.alloc(size)?;
        unsafe {
            std::ptr::copy_nonoverlapping(bp, new_bp, old.saturating_sub(DSIZE).min(size));
        }
        let _ = self.free(bp);
        Some(new_bp)
    }

    fn check(&self, verbose: bool) -> Vec<CheckViolation> {
        check_heap(
            self.heap_listp,
            self.epilogue,
            Some(&self.free_list),
            true,
            false,
            verbose,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::VecHeap;

    fn fresh() -> ExplicitAllocator<VecHeap> {
        let mut a = ExplicitAllocator::new(VecHeap::new(1 << 20));
        a.init().unwrap();
        a
    }

    #[test]
    fn alloc_then_free_leaves_a_clean_heap() {
        let mut a = fresh();
        let p = a.alloc(100).unwrap();
        assert!(a.check(false).is_empty());
        a.free(p).unwrap();
        assert!(a.check(false).is_empty());
    }

    #[test]
    fn freeing_adjacent_blocks_coalesces_them() {
        let mut a = fresh();
        let p1 = a.alloc(32).unwrap();
        let p2 = a.alloc(32).unwrap();
        let p3 = a.alloc(32).unwrap();
        a.free(p1).unwrap();
        a.free(p3).unwrap();
        a.free(p2).unwrap();
        assert!(a.check(false).is_empty());
        // after freeing all three, a single large allocation should succeed
        // without growing the heap, proving the three blocks merged.
        assert!(a.alloc(64).is_some());
    }

    #[test]
    fn double_free_is_rejected() {
        let mut a = fresh();
        let p = a.alloc(16).unwrap();
        a.free(p).unwrap();
        assert_eq!(a.free(p).unwrap_err(), AllocError::DoubleFree);
    }

    #[test]
    fn null_free_is_rejected() {
        let mut a = fresh();
        assert_eq!(a.free(std::ptr::null_mut()).unwrap_err(), AllocError::InvalidPointer);
    }

    #[test]
    fn realloc_none_behaves_like_alloc() {
        let mut a = fresh();
        let p = a.realloc(None, 32);
        assert!(p.is_some());
    }

    #[test]
    fn realloc_to_zero_behaves_like_free() {
        let mut a = fresh();
        let p = a.alloc(32).unwrap();
        assert!(a.realloc(Some(p), 0).is_none());
        assert!(a.check(false).is_empty());
    }

    #[test]
    fn realloc_shrink_then_grow_preserves_prefix_bytes() {
        let mut a = fresh();
        let p = a.alloc(64).unwrap();
        unsafe {
            std::ptr::write_bytes(p, 0xAB, 64);
        }
        let grown = a.realloc(Some(p), 128).unwrap();
        unsafe {
            assert_eq!(*grown, 0xAB);
        }
        assert!(a.check(false).is_empty());
    }
}
