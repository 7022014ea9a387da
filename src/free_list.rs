//! The explicit, address-ordered, circular doubly-linked free list.
//!
//! Free blocks link to each other through two pointer-sized words stored at
//! the start of their own payload (`next` at offset 0, `prev` at offset
//! [`WSIZE`]) — there is no separate allocation for list nodes, since that
//! would defeat the point of the allocator.
//!
//! Insertion ([`FreeList::add`]) folds coalescing of address-adjacent free
//! blocks into the same pass, following the contract in the block manager's
//! design: find the address-ordered insertion gap, then test physical
//! adjacency against both sides of that gap before linking. This mirrors (and
//! generalizes to doubly-linked, address-ordered form) the singly-linked
//! `add_free_region`/`coalesce` pair in a sibling kernel's free-list
//! allocator, which folds the same two concerns into one pass for the same
//! reason: a block's neighbors in the list and its neighbors in memory are
//! rarely the same nodes, so both have to be checked independently.

use crate::block::{next_block, prev_block, read_header, write_header_and_footer};
use crate::consts::WSIZE;
use crate::error::AllocError;

#[inline]
unsafe fn read_next(bp: *mut u8) -> *mut u8 {
    unsafe { *(bp as *mut *mut u8) }
}

#[inline]
unsafe fn write_next(bp: *mut u8, val: *mut u8) {
    unsafe { *(bp as *mut *mut u8) = val };
}

#[inline]
unsafe fn read_prev(bp: *mut u8) -> *mut u8 {
    unsafe { *(bp.add(WSIZE) as *mut *mut u8) }
}

#[inline]
unsafe fn write_prev(bp: *mut u8, val: *mut u8) {
    unsafe { *(bp.add(WSIZE) as *mut *mut u8) = val };
}

/// Address-ordered circular doubly-linked free list.
///
/// `head` is a movable cursor, not a fixed anchor: every successful [`add`]
/// repositions it to the inserted-or-coalesced survivor, since workloads tend
/// to reallocate near recently freed addresses and this keeps [`find_fit`]'s
/// short-path warm.
///
/// [`add`]: FreeList::add
/// [`find_fit`]: FreeList::find_fit
#[derive(Default)]
pub struct FreeList {
    head: *mut u8,
}

impl FreeList {
    pub const fn new() -> Self {
        Self { head: std::ptr::null_mut() }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_null()
    }

    pub fn head(&self) -> *mut u8 {
        self.head
    }

    /// First-fit scan: walk forward from `head` until a block of at least
    /// `asize` bytes is found, or the walk returns to `head` unsatisfied.
    /// Bounded structurally by the list's own circularity — at most
    /// `|free_list|` steps.
    pub fn find_fit(&self, asize: usize) -> Option<*mut u8> {
        if self.head.is_null() {
            return None;
        }
        let mut current = self.head;
        loop {
            let (size, _) = unsafe { read_header(current) };
            if size >= asize {
                return Some(current);
            }
            current = unsafe { read_next(current) };
            if current == self.head {
                return None;
            }
        }
    }

    /// Unlink `bp` from the list. `bp`'s header/footer are left untouched —
    /// the caller is responsible for re-marking the block allocated.
    pub fn remove(&mut self, bp: *mut u8) {
        let next = unsafe { read_next(bp) };
        if next == bp {
            // singleton
            self.head = std::ptr::null_mut();
            return;
        }
        let prev = unsafe { read_prev(bp) };
        unsafe {
            write_next(prev, next);
            write_prev(next, prev);
        }
        if self.head == bp {
            self.head = next;
        }
    }

    /// Insert `bp` (whose header/footer are already marked free at its own,
    /// pre-merge size) into the address-ordered list, coalescing with
    /// physically adjacent free neighbors as it goes. See the module
    /// documentation for the four-way case split.
    pub fn add(&mut self, bp: *mut u8) -> Result<(), AllocError> {
        if self.head.is_null() {
            unsafe {
                write_next(bp, bp);
                write_prev(bp, bp);
            }
            self.head = bp;
            return Ok(());
        }

        let (c, nc) = self.find_insertion_gap(bp)?;

        let prev_phys = unsafe { prev_block(bp) };
        let next_phys = unsafe { next_block(bp) };
        let merges_prev = prev_phys == c;
        let merges_next = next_phys == nc;

        let survivor = if merges_prev && merges_next {
            // Three-way merge: c absorbs bp and nc; nc is removed from the list.
            let (size_c, _) = unsafe { read_header(c) };
            let (size_bp, _) = unsafe { read_header(bp) };
            let (size_nc, _) = unsafe { read_header(nc) };
            let merged = size_c + size_bp + size_nc;
            let after_nc = unsafe { read_next(nc) };
            unsafe {
                write_next(c, after_nc);
                write_prev(after_nc, c);
                write_header_and_footer(c, merged, true);
            }
            c
        } else if merges_prev {
            // bp merges into its free-list predecessor c; c keeps its slot.
            let (size_c, _) = unsafe { read_header(c) };
            let (size_bp, _) = unsafe { read_header(bp) };
            unsafe { write_header_and_footer(c, size_c + size_bp, true) };
            c
        } else if merges_next {
            // bp absorbs nc and takes over nc's slot in the list.
            let (size_bp, _) = unsafe { read_header(bp) };
            let (size_nc, _) = unsafe { read_header(nc) };
            unsafe {
                if c == nc {
                    // nc was a singleton: bp is now the only node, so it must
                    // self-loop rather than splice in nc's about-to-be-dead
                    // (and about-to-be-overwritten) link fields.
                    write_next(bp, bp);
                    write_prev(bp, bp);
                } else {
                    let after_nc = read_next(nc);
                    write_next(bp, after_nc);
                    write_prev(after_nc, bp);
                    write_next(c, bp);
                    write_prev(bp, c);
                }
                write_header_and_footer(bp, size_bp + size_nc, true);
            }
            bp
        } else {
            // No physical adjacency: plain link between c and nc.
            unsafe {
                write_next(bp, nc);
                write_prev(bp, c);
                write_next(c, bp);
                write_prev(nc, bp);
            }
            bp
        };

        self.head = survivor;
        Ok(())
    }

    /// Find the node `c` such that `bp` belongs address-ordered between `c`
    /// and `next(c)`, walking the circular list from `head`. Returns
    /// `(c, next(c))`. Errors if `bp` is already present in the list.
    fn find_insertion_gap(&self, bp: *mut u8) -> Result<(*mut u8, *mut u8), AllocError> {
        let mut c = self.head;
        loop {
            if c == bp {
                log::error!("free_list::add: {bp:?} is already present in the free list");
                return Err(AllocError::ListCorruption("duplicate free-list insertion"));
            }
            let nc = unsafe { read_next(c) };
            let c_addr = c as usize;
            let n_addr = bp as usize;
            let nc_addr = nc as usize;

            let ascending_gap = c_addr < n_addr && n_addr < nc_addr;
            let wrap_gap = c_addr >= nc_addr && (n_addr > c_addr || n_addr < nc_addr);
            if ascending_gap || wrap_gap {
                return Ok((c, nc));
            }
            c = nc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::write_header_and_footer;

    /// Lay out `n` adjacent blocks of `size` bytes each inside `buf`, writing
    /// allocated headers/footers for all of them, and return their payload
    /// pointers.
    fn lay_out_blocks(buf: &mut [u8], size: usize, n: usize) -> Vec<*mut u8> {
        let base = buf.as_mut_ptr();
        let mut out = Vec::with_capacity(n);
        unsafe {
            let mut p = base.add(WSIZE);
            for _ in 0..n {
                write_header_and_footer(p, size, false);
                out.push(p);
                p = p.add(size);
            }
        }
        out
    }

    #[test]
    fn add_to_empty_list_is_self_referential() {
        let mut buf = vec![0u8; 64];
        let blocks = lay_out_blocks(&mut buf, 16, 1);
        unsafe { write_header_and_footer(blocks[0], 16, true) };

        let mut list = FreeList::new();
        list.add(blocks[0]).unwrap();

        assert_eq!(list.head(), blocks[0]);
        unsafe {
            assert_eq!(read_next(blocks[0]), blocks[0]);
            assert_eq!(read_prev(blocks[0]), blocks[0]);
        }
    }

    #[test]
    fn non_adjacent_frees_stay_as_separate_nodes_in_address_order() {
        let mut buf = vec![0u8; 256];
        // three 16-byte blocks with an allocated 16-byte gap between each,
        // so none of them are physically adjacent to each other.
        let base = buf.as_mut_ptr();
        let (a, gap1, b, gap2, c);
        unsafe {
            a = base.add(WSIZE);
            write_header_and_footer(a, 16, false);
            gap1 = a.add(16);
            write_header_and_footer(gap1, 16, false);
            b = gap1.add(16);
            write_header_and_footer(b, 16, false);
            gap2 = b.add(16);
            write_header_and_footer(gap2, 16, false);
            c = gap2.add(16);
            write_header_and_footer(c, 16, false);
        }
        let _ = (gap1, gap2);

        unsafe {
            write_header_and_footer(b, 16, true);
            write_header_and_footer(a, 16, true);
            write_header_and_footer(c, 16, true);
        }

        let mut list = FreeList::new();
        list.add(b).unwrap();
        list.add(a).unwrap();
        list.add(c).unwrap();

        // All three should still be distinct nodes (no merges occurred).
        let mut seen = Vec::new();
        let start = list.head();
        let mut cur = start;
        loop {
            seen.push(cur);
            cur = unsafe { read_next(cur) };
            if cur == start {
                break;
            }
        }
        seen.sort_by_key(|p| *p as usize);
        assert_eq!(seen, vec![a, b, c]);
    }

    #[test]
    fn adjacent_frees_coalesce_into_one_node() {
        let mut buf = vec![0u8; 128];
        let blocks = lay_out_blocks(&mut buf, 16, 3);
        let (a, b, c) = (blocks[0], blocks[1], blocks[2]);

        let mut list = FreeList::new();
        unsafe { write_header_and_footer(a, 16, true) };
        list.add(a).unwrap();
        unsafe { write_header_and_footer(c, 16, true) };
        list.add(c).unwrap();

        // freeing b should merge with both neighbors into a single 48-byte block.
        unsafe { write_header_and_footer(b, 16, true) };
        list.add(b).unwrap();

        unsafe {
            let (size, free) = read_header(a);
            assert_eq!(size, 48);
            assert!(free);
            // singleton list after the three-way merge.
            assert_eq!(read_next(a), a);
            assert_eq!(read_prev(a), a);
        }
    }

    #[test]
    fn remove_singleton_empties_the_list() {
        let mut buf = vec![0u8; 64];
        let blocks = lay_out_blocks(&mut buf, 16, 1);
        unsafe { write_header_and_footer(blocks[0], 16, true) };

        let mut list = FreeList::new();
        list.add(blocks[0]).unwrap();
        list.remove(blocks[0]);
        assert!(list.is_empty());
    }

    #[test]
    fn duplicate_insertion_is_reported_not_silently_corrupted() {
        let mut buf = vec![0u8; 64];
        let blocks = lay_out_blocks(&mut buf, 16, 1);
        unsafe { write_header_and_footer(blocks[0], 16, true) };

        let mut list = FreeList::new();
        list.add(blocks[0]).unwrap();
        let err = list.add(blocks[0]).unwrap_err();
        assert_eq!(err, AllocError::ListCorruption("duplicate free-list insertion"));
    }

    #[test]
    fn find_fit_returns_first_block_large_enough() {
        let mut buf = vec![0u8; 256];
        let base = buf.as_mut_ptr();
        let (small, big);
        unsafe {
            small = base.add(WSIZE);
            write_header_and_footer(small, 16, true);
            // leave an allocated gap so `small` and `big` don't coalesce.
            write_header_and_footer(small.add(16), 16, false);
            big = small.add(16 + 16);
            write_header_and_footer(big, 64, true);
        }

        let mut list = FreeList::new();
        list.add(small).unwrap();
        list.add(big).unwrap();

        assert_eq!(list.find_fit(32), Some(big));
        assert_eq!(list.find_fit(8), Some(small));
        assert_eq!(list.find_fit(1000), None);
    }
}
