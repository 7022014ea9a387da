//! Heap invariant checker (component G). Verbose, non-mutating, never panics
//! — every violation is collected and handed back to the caller instead of
//! aborting, the same propagation policy as the rest of the allocator.

use crate::block::{next_block, read_footer, read_header};
use crate::consts::DSIZE;
use crate::free_list::FreeList;

/// A single invariant violation found by [`check_heap`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum CheckViolation {
    /// The prologue block's size or allocated bit doesn't match §3.
    BadPrologue,
    /// Walking forward from the prologue didn't land exactly on the epilogue.
    WalkDidNotReachEpilogue,
    /// A block's header and footer disagree.
    HeaderFooterMismatch { payload: usize },
    /// A block's free bit is set but it doesn't appear in the free list.
    FreeBlockNotInList { payload: usize },
    /// A block in the free list has its free bit clear.
    ListMemberNotFree { payload: usize },
    /// Two physically adjacent blocks are both free (should have coalesced).
    AdjacentFreeBlocks { first: usize, second: usize },
    /// The free list is not sorted in ascending address order (mod the head).
    ListNotSorted,
}

/// Walk the heap from `heap_listp` (the prologue's payload) to `epilogue` and
/// report every violation found. Does not mutate any state.
///
/// `free_list` is `Some` only for the explicit-list allocator, which is the
/// only variant invariants 3–4 apply to; the implicit variants pass `None`
/// and skip those cross-checks. `has_footers` likewise gates the
/// header/footer consistency check, since the implicit variants carry no
/// footers on ordinary blocks (only on the prologue). `allow_adjacent_free`
/// lets the plain implicit (no-coalescing) variant opt out of invariant 2,
/// which it doesn't claim to uphold.
pub fn check_heap(
    heap_listp: *mut u8,
    epilogue: *mut u8,
    free_list: Option<&FreeList>,
    has_footers: bool,
    allow_adjacent_free: bool,
    verbose: bool,
) -> Vec<CheckViolation> {
    let mut violations = Vec::new();

    let (prologue_size, prologue_free) = unsafe { read_header(heap_listp) };
    if prologue_size != DSIZE || prologue_free {
        violations.push(CheckViolation::BadPrologue);
    }

    let mut free_blocks_seen = Vec::new();
    let mut prev_was_free = false;
    let mut prev_payload: Option<*mut u8> = None;
    let mut cursor = heap_listp;
    loop {
        let (size, free) = unsafe { read_header(cursor) };
        if verbose {
            log::trace!("check: block at {cursor:?} size={size} free={free}");
        }
        if has_footers && size > 0 {
            let (fsize, ffree) = unsafe { read_footer(cursor, size) };
            if fsize != size || ffree != free {
                violations.push(CheckViolation::HeaderFooterMismatch {
                    payload: cursor as usize,
                });
            }
        }
        if free {
            free_blocks_seen.push(cursor);
            if prev_was_free && !allow_adjacent_free {
                violations.push(CheckViolation::AdjacentFreeBlocks {
                    first: prev_payload.unwrap() as usize,
                    second: cursor as usize,
                });
            }
        }
        prev_was_free = free;
        prev_payload = Some(cursor);

        if cursor == epilogue {
            break;
        }
        if size == 0 {
            // malformed: a zero-size block before the real epilogue means the
            // walk will never terminate on its own; bail out.
            violations.push(CheckViolation::WalkDidNotReachEpilogue);
            break;
        }
        cursor = unsafe { next_block(cursor) };
    }
    if cursor != epilogue {
        violations.push(CheckViolation::WalkDidNotReachEpilogue);
    }

    let Some(free_list) = free_list else {
        if verbose {
            for v in &violations {
                log::error!("check: {v:?}");
            }
        }
        return violations;
    };

    // Cross-check: every free-bit block appears exactly once in the list.
    for &payload in &free_blocks_seen {
        if !list_contains(free_list, payload) {
            violations.push(CheckViolation::FreeBlockNotInList {
                payload: payload as usize,
            });
        }
    }

    // Cross-check: every list member has its free bit set, and the list is
    // address-sorted modulo the head position.
    if !free_list.is_empty() {
        let head = free_list.head();
        let mut cur = head;
        let mut prev_addr: Option<usize> = None;
        let mut wrapped_once = false;
        loop {
            let (_, free) = unsafe { read_header(cur) };
            if !free {
                violations.push(CheckViolation::ListMemberNotFree { payload: cur as usize });
            }
            let addr = cur as usize;
            if let Some(p) = prev_addr {
                if addr <= p {
                    if wrapped_once {
                        violations.push(CheckViolation::ListNotSorted);
                    }
                    wrapped_once = true;
                } else if wrapped_once {
                    // a second ascending run after the wrap: not sorted mod head.
                    violations.push(CheckViolation::ListNotSorted);
                }
            }
            prev_addr = Some(addr);
            cur = unsafe { *(cur as *mut *mut u8) };
            if cur == head {
                break;
            }
        }
    }

    if verbose {
        for v in &violations {
            log::error!("check: {v:?}");
        }
    }
    violations
}

fn list_contains(free_list: &FreeList, target: *mut u8) -> bool {
    if free_list.is_empty() {
        return false;
    }
    let head = free_list.head();
    let mut cur = head;
    loop {
        if cur == target {
            return true;
        }
        cur = unsafe { *(cur as *mut *mut u8) };
        if cur == head {
            return false;
        }
    }
}
