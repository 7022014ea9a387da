//! Integration tests driving `ExplicitAllocator` against the real process
//! break via `SbrkHeap`. Each test owns the break for its own process run —
//! `cargo test` runs each integration test file as its own binary — so there
//! is no cross-test interference, matching the precedent of `sbrk`-calling
//! tests in the teacher's own harness.
//!
//! `CHUNKSIZE` below mirrors the allocator's internal extension unit; it is
//! not part of the public API, so it's restated here rather than imported.

use blockalloc::{Allocator, ExplicitAllocator, SbrkHeap};

const CHUNKSIZE: usize = 4096;
// Free-list link layout from `free_list.rs`: `next` at payload offset 0,
// `prev` at payload offset `WSIZE`. Not part of the public API, restated
// here so this test can read the raw links without exposing `FreeList`.
const WSIZE: usize = 4;

fn break_now() -> usize {
    unsafe { libc::sbrk(0) as usize }
}

unsafe fn read_link(payload: *mut u8, offset: usize) -> *mut u8 {
    unsafe { *(payload.add(offset) as *mut *mut u8) }
}

#[test]
fn single_alloc_then_free_grows_heap_once_and_leaves_a_clean_free_list() {
    let before = break_now();
    let mut a = ExplicitAllocator::new(SbrkHeap::new());
    a.init().unwrap();
    let after_init = break_now();
    assert!(after_init > before, "init must grow the heap");

    let p = a.alloc(1).unwrap();
    assert!(a.check(false).is_empty());
    a.free(p).unwrap();
    assert!(a.check(false).is_empty());

    // `free` merges the freed block forward into the lone remainder left by
    // the split in `alloc(1)`, so the resulting free list must be a true
    // self-loop: a corrupted merge that splices in the about-to-be-dead
    // remainder address instead would leave a 2-cycle here that `check`
    // alone doesn't catch (the stale bytes still decode as a plausible free
    // header).
    unsafe {
        assert_eq!(read_link(p, 0), p, "free-list head must self-loop (next)");
        assert_eq!(read_link(p, WSIZE), p, "free-list head must self-loop (prev)");
    }

    // no allocation since init has required further growth: the single
    // extension from init should have been large enough for a 1-byte
    // request, and freeing it gives back one block covering that region.
    assert_eq!(break_now(), after_init);
}

#[test]
fn freeing_the_middle_of_three_allocations_makes_its_slot_reusable() {
    let mut a = ExplicitAllocator::new(SbrkHeap::new());
    a.init().unwrap();

    let x = a.alloc(16).unwrap();
    let y = a.alloc(16).unwrap();
    let z = a.alloc(16).unwrap();
    a.free(y).unwrap();
    assert!(a.check(false).is_empty());

    // a 16-byte request rounds to the same placed size `y` had, so the
    // allocator should hand back exactly `y`'s old address instead of
    // growing the heap or touching `x`/`z`.
    let break_before = break_now();
    let reused = a.alloc(16).unwrap();
    assert_eq!(reused, y);
    assert_eq!(break_now(), break_before);

    a.free(x).unwrap();
    a.free(reused).unwrap();
    a.free(z).unwrap();
}

#[test]
fn freeing_two_adjacent_allocations_coalesces_with_the_original_tail() {
    let mut a = ExplicitAllocator::new(SbrkHeap::new());
    a.init().unwrap();

    let x = a.alloc(16).unwrap();
    let y = a.alloc(16).unwrap();
    a.free(x).unwrap();
    a.free(y).unwrap();
    assert!(a.check(false).is_empty());

    // the whole extension from init should now be one free block again;
    // a request for nearly all of it should succeed without growing the
    // heap further.
    let break_before = break_now();
    assert!(a.alloc(CHUNKSIZE - 64).is_some());
    assert_eq!(break_now(), break_before);
}

#[test]
fn realloc_growth_preserves_the_original_bytes() {
    let mut a = ExplicitAllocator::new(SbrkHeap::new());
    a.init().unwrap();

    let p = a.alloc(100).unwrap();
    let pattern: Vec<u8> = (0..100).collect();
    unsafe { std::ptr::copy_nonoverlapping(pattern.as_ptr(), p, 100) };

    let grown = a.realloc(Some(p), 200).unwrap();
    let mut observed = vec![0u8; 100];
    unsafe { std::ptr::copy_nonoverlapping(grown, observed.as_mut_ptr(), 100) };
    assert_eq!(observed, pattern);
    assert!(a.check(false).is_empty());
}

#[test]
fn allocations_past_a_small_capacity_fail_without_corrupting_earlier_ones() {
    // A VecHeap with a tight capacity stands in for heap-provider exhaustion
    // without actually starving the test process of real memory.
    use blockalloc::VecHeap;
    let mut a = ExplicitAllocator::new(VecHeap::new(4 * 4096 + 64));
    a.init().unwrap();

    let mut live = Vec::new();
    loop {
        match a.alloc(512) {
            Some(p) => live.push(p),
            None => break,
        }
    }
    assert!(!live.is_empty());
    assert!(a.check(false).is_empty());

    for p in live {
        a.free(p).unwrap();
    }
    assert!(a.check(false).is_empty());
}

#[test]
fn two_large_allocations_spanning_two_chunk_extensions_coalesce_after_both_are_freed() {
    let mut a = ExplicitAllocator::new(SbrkHeap::new());
    a.init().unwrap();

    // each request is just under one chunk, so placing both forces a
    // second `extend_heap` call; the two extended regions are contiguous
    // because the heap provider only ever grows upward.
    let x = a.alloc(CHUNKSIZE - 8).unwrap();
    let y = a.alloc(CHUNKSIZE - 8).unwrap();
    assert!(a.check(false).is_empty());

    a.free(x).unwrap();
    a.free(y).unwrap();
    assert!(a.check(false).is_empty());

    let break_before = break_now();
    assert!(a.alloc(2 * CHUNKSIZE - 128).is_some());
    assert_eq!(break_now(), break_before);
}
