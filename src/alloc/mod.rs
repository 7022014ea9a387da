//! Public API (component F): the `Allocator` trait and the size/extension
//! machinery shared by all three variants.
//!
//! Three allocator types implement [`Allocator`], sharing everything below
//! this module but diverging in placement/coalescing strategy (component
//! D/E), per §4.E of the block manager design:
//!
//! - [`ImplicitAllocator`]: implicit list, no coalescing at all.
//! - [`ImplicitCoalescingAllocator`]: implicit list, reverse-scan coalescing.
//! - [`ExplicitAllocator`]: the primary design — address-ordered explicit
//!   free list with coalescing folded into insertion.

mod explicit;
mod implicit;
mod implicit_coalescing;

pub use explicit::ExplicitAllocator;
pub use implicit::ImplicitAllocator;
pub use implicit_coalescing::ImplicitCoalescingAllocator;

use crate::block::{write_header, write_header_and_footer};
use crate::check::CheckViolation;
use crate::consts::{DSIZE, OVERHEAD, WSIZE};
use crate::error::AllocError;
use crate::heap::HeapProvider;

/// The five public entry points every variant exposes, composing components
/// B–E as described in §4.F.
pub trait Allocator {
    /// Seed the heap with prologue/epilogue and one large initial free block.
    fn init(&mut self) -> Result<(), AllocError>;

    /// Allocate at least `size` usable bytes. Returns `None` on request-size-0
    /// or heap-provider exhaustion.
    fn alloc(&mut self, size: usize) -> Option<*mut u8>;

    /// Release a previously allocated block back to this allocator.
    fn free(&mut self, ptr: *mut u8) -> Result<(), AllocError>;

    /// Resize a previously allocated block, preserving its contents up to
    /// `min(old, new)` bytes. `realloc(None, n)` behaves like `alloc(n)`, and
    /// `realloc(Some(p), 0)` behaves like `free(p)` followed by returning
    /// `None`.
    fn realloc(&mut self, ptr: Option<*mut u8>, size: usize) -> Option<*mut u8>;

    /// Run the heap invariant checker (component G); never mutates state.
    fn check(&self, verbose: bool) -> Vec<CheckViolation>;
}

/// Given a user request of `requested` bytes, compute the block size to
/// place, per §4.D: requests at or below `DSIZE` round up to `minsize`;
/// larger requests round up to the next doubleword multiple of
/// `requested + OVERHEAD`.
pub(crate) fn adjust_size(requested: usize, minsize: usize) -> usize {
    if requested <= DSIZE {
        minsize
    } else {
        DSIZE * ((requested + OVERHEAD + DSIZE - 1) / DSIZE)
    }
}

/// Grow the heap by at least `words` words (rounded up to even to preserve
/// doubleword alignment), laying down a new free block and epilogue.
///
/// The returned block's payload pointer is exactly the heap provider's old
/// break: the old epilogue's header word is reused in place as this block's
/// header (see the design notes in `DESIGN.md` for why this reuse is safe),
/// so extension never wastes a word.
///
/// Returns `(new_block_payload, new_block_size)`; the caller is responsible
/// for adding the new block to whatever free-tracking structure it uses
/// (the explicit variant's free list, or nothing for the implicit variants).
pub(crate) fn extend_heap<H: HeapProvider>(
    heap: &mut H,
    words: usize,
    with_footer: bool,
) -> Result<(*mut u8, usize), AllocError> {
    let words = if words % 2 != 0 { words + 1 } else { words };
    let size = words * WSIZE;
    let bp = heap.request(size)?;
    if with_footer {
        unsafe { write_header_and_footer(bp, size, true) };
    } else {
        unsafe { write_header(bp, size, true) };
    }
    let new_epilogue = unsafe { bp.add(size) };
    unsafe { write_header(new_epilogue, 0, false) };
    log::debug!("extend_heap: words={words} bytes={size} block={bp:?} epilogue={new_epilogue:?}");
    Ok((bp, size))
}
