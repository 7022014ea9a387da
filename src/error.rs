use thiserror::Error;

/// Errors reported by the allocator's own diagnostics channel.
///
/// These never cause a panic or abort: every public entry point in [`crate::alloc`]
/// returns one of these (wrapped in `Result`/`Option`) instead of unwinding, so a
/// misbehaving caller cannot take the whole process down with it.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum AllocError {
    /// The heap provider refused to grow the heap further.
    #[error("heap provider refused to grow the heap")]
    OutOfMemory,

    /// `free`/`realloc` was called with a null or otherwise unrecognized pointer.
    #[error("invalid or null pointer passed to free/realloc")]
    InvalidPointer,

    /// `free` was called on a block whose header already says free.
    #[error("double free detected")]
    DoubleFree,

    /// The free list or heap walk is internally inconsistent (duplicate
    /// insertion, missing entry, unsorted list, adjacent free blocks, ...).
    #[error("free list or heap consistency check failed: {0}")]
    ListCorruption(&'static str),
}
