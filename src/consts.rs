//! Shared sizing constants, used by every allocator variant and by [`crate::block`].

/// Header/footer word size, in bytes.
pub const WSIZE: usize = 4;
/// Alignment quantum: every block size is a multiple of this.
pub const DSIZE: usize = 8;
/// Minimum heap-growth step requested from the heap provider.
pub const CHUNKSIZE: usize = 4096;
/// Header + footer overhead charged against every explicit-list block.
pub const OVERHEAD: usize = 8;
/// Smallest block the explicit-list allocator will place: header + two link
/// words + footer.
pub const MINSIZE_EXPLICIT: usize = 16;
/// Smallest block the implicit-list allocators will place: header only (no
/// in-payload links, no footer).
pub const MINSIZE_IMPLICIT: usize = 8;
/// Sentinel written at the prologue padding. Never read by normal control
/// flow; kept purely as a manual-debugging canary, surfaced read-only through
/// `check`'s verbose output.
pub const KEY: u32 = 0xDEAD_C0DE;
