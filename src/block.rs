//! Block encoding: pack/unpack `(size, allocated)` into header/footer words and
//! navigate between payload addresses.
//!
//! A header (and, in the explicit-list variant, a mirroring footer) is a single
//! 4-byte word immediately before the block's payload. The low three bits of
//! that word are always free because every block size is a multiple of
//! [`DSIZE`](crate::consts::DSIZE) — only the lowest bit is used, and its sense
//! is **inverted**: `1` means free, `0` means allocated. That inversion is
//! confined entirely to this module; everything above it reads `(size, free)`
//! through [`read_header`]/[`write_header`] and never touches the raw word.

use crate::consts::{DSIZE, WSIZE};

const FLAG_MASK: u32 = 0b111;
const FREE_BIT: u32 = 0b001;

/// Pack `size` and `free` into a single header/footer word.
///
/// `size` must already be a multiple of [`DSIZE`]; its low three bits are
/// reused to carry flags.
pub fn pack(size: usize, free: bool) -> u32 {
    debug_assert_eq!(size & (DSIZE - 1), 0, "block size must be doubleword-aligned");
    size as u32 | if free { FREE_BIT } else { 0 }
}

/// Unpack a header/footer word into `(size, free)`.
pub fn unpack(word: u32) -> (usize, bool) {
    ((word & !FLAG_MASK) as usize, word & FREE_BIT != 0)
}

/// Address of the header word for the block whose payload starts at `payload`.
#[inline]
pub unsafe fn header_ptr(payload: *mut u8) -> *mut u32 {
    unsafe { payload.sub(WSIZE) as *mut u32 }
}

/// Read `(size, free)` from the header of the block at `payload`.
#[inline]
pub unsafe fn read_header(payload: *mut u8) -> (usize, bool) {
    unsafe { unpack(header_ptr(payload).read()) }
}

/// Overwrite the header of the block at `payload`.
#[inline]
pub unsafe fn write_header(payload: *mut u8, size: usize, free: bool) {
    unsafe { header_ptr(payload).write(pack(size, free)) };
}

/// Address of the footer word for the block at `payload`, given its `size`.
///
/// Only meaningful for the explicit-list variant, whose blocks carry footers.
#[inline]
pub unsafe fn footer_ptr(payload: *mut u8, size: usize) -> *mut u32 {
    unsafe { payload.add(size - DSIZE) as *mut u32 }
}

/// Read `(size, free)` from the footer of the block at `payload`, given its
/// header `size`.
#[inline]
pub unsafe fn read_footer(payload: *mut u8, size: usize) -> (usize, bool) {
    unsafe { unpack(footer_ptr(payload, size).read()) }
}

/// Overwrite both header and footer of the block at `payload` with `(size,
/// free)`. Keeps invariant 1 (header == footer) true by construction.
#[inline]
pub unsafe fn write_header_and_footer(payload: *mut u8, size: usize, free: bool) {
    unsafe {
        write_header(payload, size, free);
        footer_ptr(payload, size).write(pack(size, free));
    }
}

/// Payload address of the block physically following the one at `payload`.
#[inline]
pub unsafe fn next_block(payload: *mut u8) -> *mut u8 {
    let (size, _) = unsafe { read_header(payload) };
    unsafe { payload.add(size) }
}

/// Payload address of the block physically preceding the one at `payload`.
///
/// Reads the previous block's footer (the word immediately before this
/// block's header) to learn its size, then steps back by that amount.
/// Requires footers — explicit-list variant only.
#[inline]
pub unsafe fn prev_block(payload: *mut u8) -> *mut u8 {
    let prev_footer = unsafe { payload.sub(DSIZE) as *mut u32 };
    let (prev_size, _) = unsafe { unpack(prev_footer.read()) };
    unsafe { payload.sub(prev_size) }
}
