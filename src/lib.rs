//! # blockalloc - A Custom Memory Allocator Library
//!
//! This crate provides a general-purpose dynamic memory allocator — `alloc`,
//! `free`, `realloc` — over a single contiguous, monotonically-growing heap
//! region supplied by an external [`HeapProvider`] collaborator.
//!
//! ## Overview
//!
//! Three allocator designs are provided, all built from the same block
//! encoding and sharing the same prologue/epilogue-bounded heap layout, but
//! differing in how they track and recover free space:
//!
//! ```text
//!   Heap Layout (shared by all three variants):
//!
//!   ┌──────┬───────────┬──────────────────────────────────┬──────────┐
//!   │ KEY  │ Prologue  │        Ordinary Blocks            │ Epilogue │
//!   │ word │ (hdr[+ftr])│  hdr [payload] [ftr]  hdr ...     │  hdr(0)  │
//!   └──────┴───────────┴──────────────────────────────────┴──────────┘
//!                      ▲
//!                      └── heap_listp: the cursor every walk starts from.
//! ```
//!
//! - [`ImplicitAllocator`] — implicit list, first-fit, no coalescing at all.
//! - [`ImplicitCoalescingAllocator`] — implicit list, first-fit, reverse-scan
//!   coalescing on every `free`.
//! - [`ExplicitAllocator`] — the primary design: an address-ordered explicit
//!   free list with coalescing folded into insertion. First-fit placement
//!   over the free list alone (not every block), immediate in-place
//!   shrink/grow in `realloc` before falling back to alloc+copy+free.
//!
//! ## Crate Structure
//!
//! ```text
//!   blockalloc
//!   ├── error    - AllocError
//!   ├── heap     - HeapProvider trait, SbrkHeap, VecHeap
//!   ├── consts   - word/doubleword sizes, chunk size, minimum block sizes
//!   ├── block    - header/footer encoding and block navigation (internal)
//!   ├── free_list- the explicit variant's address-ordered free list
//!   ├── check    - heap invariant checker, usable by all three variants
//!   └── alloc    - the Allocator trait and its three implementations
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use blockalloc::{Allocator, ExplicitAllocator, SbrkHeap};
//!
//! fn main() {
//!     let mut allocator = ExplicitAllocator::new(SbrkHeap::new());
//!     allocator.init().unwrap();
//!
//!     let p = allocator.alloc(64).unwrap();
//!     unsafe { *(p as *mut u64) = 42 };
//!
//!     allocator.free(p).unwrap();
//! }
//! ```
//!
//! ## Safety
//!
//! This crate is inherently unsafe as it deals with raw memory management.
//! Callers are responsible for never passing a pointer to `free`/`realloc`
//! that did not come from the same allocator's `alloc`/`realloc`.

pub mod alloc;
mod block;
mod check;
mod consts;
mod error;
mod free_list;
mod heap;

pub use alloc::{Allocator, ExplicitAllocator, ImplicitAllocator, ImplicitCoalescingAllocator};
pub use check::CheckViolation;
pub use error::AllocError;
pub use heap::{HeapProvider, SbrkHeap, VecHeap};
