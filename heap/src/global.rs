//! A process-wide singleton registry, for callers that want a stable
//! C-ABI-shaped surface instead of threading a `Heaps` value through their
//! own code.
//!
//! The registry itself is built lazily on first use via `spin::Once`,
//! the same lazy-singleton idiom this workspace already uses for its own
//! process-wide subsystems. Capacity is fixed at [`crate::config::N_HEAPS`]
//! and locking always goes through [`heap_port::SpinCriticalSection`] — a
//! caller that needs a different port or capacity should build and own a
//! [`Heaps`] value directly instead of going through this module.

use core::ptr::NonNull;

use heap_port::SpinCriticalSection;
use spin::Once;

use crate::config::N_HEAPS;
use crate::error::HeapError;
use crate::registry::{HeapStats, Heaps};
use crate::HeapId;

static ENGINE: Once<Heaps<N_HEAPS, SpinCriticalSection>> = Once::new();

fn engine() -> &'static Heaps<N_HEAPS, SpinCriticalSection> {
    ENGINE.call_once(|| Heaps::new(SpinCriticalSection::new()))
}

/// Registers `region` as a new heap. Returns the heap id, or an error if
/// the registry is full or the region is too small to host a block.
pub fn create(region: &'static mut [u8]) -> Result<HeapId, HeapError> {
    engine().create(region)
}

/// Allocates `size` bytes on `heap_id`.
pub fn alloc(heap_id: HeapId, size: usize) -> Result<NonNull<u8>, HeapError> {
    engine().alloc(heap_id, size)
}

/// Frees `ptr`, previously returned by `alloc`/`zeroed_alloc`/`realloc`.
///
/// # Safety
/// `ptr` must be null or a pointer this module itself handed out.
pub unsafe fn free(ptr: *mut u8) {
    engine().free(ptr)
}

/// Allocates `n * elem_size` zeroed bytes on `heap_id`.
pub fn zeroed_alloc(heap_id: HeapId, n: usize, elem_size: usize) -> Result<NonNull<u8>, HeapError> {
    engine().zeroed_alloc(heap_id, n, elem_size)
}

/// Resizes the allocation at `ptr` to `new_size` bytes, preserving content.
///
/// # Safety
/// `ptr` must be null or a pointer this module itself handed out.
pub unsafe fn realloc(ptr: *mut u8, new_size: usize) -> Result<Option<NonNull<u8>>, HeapError> {
    engine().realloc(ptr, new_size)
}

/// Snapshots the free-bytes and low-water statistics of `heap_id`.
pub fn stats(heap_id: HeapId) -> Result<HeapStats, HeapError> {
    engine().stats(heap_id)
}
