//! The fixed-capacity heap registry: `create()` and per-heap bookkeeping.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, Ordering};

use heap_port::{CriticalSection, Section, SpinCriticalSection};

use crate::block::BlockLink;
use crate::codec;
use crate::error::HeapError;
use crate::HeapId;

/// Per-heap descriptor. Lives in the registry, never in the caller's region.
///
/// `start` is an embedded sentinel whose `next_free` points at the lowest
/// free block; `end` points at a sentinel header written into the region
/// itself, one past the last usable byte. A slot is unused iff `end` is
/// null.
pub struct HeapLink {
    pub(crate) start: BlockLink,
    pub(crate) end: *mut BlockLink,
    pub(crate) free_bytes: usize,
    pub(crate) low_water: usize,
}

impl HeapLink {
    const fn unused() -> Self {
        Self {
            start: BlockLink::sentinel(),
            end: core::ptr::null_mut(),
            free_bytes: 0,
            low_water: 0,
        }
    }

    fn is_unused(&self) -> bool {
        self.end.is_null()
    }
}

/// Point-in-time usage statistics for one heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    pub free_bytes: usize,
    pub low_water: usize,
}

/// A fixed-capacity table of up to `N` independently managed heaps, guarded
/// by a single critical-section port.
///
/// `N` must fit in the packed heap-id field (1..=127). The port is invoked
/// to create its underlying primitive exactly once, lazily, on the first
/// `create()` call this registry services — matching reference behaviour
/// where the zone is brought up on first use rather than at construction.
pub struct Heaps<const N: usize, C: CriticalSection = SpinCriticalSection> {
    port: C,
    port_initialized: AtomicBool,
    slots: [UnsafeCell<HeapLink>; N],
}

// SAFETY: every field reachable through a shared `&Heaps` is only ever
// mutated from inside a `Section`, which serializes access through `port`.
// Raw pointers stored in slot headers never escape the region they were
// handed in, so they carry no thread-local provenance of their own.
unsafe impl<const N: usize, C: CriticalSection> Sync for Heaps<N, C> {}

// SAFETY: a `Heaps` value owns its slots outright; nothing about moving
// one across a thread boundary is unsound on top of the `Sync` reasoning
// above — the raw pointers inside never alias anything outside the
// region the registry was handed. Needed so `spin::Once<Heaps<..>>` (which
// requires `T: Send + Sync` for its own `Sync` impl) can sit in a `static`.
unsafe impl<const N: usize, C: CriticalSection> Send for Heaps<N, C> {}

impl<const N: usize, C: CriticalSection> Heaps<N, C> {
    /// Builds an empty registry over `port`. Does not touch `port` yet —
    /// `create()` does that lazily, once, the first time it's needed.
    pub fn new(port: C) -> Self {
        assert!(N >= 1 && N <= codec::HEAP_ID_BITMASK, "emheap: N must be in 1..=127");
        Self {
            port,
            port_initialized: AtomicBool::new(false),
            slots: core::array::from_fn(|_| UnsafeCell::new(HeapLink::unused())),
        }
    }

    fn ensure_port_created(&self) {
        if self
            .port_initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            self.port.create();
        }
    }

    /// Registers a new heap over `region`, which must outlive the registry.
    pub fn create(&self, region: &'static mut [u8]) -> Result<HeapId, HeapError> {
        // SAFETY: the region is `'static` and uniquely borrowed here, so its
        // address and length are stable and exclusively owned for the rest
        // of the program.
        unsafe { self.create_raw(region.as_mut_ptr(), region.len()) }
    }

    /// Registers a new heap over the `len` bytes starting at `addr`.
    ///
    /// # Safety
    /// `addr` must be valid for reads and writes for `len` bytes for the
    /// remainder of the program, and must not alias any other heap's region
    /// or any live Rust reference.
    pub unsafe fn create_raw(&self, addr: *mut u8, len: usize) -> Result<HeapId, HeapError> {
        self.ensure_port_created();
        let _section = Section::enter(&self.port);

        let index = self
            .slots
            .iter()
            .position(|slot| (*slot.get()).is_unused())
            .ok_or(HeapError::RegistryFull)?;

        let mut start = addr as usize;
        let aligned_start = heap_align::align_up(start);
        let lost_to_alignment = aligned_start - start;
        if lost_to_alignment >= len {
            return Err(HeapError::BadSize);
        }
        start = aligned_start;
        let size = len - lost_to_alignment;

        if size < codec::HEADER_SIZE + codec::MIN_BLOCK_SIZE {
            return Err(HeapError::BadSize);
        }
        let aligned_top = heap_align::align_down(start + size - codec::HEADER_SIZE);
        if aligned_top <= start || aligned_top - start < codec::MIN_BLOCK_SIZE {
            return Err(HeapError::BadSize);
        }

        let end_ptr = aligned_top as *mut BlockLink;
        *end_ptr = BlockLink::sentinel();

        let initial_block = start as *mut BlockLink;
        (*initial_block).size_word = aligned_top - start;
        (*initial_block).next_free = end_ptr;

        let slot = &mut *self.slots[index].get();
        slot.start = BlockLink {
            size_word: 0,
            next_free: initial_block,
        };
        slot.end = end_ptr;
        slot.free_bytes = aligned_top - start;
        slot.low_water = slot.free_bytes;

        log::info!(
            "heap: created heap {} over {} usable bytes",
            index,
            slot.free_bytes
        );

        Ok(index as HeapId)
    }

    /// Snapshots the free-bytes and low-water statistics of `heap_id`.
    pub fn stats(&self, heap_id: HeapId) -> Result<HeapStats, HeapError> {
        let index = self.validate_heap_id(heap_id)?;
        let _section = Section::enter(&self.port);
        let heap = unsafe { &*self.slots[index].get() };
        Ok(HeapStats {
            free_bytes: heap.free_bytes,
            low_water: heap.low_water,
        })
    }

    pub(crate) fn validate_heap_id(&self, heap_id: HeapId) -> Result<usize, HeapError> {
        if heap_id < 0 || heap_id as usize >= N {
            return Err(HeapError::BadHeapId);
        }
        Ok(heap_id as usize)
    }

    pub(crate) fn port(&self) -> &C {
        &self.port
    }

    pub(crate) fn slot(&self, index: usize) -> &UnsafeCell<HeapLink> {
        &self.slots[index]
    }
}

#[cfg(test)]
impl<const N: usize, C: CriticalSection> Heaps<N, C> {
    /// Snapshots `(address, size)` of every block on `heap_id`'s free list,
    /// in list order, for asserting sortedness and coalescing invariants.
    pub(crate) fn free_list_snapshot(&self, heap_id: HeapId) -> std::vec::Vec<(usize, usize)> {
        let index = self.validate_heap_id(heap_id).unwrap();
        let _section = Section::enter(&self.port);
        let heap = unsafe { &*self.slots[index].get() };

        let mut out = std::vec::Vec::new();
        let mut node = heap.start.next_free;
        while node != heap.end {
            unsafe {
                out.push((node as usize, (*node).size_word));
                node = (*node).next_free;
            }
        }
        out
    }
}
