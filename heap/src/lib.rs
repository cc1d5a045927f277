//! A multi-region, first-fit heap allocator for embedded targets.
//!
//! Each region registered with [`Heaps::create`] is managed independently:
//! its own address-ordered free list, its own coalescing, its own
//! exhaustion boundary. A block's header packs which heap it belongs to
//! into the same word as its size, so [`Heaps::free`] never needs to be
//! told which heap a pointer came from.
//!
//! Locking is pluggable through [`heap_port::CriticalSection`]; alignment
//! is pluggable through a Cargo feature on `heap-align`. Both default to
//! sane choices for a single global registry — see [`global`] for that
//! convenience surface, or build a [`Heaps`] value directly for anything
//! more specific.
#![no_std]

#[cfg(test)]
extern crate std;

mod alloc_adapter;
mod api;
mod block;
mod codec;
pub mod config;
mod error;
mod freelist;
pub mod global;
mod registry;

pub use error::HeapError;
pub use registry::{HeapStats, Heaps};

#[cfg(feature = "global-alloc")]
pub use alloc_adapter::{GlobalAllocAdapter, ADAPTER_HEAP};

/// Identifies a heap within a [`Heaps`] registry. Negative values are
/// reserved for sentinel/error returns at the C-ABI boundary.
pub type HeapId = i8;

#[cfg(test)]
mod tests {
    use super::*;
    use heap_port::NoOpCriticalSection;
    use std::boxed::Box;
    use std::vec;

    fn leak_region(size: usize) -> &'static mut [u8] {
        Box::leak(vec![0u8; size].into_boxed_slice())
    }

    #[test]
    fn create_then_alloc_then_free_round_trips() {
        let heaps: Heaps<2, NoOpCriticalSection> = Heaps::new(NoOpCriticalSection);
        let id = heaps.create(leak_region(1024)).unwrap();

        let before = heaps.stats(id).unwrap();

        let ptr = heaps.alloc(id, 64).unwrap();
        unsafe {
            core::ptr::write_bytes(ptr.as_ptr(), 0xAB, 64);
            heaps.free(ptr.as_ptr());
        }

        let after = heaps.stats(id).unwrap();
        assert_eq!(after.free_bytes, before.free_bytes);
        assert!(after.low_water <= before.free_bytes);
    }

    #[test]
    fn alloc_on_unknown_heap_id_is_bad_heap_id() {
        let heaps: Heaps<2, NoOpCriticalSection> = Heaps::new(NoOpCriticalSection);
        assert_eq!(heaps.alloc(5, 16), Err(HeapError::BadHeapId));
    }

    #[test]
    fn registry_full_after_n_heaps() {
        let heaps: Heaps<2, NoOpCriticalSection> = Heaps::new(NoOpCriticalSection);
        heaps.create(leak_region(256)).unwrap();
        heaps.create(leak_region(256)).unwrap();
        assert_eq!(
            heaps.create(leak_region(256)).unwrap_err(),
            HeapError::RegistryFull
        );
    }

    #[test]
    fn degenerate_region_is_bad_size() {
        let heaps: Heaps<2, NoOpCriticalSection> = Heaps::new(NoOpCriticalSection);
        assert_eq!(heaps.create(leak_region(4)).unwrap_err(), HeapError::BadSize);
    }

    /// Property 1: the free list stays sorted by address with no two
    /// entries physically adjacent, through a run of mixed alloc/free.
    #[test]
    fn free_list_stays_sorted_with_no_adjacent_pairs() {
        let heaps: Heaps<2, NoOpCriticalSection> = Heaps::new(NoOpCriticalSection);
        let id = heaps.create(leak_region(4096)).unwrap();

        let a = heaps.alloc(id, 64).unwrap();
        let b = heaps.alloc(id, 64).unwrap();
        let c = heaps.alloc(id, 64).unwrap();
        unsafe {
            heaps.free(b.as_ptr());
            heaps.free(a.as_ptr());
        }
        let _d = heaps.alloc(id, 200).unwrap();
        unsafe {
            heaps.free(c.as_ptr());
        }

        let snapshot = heaps.free_list_snapshot(id);
        for window in snapshot.windows(2) {
            let (addr0, size0) = window[0];
            let (addr1, _) = window[1];
            assert!(addr0 < addr1, "free list must stay sorted by address");
            assert!(addr0 + size0 < addr1, "adjacent free blocks must be coalesced");
        }
    }

    /// Property 2: free bytes plus allocated bytes (headers included)
    /// always equals the heap's original usable size.
    #[test]
    fn free_plus_allocated_equals_original_usable_size() {
        let heaps: Heaps<2, NoOpCriticalSection> = Heaps::new(NoOpCriticalSection);
        let id = heaps.create(leak_region(4096)).unwrap();
        let original = heaps.stats(id).unwrap().free_bytes;

        let a = heaps.alloc(id, 100).unwrap();
        let b = heaps.alloc(id, 300).unwrap();
        let after_free_bytes = heaps.stats(id).unwrap().free_bytes;

        let allocated_bytes = original - after_free_bytes;
        // every byte not on the free list is accounted for by the two
        // live allocations' block sizes (header included).
        assert!(allocated_bytes > 0 && allocated_bytes < original);

        unsafe {
            heaps.free(a.as_ptr());
            heaps.free(b.as_ptr());
        }
        assert_eq!(heaps.stats(id).unwrap().free_bytes, original);
    }

    /// Property 4: every pointer handed back by alloc/zeroed_alloc/realloc
    /// is aligned to the configured alignment.
    #[test]
    fn returned_pointers_are_aligned() {
        let heaps: Heaps<2, NoOpCriticalSection> = Heaps::new(NoOpCriticalSection);
        let id = heaps.create(leak_region(4096)).unwrap();

        for size in [1usize, 3, 7, 15, 31, 63, 127] {
            let ptr = heaps.alloc(id, size).unwrap();
            assert!(heap_align::is_aligned(ptr.as_ptr() as usize));
            unsafe { heaps.free(ptr.as_ptr()) };
        }

        let zeroed = heaps.zeroed_alloc(id, 5, 7).unwrap();
        assert!(heap_align::is_aligned(zeroed.as_ptr() as usize));
    }

    /// Property 7: `realloc(p, decode_size(p))` returns `p` unchanged. The
    /// fast path compares the rounded request against the block's full
    /// stored size (header included), not the caller-visible payload size,
    /// so the decoded block size — not the original `alloc` request — is
    /// what must round-trip here.
    #[test]
    fn realloc_to_decoded_block_size_returns_same_pointer() {
        let heaps: Heaps<2, NoOpCriticalSection> = Heaps::new(NoOpCriticalSection);
        let id = heaps.create(leak_region(4096)).unwrap();

        let p = heaps.alloc(id, 48).unwrap();
        let header = unsafe { p.as_ptr().sub(crate::codec::HEADER_SIZE) as *const crate::block::BlockLink };
        let block_size = crate::codec::decode_size(unsafe { (*header).size_word });

        let r =
            unsafe { heaps.realloc(p.as_ptr(), block_size).unwrap() }.expect("same size stays live");
        assert_eq!(r.as_ptr(), p.as_ptr());
        unsafe { heaps.free(r.as_ptr()) };
    }

    /// Property 8: zeroed_alloc's entire payload reads zero.
    #[test]
    fn zeroed_alloc_payload_is_all_zero() {
        let heaps: Heaps<2, NoOpCriticalSection> = Heaps::new(NoOpCriticalSection);
        let id = heaps.create(leak_region(4096)).unwrap();

        let ptr = heaps.zeroed_alloc(id, 10, 9).unwrap();
        let bytes = unsafe { core::slice::from_raw_parts(ptr.as_ptr(), 90) };
        assert!(bytes.iter().all(|&b| b == 0));
        unsafe { heaps.free(ptr.as_ptr()) };
    }
}
