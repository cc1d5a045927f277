//! The five-operation allocation surface: alloc, free, zeroed_alloc, realloc.

use core::ptr::NonNull;

use heap_port::{CriticalSection, Section};

use crate::block::BlockLink;
use crate::codec;
use crate::error::HeapError;
use crate::freelist;
use crate::registry::Heaps;
use crate::HeapId;

impl<const N: usize, C: CriticalSection> Heaps<N, C> {
    /// Allocates at least `requested` bytes on `heap_id`, first-fit.
    pub fn alloc(&self, heap_id: HeapId, requested: usize) -> Result<NonNull<u8>, HeapError> {
        let index = self.validate_heap_id(heap_id)?;

        if requested == 0 || codec::overlaps_reserved_bits(requested) {
            return Err(HeapError::BadSize);
        }
        // `align_up` as `(x + mask) & !mask` can overflow for `x` near
        // `usize::MAX` even after the header addition above succeeds;
        // route through `align_down(x + mask)` with a checked add so that
        // case reports `BadSize` instead of wrapping or panicking.
        let adjusted = requested
            .checked_add(codec::HEADER_SIZE)
            .and_then(|v| v.checked_add(heap_align::ALIGN_MASK))
            .map(heap_align::align_down)
            .ok_or(HeapError::BadSize)?;
        if codec::overlaps_reserved_bits(adjusted) {
            return Err(HeapError::BadSize);
        }

        let _section = Section::enter(self.port());
        let heap = unsafe { &mut *self.slot(index).get() };

        if adjusted > heap.free_bytes {
            return Err(HeapError::Exhaustion);
        }

        let head: *mut BlockLink = &mut heap.start as *mut BlockLink;
        let mut predecessor = head;
        let mut block = unsafe { (*predecessor).next_free };
        while block != heap.end && unsafe { (*block).size_word } < adjusted {
            predecessor = block;
            block = unsafe { (*block).next_free };
        }

        if block == heap.end {
            return Err(HeapError::Exhaustion);
        }

        unsafe {
            (*predecessor).next_free = (*block).next_free;

            let block_size = (*block).size_word;
            if block_size - adjusted >= codec::MIN_BLOCK_SIZE {
                let remainder = (block as *mut u8).add(adjusted) as *mut BlockLink;
                (*remainder).size_word = block_size - adjusted;
                (*block).size_word = adjusted;
                log::trace!(
                    "heap: split block at {:p} into {} + {} remainder",
                    block,
                    adjusted,
                    (*remainder).size_word
                );
                freelist::link_free(heap, remainder);
            }

            heap.free_bytes -= (*block).size_word;
            if heap.free_bytes < heap.low_water {
                heap.low_water = heap.free_bytes;
            }

            (*block).size_word = codec::encode_alloc((*block).size_word, heap_id);
            (*block).next_free = core::ptr::null_mut();

            let user_ptr = (block as *mut u8).add(codec::HEADER_SIZE);
            Ok(NonNull::new_unchecked(user_ptr))
        }
    }

    /// Frees a block previously returned by `alloc`/`zeroed_alloc`/`realloc`.
    /// A null pointer is a no-op. A header that fails its sanity check is
    /// logged and left untouched rather than acted on.
    ///
    /// # Safety
    /// `ptr` must be null or a pointer this registry itself handed out, not
    /// already freed.
    pub unsafe fn free(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }

        let header = ptr.sub(codec::HEADER_SIZE) as *mut BlockLink;
        let size_word = (*header).size_word;
        let heap_id = codec::decode_heap_id(size_word);

        let header_ok = codec::decode_allocated(size_word)
            && (*header).next_free.is_null()
            && heap_id >= 0
            && (heap_id as usize) < N;
        if !header_ok {
            log::warn!(
                "heap: free() rejected a corrupted header at {:p} (heap_id={})",
                ptr,
                heap_id
            );
            return;
        }

        let index = heap_id as usize;
        log::debug!("heap: routing free of {:p} to heap {}", ptr, index);
        let _section = Section::enter(self.port());
        let heap = &mut *self.slot(index).get();

        let size = codec::decode_size(size_word);
        (*header).size_word = size;
        heap.free_bytes += size;
        freelist::link_free(heap, header);
    }

    /// Allocates space for `n` elements of `elem_size` bytes, zeroed.
    /// `n * elem_size` overflowing is reported as [`HeapError::BadSize`].
    pub fn zeroed_alloc(
        &self,
        heap_id: HeapId,
        n: usize,
        elem_size: usize,
    ) -> Result<NonNull<u8>, HeapError> {
        let total = n.checked_mul(elem_size).ok_or(HeapError::BadSize)?;
        let ptr = self.alloc(heap_id, total)?;

        unsafe {
            let header = ptr.as_ptr().sub(codec::HEADER_SIZE) as *mut BlockLink;
            let block_size = codec::decode_size((*header).size_word);
            let payload_len = block_size - codec::HEADER_SIZE;
            core::ptr::write_bytes(ptr.as_ptr(), 0, payload_len);
        }

        Ok(ptr)
    }

    /// Resizes the allocation at `ptr` to `new_size` bytes, possibly moving
    /// it. `ptr == null` returns `Ok(None)`. `new_size == 0` frees `ptr` and
    /// returns `Ok(None)`. On success the first `min(old, new)` payload
    /// bytes are preserved.
    ///
    /// # Safety
    /// `ptr` must be null or a pointer this registry itself handed out.
    pub unsafe fn realloc(
        &self,
        ptr: *mut u8,
        new_size: usize,
    ) -> Result<Option<NonNull<u8>>, HeapError> {
        if ptr.is_null() {
            return Ok(None);
        }
        if new_size == 0 {
            self.free(ptr);
            return Ok(None);
        }

        let header = ptr.sub(codec::HEADER_SIZE) as *mut BlockLink;
        let size_word = (*header).size_word;
        let heap_id = codec::decode_heap_id(size_word);
        let current_block_size = codec::decode_size(size_word);

        // Checked the same way `alloc`'s rounding is: a `new_size` near
        // `usize::MAX` must fall through to `alloc` (and fail there) rather
        // than overflow this comparison.
        let rounded_new_size = new_size
            .checked_add(heap_align::ALIGN_MASK)
            .map(heap_align::align_down);
        if rounded_new_size == Some(current_block_size) {
            return Ok(Some(NonNull::new_unchecked(ptr)));
        }

        let new_ptr = self.alloc(heap_id, new_size)?;
        let old_payload = current_block_size - codec::HEADER_SIZE;
        let copy_len = core::cmp::min(old_payload, new_size);
        core::ptr::copy_nonoverlapping(ptr, new_ptr.as_ptr(), copy_len);
        self.free(ptr);
        Ok(Some(new_ptr))
    }
}
