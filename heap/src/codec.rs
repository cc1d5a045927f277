//! Packing and unpacking of a block's `size_word`.
//!
//! An allocated block's size word carries three things in one `usize`:
//! the allocation bit, a 7-bit heap-id field, and the byte size in the
//! remaining low bits. This is the same trick the reference allocator
//! uses to avoid a second header word per block.

use crate::block::BlockLink;
use crate::HeapId;

const _: () = assert!(
    core::mem::size_of::<usize>() >= 4,
    "emheap: codec requires a usize of at least 32 bits",
);

const WORD_BITS: u32 = usize::BITS;

/// Mask for the 7-bit heap-id field once it has been shifted down to bit 0.
pub const HEAP_ID_BITMASK: usize = 0x7F;

/// Set on an allocated block's size word; clear on a free block's.
pub const ALLOC_BIT: usize = 1usize << (WORD_BITS - 16);

/// Shift distance of the heap-id field within the size word.
pub const HEAP_ID_SHIFT: u32 = WORD_BITS - 15;

/// `HEAP_ID_BITMASK` shifted into place within the size word.
pub const HEAP_ID_MASK: usize = HEAP_ID_BITMASK << HEAP_ID_SHIFT;

/// Size, in bytes, of the header written at the front of every block,
/// rounded up to the configured alignment so payloads always start aligned.
pub const HEADER_SIZE: usize = heap_align::align_up(core::mem::size_of::<BlockLink>());

/// Smallest block the splitter will carve off on its own; anything left
/// over smaller than this stays attached to the block being split instead.
pub const MIN_BLOCK_SIZE: usize = HEADER_SIZE * 2;

/// True if `size` collides with one of the reserved high bits and so can
/// never be stored as a plain byte count in a size word.
#[inline]
pub fn overlaps_reserved_bits(size: usize) -> bool {
    size & (ALLOC_BIT | HEAP_ID_MASK) != 0
}

/// Packs `size` and `heap_id` into an allocated-block size word.
#[inline]
pub fn encode_alloc(size: usize, heap_id: HeapId) -> usize {
    size | ALLOC_BIT | ((heap_id as usize & HEAP_ID_BITMASK) << HEAP_ID_SHIFT)
}

/// Extracts the plain byte size from a size word, allocated or free.
#[inline]
pub fn decode_size(size_word: usize) -> usize {
    size_word & !(ALLOC_BIT | HEAP_ID_MASK)
}

/// True if the allocation bit is set.
#[inline]
pub fn decode_allocated(size_word: usize) -> bool {
    size_word & ALLOC_BIT != 0
}

/// Extracts the heap-id field, whatever the allocation bit says.
#[inline]
pub fn decode_heap_id(size_word: usize) -> HeapId {
    ((size_word >> HEAP_ID_SHIFT) & HEAP_ID_BITMASK) as HeapId
}
