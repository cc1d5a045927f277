//! Address-ordered free list maintenance: insertion with boundary coalescing.

use crate::block::BlockLink;
use crate::registry::HeapLink;

/// Inserts `block` into `heap`'s free list in address order, merging it
/// with either neighbor it is physically adjacent to.
///
/// `block`'s `size_word` must already be the plain (unflagged) byte size of
/// the block — callers clear the allocation bit before calling this.
///
/// # Safety
/// `block` must point at a valid, writable `BlockLink`-sized header
/// entirely within `heap`'s region, not already linked into any free list.
pub unsafe fn link_free(heap: &mut HeapLink, block: *mut BlockLink) {
    log::trace!("heap: linking free block at {:p} (size={})", block, (*block).size_word);

    let head: *mut BlockLink = &mut heap.start as *mut BlockLink;
    let mut predecessor = head;
    while (*predecessor).next_free < block {
        predecessor = (*predecessor).next_free;
    }

    let mut block = block;
    let predecessor_end = (predecessor as *mut u8).add((*predecessor).size_word) as *mut BlockLink;
    if predecessor != head && predecessor_end == block {
        log::trace!("heap: backward-coalescing {:p} into {:p}", block, predecessor);
        (*predecessor).size_word += (*block).size_word;
        block = predecessor;
    }

    let successor = (*predecessor).next_free;
    let block_end = (block as *mut u8).add((*block).size_word) as *mut BlockLink;
    if block_end == successor {
        if successor == heap.end {
            (*block).next_free = heap.end;
        } else {
            log::trace!("heap: forward-coalescing {:p} into {:p}", successor, block);
            (*block).size_word += (*successor).size_word;
            (*block).next_free = (*successor).next_free;
        }
    } else {
        (*block).next_free = successor;
    }

    if predecessor != block {
        (*predecessor).next_free = block;
    }
}
