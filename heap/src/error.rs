use core::fmt;

/// Everything that can go wrong at the engine's public surface.
///
/// Every variant here corresponds to one row of the reference ABI's
/// sentinel-return table: callers that need the old out-of-band-value
/// convention recover it at the [`crate::global`] boundary rather than
/// here, so the typed engine API never has to smuggle an error through a
/// valid-looking pointer or heap id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// Every registry slot already names a live heap.
    RegistryFull,
    /// The heap id doesn't name a live slot in this registry.
    BadHeapId,
    /// The requested size is zero, overflows, or collides with a reserved
    /// header bit once header and alignment overhead are added.
    BadSize,
    /// No free block on the heap is large enough to satisfy the request.
    Exhaustion,
    /// Taxonomy-only: names the condition `free` detects when a header
    /// fails its sanity check (already free, or the allocation bit isn't
    /// set). Per spec, `free` reports this case as a silent logged no-op
    /// rather than a `Result`, so this variant is never constructed — it
    /// exists to keep the error taxonomy in this enum complete relative to
    /// the documented table of error conditions.
    CorruptedHeader,
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            HeapError::RegistryFull => "heap registry has no free slot",
            HeapError::BadHeapId => "heap id does not name a live heap",
            HeapError::BadSize => "requested size is zero, overflowing, or unrepresentable",
            HeapError::Exhaustion => "no free block large enough to satisfy the request",
            HeapError::CorruptedHeader => "block header failed its sanity check on free",
        };
        f.write_str(msg)
    }
}
