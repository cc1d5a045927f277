//! Registry capacity, selected at compile time by Cargo feature.

#[cfg(feature = "heaps16")]
pub const N_HEAPS: usize = 16;
#[cfg(all(feature = "heaps8", not(feature = "heaps16")))]
pub const N_HEAPS: usize = 8;
#[cfg(all(feature = "heaps4", not(any(feature = "heaps8", feature = "heaps16"))))]
pub const N_HEAPS: usize = 4;
#[cfg(not(any(feature = "heaps4", feature = "heaps8", feature = "heaps16")))]
pub const N_HEAPS: usize = 2;

const _: () = assert!(
    N_HEAPS >= 1 && N_HEAPS <= 127,
    "emheap: N_HEAPS must be in 1..=127",
);
