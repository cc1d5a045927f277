//! Compile-time alignment configuration for the heap engine.
//!
//! The engine treats alignment as an external collaborator: it asks this
//! crate for a single `ALIGNMENT` constant and the derived mask, and never
//! computes an alignment value itself. Pick the alignment for your target
//! with a Cargo feature, the same way the rest of this workspace's sibling
//! crates pick a hardware profile with a feature flag rather than a
//! preprocessor `#define`.
//!
//! ```text
//! align1  align2  align4  align8 (default)  align16  align32
//! ```
//!
//! Exactly one of these features should be enabled; enabling more than one
//! is a configuration error caught by the `const` assertion below picking
//! whichever was compiled last, so callers SHOULD pass `default-features =
//! false` and select exactly one.
#![no_std]

#[cfg(feature = "align1")]
pub const ALIGNMENT: usize = 1;
#[cfg(feature = "align2")]
pub const ALIGNMENT: usize = 2;
#[cfg(feature = "align4")]
pub const ALIGNMENT: usize = 4;
#[cfg(feature = "align16")]
pub const ALIGNMENT: usize = 16;
#[cfg(feature = "align32")]
pub const ALIGNMENT: usize = 32;
#[cfg(not(any(
    feature = "align1",
    feature = "align2",
    feature = "align4",
    feature = "align16",
    feature = "align32",
)))]
pub const ALIGNMENT: usize = 8;

/// Mask used to test/clear the low alignment bits of an address or size.
pub const ALIGN_MASK: usize = ALIGNMENT - 1;

const _: () = assert!(
    ALIGNMENT == 1
        || ALIGNMENT == 2
        || ALIGNMENT == 4
        || ALIGNMENT == 8
        || ALIGNMENT == 16
        || ALIGNMENT == 32,
    "heap-align: ALIGNMENT must be one of {1, 2, 4, 8, 16, 32}",
);

/// Rounds `value` up to the next multiple of [`ALIGNMENT`].
#[inline]
pub const fn align_up(value: usize) -> usize {
    (value + ALIGN_MASK) & !ALIGN_MASK
}

/// Rounds `value` down to the previous multiple of [`ALIGNMENT`].
#[inline]
pub const fn align_down(value: usize) -> usize {
    value & !ALIGN_MASK
}

/// True if `value` is already a multiple of [`ALIGNMENT`].
#[inline]
pub const fn is_aligned(value: usize) -> bool {
    value & ALIGN_MASK == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_boundary() {
        assert_eq!(align_up(0), 0);
        assert_eq!(align_up(1), ALIGNMENT);
        assert_eq!(align_up(ALIGNMENT), ALIGNMENT);
        assert_eq!(align_up(ALIGNMENT + 1), 2 * ALIGNMENT);
    }

    #[test]
    fn align_down_truncates() {
        assert_eq!(align_down(ALIGNMENT + 1), ALIGNMENT);
        assert_eq!(align_down(ALIGNMENT), ALIGNMENT);
    }

    #[test]
    fn is_aligned_matches_align_up_fixed_points() {
        assert!(is_aligned(0));
        assert!(is_aligned(ALIGNMENT));
        assert!(!is_aligned(1) || ALIGNMENT == 1);
    }
}
