//! Bucket assignment and tree sizing.
//!
//! A key lands in bucket `crc32c(key) mod 2^depth`. Since the bucket count is a
//! power of two the modulo is a mask over the low `depth` bits, and a depth-0
//! tree sends every key to bucket 0.
//!
//! The checksum is 32 bits wide, so trees deeper than [`MAX_TREE_DEPTH`]
//! would only add empty buckets. Depths are capped there.

use crc32c::crc32c;

/// Deepest tree ever built: one bucket per distinct 32-bit checksum.
pub const MAX_TREE_DEPTH: u32 = 32;

/// Bucket of `key` (its serialized bytes) in a tree of the given depth.
pub fn bucket_index(key: &[u8], depth: u32) -> usize {
    let checksum = u64::from(crc32c(key));
    (checksum & depth_mask(depth)) as usize
}

fn depth_mask(depth: u32) -> u64 {
    if depth >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << depth) - 1
    }
}

/// Depth of the tree that fits `len` entries: 0 for an empty map, otherwise
/// the smallest `d` with `2^d >= len`, capped at [`MAX_TREE_DEPTH`].
pub fn depth_for_len(len: usize) -> u32 {
    if len <= 1 {
        0
    } else {
        (usize::BITS - (len - 1).leading_zeros()).min(MAX_TREE_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_depth_for_small_sizes() {
        assert_eq!(depth_for_len(0), 0);
        assert_eq!(depth_for_len(1), 0);
        assert_eq!(depth_for_len(2), 1);
        assert_eq!(depth_for_len(3), 2);
        assert_eq!(depth_for_len(4), 2);
        assert_eq!(depth_for_len(5), 3);
        assert_eq!(depth_for_len(1026), 11);
    }

    #[test]
    fn test_depth_at_powers_of_two() {
        for k in 1..MAX_TREE_DEPTH {
            let n = 1usize << k;
            assert_eq!(depth_for_len(n), k);
            assert_eq!(depth_for_len(n + 1), k + 1);
        }
    }

    #[test]
    fn test_depth_stops_at_checksum_width() {
        assert_eq!(depth_for_len(1usize << 32), MAX_TREE_DEPTH);
        assert_eq!(depth_for_len((1usize << 32) + 1), MAX_TREE_DEPTH);
        assert_eq!(depth_for_len(usize::MAX), MAX_TREE_DEPTH);
    }

    #[test]
    fn test_depth_zero_uses_single_bucket() {
        for key in ["", "a", "key1", "some longer key"] {
            assert_eq!(bucket_index(key.as_bytes(), 0), 0);
        }
    }

    #[test]
    fn test_bucket_is_low_bits_of_checksum() {
        let key = b"key1";
        let checksum = crc32c(key) as usize;
        for depth in 0..16 {
            assert_eq!(bucket_index(key, depth), checksum % (1usize << depth));
        }
        assert_eq!(bucket_index(key, 32), checksum);
        assert_eq!(bucket_index(key, 64), checksum);
    }

    proptest! {
        #[test]
        fn depth_is_monotonic(n in 0usize..1_000_000) {
            prop_assert!(depth_for_len(n) <= depth_for_len(n + 1));
        }

        #[test]
        fn depth_is_smallest_fitting(n in 1usize..1_000_000) {
            let d = depth_for_len(n);
            prop_assert!(1usize << d >= n);
            if d > 0 {
                prop_assert!(1usize << (d - 1) < n);
            }
        }

        #[test]
        fn bucket_fits_in_tree(key in proptest::collection::vec(any::<u8>(), 0..64), depth in 0u32..20) {
            prop_assert!(bucket_index(&key, depth) < 1usize << depth);
        }
    }
}
