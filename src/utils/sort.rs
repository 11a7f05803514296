/// LSD radix sort for `u32` row indices.
/// Used to order the token indices of one document column before the column is
/// pushed into the sparse matrix.
///
/// Complexity: 4 passes, each O(n + 256)
#[inline]
pub fn radix_sort_u32(keys: &mut [u32]) {
    let n = keys.len();
    if n <= 1 {
        return;
    }

    // Small columns (the common case for short descriptions)
    if n <= 32 {
        insertion_sort_u32(keys);
        return;
    }

    let mut scratch = vec![0u32; n];
    // even pass: keys -> scratch, odd pass: scratch -> keys
    // 4 passes, so the sorted result ends up back in `keys`
    for (pass, shift) in [0u32, 8, 16, 24].into_iter().enumerate() {
        if pass % 2 == 0 {
            scatter_by_byte(keys, &mut scratch, shift);
        } else {
            scatter_by_byte(&scratch, keys, shift);
        }
    }
}

/// Sort then drop repeated indices in place.
/// Returns the deduplicated prefix length; the vector is truncated to it.
#[inline]
pub fn sort_dedup_u32(keys: &mut Vec<u32>) -> usize {
    radix_sort_u32(keys);
    keys.dedup();
    keys.len()
}

/// One stable counting pass over byte `shift / 8`.
#[inline(always)]
fn scatter_by_byte(src: &[u32], dst: &mut [u32], shift: u32) {
    debug_assert_eq!(src.len(), dst.len());
    let mut count = [0usize; 256];
    for &k in src {
        count[((k >> shift) & 0xFF) as usize] += 1;
    }

    // prefix sum -> start positions
    let mut sum = 0usize;
    for c in count.iter_mut() {
        let tmp = *c;
        *c = sum;
        sum += tmp;
    }

    for &k in src {
        let bucket = ((k >> shift) & 0xFF) as usize;
        dst[count[bucket]] = k;
        count[bucket] += 1;
    }
}

#[inline(always)]
fn insertion_sort_u32(keys: &mut [u32]) {
    for i in 1..keys.len() {
        let mut j = i;
        while j > 0 && keys[j] < keys[j - 1] {
            keys.swap(j, j - 1);
            j -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sorted(keys: &[u32]) {
        for i in 1..keys.len() {
            assert!(keys[i - 1] <= keys[i], "not sorted at {i}: {} > {}", keys[i - 1], keys[i]);
        }
    }

    /// tiny deterministic PRNG (xorshift32)
    struct Rng(u32);
    impl Rng {
        fn next_u32(&mut self) -> u32 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            self.0 = x;
            x
        }
    }

    #[test]
    fn radix_sort_handles_empty_and_single() {
        let mut keys: Vec<u32> = vec![];
        radix_sort_u32(&mut keys);
        assert!(keys.is_empty());

        let mut keys = vec![42u32];
        radix_sort_u32(&mut keys);
        assert_eq!(keys, vec![42u32]);
    }

    #[test]
    fn radix_sort_matches_std_sort_many_sizes() {
        let mut rng = Rng(0x1234_5678);
        for &n in &[2usize, 3, 7, 31, 32, 33, 64, 65, 129, 1024] {
            let mut keys: Vec<u32> = (0..n).map(|_| rng.next_u32() & 0x00FF_FFFF).collect();
            let mut expected = keys.clone();
            expected.sort_unstable();

            radix_sort_u32(&mut keys);

            assert_sorted(&keys);
            assert_eq!(keys, expected, "mismatch at n={n}");
        }
    }

    #[test]
    fn radix_sort_extremes() {
        let mut keys = vec![0u32, u32::MAX, 1, u32::MAX - 1, 0, 2, u32::MAX];
        keys.extend((0..40).rev());
        let mut expected = keys.clone();
        expected.sort_unstable();
        radix_sort_u32(&mut keys);
        assert_eq!(keys, expected);
    }

    #[test]
    fn sort_dedup_removes_repeats() {
        let mut keys = vec![5u32, 1, 5, 3, 1, 0];
        assert_eq!(sort_dedup_u32(&mut keys), 4);
        assert_eq!(keys, vec![0, 1, 3, 5]);
    }
}
