//! Radix bit-slicing (`spec.md` §4.B) and the derived partition layout
//! constants (`spec.md` §6 "Constants").

/// `radix(key, shift, bits) = (key >> shift) & ((1 << bits) - 1)`.
///
/// No cryptographic mixing: the bucket a key lands in is a plain slice of
/// its bit pattern.
#[inline(always)]
pub fn radix(key: i32, shift: u32, bits: u32) -> usize {
    if bits == 0 {
        return 0;
    }
    let mask = (1u32 << bits) - 1;
    (((key as u32) >> shift) & mask) as usize
}

/// How `NUM_RADIX_BITS` low bits are split across the two passes. Pass-1
/// consumes the upper `d1` bits (shift = `d2`), pass-2 the lower `d2` bits
/// (shift = 0); together they are a bijection on the `d1 + d2` low bits, as
/// required by §4.B.
#[derive(Clone, Copy, Debug)]
pub struct RadixBits {
    pub d1: u32,
    pub d2: u32,
}

impl RadixBits {
    /// Split `total` bits evenly (pass-1 gets the extra bit when `total` is odd).
    pub fn two_pass(total: u32) -> Self {
        let d1 = (total + 1) / 2;
        let d2 = total - d1;
        RadixBits { d1, d2 }
    }

    /// Single-pass: all bits are consumed by pass 1, pass 2 is a no-op.
    pub fn single_pass(total: u32) -> Self {
        RadixBits { d1: total, d2: 0 }
    }

    /// Derive the pass split from a run's configuration. `radix_bits_2`
    /// (the CLI's `--radix-bits B1,B2` form) fixes both pass widths
    /// explicitly; otherwise `radix_bits` is a total split evenly across
    /// passes (`--radix-bits B`).
    pub fn from_config(radix_bits: u32, radix_bits_2: Option<u32>, num_passes: u8) -> Self {
        match (num_passes, radix_bits_2) {
            (1, _) => Self::single_pass(radix_bits),
            (_, Some(d2)) => RadixBits { d1: radix_bits, d2 },
            (_, None) => Self::two_pass(radix_bits),
        }
    }

    pub fn fanout_pass1(&self) -> usize {
        1usize << self.d1
    }

    pub fn fanout_pass2(&self) -> usize {
        1usize << self.d2
    }

    #[inline(always)]
    pub fn bucket_pass1(&self, key: i32) -> usize {
        radix(key, self.d2, self.d1)
    }

    #[inline(always)]
    pub fn bucket_pass2(&self, key: i32) -> usize {
        radix(key, 0, self.d2)
    }
}

pub const CACHE_LINE_SIZE: usize = 64;

/// Cache-line-aligned padding discipline (`spec.md` §4.H / §6), derived from
/// a fixed tuple size and the pass fan-outs.
#[derive(Clone, Copy, Debug)]
pub struct PartitionLayout {
    pub tuples_per_cache_line: usize,
    pub small_padding_tuples: usize,
    pub padding_tuples: usize,
    pub relation_padding_tuples: usize,
}

impl PartitionLayout {
    pub fn new(radix_bits: &RadixBits, tuple_size: usize) -> Self {
        let tuples_per_cache_line = CACHE_LINE_SIZE / tuple_size;
        let small_padding_tuples = 3 * tuples_per_cache_line;
        let padding_tuples = small_padding_tuples * (radix_bits.fanout_pass2() + 1);
        let relation_padding_tuples = padding_tuples * radix_bits.fanout_pass1();
        PartitionLayout {
            tuples_per_cache_line,
            small_padding_tuples,
            padding_tuples,
            relation_padding_tuples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radix_extracts_bit_slice() {
        // key = 0b1011_0110, bits [2,5) = 0b101 = 5
        assert_eq!(radix(0b1011_0110, 2, 3), 0b101);
    }

    #[test]
    fn radix_bits_split_is_bijective_on_low_bits() {
        let rb = RadixBits::two_pass(6);
        assert_eq!(rb.d1 + rb.d2, 6);
        // every combination of (pass1 bucket, pass2 bucket) maps to a
        // distinct low-6-bits residual, and every residual is reachable.
        let mut seen = vec![false; 1 << 6];
        for low in 0u32..(1 << 6) {
            let key = low as i32;
            let b1 = rb.bucket_pass1(key);
            let b2 = rb.bucket_pass2(key);
            let idx = b1 * rb.fanout_pass2() + b2;
            assert!(!seen[idx]);
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn single_pass_has_zero_width_pass2() {
        let rb = RadixBits::single_pass(8);
        assert_eq!(rb.d1, 8);
        assert_eq!(rb.d2, 0);
        assert_eq!(rb.fanout_pass2(), 1);
        assert_eq!(rb.bucket_pass2(12345), 0);
    }

    #[test]
    fn from_config_honors_explicit_pass2_width() {
        let even = RadixBits::from_config(8, None, 2);
        assert_eq!((even.d1, even.d2), (4, 4));

        let uneven = RadixBits::from_config(5, Some(3), 2);
        assert_eq!((uneven.d1, uneven.d2), (5, 3));

        let single = RadixBits::from_config(8, Some(3), 1);
        assert_eq!((single.d1, single.d2), (8, 0));
    }
}
