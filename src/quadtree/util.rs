use crate::Depth;

/// Number of tree levels needed to address a square of sidelength `size`.
///
/// This is `floor(log2(size)) + 1`, so the root of a tree of this depth always has a sidelength
/// strictly greater than `size`. A `size` of `0` needs no levels at all.
pub const fn depth_of(size: u64) -> Depth {
    u64::BITS - size.leading_zeros()
}

/// Integer exponentiation by squaring, saturating at `u64::MAX`.
pub const fn pow(mut base: u64, mut exp: u32) -> u64 {
    let mut acc: u64 = 1;

    while exp > 0 {
        if exp & 1 == 1 {
            acc = acc.saturating_mul(base);
        }

        exp >>= 1;
        if exp > 0 {
            base = base.saturating_mul(base);
        }
    }

    acc
}

/// Sidelength of a tree of depth `depth`, i.e. `2^depth`.
///
/// Unsigned, so the root of the deepest map an `i64` size can ask for (depth 63) still has a
/// positive side.
pub const fn pow2(depth: Depth) -> u64 {
    pow(2, depth)
}

/// Reduce `v` into a quadrant of sidelength `half`. A zero `half` leaves `v` as-is, since there is
/// nothing left to address.
pub(crate) const fn wrap(v: u64, half: u64) -> u64 {
    if half > 0 { v % half } else { v }
}
