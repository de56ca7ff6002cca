//! Solver constants and state-indexing functions.
//!
//! A DP state is (i, j, k): `i` items accepted so far, `j` rounds remaining,
//! `k` the grid index of the remaining price budget. Both state arrays are
//! stored flat in `state_index` order, which keeps every budget variant of a
//! given (i, j) pair contiguous (M × f64 per pair).

/// Default number of rounds (offers) when none is given.
pub const DEFAULT_ROUNDS: usize = 3;

/// Default number of grid points on [0, 1].
pub const DEFAULT_GRID_POINTS: usize = 500;

/// Storage format magic number: "PRDP" read as a little-endian u32.
pub const TABLE_FILE_MAGIC: u32 = 0x5044_5250;

/// Storage format version.
pub const TABLE_FILE_VERSION: u32 = 1;

/// Fixed header size of a table file, in bytes.
pub const TABLE_HEADER_BYTES: usize = 32;

/// Tolerance for float comparisons in invariant checks.
pub const VALUE_EPSILON: f64 = 1e-12;

/// Number of slots in each state array for `n` rounds and `m` grid points:
/// (n+1) × (n+1) × m. Returns `None` on overflow.
#[inline]
pub fn num_states(n: usize, m: usize) -> Option<usize> {
    let rows = n.checked_add(1)?;
    rows.checked_mul(rows)?.checked_mul(m)
}

/// STATE_INDEX(i, j, k) = (i · (n+1) + j) · m + k.
#[inline(always)]
pub fn state_index(i: usize, j: usize, k: usize, n: usize, m: usize) -> usize {
    (i * (n + 1) + j) * m + k
}
