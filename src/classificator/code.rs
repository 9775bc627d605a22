//! Bit packing of classification tree paths into type codes.
//!
//! A type code is a `u32` holding a root-to-node path as a sequence of
//! sibling indices, [`LEVEL_BITS`] bits each, most significant level first.
//! The root itself is not encoded. A sentinel bit above the topmost level
//! makes codes of different depth distinct: the empty code is `1` and every
//! push shifts it left. Truncating a code to an ancestor's depth therefore
//! yields exactly the ancestor's own code.

/// Bits per encoded level, i.e. sibling indices go up to [`MAX_INDEX`].
pub const LEVEL_BITS: u32 = 7;

/// Deepest path a `u32` can hold under this layout.
pub const MAX_DEPTH: usize = 4;

/// Largest sibling index a single level can encode.
pub const MAX_INDEX: u32 = (1 << LEVEL_BITS) - 1;

/// The code of the (implicit) root: a path of zero levels.
pub fn empty() -> u32 {
    1
}

/// Number of levels encoded in `code`.
pub fn depth(code: u32) -> usize {
    debug_assert!(code != 0, "type codes grow from empty(), never from 0");
    ((31 - code.leading_zeros()) / LEVEL_BITS) as usize
}

/// Append one level to `code`.
///
/// Overflowing the depth or the per-level index range means the
/// classification tree violates the packing layout, which is a
/// construction-time fault.
pub fn push(code: &mut u32, index: u32) {
    assert!(index <= MAX_INDEX, "sibling index {index} exceeds {MAX_INDEX}");
    assert!(
        depth(*code) < MAX_DEPTH,
        "type code depth exceeds {MAX_DEPTH}"
    );
    *code = (*code << LEVEL_BITS) | index;
}

/// Drop trailing levels until `code` is at most `level` levels deep.
pub fn trunc(code: &mut u32, level: usize) {
    while depth(*code) > level {
        *code >>= LEVEL_BITS;
    }
}

/// Sibling index at `level` (0-based from the root) of `code`.
pub fn index_at(code: u32, level: usize) -> u32 {
    let depth = depth(code);
    debug_assert!(level < depth);
    (code >> (LEVEL_BITS as usize * (depth - 1 - level))) & MAX_INDEX
}
