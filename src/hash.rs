use xxhash_rust::xxh3::xxh3_64_with_seed;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Seeded hash family used on both levels of the table.
///
/// `hash(0, key)` picks the level-0 bucket, `hash(seed, key)` with the bucket's
/// stored seed picks the level-1 slot. Every member is stable across runs and
/// platforms, so a serialized table stays valid.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HashKind {
    /// XXH3-64 with the seed widened to u64.
    #[default]
    Xxh3,
    /// wyhash with the seed widened to u64.
    WyHash,
}

impl HashKind {
    #[inline]
    pub fn hash(self, seed: u32, data: &[u8]) -> u32 {
        let h = match self {
            HashKind::Xxh3 => xxh3_64_with_seed(data, seed as u64),
            HashKind::WyHash => wyhash::wyhash(data, seed as u64),
        };
        fold32(h)
    }
}

/// Xor the halves so both contribute to the masked low bits.
#[inline]
fn fold32(h: u64) -> u32 {
    (h ^ (h >> 32)) as u32
}
