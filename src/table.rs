use crate::builder::Builder;
use crate::error::MphError;
use crate::hash::HashKind;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Immutable minimal perfect hash table over a fixed key set.
///
/// Key `i` (in build order) is stored at canonical index `i`. A query walks
/// two levels:
///
/// ```text
/// i0   = hash(0, key)    & level0_mask
/// seed = level0[i0]
/// i1   = hash(seed, key) & level1_mask
/// idx  = level1[i1]        -> found iff keys[idx] == key
/// ```
///
/// Keys live in one contiguous pool (`pool[offsets[i]..offsets[i + 1]]`), so
/// the table never borrows from the caller.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "TableParts"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pool: Vec<u8>,
    offsets: Vec<usize>, // len == n + 1
    level0: Vec<u32>,    // power of 2 size, per-bucket seeds
    level0_mask: u32,
    level1: Vec<u32>, // power of 2 size >= n, canonical indices
    level1_mask: u32,
    hash: HashKind,
}

impl Table {
    /// Builds a table with the default [`BuildConfig`](crate::BuildConfig).
    pub fn build<K, I>(keys: I) -> Result<Self, MphError>
    where
        K: AsRef<[u8]>,
        I: IntoIterator<Item = K>,
    {
        Builder::new().build(keys)
    }

    pub(crate) fn from_parts(
        pool: Vec<u8>,
        offsets: Vec<usize>,
        level0: Vec<u32>,
        level1: Vec<u32>,
        hash: HashKind,
    ) -> Self {
        let level0_mask = (level0.len() - 1) as u32;
        let level1_mask = (level1.len() - 1) as u32;
        Self {
            pool,
            offsets,
            level0,
            level0_mask,
            level1,
            level1_mask,
            hash,
        }
    }

    /// O(1) lookup: returns the candidate index and whether `key` is a member.
    ///
    /// The index is only meaningful when the flag is `true`.
    #[inline]
    pub fn lookup(&self, key: impl AsRef<[u8]>) -> (u32, bool) {
        let key = key.as_ref();
        let i0 = (self.hash.hash(0, key) & self.level0_mask) as usize;
        let seed = self.level0_at(i0);
        let i1 = (self.hash.hash(seed, key) & self.level1_mask) as usize;
        let candidate = self.level1_at(i1);
        (candidate, self.key(candidate as usize) == Some(key))
    }

    /// Canonical index of `key`, or `None` if it was not in the build set.
    #[inline]
    pub fn index(&self, key: impl AsRef<[u8]>) -> Option<u32> {
        match self.lookup(key) {
            (i, true) => Some(i),
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, key: impl AsRef<[u8]>) -> bool {
        self.lookup(key).1
    }

    /// Key stored at canonical index `i`.
    #[inline]
    pub fn key(&self, i: usize) -> Option<&[u8]> {
        let start = *self.offsets.get(i)?;
        let end = *self.offsets.get(i + 1)?;
        self.pool.get(start..end)
    }

    /// Keys in canonical order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &[u8]> + '_ {
        self.offsets.windows(2).map(|w| &self.pool[w[0]..w[1]])
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn level0_len(&self) -> usize {
        self.level0.len()
    }

    pub fn level1_len(&self) -> usize {
        self.level1.len()
    }

    pub fn hash_kind(&self) -> HashKind {
        self.hash
    }

    /// Largest level-0 seed the build needed.
    pub fn max_seed(&self) -> u32 {
        self.level0.iter().copied().max().unwrap_or(0)
    }

    #[cfg(feature = "serde")]
    pub fn to_bytes(&self) -> Result<Vec<u8>, MphError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decodes a table written by [`Table::to_bytes`], rejecting inconsistent layouts.
    #[cfg(feature = "serde")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MphError> {
        let parts: TableParts = bincode::deserialize(bytes)?;
        Self::try_from(parts)
    }

    #[cfg(not(feature = "unsafe_optimizations"))]
    #[inline]
    fn level0_at(&self, i: usize) -> u32 {
        self.level0[i]
    }

    #[cfg(not(feature = "unsafe_optimizations"))]
    #[inline]
    fn level1_at(&self, i: usize) -> u32 {
        self.level1[i]
    }

    #[cfg(feature = "unsafe_optimizations")]
    #[inline]
    fn level0_at(&self, i: usize) -> u32 {
        // SAFETY: i is masked by level0_mask == level0.len() - 1
        unsafe { *self.level0.get_unchecked(i) }
    }

    #[cfg(feature = "unsafe_optimizations")]
    #[inline]
    fn level1_at(&self, i: usize) -> u32 {
        // SAFETY: i is masked by level1_mask == level1.len() - 1
        unsafe { *self.level1.get_unchecked(i) }
    }
}

/// Wire shape of [`Table`]; every decoded table passes through `TryFrom`.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct TableParts {
    pool: Vec<u8>,
    offsets: Vec<usize>,
    level0: Vec<u32>,
    level0_mask: u32,
    level1: Vec<u32>,
    level1_mask: u32,
    hash: HashKind,
}

#[cfg(feature = "serde")]
impl TryFrom<TableParts> for Table {
    type Error = MphError;

    fn try_from(p: TableParts) -> Result<Self, MphError> {
        let n = match p.offsets.len().checked_sub(1) {
            Some(n) => n,
            None => return Err(MphError::Corrupt("missing key offsets")),
        };
        if u32::try_from(n).is_err() {
            return Err(MphError::TooManyKeys(n));
        }
        if p.offsets[0] != 0
            || p.offsets.windows(2).any(|w| w[0] > w[1])
            || p.offsets[n] != p.pool.len()
        {
            return Err(MphError::Corrupt("key offsets out of order or out of range"));
        }
        if !p.level0.len().is_power_of_two() || p.level0_mask as usize != p.level0.len() - 1 {
            return Err(MphError::Corrupt("level0 size is not a power of two matching its mask"));
        }
        if !p.level1.len().is_power_of_two() || p.level1_mask as usize != p.level1.len() - 1 {
            return Err(MphError::Corrupt("level1 size is not a power of two matching its mask"));
        }
        if p.level1.len() < n {
            return Err(MphError::Corrupt("level1 smaller than key count"));
        }
        if p.level1.iter().any(|&i| i as usize >= n.max(1)) {
            return Err(MphError::Corrupt("level1 entry out of range"));
        }
        Ok(Table {
            pool: p.pool,
            offsets: p.offsets,
            level0: p.level0,
            level0_mask: p.level0_mask,
            level1: p.level1,
            level1_mask: p.level1_mask,
            hash: p.hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Table {
        Table::build(["a", "b", "c"]).unwrap()
    }

    #[test]
    fn three_keys_cover_range() {
        let t = abc();
        let mut seen = [false; 3];
        for k in ["a", "b", "c"] {
            let (i, found) = t.lookup(k);
            assert!(found, "{k} not found");
            assert!(!seen[i as usize], "index {i} reused");
            seen[i as usize] = true;
            assert_eq!(t.key(i as usize), Some(k.as_bytes()));
        }
        assert!(!t.contains("z"));
        assert_eq!(t.index("z"), None);
    }

    #[test]
    fn empty_table_finds_nothing() {
        let t = Table::build(Vec::<&str>::new()).unwrap();
        assert!(t.is_empty());
        assert_eq!(t.level0_len(), 1);
        assert_eq!(t.level1_len(), 1);
        assert!(!t.lookup("").1);
        assert!(!t.lookup("anything").1);
        assert_eq!(t.keys().count(), 0);
        assert_eq!(t.key(0), None);
    }

    #[test]
    fn empty_key_is_a_key() {
        let t = Table::build(["", "x"]).unwrap();
        assert!(t.contains(""));
        assert!(t.contains("x"));
        assert!(!t.contains("y"));
    }

    #[test]
    fn canonical_index_is_input_position() {
        let words = ["north", "south", "east", "west", "up", "down"];
        let t = Table::build(words).unwrap();
        for (i, w) in words.iter().enumerate() {
            assert_eq!(t.index(w), Some(i as u32));
        }
        let stored: Vec<&[u8]> = t.keys().collect();
        let expected: Vec<&[u8]> = words.iter().map(|w| w.as_bytes()).collect();
        assert_eq!(stored, expected);
    }

    #[test]
    fn str_and_bytes_agree() {
        let t = Table::build([b"k1".to_vec(), b"k2".to_vec()]).unwrap();
        assert_eq!(t.index("k1"), t.index(b"k1"));
        assert_eq!(t.index(String::from("k2")), Some(1));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn bytes_round_trip_preserves_lookups() {
        let t = abc();
        let bytes = t.to_bytes().unwrap();
        let back = Table::from_bytes(&bytes).unwrap();
        assert_eq!(back, t);
        assert_eq!(back.index("b"), t.index("b"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn from_bytes_rejects_bad_mask() {
        let mut t = abc();
        t.level1_mask += 1;
        let bytes = t.to_bytes().unwrap();
        assert!(matches!(Table::from_bytes(&bytes), Err(MphError::Corrupt(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn from_bytes_rejects_out_of_range_index() {
        let mut t = abc();
        t.level1[0] = 3;
        let bytes = t.to_bytes().unwrap();
        assert!(matches!(Table::from_bytes(&bytes), Err(MphError::Corrupt(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn from_bytes_rejects_truncated_input() {
        let bytes = abc().to_bytes().unwrap();
        assert!(matches!(
            Table::from_bytes(&bytes[..bytes.len() / 2]),
            Err(MphError::Serde(_))
        ));
    }
}
