use crate::error::MphError;
use crate::hash::HashKind;
use crate::table::Table;
use crate::util::{SlotSet, next_pow2};
use ahash::RandomState;
use hashbrown::HashMap;

/// Build parameters.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Hash family for both levels. Stored in the table.
    pub hash: HashKind,
    /// How many seeds (0, 1, 2, ...) to try for a single bucket before the build fails.
    pub max_seed_attempts: u32,
    /// Reject byte-equal keys up front. Without the check, duplicates land in the
    /// same bucket, never fit, and surface as [`MphError::Unresolvable`].
    pub check_duplicates: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            hash: HashKind::Xxh3,
            max_seed_attempts: u32::MAX,
            check_duplicates: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Builder {
    cfg: BuildConfig,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            cfg: BuildConfig::default(),
        }
    }

    pub fn with_config(mut self, cfg: BuildConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Build the table. Key `i` of the input gets canonical index `i`.
    pub fn build<K, I>(self, keys: I) -> Result<Table, MphError>
    where
        K: AsRef<[u8]>,
        I: IntoIterator<Item = K>,
    {
        // 0) Copy into one pool so the table owns its keys.
        let mut pool = Vec::<u8>::new();
        let mut offsets = vec![0usize];
        for k in keys {
            pool.extend_from_slice(k.as_ref());
            offsets.push(pool.len());
        }
        let n = offsets.len() - 1;
        if u32::try_from(n).is_err() {
            return Err(MphError::TooManyKeys(n));
        }

        let views: Vec<&[u8]> = offsets.windows(2).map(|w| &pool[w[0]..w[1]]).collect();
        if self.cfg.check_duplicates {
            check_unique(&views)?;
        }
        let (level0, level1) = solve(&views, &self.cfg)?;
        drop(views);

        Ok(Table::from_parts(pool, offsets, level0, level1, self.cfg.hash))
    }
}

/// Exact byte comparison, no probabilistic shortcuts.
fn check_unique(keys: &[&[u8]]) -> Result<(), MphError> {
    let mut seen: HashMap<&[u8], usize, RandomState> =
        HashMap::with_capacity_and_hasher(keys.len(), RandomState::new());
    for (i, &k) in keys.iter().enumerate() {
        if let Some(first) = seen.insert(k, i) {
            log::warn!("duplicate key at inputs {first} and {i}");
            return Err(MphError::DuplicateKey { first, second: i });
        }
    }
    Ok(())
}

/// A non-empty level-0 bucket: `members[start..end]` are its key indices.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    index: usize,
    start: usize,
    end: usize,
}

impl Bucket {
    #[inline]
    fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Hash, displace, and compress.
/// Steps:
/// 1) size both levels
/// 2) partition keys by hash(0, key) into level-0 buckets (CSR layout)
/// 3) order buckets largest first, ties by bucket index
/// 4) per bucket, find the first seed whose level-1 slots are all free and distinct
fn solve(keys: &[&[u8]], cfg: &BuildConfig) -> Result<(Vec<u32>, Vec<u32>), MphError> {
    let n = keys.len();

    // 1) Sizes
    let l0 = next_pow2(n.div_ceil(4));
    let l1 = next_pow2(n);
    let mask0 = (l0 - 1) as u32;
    let mask1 = (l1 - 1) as u32;

    // 2) Partition: counts -> offsets -> flat member list
    let h0 = level0_hashes(keys, cfg.hash);
    let mut off = vec![0usize; l0 + 1];
    for &h in &h0 {
        off[(h & mask0) as usize + 1] += 1;
    }
    for b in 0..l0 {
        off[b + 1] += off[b];
    }
    let mut cur = off.clone();
    let mut members = vec![0u32; n];
    for (i, &h) in h0.iter().enumerate() {
        let b = (h & mask0) as usize;
        members[cur[b]] = i as u32;
        cur[b] += 1;
    }

    // 3) Largest first; the sort is stable so equal sizes keep ascending index.
    let mut order: Vec<Bucket> = (0..l0)
        .filter(|&b| off[b + 1] > off[b])
        .map(|b| Bucket {
            index: b,
            start: off[b],
            end: off[b + 1],
        })
        .collect();
    order.sort_by(|a, b| b.len().cmp(&a.len()));

    // 4) Displacement
    let mut occupied = SlotSet::new(l1);
    let mut level0 = vec![0u32; l0];
    let mut level1 = vec![0u32; l1];
    let mut trial: Vec<(usize, u32)> = Vec::with_capacity(order.first().map_or(0, Bucket::len));

    for bucket in &order {
        let items = &members[bucket.start..bucket.end];
        let seed = place_bucket(bucket, items, keys, mask1, &occupied, &mut trial, cfg)?;

        occupied.commit(trial.iter().map(|&(slot, _)| slot));
        for &(slot, i) in &trial {
            level1[slot] = i;
        }
        level0[bucket.index] = seed;
    }

    log::debug!(
        "mph built: n={n} level0={l0} level1={l1} buckets={} largest={} max_seed={} free_slots={}",
        order.len(),
        order.first().map_or(0, Bucket::len),
        level0.iter().copied().max().unwrap_or(0),
        occupied.free(),
    );
    debug_assert_eq!(occupied.taken(), n);

    Ok((level0, level1))
}

/// Searches seeds 0, 1, 2, ... for `items`. On success `trial` holds the
/// `(slot, key index)` pairs to commit; `occupied` is never touched here.
fn place_bucket(
    bucket: &Bucket,
    items: &[u32],
    keys: &[&[u8]],
    mask1: u32,
    occupied: &SlotSet,
    trial: &mut Vec<(usize, u32)>,
    cfg: &BuildConfig,
) -> Result<u32, MphError> {
    let mut seed = 0u32;
    let mut attempts = 0u64;
    loop {
        if attempts >= cfg.max_seed_attempts as u64 {
            log::warn!(
                "bucket {} (size {}) exhausted {attempts} seeds with {} free slots",
                bucket.index,
                items.len(),
                occupied.free(),
            );
            return Err(MphError::Unresolvable {
                bucket: bucket.index,
                attempts,
            });
        }
        attempts += 1;

        trial.clear();
        let fits = items.iter().all(|&i| {
            let slot = (cfg.hash.hash(seed, keys[i as usize]) & mask1) as usize;
            if occupied.is_taken(slot) || trial.iter().any(|&(s, _)| s == slot) {
                return false;
            }
            trial.push((slot, i));
            true
        });
        if fits {
            if seed >= 1 << 16 {
                log::trace!("bucket {} (size {}) needed seed {seed}", bucket.index, items.len());
            }
            return Ok(seed);
        }
        seed = seed.wrapping_add(1);
    }
}

/// hash(0, key) for every key (in parallel if the "parallel" feature is enabled).
fn level0_hashes(keys: &[&[u8]], hash: HashKind) -> Vec<u32> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        keys.par_iter().map(|k| hash.hash(0, k)).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        keys.iter().map(|k| hash.hash(0, k)).collect()
    }
}
