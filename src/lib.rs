//! hdc_mph — minimal perfect hash table by "hash, displace, and compress".
//!
//! - Build once on a set of **unique** keys (bytes/str).
//! - O(1) lookups: key -> its input position in `[0..n)`, verified by byte equality,
//!   so keys outside the build set are reported as absent.
//! - Deterministic: the same input order always yields the same table.

mod builder;
mod error;
mod hash;
mod table;
mod util;

pub use builder::{BuildConfig, Builder};
pub use error::MphError;
pub use hash::HashKind;
pub use table::Table;

/// Build a [`Table`] with the default [`BuildConfig`].
pub fn build<K, I>(keys: I) -> Result<Table, MphError>
where
    K: AsRef<[u8]>,
    I: IntoIterator<Item = K>,
{
    Builder::new().build(keys)
}
