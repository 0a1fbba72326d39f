use thiserror::Error;

#[derive(Debug, Error)]
pub enum MphError {
    #[error("duplicate key detected during build (inputs {first} and {second})")]
    DuplicateKey { first: usize, second: usize },
    #[error("no perfect hash found: bucket {bucket} exhausted {attempts} seeds")]
    Unresolvable { bucket: usize, attempts: u64 },
    #[error("{0} keys exceed the u32 index space")]
    TooManyKeys(usize),
    #[error("malformed table: {0}")]
    Corrupt(&'static str),
    #[cfg(feature = "serde")]
    #[error("serialization error: {0}")]
    Serde(#[from] Box<bincode::ErrorKind>),
}
