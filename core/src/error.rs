use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures while turning stored posting bytes back into entries.
///
/// Every variant is fatal for the term being read; callers must not
/// substitute empty or partial posting lists.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot open shard {shard}: {source}")]
    ShardOpen {
        shard: String,
        #[source]
        source: io::Error,
    },

    #[error("short read from shard {shard} at offset {offset}: wanted {expected} bytes, got {actual}")]
    ShortRead {
        shard: String,
        offset: u64,
        expected: u64,
        actual: u64,
    },

    #[error("posting list length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("posting buffer of {len} bytes is not a whole number of entries")]
    MisalignedBuffer { len: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
