use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// One contiguous slice of a term's posting bytes inside a shard file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub shard: String,
    pub offset: u64,
    pub len: u64,
}

impl Fragment {
    pub fn new(shard: impl Into<String>, offset: u64, len: u64) -> Self {
        Self { shard: shard.into(), offset, len }
    }
}

/// Reads posting bytes out of the shard files in one folder.
///
/// Handles opened by a reader are reused across fragments and terms for as
/// long as the reader lives, and all of them close when it is dropped. Rankers
/// create one reader per call, so nothing is shared between queries.
pub struct ShardReader {
    dir: PathBuf,
    open: HashMap<String, File>,
}

impl ShardReader {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self { dir: dir.as_ref().to_path_buf(), open: HashMap::new() }
    }

    /// Concatenate `locs` in order and check the result is `n_bytes` long.
    pub fn read(&mut self, locs: &[Fragment], n_bytes: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(n_bytes);
        for frag in locs {
            let file = self.shard(&frag.shard)?;
            file.seek(SeekFrom::Start(frag.offset))?;
            let got = file.by_ref().take(frag.len).read_to_end(&mut buf)? as u64;
            if got != frag.len {
                return Err(Error::ShortRead {
                    shard: frag.shard.clone(),
                    offset: frag.offset,
                    expected: frag.len,
                    actual: got,
                });
            }
        }
        if buf.len() != n_bytes {
            return Err(Error::LengthMismatch { expected: n_bytes, actual: buf.len() });
        }
        Ok(buf)
    }

    pub fn open_shards(&self) -> usize {
        self.open.len()
    }

    fn shard(&mut self, name: &str) -> Result<&mut File> {
        match self.open.entry(name.to_string()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let file = File::open(self.dir.join(name))
                    .map_err(|source| Error::ShardOpen { shard: name.to_string(), source })?;
                Ok(e.insert(file))
            }
        }
    }
}

/// Read one term's bytes with a reader scoped to this call.
pub fn read_posting_bytes(dir: &Path, locs: &[Fragment], n_bytes: usize) -> Result<Vec<u8>> {
    ShardReader::new(dir).read(locs, n_bytes)
}
