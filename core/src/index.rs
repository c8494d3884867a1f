use crate::codec::{self, PostingEntry, TUPLE_SIZE};
use crate::reader::{Fragment, ShardReader};
use crate::{DocId, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Which part of an article an index was built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Body,
    Title,
    Anchor,
}

impl Field {
    /// Folder under the index root holding this field's catalog and shards.
    pub fn dir_name(self) -> &'static str {
        match self {
            Field::Body => "body",
            Field::Title => "title",
            Field::Anchor => "anchor",
        }
    }

    pub fn index_name(self) -> &'static str {
        match self {
            Field::Body => "body_index",
            Field::Title => "title_index",
            Field::Anchor => "anchor_index",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Immutable per-field metadata, loaded once and shared by every query.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct IndexCatalog {
    pub df: HashMap<String, u32>,
    pub posting_locs: HashMap<String, Vec<Fragment>>,
    /// Document lengths in tokens. Only the body field fills this in.
    pub dl: HashMap<DocId, u32>,
    pub num_docs: u32,
}

/// What the catalog knows about one term.
#[derive(Debug, Clone, Copy)]
pub struct TermEntry<'a> {
    pub df: u32,
    pub locs: &'a [Fragment],
}

impl TermEntry<'_> {
    pub fn byte_len(&self) -> usize {
        self.df as usize * TUPLE_SIZE
    }
}

impl IndexCatalog {
    pub fn new() -> Self { Self::default() }

    /// `None` when the term never occurs in this field.
    pub fn lookup(&self, term: &str) -> Option<TermEntry<'_>> {
        let df = *self.df.get(term)?;
        if df == 0 {
            return None;
        }
        let locs = self.posting_locs.get(term).map(Vec::as_slice).unwrap_or(&[]);
        Some(TermEntry { df, locs })
    }

    pub fn doc_len(&self, doc_id: DocId) -> Option<u32> {
        self.dl.get(&doc_id).copied()
    }

    pub fn num_terms(&self) -> usize {
        self.df.len()
    }

    /// Decode a term's posting list. `Ok(None)` for unknown terms; read
    /// failures for known terms are errors.
    pub fn read_posting_list(&self, term: &str, reader: &mut ShardReader) -> Result<Option<Vec<PostingEntry>>> {
        let Some(entry) = self.lookup(term) else {
            return Ok(None);
        };
        let bytes = reader.read(entry.locs, entry.byte_len())?;
        codec::decode(&bytes, entry.df as usize).map(Some)
    }
}

/// A catalog together with the folder its shards live in.
#[derive(Debug, Clone)]
pub struct FieldIndex {
    pub field: Field,
    pub catalog: IndexCatalog,
    pub folder: PathBuf,
}

impl FieldIndex {
    pub fn new<P: AsRef<Path>>(field: Field, catalog: IndexCatalog, folder: P) -> Self {
        Self { field, catalog, folder: folder.as_ref().to_path_buf() }
    }

    pub fn reader(&self) -> ShardReader {
        ShardReader::new(&self.folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_skips_unknown_and_zero_df() {
        let mut catalog = IndexCatalog::new();
        catalog.df.insert("dog".into(), 2);
        catalog.df.insert("ghost".into(), 0);
        catalog.posting_locs.insert("dog".into(), vec![Fragment::new("0.bin", 0, 12)]);

        let dog = catalog.lookup("dog").unwrap();
        assert_eq!(dog.df, 2);
        assert_eq!(dog.byte_len(), 12);
        assert!(catalog.lookup("ghost").is_none());
        assert!(catalog.lookup("cat").is_none());
    }

    #[test]
    fn unknown_term_reads_as_none() {
        let catalog = IndexCatalog::new();
        let mut reader = ShardReader::new("/nonexistent");
        assert!(catalog.read_posting_list("cat", &mut reader).unwrap().is_none());
        assert_eq!(reader.open_shards(), 0);
    }

    #[test]
    fn field_folders() {
        assert_eq!(Field::Body.dir_name(), "body");
        assert_eq!(Field::Anchor.to_string(), "anchor");
        assert_eq!(Field::Title.index_name(), "title_index");
    }
}
