//! Read path of a Wikipedia-scale search service: posting-list decoding over
//! sharded files, query tokenization and expansion, and the binary-overlap and
//! TF-IDF rankers that sit on top of them.

pub mod classify;
pub mod codec;
pub mod error;
pub mod expand;
pub mod index;
pub mod lookups;
pub mod persist;
pub mod ranking;
pub mod reader;
pub mod tokenizer;

pub use error::{Error, Result};
pub use index::{Field, FieldIndex, IndexCatalog};

pub type DocId = u32;
