//! Query-time scoring over one field's catalog.
//!
//! Both rankers open their own [`ShardReader`] and drop it before returning,
//! and keep per-document accumulators local to the call.

use crate::reader::ShardReader;
use crate::{DocId, FieldIndex, IndexCatalog, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Rank documents by how many distinct query tokens they contain.
///
/// Term frequency is ignored and repeated query tokens count once. Ties are
/// broken by ascending document id.
pub fn binary_ranking(tokens: &[String], catalog: &IndexCatalog, folder: &Path) -> Result<Vec<(DocId, u32)>> {
    let mut reader = ShardReader::new(folder);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut counts: HashMap<DocId, u32> = HashMap::new();
    for token in tokens {
        if !seen.insert(token.as_str()) {
            continue;
        }
        let Some(postings) = catalog.read_posting_list(token, &mut reader)? else {
            continue;
        };
        for p in postings {
            *counts.entry(p.doc_id).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<(DocId, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    tracing::debug!(tokens = tokens.len(), hits = ranked.len(), "binary ranking");
    Ok(ranked)
}

/// Length-normalised term frequencies and the idf of one query token.
#[derive(Debug, Clone, PartialEq)]
pub struct TermWeights {
    pub term: String,
    pub idf: f64,
    pub tf: Vec<(DocId, f64)>,
}

pub fn idf(num_docs: u32, df: u32) -> f64 {
    ((num_docs as f64 + 1.0) / (df as f64 + 1.0)).log2()
}

/// Per-token statistics for TF-IDF scoring, one entry per distinct known
/// token in query order. A token whose posting list names a document without
/// a positive recorded length is skipped entirely.
pub fn term_weights(tokens: &[String], catalog: &IndexCatalog, reader: &mut ShardReader) -> Result<Vec<TermWeights>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for token in tokens {
        if !seen.insert(token.as_str()) {
            continue;
        }
        let Some(postings) = catalog.read_posting_list(token, reader)? else {
            continue;
        };
        let tf: Option<Vec<(DocId, f64)>> = postings
            .iter()
            .map(|p| match catalog.doc_len(p.doc_id) {
                Some(len) if len > 0 => Some((p.doc_id, p.tf as f64 / len as f64)),
                _ => None,
            })
            .collect();
        let Some(tf) = tf else {
            tracing::debug!(term = token.as_str(), "posting list names a document without length, skipping term");
            continue;
        };
        out.push(TermWeights { term: token.clone(), idf: idf(catalog.num_docs, postings.len() as u32), tf });
    }
    Ok(out)
}

/// TF-IDF ranking: `sum(tf * idf) / (DL[doc] * tokens.len())` per document,
/// highest first, ties by ascending document id.
///
/// The divisor counts every query token, including repeats and tokens
/// missing from the index.
pub fn cosine_ranking(tokens: &[String], catalog: &IndexCatalog, folder: &Path) -> Result<Vec<(DocId, f64)>> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    let mut reader = ShardReader::new(folder);
    let weights = term_weights(tokens, catalog, &mut reader)?;
    drop(reader);

    let mut scores: HashMap<DocId, f64> = HashMap::new();
    for w in &weights {
        for &(doc_id, tf) in &w.tf {
            *scores.entry(doc_id).or_insert(0.0) += tf * w.idf;
        }
    }
    let query_len = tokens.len() as f64;
    let mut ranked: Vec<(DocId, f64)> = scores
        .into_iter()
        .map(|(doc_id, score)| {
            // every scored doc passed the length check in term_weights
            let len = catalog.doc_len(doc_id).unwrap_or(1) as f64;
            (doc_id, score / (len * query_len))
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    tracing::debug!(tokens = tokens.len(), terms = weights.len(), hits = ranked.len(), "tf-idf ranking");
    Ok(ranked)
}

impl FieldIndex {
    pub fn binary_ranking(&self, tokens: &[String]) -> Result<Vec<(DocId, u32)>> {
        binary_ranking(tokens, &self.catalog, &self.folder)
    }

    pub fn cosine_ranking(&self, tokens: &[String]) -> Result<Vec<(DocId, f64)>> {
        cosine_ranking(tokens, &self.catalog, &self.folder)
    }
}
