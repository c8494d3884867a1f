use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

/// Neighbours kept per query token.
pub const NEIGHBORS_PER_TOKEN: usize = 2;

/// Nearest-neighbour lookup in a term embedding space.
pub trait Neighbors: Send + Sync {
    /// Up to `k` terms closest to `term`, most similar first. `None` when the
    /// term is not in the vocabulary.
    fn most_similar(&self, term: &str, k: usize) -> Option<Vec<(String, f32)>>;
}

/// Word vectors in GloVe text format, normalised to unit length on load.
pub struct GloveEmbeddings {
    vocab: HashMap<String, usize>,
    words: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl GloveEmbeddings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("opening embeddings {}", path.display()))?;
        Self::from_reader(BufReader::new(f))
    }

    /// One `word v1 v2 ... vd` entry per line. A leading word2vec-style
    /// `<count> <dim>` header is ignored, and rows that do not parse as a word
    /// followed by floats are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut entries = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if lineno == 0 && is_header(&line) {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };
            match parts.map(str::parse::<f32>).collect::<std::result::Result<Vec<_>, _>>() {
                Ok(vector) => entries.push((word.to_string(), vector)),
                Err(err) => tracing::warn!(line = lineno + 1, error = %err, "skipping unparsable embedding row"),
            }
        }
        Ok(Self::from_vectors(entries))
    }

    /// Rows are kept when their width matches the first non-empty row.
    pub fn from_vectors<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<f32>)>,
    {
        let mut emb = Self { vocab: HashMap::new(), words: Vec::new(), vectors: Vec::new() };
        let mut dim = None;
        for (word, mut vector) in entries {
            if vector.is_empty() || *dim.get_or_insert(vector.len()) != vector.len() {
                tracing::warn!(word = %word, len = vector.len(), "skipping embedding with unexpected width");
                continue;
            }
            let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
            if norm > 0.0 {
                vector.iter_mut().for_each(|v| *v /= norm);
            }
            if emb.vocab.contains_key(&word) {
                continue;
            }
            emb.vocab.insert(word.clone(), emb.words.len());
            emb.words.push(word);
            emb.vectors.push(vector);
        }
        tracing::info!(terms = emb.words.len(), "loaded embeddings");
        emb
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn is_header(line: &str) -> bool {
    let parts: Vec<&str> = line.split_whitespace().collect();
    parts.len() == 2 && parts.iter().all(|p| p.parse::<u64>().is_ok())
}

impl Neighbors for GloveEmbeddings {
    fn most_similar(&self, term: &str, k: usize) -> Option<Vec<(String, f32)>> {
        let &idx = self.vocab.get(term)?;
        let query = &self.vectors[idx];
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(i, v)| (i, v.iter().zip(query).map(|(a, b)| a * b).sum()))
            .collect();
        let by_score = |a: &(usize, f32), b: &(usize, f32)| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0));
        if k == 0 {
            return Some(Vec::new());
        }
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_score);
            scored.truncate(k);
        }
        scored.sort_by(by_score);
        Some(scored.into_iter().map(|(i, s)| (self.words[i].clone(), s)).collect())
    }
}

/// Appends embedding neighbours of each token to a query.
#[derive(Clone)]
pub struct QueryExpander {
    model: Arc<dyn Neighbors>,
    per_token: usize,
}

impl QueryExpander {
    pub fn new(model: Arc<dyn Neighbors>) -> Self {
        Self { model, per_token: NEIGHBORS_PER_TOKEN }
    }

    /// The original tokens in order, followed by each token's neighbours in
    /// the order the tokens were visited. Tokens outside the vocabulary add
    /// nothing. Duplicates are kept.
    pub fn expand(&self, tokens: &[String]) -> Vec<String> {
        let mut out = tokens.to_vec();
        for token in tokens {
            match self.model.most_similar(token, self.per_token) {
                Some(similar) => out.extend(similar.into_iter().take(self.per_token).map(|(w, _)| w)),
                None => tracing::debug!(token = token.as_str(), "no embedding for token"),
            }
        }
        out
    }
}
