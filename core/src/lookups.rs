//! Per-document side tables served next to search results: titles, PageRank
//! and page views. They are loaded once and only read afterwards.

use crate::DocId;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Default, Clone)]
pub struct Lookups {
    pub titles: HashMap<DocId, String>,
    pub pagerank: HashMap<DocId, f64>,
    pub pageviews: HashMap<DocId, u64>,
}

impl Lookups {
    /// Empty string for unknown documents.
    pub fn title(&self, doc_id: DocId) -> &str {
        self.titles.get(&doc_id).map(String::as_str).unwrap_or("")
    }

    pub fn pagerank(&self, doc_id: DocId) -> f64 {
        self.pagerank.get(&doc_id).copied().unwrap_or(0.0)
    }

    pub fn pageviews(&self, doc_id: DocId) -> u64 {
        self.pageviews.get(&doc_id).copied().unwrap_or(0)
    }
}

pub fn load_titles(path: &Path) -> Result<HashMap<DocId, String>> {
    let f = File::open(path).with_context(|| format!("opening titles {}", path.display()))?;
    Ok(bincode::deserialize_from(BufReader::new(f))?)
}

pub fn save_titles(path: &Path, titles: &HashMap<DocId, String>) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut f, titles)?;
    f.flush()?;
    Ok(())
}

pub fn load_pageviews(path: &Path) -> Result<HashMap<DocId, u64>> {
    let f = File::open(path).with_context(|| format!("opening page views {}", path.display()))?;
    Ok(bincode::deserialize_from(BufReader::new(f))?)
}

pub fn save_pageviews(path: &Path, views: &HashMap<DocId, u64>) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut f, views)?;
    f.flush()?;
    Ok(())
}

/// PageRank scores from a gzip-compressed `doc_id,score` CSV.
pub fn load_pagerank(path: &Path) -> Result<HashMap<DocId, f64>> {
    let f = File::open(path).with_context(|| format!("opening pagerank {}", path.display()))?;
    parse_pagerank(BufReader::new(GzDecoder::new(f)))
}

fn parse_pagerank<R: BufRead>(reader: R) -> Result<HashMap<DocId, f64>> {
    let mut ranks = HashMap::new();
    for line in reader.lines() {
        let line = line?;
        let Some((id, score)) = line.trim().split_once(',') else { continue };
        match (id.trim().parse::<DocId>(), score.trim().parse::<f64>()) {
            (Ok(id), Ok(score)) => {
                ranks.insert(id, score);
            }
            _ => tracing::warn!(line = line.as_str(), "skipping unparsable pagerank row"),
        }
    }
    Ok(ranks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::tempdir;

    #[test]
    fn missing_ids_fall_back_to_defaults() {
        let lookups = Lookups::default();
        assert_eq!(lookups.title(5), "");
        assert_eq!(lookups.pagerank(5), 0.0);
        assert_eq!(lookups.pageviews(5), 0);
    }

    #[test]
    fn reads_gzipped_pagerank() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pr.csv.gz");
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(b"12,0.5\n7,1.25\nid,score\n").unwrap();
        enc.finish().unwrap();

        let pr = load_pagerank(&path).unwrap();
        assert_eq!(pr.len(), 2);
        assert_eq!(pr[&7], 1.25);
    }

    #[test]
    fn titles_and_views_round_trip() {
        let dir = tempdir().unwrap();
        let titles: HashMap<DocId, String> = [(1, "Dog".to_string())].into_iter().collect();
        let views: HashMap<DocId, u64> = [(1, 42)].into_iter().collect();
        save_titles(&dir.path().join("t.bin"), &titles).unwrap();
        save_pageviews(&dir.path().join("v.bin"), &views).unwrap();
        assert_eq!(load_titles(&dir.path().join("t.bin")).unwrap(), titles);
        assert_eq!(load_pageviews(&dir.path().join("v.bin")).unwrap(), views);
    }
}
