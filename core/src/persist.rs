use crate::codec;
use crate::reader::Fragment;
use crate::{DocId, Field, FieldIndex, IndexCatalog};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

/// The bincode payload of `<index_name>.catalog.bin`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    pub df: HashMap<String, u32>,
    pub posting_locs: HashMap<String, Vec<Fragment>>,
    pub dl: HashMap<DocId, u32>,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn field_dir(&self, field: Field) -> PathBuf { self.root.join(field.dir_name()) }
}

fn catalog_file(folder: &Path, index_name: &str) -> PathBuf {
    folder.join(format!("{index_name}.catalog.bin"))
}

pub fn save_catalog(folder: &Path, index_name: &str, catalog: &CatalogFile) -> Result<()> {
    create_dir_all(folder)?;
    let mut f = BufWriter::new(File::create(catalog_file(folder, index_name))?);
    bincode::serialize_into(&mut f, catalog)?;
    f.flush()?;
    Ok(())
}

pub fn save_meta(folder: &Path, meta: &MetaFile) -> Result<()> {
    create_dir_all(folder)?;
    let mut f = File::create(folder.join("meta.json"))?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(folder: &Path) -> Result<MetaFile> {
    let mut f = File::open(folder.join("meta.json"))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Load the catalog named `index_name` from `folder`.
///
/// The corpus size comes from `meta.json` when present; otherwise it is the
/// number of documents with a recorded length. A meta file that exists but
/// cannot be read or parsed is an error.
pub fn read_index(folder: &Path, index_name: &str) -> Result<IndexCatalog> {
    let path = catalog_file(folder, index_name);
    let f = File::open(&path).with_context(|| format!("opening catalog {}", path.display()))?;
    let file: CatalogFile = bincode::deserialize_from(BufReader::new(f))
        .with_context(|| format!("decoding catalog {}", path.display()))?;
    let meta_path = folder.join("meta.json");
    let num_docs = if meta_path.exists() {
        load_meta(folder).with_context(|| format!("reading {}", meta_path.display()))?.num_docs
    } else {
        tracing::warn!(index_name, "no meta.json, using document length table for corpus size");
        file.dl.len() as u32
    };
    let catalog = IndexCatalog { df: file.df, posting_locs: file.posting_locs, dl: file.dl, num_docs };
    tracing::info!(index_name, terms = catalog.num_terms(), num_docs, "loaded catalog");
    Ok(catalog)
}

pub fn load_field(paths: &IndexPaths, field: Field) -> Result<FieldIndex> {
    let folder = paths.field_dir(field);
    let catalog = read_index(&folder, field.index_name()).with_context(|| format!("loading {field} index"))?;
    Ok(FieldIndex::new(field, catalog, folder))
}

/// Appends posting bytes to numbered shard files of bounded size, splitting a
/// list across shards when the current one fills up.
pub struct ShardWriter {
    dir: PathBuf,
    prefix: String,
    capacity: u64,
    next_shard: usize,
    current: Option<(String, BufWriter<File>, u64)>,
}

impl ShardWriter {
    pub fn new<P: AsRef<Path>>(dir: P, prefix: &str, capacity: u64) -> Self {
        Self { dir: dir.as_ref().to_path_buf(), prefix: prefix.to_string(), capacity: capacity.max(1), next_shard: 0, current: None }
    }

    pub fn write(&mut self, mut bytes: &[u8]) -> Result<Vec<Fragment>> {
        let mut locs = Vec::new();
        while !bytes.is_empty() {
            if self.current.as_ref().map_or(true, |(_, _, used)| *used >= self.capacity) {
                self.roll()?;
            }
            let Some((name, file, used)) = self.current.as_mut() else { break };
            let n = ((self.capacity - *used) as usize).min(bytes.len());
            file.write_all(&bytes[..n])?;
            locs.push(Fragment::new(name.clone(), *used, n as u64));
            *used += n as u64;
            bytes = &bytes[n..];
        }
        Ok(locs)
    }

    pub fn finish(mut self) -> Result<()> {
        if let Some((_, mut file, _)) = self.current.take() {
            file.flush()?;
        }
        Ok(())
    }

    fn roll(&mut self) -> Result<()> {
        if let Some((_, mut file, _)) = self.current.take() {
            file.flush()?;
        }
        let name = format!("{}_{:03}.bin", self.prefix, self.next_shard);
        self.next_shard += 1;
        let file = BufWriter::new(File::create(self.dir.join(&name))?);
        self.current = Some((name, file, 0));
        Ok(())
    }
}

/// Write a complete field index: shards, catalog and meta file. Used to build
/// fixtures; production indexes come from the offline pipeline.
pub fn write_field_index(
    paths: &IndexPaths,
    field: Field,
    postings: &BTreeMap<String, Vec<(DocId, u32)>>,
    dl: &HashMap<DocId, u32>,
    num_docs: u32,
    shard_capacity: u64,
) -> Result<FieldIndex> {
    let folder = paths.field_dir(field);
    create_dir_all(&folder)?;
    let mut writer = ShardWriter::new(&folder, field.dir_name(), shard_capacity);
    let mut file = CatalogFile { dl: dl.clone(), ..CatalogFile::default() };
    for (term, list) in postings {
        let locs = writer.write(&codec::encode(list))?;
        file.df.insert(term.clone(), list.len() as u32);
        file.posting_locs.insert(term.clone(), locs);
    }
    writer.finish()?;
    save_catalog(&folder, field.index_name(), &file)?;
    let meta = MetaFile {
        num_docs,
        created_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into()),
        version: 1,
    };
    save_meta(&folder, &meta)?;
    load_field(paths, field)
}
