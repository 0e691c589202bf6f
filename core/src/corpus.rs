use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::DocId;

/// One artifacts directory shared by every stage of the pipeline.
pub struct ArtifactPaths {
    pub root: PathBuf,
}

impl ArtifactPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.root.join("pages")
    }

    pub fn page(&self, id: DocId) -> PathBuf {
        self.pages_dir().join(format!("{id}.txt"))
    }

    /// Manifest: `"<id> - <url>"` per saved document, append-only.
    pub fn manifest(&self) -> PathBuf {
        self.root.join("index.txt")
    }

    /// Token files are produced by an external tokenizer, one token per line.
    pub fn tokens_dir(&self) -> PathBuf {
        self.root.join("tokens")
    }

    pub fn token_file(&self, id: DocId) -> PathBuf {
        self.tokens_dir().join(format!("{id}.txt"))
    }

    pub fn postings(&self) -> PathBuf {
        self.root.join("inverted-index.txt")
    }

    pub fn build_meta(&self) -> PathBuf {
        self.root.join("index-meta.json")
    }
}

/// Writes corpus pages and appends manifest entries for one crawl run.
pub struct CorpusWriter {
    paths: ArtifactPaths,
    manifest: BufWriter<File>,
}

impl CorpusWriter {
    /// Refuses to open a directory that already holds a manifest: document
    /// ids are never renumbered or reused, so a partial crawl cannot be
    /// silently continued or overwritten.
    pub fn create(paths: ArtifactPaths) -> Result<Self> {
        if paths.manifest().exists() {
            bail!(
                "manifest {} already exists; crawl into a fresh artifacts directory",
                paths.manifest().display()
            );
        }
        fs::create_dir_all(paths.pages_dir())
            .with_context(|| format!("creating {}", paths.pages_dir().display()))?;
        let manifest = OpenOptions::new()
            .create(true)
            .append(true)
            .open(paths.manifest())
            .with_context(|| format!("opening {}", paths.manifest().display()))?;
        Ok(Self {
            paths,
            manifest: BufWriter::new(manifest),
        })
    }

    /// Persists one document: the filtered words space-joined under
    /// `pages/<id>.txt`, then its manifest line. The manifest is flushed per
    /// entry so a crash never loses a page that was already written.
    pub fn save(&mut self, id: DocId, url: &str, words: &[String]) -> Result<()> {
        let page = self.paths.page(id);
        fs::write(&page, words.join(" ")).with_context(|| format!("writing {}", page.display()))?;
        writeln!(self.manifest, "{id} - {url}")?;
        self.manifest.flush()?;
        Ok(())
    }
}

/// Loads the manifest as `id -> url`, in id order.
pub fn load_manifest(paths: &ArtifactPaths) -> Result<BTreeMap<DocId, String>> {
    let path = paths.manifest();
    let raw = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let mut entries = BTreeMap::new();
    for (lineno, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (id, url) = line
            .split_once(" - ")
            .with_context(|| format!("manifest line {}: expected `<id> - <url>`", lineno + 1))?;
        let id: DocId = id
            .trim()
            .parse()
            .with_context(|| format!("manifest line {}: bad document id", lineno + 1))?;
        entries.insert(id, url.to_string());
    }
    Ok(entries)
}
