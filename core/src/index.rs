use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use time::format_description::well_known::Rfc3339;

use crate::corpus::ArtifactPaths;
use crate::DocId;

/// Token -> documents containing it. `BTreeMap`/`BTreeSet` keep both the
/// token lines and the ids within a line sorted, so the emitted file is
/// deterministic.
pub type Postings = BTreeMap<String, BTreeSet<DocId>>;

pub const POSTINGS_VERSION: u32 = 1;

/// Sidecar written on every build, so the operator can tell how old a
/// postings file is without re-deriving it.
#[derive(Debug, Serialize, Deserialize)]
pub struct BuildMeta {
    pub num_docs: u32,
    pub distinct_tokens: usize,
    pub created_at: String,
    pub version: u32,
}

/// Builds postings from the manifest and the per-document token files. An
/// unreadable token file is fatal: a partially built index would silently
/// return incomplete results.
pub fn build_postings(
    manifest: &BTreeMap<DocId, String>,
    paths: &ArtifactPaths,
) -> Result<Postings> {
    let mut postings = Postings::new();
    for &id in manifest.keys() {
        let path = paths.token_file(id);
        let tokens =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        for token in tokens.lines() {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            postings.entry(token.to_string()).or_default().insert(id);
        }
    }
    tracing::info!(
        num_docs = manifest.len(),
        distinct_tokens = postings.len(),
        "postings built"
    );
    Ok(postings)
}

/// Emits `"<token> - <id1>, <id2>, ...\n"` per distinct token, sorted by
/// token, plus the build metadata sidecar.
pub fn write_postings(
    paths: &ArtifactPaths,
    postings: &Postings,
    num_docs: u32,
) -> Result<()> {
    let mut out = String::new();
    for (token, ids) in postings {
        let ids = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("{token} - {ids}\n"));
    }
    let path = paths.postings();
    fs::write(&path, out).with_context(|| format!("writing {}", path.display()))?;

    let meta = BuildMeta {
        num_docs,
        distinct_tokens: postings.len(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
        version: POSTINGS_VERSION,
    };
    let meta_path = paths.build_meta();
    fs::write(&meta_path, serde_json::to_string_pretty(&meta)?)
        .with_context(|| format!("writing {}", meta_path.display()))?;
    Ok(())
}

pub fn load_postings(paths: &ArtifactPaths) -> Result<Postings> {
    let path = paths.postings();
    let raw = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let mut postings = Postings::new();
    for (lineno, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (token, ids) = line
            .split_once(" - ")
            .with_context(|| format!("postings line {}: expected `<token> - <ids>`", lineno + 1))?;
        let set = postings.entry(token.to_string()).or_default();
        for id in ids.split(',') {
            let id = id.trim();
            if id.is_empty() {
                continue;
            }
            set.insert(
                id.parse()
                    .with_context(|| format!("postings line {}: bad document id", lineno + 1))?,
            );
        }
    }
    Ok(postings)
}

/// Cache policy for the postings file, made explicit: an existing file is
/// reused as-is unless `force` is set, and the reuse is logged so a stale
/// index is an operator decision rather than a silent one.
pub fn ensure_postings(
    paths: &ArtifactPaths,
    manifest: &BTreeMap<DocId, String>,
    force: bool,
) -> Result<Postings> {
    if paths.postings().exists() && !force {
        tracing::warn!(
            path = %paths.postings().display(),
            "reusing existing postings file; it is never refreshed automatically, force a rebuild to pick up new documents"
        );
        return load_postings(paths);
    }
    let postings = build_postings(manifest, paths)?;
    write_postings(paths, &postings, manifest.len() as u32)?;
    Ok(postings)
}
