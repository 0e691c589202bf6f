use anyhow::Result;
use clap::Parser;
use sift_core::corpus::{load_manifest, ArtifactPaths};
use sift_core::index::ensure_postings;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "sift-indexer")]
#[command(about = "Build the token -> documents postings file from the crawl manifest")]
struct Cli {
    /// Artifacts directory holding index.txt and tokens/
    #[arg(long, default_value = "./artifacts")]
    artifacts: String,
    /// Rebuild even if a postings file already exists
    #[arg(long, default_value_t = false)]
    force: bool,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    let paths = ArtifactPaths::new(&args.artifacts);
    let manifest = load_manifest(&paths)?;
    let postings = ensure_postings(&paths, &manifest, args.force)?;
    tracing::info!(
        num_docs = manifest.len(),
        distinct_tokens = postings.len(),
        "postings ready"
    );
    Ok(())
}
