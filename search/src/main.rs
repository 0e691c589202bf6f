use anyhow::Result;
use clap::Parser;
use sift_core::corpus::{load_manifest, ArtifactPaths};
use sift_core::index::ensure_postings;
use sift_core::query::Query;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "sift-search")]
#[command(about = "Evaluate a boolean token expression against the inverted index")]
struct Cli {
    /// Whitespace-delimited expression, e.g. "web & !archive | news"
    expression: String,
    /// Artifacts directory holding index.txt, tokens/ and inverted-index.txt
    #[arg(long, default_value = "./artifacts")]
    artifacts: String,
    /// Rebuild the postings file before evaluating
    #[arg(long, default_value_t = false)]
    rebuild: bool,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    let paths = ArtifactPaths::new(&args.artifacts);
    let manifest = load_manifest(&paths)?;
    // A missing postings file triggers a build here; a build failure is fatal
    // for the run rather than producing a partial answer.
    let postings = ensure_postings(&paths, &manifest, args.rebuild)?;

    let query = Query::parse(&args.expression)?;
    for id in query.eval(&postings, &manifest) {
        match manifest.get(&id) {
            Some(url) => println!("{id} - {url}"),
            None => tracing::warn!(id, "postings reference a document missing from the manifest"),
        }
    }
    Ok(())
}
