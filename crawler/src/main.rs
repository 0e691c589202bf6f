mod crawl;
mod fetch;

use anyhow::Result;
use clap::Parser;
use sift_core::corpus::{ArtifactPaths, CorpusWriter};
use sift_core::extract::Alphabet;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use crawl::{CrawlConfig, Crawler};
use fetch::HttpFetcher;

#[derive(Parser)]
#[command(name = "sift-crawler")]
#[command(about = "Crawl seed URLs breadth-first into a plain-text corpus")]
struct Cli {
    /// Seed URLs; with fewer seeds than --target-pages, outbound links are
    /// followed breadth-first to reach the target
    #[arg(required = true)]
    seeds: Vec<String>,
    /// Artifacts directory (corpus pages and the manifest are written here)
    #[arg(long, default_value = "./artifacts")]
    artifacts: String,
    /// Stop after saving this many documents
    #[arg(long, default_value_t = 100)]
    target_pages: u32,
    /// Minimum filtered-word count for a page to be saved
    #[arg(long, default_value_t = 1000)]
    min_words: usize,
    /// Alphabet the corpus targets (latin or cyrillic)
    #[arg(long, default_value = "latin")]
    alphabet: Alphabet,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// User-Agent string sent with every request
    #[arg(long, default_value = "sift-crawler/0.1 (+https://example.com/bot)")]
    user_agent: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Cli::parse();

    let writer = CorpusWriter::create(ArtifactPaths::new(&args.artifacts))?;
    let fetcher = HttpFetcher::new(&args.user_agent, Duration::from_secs(args.timeout_secs))?;
    let config = CrawlConfig {
        target_pages: args.target_pages,
        min_words: args.min_words,
        alphabet: args.alphabet,
    };

    let mut crawler = Crawler::new(fetcher, config, writer, &args.seeds);
    let summary = crawler.run().await?;
    tracing::info!(
        saved = summary.saved,
        visited = summary.visited,
        frontier_left = summary.frontier_left,
        "crawl finished"
    );
    Ok(())
}
