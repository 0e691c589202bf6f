use anyhow::Result;
use sift_core::corpus::CorpusWriter;
use sift_core::extract::{extract, extract_links, Alphabet};
use sift_core::urls::{canonicalize, has_forbidden_extension, identity_of, is_forbidden_host};
use std::collections::{HashSet, VecDeque};

use crate::fetch::{Fetch, FetchedPage};

pub struct CrawlConfig {
    pub target_pages: u32,
    pub min_words: usize,
    pub alphabet: Alphabet,
}

pub struct CrawlSummary {
    pub saved: u32,
    pub visited: usize,
    pub frontier_left: usize,
}

/// All mutable crawl state lives here; one crawler per run, nothing global.
///
/// The frontier holds canonical URLs and is strictly FIFO, so the walk is
/// breadth-first. The visited set holds identity keys and only ever grows:
/// a URL is marked visited the moment it is dequeued, before any fetch, so
/// a failed or skipped fetch can never be re-enqueued.
pub struct Crawler<F> {
    fetcher: F,
    config: CrawlConfig,
    writer: CorpusWriter,
    frontier: VecDeque<String>,
    visited: HashSet<String>,
    follow_links: bool,
    saved: u32,
}

impl<F: Fetch> Crawler<F> {
    /// Seeds are canonicalized up front. Link-following mode is decided once
    /// here: with fewer seeds than the page target, the seed list alone
    /// cannot satisfy the crawl and outbound links must be harvested.
    pub fn new(fetcher: F, config: CrawlConfig, writer: CorpusWriter, seeds: &[String]) -> Self {
        let frontier: VecDeque<String> = seeds.iter().map(|s| canonicalize(s)).collect();
        let follow_links = (seeds.len() as u32) < config.target_pages;
        Self {
            fetcher,
            config,
            writer,
            frontier,
            visited: HashSet::new(),
            follow_links,
            saved: 0,
        }
    }

    pub async fn run(&mut self) -> Result<CrawlSummary> {
        while self.saved < self.config.target_pages {
            let Some(url) = self.frontier.pop_front() else {
                break;
            };
            self.step(&url).await?;
        }
        Ok(CrawlSummary {
            saved: self.saved,
            visited: self.visited.len(),
            frontier_left: self.frontier.len(),
        })
    }

    async fn step(&mut self, url: &str) -> Result<()> {
        let identity = identity_of(url);
        if self.visited.contains(&identity) {
            return Ok(());
        }
        self.visited.insert(identity);

        if has_forbidden_extension(url) || is_forbidden_host(url) {
            tracing::debug!(url, "denylisted, not fetching");
            return Ok(());
        }

        tracing::info!(url, "fetching");
        let page: FetchedPage = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(url, error = %err, "fetch failed, skipping");
                return Ok(());
            }
        };
        if page.status != 200 {
            tracing::debug!(url, status = page.status, "non-200 response, skipping");
            return Ok(());
        }
        let Ok(body) = std::str::from_utf8(&page.body) else {
            tracing::warn!(url, "body is not valid utf-8, skipping");
            return Ok(());
        };

        let words = extract(body, self.config.alphabet);
        if words.len() >= self.config.min_words {
            self.saved += 1;
            self.writer.save(self.saved, url, &words)?;
            if self.saved % 100 == 0 {
                tracing::info!(
                    saved = self.saved,
                    visited = self.visited.len(),
                    frontier = self.frontier.len(),
                    "progress"
                );
            }
        } else {
            tracing::debug!(url, words = words.len(), "below word threshold, not saved");
        }

        // Pages below the threshold still contribute links: hub pages are
        // routinely thin, and dropping their edges strands the crawl.
        if self.follow_links {
            for link in extract_links(body) {
                if self.visited.contains(&identity_of(&link)) {
                    continue;
                }
                self.frontier.push_back(link);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use sift_core::corpus::{load_manifest, ArtifactPaths};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use tempfile::{tempdir, TempDir};

    struct StubFetcher {
        pages: HashMap<String, (u16, Vec<u8>)>,
        hits: Rc<RefCell<Vec<String>>>,
    }

    impl Fetch for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage> {
            self.hits.borrow_mut().push(url.to_string());
            match self.pages.get(url) {
                Some((status, body)) => Ok(FetchedPage {
                    status: *status,
                    body: body.clone(),
                }),
                None => Err(anyhow!("connection refused")),
            }
        }
    }

    fn page(word_count: usize, links: &[&str]) -> Vec<u8> {
        let mut html = String::from("<html><body><p>");
        for _ in 0..word_count {
            html.push_str("word ");
        }
        html.push_str("</p>");
        for link in links {
            html.push_str(&format!("<a href=\"{link}\">link</a>"));
        }
        html.push_str("</body></html>");
        html.into_bytes()
    }

    struct Fixture {
        dir: TempDir,
        hits: Rc<RefCell<Vec<String>>>,
        crawler: Crawler<StubFetcher>,
    }

    fn fixture(
        pages: &[(&str, u16, Vec<u8>)],
        seeds: &[&str],
        target_pages: u32,
        min_words: usize,
    ) -> Fixture {
        let dir = tempdir().unwrap();
        let hits = Rc::new(RefCell::new(Vec::new()));
        let fetcher = StubFetcher {
            pages: pages
                .iter()
                .map(|(url, status, body)| (url.to_string(), (*status, body.clone())))
                .collect(),
            hits: Rc::clone(&hits),
        };
        let writer = CorpusWriter::create(ArtifactPaths::new(dir.path())).unwrap();
        let config = CrawlConfig {
            target_pages,
            min_words,
            alphabet: Alphabet::Latin,
        };
        let seeds: Vec<String> = seeds.iter().map(|s| s.to_string()).collect();
        let crawler = Crawler::new(fetcher, config, writer, &seeds);
        Fixture { dir, hits, crawler }
    }

    #[tokio::test]
    async fn urls_with_equal_identity_are_fetched_at_most_once() {
        let mut fx = fixture(
            &[("http://Example.com/a", 200, page(5, &[]))],
            &["http://Example.com/a", "https://example.com/a/"],
            10,
            1,
        );
        let summary = fx.crawler.run().await.unwrap();
        assert_eq!(fx.hits.borrow().len(), 1);
        assert_eq!(summary.visited, 1);
    }

    #[tokio::test]
    async fn ids_are_sequential_and_capped_at_the_target() {
        let mut fx = fixture(
            &[
                ("https://a.example", 200, page(5, &[])),
                ("https://b.example", 200, page(5, &[])),
                ("https://c.example", 200, page(5, &[])),
            ],
            &["https://a.example", "https://b.example", "https://c.example"],
            2,
            1,
        );
        let summary = fx.crawler.run().await.unwrap();
        assert_eq!(summary.saved, 2);
        assert_eq!(summary.frontier_left, 1);

        let manifest = load_manifest(&ArtifactPaths::new(fx.dir.path())).unwrap();
        let ids: Vec<_> = manifest.keys().copied().collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(manifest[&1], "https://a.example");
        assert_eq!(manifest[&2], "https://b.example");
    }

    #[tokio::test]
    async fn link_following_walks_breadth_first() {
        let mut fx = fixture(
            &[
                (
                    "https://hub.example",
                    200,
                    page(5, &["https://a.example", "https://b.example"]),
                ),
                ("https://a.example", 200, page(5, &["https://c.example"])),
                ("https://b.example", 200, page(5, &[])),
                ("https://c.example", 200, page(5, &[])),
            ],
            &["https://hub.example"],
            4,
            1,
        );
        let summary = fx.crawler.run().await.unwrap();
        assert_eq!(summary.saved, 4);
        assert_eq!(
            *fx.hits.borrow(),
            vec![
                "https://hub.example",
                "https://a.example",
                "https://b.example",
                "https://c.example"
            ]
        );
    }

    #[tokio::test]
    async fn enough_seeds_disable_link_following() {
        let mut fx = fixture(
            &[("https://a.example", 200, page(5, &["https://b.example"]))],
            &["https://a.example"],
            1,
            1,
        );
        let summary = fx.crawler.run().await.unwrap();
        assert_eq!(summary.saved, 1);
        assert_eq!(summary.frontier_left, 0);
        assert_eq!(fx.hits.borrow().len(), 1);
    }

    #[tokio::test]
    async fn thin_pages_are_not_saved_but_still_yield_links() {
        let mut fx = fixture(
            &[
                ("https://hub.example", 200, page(2, &["https://fat.example"])),
                ("https://fat.example", 200, page(50, &[])),
            ],
            &["https://hub.example"],
            2,
            10,
        );
        let summary = fx.crawler.run().await.unwrap();
        assert_eq!(summary.saved, 1);

        let manifest = load_manifest(&ArtifactPaths::new(fx.dir.path())).unwrap();
        assert_eq!(manifest[&1], "https://fat.example");
    }

    #[tokio::test]
    async fn denylisted_urls_are_marked_visited_without_a_fetch() {
        let mut fx = fixture(
            &[],
            &["https://example.com/setup.exe", "https://web.archive.org/web/x"],
            10,
            1,
        );
        let summary = fx.crawler.run().await.unwrap();
        assert!(fx.hits.borrow().is_empty());
        assert_eq!(summary.visited, 2);
    }

    #[tokio::test]
    async fn transient_failures_skip_the_url_and_continue() {
        let mut fx = fixture(
            &[
                ("https://gone.example", 404, page(5, &[])),
                ("https://binary.example", 200, vec![0xff, 0xfe, 0x00]),
                ("https://good.example", 200, page(5, &[])),
            ],
            &[
                "https://down.example",
                "https://gone.example",
                "https://binary.example",
                "https://good.example",
            ],
            10,
            1,
        );
        let summary = fx.crawler.run().await.unwrap();
        assert_eq!(summary.saved, 1);

        let manifest = load_manifest(&ArtifactPaths::new(fx.dir.path())).unwrap();
        assert_eq!(manifest[&1], "https://good.example");
    }
}
