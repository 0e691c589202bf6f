use anyhow::Result;
use reqwest::{redirect, Client};
use std::time::Duration;

/// A fetched response, reduced to what the crawl loop inspects.
pub struct FetchedPage {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Fetch seam: the crawl loop only needs status and body, so tests substitute
/// a canned map for the HTTP client.
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(redirect::Policy::limited(5))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        Ok(FetchedPage { status, body })
    }
}
