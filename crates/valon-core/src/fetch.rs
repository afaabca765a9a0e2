//! Outbound HTTP fetch used by `web:fetch`.

use futures::future::BoxFuture;
use std::time::Duration;
use tracing::debug;

/// Performs a single GET and reports the status code.
///
/// Errors carry the transport's message verbatim. Implementations must not
/// retry.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<u16, String>>;
}

/// [`Fetcher`] backed by `reqwest` with a fixed request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<u16, String>> {
        Box::pin(async move {
            debug!(target: "valon::router", "Fetching {}", url);
            let response = self.client.get(url).send().await.map_err(|e| e.to_string())?;
            Ok(response.status().as_u16())
        })
    }
}
