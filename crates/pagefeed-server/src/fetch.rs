//! Streaming page fetcher.
//!
//! The response body is never buffered whole. Chunks are handed over a
//! bounded channel to a blocking task that owns the HTML rewriter, so a
//! slow consumer applies backpressure to the network read. The rewriter is
//! not `Send`, so it is created inside that task.

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use url::Url;

use pagefeed::{Candidate, ExtractionRules, Extractor};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Chunks buffered between the network and the rewriter.
const CHANNEL_DEPTH: usize = 16;

/// HTTP client that streams a page straight into the extractor.
#[derive(Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    /// Single attempt per request: no retries, limited redirects.
    pub fn new(config: &ServerConfig) -> ServerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }

    /// Fetch `url` and return the candidates its body yields under `rules`.
    pub async fn extract(&self, url: &Url, rules: &ExtractionRules) -> ServerResult<Vec<Candidate>> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("{url} answered {status}, extracting from the body anyway");
        }

        let (tx, mut rx) = mpsc::channel::<Bytes>(CHANNEL_DEPTH);
        let worker_rules = rules.clone();
        let worker = tokio::task::spawn_blocking(move || {
            let mut extractor = Extractor::new(&worker_rules)?;
            while let Some(chunk) = rx.blocking_recv() {
                extractor.feed(&chunk)?;
            }
            extractor.finish()
        });

        let mut body = response.bytes_stream();
        let mut received = 0usize;
        let mut failure = None;
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    received += bytes.len();
                    if tx.send(bytes).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        drop(tx);

        let extracted = worker
            .await
            .map_err(|e| ServerError::Extraction(format!("extraction task failed: {e}")))?;

        if let Some(e) = failure {
            return Err(e.into());
        }
        let candidates = extracted?;

        tracing::debug!("Read {received} bytes from {url}: {} candidates", candidates.len());
        Ok(candidates)
    }
}

/// Validate the target of a parse request: an absolute http(s) URL.
pub fn parse_target(target: &str) -> ServerResult<Url> {
    let url = Url::parse(target.trim()).map_err(|e| ServerError::invalid_target(target, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ServerError::invalid_target(
            target,
            format!("unsupported scheme '{other}'"),
        )),
    }
}
