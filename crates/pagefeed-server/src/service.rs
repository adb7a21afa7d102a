//! One parse request from raw parameters to a built response.

use std::sync::Arc;

use chrono::Utc;

use pagefeed::{normalize, ExtractionRules, FeedRenderer, PipelineOutput, RawParams, XmlFeedRenderer};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::fetch::{parse_target, PageFetcher};
use crate::response::{self, FeedResponse};

/// Shared by every request; holds no per-request state.
#[derive(Clone)]
pub struct FeedService {
    fetcher: PageFetcher,
    renderer: Arc<dyn FeedRenderer>,
}

impl FeedService {
    pub fn new(config: &ServerConfig) -> ServerResult<Self> {
        Ok(Self::with_renderer(
            PageFetcher::new(config)?,
            Arc::new(XmlFeedRenderer),
        ))
    }

    pub fn with_renderer(fetcher: PageFetcher, renderer: Arc<dyn FeedRenderer>) -> Self {
        Self { fetcher, renderer }
    }

    /// Normalize, fetch, extract, render. Failures become the error envelope.
    pub async fn handle(&self, target: &str, params: &RawParams) -> FeedResponse {
        let rules = normalize(params);
        tracing::info!("Parsing {target} with '{}'", rules.combined_selector());
        match self.run(target, &rules).await {
            Ok(output) => {
                tracing::info!("{target}: {} items", output.items.len());
                response::success(target, &rules, &output)
            }
            Err(e) => {
                tracing::error!("{target}: {e}");
                response::failure(&e, &rules)
            }
        }
    }

    /// Error envelope for a request that failed before it could run.
    pub fn reject(&self, error: &ServerError, params: &RawParams) -> FeedResponse {
        let rules = normalize(params);
        tracing::error!("Rejected parse request: {error}");
        response::failure(error, &rules)
    }

    async fn run(&self, target: &str, rules: &ExtractionRules) -> ServerResult<PipelineOutput> {
        let url = parse_target(target)?;
        let candidates = self.fetcher.extract(&url, rules).await?;
        let output = pagefeed::build(candidates, rules, target, self.renderer.as_ref(), Utc::now())?;
        Ok(output)
    }
}
