//! End-to-end pipeline: HTML stream → candidates → items → feed → XML.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::feed;
use crate::filter::accepts;
use crate::matcher::SelectorMatcher;
use crate::postprocess::Reformatter;
use crate::render::FeedRenderer;
use crate::rewriter::HtmlEventSource;
use crate::types::{Candidate, ExtractedItem, ExtractionRules, FeedObject, FeedResult};

/// Streaming extractor for one document.
///
/// Feed the document in chunks as it arrives; memory stays proportional to
/// the rewriter's buffers plus candidate text.
pub struct Extractor {
    source: HtmlEventSource<SelectorMatcher>,
}

impl Extractor {
    pub fn new(rules: &ExtractionRules) -> FeedResult<Self> {
        let source = HtmlEventSource::new(&rules.combined_selector(), SelectorMatcher::new())?;
        Ok(Self { source })
    }

    pub fn feed(&mut self, chunk: &[u8]) -> FeedResult<()> {
        self.source.feed(chunk)
    }

    /// Flush and return every matched candidate in document order.
    pub fn finish(self) -> FeedResult<Vec<Candidate>> {
        Ok(self.source.finish()?.finish())
    }
}

/// Extract candidates from a complete in-memory document.
pub fn extract_candidates(html: &str, rules: &ExtractionRules) -> FeedResult<Vec<Candidate>> {
    let mut extractor = Extractor::new(rules)?;
    extractor.feed(html.as_bytes())?;
    extractor.finish()
}

/// Filter candidates and run the post-processor over the survivors.
pub fn finalize(candidates: Vec<Candidate>, rules: &ExtractionRules) -> Vec<ExtractedItem> {
    let reformatter = Reformatter::new(rules.format_regex.as_deref(), &rules.format_replace);
    let total = candidates.len();

    let items: Vec<ExtractedItem> = candidates
        .into_iter()
        .filter(|c| accepts(c.href.as_deref(), &rules.filter))
        .map(|c| reformatter.process(c))
        .collect();

    tracing::debug!(
        "{} of {} candidates accepted for '{}'",
        items.len(),
        total,
        rules.combined_selector()
    );
    items
}

/// Everything a response needs: processed items, the feed object, and the
/// rendered XML.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub items: Vec<ExtractedItem>,
    pub feed: FeedObject,
    pub xml: String,
}

/// Run filtering, post-processing, assembly, and rendering.
pub fn build(
    candidates: Vec<Candidate>,
    rules: &ExtractionRules,
    link: &str,
    renderer: &dyn FeedRenderer,
    generated_at: DateTime<Utc>,
) -> FeedResult<PipelineOutput> {
    let items = finalize(candidates, rules);
    if items.is_empty() {
        tracing::info!("No elements matched '{}' on {link}", rules.combined_selector());
    }

    let feed = feed::assemble(&items, rules, link, generated_at);
    let xml = feed::render(renderer, rules.template, &feed)?;

    Ok(PipelineOutput { items, feed, xml })
}

/// Run the whole pipeline over an in-memory document.
pub fn run_document(
    html: &str,
    rules: &ExtractionRules,
    link: &str,
    renderer: &dyn FeedRenderer,
) -> FeedResult<PipelineOutput> {
    build(extract_candidates(html, rules)?, rules, link, renderer, Utc::now())
}
