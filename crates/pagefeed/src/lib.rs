//! Pagefeed — turn any HTML page into a syndication feed by streaming it
//! through a region/element selector, a link filter, and a regex reformat.

pub mod feed;
pub mod filter;
pub mod matcher;
pub mod pipeline;
pub mod postprocess;
pub mod render;
pub mod rewriter;
pub mod rules;
pub mod types;

pub use filter::accepts;
pub use matcher::{EventSink, HtmlEvent, SelectorMatcher};
pub use pipeline::{build, extract_candidates, finalize, run_document, Extractor, PipelineOutput};
pub use postprocess::{rewrite_magnet, Reformatter};
pub use render::{FeedRenderer, XmlFeedRenderer};
pub use rewriter::{validate_selector, HtmlEventSource};
pub use rules::normalize;
pub use types::*;
