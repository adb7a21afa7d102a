//! Feed assembly: maps processed items onto the renderer's fixed schema.

use chrono::{DateTime, Utc};

use crate::render::FeedRenderer;
use crate::types::{
    ExtractedItem, ExtractionRules, FeedObject, FeedResult, FinalizedItem, Template,
    EMPTY_FEED_TITLE, ITEM_CATEGORY,
};

/// Build the feed object for `items`, in order.
///
/// The title is the explicit one when given, else the first item's text,
/// else [`EMPTY_FEED_TITLE`].
pub fn assemble(
    items: &[ExtractedItem],
    rules: &ExtractionRules,
    link: &str,
    generated_at: DateTime<Utc>,
) -> FeedObject {
    let title = rules
        .title
        .clone()
        .or_else(|| {
            items
                .first()
                .map(|item| item.text.clone())
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_else(|| EMPTY_FEED_TITLE.to_string());

    let items = items
        .iter()
        .map(|item| FinalizedItem {
            title: item.text.clone(),
            magnet: item.href.clone(),
            description: item.text.clone(),
            pub_date: generated_at,
            category: ITEM_CATEGORY.to_string(),
        })
        .collect();

    FeedObject {
        title,
        description: rules.description.clone(),
        link: link.to_string(),
        items,
    }
}

/// Render `feed` and collapse runs of blank lines in the output.
pub fn render(
    renderer: &dyn FeedRenderer,
    template: Template,
    feed: &FeedObject,
) -> FeedResult<String> {
    let rendered = renderer.render(template, feed)?;
    Ok(collapse_blank_lines(&rendered))
}

/// Replace every run of two or more consecutive newlines with one.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_newline = false;
    for c in text.chars() {
        if c == '\n' {
            if previous_newline {
                continue;
            }
            previous_newline = true;
        } else {
            previous_newline = false;
        }
        out.push(c);
    }
    out
}
