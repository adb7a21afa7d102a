//! lol_html bridge.
//!
//! Streams HTML through lol_html's rewriter with three handlers: one for
//! every element, one for elements matching the composed selector, and one
//! for text inside those elements. What they see is forwarded to an
//! [`EventSink`] as [`HtmlEvent`]s. Tree context, implied end tags, raw-text
//! elements and UTF-8 sequences split across chunks are lol_html's job; the
//! rewritten output itself is discarded.

use std::cell::RefCell;
use std::rc::Rc;

use lol_html::html_content::EndTag;
use lol_html::{element, text, HandlerResult, HtmlRewriter, OutputSink, Selector, Settings};

use crate::matcher::{EventSink, HtmlEvent};
use crate::types::{FeedError, FeedResult};

const ANY_ELEMENT: &str = "*";

/// Check that `selector` is one the rewriter accepts.
pub fn validate_selector(selector: &str) -> FeedResult<()> {
    selector
        .parse::<Selector>()
        .map(|_| ())
        .map_err(|e| FeedError::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })
}

struct Discard;

impl OutputSink for Discard {
    fn handle_chunk(&mut self, _chunk: &[u8]) {}
}

/// Incremental HTML event source over lol_html.
///
/// Accepts the document in arbitrary byte chunks and pushes events into `S`
/// as soon as the rewriter has seen them.
pub struct HtmlEventSource<S: EventSink + 'static> {
    rewriter: HtmlRewriter<'static, Discard>,
    sink: Rc<RefCell<S>>,
}

impl<S: EventSink + 'static> HtmlEventSource<S> {
    /// Build a source matching `selector`, which must pass
    /// [`validate_selector`].
    pub fn new(selector: &str, sink: S) -> FeedResult<Self> {
        validate_selector(selector)?;

        let sink = Rc::new(RefCell::new(sink));
        let on_any = Rc::clone(&sink);
        let on_match = Rc::clone(&sink);
        let on_text = Rc::clone(&sink);
        let mut matched = 0usize;

        // Handlers for one element run in registration order, so the idle
        // transition from `*` always lands before a match opens.
        let settings = Settings {
            element_content_handlers: vec![
                element!(ANY_ELEMENT, move |_el| {
                    on_any.borrow_mut().handle_event(HtmlEvent::ElementStart);
                    Ok(())
                }),
                element!(selector, move |el| {
                    let ordinal = matched;
                    matched += 1;
                    on_match.borrow_mut().handle_event(HtmlEvent::MatchStart {
                        href: el.get_attribute("href"),
                    });

                    if let Some(handlers) = el.end_tag_handlers() {
                        let on_end = Rc::clone(&on_match);
                        handlers.push(Box::new(move |_end: &mut EndTag<'_>| -> HandlerResult {
                            on_end
                                .borrow_mut()
                                .handle_event(HtmlEvent::MatchEnd { ordinal });
                            Ok(())
                        }) as lol_html::EndTagHandler<'static>);
                    }
                    Ok(())
                }),
                text!(selector, move |chunk| {
                    on_text
                        .borrow_mut()
                        .handle_event(HtmlEvent::Text(chunk.as_str()));
                    Ok(())
                }),
            ],
            ..Settings::new()
        };

        Ok(Self {
            rewriter: HtmlRewriter::new(settings, Discard),
            sink,
        })
    }

    /// Feed a chunk of the document.
    pub fn feed(&mut self, chunk: &[u8]) -> FeedResult<()> {
        self.rewriter
            .write(chunk)
            .map_err(|e| FeedError::Rewrite(e.to_string()))
    }

    /// Flush the rewriter and return the sink.
    pub fn finish(self) -> FeedResult<S> {
        let Self { rewriter, sink } = self;
        rewriter
            .end()
            .map_err(|e| FeedError::Rewrite(e.to_string()))?;

        Rc::try_unwrap(sink)
            .map(RefCell::into_inner)
            .map_err(|_| FeedError::Rewrite("event sink still borrowed after end of input".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records events as readable strings, merging adjacent text chunks.
    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl EventSink for Recorder {
        fn handle_event(&mut self, event: HtmlEvent<'_>) {
            let line = match event {
                HtmlEvent::ElementStart => "<*>".to_string(),
                HtmlEvent::MatchStart { href } => {
                    format!("<match {}>", href.unwrap_or_else(|| "-".into()))
                }
                HtmlEvent::Text(t) => {
                    if t.is_empty() {
                        return;
                    }
                    if let Some(prev) = self.0.last_mut().filter(|p| p.starts_with('\'')) {
                        prev.pop();
                        prev.push_str(t);
                        prev.push('\'');
                        return;
                    }
                    format!("'{t}'")
                }
                HtmlEvent::MatchEnd { ordinal } => format!("</match {ordinal}>"),
            };
            self.0.push(line);
        }
    }

    fn record_chunks(selector: &str, chunks: &[&[u8]]) -> Vec<String> {
        let mut source = HtmlEventSource::new(selector, Recorder::default()).unwrap();
        for chunk in chunks {
            source.feed(chunk).unwrap();
        }
        source.finish().unwrap().0
    }

    fn record(selector: &str, html: &str) -> Vec<String> {
        record_chunks(selector, &[html.as_bytes()])
    }

    #[test]
    fn test_basic_events() {
        assert_eq!(
            record("div a", "<div><a href='x'>Hi</a></div>"),
            vec!["<*>", "<*>", "<match x>", "'Hi'", "</match 0>"]
        );
    }

    #[test]
    fn test_text_outside_matches_not_forwarded() {
        assert_eq!(
            record("div a", "<p>intro</p><div>lead <a>one</a> tail</div>"),
            vec!["<*>", "<*>", "<*>", "<match ->", "'one'", "</match 0>"]
        );
    }

    #[test]
    fn test_child_combinator() {
        let events = record(
            "div > ul a",
            "<div class='nav'><a href='/home'>Home</a></div>\
             <div><ul><li><a href='magnet:?xt=1'>Ep1</a></li></ul></div>",
        );
        let matches: Vec<&String> = events.iter().filter(|e| e.starts_with("<match")).collect();
        assert_eq!(matches, vec!["<match magnet:?xt=1>"]);
    }

    #[test]
    fn test_script_content_is_not_markup() {
        let events = record(
            "div a",
            "<div><script>document.write(\"<a href='fake'>x</a>\")</script><a href='ok'>ok</a></div>",
        );
        let matches: Vec<&String> = events.iter().filter(|e| e.starts_with("<match")).collect();
        assert_eq!(matches, vec!["<match ok>"]);
    }

    #[test]
    fn test_ordinals_follow_document_order() {
        let events = record("ul a", "<ul><li><a>1</a><li><a>2</a></ul>");
        assert!(events.contains(&"</match 0>".to_string()));
        assert!(events.contains(&"</match 1>".to_string()));
    }

    #[test]
    fn test_split_utf8_sequence_across_chunks() {
        let html = "<div><a>日本</a></div>".as_bytes();
        // split inside the first multi-byte character
        let events = record_chunks("div a", &[&html[..9], &html[9..]]);
        assert!(events.contains(&"'日本'".to_string()));
    }

    #[test]
    fn test_invalid_selector_rejected() {
        assert!(validate_selector("div > ul a").is_ok());
        assert!(validate_selector("td a[href^=\"magnet:\"]").is_ok());
        assert!(matches!(
            validate_selector("div >"),
            Err(FeedError::InvalidSelector { .. })
        ));
        assert!(HtmlEventSource::new("a,,b", Recorder::default()).is_err());
    }
}
