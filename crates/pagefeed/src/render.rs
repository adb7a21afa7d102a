//! Feed rendering.
//!
//! The pipeline only depends on [`FeedRenderer`]; [`XmlFeedRenderer`] is the
//! built-in implementation, writing RSS 2.0 or Atom with quick-xml.

use chrono::Utc;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::types::{iso_timestamp, FeedError, FeedObject, FeedResult, FinalizedItem, Template};

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const BITTORRENT_MIME: &str = "application/x-bittorrent";

/// Turns a feed object into text using a named template.
pub trait FeedRenderer: Send + Sync {
    fn render(&self, template: Template, feed: &FeedObject) -> FeedResult<String>;
}

/// Renders the built-in templates as XML.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlFeedRenderer;

impl FeedRenderer for XmlFeedRenderer {
    fn render(&self, template: Template, feed: &FeedObject) -> FeedResult<String> {
        let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
        w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(render_err)?;

        match template {
            Template::Bt => write_rss(&mut w, feed, true)?,
            Template::Rss2 => write_rss(&mut w, feed, false)?,
            Template::Atom => write_atom(&mut w, feed)?,
        }

        let mut xml = String::from_utf8(w.into_inner()).map_err(render_err)?;
        xml.push('\n');
        Ok(xml)
    }
}

type XmlWriter = Writer<Vec<u8>>;

fn render_err(e: impl std::fmt::Display) -> FeedError {
    FeedError::Render(e.to_string())
}

fn start(w: &mut XmlWriter, tag: BytesStart<'_>) -> FeedResult<()> {
    w.write_event(Event::Start(tag)).map_err(render_err)
}

fn end(w: &mut XmlWriter, name: &str) -> FeedResult<()> {
    w.write_event(Event::End(BytesEnd::new(name))).map_err(render_err)
}

fn empty(w: &mut XmlWriter, tag: BytesStart<'_>) -> FeedResult<()> {
    w.write_event(Event::Empty(tag)).map_err(render_err)
}

fn text_element(w: &mut XmlWriter, name: &str, text: &str) -> FeedResult<()> {
    start(w, BytesStart::new(name))?;
    let clean = strip_control_chars(text);
    w.write_event(Event::Text(BytesText::new(&clean)))
        .map_err(render_err)?;
    end(w, name)
}

/// Drop characters XML 1.0 cannot carry (C0 controls other than tab/LF/CR).
fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || c >= ' ')
        .collect()
}

// ── RSS 2.0 ─────────────────────────────────────────────────────

fn write_rss(w: &mut XmlWriter, feed: &FeedObject, magnet: bool) -> FeedResult<()> {
    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    start(w, rss)?;
    start(w, BytesStart::new("channel"))?;

    text_element(w, "title", &feed.title)?;
    text_element(w, "link", &feed.link)?;
    text_element(w, "description", &feed.description)?;

    for item in &feed.items {
        write_rss_item(w, item, magnet)?;
    }

    end(w, "channel")?;
    end(w, "rss")
}

fn write_rss_item(w: &mut XmlWriter, item: &FinalizedItem, magnet: bool) -> FeedResult<()> {
    start(w, BytesStart::new("item"))?;
    text_element(w, "title", &item.title)?;
    text_element(w, "description", &item.description)?;

    if !item.magnet.is_empty() {
        text_element(w, "link", &item.magnet)?;

        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "false"));
        start(w, guid)?;
        w.write_event(Event::Text(BytesText::new(&item.magnet)))
            .map_err(render_err)?;
        end(w, "guid")?;

        if magnet {
            let mut enclosure = BytesStart::new("enclosure");
            enclosure.push_attribute(("url", item.magnet.as_str()));
            enclosure.push_attribute(("type", BITTORRENT_MIME));
            empty(w, enclosure)?;
        }
    }

    text_element(w, "pubDate", &item.pub_date.to_rfc2822())?;
    text_element(w, "category", &item.category)?;
    end(w, "item")
}

// ── Atom ────────────────────────────────────────────────────────

fn write_atom(w: &mut XmlWriter, feed: &FeedObject) -> FeedResult<()> {
    let mut root = BytesStart::new("feed");
    root.push_attribute(("xmlns", ATOM_NS));
    start(w, root)?;

    let updated = feed
        .items
        .iter()
        .map(|i| i.pub_date)
        .max()
        .unwrap_or_else(Utc::now);

    text_element(w, "title", &feed.title)?;
    if !feed.description.is_empty() {
        text_element(w, "subtitle", &feed.description)?;
    }
    let mut link = BytesStart::new("link");
    link.push_attribute(("href", feed.link.as_str()));
    empty(w, link)?;
    text_element(w, "id", &feed.link)?;
    text_element(w, "updated", &iso_timestamp(&updated))?;

    for (index, item) in feed.items.iter().enumerate() {
        start(w, BytesStart::new("entry"))?;
        text_element(w, "title", &item.title)?;
        if !item.magnet.is_empty() {
            let mut link = BytesStart::new("link");
            link.push_attribute(("href", item.magnet.as_str()));
            empty(w, link)?;
            text_element(w, "id", &item.magnet)?;
        } else {
            text_element(w, "id", &format!("{}#{index}", feed.link))?;
        }
        text_element(w, "updated", &iso_timestamp(&item.pub_date))?;
        text_element(w, "summary", &item.description)?;
        let mut category = BytesStart::new("category");
        category.push_attribute(("term", item.category.as_str()));
        empty(w, category)?;
        end(w, "entry")?;
    }

    end(w, "feed")
}
