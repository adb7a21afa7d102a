//! Core data types for extraction rules, candidates, and feeds.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Default region when none (or an empty one) is supplied.
pub const DEFAULT_REGION: &str = "body";

/// Default element selector when none (or an empty one) is supplied.
pub const DEFAULT_ELEMENT_SELECTOR: &str = "a";

/// Filter value that switches the filter engine to scheme-prefix matching.
pub const MAGNET_FILTER: &str = "magnet";

/// Scheme prefix of magnet links.
pub const MAGNET_PREFIX: &str = "magnet:";

/// Category attached to every feed item.
pub const ITEM_CATEGORY: &str = "magnet";

/// Feed title used when no explicit title was given and nothing matched.
pub const EMPTY_FEED_TITLE: &str = "Untitled feed";

/// Output encoding requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    #[default]
    Xml,
    Json,
}

impl OutputType {
    /// Anything other than `json` renders the XML feed.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => OutputType::Json,
            _ => OutputType::Xml,
        }
    }
}

/// How candidates are filtered by their link.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterRule {
    /// Every candidate is accepted.
    #[default]
    None,
    /// Link must start with `magnet:`.
    Magnet,
    /// Link must contain the given substring.
    Contains(String),
}

impl FilterRule {
    /// Build a filter rule from the raw `filter` parameter.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => FilterRule::None,
            Some(MAGNET_FILTER) => FilterRule::Magnet,
            Some(other) => FilterRule::Contains(other.to_string()),
        }
    }

    /// The raw value this rule was built from, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FilterRule::None => None,
            FilterRule::Magnet => Some(MAGNET_FILTER),
            FilterRule::Contains(s) => Some(s),
        }
    }
}

/// Named template handed to the feed renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    /// RSS 2.0 with magnet enclosures.
    #[default]
    Bt,
    /// Plain RSS 2.0.
    Rss2,
    /// Atom 1.0.
    Atom,
}

impl Template {
    /// Look up a template by name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "bt" => Some(Template::Bt),
            "rss2" | "rss" => Some(Template::Rss2),
            "atom" => Some(Template::Atom),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Template::Bt => "bt",
            Template::Rss2 => "rss2",
            Template::Atom => "atom",
        }
    }
}

/// Raw, undecoded-by-us request parameters. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParams {
    pub filter: Option<String>,
    pub area: Option<String>,
    pub selector: Option<String>,
    #[serde(rename = "type")]
    pub output_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub format_regex: Option<String>,
    pub format_replace: Option<String>,
    pub template: Option<String>,
}

impl RawParams {
    /// Decode a URL query string. The first value of a repeated key wins;
    /// unknown keys are ignored.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "filter" => &mut params.filter,
                "area" => &mut params.area,
                "selector" => &mut params.selector,
                "type" => &mut params.output_type,
                "title" => &mut params.title,
                "description" => &mut params.description,
                "formatRegex" => &mut params.format_regex,
                "formatReplace" => &mut params.format_replace,
                "template" => &mut params.template,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

/// Extraction rules derived once per request. Immutable after normalization.
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    /// Region part of the composed selector, never empty.
    pub region: String,
    /// Element part of the composed selector, never empty.
    pub element_selector: String,
    pub filter: FilterRule,
    pub output_type: OutputType,
    /// Explicit feed title, if the caller gave a non-empty one.
    pub title: Option<String>,
    pub description: String,
    pub format_regex: Option<String>,
    pub format_replace: String,
    pub template: Template,
}

impl ExtractionRules {
    /// The combined selector string, `region element`.
    pub fn combined_selector(&self) -> String {
        format!("{} {}", self.region, self.element_selector)
    }
}

/// An element matched while streaming; its text is still being accumulated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
    pub href: Option<String>,
}

impl Candidate {
    pub fn new(href: Option<String>) -> Self {
        Self {
            text: String::new(),
            href,
        }
    }
}

/// A candidate that passed the filter and the post-processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedItem {
    pub text: String,
    /// Link of the element, empty when the element had none.
    pub href: String,
}

/// One entry of the assembled feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedItem {
    pub title: String,
    pub magnet: String,
    pub description: String,
    #[serde(serialize_with = "serialize_iso")]
    pub pub_date: DateTime<Utc>,
    pub category: String,
}

/// The canonical schema handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedObject {
    pub title: String,
    pub description: String,
    pub link: String,
    pub items: Vec<FinalizedItem>,
}

/// Millisecond-precision UTC timestamp, e.g. `2026-10-19T08:00:00.000Z`.
pub fn iso_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_iso<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&iso_timestamp(ts))
}

/// Errors that can occur in the feed pipeline.
#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("HTML rewriting failed: {0}")]
    Rewrite(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type FeedResult<T> = Result<T, FeedError>;
