//! Text reformatting and magnet display-name rewriting.
//!
//! Every failure here is soft: a pattern that does not compile or a link
//! that does not parse leaves the item as it was, with a warning in the log.

use regex::Regex;
use url::Url;

use crate::types::{Candidate, ExtractedItem, MAGNET_PREFIX};

/// Query key written into rewritten magnet links.
pub const DISPLAY_NAME_KEY: &str = "dn";

/// Applies the per-request `formatRegex` / `formatReplace` rule.
#[derive(Debug, Clone)]
pub struct Reformatter {
    rule: Option<(Regex, String)>,
}

impl Reformatter {
    /// Compile the rule once per request. An invalid pattern disables
    /// reformatting instead of failing the request.
    pub fn new(pattern: Option<&str>, replacement: &str) -> Self {
        let rule = pattern.filter(|p| !p.is_empty()).and_then(|p| match Regex::new(p) {
            Ok(re) => {
                let named = re.capture_names().flatten().next().is_some();
                let replacement = translate_replacement(replacement, re.captures_len(), named);
                Some((re, replacement))
            }
            Err(e) => {
                tracing::warn!("Ignoring invalid format regex {p:?}: {e}");
                None
            }
        });
        Self { rule }
    }

    /// Replace every match in `text`. Returns `None` when nothing changed.
    pub fn reformat(&self, text: &str) -> Option<String> {
        let (re, replacement) = self.rule.as_ref()?;
        let replaced = re.replace_all(text, replacement.as_str());
        (replaced != text).then(|| replaced.into_owned())
    }

    /// Trim, reformat, and propagate a successful reformat into a magnet
    /// link's display name.
    pub fn process(&self, candidate: Candidate) -> ExtractedItem {
        let mut text = candidate.text.trim().to_string();
        let mut href = candidate.href.unwrap_or_default();

        if !text.is_empty() {
            if let Some(reformatted) = self.reformat(&text) {
                if href.starts_with(MAGNET_PREFIX) {
                    match rewrite_magnet(&href, &reformatted) {
                        Ok(rewritten) => href = rewritten,
                        Err(e) => tracing::warn!("Leaving magnet link unchanged ({e}): {href}"),
                    }
                }
                text = reformatted;
            }
        }

        ExtractedItem { text, href }
    }
}

/// Replace every query key containing `dn` with one canonical `dn` set to
/// `display_name`. Other parameters keep their order.
pub fn rewrite_magnet(href: &str, display_name: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(href)?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !key.contains(DISPLAY_NAME_KEY))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(DISPLAY_NAME_KEY, display_name);

    Ok(url.to_string())
}

/// Convert a `$1` / `$&` / `$<name>` / `$$` replacement string into the
/// regex crate's syntax.
///
/// `$nn` takes two digits only when that group exists, so `$10` with one
/// group is group 1 followed by `0`. References to groups that do not exist
/// stay literal, as do `` $` `` and `$'`. `$<name>` is literal unless the
/// pattern has named groups; an unknown name then expands to nothing.
fn translate_replacement(replacement: &str, captures_len: usize, named: bool) -> String {
    let chars: Vec<char> = replacement.chars().collect();
    let mut out = String::with_capacity(replacement.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '$' {
            out.push(c);
            i += 1;
            continue;
        }

        match chars.get(i + 1).copied() {
            Some('$') => {
                out.push_str("$$");
                i += 2;
            }
            Some('&') => {
                out.push_str("${0}");
                i += 2;
            }
            Some(d) if d.is_ascii_digit() => {
                let one = d.to_digit(10).unwrap_or(0) as usize;
                let two = chars
                    .get(i + 2)
                    .and_then(|c| c.to_digit(10))
                    .map(|d2| one * 10 + d2 as usize);
                match two {
                    Some(n) if n >= 1 && n < captures_len => {
                        out.push_str(&format!("${{{n}}}"));
                        i += 3;
                    }
                    _ if one >= 1 && one < captures_len => {
                        out.push_str(&format!("${{{one}}}"));
                        i += 2;
                    }
                    _ => {
                        out.push_str("$$");
                        i += 1;
                    }
                }
            }
            Some('<') if named => match chars[i + 2..].iter().position(|&c| c == '>') {
                Some(len) if len > 0 => {
                    let name: String = chars[i + 2..i + 2 + len].iter().collect();
                    out.push_str(&format!("${{{name}}}"));
                    i += len + 3;
                }
                _ => {
                    out.push_str("$$");
                    i += 1;
                }
            },
            _ => {
                out.push_str("$$");
                i += 1;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(text: &str, href: Option<&str>) -> Candidate {
        Candidate {
            text: text.to_string(),
            href: href.map(str::to_string),
        }
    }

    fn query(href: &str) -> Vec<(String, String)> {
        Url::parse(href)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_trim_without_rule() {
        let item = Reformatter::new(None, "").process(candidate("\n  Foo \t", Some("http://x")));
        assert_eq!(item.text, "Foo");
        assert_eq!(item.href, "http://x");
    }

    #[test]
    fn test_missing_href_becomes_empty() {
        let item = Reformatter::new(None, "").process(candidate("Foo", None));
        assert_eq!(item.href, "");
    }

    #[test]
    fn test_reformat_wraps_text_and_rewrites_magnet() {
        let r = Reformatter::new(Some("^(.*)$"), "[$1]");
        let item = r.process(candidate(" Foo ", Some("magnet:?dn=old&xt=1")));
        assert_eq!(item.text, "[Foo]");
        assert_eq!(
            query(&item.href),
            vec![
                ("xt".to_string(), "1".to_string()),
                ("dn".to_string(), "[Foo]".to_string())
            ]
        );
    }

    #[test]
    fn test_rewrite_drops_every_dn_variant() {
        let href = rewrite_magnet("magnet:?xt=urn:btih:abc&dn=a&x.dn=b&dn.1=c&tr=udp://t", "New").unwrap();
        let pairs = query(&href);
        let dn_keys: Vec<_> = pairs.iter().filter(|(k, _)| k.contains("dn")).collect();
        assert_eq!(dn_keys, vec![&("dn".to_string(), "New".to_string())]);
        assert!(pairs.contains(&("xt".to_string(), "urn:btih:abc".to_string())));
        assert!(pairs.contains(&("tr".to_string(), "udp://t".to_string())));
    }

    #[test]
    fn test_no_match_leaves_item_untouched() {
        let r = Reformatter::new(Some("\\d+"), "#");
        let item = r.process(candidate("Foo", Some("magnet:?dn=old&xt=1")));
        assert_eq!(item.text, "Foo");
        assert_eq!(item.href, "magnet:?dn=old&xt=1");
    }

    #[test]
    fn test_non_magnet_href_not_rewritten() {
        let r = Reformatter::new(Some("Foo"), "Bar");
        let item = r.process(candidate("Foo", Some("http://x/?dn=old")));
        assert_eq!(item.text, "Bar");
        assert_eq!(item.href, "http://x/?dn=old");
    }

    #[test]
    fn test_invalid_regex_is_soft() {
        let r = Reformatter::new(Some("(unclosed"), "x");
        assert_eq!(r.reformat("(unclosed"), None);
        let item = r.process(candidate("Foo", Some("magnet:?xt=1")));
        assert_eq!(item.text, "Foo");
        assert_eq!(item.href, "magnet:?xt=1");
    }

    #[test]
    fn test_empty_text_skips_reformat() {
        let r = Reformatter::new(Some("^$"), "filled");
        let item = r.process(candidate("   ", Some("magnet:?dn=old")));
        assert_eq!(item.text, "");
        assert_eq!(item.href, "magnet:?dn=old");
    }

    #[test]
    fn test_second_pass_is_noop_when_pattern_no_longer_matches() {
        let r = Reformatter::new(Some("^\\[HD\\] "), "");
        let once = r.process(candidate("[HD] Movie", Some("magnet:?dn=x&xt=1")));
        let twice = r.process(Candidate {
            text: once.text.clone(),
            href: Some(once.href.clone()),
        });
        assert_eq!(once.text, "Movie");
        assert_eq!(twice, once);
    }

    #[test]
    fn test_global_replacement() {
        let r = Reformatter::new(Some("\\."), " ");
        assert_eq!(r.reformat("a.b.c").as_deref(), Some("a b c"));
    }

    #[test]
    fn test_unanchored_star_group_replaces_once() {
        // No extra replacement for the empty match at the end of the text.
        let r = Reformatter::new(Some("(.*)"), "[$1]");
        assert_eq!(r.reformat("Foo").as_deref(), Some("[Foo]"));
    }

    #[test]
    fn test_translate_replacement_dialect() {
        assert_eq!(translate_replacement("[$1]", 2, false), "[${1}]");
        assert_eq!(translate_replacement("$1abc", 2, false), "${1}abc");
        assert_eq!(translate_replacement("$10", 2, false), "${1}0");
        assert_eq!(translate_replacement("$10", 11, false), "${10}");
        assert_eq!(translate_replacement("$&!", 1, false), "${0}!");
        assert_eq!(translate_replacement("$$5", 1, false), "$$5");
        assert_eq!(translate_replacement("$<year>-", 2, true), "${year}-");
        assert_eq!(translate_replacement("$3", 2, false), "$$3");
        assert_eq!(translate_replacement("cost: $", 1, false), "cost: $$");
    }

    #[test]
    fn test_angle_reference_literal_without_named_groups() {
        assert_eq!(translate_replacement("$<year>-", 2, false), "$$<year>-");
        let r = Reformatter::new(Some("(\\d+)"), "$<n>");
        assert_eq!(r.reformat("ep 12").as_deref(), Some("ep $<n>"));
    }

    #[test]
    fn test_unknown_group_name_expands_to_nothing() {
        let r = Reformatter::new(Some("(?P<num>\\d+)"), "[$<other>]");
        assert_eq!(r.reformat("ep 12").as_deref(), Some("ep []"));
    }

    #[test]
    fn test_named_group_replacement() {
        let r = Reformatter::new(Some("(?P<name>\\w+)\\.(?P<ext>\\w+)"), "$<ext>:$<name>");
        assert_eq!(r.reformat("movie.mkv").as_deref(), Some("mkv:movie"));
    }
}
