//! Link filter applied to matched candidates.

use crate::types::{FilterRule, MAGNET_PREFIX};

/// Decide whether a candidate with link `href` passes `rule`.
///
/// A missing or empty link never satisfies a non-empty filter.
pub fn accepts(href: Option<&str>, rule: &FilterRule) -> bool {
    let href = href.filter(|h| !h.is_empty());
    match rule {
        FilterRule::None => true,
        FilterRule::Magnet => href.is_some_and(|h| h.starts_with(MAGNET_PREFIX)),
        FilterRule::Contains(needle) => href.is_some_and(|h| h.contains(needle.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter_accepts_everything() {
        assert!(accepts(None, &FilterRule::None));
        assert!(accepts(Some(""), &FilterRule::None));
        assert!(accepts(Some("http://x"), &FilterRule::None));
    }

    #[test]
    fn test_magnet_requires_prefix() {
        let rule = FilterRule::Magnet;
        assert!(accepts(Some("magnet:?xt=1"), &rule));
        assert!(!accepts(Some("http://x/?u=magnet:?xt=1"), &rule));
        assert!(!accepts(Some("MAGNET:?xt=1"), &rule));
        assert!(!accepts(None, &rule));
    }

    #[test]
    fn test_substring_filter() {
        let rule = FilterRule::Contains(".torrent".into());
        assert!(accepts(Some("http://x/file.torrent"), &rule));
        assert!(!accepts(Some("http://x/file.zip"), &rule));
        assert!(!accepts(None, &rule));
        assert!(!accepts(Some(""), &rule));
    }

    #[test]
    fn test_repeated_calls_are_independent() {
        let rule = FilterRule::Contains("x".into());
        let inputs = [Some("x"), None, Some("y"), Some("xx")];
        let first: Vec<bool> = inputs.iter().map(|h| accepts(*h, &rule)).collect();
        let second: Vec<bool> = inputs.iter().rev().map(|h| accepts(*h, &rule)).collect();
        assert_eq!(first, second.into_iter().rev().collect::<Vec<_>>());
    }
}
