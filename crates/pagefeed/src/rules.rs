//! Parameter normalization: raw request parameters into [`ExtractionRules`].

use crate::rewriter::validate_selector;
use crate::types::{
    ExtractionRules, FilterRule, OutputType, RawParams, Template, DEFAULT_ELEMENT_SELECTOR,
    DEFAULT_REGION,
};

/// Strip one pair of matching surrounding quotes (`"..."` or `'...'`).
pub fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Resolve one selector part: strip quotes, fall back to `default` when the
/// result is empty or is not a selector the rewriter accepts.
fn resolve_part(raw: Option<&str>, default: &str, what: &str) -> String {
    let value = strip_quotes(raw.unwrap_or_default().trim()).trim();
    if !value.is_empty() {
        match validate_selector(value) {
            Ok(()) => return value.to_string(),
            Err(e) => tracing::warn!("Malformed {what}, using default '{default}': {e}"),
        }
    }
    default.to_string()
}

/// Build extraction rules from raw parameters.
///
/// Never fails: empty or malformed selector parts become their defaults,
/// and an unknown template name becomes the default template.
pub fn normalize(params: &RawParams) -> ExtractionRules {
    let region = resolve_part(params.area.as_deref(), DEFAULT_REGION, "area");
    let element_selector = resolve_part(
        params.selector.as_deref(),
        DEFAULT_ELEMENT_SELECTOR,
        "selector",
    );

    let template = match params.template.as_deref().filter(|t| !t.trim().is_empty()) {
        None => Template::default(),
        Some(name) => Template::from_name(name).unwrap_or_else(|| {
            tracing::warn!("Unknown template '{name}', using '{}'", Template::default().name());
            Template::default()
        }),
    };

    ExtractionRules {
        region,
        element_selector,
        filter: FilterRule::parse(params.filter.as_deref()),
        output_type: OutputType::parse(params.output_type.as_deref()),
        title: params.title.clone().filter(|t| !t.is_empty()),
        description: params.description.clone().unwrap_or_default(),
        format_regex: params.format_regex.clone().filter(|r| !r.is_empty()),
        format_replace: params.format_replace.clone().unwrap_or_default(),
        template,
    }
}
