//! Response builder: picks the output encoding and shapes the error envelope.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use pagefeed::{ExtractedItem, ExtractionRules, OutputType, PipelineOutput};

use crate::error::ServerError;

pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Pipeline debug document returned in json mode.
#[derive(Debug, Serialize)]
pub struct DebugPayload<'a> {
    pub url: &'a str,
    pub area: &'a str,
    pub selector: &'a str,
    pub combined_selector: String,
    pub format_regex: Option<&'a str>,
    pub format_replace: &'a str,
    pub results: &'a [ExtractedItem],
    pub xml: &'a str,
}

/// Body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorPayload<'a> {
    pub error: String,
    pub area: &'a str,
    pub selector: &'a str,
}

/// A fully built response, independent of the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: String,
}

impl FeedResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl IntoResponse for FeedResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, self.content_type)],
            self.body,
        )
            .into_response()
    }
}

/// Build the success response for `rules.output_type`.
pub fn success(target: &str, rules: &ExtractionRules, output: &PipelineOutput) -> FeedResponse {
    match rules.output_type {
        OutputType::Xml => FeedResponse {
            status: StatusCode::OK,
            content_type: XML_CONTENT_TYPE,
            body: output.xml.clone(),
        },
        OutputType::Json => {
            let payload = DebugPayload {
                url: target,
                area: &rules.region,
                selector: &rules.element_selector,
                combined_selector: rules.combined_selector(),
                format_regex: rules.format_regex.as_deref(),
                format_replace: &rules.format_replace,
                results: &output.items,
                xml: &output.xml,
            };
            match serde_json::to_string(&payload) {
                Ok(body) => FeedResponse {
                    status: StatusCode::OK,
                    content_type: JSON_CONTENT_TYPE,
                    body,
                },
                Err(e) => failure(&ServerError::Feed(e.into()), rules),
            }
        }
    }
}

/// Build the error envelope. Always a server-failure status.
pub fn failure(error: &ServerError, rules: &ExtractionRules) -> FeedResponse {
    let payload = ErrorPayload {
        error: error.to_string(),
        area: &rules.region,
        selector: &rules.element_selector,
    };
    let body = serde_json::to_string(&payload).unwrap_or_else(|_| {
        serde_json::json!({ "error": error.to_string() }).to_string()
    });
    FeedResponse {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        content_type: JSON_CONTENT_TYPE,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagefeed::{normalize, run_document, RawParams, XmlFeedRenderer};
    use serde_json::Value;

    fn output(rules: &ExtractionRules) -> PipelineOutput {
        run_document(
            "<body><a href='magnet:?xt=1'>Foo</a></body>",
            rules,
            "https://example.com/list",
            &XmlFeedRenderer,
        )
        .unwrap()
    }

    #[test]
    fn test_xml_mode_returns_rendered_feed() {
        let rules = normalize(&RawParams::default());
        let out = output(&rules);
        let resp = success("https://example.com/list", &rules, &out);
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.content_type, XML_CONTENT_TYPE);
        assert_eq!(resp.body, out.xml);
    }

    #[test]
    fn test_json_mode_returns_debug_payload() {
        let rules = normalize(&RawParams {
            output_type: Some("json".into()),
            area: Some("'body'".into()),
            format_regex: Some("^(.*)$".into()),
            format_replace: Some("[$1]".into()),
            ..Default::default()
        });
        let out = output(&rules);
        let resp = success("https://example.com/list", &rules, &out);
        assert_eq!(resp.content_type, JSON_CONTENT_TYPE);

        let v: Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(v["url"], "https://example.com/list");
        assert_eq!(v["area"], "body");
        assert_eq!(v["selector"], "a");
        assert_eq!(v["combined_selector"], "body a");
        assert_eq!(v["format_regex"], "^(.*)$");
        assert_eq!(v["format_replace"], "[$1]");
        assert_eq!(v["results"][0]["text"], "[Foo]");
        assert_eq!(v["xml"], out.xml.as_str());
    }

    #[test]
    fn test_json_mode_without_regex_echoes_null() {
        let rules = normalize(&RawParams {
            output_type: Some("json".into()),
            ..Default::default()
        });
        let resp = success("https://example.com/list", &rules, &output(&rules));
        let v: Value = serde_json::from_str(&resp.body).unwrap();
        assert!(v["format_regex"].is_null());
        assert_eq!(v["format_replace"], "");
    }

    #[test]
    fn test_failure_envelope() {
        let rules = normalize(&RawParams {
            area: Some("table".into()),
            selector: Some("td a".into()),
            ..Default::default()
        });
        let err = ServerError::Extraction("boom".into());
        let resp = failure(&err, &rules);
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!resp.is_success());

        let v: Value = serde_json::from_str(&resp.body).unwrap();
        assert_eq!(v["error"], "Extraction failed: boom");
        assert_eq!(v["area"], "table");
        assert_eq!(v["selector"], "td a");
    }

    fn between<'a>(haystack: &'a str, open: &str, close: &str) -> &'a str {
        let from = haystack.find(open).unwrap() + open.len();
        let to = from + haystack[from..].find(close).unwrap();
        &haystack[from..to]
    }

    #[test]
    fn test_json_results_match_rendered_items() {
        let html = "<body><ul>\
                    <li><a href='magnet:?xt=urn:btih:aaa'>Show S01E01</a></li>\
                    <li><a href='magnet:?xt=urn:btih:bbb'> Show S01E02 </a></li>\
                    <li><a href='magnet:?xt=urn:btih:ccc'>Show S01E03</a></li>\
                    </ul></body>";
        let link = "https://example.com/list";
        let render = |output_type: &str| {
            let rules = normalize(&RawParams {
                output_type: Some(output_type.into()),
                format_regex: Some(r"^Show (S\d+)(E\d+)$".into()),
                format_replace: Some("$2 of $1".into()),
                ..Default::default()
            });
            let out = run_document(html, &rules, link, &XmlFeedRenderer).unwrap();
            success(link, &rules, &out).body
        };

        let json: Value = serde_json::from_str(&render("json")).unwrap();
        let from_json: Vec<(String, String)> = json["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| {
                (
                    r["text"].as_str().unwrap().to_string(),
                    r["href"].as_str().unwrap().to_string(),
                )
            })
            .collect();

        let xml = render("xml");
        let from_xml: Vec<(String, String)> = xml
            .split("<item>")
            .skip(1)
            .map(|item| {
                (
                    between(item, "<title>", "</title>").to_string(),
                    between(item, "<link>", "</link>").replace("&amp;", "&"),
                )
            })
            .collect();

        assert_eq!(from_json.len(), 3);
        assert_eq!(from_json[1].0, "E02 of S01");
        assert!(from_json[1].1.ends_with("dn=E02+of+S01"));
        assert_eq!(from_json, from_xml);
    }
}
