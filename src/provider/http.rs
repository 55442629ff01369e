//! HTTP range source and vendor response formats

use super::{FetchError, RangeSource};
use crate::ranges::normalize;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::time::Duration;

/// Strips markup left inside an extracted HTML block
static TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("static regex is valid"));

/// How a vendor encodes its range list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Plain text, one entry per line
    Lines,
    /// Plain text with a custom separator between entries
    Separated(&'static str),
    /// JSON object with a string array under the named field
    JsonList(&'static str),
    /// JSON object with an array of objects under `list`, each holding
    /// an entry under `field`
    JsonObjectList {
        /// Field holding the array of objects
        list: &'static str,
        /// Field inside each object holding the entry
        field: &'static str,
    },
    /// HTML page; entries are the newline-separated text of the first
    /// element carrying the given class
    HtmlBlock(&'static str),
}

/// Turn a response body into normalized range entries
pub fn parse_body(format: ResponseFormat, body: &str) -> Result<Vec<String>, FetchError> {
    match format {
        ResponseFormat::Lines => Ok(normalize(body.lines())),
        ResponseFormat::Separated(separator) => Ok(normalize(body.split(separator))),
        ResponseFormat::JsonList(name) => {
            let root = parse_object(body)?;
            let entries = field(&root, name)
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(Value::as_str).collect::<Vec<_>>())
                .unwrap_or_default();
            Ok(normalize(entries))
        }
        ResponseFormat::JsonObjectList { list, field: name } => {
            let root = parse_object(body)?;
            let entries = field(&root, list)
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_object)
                        .filter_map(|item| field(item, name))
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            Ok(normalize(entries))
        }
        ResponseFormat::HtmlBlock(class) => {
            Ok(normalize(html_block_text(body, class)?.lines()))
        }
    }
}

/// Text content of the first element carrying `class`, up to its closing tag
fn html_block_text(body: &str, class: &str) -> Result<String, FetchError> {
    let pattern = format!(
        r#"<(\w+)[^>]*\bclass="(?:[^"]*\s)?{}(?:\s[^"]*)?"[^>]*>"#,
        regex::escape(class)
    );
    let opening = Regex::new(&pattern).map_err(|e| FetchError::ParseError(e.to_string()))?;

    let Some(caps) = opening.captures(body) else {
        return Ok(String::new());
    };
    let (Some(whole), Some(tag)) = (caps.get(0), caps.get(1)) else {
        return Ok(String::new());
    };

    let start = whole.end();
    let closing = format!("</{}>", tag.as_str());
    let end = body[start..]
        .find(&closing)
        .map_or(body.len(), |offset| start + offset);

    Ok(TAG_PATTERN.replace_all(&body[start..end], "").into_owned())
}

fn parse_object(body: &str) -> Result<Map<String, Value>, FetchError> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(FetchError::ParseError(
            "expected a JSON object".to_string(),
        )),
        Err(e) => Err(FetchError::ParseError(e.to_string())),
    }
}

// Vendor field names are matched case-insensitively
fn field<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object.get(name).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

/// Range source backed by a single HTTP GET
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    format: ResponseFormat,
    timeout: Duration,
    user_agent: String,
}

impl HttpSource {
    /// Create a source for `url` decoded with `format`
    pub fn new(
        url: impl Into<String>,
        format: ResponseFormat,
        timeout: Duration,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            format,
            timeout,
            user_agent: user_agent.into(),
        }
    }

    /// Endpoint this source fetches
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Format the response is decoded with
    pub fn format(&self) -> ResponseFormat {
        self.format
    }
}

#[async_trait]
impl RangeSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<String>, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::HttpError(e.to_string()))?;

        let response = client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::HttpError(e.to_string()))?;

        parse_body(self.format, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines() {
        let body = "173.245.48.0/20\r\n103.21.244.0/22\n\n103.22.200.0/22\n";
        let ranges = parse_body(ResponseFormat::Lines, body).unwrap();
        assert_eq!(
            ranges,
            vec!["173.245.48.0/20", "103.21.244.0/22", "103.22.200.0/22"]
        );
    }

    #[test]
    fn test_parse_separated() {
        let body = "102.221.36.98<br />102.221.36.99<br />\n103.106.229.82<br />";
        let ranges = parse_body(ResponseFormat::Separated("<br />"), body).unwrap();
        assert_eq!(
            ranges,
            vec!["102.221.36.98", "102.221.36.99", "103.106.229.82"]
        );
    }

    #[test]
    fn test_parse_json_list() {
        let body = r#"{"CLOUDFRONT_GLOBAL_IP_LIST": ["120.52.22.96/27", " 205.251.249.0/24 "],
                       "CLOUDFRONT_REGIONAL_EDGE_IP_LIST": ["13.113.196.64/26"]}"#;
        let format = ResponseFormat::JsonList("CLOUDFRONT_GLOBAL_IP_LIST");
        let ranges = parse_body(format, body).unwrap();
        assert_eq!(ranges, vec!["120.52.22.96/27", "205.251.249.0/24"]);
    }

    #[test]
    fn test_parse_json_list_case_insensitive() {
        let body = r#"{"Addresses": ["23.235.32.0/20"], "ipv6_addresses": ["2a04:4e40::/32"]}"#;
        let ranges = parse_body(ResponseFormat::JsonList("addresses"), body).unwrap();
        assert_eq!(ranges, vec!["23.235.32.0/20"]);
    }

    #[test]
    fn test_parse_json_list_missing_field_is_empty() {
        let body = r#"{"other": []}"#;
        let ranges = parse_body(ResponseFormat::JsonList("addresses"), body).unwrap();
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_parse_json_object_list() {
        let body = r#"{
            "syncToken": "1700000000",
            "prefixes": [
                {"ipv4Prefix": "34.1.208.0/20", "service": "Google Cloud"},
                {"ipv6Prefix": "2600:1900::/35", "service": "Google Cloud"},
                {"ipv4Prefix": "34.35.0.0/16", "service": "Google Cloud"}
            ]
        }"#;
        let format = ResponseFormat::JsonObjectList {
            list: "prefixes",
            field: "ipv4Prefix",
        };
        let ranges = parse_body(format, body).unwrap();
        assert_eq!(ranges, vec!["34.1.208.0/20", "34.35.0.0/16"]);
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = parse_body(ResponseFormat::JsonList("prefixes"), "<html>");
        assert!(matches!(result, Err(FetchError::ParseError(_))));

        let result = parse_body(ResponseFormat::JsonList("prefixes"), "[1, 2]");
        assert!(matches!(result, Err(FetchError::ParseError(_))));
    }

    #[test]
    fn test_parse_html_block() {
        let body = r#"<html><body>
            <p>Allow these:</p>
            <pre class="rdmd-code lang-text" data-lang="text"><code>23.32.0.0/11
23.192.0.0/11</code>
<span>2.16.0.0/13</span>
</pre>
            <pre class="rdmd-code"><code>9.9.9.9/32</code></pre>
        </body></html>"#;
        let ranges = parse_body(ResponseFormat::HtmlBlock("rdmd-code"), body).unwrap();
        assert_eq!(ranges, vec!["23.32.0.0/11", "23.192.0.0/11", "2.16.0.0/13"]);
    }

    #[test]
    fn test_parse_html_block_whole_class_token() {
        let body = r#"<div class="rdmd-code-block"><p>not this</p></div>
            <pre class="lang-text rdmd-code"><code>104.64.0.0/10</code></pre>"#;
        let ranges = parse_body(ResponseFormat::HtmlBlock("rdmd-code"), body).unwrap();
        assert_eq!(ranges, vec!["104.64.0.0/10"]);
    }

    #[test]
    fn test_parse_html_block_missing() {
        let ranges = parse_body(ResponseFormat::HtmlBlock("rdmd-code"), "<p>nothing</p>").unwrap();
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_http_source_accessors() {
        let source = HttpSource::new(
            "https://www.cloudflare.com/ips-v4",
            ResponseFormat::Lines,
            Duration::from_secs(5),
            "cdnip-test",
        );
        assert_eq!(source.url(), "https://www.cloudflare.com/ips-v4");
        assert_eq!(source.format(), ResponseFormat::Lines);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails() {
        let source = HttpSource::new(
            "http://127.0.0.1:9/ips",
            ResponseFormat::Lines,
            Duration::from_millis(500),
            "cdnip-test",
        );
        assert!(source.fetch().await.is_err());
    }
}
