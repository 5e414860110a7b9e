//! # Tools Module
//!
//! The search collaborator used by the researcher stage.
//! It demonstrates:
//! - A trait seam (`SearchTool`) so stages can run against test doubles
//! - Async HTTP with reqwest
//! - Structured error handling with thiserror
//! - HTML parsing with scraper
//! - Serde for the parsed result records

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::PipelineError;

/// DuckDuckGo's HTML-only endpoint; works without an API key.
pub const DUCKDUCKGO_HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// =============================================================================
// CUSTOM ERROR TYPE
// =============================================================================
/// Failures of a web search request.
///
/// These stay specific inside this module and are folded into
/// [`PipelineError::Upstream`] at the trait boundary.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Failed to perform web search: {0}")]
    SearchFailed(String),

    #[error("Rate limited by search provider, please wait")]
    RateLimited,

    #[error("No search results found for query: {0}")]
    NoResults(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl From<SearchError> for PipelineError {
    fn from(err: SearchError) -> Self {
        PipelineError::upstream("search", err.to_string())
    }
}

// =============================================================================
// SEARCH TOOL TRAIT
// =============================================================================
/// Anything that can turn a query into a block of result text.
///
/// # Rust Concept: async-trait
///
/// Stages hold the tool as `Arc<dyn SearchTool>`. Trait objects need a
/// fixed vtable, so the async method is boxed by `#[async_trait]`.
#[async_trait]
pub trait SearchTool: Send + Sync {
    /// Run `query` and return the results as unstructured text.
    async fn search(&self, query: &str) -> Result<String, PipelineError>;
}

// =============================================================================
// SEARCH RESULT STRUCT
// =============================================================================
/// A single search hit parsed from the results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

// =============================================================================
// WEB SEARCH TOOL
// =============================================================================
/// Web search backed by the DuckDuckGo HTML endpoint.
#[derive(Debug, Clone)]
pub struct WebSearchTool {
    /// Maximum results to keep per search
    max_results: usize,

    /// Results page URL; overridden in tests
    endpoint: String,

    client: reqwest::Client,
}

impl WebSearchTool {
    /// Create a new WebSearchTool returning at most `max_results` hits.
    pub fn new(max_results: usize) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            max_results,
            endpoint: DUCKDUCKGO_HTML_ENDPOINT.to_string(),
            client,
        })
    }

    /// Point the tool at a different results page URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Fetch and parse the results page for `query`.
    pub async fn fetch_results(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        info!(query = %query, "Performing web search");

        let url = format!("{}?q={}", self.endpoint, urlencoding::encode(query));
        debug!(url = %url, "Fetching search results");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(SearchError::RateLimited);
            }
            return Err(SearchError::SearchFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let results = parse_results(&body, self.max_results);

        if results.is_empty() {
            warn!(query = %query, "No search results found");
        } else {
            info!(query = %query, count = results.len(), "Search completed");
        }

        Ok(results)
    }
}

#[async_trait]
impl SearchTool for WebSearchTool {
    async fn search(&self, query: &str) -> Result<String, PipelineError> {
        let results = self.fetch_results(query).await?;

        if results.is_empty() {
            return Err(SearchError::NoResults(query.to_string()).into());
        }

        Ok(format_results(&results))
    }
}

/// Render hits as one text block, one paragraph per hit.
pub fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| {
            if r.snippet.is_empty() {
                format!("{}\nSource: {}", r.title, r.url)
            } else {
                format!("{}\n{}\nSource: {}", r.title, r.snippet, r.url)
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

// =============================================================================
// HTML PARSING
// =============================================================================
/// Extract result blocks from a DuckDuckGo HTML page.
///
/// Each hit is a `.result` container holding an `a.result__a` anchor (title +
/// redirect link) and, usually, a `.result__snippet` element. The HTML parser
/// decodes character references, so titles and snippets come out as plain text.
fn parse_results(html: &str, max_results: usize) -> Vec<SearchResult> {
    let (Ok(result_sel), Ok(link_sel), Ok(snippet_sel)) = (
        Selector::parse(".result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut results = Vec::new();
    let mut seen_urls = HashSet::new();

    for block in document.select(&result_sel) {
        if results.len() >= max_results {
            break;
        }

        let Some(link) = block.select(&link_sel).next() else {
            continue;
        };
        let Some(url) = link.value().attr("href").and_then(resolve_url) else {
            continue;
        };
        if url.contains("duckduckgo.com") || !seen_urls.insert(url.clone()) {
            continue;
        }

        let title = Some(element_text(link))
            .filter(|t| !t.is_empty())
            .or_else(|| extract_domain(&url))
            .unwrap_or_else(|| "Result".to_string());

        let snippet = block
            .select(&snippet_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();

        results.push(SearchResult {
            title,
            url,
            snippet,
        });
    }

    results
}

/// Text content of an element with whitespace collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turn a result link into a plain URL, unwrapping DuckDuckGo redirects.
fn resolve_url(href: &str) -> Option<String> {
    if let Some((_, encoded)) = href.split_once("uddg=") {
        let encoded = encoded.split('&').next().unwrap_or_default();
        let decoded = urlencoding::decode(encoded).ok()?.into_owned();
        return decoded.starts_with("http").then_some(decoded);
    }

    if let Some(rest) = href.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }

    href.starts_with("http").then(|| href.to_string())
}

/// Extract the domain name from a URL.
fn extract_domain(url: &str) -> Option<String> {
    url.split("//")
        .nth(1)?
        .split('/')
        .next()
        .map(|s| s.to_string())
}

// =============================================================================
// UNIT TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE_PAGE: &str = r#"
<div class="result results_links results_links_deep web-result">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fen.wikipedia.org%2Fwiki%2FHistory_of_tea&amp;rut=abc">History of <b>tea</b> - Wikipedia</a>
  </h2>
  <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">The <b>history of tea</b> spans multiple cultures &amp; thousands of years.</a>
</div>
<div class="result results_links results_links_deep web-result">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="https://www.example.org/tea-origins">Tea origins</a>
  </h2>
  <a class="result__snippet" href="https://www.example.org/tea-origins">Tea likely originated in southwest China.</a>
</div>
<div class="result results_links results_links_deep web-result">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="https://www.example.org/tea-origins">Duplicate</a>
  </h2>
</div>
"#;

    #[test]
    fn test_parse_results() {
        let results = parse_results(SAMPLE_PAGE, 5);
        assert_eq!(results.len(), 2);

        assert_eq!(results[0].title, "History of tea - Wikipedia");
        assert_eq!(results[0].url, "https://en.wikipedia.org/wiki/History_of_tea");
        assert_eq!(
            results[0].snippet,
            "The history of tea spans multiple cultures & thousands of years."
        );

        assert_eq!(results[1].url, "https://www.example.org/tea-origins");
        assert_eq!(results[1].snippet, "Tea likely originated in southwest China.");
    }

    #[test]
    fn test_parse_results_decodes_character_references() {
        let page = r#"
<div class="result">
  <a class="result__a" href="https://tea.example/past">Tea&#8217;s past &mdash; a story</a>
  <a class="result__snippet" href="https://tea.example/past">Leaves&hellip; and &#8220;ritual&#8221;&nbsp;&amp; more</a>
</div>
"#;
        let results = parse_results(page, 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Tea\u{2019}s past \u{2014} a story");
        assert_eq!(
            results[0].snippet,
            "Leaves\u{2026} and \u{201C}ritual\u{201D} & more"
        );
    }

    #[test]
    fn test_parse_results_respects_limit() {
        assert_eq!(parse_results(SAMPLE_PAGE, 1).len(), 1);
    }

    #[test]
    fn test_parse_results_empty_page() {
        assert!(parse_results("<html><body>No results.</body></html>", 5).is_empty());
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://www.example.com/page"),
            Some("www.example.com".to_string())
        );
        assert_eq!(
            extract_domain("https://rust-lang.org/learn"),
            Some("rust-lang.org".to_string())
        );
    }

    #[test]
    fn test_format_results() {
        let text = format_results(&[
            SearchResult {
                title: "A".to_string(),
                url: "https://a.test".to_string(),
                snippet: "alpha".to_string(),
            },
            SearchResult {
                title: "B".to_string(),
                url: "https://b.test".to_string(),
                snippet: String::new(),
            },
        ]);
        assert_eq!(
            text,
            "A\nalpha\nSource: https://a.test\n\nB\nSource: https://b.test"
        );
    }

    #[test]
    fn test_search_error_becomes_upstream() {
        let err: PipelineError = SearchError::RateLimited.into();
        assert!(matches!(err, PipelineError::Upstream { service: "search", .. }));
    }

    #[tokio::test]
    async fn test_http_search_returns_text() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/html/"))
            .and(query_param("q", "history of tea"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_PAGE))
            .mount(&mock_server)
            .await;

        let tool = WebSearchTool::new(5)
            .unwrap()
            .with_endpoint(format!("{}/html/", mock_server.uri()));

        let text = tool.search("history of tea").await.unwrap();
        assert!(text.starts_with("History of tea - Wikipedia\n"));
        assert!(text.contains("Source: https://www.example.org/tea-origins"));
    }

    #[tokio::test]
    async fn test_http_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let tool = WebSearchTool::new(5)
            .unwrap()
            .with_endpoint(format!("{}/html/", mock_server.uri()));

        let err = tool.fetch_results("tea").await.unwrap_err();
        assert!(matches!(err, SearchError::RateLimited));
    }

    #[tokio::test]
    async fn test_http_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let tool = WebSearchTool::new(5)
            .unwrap()
            .with_endpoint(format!("{}/html/", mock_server.uri()));

        let err = tool.search("tea").await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_http_no_results_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&mock_server)
            .await;

        let tool = WebSearchTool::new(5)
            .unwrap()
            .with_endpoint(format!("{}/html/", mock_server.uri()));

        let err = tool.search("nothing here").await.unwrap_err();
        assert!(err.to_string().contains("No search results found"));
    }
}
