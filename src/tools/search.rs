//! Web search tool backed by the DuckDuckGo HTML endpoint.

use super::Tool;
use crate::config::SearchSettings;
use crate::error::{Result, ScoutError};
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; Scout/0.1)";

/// A single search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Web search tool.
pub struct WebSearch {
    client: reqwest::Client,
    max_results: usize,
    region: Option<String>,
    title_regex: Regex,
    snippet_regex: Regex,
    tag_regex: Regex,
}

impl WebSearch {
    /// Create a search tool from settings.
    pub fn from_settings(settings: &SearchSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Self::with_client(client, settings.max_results, settings.region.clone())
    }

    fn with_client(
        client: reqwest::Client,
        max_results: usize,
        region: Option<String>,
    ) -> Result<Self> {
        let regex = |pattern: &str| {
            Regex::new(pattern).map_err(|e| ScoutError::Config(format!("Invalid regex: {}", e)))
        };

        Ok(Self {
            client,
            max_results: max_results.max(1),
            region,
            title_regex: regex(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#)?,
            snippet_regex: regex(r#"(?s)class="result__snippet"[^>]*>(.*?)</(?:a|div|td)>"#)?,
            tag_regex: regex(r"<[^>]+>")?,
        })
    }

    /// Extract results from a DuckDuckGo HTML page.
    pub fn extract_results(&self, html: &str) -> Vec<SearchHit> {
        let mut hits = Vec::new();

        for chunk in html.split("result__body").skip(1) {
            if hits.len() >= self.max_results {
                break;
            }

            let Some(title_caps) = self.title_regex.captures(chunk) else {
                continue;
            };

            let href = html_decode(&title_caps[1]);
            // Sponsored links go through the ad redirector
            if href.contains("duckduckgo.com/y.js") {
                continue;
            }

            let title = self.clean(&title_caps[2]);
            if title.is_empty() {
                continue;
            }

            let snippet = self
                .snippet_regex
                .captures(chunk)
                .map(|c| self.clean(&c[1]))
                .unwrap_or_default();

            hits.push(SearchHit {
                title,
                url: resolve_redirect(&href),
                snippet,
            });
        }

        hits
    }

    /// Format results for the model.
    pub fn format_results(query: &str, hits: &[SearchHit]) -> String {
        if hits.is_empty() {
            return format!("No results found for: {}", query);
        }

        let formatted = hits
            .iter()
            .enumerate()
            .map(|(i, h)| {
                if h.snippet.is_empty() {
                    format!("{}. {}\n   {}", i + 1, h.title, h.url)
                } else {
                    format!("{}. {}\n   {}\n   {}", i + 1, h.title, h.snippet, h.url)
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        format!("Search results for: {}\n\n{}", query, formatted)
    }

    fn search_url(&self, query: &str) -> Result<Url> {
        let mut params = vec![("q", query)];
        if let Some(region) = &self.region {
            params.push(("kl", region.as_str()));
        }
        Url::parse_with_params(SEARCH_ENDPOINT, &params)
            .map_err(|e| ScoutError::tool("search", format!("Invalid search URL: {}", e)))
    }

    fn clean(&self, fragment: &str) -> String {
        let text = self.tag_regex.replace_all(fragment, "");
        html_decode(text.trim())
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Returns result titles, snippets and URLs."
    }

    fn argument(&self) -> &str {
        "query"
    }

    fn argument_description(&self) -> &str {
        "The search query"
    }

    #[instrument(skip(self))]
    async fn invoke(&self, query: &str) -> Result<String> {
        let url = self.search_url(query.trim())?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScoutError::tool("search", format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::tool("search", format!("HTTP error: {}", status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ScoutError::tool("search", format!("Failed to read response: {}", e)))?;

        let hits = self.extract_results(&html);
        debug!("Search returned {} results", hits.len());

        Ok(Self::format_results(query.trim(), &hits))
    }
}

/// Follow DuckDuckGo's `/l/?uddg=` redirect links to the target URL.
fn resolve_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    Url::parse(&absolute)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or(absolute)
}

/// Basic HTML entity decoding.
fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
}
