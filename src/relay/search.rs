//! Web search through the Serper API.
//!
//! Search is best effort: any failure yields an empty result list and the
//! conversation continues on the model's own knowledge.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

const SERPER_API_URL: &str = "https://google.serper.dev/search";

/// Results requested from and kept from the provider.
pub const MAX_RESULTS: usize = 3;

/// Keyword prepended to every query to keep results on topic.
const QUERY_PREFIX: &str = "crypto";

/// One normalized search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub link: String,
    pub date: Option<String>,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Up to [`MAX_RESULTS`] results; empty on any failure.
    async fn search(&self, query: &str) -> Vec<SearchResult>;
}

pub struct SerperClient {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    q: String,
    num: usize,
    gl: &'a str,
    hl: &'a str,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Deserialize)]
struct OrganicResult {
    title: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
    date: Option<String>,
}

#[derive(Debug)]
enum Error {
    Http(String),
    Api(String),
    Parse(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Api(e) => write!(f, "API error: {e}"),
            Error::Parse(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl SerperClient {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(api_key, SERPER_API_URL.to_string())
    }

    pub fn with_endpoint(api_key: String, endpoint: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            api_key,
            endpoint,
            client,
        }
    }

    async fn fetch(&self, query: &str) -> Result<Vec<SearchResult>, Error> {
        let request = SearchRequest {
            q: format!("{QUERY_PREFIX} {query}"),
            num: MAX_RESULTS,
            gl: "us",
            hl: "ru",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(parsed
            .organic
            .into_iter()
            .take(MAX_RESULTS)
            .map(|r| SearchResult {
                title: r.title.unwrap_or_default(),
                snippet: r.snippet.unwrap_or_default(),
                link: r.link.unwrap_or_default(),
                date: r.date.filter(|d| !d.is_empty()),
            })
            .collect())
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    async fn search(&self, query: &str) -> Vec<SearchResult> {
        let preview: String = query.chars().take(100).collect();
        info!("🔎 Searching: \"{}\"", preview);

        match self.fetch(query).await {
            Ok(results) => {
                for r in &results {
                    debug!("Search hit: {} ({})", r.link, r.date.as_deref().unwrap_or("undated"));
                }
                results
            }
            Err(e) => {
                error!("Search error: {e}");
                vec![]
            }
        }
    }
}
