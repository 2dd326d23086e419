//! Resilient page fetching.
//!
//! A page is loaded directly with browser-like headers and retried on
//! transient statuses. When that fails, or the response looks like a block
//! page, the extraction API and then the reader proxy are tried in turn.

use super::{DiffbotClient, ReaderProxy, StageOutcome};
use crate::config::FetchSettings;
use crate::error::{NewscastError, Result};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Statuses worth another attempt.
const RETRY_STATUSES: [u16; 8] = [403, 404, 408, 429, 500, 502, 503, 504];

const BLOCK_SIGNALS: [&str; 6] = [
    "verify you are human",
    "needs to review the security of your connection",
    "access denied",
    "forbidden",
    "captcha",
    "target url returned error",
];

/// Minimum length of a directly fetched page before it is trusted.
const MIN_PAGE_CHARS: usize = 200;

/// Loads pages and feeds by URL or local path.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a page through every available route. `None` when all fail.
    async fn fetch_page(&self, url: &str) -> Option<String>;

    /// Download a feed document.
    async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>>;
}

/// Check whether a response is too short or looks like an anti-bot page.
pub fn looks_blocked_or_too_short(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.chars().count() < MIN_PAGE_CHARS || contains_block_signal(trimmed)
}

fn contains_block_signal(text: &str) -> bool {
    let lowered = text.to_lowercase();
    BLOCK_SIGNALS.iter().any(|s| lowered.contains(s))
}

#[derive(Debug)]
enum AttemptError {
    Status(u16),
    Network(String),
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptError::Status(code) => write!(f, "HTTP {}", code),
            AttemptError::Network(e) => write!(f, "{}", e),
        }
    }
}

/// HTTP fetcher with retry, extraction API and reader proxy fallbacks.
pub struct HttpPageFetcher {
    client: Client,
    retry: RetryPolicy,
    diffbot: Option<DiffbotClient>,
    reader: Option<ReaderProxy>,
}

impl HttpPageFetcher {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self {
            client,
            retry,
            diffbot: None,
            reader: None,
        }
    }

    /// Build a fetcher from settings. The extraction API is only enabled when
    /// its token is present in the environment.
    pub fn from_settings(settings: &FetchSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .build()
            .map_err(|e| NewscastError::Config(format!("HTTP client: {}", e)))?;

        let retry = RetryPolicy::from_secs_f64(settings.max_retries + 1, settings.backoff_secs);
        let diffbot = DiffbotClient::from_env(client.clone(), &settings.diffbot_token_env);
        if diffbot.is_none() {
            debug!(env = %settings.diffbot_token_env, "Extraction API token missing; fallback disabled");
        }
        let reader = (!settings.reader_proxy_base.trim().is_empty())
            .then(|| ReaderProxy::new(client.clone(), &settings.reader_proxy_base));

        Ok(Self::new(client, retry)
            .with_diffbot(diffbot)
            .with_reader(reader))
    }

    pub fn with_diffbot(mut self, diffbot: Option<DiffbotClient>) -> Self {
        self.diffbot = diffbot;
        self
    }

    pub fn with_reader(mut self, reader: Option<ReaderProxy>) -> Self {
        self.reader = reader;
        self
    }

    /// Direct GET with browser headers, retrying transient statuses.
    pub async fn fetch_direct(&self, url: &str) -> StageOutcome<String> {
        let result = self
            .retry
            .run("article_fetch", |_| {
                let request = self.client.get(url).headers(browser_headers(url));
                async move {
                    let response = request
                        .send()
                        .await
                        .map_err(|e| AttemptError::Network(e.to_string()))?;
                    let status = response.status().as_u16();
                    if RETRY_STATUSES.contains(&status) {
                        return Err(AttemptError::Status(status));
                    }
                    Ok(response)
                }
            })
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => return StageOutcome::Failed(e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return StageOutcome::Failed(format!("HTTP {}", status.as_u16()));
        }
        match response.text().await {
            Ok(body) if body.trim().is_empty() => StageOutcome::Empty,
            Ok(body) => StageOutcome::Content(body),
            Err(e) => StageOutcome::Failed(e.to_string()),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Option<String> {
        if let Some(local) = read_local(url).await {
            return Some(String::from_utf8_lossy(&local).into_owned());
        }

        let direct = match self.fetch_direct(url).await {
            StageOutcome::Content(body) if !looks_blocked_or_too_short(&body) => return Some(body),
            StageOutcome::Content(body) => {
                info!(url, "Direct fetch looks blocked or too short");
                Some(body)
            }
            StageOutcome::Empty => None,
            StageOutcome::Failed(reason) => {
                warn!(url, reason = %reason, "Article fetch failed");
                None
            }
        };

        if let Some(diffbot) = &self.diffbot {
            match diffbot.fetch(url).await {
                StageOutcome::Content(text) => {
                    info!(url, "Fetched via extraction API fallback");
                    return Some(text);
                }
                StageOutcome::Failed(reason) => {
                    debug!(url, reason = %reason, "Extraction API fallback failed")
                }
                StageOutcome::Empty => {}
            }
        }

        if let Some(reader) = &self.reader {
            if let StageOutcome::Content(text) = reader.fetch(url).await {
                info!(url, "Fetched via reader proxy fallback");
                return Some(text);
            }
        }

        // A short but unblocked page beats nothing.
        direct.filter(|body| !contains_block_signal(body))
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>> {
        if let Some(local) = read_local(url).await {
            return Ok(local);
        }
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Read `file://` URLs and bare existing paths from disk.
async fn read_local(url: &str) -> Option<Vec<u8>> {
    let path = if url.starts_with("file://") {
        url::Url::parse(url).ok()?.to_file_path().ok()?
    } else if !url.contains("://") && Path::new(url).exists() {
        Path::new(url).to_path_buf()
    } else {
        return None;
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read local input");
            None
        }
    }
}

fn browser_headers(url: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    for (name, value) in [
        ("cache-control", "no-cache"),
        ("pragma", "no-cache"),
        ("dnt", "1"),
        ("upgrade-insecure-requests", "1"),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "none"),
        ("sec-fetch-user", "?1"),
    ] {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    if let Ok(referer) = HeaderValue::from_str(url) {
        headers.insert(reqwest::header::REFERER, referer);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn long_text(word: &str) -> String {
        format!("{} ", word).repeat(80)
    }

    fn fetcher(max_attempts: u32) -> HttpPageFetcher {
        HttpPageFetcher::new(
            Client::new(),
            RetryPolicy::new(max_attempts, Duration::ZERO),
        )
    }

    #[test]
    fn test_block_detection() {
        assert!(looks_blocked_or_too_short("tiny"));
        assert!(looks_blocked_or_too_short(&format!(
            "Please verify you are human. {}",
            long_text("x")
        )));
        assert!(!looks_blocked_or_too_short(&long_text("story")));
    }

    #[tokio::test]
    async fn test_direct_success_skips_fallbacks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .respond_with(ResponseTemplate::new(200).set_body_string(long_text("story")))
            .expect(1)
            .mount(&server)
            .await;

        let reader_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("proxy"))
            .expect(0)
            .mount(&reader_server)
            .await;

        let f = fetcher(2).with_reader(Some(ReaderProxy::new(Client::new(), &reader_server.uri())));
        let page = f.fetch_page(&format!("{}/article", server.uri())).await;
        assert!(page.unwrap().contains("story"));
    }

    #[tokio::test]
    async fn test_transient_status_is_retried_then_reader_used() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let reader_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Proxied plain text body"))
            .expect(1)
            .mount(&reader_server)
            .await;

        let f = fetcher(2).with_reader(Some(ReaderProxy::new(Client::new(), &reader_server.uri())));
        let page = f.fetch_page(&format!("{}/article", server.uri())).await;
        assert_eq!(page.as_deref(), Some("Proxied plain text body"));
    }

    #[tokio::test]
    async fn test_blocked_page_cascades_to_extraction_api_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Access denied"))
            .mount(&server)
            .await;

        let api = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "objects": [{"text": long_text("extracted")}]
            })))
            .expect(1)
            .mount(&api)
            .await;

        let reader_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("proxy"))
            .expect(0)
            .mount(&reader_server)
            .await;

        let diffbot = DiffbotClient::new(Client::new(), "token").with_base_url(&api.uri());
        let f = fetcher(1)
            .with_diffbot(Some(diffbot))
            .with_reader(Some(ReaderProxy::new(Client::new(), &reader_server.uri())));

        let page = f.fetch_page(&format!("{}/article", server.uri())).await.unwrap();
        assert!(page.starts_with("extracted"));
    }

    #[tokio::test]
    async fn test_block_page_is_never_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Please complete the captcha"))
            .mount(&server)
            .await;

        let page = fetcher(1).fetch_page(&format!("{}/article", server.uri())).await;
        assert!(page.is_none());
    }

    #[tokio::test]
    async fn test_local_file_input() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("issue.txt");
        std::fs::write(&file, "Local issue text").unwrap();

        let page = fetcher(1).fetch_page(file.to_str().unwrap()).await;
        assert_eq!(page.as_deref(), Some("Local issue text"));

        let url = url::Url::from_file_path(&file).unwrap();
        let feed = fetcher(1).fetch_feed(url.as_str()).await.unwrap();
        assert_eq!(feed, b"Local issue text");
    }
}
