//! Paid extraction API fallback.

use super::StageOutcome;
use crate::config::credential_present;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

const DEFAULT_BASE_URL: &str = "https://api.diffbot.com/v3";
const MIN_TEXT_CHARS: usize = 200;
const MAX_LIST_ITEMS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Api {
    Article,
    List,
}

impl Api {
    fn path(&self) -> &'static str {
        match self {
            Api::Article => "article",
            Api::List => "list",
        }
    }

    fn text_from(&self, payload: &Value) -> Option<String> {
        match self {
            Api::Article => article_text(payload),
            Api::List => list_text(payload),
        }
    }
}

/// Client for the article and list extraction endpoints.
#[derive(Debug, Clone)]
pub struct DiffbotClient {
    client: Client,
    token: String,
    base_url: String,
}

impl DiffbotClient {
    pub fn new(client: Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Build a client when the token variable is set.
    pub fn from_env(client: Client, token_env: &str) -> Option<Self> {
        if !credential_present(token_env) {
            return None;
        }
        std::env::var(token_env).ok().map(|token| Self::new(client, token))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Fetch readable text for `url`.
    ///
    /// Listing-like URLs try the list endpoint first, everything else the
    /// article endpoint first; the other endpoint is the fallback.
    pub async fn fetch(&self, url: &str) -> StageOutcome<String> {
        let order = if looks_like_listing(url) {
            [Api::List, Api::Article]
        } else {
            [Api::Article, Api::List]
        };

        let mut failure = None;
        for api in order {
            match self.request(api, url).await {
                Ok(Some(payload)) => {
                    if let Some(text) = api.text_from(&payload) {
                        if text.trim().chars().count() > MIN_TEXT_CHARS {
                            return StageOutcome::Content(text);
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => failure = Some(e),
            }
        }

        match failure {
            Some(reason) => StageOutcome::Failed(reason),
            None => StageOutcome::Empty,
        }
    }

    async fn request(&self, api: Api, url: &str) -> Result<Option<Value>, String> {
        let endpoint = format!("{}/{}", self.base_url, api.path());
        let response = self
            .client
            .get(&endpoint)
            .query(&[("token", self.token.as_str()), ("url", url)])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            info!(api = api.path(), status = response.status().as_u16(), "Extraction API non-200");
            return Ok(None);
        }

        let payload: Value = response.json().await.map_err(|e| e.to_string())?;
        Ok(payload.is_object().then_some(payload))
    }
}

fn looks_like_listing(url: &str) -> bool {
    let lowered = url.to_lowercase();
    ["/newsletters/", "/category/", "/tag/"]
        .iter()
        .any(|s| lowered.contains(s))
}

fn first_object(payload: &Value) -> Option<&Value> {
    payload.get("objects")?.as_array()?.first()
}

fn article_text(payload: &Value) -> Option<String> {
    let object = first_object(payload)?;
    ["text", "html"]
        .iter()
        .filter_map(|field| object.get(field).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numbered plain text from list items, so it parses like a listing page.
fn list_text(payload: &Value) -> Option<String> {
    let items = first_object(payload)?.get("items")?.as_array()?;
    let mut parts = Vec::new();
    for (idx, item) in items.iter().take(MAX_LIST_ITEMS).enumerate() {
        let field = |name: &str| {
            item.get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };
        let title = field("title");
        let summary = field("summary");
        if !title.is_empty() {
            parts.push(format!("{}. {}", idx + 1, title));
        }
        if !summary.is_empty() {
            parts.push(summary);
        }
    }
    let text = parts.join("\n\n");
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_list_payload_is_numbered() {
        let payload = json!({"objects": [{"items": [
            {"title": "First", "summary": "One."},
            {"title": "Second"}
        ]}]});
        assert_eq!(list_text(&payload).unwrap(), "1. First\n\nOne.\n\n2. Second");
    }

    #[test]
    fn test_article_prefers_text_over_html() {
        let payload = json!({"objects": [{"text": "  ", "html": "<p>Body</p>"}]});
        assert_eq!(article_text(&payload).unwrap(), "<p>Body</p>");
        assert!(article_text(&json!({"objects": []})).is_none());
    }

    #[tokio::test]
    async fn test_listing_url_tries_list_first() {
        let server = MockServer::start().await;
        let items: Vec<Value> = (0..6)
            .map(|i| json!({"title": format!("Story {}", i), "summary": "A summary sentence that is long enough."}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/list"))
            .and(query_param("token", "t"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"objects": [{"items": items}]})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"objects": [{"text": "x"}]})))
            .expect(0)
            .mount(&server)
            .await;

        let client = DiffbotClient::new(Client::new(), "t").with_base_url(&server.uri());
        let outcome = client.fetch("https://news.test/newsletters/ai").await;
        assert!(outcome.content().unwrap().starts_with("1. Story 0"));
    }

    #[tokio::test]
    async fn test_short_results_are_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"objects": [{"text": "short"}]})))
            .mount(&server)
            .await;

        let client = DiffbotClient::new(Client::new(), "t").with_base_url(&server.uri());
        assert_eq!(client.fetch("https://news.test/a").await, StageOutcome::Empty);
    }
}
