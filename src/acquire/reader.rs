//! Reader proxy fallback that returns pages as plain text.

use super::fetch::BROWSER_USER_AGENT;
use super::StageOutcome;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;

/// Proxy that renders `{base}/{scheme}://{host}{path}` as readable text.
#[derive(Debug, Clone)]
pub struct ReaderProxy {
    client: Client,
    base: String,
}

impl ReaderProxy {
    pub fn new(client: Client, base: &str) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Proxied URLs for `url`, https target first.
    pub fn proxied_urls(&self, url: &str) -> Option<Vec<String>> {
        let parsed = url::Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        let netloc = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let query = parsed
            .query()
            .map(|q| format!("?{}", q))
            .unwrap_or_default();

        Some(
            ["https", "http"]
                .iter()
                .map(|scheme| format!("{}/{}://{}{}{}", self.base, scheme, netloc, parsed.path(), query))
                .collect(),
        )
    }

    pub async fn fetch(&self, url: &str) -> StageOutcome<String> {
        let Some(targets) = self.proxied_urls(url) else {
            return StageOutcome::Failed(format!("unparseable URL: {}", url));
        };

        let mut failure = None;
        for target in targets {
            let response = self
                .client
                .get(&target)
                .header(USER_AGENT, BROWSER_USER_AGENT)
                .header(ACCEPT, "text/plain,*/*;q=0.8")
                .send()
                .await;
            match response {
                Ok(resp) if resp.status().is_success() => match resp.text().await {
                    Ok(text) if !text.trim().is_empty() => return StageOutcome::Content(text),
                    Ok(_) => {}
                    Err(e) => failure = Some(e.to_string()),
                },
                Ok(resp) => failure = Some(format!("HTTP {}", resp.status().as_u16())),
                Err(e) => failure = Some(e.to_string()),
            }
        }

        match failure {
            Some(reason) => StageOutcome::Failed(reason),
            None => StageOutcome::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_proxied_urls_keep_path_and_query() {
        let proxy = ReaderProxy::new(Client::new(), "https://reader.test/");
        let urls = proxy
            .proxied_urls("https://www.news.test:8443/a/b?x=1")
            .unwrap();
        assert_eq!(
            urls,
            vec![
                "https://reader.test/https://www.news.test:8443/a/b?x=1".to_string(),
                "https://reader.test/http://www.news.test:8443/a/b?x=1".to_string(),
            ]
        );
        assert!(proxy.proxied_urls("not a url").is_none());
    }

    #[tokio::test]
    async fn test_falls_back_to_http_target() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Readable text"))
            .mount(&server)
            .await;

        let proxy = ReaderProxy::new(Client::new(), &server.uri());
        let outcome = proxy.fetch("https://news.test/story").await;
        assert_eq!(outcome, StageOutcome::Content("Readable text".to_string()));
    }
}
