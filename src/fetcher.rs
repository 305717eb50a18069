use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::{redirect, Client, ClientBuilder, StatusCode};
use thiserror::Error;
use url::Url;

/// Some sites refuse requests that do not look like a browser.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request timed out")]
    Timeout,
    #[error("too many redirects (limit {MAX_REDIRECTS})")]
    TooManyRedirects,
    #[error("redirect response without a Location header")]
    MissingLocation,
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Network(reqwest::Error),
}

/// HTTP(S) retrieval with manual, capped redirect following and fixed
/// timeouts (30 s for content, 5 s for existence probes).
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .use_rustls_tls()
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(map_reqwest)?;
        Ok(Self { client })
    }

    /// Fetch a URL as text.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get_following_redirects(url).await?;
        response.text().await.map_err(map_reqwest)
    }

    /// Fetch a URL as raw bytes.
    pub async fn fetch_binary(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.get_following_redirects(url).await?;
        Ok(response.bytes().await.map_err(map_reqwest)?.to_vec())
    }

    /// HEAD probe: true only on a 200 response. Errors and timeouts read
    /// as "does not exist", never as failures.
    pub async fn probe_exists(&self, url: &str) -> bool {
        match self.client.head(url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(_) => false,
        }
    }

    async fn get_following_redirects(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let mut current =
            Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        for _ in 0..=MAX_REDIRECTS {
            let response = self
                .client
                .get(current.clone())
                .timeout(FETCH_TIMEOUT)
                .send()
                .await
                .map_err(map_reqwest)?;
            let status = response.status();
            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or(FetchError::MissingLocation)?;
                current = current
                    .join(location)
                    .map_err(|_| FetchError::InvalidUrl(location.to_string()))?;
                continue;
            }
            if status != StatusCode::OK {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    message: status
                        .canonical_reason()
                        .unwrap_or("unrecognized status")
                        .to_string(),
                });
            }
            return Ok(response);
        }
        Err(FetchError::TooManyRedirects)
    }
}

fn map_reqwest(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let body = fetcher
            .fetch_text(&format!("{}/page.html", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>hi</html>");
    }

    #[tokio::test]
    async fn fetches_binary() {
        let server = MockServer::start().await;
        let payload: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a];
        Mock::given(method("GET"))
            .and(path("/logo.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let bytes = fetcher
            .fetch_binary(&format!("{}/logo.png", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, payload);
    }

    #[tokio::test]
    async fn non_200_is_a_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let err = fetcher
            .fetch_text(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        match err {
            FetchError::Status { status, .. } => assert_eq!(status, 404),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let body = fetcher
            .fetch_text(&format!("{}/old", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "moved");
    }

    #[tokio::test]
    async fn caps_redirect_chains() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/loop"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let err = fetcher
            .fetch_text(&format!("{}/loop", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::TooManyRedirects));
    }

    #[tokio::test]
    async fn probe_is_true_only_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        assert!(fetcher.probe_exists(&format!("{}/robots.txt", server.uri())).await);
        assert!(!fetcher.probe_exists(&format!("{}/nope.txt", server.uri())).await);
    }

    #[tokio::test]
    async fn probe_swallows_connection_errors() {
        let fetcher = Fetcher::new().unwrap();
        assert!(!fetcher.probe_exists("http://127.0.0.1:1/robots.txt").await);
    }
}
