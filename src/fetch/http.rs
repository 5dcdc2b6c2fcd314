//! HTTP-backed sessions and extractors
//!
//! A session is a configured `reqwest::Client`. Extraction either goes through
//! the extraction service (`/scrape-url`, `/clean-html`) or, in raw mode, GETs
//! the page directly.

use crate::config::{ExtractionMode, ExtractorConfig};
use crate::fetch::artifact::ContentType;
use crate::fetch::extractor::{Extractor, ExtractorError, ExtractorResponse};
use crate::session::SessionFactory;
use crate::RelayError;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use url::Url;

/// Launches one HTTP client per pooled session
#[derive(Debug, Clone)]
pub struct HttpSessionFactory {
    user_agent: String,
    request_timeout: Duration,
}

impl HttpSessionFactory {
    pub fn new(user_agent: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            request_timeout,
        }
    }

    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(
            config.user_agent.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )
    }
}

#[async_trait]
impl SessionFactory for HttpSessionFactory {
    type Handle = Client;

    async fn launch(&self) -> Result<Client, RelayError> {
        Ok(build_http_client(&self.user_agent, self.request_timeout)?)
    }
}

/// Builds an HTTP client with the relay's user agent and timeouts
///
/// # Example
///
/// ```
/// use scrape_relay::fetch::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client("scrape-relay/0.1", Duration::from_secs(30));
/// assert!(client.is_ok());
/// ```
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Client for the extraction service
#[derive(Debug, Clone)]
pub struct ServiceExtractor {
    endpoint: String,
    mode: ExtractionMode,
}

impl ServiceExtractor {
    /// `mode` must be `Markdown` or `CleanHtml`; anything else is treated as `Markdown`
    pub fn new(endpoint: impl Into<String>, mode: ExtractionMode) -> Self {
        let mode = match mode {
            ExtractionMode::CleanHtml => ExtractionMode::CleanHtml,
            _ => ExtractionMode::Markdown,
        };
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            mode,
        }
    }

    /// Route, response field and content type for the configured mode
    fn route(&self) -> (&'static str, &'static str, ContentType) {
        match self.mode {
            ExtractionMode::CleanHtml => ("clean-html", "html", ContentType::Html),
            _ => ("scrape-url", "markdown", ContentType::Markdown),
        }
    }
}

#[async_trait]
impl Extractor<Client> for ServiceExtractor {
    async fn extract(
        &self,
        client: &mut Client,
        url: &Url,
    ) -> Result<ExtractorResponse, ExtractorError> {
        let (route, field, content_type) = self.route();
        let endpoint = format!("{}/{}", self.endpoint, route);
        tracing::debug!("POST {} for {}", endpoint, url);

        let response = client
            .post(&endpoint)
            .json(&serde_json::json!({ "url": url.as_str() }))
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response)?;

        let body = response.text().await.map_err(transport_error)?;
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ExtractorError::malformed(format!("invalid JSON response: {}", e)))?;

        let content = value
            .get(field)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                ExtractorError::malformed(format!("response has no `{}` field", field))
            })?;

        Ok(ExtractorResponse {
            content: content.to_string(),
            content_type,
        })
    }
}

/// Fetches page HTML directly, without the extraction service
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectExtractor;

#[async_trait]
impl Extractor<Client> for DirectExtractor {
    async fn extract(
        &self,
        client: &mut Client,
        url: &Url,
    ) -> Result<ExtractorResponse, ExtractorError> {
        tracing::debug!("GET {}", url);
        let response = client
            .get(url.as_str())
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response)?;

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.contains("text/html") {
            return Err(ExtractorError::malformed(format!(
                "expected text/html, got `{}`",
                content_type
            )));
        }

        let body = response.text().await.map_err(transport_error)?;
        if body.trim().is_empty() {
            return Err(ExtractorError::malformed("empty response body"));
        }

        Ok(ExtractorResponse {
            content: body,
            content_type: ContentType::Html,
        })
    }
}

/// The extractor matching a configured mode
#[derive(Debug, Clone)]
pub enum HttpExtractor {
    Service(ServiceExtractor),
    Direct(DirectExtractor),
}

impl HttpExtractor {
    pub fn from_config(config: &ExtractorConfig) -> Self {
        match config.mode {
            ExtractionMode::Raw => Self::Direct(DirectExtractor),
            mode => Self::Service(ServiceExtractor::new(config.endpoint.clone(), mode)),
        }
    }
}

#[async_trait]
impl Extractor<Client> for HttpExtractor {
    async fn extract(
        &self,
        client: &mut Client,
        url: &Url,
    ) -> Result<ExtractorResponse, ExtractorError> {
        match self {
            Self::Service(service) => service.extract(client, url).await,
            Self::Direct(direct) => direct.extract(client, url).await,
        }
    }
}

/// Maps an HTTP status to an extractor error
///
/// | Status | Kind |
/// |--------|------|
/// | 2xx | ok |
/// | 409 | Conflict |
/// | 429, 5xx | Network |
/// | anything else | Malformed |
fn check_status(response: Response) -> Result<Response, ExtractorError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::CONFLICT {
        return Err(ExtractorError::conflict(
            "extraction service reports a specialized scraper for this URL",
        ));
    }

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return Err(ExtractorError::network(format!("HTTP {}", status.as_u16())));
    }

    Err(ExtractorError::malformed(format!(
        "unexpected HTTP {}",
        status.as_u16()
    )))
}

fn transport_error(e: reqwest::Error) -> ExtractorError {
    if e.is_timeout() {
        ExtractorError::network("request timeout")
    } else if e.is_connect() {
        ExtractorError::network(format!("connection failed: {}", e))
    } else {
        ExtractorError::network(e.to_string())
    }
}
