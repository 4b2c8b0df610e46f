//! Page fetching for the URL-driven tools
//!
//! [`PageSource`] is the one network seam in the crate. [`HttpFetcher`] issues a
//! plain `GET`; [`ProxyFetcher`] goes through a CORS-proxy that wraps the
//! target page in a JSON envelope. Tests substitute `MockPageSource`.

use crate::{metrics, Config, ToolError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub body: String,
    pub elapsed: Duration,
}

impl FetchedPage {
    pub fn size(&self) -> usize {
        self.body.len()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, ToolError>;
}

fn build_client(config: &Config) -> Result<reqwest::Client, ToolError> {
    let mut builder = reqwest::Client::builder().user_agent(config.user_agent());
    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| ToolError::ConfigurationError(e.to_string()))
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self, ToolError> {
        Ok(Self {
            client: build_client(config)?,
        })
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, ToolError> {
        let start = Instant::now();
        debug!("GET {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            warn!("{} answered with HTTP {}", url, status.as_u16());
        }

        let body = response.text().await?;
        let elapsed = start.elapsed();
        metrics::record_fetch(elapsed);

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            status: status.as_u16(),
            body,
            elapsed,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProxyEnvelope {
    contents: Option<String>,
    status: Option<ProxyStatus>,
}

#[derive(Debug, Deserialize)]
struct ProxyStatus {
    url: Option<String>,
    http_code: Option<u16>,
}

/// Fetches pages through `<endpoint>?url=<target>`, reading `contents` from
/// the JSON reply.
pub struct ProxyFetcher {
    client: reqwest::Client,
    endpoint: Url,
}

impl ProxyFetcher {
    pub fn new(config: &Config, endpoint: &str) -> Result<Self, ToolError> {
        let endpoint = crate::validate_url(endpoint)
            .map_err(|e| ToolError::ConfigurationError(e.to_string()))?;
        Ok(Self {
            client: build_client(config)?,
            endpoint,
        })
    }

    pub fn request_url(&self, target: &Url) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("url", target.as_str());
        url
    }
}

#[async_trait]
impl PageSource for ProxyFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, ToolError> {
        let start = Instant::now();
        let request_url = self.request_url(url);
        debug!("GET {} via proxy {}", url, self.endpoint);

        let response = self.client.get(request_url).send().await?;
        if !response.status().is_success() {
            return Err(ToolError::NetworkError(format!(
                "proxy answered with HTTP {}",
                response.status().as_u16()
            )));
        }

        let envelope: ProxyEnvelope = response.json().await?;
        let body = envelope.contents.ok_or_else(|| {
            ToolError::NetworkError("proxy reply carried no page contents".to_string())
        })?;
        let elapsed = start.elapsed();
        metrics::record_fetch(elapsed);

        let (final_url, status) = match envelope.status {
            Some(status) => (
                status.url.unwrap_or_else(|| url.to_string()),
                status.http_code.unwrap_or(200),
            ),
            None => (url.to_string(), 200),
        };

        Ok(FetchedPage {
            url: url.to_string(),
            final_url,
            status,
            body,
            elapsed,
        })
    }
}

/// Picks the fetcher for tools that may go through the configured proxy.
pub fn page_source(config: &Config, use_proxy: bool) -> Result<Box<dyn PageSource>, ToolError> {
    match (&config.proxy_endpoint, use_proxy) {
        (Some(endpoint), true) => Ok(Box::new(ProxyFetcher::new(config, endpoint)?)),
        (None, true) => Err(ToolError::ConfigurationError(
            "proxy requested but no proxy_endpoint is configured".to_string(),
        )),
        _ => Ok(Box::new(HttpFetcher::new(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_request_url_encodes_target() {
        let config = Config::default();
        let fetcher = ProxyFetcher::new(&config, "https://api.allorigins.win/get").unwrap();
        let target = Url::parse("https://example.com/?a=1&b=2").unwrap();
        assert_eq!(
            fetcher.request_url(&target).as_str(),
            "https://api.allorigins.win/get?url=https%3A%2F%2Fexample.com%2F%3Fa%3D1%26b%3D2"
        );
    }

    #[test]
    fn test_proxy_envelope_parses() {
        let raw = r#"{"contents":"<html></html>","status":{"url":"https://example.com/","http_code":200}}"#;
        let envelope: ProxyEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.contents.as_deref(), Some("<html></html>"));
        assert_eq!(envelope.status.unwrap().http_code, Some(200));
    }

    #[test]
    fn test_page_source_requires_endpoint_for_proxy() {
        let config = Config::default();
        assert!(matches!(
            page_source(&config, true),
            Err(ToolError::ConfigurationError(_))
        ));
        assert!(page_source(&config, false).is_ok());
    }
}
