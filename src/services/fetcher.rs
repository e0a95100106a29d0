use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use url::Url;

use crate::{
    configuration::{self, ProxySettings},
    error::ScrapeError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Static,
    Rendered,
}

/// One fetch attempt. The URL is validated up front so a bad template
/// substitution fails before any network traffic.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub url: Url,
    pub mode: FetchMode,
}

impl PageRequest {
    pub fn new(url: &str, mode: FetchMode) -> Result<Self, ScrapeError> {
        let parsed = Url::parse(url).map_err(|source| ScrapeError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        Ok(PageRequest { url: parsed, mode })
    }

    pub fn static_page(url: &str) -> Result<Self, ScrapeError> {
        PageRequest::new(url, FetchMode::Static)
    }

    pub fn rendered_page(url: &str) -> Result<Self, ScrapeError> {
        PageRequest::new(url, FetchMode::Rendered)
    }
}

/// Raw page markup, consumed by exactly one extraction pass.
#[derive(Debug)]
pub struct PageContent {
    html: String,
}

impl PageContent {
    pub fn new(html: String) -> Self {
        PageContent { html }
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

/// Single fetch contract shared by the static and the browser-driven
/// implementations.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch(&self, request: &PageRequest) -> Result<PageContent, ScrapeError>;
}

/// Static fetcher: one GET per page through a shared client carrying the
/// user-agent header and cookie jar across the whole run. No retries.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, proxy: &ProxySettings) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(configuration::USER_AGENT));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(timeout);

        if proxy.enabled {
            log::info!("Proxy feature enabled");
            let http_proxy = reqwest::Proxy::http(proxy.http_url).map_err(ScrapeError::Client)?;
            let https_proxy = reqwest::Proxy::https(proxy.https_url).map_err(ScrapeError::Client)?;
            builder = builder.proxy(http_proxy).proxy(https_proxy);
        }

        let client = builder.build().map_err(ScrapeError::Client)?;
        Ok(HttpFetcher { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<PageContent, ScrapeError> {
        let url = request.url.clone();

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| ScrapeError::Network {
                url: url.to_string(),
                source,
            })?;

        let html = response.text().await.map_err(|source| ScrapeError::Network {
            url: url.to_string(),
            source,
        })?;

        Ok(PageContent::new(html))
    }
}
