use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::error::{Result, ScraperError};
use crate::utils::headers::default_headers;
use crate::utils::retry::{retry_if, RetryPolicy};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// HTTP client with a base URL, per-request timeout and retry on transient failures.
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
    headers: HeaderMap,
}

pub struct HttpClientBuilder {
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
    headers: Option<HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy {
                max_attempts: DEFAULT_MAX_RETRIES,
                ..RetryPolicy::default()
            },
            headers: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_attempts = max_retries;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the default browser-like headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .gzip(true)
            .build()?;
        info!(
            "HttpClient initialized (timeout={}s, retries={})",
            self.timeout.as_secs(),
            self.retry.max_attempts
        );
        Ok(HttpClient {
            client,
            base_url: self.base_url,
            timeout: self.timeout,
            retry: self.retry,
            headers: self.headers.unwrap_or_else(|| default_headers(None)),
        })
    }
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Client with no base URL and default settings.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Absolute URLs pass through; anything else is joined onto the base URL.
    pub fn build_url(&self, url: &str) -> String {
        if url.starts_with("http") {
            return url.to_string();
        }
        format!("{}/{}", self.base_url, url.trim_start_matches('/'))
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ScraperError::Config(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ScraperError::Config(format!("invalid header value for {name}: {e}")))?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn set_auth(&mut self, token: &str, scheme: &str) -> Result<()> {
        let mut value = HeaderValue::from_str(&format!("{scheme} {token}"))
            .map_err(|e| ScraperError::Config(format!("invalid auth token: {e}")))?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    #[instrument(skip(self, params))]
    pub async fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<Response> {
        let full_url = self.build_url(url);
        info!("GET {}", full_url);
        self.send(|| self.client.get(&full_url).query(params)).await
    }

    #[instrument(skip(self, body))]
    pub async fn post_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<Response> {
        let full_url = self.build_url(url);
        info!("POST {}", full_url);
        self.send(|| self.client.post(&full_url).json(body)).await
    }

    #[instrument(skip(self, form))]
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Response> {
        let full_url = self.build_url(url);
        info!("POST {}", full_url);
        self.send(|| self.client.post(&full_url).form(form)).await
    }

    pub async fn get_text(&self, url: &str, params: &[(&str, &str)]) -> Result<String> {
        Ok(self.get(url, params).await?.text().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, &str)]) -> Result<T> {
        let body = self.get_text(url, params).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send<F>(&self, make_request: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let make_request = &make_request;
        let headers = &self.headers;
        retry_if(&self.retry, ScraperError::is_transient, || async move {
            let resp = make_request().headers(headers.clone()).send().await?;
            check_status(resp)
        })
        .await
    }
}

fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        debug!("{} {}", status.as_u16(), resp.url());
        Ok(resp)
    } else {
        Err(ScraperError::Status {
            status: status.as_u16(),
            url: resp.url().to_string(),
        })
    }
}

impl fmt::Display for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpClient(base_url={:?}, timeout={})",
            self.base_url,
            self.timeout.as_secs()
        )
    }
}
