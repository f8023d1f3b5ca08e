//! The HTTP session underlying every remote call.
//!
//! A [`DocumentCloud`] instance owns two long-lived `reqwest` clients,
//! constructed once and reused for the whole run:
//!
//! * the **API session** — attaches the bearer token, used for everything
//!   under the API base URI (and for asset URLs that live on the API host,
//!   so private assets stay reachable);
//! * the **anonymous session** — a fixed identifying `User-Agent`, no
//!   credentials, used for presigned storage uploads and for asset hosts
//!   other than the API's.
//!
//! Both share the retry contract: transient failures (HTTP 429, 5xx,
//! network errors) are retried with exponential backoff (1s, 2s, 4s, …
//! capped at 32s) up to `max_retries` times; other non-success statuses
//! fail immediately as [`Error::Transport`] with status and body.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::documents::DocumentClient;
use crate::error::{Error, Result};

/// A client session for the DocumentCloud API.
pub struct DocumentCloud {
    config: ClientConfig,
    api: reqwest::Client,
    anonymous: reqwest::Client,
}

impl DocumentCloud {
    /// Build a client from configuration. The underlying HTTP clients are
    /// created here and reused for every subsequent call.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let api = reqwest::Client::builder().timeout(timeout).build()?;
        let anonymous = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            config,
            api,
            anonymous,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Access the documents API.
    pub fn documents(&self) -> DocumentClient<'_> {
        DocumentClient::new(self)
    }

    /// Join a relative API path onto the base URI.
    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_uri, path)
    }

    /// Whether a URL lives on the same host as the API itself.
    pub(crate) fn is_api_host(&self, url: &str) -> Result<bool> {
        let base = reqwest::Url::parse(&self.config.base_uri)
            .map_err(|_| Error::InvalidUrl(self.config.base_uri.clone()))?;
        let target =
            reqwest::Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?;
        Ok(base.host_str() == target.host_str())
    }

    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Authenticated GET of a relative API path.
    pub(crate) async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = self.api_url(path);
        self.send_with_retry(|| self.with_auth(self.api.get(url.as_str())))
            .await
    }

    /// Authenticated GET of an absolute URL (asset URLs on the API host).
    pub(crate) async fn get_full_url(&self, url: &str) -> Result<reqwest::Response> {
        self.send_with_retry(|| self.with_auth(self.api.get(url))).await
    }

    /// Authenticated GET, decoding the JSON response body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.get(path).await?;
        Ok(response.json().await?)
    }

    /// Authenticated POST of a JSON body to a relative API path.
    pub(crate) async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response> {
        let url = self.api_url(path);
        self.send_with_retry(|| self.with_auth(self.api.post(url.as_str())).json(body))
            .await
    }

    /// Anonymous GET with the identifying User-Agent and retry policy.
    pub(crate) async fn anonymous_get(&self, url: &str) -> Result<reqwest::Response> {
        self.send_with_retry(|| self.anonymous.get(url)).await
    }

    /// Anonymous PUT of raw bytes, used for presigned storage uploads.
    pub(crate) async fn anonymous_put(&self, url: &str, bytes: Vec<u8>) -> Result<()> {
        self.send_with_retry(|| self.anonymous.put(url).body(bytes.clone()))
            .await?;
        Ok(())
    }

    /// Issue a request with bounded retries and exponential backoff.
    ///
    /// The request is rebuilt for every attempt. Retries: HTTP 429, 5xx,
    /// and network errors. Any other non-success status fails immediately.
    pub(crate) async fn send_with_retry<F>(&self, make: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_err = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }
            match make().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    let body = response.text().await.unwrap_or_default();
                    let err = Error::Transport {
                        status: status.as_u16(),
                        body,
                    };
                    if !err.is_retryable() {
                        return Err(err);
                    }
                    last_err = Some(err);
                }
                Err(e) => {
                    last_err = Some(Error::Http(e));
                }
            }
        }
        // The loop always runs at least once, so last_err is set.
        Err(last_err
            .unwrap_or_else(|| Error::Config("retry loop made no attempts".to_string())))
    }
}
