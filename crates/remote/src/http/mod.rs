use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::gateway::{
    ActivityGateway, ProgressionGateway, Remote, RemoteError, SectionGateway, XpHistoryGateway,
};

mod activity;
mod mapping;
mod progression;
mod sections;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HttpConfigError {
    #[error("LEARN_API_BASE_URL is not set")]
    MissingBaseUrl,
    #[error("invalid LEARN_API_TIMEOUT_SECS value: {0}")]
    InvalidTimeout(String),
}

/// Connection settings for the learning backend.
///
/// Timeouts live here: the engine itself never enforces one.
#[derive(Clone)]
pub struct HttpConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Read `LEARN_API_BASE_URL`, `LEARN_API_TOKEN` and `LEARN_API_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `HttpConfigError` if the base URL is missing or the timeout is not a
    /// positive integer.
    pub fn from_env() -> Result<Self, HttpConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`HttpConfig::from_env`] with an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`HttpConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HttpConfigError> {
        let base_url = lookup("LEARN_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(HttpConfigError::MissingBaseUrl)?;
        let token = lookup("LEARN_API_TOKEN").filter(|v| !v.trim().is_empty());
        let timeout = match lookup("LEARN_API_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(HttpConfigError::InvalidTimeout(raw)),
            },
        };
        Ok(Self {
            base_url: base_url.trim().to_string(),
            token,
            timeout,
        })
    }
}

/// reqwest-backed implementation of every backend gateway.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    config: HttpConfig,
}

impl HttpGateway {
    /// # Errors
    ///
    /// Returns `RemoteError::Network` if the HTTP client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(map_transport_error)?;
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(RemoteError::NotFound),
            status => Err(RemoteError::Status(status.as_u16())),
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, RemoteError> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

fn map_transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout
    } else {
        RemoteError::Network(err.to_string())
    }
}

impl Remote {
    /// Build a `Remote` whose gateways all talk to the HTTP backend.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the HTTP client cannot be built.
    pub fn http(config: HttpConfig) -> Result<Self, RemoteError> {
        let gateway = HttpGateway::new(config)?;
        let sections: Arc<dyn SectionGateway> = Arc::new(gateway.clone());
        let progression: Arc<dyn ProgressionGateway> = Arc::new(gateway.clone());
        let activity: Arc<dyn ActivityGateway> = Arc::new(gateway.clone());
        let xp_history: Arc<dyn XpHistoryGateway> = Arc::new(gateway);
        Ok(Self {
            sections,
            progression,
            activity,
            xp_history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn config_requires_base_url() {
        let err = HttpConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, HttpConfigError::MissingBaseUrl);
    }

    #[test]
    fn config_reads_all_keys() {
        let config = HttpConfig::from_lookup(lookup(&[
            ("LEARN_API_BASE_URL", "https://api.example.test/api "),
            ("LEARN_API_TOKEN", "secret"),
            ("LEARN_API_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://api.example.test/api");
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn config_rejects_zero_timeout() {
        let err = HttpConfig::from_lookup(lookup(&[
            ("LEARN_API_BASE_URL", "http://localhost"),
            ("LEARN_API_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, HttpConfigError::InvalidTimeout(_)));
    }

    #[test]
    fn urls_join_without_double_slash() {
        let gateway = HttpGateway::new(HttpConfig::new("http://localhost:3000/api/")).unwrap();
        assert_eq!(
            gateway.url("/profile/progression"),
            "http://localhost:3000/api/profile/progression"
        );
    }
}
