//! HTTP transport
//!
//! This module owns the seam between the engine and the network: a
//! [`Transport`] trait executing one prepared request, and the reqwest-backed
//! implementation that classifies failures into the crate's error taxonomy.
//! Tests substitute deterministic transports behind the same trait.

use crate::config::Config;
use crate::engine::strategy::RawResponse;
use crate::{ConfigError, HarvestError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, USER_AGENT};
use reqwest::{Client, Request};
use std::time::Duration;

/// Executes one prepared request and returns the raw response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<RawResponse>;
}

/// Reqwest-backed transport sharing one client/session across a run
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: Request) -> Result<RawResponse> {
        let url = request.url().to_string();
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| classify_error(e, &url))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| classify_error(e, &url))?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify_error(error: reqwest::Error, url: &str) -> HarvestError {
    if error.is_timeout() {
        HarvestError::Timeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Builds the shared HTTP client for a run
///
/// The pre-supplied session cookie and user agent ride along as default
/// headers on every request; the engine never acquires or refreshes
/// credentials itself. A malformed cookie is a fatal configuration error.
pub fn build_http_client(config: &Config) -> Result<Client> {
    let mut headers = HeaderMap::new();
    let cookie = HeaderValue::from_str(&config.session.cookie).map_err(|_| {
        HarvestError::Config(ConfigError::Validation(
            "session cookie contains characters not valid in a header".to_string(),
        ))
    })?;
    headers.insert(COOKIE, cookie);

    let user_agent = HeaderValue::from_str(&config.session.user_agent).map_err(|_| {
        HarvestError::Config(ConfigError::Validation(
            "user-agent contains characters not valid in a header".to_string(),
        ))
    })?;
    headers.insert(USER_AGENT, user_agent);

    let client = Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.engine.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn test_build_http_client() {
        let config = test_config();
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_newline_in_cookie_is_fatal() {
        let mut config = test_config();
        config.session.cookie = "SUB=abc\ndef".to_string();
        let err = build_http_client(&config).unwrap_err();
        assert!(matches!(err, HarvestError::Config(_)));
    }
}
