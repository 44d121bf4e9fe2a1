//! Wire transport for upstream calls.
//!
//! The executor talks to the network only through [`Transport`], which sends a
//! single request and reports whatever status came back. Classifying that
//! status is the executor's job.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::descriptor::UpstreamCallDescriptor;
use super::error::UpstreamError;

/// Header carrying the API token on upstream requests.
pub const TOKEN_HEADER: &str = "token";

/// A raw response from the upstream API.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one attempt of an upstream call.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the described request once.
    ///
    /// Returns `Ok` for any HTTP response, whatever its status, and `Err` only
    /// when no usable response was received.
    async fn send(&self, descriptor: &UpstreamCallDescriptor)
    -> Result<UpstreamResponse, UpstreamError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Create a transport for `base_url` with a per-attempt timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                UpstreamError::invalid_request(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> Result<String, UpstreamError> {
        if !path.starts_with('/') {
            return Err(UpstreamError::invalid_request(format!(
                "path must be absolute: '{path}'"
            )));
        }
        Ok(format!("{}{}", self.base_url, path))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        descriptor: &UpstreamCallDescriptor,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.url_for(&descriptor.path)?;
        debug!("{} {}", descriptor.method, url);

        let mut request = self
            .client
            .request(descriptor.method.into(), &url)
            .header(TOKEN_HEADER, descriptor.credential.expose())
            .query(&descriptor.query);

        if let Some(body) = &descriptor.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(classify_send_error)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(classify_send_error)?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(json) => json,
                Err(e) if (200..300).contains(&status) => {
                    return Err(UpstreamError::MalformedResponse(e.to_string()));
                }
                // Error pages are often HTML or plain text; keep them readable.
                Err(_) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
            }
        };

        Ok(UpstreamResponse::new(status, body))
    }
}

fn classify_send_error(error: reqwest::Error) -> UpstreamError {
    if error.is_builder() {
        UpstreamError::invalid_request(error.to_string())
    } else if error.is_timeout() {
        UpstreamError::timeout(error.to_string())
    } else {
        UpstreamError::network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport =
            ReqwestTransport::new("https://api.pipe.run/v1/", Duration::from_secs(30)).unwrap();
        assert_eq!(transport.base_url(), "https://api.pipe.run/v1");
        assert_eq!(
            transport.url_for("/deals/5").unwrap(),
            "https://api.pipe.run/v1/deals/5"
        );
    }

    #[test]
    fn test_relative_path_rejected() {
        let transport =
            ReqwestTransport::new("https://api.pipe.run/v1", Duration::from_secs(30)).unwrap();
        assert!(matches!(
            transport.url_for("deals"),
            Err(UpstreamError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_response_success_range() {
        assert!(UpstreamResponse::new(200, Value::Null).is_success());
        assert!(UpstreamResponse::new(201, Value::Null).is_success());
        assert!(!UpstreamResponse::new(301, Value::Null).is_success());
        assert!(!UpstreamResponse::new(503, Value::Null).is_success());
    }
}
