use crate::error::FeedError;
use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects a static API key as an HTTP header.
///
/// The header name and value are validated once, at construction, so
/// `execute` never has to fail on them.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

impl<C> ApiKey<C> {
    /// Wraps `inner` so that every request carries `header_name: key`.
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self, FeedError> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes()).map_err(|e| {
            FeedError::InvalidHeader {
                name: header_name.to_string(),
                reason: e.to_string(),
            }
        })?;
        let mut key = HeaderValue::from_str(key).map_err(|e| FeedError::InvalidHeader {
            name: header_name.as_str().to_string(),
            reason: e.to_string(),
        })?;
        key.set_sensitive(true);

        Ok(Self {
            inner,
            header_name,
            key,
        })
    }

    /// Uses `x-api-key`, the header the MTA feed endpoints expect.
    pub fn mta(inner: C, key: &str) -> Result<Self, FeedError> {
        Self::new(inner, crate::config::API_KEY_HEADER, key)
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.key.clone());
        self.inner.execute(req).await
    }

    fn is_authenticated(&self) -> bool {
        true
    }
}
