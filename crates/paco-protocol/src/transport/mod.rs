//! Transport layer for platform requests
//!
//! [`Transport`] is the seam between the services and the wire. Every
//! endpoint is a path plus query string appended verbatim to the base URL;
//! the same string doubles as the result cache key for cacheable reads.

use async_trait::async_trait;
use bytes::Bytes;
use paco_cache::{CacheKey, ResultCache};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Once};
use tracing::{debug, trace};

use crate::config::ClientConfig;
use crate::error::{ProtocolError, Result};

/// Header carrying the protocol version on every request
pub const PROTOCOL_HEADER: &str = "pacoprotocol";

static CRYPTO_PROVIDER: Once = Once::new();

/// Install the ring crypto provider for rustls once per process
pub fn ensure_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// A successful response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Bytes,
    /// Served from the result cache without a request
    pub cached: bool,
}

impl TransportResponse {
    pub fn new(status: StatusCode, body: Bytes) -> Self {
        Self {
            status,
            body,
            cached: false,
        }
    }

    pub fn from_cache(body: Bytes) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            cached: true,
        }
    }

    pub fn text(&self) -> Result<String> {
        Ok(String::from_utf8(self.body.to_vec())?)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET.
    ///
    /// With `cacheable` set, a cached body for `endpoint` is returned without
    /// a request, and a successful fetch is stored under `endpoint`.
    async fn get(&self, endpoint: &str, cacheable: bool) -> Result<TransportResponse>;

    /// Issue a POST with an optional JSON body. Never cached.
    async fn post(
        &self,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<TransportResponse>;
}

/// HTTP transport backed by reqwest and the shared result cache
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    cache: Arc<ResultCache>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig, cache: Arc<ResultCache>) -> Result<Self> {
        ensure_crypto_provider();

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(PROTOCOL_HEADER),
            HeaderValue::from(config.protocol_version),
        );

        let mut builder = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("paco-protocol/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    fn url(&self, endpoint: &str) -> Result<String> {
        if !endpoint.starts_with('/') {
            return Err(ProtocolError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(format!("{}{}", self.base_url, endpoint))
    }

    async fn send(&self, request: RequestBuilder) -> Result<TransportResponse> {
        let response = request.send().await?;

        match response.status() {
            status if status.is_success() => {
                let body = response.bytes().await?;
                trace!("Response {} ({} bytes)", status, body.len());
                Ok(TransportResponse::new(status, body))
            }
            status => Err(ProtocolError::from_status(status)),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, endpoint: &str, cacheable: bool) -> Result<TransportResponse> {
        if cacheable && let Some(body) = self.cache.get(endpoint) {
            return Ok(TransportResponse::from_cache(body));
        }

        let url = self.url(endpoint)?;
        debug!("GET {}", url);
        let response = self.send(self.client.get(&url)).await?;

        if cacheable {
            self.cache
                .put(CacheKey::from(endpoint), response.body.clone());
        }

        Ok(response)
    }

    async fn post(
        &self,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<TransportResponse> {
        let url = self.url(endpoint)?;
        debug!("POST {}", url);

        let mut request = self.client.post(&url);
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(&body)?);
        }

        self.send(request).await
    }
}
