//! HTTP collaborator contract and its reqwest implementation.
//!
//! The remote state client only needs `get`; `post` is part of the contract
//! so a single transport can be shared with other ar.io services.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::abort::AbortSignal;
use crate::error::HttpError;

/// Result type for transport operations
pub type HttpResult<T> = std::result::Result<T, HttpError>;

const USER_AGENT: &str = concat!("ario-state/", env!("CARGO_PKG_VERSION"));

/// A `GET` request relative to the client's base URL.
#[derive(Debug, Clone, Default)]
pub struct GetRequest {
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    /// Non-2xx statuses the caller wants to inspect instead of failing on.
    pub allowed_statuses: Vec<u16>,
    pub signal: Option<AbortSignal>,
}

impl GetRequest {
    pub fn new(endpoint: impl Into<String>) -> Self {
        GetRequest {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn allow_status(mut self, status: u16) -> Self {
        self.allowed_statuses.push(status);
        self
    }

    pub fn with_signal(mut self, signal: Option<AbortSignal>) -> Self {
        self.signal = signal;
        self
    }
}

/// A `POST` request. Unlike reads, writes always carry an abort signal.
#[derive(Debug, Clone)]
pub struct PostRequest {
    pub endpoint: String,
    pub headers: BTreeMap<String, String>,
    pub allowed_statuses: Vec<u16>,
    pub signal: AbortSignal,
    pub data: Vec<u8>,
}

/// Raw response: status plus body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

/// Transport capability used by state providers.
///
/// Implementations must report statuses outside 2xx and `allowed_statuses`
/// as `HttpError::Status`, and an aborted signal as `HttpError::Cancelled`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, request: GetRequest) -> HttpResult<HttpResponse>;

    async fn post(&self, request: PostRequest) -> HttpResult<HttpResponse>;
}

/// Fail unless `status` is 2xx or explicitly allowed.
pub fn check_status(endpoint: &str, status: u16, allowed_statuses: &[u16]) -> HttpResult<()> {
    if (200..300).contains(&status) || allowed_statuses.contains(&status) {
        Ok(())
    } else {
        Err(HttpError::Status {
            endpoint: endpoint.to_string(),
            status,
        })
    }
}

/// `HttpClient` over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> HttpResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| HttpError::from_reqwest(base_url, err))?;

        Ok(ReqwestHttpClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn execute(
        &self,
        endpoint: &str,
        builder: reqwest::RequestBuilder,
        allowed_statuses: &[u16],
        signal: Option<&AbortSignal>,
    ) -> HttpResult<HttpResponse> {
        let exchange = async {
            let response = builder
                .send()
                .await
                .map_err(|err| HttpError::from_reqwest(endpoint, err))?;
            let status = response.status().as_u16();
            check_status(endpoint, status, allowed_statuses)?;
            let body = response
                .bytes()
                .await
                .map_err(|err| HttpError::from_reqwest(endpoint, err))?;
            debug!(endpoint = %endpoint, status, bytes = body.len(), "http response");
            Ok(HttpResponse {
                status,
                body: body.to_vec(),
            })
        };

        match signal {
            Some(signal) => tokio::select! {
                biased;
                _ = signal.aborted() => Err(HttpError::Cancelled {
                    endpoint: endpoint.to_string(),
                }),
                result = exchange => result,
            },
            None => exchange.await,
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, request: GetRequest) -> HttpResult<HttpResponse> {
        let mut builder = self.http_client.get(self.url(&request.endpoint));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        self.execute(
            &request.endpoint,
            builder,
            &request.allowed_statuses,
            request.signal.as_ref(),
        )
        .await
    }

    async fn post(&self, request: PostRequest) -> HttpResult<HttpResponse> {
        let mut builder = self
            .http_client
            .post(self.url(&request.endpoint))
            .body(request.data);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        self.execute(
            &request.endpoint,
            builder,
            &request.allowed_statuses,
            Some(&request.signal),
        )
        .await
    }
}
