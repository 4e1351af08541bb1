//! Request/response values and the base request-sender.
//!
//! [`Transport`] is the seam the authenticated client decorates. The real
//! implementation, [`HttpTransport`], sends requests with reqwest; tests plug
//! in scripted senders instead.

use async_trait::async_trait;
use reqwest::{
    Client, Method, StatusCode, Url,
    header::{AUTHORIZATION, COOKIE, HeaderMap, HeaderName, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::shortener::error::ApiError;

const USER_AGENT: &str = concat!("sorturl/", env!("CARGO_PKG_VERSION"));

/// One outbound call to the backend, relative to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
    retried: bool,
}

impl ApiRequest {
    /// Creates a request for the path made of `segments`.
    ///
    /// Segments are sent percent-encoded, so a short code can never escape
    /// its path position.
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ApiRequest {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::GET, segments)
    }

    pub fn post<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::POST, segments)
    }

    pub fn delete<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::DELETE, segments)
    }

    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Unencoded path, e.g. `/urls/analytics/abc123`.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn authorization(&self) -> Option<&str> {
        self.header(AUTHORIZATION)
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn set_bearer(&mut self, token: &str) -> Result<(), ApiError> {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::Decode("access token is not a valid header value".into()))?;
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    pub fn clear_bearer(&mut self) {
        self.headers.remove(AUTHORIZATION);
    }

    pub fn set_cookie(&mut self, cookie: &str) {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                self.headers.insert(COOKIE, value);
            }
            Err(_) => debug!("skipping cookie with invalid characters"),
        }
    }

    /// Retry marker: set once the request has been re-sent after a refresh.
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub fn mark_retried(&mut self) {
        self.retried = true;
    }
}

/// A complete backend response, whatever its status.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        ApiResponse {
            status,
            headers,
            body,
        }
    }

    /// Convenience constructor for a JSON body.
    pub fn json_body(status: StatusCode, body: &serde_json::Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        ApiResponse::new(status, headers, body.to_string().into_bytes())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Turns any non-success status into [`ApiError::Http`].
    pub fn into_result(self) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::from_status(self.status, &self.body))
        }
    }
}

/// Sends a single request and returns whatever the backend answered.
///
/// Implementations report HTTP error statuses as `Ok` responses and reserve
/// `Err` for failures where no response arrived.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// reqwest-backed transport rooted at the API base URL.
///
/// No request timeout is set; a silent backend keeps the call waiting.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Validation(format!("Invalid API base URL {}: {}", base_url, e)))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(HttpTransport { client, base_url })
    }

    fn build_url(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Validation(format!("Invalid API base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(request.segments());
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.build_url(request)?;

        let mut builder = self
            .client
            .request(request.method().clone(), url)
            .headers(request.headers().clone());
        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?
            .to_vec();

        debug!(method = %request.method(), path = %request.path(), %status, "backend responded");
        Ok(ApiResponse::new(status, headers, body))
    }
}
