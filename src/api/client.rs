//! Insights API Client
//!
//! Thin HTTP wrapper around the remote insights API. One attempt per call:
//! no retry, no timeout, no special redirect handling.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::error::{ApiError, ApiResult};

/// HTTP client bound to one API base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// Per-request options
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// JSON body, serialized as-is
    pub body: Option<serde_json::Value>,
    /// Extra headers; these override the default `Content-Type`
    pub headers: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: Vec::new(),
        }
    }
}

impl RequestOptions {
    /// A `GET` with no body
    pub fn get() -> Self {
        Self::default()
    }

    /// A `POST` carrying `body` as JSON
    pub fn post<T: Serialize>(body: &T) -> ApiResult<Self> {
        Ok(Self {
            method: Method::POST,
            body: Some(serde_json::to_value(body)?),
            headers: Vec::new(),
        })
    }
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. "http://localhost:8080")
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let client = Client::builder().build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    /// The configured base URL, without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request and decode the JSON response into `T`.
    ///
    /// Attaches `Authorization: Bearer <token>` when a non-empty token is
    /// given. A non-2xx response fails with [`ApiError::Status`] carrying the
    /// response body text.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        opts: RequestOptions,
        token: Option<&str>,
    ) -> ApiResult<T> {
        let url = self.url(path)?;
        let headers = build_headers(&opts.headers, token)?;
        let request_id = Uuid::new_v4();

        tracing::debug!(
            request_id = %request_id,
            method = %opts.method,
            path = %path,
            authenticated = token.map_or(false, |t| !t.is_empty()),
            "Sending API request"
        );

        let mut builder = self.client.request(opts.method.clone(), url).headers(headers);
        if let Some(body) = &opts.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "API request failed");
            ApiError::Network(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        tracing::debug!(
            request_id = %request_id,
            path = %path,
            status = status.as_u16(),
            bytes = text.len(),
            "API response received"
        );

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// `GET path` with an optional bearer token
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> ApiResult<T> {
        self.request(path, RequestOptions::get(), token).await
    }

    /// `POST path` with a JSON body and an optional bearer token
    pub async fn post_json<B, T>(&self, path: &str, body: &B, token: Option<&str>) -> ApiResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        self.request(path, RequestOptions::post(body)?, token).await
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))
    }
}

/// Default headers, then caller headers, then auth. Caching is always off.
fn build_headers(extra: &[(String, String)], token: Option<&str>) -> ApiResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ApiError::InvalidHeader(name.clone()))?;
        let value =
            HeaderValue::from_str(value).map_err(|_| ApiError::InvalidHeader(name.to_string()))?;
        headers.insert(name, value);
    }

    if let Some(token) = token.filter(|t| !t.is_empty()) {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::InvalidHeader(AUTHORIZATION.to_string()))?;
        headers.insert(AUTHORIZATION, value);
    }

    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    Ok(headers)
}
