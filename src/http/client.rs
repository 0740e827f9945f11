//! HTTP client bound to one backend, one credential and one interceptor.

use anyhow::{Context, Result};
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::{ApiError, ApiResponse};
use super::interceptor::ResponseInterceptor;
use super::request::ApiRequest;

/// Pre-configured client produced by the client factory.
///
/// Every request carries the `Authorization` header fixed at construction
/// and resolves relative paths against the base URL. Every outcome goes
/// through the [`ResponseInterceptor`] before reaching the caller: requests
/// are handed out as [`ApiRequest`], which cannot be sent around it.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    authorization: String,
    interceptor: ResponseInterceptor,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("authorization", &"Bearer ****")
            .finish()
    }
}

impl HttpClient {
    pub(crate) fn new(
        client: Client,
        base_url: &str,
        authorization: String,
        interceptor: ResponseInterceptor,
    ) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            authorization,
            interceptor,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The `Authorization` header value this client sends.
    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    pub fn url(&self, path: &str) -> String {
        resolve_url(&self.base_url, path)
    }

    pub fn request(&self, method: Method, path: &str) -> ApiRequest {
        ApiRequest::new(
            self.client.request(method, self.url(path)),
            self.interceptor.clone(),
        )
    }

    pub fn get(&self, path: &str) -> ApiRequest {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> ApiRequest {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> ApiRequest {
        self.request(Method::PUT, path)
    }

    pub fn patch(&self, path: &str) -> ApiRequest {
        self.request(Method::PATCH, path)
    }

    pub fn delete(&self, path: &str) -> ApiRequest {
        self.request(Method::DELETE, path)
    }

    pub fn head(&self, path: &str) -> ApiRequest {
        self.request(Method::HEAD, path)
    }

    /// Same as `request.send()`.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        request.send().await
    }

    /// GET `path` and deserialize the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(self.get(path)).await?;
        response.json().context("Failed to parse JSON response")
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(self.post(path).json(body)).await?;
        response.json().context("Failed to parse JSON response")
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(self.put(path).json(body)).await?;
        response.json().context("Failed to parse JSON response")
    }

    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(self.delete(path)).await?;
        response.json().context("Failed to parse JSON response")
    }
}

/// Joins a request path onto the base URL.
///
/// Absolute URLs are returned as-is. Otherwise trailing slashes of the base
/// and leading slashes of the path are collapsed into a single `/`.
pub fn resolve_url(base: &str, path: &str) -> String {
    if is_absolute_url(path) || base.is_empty() {
        return path.to_string();
    }
    if path.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn is_absolute_url(path: &str) -> bool {
    if path.starts_with("//") {
        return true;
    }
    match path.find("://") {
        Some(idx) if idx > 0 => {
            let scheme = &path[..idx];
            scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}
