//! Request builder handed out by `HttpClient`.

use log::{debug, warn};
use reqwest::RequestBuilder;
use reqwest::header::{HeaderName, HeaderValue};
use serde::Serialize;
use std::time::Duration;

use super::error::{ApiError, ApiResponse, parse_body};
use super::interceptor::ResponseInterceptor;

/// A request bound to the interceptor of the client that built it.
///
/// There is no way to send it without the interceptor observing the outcome.
pub struct ApiRequest {
    builder: RequestBuilder,
    interceptor: ResponseInterceptor,
}

impl ApiRequest {
    pub(crate) fn new(builder: RequestBuilder, interceptor: ResponseInterceptor) -> Self {
        Self {
            builder,
            interceptor,
        }
    }

    fn map(self, f: impl FnOnce(RequestBuilder) -> RequestBuilder) -> Self {
        Self {
            builder: f(self.builder),
            interceptor: self.interceptor,
        }
    }

    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Self {
        self.map(|b| b.json(body))
    }

    pub fn query<T: Serialize + ?Sized>(self, query: &T) -> Self {
        self.map(|b| b.query(query))
    }

    pub fn header<K, V>(self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<::http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<::http::Error>,
    {
        self.map(|b| b.header(key, value))
    }

    pub fn body<T: Into<reqwest::Body>>(self, body: T) -> Self {
        self.map(|b| b.body(body))
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        self.map(|b| b.timeout(timeout))
    }

    /// Sends the request and runs the interceptor on the outcome.
    #[tracing::instrument(skip(self))]
    pub async fn send(self) -> Result<ApiResponse, ApiError> {
        let outcome = send_request(self.builder).await;
        self.interceptor.intercept(outcome)
    }
}

async fn send_request(request: RequestBuilder) -> Result<ApiResponse, ApiError> {
    let response = request.send().await.map_err(ApiError::Transport)?;

    let status = response.status();
    let url = response.url().to_string();
    let headers = response.headers().clone();
    debug!("{} <- {}", status.as_u16(), url);

    let data = match response.text().await {
        Ok(text) => parse_body(&text),
        Err(e) => {
            warn!("Failed to read response body from {}: {}", url, e);
            serde_json::Value::Null
        }
    };

    if status.is_success() {
        Ok(ApiResponse {
            status,
            url,
            headers,
            data,
        })
    } else {
        Err(ApiError::Status { status, url, data })
    }
}
