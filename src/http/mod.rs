//! Authenticated HTTP client with a response interceptor.
//!
//! - `factory` - builds clients from configuration and the stored credential
//! - `client` - the client itself and URL resolution
//! - `request` - requests bound to the client's interceptor
//! - `interceptor` - side effects for failed responses
//! - `classify` - pure status-code classification
//! - `error` - response and error shapes

mod classify;
mod client;
mod error;
mod factory;
mod interceptor;
mod request;

pub use classify::{Classification, ErrorKind, SessionAction, classify};
pub use client::{HttpClient, resolve_url};
pub use error::{ApiError, ApiResponse};
pub use factory::{ClientFactory, MISSING_CREDENTIAL, create_client};
pub use interceptor::ResponseInterceptor;
pub use request::ApiRequest;
