pub mod config;
pub mod http;
pub mod notify;
pub mod session;
pub mod storage;

pub use config::ClientConfig;
pub use http::{ApiError, ApiResponse, ClientFactory, HttpClient, create_client};
