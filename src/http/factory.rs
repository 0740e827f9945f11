//! Client factory.
//!
//! Builds a fresh [`HttpClient`] per call from the configured base address
//! and the credential currently held by the session.

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::sync::Arc;

use super::client::HttpClient;
use super::interceptor::ResponseInterceptor;
use crate::config::ClientConfig;
use crate::notify::Notifier;
use crate::session::Session;

/// Credential text sent when nothing is stored.
pub const MISSING_CREDENTIAL: &str = "null";

/// Holds the collaborators every client is built from.
#[derive(Clone)]
pub struct ClientFactory {
    config: ClientConfig,
    session: Arc<dyn Session>,
    notifier: Arc<dyn Notifier>,
}

impl ClientFactory {
    pub fn new(config: ClientConfig, session: Arc<dyn Session>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            session,
            notifier,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Creates an independent client. The credential is read now and stays
    /// fixed for the lifetime of the returned client.
    pub fn create_client(&self) -> Result<HttpClient> {
        create_client(&self.config, self.session.clone(), self.notifier.clone())
    }
}

#[tracing::instrument(skip(session, notifier))]
pub fn create_client(
    config: &ClientConfig,
    session: Arc<dyn Session>,
    notifier: Arc<dyn Notifier>,
) -> Result<HttpClient> {
    // A missing credential still produces a well-formed header.
    let credential = match session.credential() {
        Some(token) => {
            debug!("Using stored credential: {}", mask_token(&token));
            token
        }
        None => {
            warn!(
                "No stored credential, sending \"Bearer {}\"",
                MISSING_CREDENTIAL
            );
            MISSING_CREDENTIAL.to_string()
        }
    };

    let authorization = format!("Bearer {}", credential);
    let mut auth_value = HeaderValue::from_str(&authorization)
        .context("Stored credential is not a valid header value")?;
    auth_value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth_value);

    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers);
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build().context("Failed to build HTTP client")?;

    let interceptor = ResponseInterceptor::new(session, notifier);
    Ok(HttpClient::new(
        client,
        &config.api_endpoint,
        authorization,
        interceptor,
    ))
}

/// First four characters followed by a fixed mask.
fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(4).collect();
    format!("{}****", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MockNotifier;
    use crate::session::MockSession;
    use mockito::{Matcher, Server};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn silent_notifier() -> Arc<MockNotifier> {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();
        Arc::new(notifier)
    }

    fn session_with(token: Option<&'static str>) -> Arc<MockSession> {
        let mut session = MockSession::new();
        session
            .expect_credential()
            .returning(move || token.map(|t| t.to_string()));
        Arc::new(session)
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abc123def"), "abc1****");
        assert_eq!(mask_token("ab"), "ab****");
        assert_eq!(mask_token("ééééé"), "éééé****");
    }

    #[tokio::test]
    async fn test_sends_bearer_credential_to_base_url() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/orgs")
            .match_header("Authorization", "Bearer abc123")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let config = ClientConfig::new(server.url());
        let client = create_client(&config, session_with(Some("abc123")), silent_notifier()).unwrap();

        assert_eq!(client.authorization(), "Bearer abc123");
        client.execute(client.get("/api/orgs")).await.unwrap();
        mock.assert_async().await;
    }

    #[test]
    fn test_example_endpoint_resolution() {
        let config = ClientConfig::new("https://api.example.com");
        let client = create_client(&config, session_with(Some("abc123")), silent_notifier()).unwrap();

        assert_eq!(client.authorization(), "Bearer abc123");
        assert_eq!(client.base_url(), "https://api.example.com");
        assert_eq!(client.url("/api/orgs"), "https://api.example.com/api/orgs");
    }

    #[tokio::test]
    async fn test_missing_credential_sends_literal_null() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_header("Authorization", "Bearer null")
            .with_status(200)
            .create_async()
            .await;

        let config = ClientConfig::new(server.url());
        let client = create_client(&config, session_with(None), silent_notifier()).unwrap();
        client.execute(client.get("")).await.unwrap();

        mock.assert_async().await;
    }

    #[test]
    fn test_invalid_credential_is_an_error() {
        let config = ClientConfig::new("http://localhost");
        let result = create_client(&config, session_with(Some("bad\ntoken")), silent_notifier());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sends_configured_user_agent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_header("user-agent", "console/2.0")
            .with_status(200)
            .create_async()
            .await;

        let config = ClientConfig::new(server.url()).user_agent("console/2.0");
        let client = create_client(&config, session_with(Some("t")), silent_notifier()).unwrap();
        client.execute(client.get("/")).await.unwrap();

        mock.assert_async().await;
    }

    #[test]
    fn test_each_client_reads_credential_at_construction() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let mut session = MockSession::new();
        session.expect_credential().times(2).returning(move || {
            match calls_clone.fetch_add(1, Ordering::SeqCst) {
                0 => Some("first".to_string()),
                _ => Some("second".to_string()),
            }
        });

        let factory = ClientFactory::new(
            ClientConfig::new("http://localhost"),
            Arc::new(session),
            silent_notifier(),
        );

        let a = factory.create_client().unwrap();
        let b = factory.create_client().unwrap();

        assert_eq!(a.authorization(), "Bearer first");
        assert_eq!(b.authorization(), "Bearer second");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_header_fixed_after_credential_changes() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/orgs")
            .match_header("Authorization", Matcher::Exact("Bearer first".to_string()))
            .with_status(200)
            .expect(2)
            .create_async()
            .await;

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let mut session = MockSession::new();
        session.expect_credential().returning(move || {
            match calls_clone.fetch_add(1, Ordering::SeqCst) {
                0 => Some("first".to_string()),
                _ => Some("rotated".to_string()),
            }
        });
        let factory = ClientFactory::new(
            ClientConfig::new(server.url()),
            Arc::new(session),
            silent_notifier(),
        );

        let client = factory.create_client().unwrap();
        client.execute(client.get("/api/orgs")).await.unwrap();
        // Later construction observes the new credential; this client does not.
        let _rotated = factory.create_client().unwrap();
        client.execute(client.get("/api/orgs")).await.unwrap();

        mock.assert_async().await;
    }
}
