//! Session abstraction: credential lookup and session teardown.
//!
//! The HTTP client never touches storage or application state directly. It
//! goes through [`Session`], which [`LocalSession`] implements on top of two
//! [`Storage`]s and a broadcast channel that the application shell listens on.

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::storage::{Storage, TOKEN_KEY};

/// Lifecycle events published by [`LocalSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LogoutRequested,
    ReloadRequested,
}

#[cfg_attr(test, mockall::automock)]
pub trait Session: Send + Sync {
    /// Current bearer credential, if one is stored.
    fn credential(&self) -> Option<String>;

    /// Start the application logout transition. Returns immediately; the
    /// transition completes in the background.
    fn request_logout(&self);

    fn clear_persistent_storage(&self) -> Result<()>;
    fn clear_session_storage(&self) -> Result<()>;

    /// Ask the application to restart from an unauthenticated state.
    fn reload_context(&self);
}

/// Application-level logout transition (drop cached user state, notify the
/// backend, ...).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LogoutAction: Send + Sync {
    async fn logout(&self) -> Result<()>;
}

const EVENT_CAPACITY: usize = 16;

pub struct LocalSession {
    persistent: Arc<dyn Storage>,
    session: Arc<dyn Storage>,
    logout_action: Option<Arc<dyn LogoutAction>>,
    events: broadcast::Sender<SessionEvent>,
}

impl LocalSession {
    pub fn new(persistent: Arc<dyn Storage>, session: Arc<dyn Storage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            persistent,
            session,
            logout_action: None,
            events,
        }
    }

    pub fn with_logout_action(mut self, action: Arc<dyn LogoutAction>) -> Self {
        self.logout_action = Some(action);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine: nobody is waiting for the event.
        if self.events.send(event).is_err() {
            debug!("No listener for session event {:?}", event);
        }
    }
}

impl Session for LocalSession {
    #[tracing::instrument(skip(self))]
    fn credential(&self) -> Option<String> {
        match self.persistent.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to read stored credential: {:#}", e);
                None
            }
        }
    }

    #[tracing::instrument(skip(self))]
    fn request_logout(&self) {
        self.publish(SessionEvent::LogoutRequested);

        let Some(action) = self.logout_action.clone() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = action.logout().await {
                        warn!("Logout action failed: {:#}", e);
                    }
                });
            }
            Err(_) => warn!("No async runtime available, skipping logout action"),
        }
    }

    #[tracing::instrument(skip(self))]
    fn clear_persistent_storage(&self) -> Result<()> {
        self.persistent.clear()
    }

    #[tracing::instrument(skip(self))]
    fn clear_session_storage(&self) -> Result<()> {
        self.session.clear()
    }

    #[tracing::instrument(skip(self))]
    fn reload_context(&self) {
        self.publish(SessionEvent::ReloadRequested);
    }
}
