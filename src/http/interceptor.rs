//! Response interceptor: cross-cutting side effects for failed requests.

use log::{debug, info, warn};
use std::sync::Arc;

use super::classify::{Classification, SessionAction, classify};
use super::error::{ApiError, ApiResponse};
use crate::notify::{Notification, Notifier};
use crate::session::Session;

/// Observes the outcome of every request made through an `HttpClient`.
///
/// Successful responses pass through untouched. Failed responses with a
/// recognised status raise a notification, and a 401 additionally tears down
/// the session. The outcome handed back to the caller is always the one that
/// came in: a failure is never turned into a success.
#[derive(Clone)]
pub struct ResponseInterceptor {
    session: Arc<dyn Session>,
    notifier: Arc<dyn Notifier>,
}

impl ResponseInterceptor {
    pub fn new(session: Arc<dyn Session>, notifier: Arc<dyn Notifier>) -> Self {
        Self { session, notifier }
    }

    pub fn intercept(
        &self,
        outcome: Result<ApiResponse, ApiError>,
    ) -> Result<ApiResponse, ApiError> {
        match outcome {
            Ok(response) => Ok(self.on_success(response)),
            Err(error) => Err(self.on_failure(error)),
        }
    }

    pub fn on_success(&self, response: ApiResponse) -> ApiResponse {
        response
    }

    #[tracing::instrument(skip(self, error))]
    pub fn on_failure(&self, error: ApiError) -> ApiError {
        let (Some(status), Some(data)) = (error.status(), error.data()) else {
            debug!("Request failed without a response: {}", error);
            return error;
        };

        match classify(status, data) {
            Some(classification) => self.dispatch(&classification),
            None => debug!("Unclassified status {}, passing through", status.as_u16()),
        }
        error
    }

    /// Runs the side effects for a classification.
    pub fn dispatch(&self, classification: &Classification) {
        self.notifier
            .notify(&Notification::warning(classification.message.as_str()));

        if classification.session_action == SessionAction::Invalidate {
            self.invalidate_session();
        }
    }

    /// Order: logout request (not awaited), persistent storage, session
    /// storage, reload. Reload is always last and always runs.
    fn invalidate_session(&self) {
        info!("Credential rejected, invalidating session");

        self.session.request_logout();

        if let Err(e) = self.session.clear_persistent_storage() {
            warn!("Failed to clear persistent storage: {:#}", e);
        }
        if let Err(e) = self.session.clear_session_storage() {
            warn!("Failed to clear session storage: {:#}", e);
        }

        self.session.reload_context();
    }
}
