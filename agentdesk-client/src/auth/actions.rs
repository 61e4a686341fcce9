//! Explicit auth actions
//!
//! Login and register validate locally, call the server and write the result
//! through the session store with a fresh ticket, so any reconciliation still
//! in flight can no longer overwrite it. Logout always succeeds locally.

use super::forms::{LoginForm, RegisterForm};
use crate::routing::Route;
use crate::session::SessionStore;
use crate::{ClientError, ClientResult};
use agentdesk_api::{CredentialJar, SessionApi};
use agentdesk_core::{Identity, Session};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct AuthActions {
    api: Arc<dyn SessionApi>,
    store: Arc<SessionStore>,
    credentials: Option<CredentialJar>,
}

impl AuthActions {
    pub fn new(api: Arc<dyn SessionApi>, store: Arc<SessionStore>) -> Self {
        Self {
            api,
            store,
            credentials: None,
        }
    }

    /// Forget these transport credentials on logout
    pub fn with_credentials(mut self, credentials: CredentialJar) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Returns the route to continue to
    pub async fn login(&self, form: &LoginForm) -> ClientResult<Route> {
        form.validate().map_err(ClientError::InvalidForm)?;

        let identity = self.api.login(&form.email, &form.password).await?;
        self.sign_in(identity);
        Ok(Route::home())
    }

    pub async fn register(&self, form: &RegisterForm) -> ClientResult<Route> {
        form.validate().map_err(ClientError::InvalidForm)?;

        let identity = self
            .api
            .register(&form.name, &form.email, &form.password)
            .await?;
        self.sign_in(identity);
        Ok(Route::home())
    }

    /// Best-effort server logout, then clear everything local
    pub async fn logout(&self) -> Route {
        if let Err(e) = self.api.logout().await {
            warn!("Server logout failed, clearing local session anyway: {}", e);
        }

        if let Err(e) = self.store.establish(Session::Unauthenticated) {
            warn!("Failed to clear durable session record: {}", e);
        }
        if let Some(credentials) = &self.credentials {
            credentials.forget();
        }

        debug!("Signed out");
        Route::Login
    }

    fn sign_in(&self, identity: Identity) {
        info!(user_id = %identity.id, "Signed in");
        if let Err(e) = self.store.establish(Session::Authenticated(identity)) {
            warn!("Failed to persist durable session record: {}", e);
        }
    }
}
