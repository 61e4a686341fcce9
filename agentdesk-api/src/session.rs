//! Session API client
//!
//! Thin boundary to the remote authentication endpoints. The credential is
//! whatever cookie the shared jar holds; nothing here takes a token argument.

use crate::client::ApiTransport;
use agentdesk_core::{performance, DeskError, DeskResult, ErrorContext, Identity};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Operations on the caller's server-side session
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// `GET /auth/me`: who the current credential belongs to, if anyone
    async fn who_am_i(&self) -> DeskResult<Option<Identity>>;

    /// `POST /auth/login`
    async fn login(&self, email: &str, password: &str) -> DeskResult<Identity>;

    /// `POST /auth/register`
    async fn register(&self, name: &str, email: &str, password: &str) -> DeskResult<Identity>;

    /// `POST /auth/logout`
    async fn logout(&self) -> DeskResult<()>;
}

/// `{ "user": Identity | null }`
#[derive(Debug, Deserialize)]
struct UserEnvelope {
    #[serde(default)]
    user: Option<Identity>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

/// `SessionApi` over HTTP
#[derive(Debug, Clone)]
pub struct HttpSessionApi {
    transport: Arc<ApiTransport>,
}

impl HttpSessionApi {
    pub fn new(transport: Arc<ApiTransport>) -> Self {
        Self { transport }
    }

    /// Some servers only set the cookie on login and leave the body empty;
    /// ask who we are now instead of guessing.
    async fn identity_or_lookup(
        &self,
        envelope: UserEnvelope,
        operation: &str,
    ) -> DeskResult<Identity> {
        if let Some(identity) = envelope.user {
            return Ok(identity);
        }

        debug!(operation = operation, "No user in response body, asking /auth/me");
        self.who_am_i().await?.ok_or_else(|| DeskError::Authentication {
            message: String::new(),
            status: None,
            context: ErrorContext::new("session_api")
                .with_operation(operation)
                .with_suggestion("The server accepted the request but reported no user"),
        })
    }
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn who_am_i(&self) -> DeskResult<Option<Identity>> {
        let envelope: UserEnvelope = performance::measure_async(
            "who_am_i",
            self.transport.get_json::<UserEnvelope>("auth/me", "who_am_i"),
        )
        .await?;

        debug!(authenticated = envelope.user.is_some(), "Session check answered");
        Ok(envelope.user)
    }

    async fn login(&self, email: &str, password: &str) -> DeskResult<Identity> {
        let envelope: UserEnvelope = self
            .transport
            .post_json::<_, UserEnvelope>("auth/login", &LoginRequest { email, password }, "login")
            .await?;

        let identity = self.identity_or_lookup(envelope, "login").await?;
        info!(user_id = %identity.id, "Logged in");
        Ok(identity)
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> DeskResult<Identity> {
        let envelope: UserEnvelope = self
            .transport
            .post_json::<_, UserEnvelope>(
                "auth/register",
                &RegisterRequest {
                    name,
                    email,
                    password,
                },
                "register",
            )
            .await?;

        let identity = self.identity_or_lookup(envelope, "register").await?;
        info!(user_id = %identity.id, "Registered");
        Ok(identity)
    }

    async fn logout(&self) -> DeskResult<()> {
        self.transport.post_empty("auth/logout", "logout").await
    }
}
