//! agentdesk client - session state, route protection and views
//!
//! This crate holds everything between the HTTP clients and a user interface:
//!
//! - **Session** ([`session`]): the single-writer session store, its durable
//!   record and the reconciliation controller that decides when to ask the
//!   server who is logged in
//! - **Routing** ([`routing`]): routes, the guard and a navigator combining
//!   both with reconciliation
//! - **Auth** ([`auth`]): login/register/logout actions and form validation
//! - **Views** ([`views`]): chat transcript and workspace forms
//!
//! ## Flow
//!
//! Every navigation runs a reconciliation cycle first; the guard only ever
//! sees the [`Resolution`] that cycle produced.

pub mod auth;
pub mod routing;
pub mod session;
pub mod views;

pub use auth::{password_strength_hint, AuthActions, FieldErrors, LoginForm, RegisterForm};
pub use routing::{GuardDecision, Navigator, Route, RouteGuard};
pub use session::{
    FileSessionRecord, MemorySessionRecord, ReconcilePhase, Resolution, SessionReconciler,
    SessionRecord, SessionStore, SessionWatcher, Ticket,
};
pub use views::{escape_html, render_markdown, AgentForm, ChatTranscript, ProjectForm};

use agentdesk_core::DeskError;

/// Client-level error type
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Core error: {0}")]
    Core(#[from] DeskError),

    #[error("Invalid form: {0}")]
    InvalidForm(FieldErrors),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// The single line a form shows after a failed submit.
    ///
    /// Server-reported auth messages are shown verbatim; anything else
    /// becomes `fallback` (for example "Login failed").
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Core(error) => error.server_message().unwrap_or(fallback).to_string(),
            ClientError::InvalidForm(errors) => errors.to_string(),
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ClientError::InvalidForm(errors) => Some(errors),
            ClientError::Core(_) => None,
        }
    }
}
