//! agentdesk API - HTTP clients for the remote chat service
//!
//! Two clients share one transport (and so one cookie jar):
//! - [`HttpSessionApi`] for `/auth/*`
//! - [`HttpWorkspaceApi`] for projects, agents and chat

use agentdesk_core::{ApiSettings, DeskResult};
use std::sync::Arc;

pub mod client;
pub mod credentials;
pub mod session;
pub mod workspace;

pub use client::{ApiClientConfig, ApiTransport};
pub use credentials::CredentialJar;
pub use session::{HttpSessionApi, SessionApi};
pub use workspace::{
    Agent, AgentPrompt, ChatMessage, ChatRole, HttpWorkspaceApi, NewAgent, NewProject, Project,
    WorkspaceApi, DEFAULT_AGENT_MODEL,
};

/// Both HTTP clients wired to a single transport
#[derive(Debug, Clone)]
pub struct ApiClients {
    pub session: Arc<HttpSessionApi>,
    pub workspace: Arc<HttpWorkspaceApi>,
    pub credentials: CredentialJar,
}

impl ApiClients {
    pub fn new(config: ApiClientConfig) -> DeskResult<Self> {
        let credentials = CredentialJar::new(&config.base_url)?;
        Self::with_credentials(config, credentials)
    }

    pub fn with_credentials(config: ApiClientConfig, credentials: CredentialJar) -> DeskResult<Self> {
        let transport = Arc::new(ApiTransport::new(config, credentials.clone())?);
        Ok(Self {
            session: Arc::new(HttpSessionApi::new(Arc::clone(&transport))),
            workspace: Arc::new(HttpWorkspaceApi::new(transport)),
            credentials,
        })
    }

    pub fn from_settings(settings: &ApiSettings) -> DeskResult<Self> {
        Self::new(settings.clone().into())
    }
}
