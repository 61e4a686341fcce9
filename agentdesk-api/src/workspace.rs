//! Workspace API client
//!
//! Business endpoints behind the protected views: projects, the agents
//! attached to a project, and an agent's chat transcript.

use crate::client::ApiTransport;
use agentdesk_core::{DeskError, DeskResult, ErrorContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Model used for new agents when none is chosen
pub const DEFAULT_AGENT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewProject {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentPrompt {
    #[serde(default)]
    pub system: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub prompt: AgentPrompt,
    #[serde(rename = "projectId", default)]
    pub project_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAgent {
    pub name: String,
    pub model: String,
    pub prompt: AgentPrompt,
    #[serde(rename = "projectId")]
    pub project_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "assistant")]
    Agent,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Agent,
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatHistory {
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    msg: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    reply: String,
}

/// Business CRUD used by the views
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    async fn list_projects(&self) -> DeskResult<Vec<Project>>;

    async fn create_project(&self, project: &NewProject) -> DeskResult<Project>;

    /// The server has no single-project endpoint; look it up in the listing
    async fn find_project(&self, project_id: &str) -> DeskResult<Project> {
        self.list_projects()
            .await?
            .into_iter()
            .find(|p| p.id == project_id)
            .ok_or_else(|| DeskError::NotFound {
                resource: format!("project {}", project_id),
                context: ErrorContext::new("workspace_api").with_operation("find_project"),
            })
    }

    async fn list_agents(&self, project_id: &str) -> DeskResult<Vec<Agent>>;

    async fn create_agent(&self, agent: &NewAgent) -> DeskResult<Agent>;

    async fn chat_history(&self, agent_id: &str) -> DeskResult<Vec<ChatMessage>>;

    /// Send one user message and return the agent's reply text
    async fn send_message(&self, agent_id: &str, msg: &str) -> DeskResult<String>;
}

/// `WorkspaceApi` over HTTP
#[derive(Debug, Clone)]
pub struct HttpWorkspaceApi {
    transport: Arc<ApiTransport>,
}

impl HttpWorkspaceApi {
    pub fn new(transport: Arc<ApiTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl WorkspaceApi for HttpWorkspaceApi {
    async fn list_projects(&self) -> DeskResult<Vec<Project>> {
        let projects = self
            .transport
            .get_json::<Vec<Project>>("projects", "list_projects")
            .await?;
        debug!("Fetched {} project(s)", projects.len());
        Ok(projects)
    }

    async fn create_project(&self, project: &NewProject) -> DeskResult<Project> {
        let created = self
            .transport
            .post_json::<_, Project>("projects", project, "create_project")
            .await?;
        info!(project_id = %created.id, "Created project");
        Ok(created)
    }

    async fn list_agents(&self, project_id: &str) -> DeskResult<Vec<Agent>> {
        let path = format!("agents/{}", urlencoding::encode(project_id));
        self.transport
            .get_json::<Vec<Agent>>(&path, "list_agents")
            .await
    }

    async fn create_agent(&self, agent: &NewAgent) -> DeskResult<Agent> {
        let created = self
            .transport
            .post_json::<_, Agent>("agents", agent, "create_agent")
            .await?;
        info!(agent_id = %created.id, project_id = %agent.project_id, "Created agent");
        Ok(created)
    }

    async fn chat_history(&self, agent_id: &str) -> DeskResult<Vec<ChatMessage>> {
        let path = format!("chat/{}", urlencoding::encode(agent_id));
        let history = self
            .transport
            .get_json::<ChatHistory>(&path, "chat_history")
            .await?;
        Ok(history.messages)
    }

    async fn send_message(&self, agent_id: &str, msg: &str) -> DeskResult<String> {
        let path = format!("chat/{}", urlencoding::encode(agent_id));
        let response = self
            .transport
            .post_json::<_, SendMessageResponse>(&path, &SendMessageRequest { msg }, "send_message")
            .await?;
        Ok(response.reply)
    }
}
