//! Project and agent forms

use crate::auth::FieldErrors;
use agentdesk_api::{AgentPrompt, NewAgent, NewProject, DEFAULT_AGENT_MODEL};

#[derive(Debug, Clone, Default)]
pub struct ProjectForm {
    pub name: String,
    pub description: String,
}

impl ProjectForm {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn to_request(&self) -> Result<NewProject, FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.name.trim().is_empty() {
            errors.insert("name", "Project name is required");
            return Err(errors);
        }

        Ok(NewProject {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AgentForm {
    pub name: String,
    pub model: String,
    pub prompt_text: String,
}

impl Default for AgentForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            model: DEFAULT_AGENT_MODEL.to_string(),
            prompt_text: String::new(),
        }
    }
}

impl AgentForm {
    pub fn new(name: impl Into<String>, prompt_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt_text: prompt_text.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Build the request attaching the agent to `project_id`
    pub fn to_request(&self, project_id: &str) -> Result<NewAgent, FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.name.trim().is_empty() {
            errors.insert("name", "Agent name is required");
            return Err(errors);
        }

        let model = if self.model.trim().is_empty() {
            DEFAULT_AGENT_MODEL.to_string()
        } else {
            self.model.trim().to_string()
        };

        Ok(NewAgent {
            name: self.name.trim().to_string(),
            model,
            prompt: AgentPrompt {
                system: self.prompt_text.clone(),
            },
            project_id: project_id.to_string(),
        })
    }
}
