//! View models for the protected pages

pub mod transcript;
pub mod workspace;

pub use transcript::{escape_html, render_markdown, render_message, ChatTranscript, SEND_FAILED_TEXT};
pub use workspace::{AgentForm, ProjectForm};
