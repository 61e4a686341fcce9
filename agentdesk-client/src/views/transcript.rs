//! Chat transcript view model
//!
//! Holds the messages exchanged with one agent. Agent replies are markdown and
//! render to HTML; user messages are shown as plain escaped text.

use agentdesk_api::{ChatMessage, ChatRole, WorkspaceApi};
use pulldown_cmark::{html, CowStr, Event, Options, Parser};
use std::sync::Arc;
use tracing::{debug, warn};

/// Shown in place of a reply when sending fails
pub const SEND_FAILED_TEXT: &str = "Error: could not send message";

pub struct ChatTranscript {
    api: Arc<dyn WorkspaceApi>,
    agent_id: String,
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    /// Load an agent's history; a missing or unreadable chat starts empty
    pub async fn load(api: Arc<dyn WorkspaceApi>, agent_id: impl Into<String>) -> Self {
        let agent_id = agent_id.into();
        let messages = match api.chat_history(&agent_id).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(agent_id = %agent_id, "Could not load chat history: {}", e);
                Vec::new()
            }
        };

        debug!(agent_id = %agent_id, count = messages.len(), "Loaded transcript");
        Self {
            api,
            agent_id,
            messages,
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Send `input` and append the exchange. Blank input is ignored and
    /// returns `false`.
    pub async fn send(&mut self, input: &str) -> bool {
        let msg = input.trim();
        if msg.is_empty() {
            return false;
        }

        self.messages.push(ChatMessage::user(msg));

        let reply = match self.api.send_message(&self.agent_id, msg).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(agent_id = %self.agent_id, "Sending message failed: {}", e);
                SEND_FAILED_TEXT.to_string()
            }
        };
        self.messages.push(ChatMessage::agent(reply));
        true
    }

    /// HTML for each message, in order
    pub fn render(&self) -> Vec<String> {
        self.messages.iter().map(render_message).collect()
    }
}

pub fn render_message(message: &ChatMessage) -> String {
    match message.role {
        ChatRole::User => escape_html(&message.content),
        ChatRole::Agent | ChatRole::Other => render_markdown(&message.content),
    }
}

/// Markdown to HTML. Raw HTML in the source is escaped, never passed through.
pub fn render_markdown(markdown: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(CowStr::from(raw.into_string())),
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_renders_emphasis_and_code() {
        assert_eq!(render_markdown("**hello**"), "<p><strong>hello</strong></p>\n");

        let code = render_markdown("```rust\nfn main() {}\n```");
        assert!(code.contains("<pre><code class=\"language-rust\">fn main() {}"));
    }

    #[test]
    fn raw_html_is_escaped() {
        let block = render_markdown("<script>alert(1)</script>");
        assert!(!block.contains("<script>"));
        assert!(block.contains("&lt;script&gt;"));

        let inline = render_markdown("hi <b>there</b>");
        assert!(!inline.contains("<b>"));
        assert!(inline.contains("&lt;b&gt;"));
    }

    #[test]
    fn user_messages_are_plain_text() {
        let rendered = render_message(&ChatMessage::user("**not bold** <i>"));
        assert_eq!(rendered, "**not bold** &lt;i&gt;");
    }
}
