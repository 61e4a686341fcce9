//! Chat transcript behaviour

mod common;

use agentdesk_api::{ChatMessage, ChatRole, WorkspaceApi};
use agentdesk_client::views::SEND_FAILED_TEXT;
use agentdesk_client::{ChatTranscript, ProjectForm};
use common::FakeWorkspaceApi;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[tokio::test]
async fn missing_history_starts_empty() {
    let api = Arc::new(FakeWorkspaceApi::default());
    api.history_fails.store(true, Ordering::SeqCst);

    let transcript = ChatTranscript::load(api, "a1").await;

    assert!(transcript.is_empty());
    assert_eq!(transcript.agent_id(), "a1");
}

#[tokio::test]
async fn send_appends_user_message_and_reply() {
    let api = Arc::new(FakeWorkspaceApi::default());
    *api.history.lock().unwrap() = vec![ChatMessage::agent("Welcome")];

    let mut transcript = ChatTranscript::load(api.clone(), "a1").await;
    assert!(transcript.send("  hello  ").await);

    let messages = transcript.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1], ChatMessage::user("hello"));
    assert_eq!(messages[2].role, ChatRole::Agent);
    assert_eq!(*api.sent.lock().unwrap(), vec!["hello".to_string()]);

    let html = transcript.render();
    assert_eq!(html[1], "hello");
    assert_eq!(html[2], "<p>You said <strong>hello</strong></p>\n");
}

#[tokio::test]
async fn blank_input_is_ignored() {
    let api = Arc::new(FakeWorkspaceApi::default());
    let mut transcript = ChatTranscript::load(api.clone(), "a1").await;

    assert!(!transcript.send("   ").await);
    assert!(transcript.is_empty());
    assert!(api.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_send_keeps_message_and_shows_error() {
    let api = Arc::new(FakeWorkspaceApi::default());
    api.send_fails.store(true, Ordering::SeqCst);
    let mut transcript = ChatTranscript::load(api, "a1").await;

    assert!(transcript.send("ping").await);

    let messages = transcript.messages();
    assert_eq!(messages[0], ChatMessage::user("ping"));
    assert_eq!(messages[1], ChatMessage::agent(SEND_FAILED_TEXT));
}

#[tokio::test]
async fn project_form_feeds_workspace_api() {
    let api = FakeWorkspaceApi::default();
    let request = ProjectForm::new("Research", "Notes").to_request().unwrap();

    let project = api.create_project(&request).await.unwrap();

    assert_eq!(project.name, "Research");
    assert_eq!(api.find_project("p1").await.unwrap().name, "Support");
}
