//! Scripted session API and a wired-up client for the flow tests

#![allow(dead_code)]

use agentdesk_api::{
    Agent, ChatMessage, NewAgent, NewProject, Project, SessionApi, WorkspaceApi,
};
use agentdesk_client::{
    AuthActions, MemorySessionRecord, Navigator, SessionReconciler, SessionRecord, SessionStore,
};
use agentdesk_core::{auth_error, network_error, DeskResult, Identity, ReconcilePolicy};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

pub fn alice() -> Identity {
    Identity::new("u1", "A").with_field("email", "a@b.com")
}

/// What one `who_am_i` call answers
#[derive(Debug, Clone)]
pub enum Answer {
    User(Identity),
    Nobody,
    Offline,
}

impl Answer {
    fn into_result(self) -> DeskResult<Option<Identity>> {
        match self {
            Answer::User(identity) => Ok(Some(identity)),
            Answer::Nobody => Ok(None),
            Answer::Offline => Err(network_error!("connection refused", "scripted_api")),
        }
    }
}

struct Step {
    answer: Answer,
    gate: Option<oneshot::Receiver<()>>,
}

/// `SessionApi` answering from a script and counting every call
#[derive(Default)]
pub struct ScriptedSessionApi {
    steps: Mutex<VecDeque<Step>>,
    fallback: Mutex<Option<Answer>>,
    pub who_am_i_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
    pub register_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub logout_fails: AtomicBool,
    pub offline: AtomicBool,
}

impl ScriptedSessionApi {
    /// Queue the answer for the next `who_am_i` call
    pub fn answer(&self, answer: Answer) {
        self.steps.lock().unwrap().push_back(Step { answer, gate: None });
    }

    /// Queue an answer that is held back until the returned sender fires
    pub fn answer_gated(&self, answer: Answer) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.steps.lock().unwrap().push_back(Step {
            answer,
            gate: Some(rx),
        });
        tx
    }

    /// Answer for calls beyond the script; `Nobody` when unset
    pub fn answer_always(&self, answer: Answer) {
        *self.fallback.lock().unwrap() = Some(answer);
    }

    pub fn who_am_i_calls(&self) -> usize {
        self.who_am_i_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.who_am_i_calls.load(Ordering::SeqCst)
            + self.login_calls.load(Ordering::SeqCst)
            + self.register_calls.load(Ordering::SeqCst)
            + self.logout_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionApi for ScriptedSessionApi {
    async fn who_am_i(&self) -> DeskResult<Option<Identity>> {
        self.who_am_i_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step { answer, gate }) => {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                answer.into_result()
            }
            None => self
                .fallback
                .lock()
                .unwrap()
                .clone()
                .unwrap_or(Answer::Nobody)
                .into_result(),
        }
    }

    async fn login(&self, email: &str, password: &str) -> DeskResult<Identity> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(network_error!("connection refused", "scripted_api"));
        }
        if email == "a@b.com" && password == "longenough1" {
            Ok(alice())
        } else {
            Err(auth_error!("Invalid credentials", Some(401), "scripted_api"))
        }
    }

    async fn register(&self, name: &str, email: &str, _password: &str) -> DeskResult<Identity> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        if email == "a@b.com" {
            return Err(auth_error!("User already exists", Some(409), "scripted_api"));
        }
        Ok(Identity::new("u2", name).with_field("email", email))
    }

    async fn logout(&self) -> DeskResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.logout_fails.load(Ordering::SeqCst) {
            return Err(network_error!("connection reset", "scripted_api"));
        }
        Ok(())
    }
}

/// Store, reconciler, navigator and actions sharing one scripted API
pub struct TestClient {
    pub api: Arc<ScriptedSessionApi>,
    pub record: Arc<dyn SessionRecord>,
    pub store: Arc<SessionStore>,
    pub navigator: Navigator,
    pub actions: AuthActions,
}

impl TestClient {
    pub fn new() -> Self {
        Self::build(Arc::new(MemorySessionRecord::new()), ReconcilePolicy::default())
    }

    pub fn with_policy(policy: ReconcilePolicy) -> Self {
        Self::build(Arc::new(MemorySessionRecord::new()), policy)
    }

    pub fn build(record: Arc<dyn SessionRecord>, policy: ReconcilePolicy) -> Self {
        let api = Arc::new(ScriptedSessionApi::default());
        let store = Arc::new(SessionStore::new(Arc::clone(&record)));
        store.hydrate();

        let reconciler = Arc::new(
            SessionReconciler::new(Arc::clone(&store), api.clone()).with_policy(policy),
        );
        let navigator = Navigator::new(reconciler);
        let actions = AuthActions::new(api.clone(), Arc::clone(&store));

        Self {
            api,
            record,
            store,
            navigator,
            actions,
        }
    }

    pub fn durable_identity(&self) -> Option<Identity> {
        self.record.load().unwrap()
    }
}

/// `WorkspaceApi` whose chat endpoints can be switched off
#[derive(Default)]
pub struct FakeWorkspaceApi {
    pub history: Mutex<Vec<ChatMessage>>,
    pub history_fails: AtomicBool,
    pub send_fails: AtomicBool,
    pub sent: Mutex<Vec<String>>,
}

#[async_trait]
impl WorkspaceApi for FakeWorkspaceApi {
    async fn list_projects(&self) -> DeskResult<Vec<Project>> {
        Ok(vec![Project {
            id: "p1".into(),
            name: "Support".into(),
            description: String::new(),
        }])
    }

    async fn create_project(&self, project: &NewProject) -> DeskResult<Project> {
        Ok(Project {
            id: "p2".into(),
            name: project.name.clone(),
            description: project.description.clone(),
        })
    }

    async fn list_agents(&self, _project_id: &str) -> DeskResult<Vec<Agent>> {
        Ok(Vec::new())
    }

    async fn create_agent(&self, agent: &NewAgent) -> DeskResult<Agent> {
        Ok(Agent {
            id: "a1".into(),
            name: agent.name.clone(),
            model: agent.model.clone(),
            prompt: agent.prompt.clone(),
            project_id: agent.project_id.clone(),
        })
    }

    async fn chat_history(&self, _agent_id: &str) -> DeskResult<Vec<ChatMessage>> {
        if self.history_fails.load(Ordering::SeqCst) {
            return Err(auth_error!("Chat not found", Some(404), "fake_workspace"));
        }
        Ok(self.history.lock().unwrap().clone())
    }

    async fn send_message(&self, _agent_id: &str, msg: &str) -> DeskResult<String> {
        self.sent.lock().unwrap().push(msg.to_string());
        if self.send_fails.load(Ordering::SeqCst) {
            return Err(network_error!("timeout", "fake_workspace"));
        }
        Ok(format!("You said **{}**", msg))
    }
}
