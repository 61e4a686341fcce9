//! In-process mock of the chat service used by the API integration tests
//!
//! Cookie-based sessions, a tiny user table and call counters, served by axum
//! on an ephemeral port.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Default)]
pub struct MockState {
    /// email -> (user json, password)
    users: Mutex<HashMap<String, (Value, String)>>,
    /// token -> user id
    sessions: Mutex<HashMap<String, String>>,
    projects: Mutex<Vec<Value>>,
    agents: Mutex<Vec<Value>>,
    pub me_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub fail_me: AtomicBool,
    pub fail_logout: AtomicBool,
    /// login answers 200 with an empty body, relying on the cookie
    pub bare_login: AtomicBool,
}

impl MockState {
    pub fn add_user(&self, id: &str, name: &str, email: &str, password: &str) {
        self.users.lock().unwrap().insert(
            email.to_string(),
            (json!({"_id": id, "name": name, "email": email}), password.to_string()),
        );
    }

    fn user_by_id(&self, id: &str) -> Option<Value> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|(user, _)| user["_id"] == id)
            .map(|(user, _)| user.clone())
    }

    fn caller(&self, headers: &HeaderMap) -> Option<Value> {
        let token = session_token(headers)?;
        let user_id = self.sessions.lock().unwrap().get(&token).cloned()?;
        self.user_by_id(&user_id)
    }

    fn open_session(&self, user_id: &str) -> String {
        let mut sessions = self.sessions.lock().unwrap();
        let token = format!("tok-{}-{}", user_id, sessions.len());
        sessions.insert(token.clone(), user_id.to_string());
        token
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

pub struct MockServer {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockServer {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        state.add_user("u1", "A", "a@b.com", "longenough1");

        let app = Router::new()
            .route("/api/auth/me", get(me))
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/auth/logout", post(logout))
            .route("/api/projects", get(list_projects).post(create_project))
            .route("/api/agents", post(create_agent))
            .route("/api/agents/{project_id}", get(list_agents))
            .route("/api/chat/{agent_id}", get(chat_history).post(send_message))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}/api", port),
            state,
        }
    }
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().strip_prefix("token="))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn with_cookie(token: &str, body: Value) -> Response {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, format!("token={}; Path=/; HttpOnly", token))],
        Json(body),
    )
        .into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Not authenticated"})),
    )
        .into_response()
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.me_calls.fetch_add(1, Ordering::SeqCst);
    if state.fail_me.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    Json(json!({"user": state.caller(&headers)})).into_response()
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default();

    let found = state.users.lock().unwrap().get(&email).cloned();
    match found {
        Some((user, expected)) if expected == password => {
            let token = state.open_session(user["_id"].as_str().unwrap_or_default());
            if state.bare_login.load(Ordering::SeqCst) {
                with_cookie(&token, json!({}))
            } else {
                with_cookie(&token, json!({"user": user}))
            }
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid credentials"})),
        )
            .into_response(),
    }
}

async fn register(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if state.users.lock().unwrap().contains_key(&email) {
        return (
            StatusCode::CONFLICT,
            Json(json!({"message": "User already exists"})),
        )
            .into_response();
    }

    let id = format!("u{}", state.users.lock().unwrap().len() + 1);
    let name = body["name"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    state.add_user(&id, name, &email, password);

    let token = state.open_session(&id);
    with_cookie(&token, json!({"user": state.user_by_id(&id)}))
}

async fn logout(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    if state.fail_logout.load(Ordering::SeqCst) {
        return (StatusCode::BAD_GATEWAY, "upstream down").into_response();
    }
    if let Some(token) = session_token(&headers) {
        state.sessions.lock().unwrap().remove(&token);
    }
    (
        StatusCode::OK,
        [(header::SET_COOKIE, "token=; Max-Age=0; Path=/".to_string())],
        Json(json!({"ok": true})),
    )
        .into_response()
}

async fn list_projects(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    Json(Value::Array(state.projects.lock().unwrap().clone())).into_response()
}

async fn create_project(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    let mut projects = state.projects.lock().unwrap();
    let project = json!({
        "_id": format!("p{}", projects.len() + 1),
        "name": body["name"],
        "description": body["description"],
    });
    projects.push(project.clone());
    Json(project).into_response()
}

async fn list_agents(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(project_id): Path<String>,
) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    let agents: Vec<Value> = state
        .agents
        .lock()
        .unwrap()
        .iter()
        .filter(|a| a["projectId"] == project_id.as_str())
        .cloned()
        .collect();
    Json(Value::Array(agents)).into_response()
}

async fn create_agent(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    let mut agents = state.agents.lock().unwrap();
    let mut agent = body.clone();
    agent["_id"] = json!(format!("a{}", agents.len() + 1));
    agents.push(agent.clone());
    Json(agent).into_response()
}

async fn chat_history(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(agent_id): Path<String>,
) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    if agent_id == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "Chat not found"})))
            .into_response();
    }
    Json(json!({"messages": [
        {"role": "user", "content": "hi"},
        {"role": "agent", "content": "**hello**"}
    ]}))
    .into_response()
}

async fn send_message(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(_agent_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if state.caller(&headers).is_none() {
        return unauthorized();
    }
    let msg = body["msg"].as_str().unwrap_or_default();
    Json(json!({"reply": format!("echo: {}", msg)})).into_response()
}
