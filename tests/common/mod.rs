#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use std::collections::{BTreeSet, HashSet};
use std::net::TcpListener;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

pub const TOKEN: &str = "test-token";

/// In-memory stand-in for the remote habit service.
#[derive(Default)]
pub struct StubData {
    pub habits: Vec<Value>,
    pub checks: BTreeSet<(String, String)>,
    pub tokens: HashSet<String>,
    pub accounts: Vec<(String, String)>,
    pub next_id: u64,
    pub requests: usize,
    pub auth_headers: Vec<String>,
    pub fail_create: Option<String>,
    pub fail_toggle: bool,
    /// Routes whose handlers park until `Stub::release` is called.
    pub held: HashSet<&'static str>,
}

#[derive(Clone, Default)]
pub struct Stub {
    pub data: Arc<Mutex<StubData>>,
    arrived: Arc<Notify>,
    release: Arc<Notify>,
}

type Reply = Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)>;

impl Stub {
    pub fn new() -> Self {
        let stub = Self::default();
        stub.data
            .try_lock()
            .expect("fresh stub")
            .tokens
            .insert(TOKEN.to_string());
        stub
    }

    pub async fn requests(&self) -> usize {
        self.data.lock().await.requests
    }

    pub async fn last_auth_header(&self) -> Option<String> {
        self.data.lock().await.auth_headers.last().cloned()
    }

    pub async fn hold(&self, route: &'static str) {
        self.data.lock().await.held.insert(route);
    }

    /// Resolves once a held request has reached the service.
    pub async fn wait_until_held(&self) {
        self.arrived.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    pub async fn revoke_token(&self, token: &str) {
        self.data.lock().await.tokens.remove(token);
    }

    pub async fn revoke_tokens(&self) {
        self.data.lock().await.tokens.clear();
    }

    pub async fn add_account(&self, email: &str, password: &str) {
        self.data
            .lock()
            .await
            .accounts
            .push((email.to_string(), password.to_string()));
    }

    /// Adds a habit straight to the server with a checkmark on each of `dates`.
    pub async fn seed_habit(&self, id: &str, name: &str, dates: &[&str]) {
        let mut data = self.data.lock().await;
        for date in dates {
            data.checks.insert((id.to_string(), date.to_string()));
        }
        data.habits.push(json!({
            "_id": id,
            "name": name,
            "description": format!("{name} every day"),
            "color": "#3b82f6",
            "icon": "⭐",
            "frequency": [0, 1, 2, 3, 4, 5, 6],
            "streak": dates.len(),
        }));
    }
}

pub fn router(stub: Stub) -> Router {
    Router::new()
        .route("/api/habits", get(list_habits).post(create_habit))
        .route("/api/habits/:id", delete(delete_habit))
        .route("/api/checkmarks/toggle", post(toggle_checkmark))
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .with_state(stub)
}

pub async fn serve(stub: Stub) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub service");
    let addr = listener.local_addr().unwrap();
    let app = router(stub);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub service");
    });
    format!("http://{addr}/api")
}

/// Base URL where nothing is listening.
pub fn dead_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/api")
}

fn failure(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

async fn park_if_held(stub: &Stub, route: &str) {
    let held = stub.data.lock().await.held.contains(route);
    if held {
        stub.arrived.notify_one();
        stub.release.notified().await;
    }
}

fn authorize(data: &mut StubData, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    data.requests += 1;
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("<missing>")
        .to_string();
    data.auth_headers.push(header.clone());

    let token = header.strip_prefix("Bearer ").unwrap_or_default();
    if data.tokens.contains(token) {
        Ok(())
    } else {
        Err(failure(StatusCode::UNAUTHORIZED, "Invalid token"))
    }
}

async fn list_habits(State(stub): State<Stub>, headers: HeaderMap) -> Reply {
    park_if_held(&stub, "list").await;
    let mut data = stub.data.lock().await;
    authorize(&mut data, &headers)?;
    Ok((StatusCode::OK, Json(Value::Array(data.habits.clone()))))
}

async fn create_habit(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    park_if_held(&stub, "create").await;
    let mut data = stub.data.lock().await;
    authorize(&mut data, &headers)?;
    if let Some(message) = data.fail_create.clone() {
        return Err(failure(StatusCode::BAD_REQUEST, &message));
    }
    let name = body["name"].as_str().unwrap_or_default();
    if name.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "Name is required"));
    }

    data.next_id += 1;
    let habit = json!({
        "_id": format!("h{}", data.next_id),
        "name": name,
        "description": body.get("description").cloned().unwrap_or(Value::Null),
        "color": body["color"],
        "icon": body["icon"],
        "frequency": body.get("frequency").cloned().unwrap_or(Value::Null),
        "streak": 0,
    });
    data.habits.push(habit.clone());
    Ok((StatusCode::CREATED, Json(habit)))
}

async fn delete_habit(
    State(stub): State<Stub>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    let mut data = stub.data.lock().await;
    authorize(&mut data, &headers)?;
    let before = data.habits.len();
    data.habits.retain(|habit| habit["_id"] != id.as_str());
    if data.habits.len() == before {
        return Err(failure(StatusCode::NOT_FOUND, "Habit not found"));
    }
    data.checks.retain(|(habit_id, _)| *habit_id != id);
    Ok((StatusCode::OK, Json(json!({ "message": "Habit deleted" }))))
}

async fn toggle_checkmark(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    park_if_held(&stub, "toggle").await;
    let mut data = stub.data.lock().await;
    authorize(&mut data, &headers)?;
    if data.fail_toggle {
        return Err(failure(StatusCode::INTERNAL_SERVER_ERROR, "Toggle failed"));
    }

    let id = body["habitId"].as_str().unwrap_or_default().to_string();
    let date = body["date"].as_str().unwrap_or_default().to_string();
    if !data.habits.iter().any(|habit| habit["_id"] == id.as_str()) {
        return Err(failure(StatusCode::NOT_FOUND, "Habit not found"));
    }

    let key = (id.clone(), date);
    if !data.checks.remove(&key) {
        data.checks.insert(key);
    }
    let streak = data.checks.iter().filter(|(habit_id, _)| *habit_id == id).count();
    for habit in data.habits.iter_mut().filter(|habit| habit["_id"] == id.as_str()) {
        habit["streak"] = json!(streak);
    }
    Ok((StatusCode::OK, Json(json!({ "streak": streak }))))
}

async fn login(State(stub): State<Stub>, Json(body): Json<Value>) -> Reply {
    let mut data = stub.data.lock().await;
    data.requests += 1;
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    if !data
        .accounts
        .iter()
        .any(|(known, secret)| known == email && secret == password)
    {
        return Err(failure(StatusCode::UNAUTHORIZED, "Invalid credentials"));
    }
    let token = format!("token-for-{email}");
    data.tokens.insert(token.clone());
    Ok((StatusCode::OK, Json(json!({ "token": token }))))
}

async fn register(State(stub): State<Stub>, Json(body): Json<Value>) -> Reply {
    let mut data = stub.data.lock().await;
    data.requests += 1;
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    if data.accounts.iter().any(|(known, _)| *known == email) {
        return Err(failure(StatusCode::BAD_REQUEST, "Email already registered"));
    }
    data.accounts.push((email.clone(), password));
    let token = format!("token-for-{email}");
    data.tokens.insert(token.clone());
    Ok((StatusCode::CREATED, Json(json!({ "token": token }))))
}
