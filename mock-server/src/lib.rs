//! In-memory stand-in for the task/user backend.
//!
//! Serves the same REST contract as the real service: `/api/Conta/login`
//! issues bearer tokens, `/api/Task` and `/api/User` provide CRUD. Every
//! route except login and user registration (`POST /api/User`) requires
//! `Authorization: Bearer <issued token>`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_EMAIL: &str = "admin@taskhub.local";
pub const DEFAULT_PASSWORD: &str = "admin";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub status: u8,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub tasks: Vec<Task>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: u8,
    pub email: String,
    pub user_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<u8>,
    pub email: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone)]
struct TaskRow {
    name: String,
    description: String,
    status: u8,
    email: String,
    user_id: Option<i64>,
}

#[derive(Clone)]
struct UserRow {
    name: String,
    email: String,
}

/// Backing state shared by all handlers.
#[derive(Default)]
pub struct Store {
    tasks: BTreeMap<i64, TaskRow>,
    users: BTreeMap<i64, UserRow>,
    next_task_id: i64,
    next_user_id: i64,
    accounts: HashMap<String, String>,
    tokens: HashSet<String>,
}

impl Store {
    fn summary(&self, id: i64) -> Option<UserSummary> {
        self.users.get(&id).map(|u| UserSummary {
            id,
            name: u.name.clone(),
            email: u.email.clone(),
        })
    }

    fn task(&self, id: i64, row: &TaskRow) -> Task {
        Task {
            id,
            name: row.name.clone(),
            description: row.description.clone(),
            status: row.status,
            email: row.email.clone(),
            user_id: row.user_id,
            user: row.user_id.and_then(|uid| self.summary(uid)),
        }
    }

    fn user(&self, id: i64, row: &UserRow) -> User {
        let tasks = self
            .tasks
            .iter()
            .filter(|(_, t)| t.user_id == Some(id))
            .map(|(tid, t)| Task {
                user: None,
                ..self.task(*tid, t)
            })
            .collect();
        User {
            id,
            name: row.name.clone(),
            email: row.email.clone(),
            tasks,
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

type Failure = (StatusCode, String);

fn not_found() -> Failure {
    (StatusCode::NOT_FOUND, "Not found".to_string())
}

fn bad_request(message: &str) -> Failure {
    (StatusCode::BAD_REQUEST, message.to_string())
}

fn check_name(name: &str) -> Result<(), Failure> {
    if name.trim().is_empty() {
        return Err(bad_request("Name is required"));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), Failure> {
    if !email.contains('@') {
        return Err(bad_request("Invalid email"));
    }
    Ok(())
}

fn check_status(status: u8) -> Result<(), Failure> {
    if status > 2 {
        return Err(bad_request("Invalid status"));
    }
    Ok(())
}

/// Proof that the request carried a token issued by `/api/Conta/login`.
pub struct Authorized;

impl FromRequestParts<Db> for Authorized {
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, db: &Db) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match token {
            Some(token) if db.read().await.tokens.contains(token) => Ok(Authorized),
            _ => Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string())),
        }
    }
}

/// Router seeded with the default account.
pub fn app() -> Router {
    app_with_accounts([(DEFAULT_EMAIL.to_string(), DEFAULT_PASSWORD.to_string())])
}

/// Router accepting the given `(email, password)` logins.
pub fn app_with_accounts(accounts: impl IntoIterator<Item = (String, String)>) -> Router {
    let store = Store {
        accounts: accounts.into_iter().collect(),
        next_task_id: 1,
        next_user_id: 1,
        ..Default::default()
    };
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/api/Conta/login", post(login))
        .route("/api/Task", get(list_tasks).post(create_task))
        .route("/api/Task/{id}", get(get_task).put(update_task).delete(delete_task))
        .route("/api/User", get(list_users).post(create_user))
        .route("/api/User/{id}", get(get_user).put(update_user).delete(delete_user))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn login(State(db): State<Db>, Json(input): Json<LoginRequest>) -> Result<Json<LoginResponse>, Failure> {
    let mut store = db.write().await;
    if store.accounts.get(&input.email) != Some(&input.password) {
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()));
    }
    let token = Uuid::new_v4().to_string();
    store.tokens.insert(token.clone());
    tracing::debug!(email = %input.email, "issued token");
    Ok(Json(LoginResponse { token }))
}

async fn list_tasks(_: Authorized, State(db): State<Db>) -> Json<Vec<Task>> {
    let store = db.read().await;
    Json(store.tasks.iter().map(|(id, t)| store.task(*id, t)).collect())
}

async fn get_task(_: Authorized, State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Task>, Failure> {
    let store = db.read().await;
    let row = store.tasks.get(&id).ok_or_else(not_found)?;
    Ok(Json(store.task(id, row)))
}

async fn create_task(
    _: Authorized,
    State(db): State<Db>,
    Json(input): Json<CreateTask>,
) -> Result<(StatusCode, Json<Task>), Failure> {
    check_name(&input.name)?;
    check_email(&input.email)?;
    check_status(input.status)?;

    let mut store = db.write().await;
    if let Some(uid) = input.user_id {
        if !store.users.contains_key(&uid) {
            return Err(bad_request("User not found"));
        }
    }
    let id = store.next_task_id;
    store.next_task_id += 1;
    let row = TaskRow {
        name: input.name,
        description: input.description,
        status: input.status,
        email: input.email,
        user_id: input.user_id,
    };
    let task = store.task(id, &row);
    store.tasks.insert(id, row);
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    _: Authorized,
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTask>,
) -> Result<Json<Task>, Failure> {
    if let Some(name) = &input.name {
        check_name(name)?;
    }
    if let Some(email) = &input.email {
        check_email(email)?;
    }
    if let Some(status) = input.status {
        check_status(status)?;
    }

    let mut store = db.write().await;
    if let Some(uid) = input.user_id {
        if !store.users.contains_key(&uid) {
            return Err(bad_request("User not found"));
        }
    }
    let row = store.tasks.get_mut(&id).ok_or_else(not_found)?;
    if let Some(name) = input.name {
        row.name = name;
    }
    if let Some(description) = input.description {
        row.description = description;
    }
    if let Some(status) = input.status {
        row.status = status;
    }
    if let Some(email) = input.email {
        row.email = email;
    }
    if let Some(uid) = input.user_id {
        row.user_id = Some(uid);
    }
    let row = row.clone();
    Ok(Json(store.task(id, &row)))
}

async fn delete_task(_: Authorized, State(db): State<Db>, Path(id): Path<i64>) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    store
        .tasks
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(not_found)
}

async fn list_users(_: Authorized, State(db): State<Db>) -> Json<Vec<User>> {
    let store = db.read().await;
    Json(store.users.iter().map(|(id, u)| store.user(*id, u)).collect())
}

async fn get_user(_: Authorized, State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<User>, Failure> {
    let store = db.read().await;
    let row = store.users.get(&id).ok_or_else(not_found)?;
    Ok(Json(store.user(id, row)))
}

/// Open to anonymous callers so new users can register.
async fn create_user(State(db): State<Db>, Json(input): Json<CreateUser>) -> Result<(StatusCode, Json<User>), Failure> {
    check_name(&input.name)?;
    check_email(&input.email)?;

    let mut store = db.write().await;
    let id = store.next_user_id;
    store.next_user_id += 1;
    let row = UserRow {
        name: input.name,
        email: input.email,
    };
    let user = store.user(id, &row);
    store.users.insert(id, row);
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    _: Authorized,
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<User>, Failure> {
    if let Some(name) = &input.name {
        check_name(name)?;
    }
    if let Some(email) = &input.email {
        check_email(email)?;
    }

    let mut store = db.write().await;
    let row = store.users.get_mut(&id).ok_or_else(not_found)?;
    if let Some(name) = input.name {
        row.name = name;
    }
    if let Some(email) = input.email {
        row.email = email;
    }
    let row = row.clone();
    Ok(Json(store.user(id, &row)))
}

async fn delete_user(_: Authorized, State(db): State<Db>, Path(id): Path<i64>) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    store.users.remove(&id).ok_or_else(not_found)?;
    for task in store.tasks.values_mut() {
        if task.user_id == Some(id) {
            task.user_id = None;
        }
    }
    Ok(StatusCode::NO_CONTENT)
}
