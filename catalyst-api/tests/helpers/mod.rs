//! Shared fixtures for catalyst-api integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use catalyst_api::config::ServiceConfig;
use catalyst_api::services::{CompletionClient, CompletionRequest, LlmError, NotesClient, SpeechClient};
use catalyst_api::storage::{SqliteStorage, Storage};
use catalyst_common::models::{
    Cycle, CycleUpdate, Label, LabelUpdate, Module, ModuleUpdate, NewCycle, NewLabel, NewModule,
    NewProject, NewTicket, NewUser, Project, ProjectUpdate, Ticket, TicketUpdate, User,
    UserUpdate,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;
use catalyst_api::AppState;
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// In-process LLM double replaying scripted replies in order
///
/// Once the script runs out every call fails with a network error.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_replies<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let llm = Self::default();
        {
            let mut queue = llm.replies.lock().unwrap();
            for reply in replies {
                queue.push_back(Ok(reply.into()));
            }
        }
        Arc::new(llm)
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: LlmError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Network("script exhausted".to_string())))
    }
}

/// Storage over a fresh in-memory database
pub async fn memory_storage() -> Arc<SqliteStorage> {
    let pool = catalyst_common::db::init_memory_database()
        .await
        .expect("in-memory database");
    Arc::new(SqliteStorage::new(pool))
}

/// SQLite storage whose ticket inserts start failing after `ticket_budget` successes
///
/// Every other operation passes straight through, so writes made before the
/// failure stay committed.
pub struct FailingTicketStorage {
    inner: Arc<SqliteStorage>,
    ticket_budget: AtomicUsize,
}

impl FailingTicketStorage {
    pub fn new(inner: Arc<SqliteStorage>, ticket_budget: usize) -> Arc<Self> {
        Arc::new(Self {
            inner,
            ticket_budget: AtomicUsize::new(ticket_budget),
        })
    }
}

#[async_trait]
impl Storage for FailingTicketStorage {
    async fn create_project(&self, project: NewProject) -> catalyst_common::Result<Project> {
        self.inner.create_project(project).await
    }
    async fn list_projects(&self) -> catalyst_common::Result<Vec<Project>> {
        self.inner.list_projects().await
    }
    async fn get_project(&self, id: Uuid) -> catalyst_common::Result<Option<Project>> {
        self.inner.get_project(id).await
    }
    async fn find_project_by_name(&self, name: &str) -> catalyst_common::Result<Option<Project>> {
        self.inner.find_project_by_name(name).await
    }
    async fn find_project_by_identifier(&self, identifier: &str) -> catalyst_common::Result<Option<Project>> {
        self.inner.find_project_by_identifier(identifier).await
    }
    async fn update_project(&self, id: Uuid, update: ProjectUpdate) -> catalyst_common::Result<Option<Project>> {
        self.inner.update_project(id, update).await
    }
    async fn delete_project(&self, id: Uuid) -> catalyst_common::Result<bool> {
        self.inner.delete_project(id).await
    }

    async fn create_user(&self, user: NewUser) -> catalyst_common::Result<User> {
        self.inner.create_user(user).await
    }
    async fn list_users(&self) -> catalyst_common::Result<Vec<User>> {
        self.inner.list_users().await
    }
    async fn get_user(&self, id: Uuid) -> catalyst_common::Result<Option<User>> {
        self.inner.get_user(id).await
    }
    async fn find_user_by_email(&self, email: &str) -> catalyst_common::Result<Option<User>> {
        self.inner.find_user_by_email(email).await
    }
    async fn update_user(&self, id: Uuid, update: UserUpdate) -> catalyst_common::Result<Option<User>> {
        self.inner.update_user(id, update).await
    }
    async fn delete_user(&self, id: Uuid) -> catalyst_common::Result<bool> {
        self.inner.delete_user(id).await
    }

    async fn create_label(&self, label: NewLabel) -> catalyst_common::Result<Label> {
        self.inner.create_label(label).await
    }
    async fn list_labels(&self, project_id: Option<Uuid>) -> catalyst_common::Result<Vec<Label>> {
        self.inner.list_labels(project_id).await
    }
    async fn get_label(&self, id: Uuid) -> catalyst_common::Result<Option<Label>> {
        self.inner.get_label(id).await
    }
    async fn update_label(&self, id: Uuid, update: LabelUpdate) -> catalyst_common::Result<Option<Label>> {
        self.inner.update_label(id, update).await
    }
    async fn delete_label(&self, id: Uuid) -> catalyst_common::Result<bool> {
        self.inner.delete_label(id).await
    }

    async fn create_cycle(&self, cycle: NewCycle) -> catalyst_common::Result<Cycle> {
        self.inner.create_cycle(cycle).await
    }
    async fn list_cycles(&self, project_id: Option<Uuid>) -> catalyst_common::Result<Vec<Cycle>> {
        self.inner.list_cycles(project_id).await
    }
    async fn get_cycle(&self, id: Uuid) -> catalyst_common::Result<Option<Cycle>> {
        self.inner.get_cycle(id).await
    }
    async fn update_cycle(&self, id: Uuid, update: CycleUpdate) -> catalyst_common::Result<Option<Cycle>> {
        self.inner.update_cycle(id, update).await
    }
    async fn delete_cycle(&self, id: Uuid) -> catalyst_common::Result<bool> {
        self.inner.delete_cycle(id).await
    }

    async fn create_module(&self, module: NewModule) -> catalyst_common::Result<Module> {
        self.inner.create_module(module).await
    }
    async fn list_modules(&self, project_id: Option<Uuid>) -> catalyst_common::Result<Vec<Module>> {
        self.inner.list_modules(project_id).await
    }
    async fn get_module(&self, id: Uuid) -> catalyst_common::Result<Option<Module>> {
        self.inner.get_module(id).await
    }
    async fn update_module(&self, id: Uuid, update: ModuleUpdate) -> catalyst_common::Result<Option<Module>> {
        self.inner.update_module(id, update).await
    }
    async fn delete_module(&self, id: Uuid) -> catalyst_common::Result<bool> {
        self.inner.delete_module(id).await
    }

    async fn create_ticket(&self, ticket: NewTicket) -> catalyst_common::Result<Ticket> {
        let allowed = self
            .ticket_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if !allowed {
            return Err(catalyst_common::Error::Internal("disk I/O error".to_string()));
        }
        self.inner.create_ticket(ticket).await
    }
    async fn list_tickets(&self, project_id: Option<Uuid>) -> catalyst_common::Result<Vec<Ticket>> {
        self.inner.list_tickets(project_id).await
    }
    async fn get_ticket(&self, id: Uuid) -> catalyst_common::Result<Option<Ticket>> {
        self.inner.get_ticket(id).await
    }
    async fn update_ticket(&self, id: Uuid, update: TicketUpdate) -> catalyst_common::Result<Option<Ticket>> {
        self.inner.update_ticket(id, update).await
    }
    async fn delete_ticket(&self, id: Uuid) -> catalyst_common::Result<bool> {
        self.inner.delete_ticket(id).await
    }
}

/// App state with unconfigured speech/notes clients and the given LLM
pub fn app_state(storage: Arc<SqliteStorage>, llm: Arc<ScriptedLlm>) -> AppState {
    app_state_with_config(storage, llm, ServiceConfig::default())
}

pub fn app_state_with_config(
    storage: Arc<SqliteStorage>,
    llm: Arc<ScriptedLlm>,
    config: ServiceConfig,
) -> AppState {
    let speech = SpeechClient::new(&config.speech).expect("speech client");
    let notes = NotesClient::new(&config.notes).expect("notes client");
    AppState::new(storage, llm, speech, notes, config)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// Analyzer reply for the two-person login/test meeting
pub const ALICE_BOB_ANALYSIS: &str = r#"```json
{
  "project_name": "Website",
  "tickets": [
    {
      "title": "Build login page",
      "description": "Alice builds the login page",
      "priority": "high",
      "estimated_hours": 8,
      "assignee_name": "Alice",
      "deadline": "2025-03-01",
      "labels": ["frontend"],
      "dependencies": []
    },
    {
      "title": "Write login tests",
      "description": "Bob writes tests for the login page",
      "priority": "medium",
      "estimated_hours": null,
      "assignee_name": "Bob",
      "deadline": null,
      "labels": ["Frontend", "testing"],
      "dependencies": ["ticket:0"]
    }
  ]
}
```"#;

pub const SIMPLE_DIAGRAM: &str = "```mermaid\ngraph TD\n    A[Build login page] --> B[Write login tests]\n```";
