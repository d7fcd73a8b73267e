//! SQLite-backed storage
//!
//! Each entity lives in its own module as free functions over a `SqlitePool`;
//! `SqliteStorage` wires them into the `Storage` trait. Identifiers are stored
//! as hyphenated UUID text, timestamps as RFC 3339 UTC with microseconds, and
//! dates as `YYYY-MM-DD`.

mod cycles;
mod labels;
mod modules;
mod projects;
mod tickets;
mod users;

use async_trait::async_trait;
use catalyst_common::models::{
    Cycle, CycleUpdate, Label, LabelUpdate, Module, ModuleUpdate, NewCycle, NewLabel, NewModule,
    NewProject, NewTicket, NewUser, Project, ProjectUpdate, Ticket, TicketUpdate, User,
    UserUpdate,
};
use catalyst_common::{Error, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::Storage;

/// `Storage` implementation over a SQLite pool
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Current time at the stored precision
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn timestamp_text(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Corrupt timestamp '{}': {}", text, e)))
}

pub(crate) fn parse_uuid(text: &str) -> Result<Uuid> {
    Uuid::parse_str(text).map_err(|e| Error::Internal(format!("Corrupt id '{}': {}", text, e)))
}

pub(crate) fn parse_optional_uuid(text: Option<String>) -> Result<Option<Uuid>> {
    text.as_deref().map(parse_uuid).transpose()
}

pub(crate) fn date_text(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

pub(crate) fn parse_optional_date(text: Option<String>) -> Result<Option<NaiveDate>> {
    text.as_deref()
        .map(|t| {
            NaiveDate::parse_from_str(t, "%Y-%m-%d")
                .map_err(|e| Error::Internal(format!("Corrupt date '{}': {}", t, e)))
        })
        .transpose()
}

/// Translate constraint violations on writes into domain errors
pub(crate) fn map_write_error(err: sqlx::Error, entity: &str) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return Error::Conflict(format!("{} violates a uniqueness constraint", entity));
        }
        if db_err.is_foreign_key_violation() {
            return Error::InvalidInput(format!("{} references an entity that does not exist", entity));
        }
    }
    Error::Database(err)
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn create_project(&self, project: NewProject) -> Result<Project> {
        projects::create_project(&self.pool, project).await
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        projects::list_projects(&self.pool).await
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        projects::get_project(&self.pool, id).await
    }

    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        projects::find_project_by_name(&self.pool, name).await
    }

    async fn find_project_by_identifier(&self, identifier: &str) -> Result<Option<Project>> {
        projects::find_project_by_identifier(&self.pool, identifier).await
    }

    async fn update_project(&self, id: Uuid, update: ProjectUpdate) -> Result<Option<Project>> {
        projects::update_project(&self.pool, id, update).await
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool> {
        projects::delete_project(&self.pool, id).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        users::create_user(&self.pool, user).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        users::list_users(&self.pool).await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        users::get_user(&self.pool, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        users::find_user_by_email(&self.pool, email).await
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>> {
        users::update_user(&self.pool, id, update).await
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        users::delete_user(&self.pool, id).await
    }

    async fn create_label(&self, label: NewLabel) -> Result<Label> {
        labels::create_label(&self.pool, label).await
    }

    async fn list_labels(&self, project_id: Option<Uuid>) -> Result<Vec<Label>> {
        labels::list_labels(&self.pool, project_id).await
    }

    async fn get_label(&self, id: Uuid) -> Result<Option<Label>> {
        labels::get_label(&self.pool, id).await
    }

    async fn update_label(&self, id: Uuid, update: LabelUpdate) -> Result<Option<Label>> {
        labels::update_label(&self.pool, id, update).await
    }

    async fn delete_label(&self, id: Uuid) -> Result<bool> {
        labels::delete_label(&self.pool, id).await
    }

    async fn create_cycle(&self, cycle: NewCycle) -> Result<Cycle> {
        cycles::create_cycle(&self.pool, cycle).await
    }

    async fn list_cycles(&self, project_id: Option<Uuid>) -> Result<Vec<Cycle>> {
        cycles::list_cycles(&self.pool, project_id).await
    }

    async fn get_cycle(&self, id: Uuid) -> Result<Option<Cycle>> {
        cycles::get_cycle(&self.pool, id).await
    }

    async fn update_cycle(&self, id: Uuid, update: CycleUpdate) -> Result<Option<Cycle>> {
        cycles::update_cycle(&self.pool, id, update).await
    }

    async fn delete_cycle(&self, id: Uuid) -> Result<bool> {
        cycles::delete_cycle(&self.pool, id).await
    }

    async fn create_module(&self, module: NewModule) -> Result<Module> {
        modules::create_module(&self.pool, module).await
    }

    async fn list_modules(&self, project_id: Option<Uuid>) -> Result<Vec<Module>> {
        modules::list_modules(&self.pool, project_id).await
    }

    async fn get_module(&self, id: Uuid) -> Result<Option<Module>> {
        modules::get_module(&self.pool, id).await
    }

    async fn update_module(&self, id: Uuid, update: ModuleUpdate) -> Result<Option<Module>> {
        modules::update_module(&self.pool, id, update).await
    }

    async fn delete_module(&self, id: Uuid) -> Result<bool> {
        modules::delete_module(&self.pool, id).await
    }

    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket> {
        tickets::create_ticket(&self.pool, ticket).await
    }

    async fn list_tickets(&self, project_id: Option<Uuid>) -> Result<Vec<Ticket>> {
        tickets::list_tickets(&self.pool, project_id).await
    }

    async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>> {
        tickets::get_ticket(&self.pool, id).await
    }

    async fn update_ticket(&self, id: Uuid, update: TicketUpdate) -> Result<Option<Ticket>> {
        tickets::update_ticket(&self.pool, id, update).await
    }

    async fn delete_ticket(&self, id: Uuid) -> Result<bool> {
        tickets::delete_ticket(&self.pool, id).await
    }
}
