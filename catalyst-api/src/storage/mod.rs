//! Storage collaborator
//!
//! One `Storage` trait covers every entity; the engine behind it is chosen once
//! at startup. Deletes cascade:
//! - project → its tickets, labels, cycles and modules
//! - label → detached from every ticket
//! - user → ticket assignments cleared
//! - ticket → subtasks, recursively

pub mod sqlite;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use catalyst_common::models::{
    Cycle, CycleUpdate, Label, LabelUpdate, Module, ModuleUpdate, NewCycle, NewLabel, NewModule,
    NewProject, NewTicket, NewUser, Project, ProjectUpdate, Ticket, TicketUpdate, User,
    UserUpdate,
};
use catalyst_common::Result;
use uuid::Uuid;

/// CRUD over projects, users, labels, cycles, modules and tickets
///
/// `get_*`/`update_*` return `Ok(None)` and `delete_*` returns `Ok(false)` when
/// the entity does not exist. Uniqueness violations surface as
/// `Error::Conflict`, dangling references as `Error::InvalidInput`.
#[async_trait]
pub trait Storage: Send + Sync {
    // Projects
    async fn create_project(&self, project: NewProject) -> Result<Project>;
    /// Newest first
    async fn list_projects(&self) -> Result<Vec<Project>>;
    async fn get_project(&self, id: Uuid) -> Result<Option<Project>>;
    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>>;
    async fn find_project_by_identifier(&self, identifier: &str) -> Result<Option<Project>>;
    async fn update_project(&self, id: Uuid, update: ProjectUpdate) -> Result<Option<Project>>;
    async fn delete_project(&self, id: Uuid) -> Result<bool>;

    // Users
    async fn create_user(&self, user: NewUser) -> Result<User>;
    /// Ordered by lower-cased name
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>>;
    async fn delete_user(&self, id: Uuid) -> Result<bool>;

    // Labels
    async fn create_label(&self, label: NewLabel) -> Result<Label>;
    /// Ordered by lower-cased name, optionally scoped to a project
    async fn list_labels(&self, project_id: Option<Uuid>) -> Result<Vec<Label>>;
    async fn get_label(&self, id: Uuid) -> Result<Option<Label>>;
    async fn update_label(&self, id: Uuid, update: LabelUpdate) -> Result<Option<Label>>;
    async fn delete_label(&self, id: Uuid) -> Result<bool>;

    // Cycles
    async fn create_cycle(&self, cycle: NewCycle) -> Result<Cycle>;
    /// Latest start date first
    async fn list_cycles(&self, project_id: Option<Uuid>) -> Result<Vec<Cycle>>;
    async fn get_cycle(&self, id: Uuid) -> Result<Option<Cycle>>;
    async fn update_cycle(&self, id: Uuid, update: CycleUpdate) -> Result<Option<Cycle>>;
    async fn delete_cycle(&self, id: Uuid) -> Result<bool>;

    // Modules
    async fn create_module(&self, module: NewModule) -> Result<Module>;
    /// Ordered by lower-cased name
    async fn list_modules(&self, project_id: Option<Uuid>) -> Result<Vec<Module>>;
    async fn get_module(&self, id: Uuid) -> Result<Option<Module>>;
    async fn update_module(&self, id: Uuid, update: ModuleUpdate) -> Result<Option<Module>>;
    async fn delete_module(&self, id: Uuid) -> Result<bool>;

    // Tickets
    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket>;
    /// Newest first
    async fn list_tickets(&self, project_id: Option<Uuid>) -> Result<Vec<Ticket>>;
    async fn get_ticket(&self, id: Uuid) -> Result<Option<Ticket>>;
    async fn update_ticket(&self, id: Uuid, update: TicketUpdate) -> Result<Option<Ticket>>;
    async fn delete_ticket(&self, id: Uuid) -> Result<bool>;
}
