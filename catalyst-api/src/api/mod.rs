//! HTTP API handlers

pub mod cycles;
pub mod deliverables;
pub mod health;
pub mod labels;
pub mod mermaid;
pub mod modules;
pub mod projects;
pub mod tickets;
pub mod users;
pub mod voice;

pub use cycles::cycle_routes;
pub use deliverables::deliverable_routes;
pub use health::health_routes;
pub use labels::label_routes;
pub use mermaid::mermaid_routes;
pub use modules::module_routes;
pub use projects::project_routes;
pub use tickets::ticket_routes;
pub use users::user_routes;
pub use voice::voice_routes;

use serde::Deserialize;
use uuid::Uuid;

/// `?project_id=` filter for project-scoped listings
#[derive(Debug, Default, Deserialize)]
pub struct ProjectFilter {
    pub project_id: Option<Uuid>,
}
