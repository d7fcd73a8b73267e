//! Ticket materializer
//!
//! Deterministic second stage: resolves each ticket spec against existing
//! projects, users and labels, creates whatever is missing and persists the
//! tickets in batch order. Nothing is rolled back when a write fails midway.

use catalyst_common::color::random_hex_color;
use catalyst_common::models::{
    derive_identifier, Label, NewLabel, NewProject, NewTicket, NewUser, Project, Ticket, User,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::analyzer::{MeetingAnalysis, TicketSpec};
use super::matching::best_match;
use super::normalize::{dependency_index, normalize_priority, parse_deadline};
use super::AgentError;
use crate::storage::Storage;

pub const DEFAULT_PROJECT_NAME: &str = "General";
const DEFAULT_TITLE: &str = "Untitled Task";
const AUTO_PROJECT_DESCRIPTION: &str = "Auto-created from meeting analysis";

/// Output of a successful materialization
#[derive(Debug, Clone, Serialize)]
pub struct MaterializedBatch {
    pub tickets: Vec<Ticket>,
    pub project: Project,
    pub summary: String,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub struct TicketMaterializer {
    storage: Arc<dyn Storage>,
}

impl TicketMaterializer {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn materialize(
        &self,
        analysis: &MeetingAnalysis,
        project_override: Option<&str>,
    ) -> Result<MaterializedBatch, AgentError> {
        let project_name = non_blank(project_override)
            .or_else(|| non_blank(analysis.project_name.as_deref()))
            .unwrap_or(DEFAULT_PROJECT_NAME)
            .to_string();

        let project = self.resolve_project(&project_name).await?;
        tracing::info!(project_id = %project.id, project = %project.name, "Using project");

        let mut users = self.storage.list_users().await?;
        let mut labels: HashMap<String, Label> = self
            .storage
            .list_labels(Some(project.id))
            .await?
            .into_iter()
            .map(|label| (label.name.trim().to_lowercase(), label))
            .collect();

        let total = analysis.tickets.len();
        let mut created_ids: Vec<Uuid> = Vec::with_capacity(total);
        let mut tickets = Vec::with_capacity(total);

        for (index, spec) in analysis.tickets.iter().enumerate() {
            tracing::debug!(
                index,
                total,
                title = spec.title.as_deref().unwrap_or(DEFAULT_TITLE),
                "Processing ticket spec"
            );

            let assignee_id = match non_blank(spec.assignee_name.as_deref()) {
                Some(name) => Some(self.resolve_assignee(name, &mut users).await?),
                None => None,
            };
            let label_ids = self.resolve_labels(spec, project.id, &mut labels).await?;
            let parent_ticket_id = resolve_parent(spec, &created_ids);

            let ticket = NewTicket {
                summary: spec.description.clone(),
                priority: normalize_priority(spec.priority.as_deref()),
                estimated_hours: spec.estimated_hours,
                end_date: parse_deadline(spec.deadline.as_deref()),
                assignee_id,
                parent_ticket_id,
                label_ids,
                ..NewTicket::new(
                    non_blank(spec.title.as_deref()).unwrap_or(DEFAULT_TITLE),
                    project.id,
                )
            };

            let created = self.storage.create_ticket(ticket).await?;
            tracing::debug!(index, ticket_id = %created.id, parent = ?created.parent_ticket_id, "Created ticket");
            created_ids.push(created.id);
            tickets.push(created);
        }

        tracing::info!(ticket_count = tickets.len(), project = %project_name, "Materialized ticket batch");

        Ok(MaterializedBatch {
            summary: format!("Created {} ticket(s) in project '{}'", tickets.len(), project_name),
            tickets,
            project,
        })
    }

    /// Exact name, then exact identifier, else create
    async fn resolve_project(&self, name: &str) -> Result<Project, AgentError> {
        if let Some(project) = self.storage.find_project_by_name(name).await? {
            return Ok(project);
        }
        if let Some(project) = self.storage.find_project_by_identifier(name).await? {
            return Ok(project);
        }

        tracing::info!(project = %name, "Creating new project");
        let project = self
            .storage
            .create_project(NewProject {
                name: name.to_string(),
                identifier: Some(derive_identifier(name)),
                description: Some(AUTO_PROJECT_DESCRIPTION.to_string()),
            })
            .await?;
        Ok(project)
    }

    async fn resolve_assignee(&self, name: &str, users: &mut Vec<User>) -> Result<Uuid, AgentError> {
        if let Some(index) = best_match(name, users.iter().map(|u| u.name.as_str())) {
            let user = &users[index];
            tracing::debug!(assignee = %name, matched = %user.name, "Matched assignee");
            return Ok(user.id);
        }

        tracing::info!(assignee = %name, "Creating new user");
        let user = self
            .storage
            .create_user(NewUser {
                name: name.to_string(),
                email: None,
                color: Some(random_hex_color()),
            })
            .await?;
        let id = user.id;
        users.push(user);
        Ok(id)
    }

    async fn resolve_labels(
        &self,
        spec: &TicketSpec,
        project_id: Uuid,
        labels: &mut HashMap<String, Label>,
    ) -> Result<Vec<Uuid>, AgentError> {
        let mut ids = Vec::with_capacity(spec.labels.len());

        for raw in &spec.labels {
            let name = raw.trim();
            let key = name.to_lowercase();
            if key.is_empty() {
                continue;
            }

            let id = match labels.get(&key) {
                Some(label) => label.id,
                None => {
                    tracing::info!(label = %name, "Creating new label");
                    let label = self
                        .storage
                        .create_label(NewLabel {
                            name: name.to_string(),
                            color: Some(random_hex_color()),
                            project_id,
                        })
                        .await?;
                    let id = label.id;
                    labels.insert(key, label);
                    id
                }
            };

            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        Ok(ids)
    }
}

/// First dependency naming an already-created ticket
fn resolve_parent(spec: &TicketSpec, created_ids: &[Uuid]) -> Option<Uuid> {
    spec.dependencies
        .iter()
        .filter_map(dependency_index)
        .find_map(|index| created_ids.get(index).copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parent_only_from_earlier_positions() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let created = [first, second];

        let spec = TicketSpec {
            dependencies: vec![json!("ticket:5"), json!("ticket:1"), json!("ticket:0")],
            ..Default::default()
        };
        assert_eq!(resolve_parent(&spec, &created), Some(second));

        let spec = TicketSpec {
            dependencies: vec![json!("ticket:2"), json!("bogus"), json!(null)],
            ..Default::default()
        };
        assert_eq!(resolve_parent(&spec, &created), None);

        let spec = TicketSpec {
            dependencies: vec![json!("ticket:0")],
            ..Default::default()
        };
        assert_eq!(resolve_parent(&spec, &[]), None);
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  x ")), Some("x"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
