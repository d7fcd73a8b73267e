//! Domain models shared by storage and the HTTP surface
//!
//! `New*` types are creation payloads, `*Update` types are partial updates where
//! `None` leaves a field untouched. Nullable fields use `Option<Option<T>>` so a
//! JSON `null` clears the value while an absent key keeps it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Ticket priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Medium,
    Low,
    None,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::None => "none",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    /// Strict parse of the stored form; free-text synonyms are handled by the agent
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "urgent" => Ok(Priority::Urgent),
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            "none" => Ok(Priority::None),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// Ticket workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TicketStatus::Open),
            "in_progress" => Ok(TicketStatus::InProgress),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(format!("unknown ticket status: {}", other)),
        }
    }
}

/// Deserialize a present key (including `null`) as `Some(value)`
///
/// Combined with `#[serde(default)]` an absent key stays `None`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    /// Short unique key, e.g. "HACK"
    pub identifier: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    /// Derived from `name` when absent
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewProject {
    /// Identifier to persist: explicit value or one derived from the name
    pub fn resolved_identifier(&self) -> String {
        match &self.identifier {
            Some(identifier) if !identifier.trim().is_empty() => identifier.trim().to_string(),
            _ => derive_identifier(&self.name),
        }
    }
}

/// First 10 characters of the name, uppercased, spaces removed
pub fn derive_identifier(name: &str) -> String {
    name.chars()
        .take(10)
        .collect::<String>()
        .to_uppercase()
        .replace(' ', "")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    /// Avatar color, `#rrggbb`
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Random color assigned when absent
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub color: Option<Option<String>>,
}

// ============================================================================
// Labels
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLabel {
    pub name: String,
    /// Random color assigned when absent
    #[serde(default)]
    pub color: Option<String>,
    pub project_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

// ============================================================================
// Cycles (sprints)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCycle {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub project_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CycleUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub end_date: Option<Option<NaiveDate>>,
}

// ============================================================================
// Modules (feature groups)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewModule {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub project_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
}

// ============================================================================
// Tickets
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub priority: Priority,
    pub status: TicketStatus,
    pub estimated_hours: Option<f64>,
    pub start_date: Option<NaiveDate>,
    /// Deadline
    pub end_date: Option<NaiveDate>,
    pub assignee_id: Option<Uuid>,
    /// Ticket this one depends on; subtasks are deleted with their parent
    pub parent_ticket_id: Option<Uuid>,
    pub project_id: Uuid,
    pub cycle_id: Option<Uuid>,
    pub module_id: Option<Uuid>,
    pub label_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub parent_ticket_id: Option<Uuid>,
    pub project_id: Uuid,
    #[serde(default)]
    pub cycle_id: Option<Uuid>,
    #[serde(default)]
    pub module_id: Option<Uuid>,
    #[serde(default)]
    pub label_ids: Vec<Uuid>,
}

impl NewTicket {
    /// Minimal ticket in `project_id` with defaults everywhere else
    pub fn new(title: impl Into<String>, project_id: Uuid) -> Self {
        Self {
            title: title.into(),
            summary: None,
            priority: Priority::default(),
            status: TicketStatus::default(),
            estimated_hours: None,
            start_date: None,
            end_date: None,
            assignee_id: None,
            parent_ticket_id: None,
            project_id,
            cycle_id: None,
            module_id: None,
            label_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub summary: Option<Option<String>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<TicketStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub estimated_hours: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub assignee_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent_ticket_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub cycle_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub module_id: Option<Option<Uuid>>,
    /// Replaces the full label set when present
    #[serde(default)]
    pub label_ids: Option<Vec<Uuid>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_identifier() {
        assert_eq!(derive_identifier("Website Redesign 2025"), "WEBSITERE");
        assert_eq!(derive_identifier("General"), "GENERAL");
        assert_eq!(derive_identifier("a b c"), "ABC");
    }

    #[test]
    fn test_resolved_identifier_prefers_explicit() {
        let project = NewProject {
            name: "Mobile App".to_string(),
            identifier: Some("MOB".to_string()),
            description: None,
        };
        assert_eq!(project.resolved_identifier(), "MOB");

        let project = NewProject {
            name: "Mobile App".to_string(),
            identifier: Some("   ".to_string()),
            description: None,
        };
        assert_eq!(project.resolved_identifier(), "MOBILEAPP");
    }

    #[test]
    fn test_priority_serde_roundtrip_names() {
        assert_eq!(serde_json::to_string(&Priority::None).unwrap(), "\"none\"");
        assert_eq!("urgent".parse::<Priority>().unwrap(), Priority::Urgent);
        assert!("p1".parse::<Priority>().is_err());
    }

    #[test]
    fn test_status_serde_names() {
        assert_eq!(
            serde_json::to_string(&TicketStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(TicketStatus::default(), TicketStatus::Open);
    }

    #[test]
    fn test_nullable_distinguishes_absent_and_null() {
        let update: TicketUpdate = serde_json::from_str(r#"{"assignee_id": null}"#).unwrap();
        assert_eq!(update.assignee_id, Some(None));
        assert_eq!(update.parent_ticket_id, None);

        let update: TicketUpdate = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(update.assignee_id, None);
    }
}
