//! SQLite storage integration tests
//!
//! Exercise cascade rules and orderings through the `Storage` trait.

mod helpers;

use catalyst_api::storage::Storage;
use catalyst_common::models::{
    CycleUpdate, NewCycle, NewLabel, NewModule, NewProject, NewTicket, NewUser, Project, TicketUpdate,
    UserUpdate,
};
use catalyst_common::Error;
use chrono::NaiveDate;
use helpers::memory_storage;
use uuid::Uuid;

async fn project(storage: &dyn Storage, name: &str) -> Project {
    storage
        .create_project(NewProject {
            name: name.to_string(),
            identifier: None,
            description: None,
        })
        .await
        .unwrap()
}

fn user(name: &str, email: Option<&str>) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.map(str::to_string),
        color: None,
    }
}

fn label(name: &str, project_id: Uuid) -> NewLabel {
    NewLabel {
        name: name.to_string(),
        color: None,
        project_id,
    }
}

#[tokio::test]
async fn test_project_name_and_identifier_unique() {
    let storage = memory_storage().await;
    project(storage.as_ref(), "Website").await;

    let same_name = storage
        .create_project(NewProject {
            name: "Website".to_string(),
            identifier: Some("WEB2".to_string()),
            description: None,
        })
        .await;
    assert!(matches!(same_name, Err(Error::Conflict(_))));

    // Derived identifier of "Web site" collides with "WEBSITE"
    let same_identifier = storage
        .create_project(NewProject {
            name: "Web site".to_string(),
            identifier: None,
            description: None,
        })
        .await;
    assert!(matches!(same_identifier, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn test_user_email_unique_but_optional() {
    let storage = memory_storage().await;
    storage.create_user(user("Ann", Some("ann@example.com"))).await.unwrap();

    let duplicate = storage.create_user(user("Other Ann", Some("ann@example.com"))).await;
    assert!(matches!(duplicate, Err(Error::Conflict(_))));

    // Users without email never collide
    storage.create_user(user("Ben", None)).await.unwrap();
    storage.create_user(user("Cal", None)).await.unwrap();

    let found = storage.find_user_by_email("ann@example.com").await.unwrap();
    assert_eq!(found.map(|u| u.name), Some("Ann".to_string()));
}

#[tokio::test]
async fn test_users_listed_case_insensitively() {
    let storage = memory_storage().await;
    for name in ["bravo", "Alpha", "charlie"] {
        storage.create_user(user(name, None)).await.unwrap();
    }

    let names: Vec<String> = storage.list_users().await.unwrap().into_iter().map(|u| u.name).collect();
    assert_eq!(names, vec!["Alpha", "bravo", "charlie"]);
}

#[tokio::test]
async fn test_user_update_clears_email() {
    let storage = memory_storage().await;
    let ann = storage.create_user(user("Ann", Some("ann@example.com"))).await.unwrap();

    let updated = storage
        .update_user(
            ann.id,
            UserUpdate {
                email: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.name, "Ann");
    assert_eq!(updated.email, None);
    assert!(updated.updated_at >= ann.updated_at);
    assert!(storage.update_user(Uuid::new_v4(), UserUpdate::default()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_ticket_labels_replaced_on_update() {
    // Given: a ticket with two labels
    let storage = memory_storage().await;
    let site = project(storage.as_ref(), "Website").await;
    let ui = storage.create_label(label("ui", site.id)).await.unwrap();
    let bug = storage.create_label(label("bug", site.id)).await.unwrap();
    let docs = storage.create_label(label("docs", site.id)).await.unwrap();

    let mut new_ticket = NewTicket::new("Fix header", site.id);
    new_ticket.label_ids = vec![ui.id, bug.id, ui.id];
    let ticket = storage.create_ticket(new_ticket).await.unwrap();
    assert_eq!(ticket.label_ids.len(), 2);

    // When: an update without label_ids
    let untouched = storage
        .update_ticket(
            ticket.id,
            TicketUpdate {
                title: Some("Fix the header".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    // Then: labels unchanged
    assert_eq!(untouched.title, "Fix the header");
    assert_eq!(untouched.label_ids, ticket.label_ids);

    // When: label_ids present
    let replaced = storage
        .update_ticket(
            ticket.id,
            TicketUpdate {
                label_ids: Some(vec![docs.id]),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    // Then: the set is replaced wholesale
    assert_eq!(replaced.label_ids, vec![docs.id]);
}

#[tokio::test]
async fn test_ticket_nullable_fields_clear() {
    let storage = memory_storage().await;
    let site = project(storage.as_ref(), "Website").await;
    let ann = storage.create_user(user("Ann", None)).await.unwrap();

    let mut new_ticket = NewTicket::new("Deploy", site.id);
    new_ticket.assignee_id = Some(ann.id);
    new_ticket.estimated_hours = Some(3.0);
    new_ticket.end_date = NaiveDate::from_ymd_opt(2025, 6, 30);
    let ticket = storage.create_ticket(new_ticket).await.unwrap();

    let updated = storage
        .update_ticket(
            ticket.id,
            TicketUpdate {
                assignee_id: Some(None),
                end_date: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.assignee_id, None);
    assert_eq!(updated.end_date, None);
    assert_eq!(updated.estimated_hours, Some(3.0));
}

#[tokio::test]
async fn test_ticket_with_unknown_project_rejected() {
    let storage = memory_storage().await;
    let result = storage.create_ticket(NewTicket::new("Orphan", Uuid::new_v4())).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_parent_cycle_rejected() {
    // Given: root -> child -> grandchild
    let storage = memory_storage().await;
    let site = project(storage.as_ref(), "Website").await;
    let root = storage.create_ticket(NewTicket::new("root", site.id)).await.unwrap();
    let mut child = NewTicket::new("child", site.id);
    child.parent_ticket_id = Some(root.id);
    let child = storage.create_ticket(child).await.unwrap();
    let mut grandchild = NewTicket::new("grandchild", site.id);
    grandchild.parent_ticket_id = Some(child.id);
    let grandchild = storage.create_ticket(grandchild).await.unwrap();

    // When/Then: root cannot hang under its own descendant or itself
    for parent in [grandchild.id, root.id] {
        let result = storage
            .update_ticket(
                root.id,
                TicketUpdate {
                    parent_ticket_id: Some(Some(parent)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    // Re-parenting outside the subtree is fine
    let moved = storage
        .update_ticket(
            grandchild.id,
            TicketUpdate {
                parent_ticket_id: Some(Some(root.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.parent_ticket_id, Some(root.id));
}

#[tokio::test]
async fn test_ticket_delete_removes_subtree() {
    let storage = memory_storage().await;
    let site = project(storage.as_ref(), "Website").await;
    let root = storage.create_ticket(NewTicket::new("root", site.id)).await.unwrap();
    let mut child = NewTicket::new("child", site.id);
    child.parent_ticket_id = Some(root.id);
    let child = storage.create_ticket(child).await.unwrap();
    let mut grandchild = NewTicket::new("grandchild", site.id);
    grandchild.parent_ticket_id = Some(child.id);
    storage.create_ticket(grandchild).await.unwrap();
    let sibling = storage.create_ticket(NewTicket::new("sibling", site.id)).await.unwrap();

    assert!(storage.delete_ticket(root.id).await.unwrap());

    let remaining = storage.list_tickets(Some(site.id)).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, sibling.id);
    assert!(!storage.delete_ticket(root.id).await.unwrap());
}

#[tokio::test]
async fn test_user_delete_unassigns_tickets() {
    let storage = memory_storage().await;
    let site = project(storage.as_ref(), "Website").await;
    let ann = storage.create_user(user("Ann", None)).await.unwrap();
    let mut new_ticket = NewTicket::new("Review", site.id);
    new_ticket.assignee_id = Some(ann.id);
    let ticket = storage.create_ticket(new_ticket).await.unwrap();

    assert!(storage.delete_user(ann.id).await.unwrap());

    let ticket = storage.get_ticket(ticket.id).await.unwrap().unwrap();
    assert_eq!(ticket.assignee_id, None);
    assert!(storage.get_user(ann.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_label_delete_detaches_from_tickets() {
    let storage = memory_storage().await;
    let site = project(storage.as_ref(), "Website").await;
    let ui = storage.create_label(label("ui", site.id)).await.unwrap();
    let bug = storage.create_label(label("bug", site.id)).await.unwrap();
    let mut new_ticket = NewTicket::new("Fix", site.id);
    new_ticket.label_ids = vec![ui.id, bug.id];
    let ticket = storage.create_ticket(new_ticket).await.unwrap();

    assert!(storage.delete_label(ui.id).await.unwrap());

    let ticket = storage.get_ticket(ticket.id).await.unwrap().unwrap();
    assert_eq!(ticket.label_ids, vec![bug.id]);
}

#[tokio::test]
async fn test_label_gets_random_color() {
    let storage = memory_storage().await;
    let site = project(storage.as_ref(), "Website").await;
    let created = storage.create_label(label("ui", site.id)).await.unwrap();
    assert!(catalyst_common::color::is_hex_color(&created.color));
}

#[tokio::test]
async fn test_cycle_and_module_delete_unplan_tickets() {
    let storage = memory_storage().await;
    let site = project(storage.as_ref(), "Website").await;
    let sprint = storage
        .create_cycle(NewCycle {
            name: "Sprint 1".to_string(),
            description: None,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 6),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 17),
            project_id: site.id,
        })
        .await
        .unwrap();
    let auth = storage
        .create_module(NewModule {
            name: "Auth".to_string(),
            description: None,
            project_id: site.id,
        })
        .await
        .unwrap();
    let mut new_ticket = NewTicket::new("Login", site.id);
    new_ticket.cycle_id = Some(sprint.id);
    new_ticket.module_id = Some(auth.id);
    let ticket = storage.create_ticket(new_ticket).await.unwrap();

    assert!(storage.delete_cycle(sprint.id).await.unwrap());
    assert!(storage.delete_module(auth.id).await.unwrap());

    let ticket = storage.get_ticket(ticket.id).await.unwrap().unwrap();
    assert_eq!(ticket.cycle_id, None);
    assert_eq!(ticket.module_id, None);
}

#[tokio::test]
async fn test_cycles_ordered_latest_first_undated_last() {
    let storage = memory_storage().await;
    let site = project(storage.as_ref(), "Website").await;
    for (name, start) in [
        ("backlog", None),
        ("january", NaiveDate::from_ymd_opt(2025, 1, 1)),
        ("march", NaiveDate::from_ymd_opt(2025, 3, 1)),
    ] {
        storage
            .create_cycle(NewCycle {
                name: name.to_string(),
                description: None,
                start_date: start,
                end_date: None,
                project_id: site.id,
            })
            .await
            .unwrap();
    }

    let names: Vec<String> = storage
        .list_cycles(Some(site.id))
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["march", "january", "backlog"]);
}

#[tokio::test]
async fn test_cycle_update_clears_dates() {
    let storage = memory_storage().await;
    let site = project(storage.as_ref(), "Website").await;
    let sprint = storage
        .create_cycle(NewCycle {
            name: "Sprint".to_string(),
            description: Some("first".to_string()),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 6),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 17),
            project_id: site.id,
        })
        .await
        .unwrap();

    let updated = storage
        .update_cycle(
            sprint.id,
            CycleUpdate {
                end_date: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.start_date, sprint.start_date);
    assert_eq!(updated.end_date, None);
    assert_eq!(updated.description.as_deref(), Some("first"));
}

#[tokio::test]
async fn test_project_delete_cascades() {
    // Given: two projects with children
    let storage = memory_storage().await;
    let site = project(storage.as_ref(), "Website").await;
    let other = project(storage.as_ref(), "Mobile").await;
    storage.create_label(label("ui", site.id)).await.unwrap();
    storage.create_label(label("ui", other.id)).await.unwrap();
    storage
        .create_module(NewModule {
            name: "Auth".to_string(),
            description: None,
            project_id: site.id,
        })
        .await
        .unwrap();
    storage.create_ticket(NewTicket::new("a", site.id)).await.unwrap();
    storage.create_ticket(NewTicket::new("b", other.id)).await.unwrap();

    // When
    assert!(storage.delete_project(site.id).await.unwrap());

    // Then: only the other project's rows remain
    assert!(storage.get_project(site.id).await.unwrap().is_none());
    assert_eq!(storage.list_labels(None).await.unwrap().len(), 1);
    assert!(storage.list_modules(None).await.unwrap().is_empty());
    let tickets = storage.list_tickets(None).await.unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].project_id, other.id);
}

#[tokio::test]
async fn test_project_filter_on_listings() {
    let storage = memory_storage().await;
    let site = project(storage.as_ref(), "Website").await;
    let other = project(storage.as_ref(), "Mobile").await;
    storage.create_label(label("ui", site.id)).await.unwrap();
    storage.create_label(label("api", other.id)).await.unwrap();
    storage.create_ticket(NewTicket::new("a", site.id)).await.unwrap();

    assert_eq!(storage.list_labels(Some(other.id)).await.unwrap()[0].name, "api");
    assert_eq!(storage.list_labels(None).await.unwrap().len(), 2);
    assert!(storage.list_tickets(Some(other.id)).await.unwrap().is_empty());
}
