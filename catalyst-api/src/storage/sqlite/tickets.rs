//! Ticket persistence
//!
//! Label membership lives in `ticket_labels`; reads fold it back into
//! `Ticket::label_ids` with a correlated `GROUP_CONCAT`. Parent links form a
//! forest: deleting a ticket removes its whole subtree, and an update may
//! never make a ticket its own ancestor.

use catalyst_common::models::{NewTicket, Ticket, TicketUpdate};
use catalyst_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use super::{
    date_text, map_write_error, now, parse_optional_date, parse_optional_uuid, parse_timestamp,
    parse_uuid, timestamp_text,
};

const TICKET_SELECT: &str = r#"
    SELECT id, title, summary, priority, status, estimated_hours, start_date, end_date,
           assignee_id, parent_ticket_id, project_id, cycle_id, module_id,
           created_at, updated_at,
           (SELECT GROUP_CONCAT(label_id) FROM ticket_labels tl WHERE tl.ticket_id = tickets.id) AS label_ids
    FROM tickets
"#;

fn ticket_from_row(row: &SqliteRow) -> Result<Ticket> {
    let id: String = row.try_get("id")?;
    let project_id: String = row.try_get("project_id")?;
    let priority: String = row.try_get("priority")?;
    let status: String = row.try_get("status")?;
    let label_ids: Option<String> = row.try_get("label_ids")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    let mut label_ids = label_ids
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter(|s| !s.is_empty())
        .map(parse_uuid)
        .collect::<Result<Vec<_>>>()?;
    label_ids.sort();

    Ok(Ticket {
        id: parse_uuid(&id)?,
        title: row.try_get("title")?,
        summary: row.try_get("summary")?,
        priority: priority.parse().map_err(Error::Internal)?,
        status: status.parse().map_err(Error::Internal)?,
        estimated_hours: row.try_get("estimated_hours")?,
        start_date: parse_optional_date(row.try_get("start_date")?)?,
        end_date: parse_optional_date(row.try_get("end_date")?)?,
        assignee_id: parse_optional_uuid(row.try_get("assignee_id")?)?,
        parent_ticket_id: parse_optional_uuid(row.try_get("parent_ticket_id")?)?,
        project_id: parse_uuid(&project_id)?,
        cycle_id: parse_optional_uuid(row.try_get("cycle_id")?)?,
        module_id: parse_optional_uuid(row.try_get("module_id")?)?,
        label_ids,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Distinct ids, sorted to match what reads return
fn distinct_labels(mut label_ids: Vec<Uuid>) -> Vec<Uuid> {
    label_ids.sort();
    label_ids.dedup();
    label_ids
}

async fn attach_labels(
    tx: &mut Transaction<'_, Sqlite>,
    ticket_id: &str,
    label_ids: &[Uuid],
) -> Result<()> {
    for label_id in label_ids {
        sqlx::query("INSERT OR IGNORE INTO ticket_labels (ticket_id, label_id) VALUES (?, ?)")
            .bind(ticket_id)
            .bind(label_id.to_string())
            .execute(&mut **tx)
            .await
            .map_err(|e| map_write_error(e, "Ticket label"))?;
    }
    Ok(())
}

pub async fn create_ticket(pool: &SqlitePool, ticket: NewTicket) -> Result<Ticket> {
    let timestamp = now();
    let created = Ticket {
        id: Uuid::new_v4(),
        title: ticket.title,
        summary: ticket.summary,
        priority: ticket.priority,
        status: ticket.status,
        estimated_hours: ticket.estimated_hours,
        start_date: ticket.start_date,
        end_date: ticket.end_date,
        assignee_id: ticket.assignee_id,
        parent_ticket_id: ticket.parent_ticket_id,
        project_id: ticket.project_id,
        cycle_id: ticket.cycle_id,
        module_id: ticket.module_id,
        label_ids: distinct_labels(ticket.label_ids),
        created_at: timestamp,
        updated_at: timestamp,
    };
    let id = created.id.to_string();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO tickets (
            id, title, summary, priority, status, estimated_hours, start_date, end_date,
            assignee_id, parent_ticket_id, project_id, cycle_id, module_id, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&created.title)
    .bind(&created.summary)
    .bind(created.priority.as_str())
    .bind(created.status.as_str())
    .bind(created.estimated_hours)
    .bind(date_text(created.start_date))
    .bind(date_text(created.end_date))
    .bind(created.assignee_id.map(|u| u.to_string()))
    .bind(created.parent_ticket_id.map(|u| u.to_string()))
    .bind(created.project_id.to_string())
    .bind(created.cycle_id.map(|u| u.to_string()))
    .bind(created.module_id.map(|u| u.to_string()))
    .bind(timestamp_text(&created.created_at))
    .bind(timestamp_text(&created.updated_at))
    .execute(&mut *tx)
    .await
    .map_err(|e| map_write_error(e, "Ticket"))?;

    attach_labels(&mut tx, &id, &created.label_ids).await?;

    tx.commit().await?;

    tracing::debug!(
        ticket_id = %created.id,
        project_id = %created.project_id,
        priority = %created.priority,
        "Ticket created"
    );

    Ok(created)
}

pub async fn list_tickets(pool: &SqlitePool, project_id: Option<Uuid>) -> Result<Vec<Ticket>> {
    let rows = match project_id {
        Some(project_id) => {
            sqlx::query(&format!(
                "{} WHERE project_id = ? ORDER BY created_at DESC",
                TICKET_SELECT
            ))
            .bind(project_id.to_string())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!("{} ORDER BY created_at DESC", TICKET_SELECT))
                .fetch_all(pool)
                .await?
        }
    };

    rows.iter().map(ticket_from_row).collect()
}

pub async fn get_ticket(pool: &SqlitePool, id: Uuid) -> Result<Option<Ticket>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", TICKET_SELECT))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(ticket_from_row).transpose()
}

/// True when `candidate` is `id` or sits anywhere below it
async fn is_in_subtree(pool: &SqlitePool, id: Uuid, candidate: Uuid) -> Result<bool> {
    let found: bool = sqlx::query_scalar(
        r#"
        WITH RECURSIVE subtree(id) AS (
            SELECT ?1
            UNION
            SELECT t.id FROM tickets t JOIN subtree s ON t.parent_ticket_id = s.id
        )
        SELECT EXISTS(SELECT 1 FROM subtree WHERE id = ?2)
        "#,
    )
    .bind(id.to_string())
    .bind(candidate.to_string())
    .fetch_one(pool)
    .await?;

    Ok(found)
}

pub async fn update_ticket(pool: &SqlitePool, id: Uuid, update: TicketUpdate) -> Result<Option<Ticket>> {
    let Some(mut ticket) = get_ticket(pool, id).await? else {
        return Ok(None);
    };

    if let Some(Some(parent_id)) = update.parent_ticket_id {
        if is_in_subtree(pool, id, parent_id).await? {
            return Err(Error::InvalidInput(format!(
                "Ticket {} cannot depend on itself or one of its subtasks",
                id
            )));
        }
    }

    if let Some(title) = update.title {
        ticket.title = title;
    }
    if let Some(summary) = update.summary {
        ticket.summary = summary;
    }
    if let Some(priority) = update.priority {
        ticket.priority = priority;
    }
    if let Some(status) = update.status {
        ticket.status = status;
    }
    if let Some(estimated_hours) = update.estimated_hours {
        ticket.estimated_hours = estimated_hours;
    }
    if let Some(start_date) = update.start_date {
        ticket.start_date = start_date;
    }
    if let Some(end_date) = update.end_date {
        ticket.end_date = end_date;
    }
    if let Some(assignee_id) = update.assignee_id {
        ticket.assignee_id = assignee_id;
    }
    if let Some(parent_ticket_id) = update.parent_ticket_id {
        ticket.parent_ticket_id = parent_ticket_id;
    }
    if let Some(cycle_id) = update.cycle_id {
        ticket.cycle_id = cycle_id;
    }
    if let Some(module_id) = update.module_id {
        ticket.module_id = module_id;
    }
    let replace_labels = update.label_ids.is_some();
    if let Some(label_ids) = update.label_ids {
        ticket.label_ids = distinct_labels(label_ids);
    }
    ticket.updated_at = now();

    let ticket_id = id.to_string();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE tickets
        SET title = ?, summary = ?, priority = ?, status = ?, estimated_hours = ?,
            start_date = ?, end_date = ?, assignee_id = ?, parent_ticket_id = ?,
            cycle_id = ?, module_id = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&ticket.title)
    .bind(&ticket.summary)
    .bind(ticket.priority.as_str())
    .bind(ticket.status.as_str())
    .bind(ticket.estimated_hours)
    .bind(date_text(ticket.start_date))
    .bind(date_text(ticket.end_date))
    .bind(ticket.assignee_id.map(|u| u.to_string()))
    .bind(ticket.parent_ticket_id.map(|u| u.to_string()))
    .bind(ticket.cycle_id.map(|u| u.to_string()))
    .bind(ticket.module_id.map(|u| u.to_string()))
    .bind(timestamp_text(&ticket.updated_at))
    .bind(&ticket_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| map_write_error(e, "Ticket"))?;

    if replace_labels {
        sqlx::query("DELETE FROM ticket_labels WHERE ticket_id = ?")
            .bind(&ticket_id)
            .execute(&mut *tx)
            .await?;
        attach_labels(&mut tx, &ticket_id, &ticket.label_ids).await?;
    }

    tx.commit().await?;

    Ok(Some(ticket))
}

/// Delete a ticket together with every subtask beneath it
pub async fn delete_ticket(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let deleted = sqlx::query(
        r#"
        WITH RECURSIVE subtree(id) AS (
            SELECT id FROM tickets WHERE id = ?1
            UNION
            SELECT t.id FROM tickets t JOIN subtree s ON t.parent_ticket_id = s.id
        )
        DELETE FROM tickets WHERE id IN (SELECT id FROM subtree)
        "#,
    )
    .bind(id.to_string())
    .execute(pool)
    .await?
    .rows_affected();

    if deleted > 0 {
        tracing::info!(ticket_id = %id, removed = deleted, "Ticket deleted");
    }
    Ok(deleted > 0)
}
