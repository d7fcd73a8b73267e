//! Label persistence

use catalyst_common::color::random_hex_color;
use catalyst_common::models::{Label, LabelUpdate, NewLabel};
use catalyst_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{map_write_error, now, parse_timestamp, parse_uuid, timestamp_text};

const LABEL_COLUMNS: &str = "id, name, color, project_id, created_at";

fn label_from_row(row: &SqliteRow) -> Result<Label> {
    let id: String = row.try_get("id")?;
    let project_id: String = row.try_get("project_id")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Label {
        id: parse_uuid(&id)?,
        name: row.try_get("name")?,
        color: row.try_get("color")?,
        project_id: parse_uuid(&project_id)?,
        created_at: parse_timestamp(&created_at)?,
    })
}

pub async fn create_label(pool: &SqlitePool, label: NewLabel) -> Result<Label> {
    let created = Label {
        id: Uuid::new_v4(),
        name: label.name.trim().to_string(),
        color: label.color.unwrap_or_else(random_hex_color),
        project_id: label.project_id,
        created_at: now(),
    };

    sqlx::query(
        r#"
        INSERT INTO labels (id, name, color, project_id, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(created.id.to_string())
    .bind(&created.name)
    .bind(&created.color)
    .bind(created.project_id.to_string())
    .bind(timestamp_text(&created.created_at))
    .execute(pool)
    .await
    .map_err(|e| map_write_error(e, "Label"))?;

    tracing::debug!(label_id = %created.id, name = %created.name, "Label created");

    Ok(created)
}

pub async fn list_labels(pool: &SqlitePool, project_id: Option<Uuid>) -> Result<Vec<Label>> {
    let rows = match project_id {
        Some(project_id) => {
            sqlx::query(&format!(
                "SELECT {} FROM labels WHERE project_id = ? ORDER BY LOWER(name)",
                LABEL_COLUMNS
            ))
            .bind(project_id.to_string())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!("SELECT {} FROM labels ORDER BY LOWER(name)", LABEL_COLUMNS))
                .fetch_all(pool)
                .await?
        }
    };

    rows.iter().map(label_from_row).collect()
}

pub async fn get_label(pool: &SqlitePool, id: Uuid) -> Result<Option<Label>> {
    let row = sqlx::query(&format!("SELECT {} FROM labels WHERE id = ?", LABEL_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(label_from_row).transpose()
}

pub async fn update_label(pool: &SqlitePool, id: Uuid, update: LabelUpdate) -> Result<Option<Label>> {
    let Some(mut label) = get_label(pool, id).await? else {
        return Ok(None);
    };

    if let Some(name) = update.name {
        label.name = name.trim().to_string();
    }
    if let Some(color) = update.color {
        label.color = color;
    }

    sqlx::query("UPDATE labels SET name = ?, color = ? WHERE id = ?")
        .bind(&label.name)
        .bind(&label.color)
        .bind(id.to_string())
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "Label"))?;

    Ok(Some(label))
}

/// Delete a label and detach it from every ticket carrying it
pub async fn delete_label(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let id = id.to_string();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE tickets SET updated_at = ?
        WHERE id IN (SELECT ticket_id FROM ticket_labels WHERE label_id = ?)
        "#,
    )
    .bind(timestamp_text(&now()))
    .bind(&id)
    .execute(&mut *tx)
    .await?;

    let detached = sqlx::query("DELETE FROM ticket_labels WHERE label_id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let deleted = sqlx::query("DELETE FROM labels WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    if deleted > 0 {
        tracing::info!(label_id = %id, detached, "Label deleted");
    }
    Ok(deleted > 0)
}
