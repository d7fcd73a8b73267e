//! Cycle (sprint) persistence

use catalyst_common::models::{Cycle, CycleUpdate, NewCycle};
use catalyst_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{
    date_text, map_write_error, now, parse_optional_date, parse_timestamp, parse_uuid,
    timestamp_text,
};

const CYCLE_COLUMNS: &str =
    "id, name, description, start_date, end_date, project_id, created_at, updated_at";

fn cycle_from_row(row: &SqliteRow) -> Result<Cycle> {
    let id: String = row.try_get("id")?;
    let project_id: String = row.try_get("project_id")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Cycle {
        id: parse_uuid(&id)?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        start_date: parse_optional_date(row.try_get("start_date")?)?,
        end_date: parse_optional_date(row.try_get("end_date")?)?,
        project_id: parse_uuid(&project_id)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

pub async fn create_cycle(pool: &SqlitePool, cycle: NewCycle) -> Result<Cycle> {
    let timestamp = now();
    let created = Cycle {
        id: Uuid::new_v4(),
        name: cycle.name.trim().to_string(),
        description: cycle.description,
        start_date: cycle.start_date,
        end_date: cycle.end_date,
        project_id: cycle.project_id,
        created_at: timestamp,
        updated_at: timestamp,
    };

    sqlx::query(
        r#"
        INSERT INTO cycles (id, name, description, start_date, end_date, project_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(created.id.to_string())
    .bind(&created.name)
    .bind(&created.description)
    .bind(date_text(created.start_date))
    .bind(date_text(created.end_date))
    .bind(created.project_id.to_string())
    .bind(timestamp_text(&created.created_at))
    .bind(timestamp_text(&created.updated_at))
    .execute(pool)
    .await
    .map_err(|e| map_write_error(e, "Cycle"))?;

    Ok(created)
}

pub async fn list_cycles(pool: &SqlitePool, project_id: Option<Uuid>) -> Result<Vec<Cycle>> {
    // Undated cycles sort last
    let rows = match project_id {
        Some(project_id) => {
            sqlx::query(&format!(
                "SELECT {} FROM cycles WHERE project_id = ? ORDER BY start_date IS NULL, start_date DESC",
                CYCLE_COLUMNS
            ))
            .bind(project_id.to_string())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM cycles ORDER BY start_date IS NULL, start_date DESC",
                CYCLE_COLUMNS
            ))
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter().map(cycle_from_row).collect()
}

pub async fn get_cycle(pool: &SqlitePool, id: Uuid) -> Result<Option<Cycle>> {
    let row = sqlx::query(&format!("SELECT {} FROM cycles WHERE id = ?", CYCLE_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(cycle_from_row).transpose()
}

pub async fn update_cycle(pool: &SqlitePool, id: Uuid, update: CycleUpdate) -> Result<Option<Cycle>> {
    let Some(mut cycle) = get_cycle(pool, id).await? else {
        return Ok(None);
    };

    if let Some(name) = update.name {
        cycle.name = name.trim().to_string();
    }
    if let Some(description) = update.description {
        cycle.description = description;
    }
    if let Some(start_date) = update.start_date {
        cycle.start_date = start_date;
    }
    if let Some(end_date) = update.end_date {
        cycle.end_date = end_date;
    }
    cycle.updated_at = now();

    sqlx::query(
        r#"
        UPDATE cycles
        SET name = ?, description = ?, start_date = ?, end_date = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&cycle.name)
    .bind(&cycle.description)
    .bind(date_text(cycle.start_date))
    .bind(date_text(cycle.end_date))
    .bind(timestamp_text(&cycle.updated_at))
    .bind(id.to_string())
    .execute(pool)
    .await
    .map_err(|e| map_write_error(e, "Cycle"))?;

    Ok(Some(cycle))
}

/// Delete a cycle; tickets planned into it become unplanned
pub async fn delete_cycle(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let id = id.to_string();
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE tickets SET cycle_id = NULL, updated_at = ? WHERE cycle_id = ?")
        .bind(timestamp_text(&now()))
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM cycles WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    Ok(deleted > 0)
}
