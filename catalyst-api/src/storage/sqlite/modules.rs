//! Module (feature group) persistence

use catalyst_common::models::{Module, ModuleUpdate, NewModule};
use catalyst_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{map_write_error, now, parse_timestamp, parse_uuid, timestamp_text};

const MODULE_COLUMNS: &str = "id, name, description, project_id, created_at, updated_at";

fn module_from_row(row: &SqliteRow) -> Result<Module> {
    let id: String = row.try_get("id")?;
    let project_id: String = row.try_get("project_id")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Module {
        id: parse_uuid(&id)?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        project_id: parse_uuid(&project_id)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

pub async fn create_module(pool: &SqlitePool, module: NewModule) -> Result<Module> {
    let timestamp = now();
    let created = Module {
        id: Uuid::new_v4(),
        name: module.name.trim().to_string(),
        description: module.description,
        project_id: module.project_id,
        created_at: timestamp,
        updated_at: timestamp,
    };

    sqlx::query(
        r#"
        INSERT INTO modules (id, name, description, project_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(created.id.to_string())
    .bind(&created.name)
    .bind(&created.description)
    .bind(created.project_id.to_string())
    .bind(timestamp_text(&created.created_at))
    .bind(timestamp_text(&created.updated_at))
    .execute(pool)
    .await
    .map_err(|e| map_write_error(e, "Module"))?;

    Ok(created)
}

pub async fn list_modules(pool: &SqlitePool, project_id: Option<Uuid>) -> Result<Vec<Module>> {
    let rows = match project_id {
        Some(project_id) => {
            sqlx::query(&format!(
                "SELECT {} FROM modules WHERE project_id = ? ORDER BY LOWER(name)",
                MODULE_COLUMNS
            ))
            .bind(project_id.to_string())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!("SELECT {} FROM modules ORDER BY LOWER(name)", MODULE_COLUMNS))
                .fetch_all(pool)
                .await?
        }
    };

    rows.iter().map(module_from_row).collect()
}

pub async fn get_module(pool: &SqlitePool, id: Uuid) -> Result<Option<Module>> {
    let row = sqlx::query(&format!("SELECT {} FROM modules WHERE id = ?", MODULE_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(module_from_row).transpose()
}

pub async fn update_module(pool: &SqlitePool, id: Uuid, update: ModuleUpdate) -> Result<Option<Module>> {
    let Some(mut module) = get_module(pool, id).await? else {
        return Ok(None);
    };

    if let Some(name) = update.name {
        module.name = name.trim().to_string();
    }
    if let Some(description) = update.description {
        module.description = description;
    }
    module.updated_at = now();

    sqlx::query("UPDATE modules SET name = ?, description = ?, updated_at = ? WHERE id = ?")
        .bind(&module.name)
        .bind(&module.description)
        .bind(timestamp_text(&module.updated_at))
        .bind(id.to_string())
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "Module"))?;

    Ok(Some(module))
}

/// Delete a module; its tickets stay in the project, ungrouped
pub async fn delete_module(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let id = id.to_string();
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE tickets SET module_id = NULL, updated_at = ? WHERE module_id = ?")
        .bind(timestamp_text(&now()))
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM modules WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    Ok(deleted > 0)
}
