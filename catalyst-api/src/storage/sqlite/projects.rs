//! Project persistence

use catalyst_common::models::{NewProject, Project, ProjectUpdate};
use catalyst_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{map_write_error, now, parse_timestamp, parse_uuid, timestamp_text};

const PROJECT_COLUMNS: &str = "id, name, identifier, description, created_at, updated_at";

fn project_from_row(row: &SqliteRow) -> Result<Project> {
    let id: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Project {
        id: parse_uuid(&id)?,
        name: row.try_get("name")?,
        identifier: row.try_get("identifier")?,
        description: row.try_get("description")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

async fn fetch_one_where(pool: &SqlitePool, column: &str, value: &str) -> Result<Option<Project>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM projects WHERE {} = ? LIMIT 1",
        PROJECT_COLUMNS, column
    ))
    .bind(value)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(project_from_row).transpose()
}

pub async fn create_project(pool: &SqlitePool, project: NewProject) -> Result<Project> {
    let name = project.name.trim().to_string();
    let identifier = project.resolved_identifier();

    if find_project_by_name(pool, &name).await?.is_some() {
        return Err(Error::Conflict(format!("Project with name '{}' already exists", name)));
    }
    if find_project_by_identifier(pool, &identifier).await?.is_some() {
        return Err(Error::Conflict(format!(
            "Project with identifier '{}' already exists",
            identifier
        )));
    }

    let timestamp = now();
    let created = Project {
        id: Uuid::new_v4(),
        name,
        identifier,
        description: project.description,
        created_at: timestamp,
        updated_at: timestamp,
    };

    sqlx::query(
        r#"
        INSERT INTO projects (id, name, identifier, description, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(created.id.to_string())
    .bind(&created.name)
    .bind(&created.identifier)
    .bind(&created.description)
    .bind(timestamp_text(&created.created_at))
    .bind(timestamp_text(&created.updated_at))
    .execute(pool)
    .await
    .map_err(|e| map_write_error(e, "Project"))?;

    tracing::debug!(project_id = %created.id, identifier = %created.identifier, "Project created");

    Ok(created)
}

pub async fn list_projects(pool: &SqlitePool) -> Result<Vec<Project>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM projects ORDER BY created_at DESC",
        PROJECT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(project_from_row).collect()
}

pub async fn get_project(pool: &SqlitePool, id: Uuid) -> Result<Option<Project>> {
    fetch_one_where(pool, "id", &id.to_string()).await
}

pub async fn find_project_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Project>> {
    fetch_one_where(pool, "name", name).await
}

pub async fn find_project_by_identifier(pool: &SqlitePool, identifier: &str) -> Result<Option<Project>> {
    fetch_one_where(pool, "identifier", identifier).await
}

pub async fn update_project(pool: &SqlitePool, id: Uuid, update: ProjectUpdate) -> Result<Option<Project>> {
    let Some(mut project) = get_project(pool, id).await? else {
        return Ok(None);
    };

    if let Some(name) = update.name {
        let name = name.trim().to_string();
        if let Some(existing) = find_project_by_name(pool, &name).await? {
            if existing.id != id {
                return Err(Error::Conflict(format!("Project with name '{}' already exists", name)));
            }
        }
        project.name = name;
    }

    if let Some(identifier) = update.identifier {
        let identifier = identifier.trim().to_string();
        if let Some(existing) = find_project_by_identifier(pool, &identifier).await? {
            if existing.id != id {
                return Err(Error::Conflict(format!(
                    "Project with identifier '{}' already exists",
                    identifier
                )));
            }
        }
        project.identifier = identifier;
    }

    if let Some(description) = update.description {
        project.description = description;
    }

    project.updated_at = now();

    sqlx::query(
        r#"
        UPDATE projects
        SET name = ?, identifier = ?, description = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&project.name)
    .bind(&project.identifier)
    .bind(&project.description)
    .bind(timestamp_text(&project.updated_at))
    .bind(id.to_string())
    .execute(pool)
    .await
    .map_err(|e| map_write_error(e, "Project"))?;

    Ok(Some(project))
}

/// Delete a project together with its tickets, labels, cycles and modules
pub async fn delete_project(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let id = id.to_string();
    let mut tx = pool.begin().await?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?)")
        .bind(&id)
        .fetch_one(&mut *tx)
        .await?;
    if !exists {
        return Ok(false);
    }

    let statements = [
        r#"
        DELETE FROM ticket_labels
        WHERE ticket_id IN (SELECT id FROM tickets WHERE project_id = ?1)
           OR label_id IN (SELECT id FROM labels WHERE project_id = ?1)
        "#,
        "DELETE FROM tickets WHERE project_id = ?1",
        "DELETE FROM labels WHERE project_id = ?1",
        "UPDATE tickets SET cycle_id = NULL WHERE cycle_id IN (SELECT id FROM cycles WHERE project_id = ?1)",
        "DELETE FROM cycles WHERE project_id = ?1",
        "UPDATE tickets SET module_id = NULL WHERE module_id IN (SELECT id FROM modules WHERE project_id = ?1)",
        "DELETE FROM modules WHERE project_id = ?1",
        "DELETE FROM projects WHERE id = ?1",
    ];

    for statement in statements {
        sqlx::query(statement).bind(&id).execute(&mut *tx).await?;
    }

    tx.commit().await?;

    tracing::info!(project_id = %id, "Project deleted with related entities");
    Ok(true)
}
