//! User persistence

use catalyst_common::color::random_hex_color;
use catalyst_common::models::{NewUser, User, UserUpdate};
use catalyst_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{map_write_error, now, parse_timestamp, parse_uuid, timestamp_text};

const USER_COLUMNS: &str = "id, name, email, color, created_at, updated_at";

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let id: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(User {
        id: parse_uuid(&id)?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        color: row.try_get("color")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Blank emails are stored as NULL so they never collide
fn normalize_email(email: Option<String>) -> Option<String> {
    email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
}

pub async fn create_user(pool: &SqlitePool, user: NewUser) -> Result<User> {
    let email = normalize_email(user.email);

    if let Some(email) = &email {
        if find_user_by_email(pool, email).await?.is_some() {
            return Err(Error::Conflict(format!("User with email {} already exists", email)));
        }
    }

    let timestamp = now();
    let created = User {
        id: Uuid::new_v4(),
        name: user.name.trim().to_string(),
        email,
        color: Some(user.color.unwrap_or_else(random_hex_color)),
        created_at: timestamp,
        updated_at: timestamp,
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, color, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(created.id.to_string())
    .bind(&created.name)
    .bind(&created.email)
    .bind(&created.color)
    .bind(timestamp_text(&created.created_at))
    .bind(timestamp_text(&created.updated_at))
    .execute(pool)
    .await
    .map_err(|e| map_write_error(e, "User"))?;

    tracing::debug!(user_id = %created.id, name = %created.name, "User created");

    Ok(created)
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM users ORDER BY LOWER(name), created_at",
        USER_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(user_from_row).collect()
}

pub async fn get_user(pool: &SqlitePool, id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ? LIMIT 1", USER_COLUMNS))
        .bind(email)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn update_user(pool: &SqlitePool, id: Uuid, update: UserUpdate) -> Result<Option<User>> {
    let Some(mut user) = get_user(pool, id).await? else {
        return Ok(None);
    };

    if let Some(name) = update.name {
        user.name = name.trim().to_string();
    }

    if let Some(email) = update.email {
        let email = normalize_email(email);
        if let Some(address) = &email {
            if let Some(existing) = find_user_by_email(pool, address).await? {
                if existing.id != id {
                    return Err(Error::Conflict(format!("User with email {} already exists", address)));
                }
            }
        }
        user.email = email;
    }

    if let Some(color) = update.color {
        user.color = color;
    }

    user.updated_at = now();

    sqlx::query("UPDATE users SET name = ?, email = ?, color = ?, updated_at = ? WHERE id = ?")
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.color)
        .bind(timestamp_text(&user.updated_at))
        .bind(id.to_string())
        .execute(pool)
        .await
        .map_err(|e| map_write_error(e, "User"))?;

    Ok(Some(user))
}

/// Delete a user, clearing the assignee of every ticket they held
pub async fn delete_user(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let id = id.to_string();
    let mut tx = pool.begin().await?;

    let unassigned = sqlx::query("UPDATE tickets SET assignee_id = NULL, updated_at = ? WHERE assignee_id = ?")
        .bind(timestamp_text(&now()))
        .bind(&id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    if deleted > 0 {
        tracing::info!(user_id = %id, unassigned, "User deleted");
    }
    Ok(deleted > 0)
}
