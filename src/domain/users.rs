//! User domain - DB queries for users
//!
//! All functions use the generic Executor pattern, allowing them to work with
//! both `&SqlitePool` (for standalone queries) and `&mut SqliteConnection` (for transactions).

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub plex_base_url: Option<String>,
    pub plex_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for [`create_user`]; the password is already hashed.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub plex_base_url: Option<&'a str>,
    pub plex_token: Option<&'a str>,
}

const USER_COLUMNS: &str = "id, username, password_hash, plex_base_url, plex_token, created_at";

pub async fn get_user_by_id<'e, E>(executor: E, user_id: i64) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

pub async fn get_user_by_username<'e, E>(
    executor: E,
    username: &str,
) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"))
        .bind(username)
        .fetch_optional(executor)
        .await
}

pub async fn list_users<'e, E>(executor: E) -> Result<Vec<User>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
        .fetch_all(executor)
        .await
}

pub async fn count_users<'e, E>(executor: E) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(executor)
        .await?;
    Ok(count)
}

/// Insert a user and return its id. Fails with a unique violation when the
/// username is taken.
pub async fn create_user<'e, E>(executor: E, user: &NewUser<'_>) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (username, password_hash, plex_base_url, plex_token, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id
        "#,
    )
    .bind(user.username)
    .bind(user.password_hash)
    .bind(user.plex_base_url)
    .bind(user.plex_token)
    .bind(Utc::now())
    .fetch_one(executor)
    .await?;
    Ok(id)
}

pub async fn update_password<'e, E>(
    executor: E,
    user_id: i64,
    password_hash: &str,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE users SET password_hash = ?1 WHERE id = ?2")
        .bind(password_hash)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Replace the user's media server credentials; `None` clears a value.
pub async fn update_plex_credentials<'e, E>(
    executor: E,
    user_id: i64,
    plex_base_url: Option<&str>,
    plex_token: Option<&str>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE users SET plex_base_url = ?1, plex_token = ?2 WHERE id = ?3")
        .bind(plex_base_url)
        .bind(plex_token)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Returns the number of rows removed (0 when the user was already gone).
pub async fn delete_user<'e, E>(executor: E, user_id: i64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
