//! Query helpers over the four MiniTwit tables.

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::{TimelineEntry, User};

pub const USERNAME_TAKEN: &str = "The username is already taken";

const TIMELINE_COLUMNS: &str = "m.message_id, m.author_id, m.text, m.pub_date, u.username, u.email";

// --- Users ---

pub async fn get_user_by_name(pool: &DbPool, username: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT user_id, username, email, pw_hash FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn get_user_by_id(pool: &DbPool, user_id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT user_id, username, email, pw_hash FROM users WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn get_user_id(pool: &DbPool, username: &str) -> Result<Option<i64>, AppError> {
    let id = sqlx::query_scalar::<_, i64>("SELECT user_id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

/// Inserts a user and returns its id. A concurrent insert of the same
/// username is reported the same way as a pre-existing one.
pub async fn create_user(
    pool: &DbPool,
    username: &str,
    email: &str,
    pw_hash: &str,
) -> Result<i64, AppError> {
    let result = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (username, email, pw_hash) VALUES ($1, $2, $3) RETURNING user_id",
    )
    .bind(username)
    .bind(email)
    .bind(pw_hash)
    .fetch_one(pool)
    .await;

    match result {
        Ok(id) => Ok(id),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(AppError::BadRequest(USERNAME_TAKEN.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

// --- Messages ---

pub async fn create_message(
    pool: &DbPool,
    author_id: i64,
    text: &str,
    pub_date: i64,
) -> Result<i64, AppError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO messages (author_id, text, pub_date, flagged) VALUES ($1, $2, $3, 0) RETURNING message_id",
    )
    .bind(author_id)
    .bind(text)
    .bind(pub_date)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Marks a message as flagged, hiding it from every timeline.
pub async fn flag_message(pool: &DbPool, message_id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE messages SET flagged = 1 WHERE message_id = $1")
        .bind(message_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn public_timeline(pool: &DbPool, limit: i64) -> Result<Vec<TimelineEntry>, AppError> {
    let sql = format!(
        "SELECT {TIMELINE_COLUMNS}
         FROM messages m
         JOIN users u ON m.author_id = u.user_id
         WHERE m.flagged = 0
         ORDER BY m.pub_date DESC, m.message_id DESC
         LIMIT $1"
    );
    let entries = sqlx::query_as::<_, TimelineEntry>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(entries)
}

pub async fn user_timeline(
    pool: &DbPool,
    author_id: i64,
    limit: i64,
) -> Result<Vec<TimelineEntry>, AppError> {
    let sql = format!(
        "SELECT {TIMELINE_COLUMNS}
         FROM messages m
         JOIN users u ON m.author_id = u.user_id
         WHERE m.flagged = 0 AND m.author_id = $1
         ORDER BY m.pub_date DESC, m.message_id DESC
         LIMIT $2"
    );
    let entries = sqlx::query_as::<_, TimelineEntry>(&sql)
        .bind(author_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(entries)
}

/// Own messages plus messages of every followed user, newest first.
pub async fn home_timeline(
    pool: &DbPool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<TimelineEntry>, AppError> {
    let sql = format!(
        "SELECT {TIMELINE_COLUMNS}
         FROM messages m
         JOIN users u ON m.author_id = u.user_id
         WHERE m.flagged = 0
           AND (m.author_id = $1
                OR m.author_id IN (SELECT whom_id FROM followers WHERE who_id = $2))
         ORDER BY m.pub_date DESC, m.message_id DESC
         LIMIT $3"
    );
    let entries = sqlx::query_as::<_, TimelineEntry>(&sql)
        .bind(user_id)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(entries)
}

// --- Followers ---

pub async fn follow(pool: &DbPool, who_id: i64, whom_id: i64) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO followers (who_id, whom_id) VALUES ($1, $2)
         ON CONFLICT (who_id, whom_id) DO NOTHING",
    )
    .bind(who_id)
    .bind(whom_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Returns whether an edge was actually removed.
pub async fn unfollow(pool: &DbPool, who_id: i64, whom_id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM followers WHERE who_id = $1 AND whom_id = $2")
        .bind(who_id)
        .bind(whom_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn is_following(pool: &DbPool, who_id: i64, whom_id: i64) -> Result<bool, AppError> {
    let row = sqlx::query_scalar::<_, i64>(
        "SELECT who_id FROM followers WHERE who_id = $1 AND whom_id = $2",
    )
    .bind(who_id)
    .bind(whom_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

pub async fn followed_usernames(
    pool: &DbPool,
    who_id: i64,
    limit: i64,
) -> Result<Vec<String>, AppError> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT u.username
         FROM users u
         JOIN followers f ON u.user_id = f.whom_id
         WHERE f.who_id = $1
         ORDER BY u.username
         LIMIT $2",
    )
    .bind(who_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(names)
}

// --- Latest command id ---

pub async fn get_latest(pool: &DbPool) -> Result<Option<i64>, AppError> {
    let value = sqlx::query_scalar::<_, i64>("SELECT value FROM latest WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(value)
}

pub async fn set_latest(pool: &DbPool, value: i64) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO latest (id, value) VALUES (1, $1)
         ON CONFLICT (id) DO UPDATE SET value = excluded.value",
    )
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn ping(pool: &DbPool) -> Result<(), AppError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
