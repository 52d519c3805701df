use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, User, UserId},
    traits::AccountApiError,
};

pub async fn insert_user(user: &NewUser, conn: &mut SqliteConnection) -> Result<User, AccountApiError> {
    let user: User = sqlx::query_as(
        r#"
            INSERT INTO users (id, username, firstname, lastname, date_of_birth, access_token, invitation_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(user.id.as_str())
    .bind(&user.username)
    .bind(&user.firstname)
    .bind(&user.lastname)
    .bind(&user.date_of_birth)
    .bind(&user.access_token)
    .bind(&user.invitation_code)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ User [{}] registered as {}", user.id, user.username);
    Ok(user)
}

pub async fn fetch_user_by_id(id: &UserId, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await
}

pub async fn fetch_user_by_access_token(token: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE access_token = $1").bind(token).fetch_optional(conn).await
}

/// Looks up the inviter owning the given invitation code.
pub async fn fetch_user_by_invitation_code(
    code: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE invitation_code = $1").bind(code).fetch_optional(conn).await
}
