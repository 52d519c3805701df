use sqlx::SqliteConnection;

use crate::{
    db_types::{PaymentToken, UserId},
    traits::AccountApiError,
};

/// Stores or replaces the user's payment token. A user holds at most one.
pub async fn upsert_token(user_id: &UserId, token: &str, conn: &mut SqliteConnection) -> Result<(), AccountApiError> {
    sqlx::query(
        r#"
            INSERT INTO payment_tokens (user_id, token)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET token = excluded.token
        "#,
    )
    .bind(user_id.as_str())
    .bind(token)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_token(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Option<PaymentToken>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payment_tokens WHERE user_id = $1").bind(user_id.as_str()).fetch_optional(conn).await
}
