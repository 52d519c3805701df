use sqlx::SqliteConnection;

use crate::traits::AccountApiError;

pub async fn store_setting(name: &str, value: &str, conn: &mut SqliteConnection) -> Result<(), AccountApiError> {
    sqlx::query(
        r#"
            INSERT INTO settings (name, value)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(name)
    .bind(value)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_setting(name: &str, conn: &mut SqliteConnection) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT value FROM settings WHERE name = $1").bind(name).fetch_optional(conn).await
}
