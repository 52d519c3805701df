use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOwner, Owner, OwnerId},
    traits::AccountApiError,
};

pub async fn insert_owner(owner: &NewOwner, conn: &mut SqliteConnection) -> Result<Owner, AccountApiError> {
    let owner: Owner = sqlx::query_as(
        r#"
            INSERT INTO owners (id, name, access_token, chair_register_token)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(owner.id.as_str())
    .bind(&owner.name)
    .bind(&owner.access_token)
    .bind(&owner.chair_register_token)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Owner [{}] registered as {}", owner.id, owner.name);
    Ok(owner)
}

pub async fn fetch_owner_by_id(id: &OwnerId, conn: &mut SqliteConnection) -> Result<Option<Owner>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM owners WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await
}

pub async fn fetch_owner_by_access_token(
    token: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Owner>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM owners WHERE access_token = $1").bind(token).fetch_optional(conn).await
}

pub async fn fetch_owner_by_chair_register_token(
    token: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Owner>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM owners WHERE chair_register_token = $1").bind(token).fetch_optional(conn).await
}
