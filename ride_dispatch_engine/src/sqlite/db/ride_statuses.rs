use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NotificationChannel, RideId, RideStatus, RideStatusType},
    traits::DispatchApiError,
};

/// Appends a status row for the ride. Rows are never mutated in place; the log is append-only and the current
/// status is always the most recent row.
pub async fn append_status(
    ride_id: &RideId,
    status: RideStatusType,
    conn: &mut SqliteConnection,
) -> Result<RideStatus, DispatchApiError> {
    let row: RideStatus = sqlx::query_as(
        r#"
            INSERT INTO ride_statuses (ride_id, status)
            VALUES ($1, $2)
            RETURNING *;
        "#,
    )
    .bind(ride_id.as_str())
    .bind(status)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Ride [{ride_id}] moved to {status}");
    Ok(row)
}

/// The current status of the ride: latest creation timestamp, ties broken by insertion order.
pub async fn fetch_latest_status(
    ride_id: &RideId,
    conn: &mut SqliteConnection,
) -> Result<Option<RideStatusType>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT status FROM ride_statuses WHERE ride_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
    )
    .bind(ride_id.as_str())
    .fetch_optional(conn)
    .await
}

/// The oldest status row not yet delivered on the given channel.
pub async fn fetch_oldest_undelivered(
    ride_id: &RideId,
    channel: NotificationChannel,
    conn: &mut SqliteConnection,
) -> Result<Option<RideStatus>, sqlx::Error> {
    let query = format!(
        "SELECT * FROM ride_statuses WHERE ride_id = $1 AND {} IS NULL ORDER BY created_at ASC, id ASC LIMIT 1",
        channel.sent_at_column()
    );
    sqlx::query_as(&query).bind(ride_id.as_str()).fetch_optional(conn).await
}

/// Marks a status row as delivered on the given channel. The write is conditional on the timestamp still being
/// null, so each (status, channel) pair is marked at most once; the loser of a race observes `false`.
pub async fn mark_delivered(
    status_id: i64,
    channel: NotificationChannel,
    conn: &mut SqliteConnection,
) -> Result<bool, DispatchApiError> {
    let column = channel.sent_at_column();
    let query = format!(
        "UPDATE ride_statuses SET {column} = STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW') WHERE id = $1 AND {column} IS NULL"
    );
    let result = sqlx::query(&query).bind(status_id).execute(conn).await?;
    Ok(result.rows_affected() == 1)
}

/// The full status history of a ride in insertion order.
pub async fn fetch_statuses_for_ride(
    ride_id: &RideId,
    conn: &mut SqliteConnection,
) -> Result<Vec<RideStatus>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM ride_statuses WHERE ride_id = $1 ORDER BY created_at ASC, id ASC")
        .bind(ride_id.as_str())
        .fetch_all(conn)
        .await
}
