use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{ChairId, NewRide, OwnerId, Ride, RideId, SaleRecord, UserId},
    traits::DispatchApiError,
};

pub async fn insert_ride(ride: &NewRide, conn: &mut SqliteConnection) -> Result<Ride, DispatchApiError> {
    let ride: Ride = sqlx::query_as(
        r#"
            INSERT INTO rides (id, user_id, pickup_latitude, pickup_longitude, destination_latitude, destination_longitude)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(ride.id.as_str())
    .bind(ride.user_id.as_str())
    .bind(ride.pickup.latitude)
    .bind(ride.pickup.longitude)
    .bind(ride.destination.latitude)
    .bind(ride.destination.longitude)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Ride [{}] created for user {}", ride.id, ride.user_id);
    Ok(ride)
}

pub async fn fetch_ride(ride_id: &RideId, conn: &mut SqliteConnection) -> Result<Option<Ride>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM rides WHERE id = $1").bind(ride_id.as_str()).fetch_optional(conn).await
}

/// The ride most recently created by the user.
pub async fn fetch_latest_for_user(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Option<Ride>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM rides WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1")
        .bind(user_id.as_str())
        .fetch_optional(conn)
        .await
}

/// The ride most recently updated for the chair. Assignment and evaluation both bump `updated_at`, so this is the
/// ride the chair is (or was last) working on.
pub async fn fetch_latest_for_chair(
    chair_id: &ChairId,
    conn: &mut SqliteConnection,
) -> Result<Option<Ride>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM rides WHERE chair_id = $1 ORDER BY updated_at DESC LIMIT 1")
        .bind(chair_id.as_str())
        .fetch_optional(conn)
        .await
}

/// Whether the user has a ride whose latest status is non-terminal.
pub async fn user_has_open_ride(user_id: &UserId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        r#"
            SELECT EXISTS (
                SELECT 1 FROM rides r
                WHERE r.user_id = $1
                AND (
                    SELECT rs.status FROM ride_statuses rs
                    WHERE rs.ride_id = r.id
                    ORDER BY rs.created_at DESC, rs.id DESC
                    LIMIT 1
                ) NOT IN ('COMPLETED', 'CANCELED')
            )
        "#,
    )
    .bind(user_id.as_str())
    .fetch_one(conn)
    .await
}

pub async fn count_rides_for_user(user_id: &UserId, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM rides WHERE user_id = $1").bind(user_id.as_str()).fetch_one(conn).await
}

/// All rides with no assigned chair, oldest creation first. The matcher serves the earliest-waiting rider first.
pub async fn fetch_unassigned(conn: &mut SqliteConnection) -> Result<Vec<Ride>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM rides WHERE chair_id IS NULL ORDER BY created_at, id").fetch_all(conn).await
}

/// Claims a chair for the ride. The write is conditional on the ride still being unassigned, so two concurrent
/// passes cannot both claim it; the loser observes `false`.
pub async fn assign_chair(
    ride_id: &RideId,
    chair_id: &ChairId,
    conn: &mut SqliteConnection,
) -> Result<bool, DispatchApiError> {
    let result = sqlx::query(
        r#"
            UPDATE rides
            SET chair_id = $1, updated_at = STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')
            WHERE id = $2 AND chair_id IS NULL
        "#,
    )
    .bind(chair_id.as_str())
    .bind(ride_id.as_str())
    .execute(conn)
    .await?;
    let assigned = result.rows_affected() == 1;
    if assigned {
        debug!("🗃️ Ride [{ride_id}] assigned to chair [{chair_id}]");
    }
    Ok(assigned)
}

/// Records the 1–5 evaluation. The score is set once; the bumped `updated_at` doubles as the completion time
/// reported to the rider.
pub async fn set_evaluation(
    ride_id: &RideId,
    evaluation: i64,
    conn: &mut SqliteConnection,
) -> Result<Ride, DispatchApiError> {
    let ride: Option<Ride> = sqlx::query_as(
        r#"
            UPDATE rides
            SET evaluation = $1, updated_at = STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')
            WHERE id = $2
            RETURNING *;
        "#,
    )
    .bind(evaluation)
    .bind(ride_id.as_str())
    .fetch_optional(conn)
    .await?;
    ride.ok_or_else(|| DispatchApiError::RideNotFound(ride_id.clone()))
}

/// The user's completed rides, most recent first.
pub async fn fetch_completed_for_user(
    user_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Ride>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT * FROM rides r
            WHERE r.user_id = $1
            AND (
                SELECT rs.status FROM ride_statuses rs
                WHERE rs.ride_id = r.id
                ORDER BY rs.created_at DESC, rs.id DESC
                LIMIT 1
            ) = 'COMPLETED'
            ORDER BY r.created_at DESC
        "#,
    )
    .bind(user_id.as_str())
    .fetch_all(conn)
    .await
}

/// Completed-ride count and mean evaluation for a chair. The evaluation is written in the same operation that
/// completes a ride, so `evaluation IS NOT NULL` plus a COMPLETED status row identifies served rides.
pub async fn chair_stats(chair_id: &ChairId, conn: &mut SqliteConnection) -> Result<(i64, f64), sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT COUNT(*), COALESCE(AVG(evaluation), 0.0)
            FROM rides r
            WHERE r.chair_id = $1
            AND r.evaluation IS NOT NULL
            AND EXISTS (
                SELECT 1 FROM ride_statuses rs
                WHERE rs.ride_id = r.id AND rs.status = 'COMPLETED'
            )
        "#,
    )
    .bind(chair_id.as_str())
    .fetch_one(conn)
    .await
}

/// Completed rides served by the owner's chairs whose completion time falls inside the window, joined with the
/// chair's name and model. Window resolution is one second.
pub async fn sales_for_owner(
    owner_id: &OwnerId,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<SaleRecord>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT
                c.id AS chair_id,
                c.name AS chair_name,
                c.model AS model,
                r.pickup_latitude,
                r.pickup_longitude,
                r.destination_latitude,
                r.destination_longitude
            FROM rides r
            JOIN chairs c ON r.chair_id = c.id
            WHERE c.owner_id = $1
            AND UNIXEPOCH(r.updated_at) BETWEEN $2 AND $3
            AND (
                SELECT rs.status FROM ride_statuses rs
                WHERE rs.ride_id = r.id
                ORDER BY rs.created_at DESC, rs.id DESC
                LIMIT 1
            ) = 'COMPLETED'
            ORDER BY r.updated_at
        "#,
    )
    .bind(owner_id.as_str())
    .bind(since.timestamp())
    .bind(until.timestamp())
    .fetch_all(conn)
    .await
}
