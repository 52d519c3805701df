use log::{debug, trace};
use rds_common::Coordinate;
use sqlx::SqliteConnection;

use crate::{
    coordinate_batcher::PositionUpdate,
    db_types::{Chair, ChairId, NewChair, OwnerId},
    traits::{AccountApiError, DispatchApiError},
};

pub async fn insert_chair(chair: &NewChair, conn: &mut SqliteConnection) -> Result<Chair, AccountApiError> {
    let chair: Chair = sqlx::query_as(
        r#"
            INSERT INTO chairs (id, owner_id, name, model, is_active, access_token)
            VALUES ($1, $2, $3, $4, FALSE, $5)
            RETURNING *;
        "#,
    )
    .bind(chair.id.as_str())
    .bind(chair.owner_id.as_str())
    .bind(&chair.name)
    .bind(&chair.model)
    .bind(&chair.access_token)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Chair [{}] ({}) registered for owner {}", chair.id, chair.model, chair.owner_id);
    Ok(chair)
}

pub async fn fetch_chair_by_id(id: &ChairId, conn: &mut SqliteConnection) -> Result<Option<Chair>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM chairs WHERE id = $1").bind(id.as_str()).fetch_optional(conn).await
}

pub async fn fetch_chair_by_access_token(
    token: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Chair>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM chairs WHERE access_token = $1").bind(token).fetch_optional(conn).await
}

pub async fn fetch_chairs_for_owner(
    owner_id: &OwnerId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Chair>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM chairs WHERE owner_id = $1 ORDER BY created_at")
        .bind(owner_id.as_str())
        .fetch_all(conn)
        .await
}

pub async fn set_activity(
    chair_id: &ChairId,
    is_active: bool,
    conn: &mut SqliteConnection,
) -> Result<(), AccountApiError> {
    sqlx::query("UPDATE chairs SET is_active = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(is_active)
        .bind(chair_id.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

/// The last flushed coordinate for a chair. `None` until the first flush lands.
pub async fn fetch_coordinate(
    chair_id: &ChairId,
    conn: &mut SqliteConnection,
) -> Result<Option<Coordinate>, sqlx::Error> {
    let row: Option<(Option<i64>, Option<i64>)> =
        sqlx::query_as("SELECT latitude, longitude FROM chairs WHERE id = $1")
            .bind(chair_id.as_str())
            .fetch_optional(conn)
            .await?;
    Ok(row.and_then(|(lat, lon)| match (lat, lon) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
        _ => None,
    }))
}

/// Applies one batched position update: overwrite the latest coordinate and add the accumulated delta to the
/// stored total distance.
pub async fn apply_position_update(
    update: &PositionUpdate,
    conn: &mut SqliteConnection,
) -> Result<(), DispatchApiError> {
    trace!("🗃️ Flushing position for chair [{}]: {} (+{})", update.chair_id, update.coordinate, update.distance_delta);
    sqlx::query(
        r#"
            UPDATE chairs
            SET latitude = $1,
                longitude = $2,
                total_distance = total_distance + $3,
                total_distance_updated_at = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $4
        "#,
    )
    .bind(update.coordinate.latitude)
    .bind(update.coordinate.longitude)
    .bind(update.distance_delta)
    .bind(update.chair_id.as_str())
    .execute(conn)
    .await?;
    Ok(())
}

// A chair is available for matching iff it is active, has reported a position, and has no ride whose latest
// status is non-terminal.
const AVAILABLE_FILTER: &str = r#"
    c.is_active = TRUE
    AND c.latitude IS NOT NULL
    AND NOT EXISTS (
        SELECT 1 FROM rides r
        WHERE r.chair_id = c.id
        AND (
            SELECT rs.status FROM ride_statuses rs
            WHERE rs.ride_id = r.id
            ORDER BY rs.created_at DESC, rs.id DESC
            LIMIT 1
        ) NOT IN ('COMPLETED', 'CANCELED')
    )
"#;

/// All chairs available for matching, in a stable order so a matching pass is deterministic per snapshot.
pub async fn fetch_available_chairs(conn: &mut SqliteConnection) -> Result<Vec<Chair>, sqlx::Error> {
    let query = format!("SELECT c.* FROM chairs c WHERE {AVAILABLE_FILTER} ORDER BY c.id");
    sqlx::query_as(&query).fetch_all(conn).await
}

/// Available chairs within a bounding box around the given coordinate. Callers still filter by Manhattan
/// distance; the box only narrows the scan.
pub async fn fetch_available_chairs_in_box(
    coordinate: Coordinate,
    distance: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Chair>, sqlx::Error> {
    let query = format!(
        r#"
            SELECT c.* FROM chairs c
            WHERE c.latitude BETWEEN $1 AND $2
            AND c.longitude BETWEEN $3 AND $4
            AND {AVAILABLE_FILTER}
            ORDER BY c.id
        "#
    );
    sqlx::query_as(&query)
        .bind(coordinate.latitude - distance)
        .bind(coordinate.latitude + distance)
        .bind(coordinate.longitude - distance)
        .bind(coordinate.longitude + distance)
        .fetch_all(conn)
        .await
}
