use log::debug;
use rds_common::Fare;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Coupon, RideId, UserId, CAMPAIGN_COUPON_CODE},
    traits::AccountApiError,
};

pub async fn grant_coupon(
    user_id: &UserId,
    code: &str,
    discount: i64,
    conn: &mut SqliteConnection,
) -> Result<(), AccountApiError> {
    sqlx::query("INSERT INTO coupons (user_id, code, discount) VALUES ($1, $2, $3)")
        .bind(user_id.as_str())
        .bind(code)
        .bind(discount)
        .execute(conn)
        .await?;
    debug!("🗃️ Coupon [{code}] worth {discount} granted to user {user_id}");
    Ok(())
}

/// How many times a code has been granted, across all users. Invitation redemption is capped by counting rows
/// sharing the namespaced code.
pub async fn count_code_grants(code: &str, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM coupons WHERE code = $1").bind(code).fetch_one(conn).await
}

/// The user's unused first-use campaign coupon, if any.
pub async fn fetch_unused_campaign_coupon(
    user_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<Coupon>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM coupons WHERE user_id = $1 AND code = $2 AND used_by IS NULL")
        .bind(user_id.as_str())
        .bind(CAMPAIGN_COUPON_CODE)
        .fetch_optional(conn)
        .await
}

/// The user's oldest unused coupon by grant time (FIFO), with the code as a deterministic tie-break.
pub async fn fetch_oldest_unused_coupon(
    user_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<Coupon>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM coupons WHERE user_id = $1 AND used_by IS NULL ORDER BY created_at, code LIMIT 1")
        .bind(user_id.as_str())
        .fetch_optional(conn)
        .await
}

/// The coupon already bound to this ride, if any.
pub async fn fetch_coupon_for_ride(
    ride_id: &RideId,
    conn: &mut SqliteConnection,
) -> Result<Option<Coupon>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM coupons WHERE used_by = $1").bind(ride_id.as_str()).fetch_optional(conn).await
}

/// Consumes a coupon by binding it to the ride. The write is conditional on the coupon still being unused, so two
/// concurrent ride creations can never both consume it; the loser observes `false`.
pub async fn claim_coupon(
    user_id: &UserId,
    code: &str,
    ride_id: &RideId,
    conn: &mut SqliteConnection,
) -> Result<bool, AccountApiError> {
    let result = sqlx::query("UPDATE coupons SET used_by = $1 WHERE user_id = $2 AND code = $3 AND used_by IS NULL")
        .bind(ride_id.as_str())
        .bind(user_id.as_str())
        .bind(code)
        .execute(conn)
        .await?;
    let claimed = result.rows_affected() == 1;
    if claimed {
        debug!("🗃️ Coupon [{code}] of user {user_id} consumed by ride {ride_id}");
    }
    Ok(claimed)
}

/// Resolves the quote-mode discount for a fare estimate: the unused campaign coupon first, else the oldest unused
/// coupon, else zero. Never consumes anything.
pub async fn quote_discount(user_id: &UserId, conn: &mut SqliteConnection) -> Result<Fare, sqlx::Error> {
    if let Some(coupon) = fetch_unused_campaign_coupon(user_id, &mut *conn).await? {
        return Ok(coupon.discount);
    }
    let discount = fetch_oldest_unused_coupon(user_id, conn).await?.map(|c| c.discount).unwrap_or_default();
    Ok(discount)
}
