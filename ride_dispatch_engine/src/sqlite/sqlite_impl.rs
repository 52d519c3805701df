//! `SqliteDatabase` is a concrete implementation of a ride dispatch engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module. Every multi-statement operation runs inside a single transaction; SQLite's single-writer transactions
//! stand in for the row-locked reads a server database would use, and the conditional claim writes (coupons, ride
//! assignment, delivery marks) make the races explicit in the affected-row counts.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::warn;
use rds_common::{fare::discounted_fare, helpers::random_id, Coordinate, Fare};
use sqlx::SqlitePool;

use super::db::{chairs, coupons, new_pool, owners, payment_tokens, ride_statuses, rides, settings, users};
use crate::{
    coordinate_batcher::PositionUpdate,
    db_types::{
        Chair,
        ChairId,
        NewChair,
        NewOwner,
        NewRide,
        NotificationChannel,
        Owner,
        OwnerId,
        PaymentToken,
        Ride,
        RideId,
        RideStatus,
        RideStatusType,
        SaleRecord,
        User,
        UserId,
        CAMPAIGN_COUPON_CODE,
        CAMPAIGN_COUPON_DISCOUNT,
        INVITATION_REDEMPTION_CAP,
        INVITE_COUPON_DISCOUNT,
        REWARD_COUPON_DISCOUNT,
    },
    status_cache::StatusCache,
    traits::{
        AccountApiError,
        AccountManagement,
        CompletedRide,
        DispatchApiError,
        DispatchDatabase,
        UserRegistration,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
    status_cache: StatusCache,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool, status_cache: StatusCache::default() })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Refreshes the cached current status for a ride. Best-effort; the cache is an accelerator, not a record.
    fn cache_status(&self, ride_id: &RideId, status: RideStatusType) {
        let key = StatusCache::ride_status_key(ride_id.as_str());
        self.status_cache.set(&key, status.as_str().as_bytes().to_vec());
    }
}

impl AccountManagement for SqliteDatabase {
    async fn register_user(&self, registration: UserRegistration) -> Result<User, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(&registration.user, &mut tx).await?;
        coupons::grant_coupon(&user.id, CAMPAIGN_COUPON_CODE, CAMPAIGN_COUPON_DISCOUNT, &mut tx).await?;
        if let Some(code) = registration.invitation_code_used.as_deref().filter(|c| !c.is_empty()) {
            let invite_code = format!("INV_{code}");
            if coupons::count_code_grants(&invite_code, &mut tx).await? >= INVITATION_REDEMPTION_CAP {
                return Err(AccountApiError::InvalidInvitation);
            }
            let inviter = users::fetch_user_by_invitation_code(code, &mut tx)
                .await?
                .ok_or(AccountApiError::InvalidInvitation)?;
            coupons::grant_coupon(&user.id, &invite_code, INVITE_COUPON_DISCOUNT, &mut tx).await?;
            // The reward code is uniquified per redemption so multiple invitees never collide on the inviter's
            // (user_id, code) key.
            let reward_code = format!("RWD_{}_{}", code, random_id(13));
            coupons::grant_coupon(&inviter.id, &reward_code, REWARD_COUPON_DISCOUNT, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(user)
    }

    async fn register_owner(&self, owner: NewOwner) -> Result<Owner, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        owners::insert_owner(&owner, &mut conn).await
    }

    async fn register_chair(&self, chair: NewChair) -> Result<Chair, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        chairs::insert_chair(&chair, &mut conn).await
    }

    async fn fetch_user_by_access_token(&self, token: &str) -> Result<Option<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user_by_access_token(token, &mut conn).await?)
    }

    async fn fetch_owner_by_access_token(&self, token: &str) -> Result<Option<Owner>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(owners::fetch_owner_by_access_token(token, &mut conn).await?)
    }

    async fn fetch_owner_by_chair_register_token(&self, token: &str) -> Result<Option<Owner>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(owners::fetch_owner_by_chair_register_token(token, &mut conn).await?)
    }

    async fn fetch_chair_by_access_token(&self, token: &str) -> Result<Option<Chair>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(chairs::fetch_chair_by_access_token(token, &mut conn).await?)
    }

    async fn fetch_user(&self, id: &UserId) -> Result<Option<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user_by_id(id, &mut conn).await?)
    }

    async fn fetch_chair(&self, id: &ChairId) -> Result<Option<Chair>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(chairs::fetch_chair_by_id(id, &mut conn).await?)
    }

    async fn fetch_owner(&self, id: &OwnerId) -> Result<Option<Owner>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(owners::fetch_owner_by_id(id, &mut conn).await?)
    }

    async fn fetch_chairs_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Chair>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(chairs::fetch_chairs_for_owner(owner_id, &mut conn).await?)
    }

    async fn set_chair_activity(&self, chair_id: &ChairId, is_active: bool) -> Result<(), AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        chairs::set_activity(chair_id, is_active, &mut conn).await
    }

    async fn register_payment_token(&self, user_id: &UserId, token: &str) -> Result<(), AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        payment_tokens::upsert_token(user_id, token, &mut conn).await
    }

    async fn fetch_payment_token(&self, user_id: &UserId) -> Result<Option<PaymentToken>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payment_tokens::fetch_token(user_id, &mut conn).await?)
    }

    async fn fetch_setting(&self, name: &str) -> Result<Option<String>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(settings::fetch_setting(name, &mut conn).await?)
    }

    async fn store_setting(&self, name: &str, value: &str) -> Result<(), AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        settings::store_setting(name, value, &mut conn).await
    }
}

impl DispatchDatabase for SqliteDatabase {
    async fn create_ride(&self, ride: NewRide) -> Result<(Ride, Fare), DispatchApiError> {
        let mut tx = self.pool.begin().await?;
        if rides::user_has_open_ride(&ride.user_id, &mut tx).await? {
            return Err(DispatchApiError::RideInProgress);
        }
        let ride = rides::insert_ride(&ride, &mut tx).await?;
        ride_statuses::append_status(&ride.id, RideStatusType::Matching, &mut tx).await?;

        // Coupon consumption policy: the first-ever ride must use the campaign coupon if present, falling back to
        // the oldest unused coupon; later rides always take the oldest unused coupon (FIFO), or none.
        let ride_count = rides::count_rides_for_user(&ride.user_id, &mut tx).await?;
        let candidate = if ride_count == 1 {
            match coupons::fetch_unused_campaign_coupon(&ride.user_id, &mut tx).await? {
                Some(coupon) => Some(coupon),
                None => coupons::fetch_oldest_unused_coupon(&ride.user_id, &mut tx).await?,
            }
        } else {
            coupons::fetch_oldest_unused_coupon(&ride.user_id, &mut tx).await?
        };
        let mut discount = Fare::default();
        if let Some(coupon) = candidate {
            if coupons::claim_coupon(&ride.user_id, &coupon.code, &ride.id, &mut tx).await? {
                discount = coupon.discount;
            }
        }
        let fare = discounted_fare(&ride.pickup_coordinate(), &ride.destination_coordinate(), discount);
        tx.commit().await?;
        self.cache_status(&ride.id, RideStatusType::Matching);
        Ok((ride, fare))
    }

    async fn current_ride_status(&self, ride_id: &RideId) -> Result<RideStatusType, DispatchApiError> {
        let key = StatusCache::ride_status_key(ride_id.as_str());
        if let Some(bytes) = self.status_cache.get(&key) {
            if let Some(status) = std::str::from_utf8(&bytes).ok().and_then(|s| s.parse().ok()) {
                return Ok(status);
            }
            warn!("🗃️ Discarding unparseable cache entry for ride {ride_id}");
            self.status_cache.invalidate(&key);
        }
        let mut conn = self.pool.acquire().await?;
        let status = ride_statuses::fetch_latest_status(ride_id, &mut conn)
            .await?
            .ok_or_else(|| DispatchApiError::RideNotFound(ride_id.clone()))?;
        self.cache_status(ride_id, status);
        Ok(status)
    }

    async fn acknowledge_ride(&self, chair_id: &ChairId, ride_id: &RideId) -> Result<RideStatus, DispatchApiError> {
        let mut tx = self.pool.begin().await?;
        let ride = rides::fetch_ride(ride_id, &mut tx)
            .await?
            .ok_or_else(|| DispatchApiError::RideNotFound(ride_id.clone()))?;
        if ride.chair_id.as_ref() != Some(chair_id) {
            return Err(DispatchApiError::AssignmentMismatch(chair_id.clone(), ride_id.clone()));
        }
        let row = ride_statuses::append_status(ride_id, RideStatusType::Enroute, &mut tx).await?;
        tx.commit().await?;
        self.cache_status(ride_id, RideStatusType::Enroute);
        Ok(row)
    }

    async fn start_carrying(&self, chair_id: &ChairId, ride_id: &RideId) -> Result<RideStatus, DispatchApiError> {
        let mut tx = self.pool.begin().await?;
        let ride = rides::fetch_ride(ride_id, &mut tx)
            .await?
            .ok_or_else(|| DispatchApiError::RideNotFound(ride_id.clone()))?;
        if ride.chair_id.as_ref() != Some(chair_id) {
            return Err(DispatchApiError::AssignmentMismatch(chair_id.clone(), ride_id.clone()));
        }
        let current = ride_statuses::fetch_latest_status(ride_id, &mut tx)
            .await?
            .ok_or_else(|| DispatchApiError::RideNotFound(ride_id.clone()))?;
        if current != RideStatusType::Pickup {
            return Err(DispatchApiError::InvalidTransition("chair has not arrived yet".to_string()));
        }
        let row = ride_statuses::append_status(ride_id, RideStatusType::Carrying, &mut tx).await?;
        tx.commit().await?;
        self.cache_status(ride_id, RideStatusType::Carrying);
        Ok(row)
    }

    async fn process_coordinate_transitions(
        &self,
        chair_id: &ChairId,
        coordinate: Coordinate,
    ) -> Result<Option<RideStatus>, DispatchApiError> {
        let mut tx = self.pool.begin().await?;
        let Some(ride) = rides::fetch_latest_for_chair(chair_id, &mut tx).await? else {
            return Ok(None);
        };
        // The status is read from storage inside the transaction, not through the cache, so two overlapping
        // reports cannot both observe the pre-transition status.
        let Some(current) = ride_statuses::fetch_latest_status(&ride.id, &mut tx).await? else {
            return Ok(None);
        };
        let appended = if current.is_terminal() {
            None
        } else if current == RideStatusType::Enroute && coordinate == ride.pickup_coordinate() {
            Some(ride_statuses::append_status(&ride.id, RideStatusType::Pickup, &mut tx).await?)
        } else if current == RideStatusType::Carrying && coordinate == ride.destination_coordinate() {
            Some(ride_statuses::append_status(&ride.id, RideStatusType::Arrived, &mut tx).await?)
        } else {
            None
        };
        tx.commit().await?;
        if let Some(row) = &appended {
            self.cache_status(&ride.id, row.status);
        }
        Ok(appended)
    }

    async fn chair_coordinate_baseline(&self, chair_id: &ChairId) -> Result<Option<Coordinate>, DispatchApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(chairs::fetch_coordinate(chair_id, &mut conn).await?)
    }

    async fn flush_position_updates(&self, updates: &[PositionUpdate]) -> Result<(), DispatchApiError> {
        if updates.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for update in updates {
            chairs::apply_position_update(update, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn complete_ride(&self, ride_id: &RideId, evaluation: i64) -> Result<CompletedRide, DispatchApiError> {
        let mut tx = self.pool.begin().await?;
        let ride = rides::fetch_ride(ride_id, &mut tx)
            .await?
            .ok_or_else(|| DispatchApiError::RideNotFound(ride_id.clone()))?;
        let current = ride_statuses::fetch_latest_status(ride_id, &mut tx)
            .await?
            .ok_or_else(|| DispatchApiError::RideNotFound(ride_id.clone()))?;
        if current != RideStatusType::Arrived {
            return Err(DispatchApiError::InvalidTransition("not arrived yet".to_string()));
        }
        let ride = rides::set_evaluation(ride_id, evaluation, &mut tx).await?;
        ride_statuses::append_status(ride_id, RideStatusType::Completed, &mut tx).await?;
        let payment_token = payment_tokens::fetch_token(&ride.user_id, &mut tx)
            .await?
            .ok_or(DispatchApiError::PaymentTokenMissing)?;
        let discount =
            coupons::fetch_coupon_for_ride(ride_id, &mut tx).await?.map(|c| c.discount).unwrap_or_default();
        let fare = discounted_fare(&ride.pickup_coordinate(), &ride.destination_coordinate(), discount);
        tx.commit().await?;
        self.cache_status(ride_id, RideStatusType::Completed);
        Ok(CompletedRide { ride, fare, payment_token })
    }

    async fn discount_for_ride(&self, ride_id: &RideId) -> Result<Fare, DispatchApiError> {
        let mut conn = self.pool.acquire().await?;
        let discount = coupons::fetch_coupon_for_ride(ride_id, &mut conn).await?.map(|c| c.discount).unwrap_or_default();
        Ok(discount)
    }

    async fn estimate_discount(&self, user_id: &UserId) -> Result<Fare, DispatchApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(coupons::quote_discount(user_id, &mut conn).await?)
    }

    async fn fetch_ride(&self, ride_id: &RideId) -> Result<Option<Ride>, DispatchApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(rides::fetch_ride(ride_id, &mut conn).await?)
    }

    async fn latest_ride_for_user(&self, user_id: &UserId) -> Result<Option<Ride>, DispatchApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(rides::fetch_latest_for_user(user_id, &mut conn).await?)
    }

    async fn latest_ride_for_chair(&self, chair_id: &ChairId) -> Result<Option<Ride>, DispatchApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(rides::fetch_latest_for_chair(chair_id, &mut conn).await?)
    }

    async fn take_next_status(
        &self,
        ride_id: &RideId,
        channel: NotificationChannel,
    ) -> Result<RideStatusType, DispatchApiError> {
        let mut tx = self.pool.begin().await?;
        let status = match ride_statuses::fetch_oldest_undelivered(ride_id, channel, &mut tx).await? {
            Some(row) => {
                ride_statuses::mark_delivered(row.id, channel, &mut tx).await?;
                row.status
            },
            None => ride_statuses::fetch_latest_status(ride_id, &mut tx)
                .await?
                .ok_or_else(|| DispatchApiError::RideNotFound(ride_id.clone()))?,
        };
        tx.commit().await?;
        Ok(status)
    }

    async fn matching_snapshot(&self) -> Result<(Vec<Ride>, Vec<Chair>), DispatchApiError> {
        let mut tx = self.pool.begin().await?;
        let rides = rides::fetch_unassigned(&mut tx).await?;
        let chairs = chairs::fetch_available_chairs(&mut tx).await?;
        tx.commit().await?;
        Ok((rides, chairs))
    }

    async fn assign_chair_to_ride(&self, ride_id: &RideId, chair_id: &ChairId) -> Result<bool, DispatchApiError> {
        let mut conn = self.pool.acquire().await?;
        rides::assign_chair(ride_id, chair_id, &mut conn).await
    }

    async fn completed_rides_for_user(&self, user_id: &UserId) -> Result<Vec<Ride>, DispatchApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(rides::fetch_completed_for_user(user_id, &mut conn).await?)
    }

    async fn chair_stats(&self, chair_id: &ChairId) -> Result<(i64, f64), DispatchApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(rides::chair_stats(chair_id, &mut conn).await?)
    }

    async fn nearby_available_chairs(
        &self,
        coordinate: Coordinate,
        distance: i64,
    ) -> Result<Vec<Chair>, DispatchApiError> {
        let mut conn = self.pool.acquire().await?;
        let candidates = chairs::fetch_available_chairs_in_box(coordinate, distance, &mut conn).await?;
        // The box query over-approximates; trim to the Manhattan radius here.
        let nearby = candidates
            .into_iter()
            .filter(|c| c.coordinate().map(|pos| pos.manhattan_distance(&coordinate) <= distance).unwrap_or(false))
            .collect();
        Ok(nearby)
    }

    async fn sales_for_owner(
        &self,
        owner_id: &OwnerId,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<SaleRecord>, DispatchApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(rides::sales_for_owner(owner_id, since, until, &mut conn).await?)
    }
}
