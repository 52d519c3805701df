use log::trace;
use rds_common::fare::discounted_fare;

use crate::{
    db_types::{Chair, NotificationChannel, User},
    dispatch_api::dispatch_objects::{
        AppNotification,
        ChairNotification,
        ChairStats,
        NotificationChair,
        SimpleUser,
    },
    traits::{DispatchApiError, DispatchDatabase},
};

/// `NotificationApi` is the read path both long-polling clients share.
///
/// Each poll locates the caller's relevant ride and returns the oldest status not yet delivered on the caller's
/// channel — marking it delivered in the same transaction — or the current status when the unsent queue is empty.
/// Every transition is therefore delivered to each channel at least once, and each queued status row at most once.
pub struct NotificationApi<B> {
    db: B,
}

impl<B> NotificationApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> NotificationApi<B>
where B: DispatchDatabase
{
    /// One rider poll. `None` when the user has never requested a ride.
    pub async fn app_notification(&self, user: &User) -> Result<Option<AppNotification>, DispatchApiError> {
        let Some(ride) = self.db.latest_ride_for_user(&user.id).await? else {
            return Ok(None);
        };
        let status = self.db.take_next_status(&ride.id, NotificationChannel::App).await?;
        trace!("🔔️ App notification for user [{}]: ride [{}] is {status}", user.id, ride.id);
        let discount = self.db.discount_for_ride(&ride.id).await?;
        let fare = discounted_fare(&ride.pickup_coordinate(), &ride.destination_coordinate(), discount);
        let chair = match &ride.chair_id {
            Some(chair_id) => {
                let chair = self
                    .db
                    .fetch_chair(chair_id)
                    .await
                    .map_err(DispatchApiError::from)?
                    .ok_or_else(|| DispatchApiError::ChairNotFound(chair_id.clone()))?;
                let (total_rides_count, total_evaluation_avg) = self.db.chair_stats(chair_id).await?;
                Some(NotificationChair {
                    id: chair.id,
                    name: chair.name,
                    model: chair.model,
                    stats: ChairStats { total_rides_count, total_evaluation_avg },
                })
            },
            None => None,
        };
        Ok(Some(AppNotification {
            ride_id: ride.id.clone(),
            pickup_coordinate: ride.pickup_coordinate(),
            destination_coordinate: ride.destination_coordinate(),
            fare,
            status,
            chair,
            created_at: ride.created_at.timestamp_millis(),
            updated_at: ride.updated_at.timestamp_millis(),
        }))
    }

    /// One chair poll. `None` when the chair has never been assigned a ride.
    pub async fn chair_notification(&self, chair: &Chair) -> Result<Option<ChairNotification>, DispatchApiError> {
        let Some(ride) = self.db.latest_ride_for_chair(&chair.id).await? else {
            return Ok(None);
        };
        let status = self.db.take_next_status(&ride.id, NotificationChannel::Chair).await?;
        trace!("🔔️ Chair notification for chair [{}]: ride [{}] is {status}", chair.id, ride.id);
        let user = self
            .db
            .fetch_user(&ride.user_id)
            .await
            .map_err(DispatchApiError::from)?
            .ok_or_else(|| DispatchApiError::DatabaseError(format!("rider {} missing for ride {}", ride.user_id, ride.id)))?;
        Ok(Some(ChairNotification {
            ride_id: ride.id.clone(),
            user: SimpleUser { id: user.id.clone(), name: user.full_name() },
            pickup_coordinate: ride.pickup_coordinate(),
            destination_coordinate: ride.destination_coordinate(),
            status,
        }))
    }
}
