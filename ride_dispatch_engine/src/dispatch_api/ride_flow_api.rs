use chrono::{DateTime, Utc};
use log::{debug, trace};
use rds_common::{
    fare::{calculate_fare, discounted_fare},
    Coordinate,
    Fare,
};

use crate::{
    coordinate_batcher::CoordinateBatcher,
    db_types::{Chair, NewRide, Ride, RideId, RideStatus, User, PAYMENT_GATEWAY_URL_SETTING},
    dispatch_api::dispatch_objects::{CompletedRideSummary, NearbyChair, RideSummaryChair},
    traits::{DispatchApiError, DispatchDatabase, PaymentGateway},
};

/// `RideFlowApi` is the primary API for the ride lifecycle: creation with coupon consumption, fare estimates,
/// chair-driven status transitions, position ingestion and the rider-facing completion flow.
pub struct RideFlowApi<B> {
    db: B,
    batcher: CoordinateBatcher,
}

impl<B> RideFlowApi<B> {
    pub fn new(db: B, batcher: CoordinateBatcher) -> Self {
        Self { db, batcher }
    }
}

impl<B> RideFlowApi<B>
where B: DispatchDatabase
{
    /// Creates a ride for the user. Fails with [`DispatchApiError::RideInProgress`] while the user has an
    /// unfinished ride. The returned fare already reflects the coupon consumed by this creation.
    pub async fn create_ride(
        &self,
        user: &User,
        pickup: Coordinate,
        destination: Coordinate,
    ) -> Result<(Ride, Fare), DispatchApiError> {
        let ride = NewRide::new(user.id.clone(), pickup, destination);
        let (ride, fare) = self.db.create_ride(ride).await?;
        debug!("🚕️ Ride [{}] created: {} → {} at fare {}", ride.id, pickup, destination, fare);
        Ok((ride, fare))
    }

    /// Quotes the fare for a prospective trip. Previews the discount a subsequent ride creation would apply
    /// without consuming anything. Returns `(fare, discount)`.
    pub async fn estimate_fare(
        &self,
        user: &User,
        pickup: Coordinate,
        destination: Coordinate,
    ) -> Result<(Fare, Fare), DispatchApiError> {
        let discount = self.db.estimate_discount(&user.id).await?;
        let fare = discounted_fare(&pickup, &destination, discount);
        let discount = calculate_fare(&pickup, &destination) - fare;
        Ok((fare, discount))
    }

    /// The fare a ride was (or will be) billed at, reproducing the discount of the coupon bound to the ride.
    pub async fn fare_for_ride(&self, ride: &Ride) -> Result<Fare, DispatchApiError> {
        let discount = self.db.discount_for_ride(&ride.id).await?;
        Ok(discounted_fare(&ride.pickup_coordinate(), &ride.destination_coordinate(), discount))
    }

    /// The assigned chair acknowledges the ride (`ENROUTE`) or reports the rider on board (`CARRYING`).
    pub async fn acknowledge_ride(&self, chair: &Chair, ride_id: &RideId) -> Result<RideStatus, DispatchApiError> {
        self.db.acknowledge_ride(&chair.id, ride_id).await
    }

    pub async fn start_carrying(&self, chair: &Chair, ride_id: &RideId) -> Result<RideStatus, DispatchApiError> {
        self.db.start_carrying(&chair.id, ride_id).await
    }

    /// Ingests a chair position report. The report merges into the coordinate batch (no synchronous position
    /// write); the PICKUP/ARRIVED auto-transitions are evaluated against the newly reported coordinate in the
    /// same logical operation, so a concurrent flush can never cause a missed arrival.
    pub async fn update_coordinate(
        &self,
        chair: &Chair,
        coordinate: Coordinate,
    ) -> Result<(DateTime<Utc>, Option<RideStatus>), DispatchApiError> {
        let baseline = self.db.chair_coordinate_baseline(&chair.id).await?;
        let delta = self.batcher.merge(&chair.id, coordinate, baseline);
        trace!("📍️ Chair [{}] at {} (+{delta})", chair.id, coordinate);
        let transition = self.db.process_coordinate_transitions(&chair.id, coordinate).await?;
        Ok((Utc::now(), transition))
    }

    /// Drains the coordinate batch and persists it as one transaction. Returns the number of chairs flushed.
    pub async fn flush_positions(&self) -> Result<usize, DispatchApiError> {
        let updates = self.batcher.drain();
        if updates.is_empty() {
            return Ok(0);
        }
        let count = updates.len();
        self.db.flush_position_updates(&updates).await?;
        trace!("📍️ Flushed positions for {count} chairs");
        Ok(count)
    }

    /// The rider evaluates (and thereby completes) a ride. Only valid while the current status is `ARRIVED`.
    /// The final fare is charged against the rider's stored payment token exactly once, after the completion has
    /// been committed.
    pub async fn evaluate_ride<G: PaymentGateway>(
        &self,
        user: &User,
        ride_id: &RideId,
        evaluation: i64,
        gateway: &G,
    ) -> Result<Ride, DispatchApiError> {
        if !(1..=5).contains(&evaluation) {
            return Err(DispatchApiError::EvaluationOutOfRange);
        }
        let ride = self
            .db
            .fetch_ride(ride_id)
            .await?
            .ok_or_else(|| DispatchApiError::RideNotFound(ride_id.clone()))?;
        if ride.user_id != user.id {
            return Err(DispatchApiError::RideNotFound(ride_id.clone()));
        }
        let gateway_url = self
            .db
            .fetch_setting(PAYMENT_GATEWAY_URL_SETTING)
            .await
            .map_err(DispatchApiError::from)?
            .ok_or(DispatchApiError::GatewayNotConfigured)?;
        let completed = self.db.complete_ride(ride_id, evaluation).await?;
        gateway.charge(&gateway_url, &completed.payment_token.token, completed.fare).await?;
        debug!("🚕️ Ride [{ride_id}] completed with evaluation {evaluation}; charged {}", completed.fare);
        Ok(completed.ride)
    }

    /// The user's completed rides with their billed fares, most recent first.
    pub async fn ride_history(&self, user: &User) -> Result<Vec<CompletedRideSummary>, DispatchApiError> {
        let rides = self.db.completed_rides_for_user(&user.id).await?;
        let mut items = Vec::with_capacity(rides.len());
        for ride in rides {
            let fare = self.fare_for_ride(&ride).await?;
            let Some(chair_id) = ride.chair_id.clone() else {
                continue;
            };
            let chair = self
                .db
                .fetch_chair(&chair_id)
                .await
                .map_err(DispatchApiError::from)?
                .ok_or(DispatchApiError::ChairNotFound(chair_id))?;
            let owner = self
                .db
                .fetch_owner(&chair.owner_id)
                .await
                .map_err(DispatchApiError::from)?
                .map(|o| o.name)
                .unwrap_or_default();
            items.push(CompletedRideSummary {
                id: ride.id.clone(),
                pickup_coordinate: ride.pickup_coordinate(),
                destination_coordinate: ride.destination_coordinate(),
                chair: RideSummaryChair { id: chair.id, owner, name: chair.name, model: chair.model },
                fare,
                evaluation: ride.evaluation.unwrap_or_default(),
                requested_at: ride.created_at.timestamp_millis(),
                completed_at: ride.updated_at.timestamp_millis(),
            });
        }
        Ok(items)
    }

    /// Active, free chairs within `distance` of the coordinate, with the retrieval time.
    pub async fn nearby_chairs(
        &self,
        coordinate: Coordinate,
        distance: i64,
    ) -> Result<(Vec<NearbyChair>, DateTime<Utc>), DispatchApiError> {
        let chairs = self.db.nearby_available_chairs(coordinate, distance).await?;
        let nearby = chairs
            .into_iter()
            .filter_map(|c| {
                c.coordinate().map(|current_coordinate| NearbyChair {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    model: c.model.clone(),
                    current_coordinate,
                })
            })
            .collect();
        Ok((nearby, Utc::now()))
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
