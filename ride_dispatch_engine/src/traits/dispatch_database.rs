use chrono::{DateTime, Utc};
use rds_common::{Coordinate, Fare};
use thiserror::Error;

use crate::{
    coordinate_batcher::PositionUpdate,
    db_types::{Chair, ChairId, NewRide, NotificationChannel, PaymentToken, Ride, RideId, RideStatus, RideStatusType, UserId},
    traits::AccountApiError,
};

/// Everything the storage layer hands back on ride completion: the updated ride row, the final fare (net of the
/// coupon bound to the ride) and the payment token to charge.
#[derive(Debug, Clone)]
pub struct CompletedRide {
    pub ride: Ride,
    pub fare: Fare,
    pub payment_token: PaymentToken,
}

/// The core dispatch behaviour a backend must provide.
///
/// Every method that touches more than one row runs in a single transaction; a failure at any step rolls the whole
/// operation back. Status insertions refresh the per-ride status cache entry before the call returns, so a caller
/// never observes a status older than its own write.
#[allow(async_fn_in_trait)]
pub trait DispatchDatabase: Clone + crate::traits::AccountManagement {
    /// Creates a ride in a single atomic transaction:
    /// * fails with [`DispatchApiError::RideInProgress`] if the user already has a ride whose latest status is
    ///   non-terminal,
    /// * inserts the ride row and the initial `MATCHING` status,
    /// * consumes a coupon per the consumption policy: on the user's first ride the campaign coupon if available,
    ///   falling back to the oldest unused coupon; on later rides always the oldest unused coupon (or none).
    ///
    /// Returns the ride and the discounted fare the consumed coupon produces.
    async fn create_ride(&self, ride: NewRide) -> Result<(Ride, Fare), DispatchApiError>;

    /// The current status of a ride: the status row with the latest creation timestamp (ties broken by insertion
    /// order). Served through the short-TTL status cache; a miss falls through to storage and refreshes the entry.
    async fn current_ride_status(&self, ride_id: &RideId) -> Result<RideStatusType, DispatchApiError>;

    /// The assigned chair acknowledges the ride, appending `ENROUTE`. Fails with
    /// [`DispatchApiError::AssignmentMismatch`] when the caller is not the ride's assigned chair.
    async fn acknowledge_ride(&self, chair_id: &ChairId, ride_id: &RideId) -> Result<RideStatus, DispatchApiError>;

    /// The assigned chair reports that the rider is on board, appending `CARRYING`. Only accepted while the current
    /// status is exactly `PICKUP`; otherwise fails with [`DispatchApiError::InvalidTransition`].
    async fn start_carrying(&self, chair_id: &ChairId, ride_id: &RideId) -> Result<RideStatus, DispatchApiError>;

    /// Evaluates the chair's newly reported coordinate against its current ride, inside one transaction:
    /// * appends `PICKUP` when the coordinate equals the ride's pickup while the status is `ENROUTE`,
    /// * appends `ARRIVED` when the coordinate equals the ride's destination while the status is `CARRYING`.
    ///
    /// Returns the appended status, if any. The status is read from storage inside the transaction (not the cache)
    /// so concurrent reports cannot double-append.
    async fn process_coordinate_transitions(
        &self,
        chair_id: &ChairId,
        coordinate: Coordinate,
    ) -> Result<Option<RideStatus>, DispatchApiError>;

    /// The last *persisted* coordinate for a chair, used as the distance baseline the first time a chair is touched
    /// in a batch window.
    async fn chair_coordinate_baseline(&self, chair_id: &ChairId) -> Result<Option<Coordinate>, DispatchApiError>;

    /// Persists one drained batch of position updates as a single transaction. Merge semantics per chair: overwrite
    /// the latest coordinate, add the accumulated delta to the stored total distance.
    async fn flush_position_updates(&self, updates: &[PositionUpdate]) -> Result<(), DispatchApiError>;

    /// Completes a ride in a single atomic transaction:
    /// * fails with [`DispatchApiError::InvalidTransition`] unless the current status is `ARRIVED`,
    /// * records the 1–5 evaluation on the ride row,
    /// * appends the `COMPLETED` status,
    /// * resolves the final fare against the coupon bound to the ride (sticky),
    /// * fails with [`DispatchApiError::PaymentTokenMissing`] if the rider has no stored payment token.
    ///
    /// Charging the payment collaborator is the caller's responsibility; it happens after this commit so a gateway
    /// failure cannot roll back the completion.
    async fn complete_ride(&self, ride_id: &RideId, evaluation: i64) -> Result<CompletedRide, DispatchApiError>;

    /// The discount already bound to this ride, or zero. Once a ride is billed against a coupon, recalculations for
    /// that ride must reproduce the same discount regardless of other coupon state.
    async fn discount_for_ride(&self, ride_id: &RideId) -> Result<Fare, DispatchApiError>;

    /// Quote-mode discount resolution, used only for fare estimates: the unused campaign coupon if present, else
    /// the user's oldest unused coupon, else zero. Never consumes anything.
    async fn estimate_discount(&self, user_id: &UserId) -> Result<Fare, DispatchApiError>;

    async fn fetch_ride(&self, ride_id: &RideId) -> Result<Option<Ride>, DispatchApiError>;

    /// The ride most recently created by the user; the ride the rider-facing notification poll reports on.
    async fn latest_ride_for_user(&self, user_id: &UserId) -> Result<Option<Ride>, DispatchApiError>;

    /// The ride most recently updated for the chair; the ride the chair-facing notification poll reports on.
    async fn latest_ride_for_chair(&self, chair_id: &ChairId) -> Result<Option<Ride>, DispatchApiError>;

    /// The notification read path for one channel, in a single transaction: takes the oldest status not yet
    /// delivered on the channel and marks it delivered, or falls back to the current status when the unsent queue
    /// is empty. Serialization through the transaction guarantees each status is delivered exactly once per
    /// channel even under overlapping polls.
    async fn take_next_status(
        &self,
        ride_id: &RideId,
        channel: NotificationChannel,
    ) -> Result<RideStatusType, DispatchApiError>;

    /// Snapshot for one matching pass: all unassigned rides (oldest first) and all chairs available for matching —
    /// active, with a known position, and with no ride whose latest status is non-terminal.
    async fn matching_snapshot(&self) -> Result<(Vec<Ride>, Vec<Chair>), DispatchApiError>;

    /// Claims a chair for a ride. Returns `false` if the ride was assigned concurrently (the write is conditional
    /// on `chair_id` still being null).
    async fn assign_chair_to_ride(&self, ride_id: &RideId, chair_id: &ChairId) -> Result<bool, DispatchApiError>;

    /// The user's completed rides, most recent first.
    async fn completed_rides_for_user(&self, user_id: &UserId) -> Result<Vec<Ride>, DispatchApiError>;

    /// Completed-ride count and mean evaluation for a chair.
    async fn chair_stats(&self, chair_id: &ChairId) -> Result<(i64, f64), DispatchApiError>;

    /// Active chairs within the given Manhattan distance of a coordinate that are free to take a ride.
    async fn nearby_available_chairs(
        &self,
        coordinate: Coordinate,
        distance: i64,
    ) -> Result<Vec<Chair>, DispatchApiError>;

    /// Completed rides served by the owner's chairs whose completion time falls in the window, joined with chair
    /// name and model for the sales report.
    async fn sales_for_owner(
        &self,
        owner_id: &crate::db_types::OwnerId,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<crate::db_types::SaleRecord>, DispatchApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum DispatchApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Ride {0} does not exist")]
    RideNotFound(RideId),
    #[error("Chair {0} does not exist")]
    ChairNotFound(ChairId),
    #[error("ride already exists")]
    RideInProgress,
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),
    #[error("Chair {0} is not assigned to ride {1}")]
    AssignmentMismatch(ChairId, RideId),
    #[error("evaluation must be between 1 and 5")]
    EvaluationOutOfRange,
    #[error("payment token not registered")]
    PaymentTokenMissing,
    #[error("The payment gateway URL is not configured")]
    GatewayNotConfigured,
    #[error("{0}")]
    Gateway(#[from] crate::traits::PaymentGatewayError),
    #[error("{0}")]
    AccountError(#[from] AccountApiError),
}

impl From<sqlx::Error> for DispatchApiError {
    fn from(e: sqlx::Error) -> Self {
        DispatchApiError::DatabaseError(e.to_string())
    }
}
