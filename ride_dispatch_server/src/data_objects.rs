//! Request and response bodies for the wire surfaces. The JSON field names are load-bearing: both client apps
//! depend on the literal values.
use rds_common::{Coordinate, Fare};
use ride_dispatch_engine::db_types::{ChairId, OwnerId, RideId, UserId};
use serde::{Deserialize, Serialize};

//----------------------------------------------   App: users   ------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct AppPostUsersRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub date_of_birth: String,
    pub invitation_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppPostUsersResponse {
    pub id: UserId,
    pub invitation_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppPostPaymentMethodsRequest {
    #[serde(default)]
    pub token: String,
}

//----------------------------------------------   App: rides   ------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct AppPostRidesRequest {
    pub pickup_coordinate: Option<Coordinate>,
    pub destination_coordinate: Option<Coordinate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppPostRidesResponse {
    pub ride_id: RideId,
    pub fare: Fare,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppPostRidesEstimatedFareResponse {
    pub fare: Fare,
    pub discount: Fare,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppPostRideEvaluationRequest {
    #[serde(default)]
    pub evaluation: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppPostRideEvaluationResponse {
    pub completed_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetAppRidesResponse {
    pub rides: Vec<ride_dispatch_engine::dispatch_objects::CompletedRideSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NearbyChairsQuery {
    pub latitude: Option<i64>,
    pub longitude: Option<i64>,
    pub distance: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NearbyChairsResponse {
    pub chairs: Vec<ride_dispatch_engine::dispatch_objects::NearbyChair>,
    pub retrieved_at: i64,
}

//----------------------------------------------  Notifications  -----------------------------------------------------
/// The envelope both long-poll endpoints share. `data` is null when the caller has no relevant ride yet;
/// `retry_after_ms` tells the client when to poll again.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationResponse<T> {
    pub data: Option<T>,
    pub retry_after_ms: u64,
}

//----------------------------------------------     Chairs      -----------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct ChairPostChairsRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub chair_register_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChairPostChairsResponse {
    pub id: ChairId,
    pub owner_id: OwnerId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChairPostActivityRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChairPostCoordinateResponse {
    pub recorded_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChairPostRideStatusRequest {
    #[serde(default)]
    pub status: String,
}

//----------------------------------------------     Owners      -----------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerPostOwnersRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerPostOwnersResponse {
    pub id: OwnerId,
    pub chair_register_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerGetChairsResponse {
    pub chairs: Vec<ride_dispatch_engine::dispatch_objects::OwnerChairSummary>,
}

/// Sales window bounds as unix-millisecond timestamps. Missing bounds widen to the epoch extremes.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerSalesQuery {
    pub since: Option<i64>,
    pub until: Option<i64>,
}

//----------------------------------------------   Initialize    -----------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct PostInitializeRequest {
    #[serde(default)]
    pub payment_server: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostInitializeResponse {
    pub language: &'static str,
}
