//! Result objects returned by the engine APIs.
//!
//! These serialize directly onto the wire; the field names and the status enumeration strings are part of the
//! client protocol and must not change.
use rds_common::{Coordinate, Fare};
use serde::Serialize;

use crate::db_types::{ChairId, RideId, RideStatusType, UserId};

//--------------------------------------   App notifications    ------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct AppNotification {
    pub ride_id: RideId,
    pub pickup_coordinate: Coordinate,
    pub destination_coordinate: Coordinate,
    pub fare: Fare,
    pub status: RideStatusType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chair: Option<NotificationChair>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationChair {
    pub id: ChairId,
    pub name: String,
    pub model: String,
    pub stats: ChairStats,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChairStats {
    pub total_rides_count: i64,
    pub total_evaluation_avg: f64,
}

//--------------------------------------  Chair notifications   ------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct ChairNotification {
    pub ride_id: RideId,
    pub user: SimpleUser,
    pub pickup_coordinate: Coordinate,
    pub destination_coordinate: Coordinate,
    pub status: RideStatusType,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimpleUser {
    pub id: UserId,
    pub name: String,
}

//--------------------------------------     Ride history       ------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct CompletedRideSummary {
    pub id: RideId,
    pub pickup_coordinate: Coordinate,
    pub destination_coordinate: Coordinate,
    pub chair: RideSummaryChair,
    pub fare: Fare,
    pub evaluation: i64,
    pub requested_at: i64,
    pub completed_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RideSummaryChair {
    pub id: ChairId,
    pub owner: String,
    pub name: String,
    pub model: String,
}

//--------------------------------------     Nearby chairs      ------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct NearbyChair {
    pub id: ChairId,
    pub name: String,
    pub model: String,
    pub current_coordinate: Coordinate,
}

//--------------------------------------     Owner reports      ------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
pub struct SalesReport {
    pub total_sales: Fare,
    pub chairs: Vec<ChairSales>,
    pub models: Vec<ModelSales>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChairSales {
    pub id: ChairId,
    pub name: String,
    pub sales: Fare,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelSales {
    pub model: String,
    pub sales: Fare,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerChairSummary {
    pub id: ChairId,
    pub name: String,
    pub model: String,
    pub active: bool,
    pub registered_at: i64,
    pub total_distance: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_distance_updated_at: Option<i64>,
}

//--------------------------------------       Matching         ------------------------------------------------------
/// The result of one matching pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Another pass was already running; nothing was done.
    Skipped,
    /// The pass ran to completion (or ran out of chairs).
    Completed { assigned: usize, unassigned: usize },
}
