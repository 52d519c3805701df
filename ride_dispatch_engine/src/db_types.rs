use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use rds_common::{helpers::random_id, Coordinate, Fare};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

/// The code of the coupon granted to every new account by the first-use campaign.
pub const CAMPAIGN_COUPON_CODE: &str = "CP_NEW2024";
/// The discount carried by the first-use campaign coupon.
pub const CAMPAIGN_COUPON_DISCOUNT: i64 = 3000;
/// The discount granted to a new user who registers with a valid invitation code.
pub const INVITE_COUPON_DISCOUNT: i64 = 1500;
/// The discount granted to the inviter each time their invitation code is redeemed.
pub const REWARD_COUPON_DISCOUNT: i64 = 1000;
/// The maximum number of redemptions of a single invitation code.
pub const INVITATION_REDEMPTION_CAP: i64 = 3;
/// The settings key under which the payment gateway base URL is stored.
pub const PAYMENT_GATEWAY_URL_SETTING: &str = "payment_gateway_url";

//--------------------------------------       Identifiers       -----------------------------------------------------
/// Identifier newtypes. All ids are opaque random strings generated at registration/creation time; the wrappers
/// exist so that a ride id cannot be passed where a chair id is expected.

#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OwnerId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ChairId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct RideId(pub String);

macro_rules! id_impls {
    ($($t:ty),+) => {
        $(
            impl $t {
                pub fn random() -> Self {
                    Self(random_id(26))
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl Display for $t {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<String> for $t {
                fn from(s: String) -> Self {
                    Self(s)
                }
            }

            impl From<&str> for $t {
                fn from(s: &str) -> Self {
                    Self(s.to_string())
                }
            }
        )+
    };
}

id_impls!(UserId, OwnerId, ChairId, RideId);

//--------------------------------------     RideStatusType      -----------------------------------------------------
/// The lifecycle states of a ride, in causal order. The serialized strings are part of the wire protocol and must
/// not change. `Canceled` is carried for forward compatibility; no flow currently emits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RideStatusType {
    Matching,
    Enroute,
    Pickup,
    Carrying,
    Arrived,
    Completed,
    Canceled,
}

impl RideStatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatusType::Matching => "MATCHING",
            RideStatusType::Enroute => "ENROUTE",
            RideStatusType::Pickup => "PICKUP",
            RideStatusType::Carrying => "CARRYING",
            RideStatusType::Arrived => "ARRIVED",
            RideStatusType::Completed => "COMPLETED",
            RideStatusType::Canceled => "CANCELED",
        }
    }

    /// A terminal status frees the assigned chair and ends the ride's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RideStatusType::Completed | RideStatusType::Canceled)
    }
}

impl Display for RideStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid ride status: {0}")]
pub struct ConversionError(String);

impl FromStr for RideStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MATCHING" => Ok(Self::Matching),
            "ENROUTE" => Ok(Self::Enroute),
            "PICKUP" => Ok(Self::Pickup),
            "CARRYING" => Ok(Self::Carrying),
            "ARRIVED" => Ok(Self::Arrived),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELED" => Ok(Self::Canceled),
            s => Err(ConversionError(format!("Invalid ride status: {s}"))),
        }
    }
}

//--------------------------------------  NotificationChannel    -----------------------------------------------------
/// The two long-polling client roles. Each ride status row carries an independent delivered-timestamp per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationChannel {
    App,
    Chair,
}

impl NotificationChannel {
    /// The `ride_statuses` column holding the delivered timestamp for this channel.
    pub(crate) fn sent_at_column(&self) -> &'static str {
        match self {
            NotificationChannel::App => "app_sent_at",
            NotificationChannel::Chair => "chair_sent_at",
        }
    }
}

//--------------------------------------         User            -----------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub date_of_birth: String,
    pub access_token: String,
    pub invitation_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

/// A fully-formed user row ready for insertion. Ids and tokens are generated by the caller so that the database
/// layer stays deterministic.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub date_of_birth: String,
    pub access_token: String,
    pub invitation_code: String,
}

//--------------------------------------         Owner           -----------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Owner {
    pub id: OwnerId,
    pub name: String,
    pub access_token: String,
    pub chair_register_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOwner {
    pub id: OwnerId,
    pub name: String,
    pub access_token: String,
    pub chair_register_token: String,
}

//--------------------------------------         Chair           -----------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Chair {
    pub id: ChairId,
    pub owner_id: OwnerId,
    pub name: String,
    pub model: String,
    pub is_active: bool,
    pub access_token: String,
    pub latitude: Option<i64>,
    pub longitude: Option<i64>,
    pub total_distance: i64,
    pub total_distance_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chair {
    /// The last persisted coordinate. `None` until the chair has reported a position that has been flushed.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewChair {
    pub id: ChairId,
    pub owner_id: OwnerId,
    pub name: String,
    pub model: String,
    pub access_token: String,
}

//--------------------------------------         Ride            -----------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Ride {
    pub id: RideId,
    pub user_id: UserId,
    pub chair_id: Option<ChairId>,
    pub pickup_latitude: i64,
    pub pickup_longitude: i64,
    pub destination_latitude: i64,
    pub destination_longitude: i64,
    pub evaluation: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ride {
    pub fn pickup_coordinate(&self) -> Coordinate {
        Coordinate::new(self.pickup_latitude, self.pickup_longitude)
    }

    pub fn destination_coordinate(&self) -> Coordinate {
        Coordinate::new(self.destination_latitude, self.destination_longitude)
    }
}

#[derive(Debug, Clone)]
pub struct NewRide {
    pub id: RideId,
    pub user_id: UserId,
    pub pickup: Coordinate,
    pub destination: Coordinate,
}

impl NewRide {
    pub fn new(user_id: UserId, pickup: Coordinate, destination: Coordinate) -> Self {
        Self { id: RideId::random(), user_id, pickup, destination }
    }
}

//--------------------------------------       RideStatus        -----------------------------------------------------
/// One immutable lifecycle event for a ride. Only the two delivered timestamps ever change after insertion, and
/// each transitions from null to set exactly once.
#[derive(Debug, Clone, FromRow)]
pub struct RideStatus {
    pub id: i64,
    pub ride_id: RideId,
    pub status: RideStatusType,
    pub created_at: DateTime<Utc>,
    pub app_sent_at: Option<DateTime<Utc>>,
    pub chair_sent_at: Option<DateTime<Utc>>,
}

//--------------------------------------         Coupon          -----------------------------------------------------
/// A one-time discount grant. Available while `used_by` is null; consumed by setting `used_by` to a ride id, at
/// most once.
#[derive(Debug, Clone, FromRow)]
pub struct Coupon {
    pub user_id: UserId,
    pub code: String,
    pub discount: Fare,
    pub created_at: DateTime<Utc>,
    pub used_by: Option<RideId>,
}

//--------------------------------------      PaymentToken       -----------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct PaymentToken {
    pub user_id: UserId,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       SaleRecord        -----------------------------------------------------
/// One completed ride joined with the chair that served it, as used by the owner sales report.
#[derive(Debug, Clone, FromRow)]
pub struct SaleRecord {
    pub chair_id: ChairId,
    pub chair_name: String,
    pub model: String,
    pub pickup_latitude: i64,
    pub pickup_longitude: i64,
    pub destination_latitude: i64,
    pub destination_longitude: i64,
}

impl SaleRecord {
    /// The sale amount for the ride: the full undiscounted fare. Discounts are a marketing cost carried by the
    /// platform, not the owner.
    pub fn sale(&self) -> Fare {
        rds_common::fare::calculate_fare(
            &Coordinate::new(self.pickup_latitude, self.pickup_longitude),
            &Coordinate::new(self.destination_latitude, self.destination_longitude),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        for s in [
            RideStatusType::Matching,
            RideStatusType::Enroute,
            RideStatusType::Pickup,
            RideStatusType::Carrying,
            RideStatusType::Arrived,
            RideStatusType::Completed,
            RideStatusType::Canceled,
        ] {
            assert_eq!(s.as_str().parse::<RideStatusType>().unwrap(), s);
        }
    }

    #[test]
    fn wire_strings_are_load_bearing() {
        assert_eq!(RideStatusType::Matching.as_str(), "MATCHING");
        assert_eq!(RideStatusType::Enroute.as_str(), "ENROUTE");
        assert_eq!(RideStatusType::Pickup.as_str(), "PICKUP");
        assert_eq!(RideStatusType::Carrying.as_str(), "CARRYING");
        assert_eq!(RideStatusType::Arrived.as_str(), "ARRIVED");
        assert_eq!(RideStatusType::Completed.as_str(), "COMPLETED");
    }

    #[test]
    fn only_completed_and_canceled_are_terminal() {
        assert!(RideStatusType::Completed.is_terminal());
        assert!(RideStatusType::Canceled.is_terminal());
        assert!(!RideStatusType::Arrived.is_terminal());
        assert!(!RideStatusType::Matching.is_terminal());
    }

    #[test]
    fn status_serializes_to_wire_string() {
        let json = serde_json::to_string(&RideStatusType::Enroute).unwrap();
        assert_eq!(json, r#""ENROUTE""#);
    }
}
