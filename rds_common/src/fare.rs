use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Sub},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::{op, Coordinate};

/// The flag-fall charged on every ride, independent of distance.
pub const INITIAL_FARE: Fare = Fare(500);
/// The metered rate per unit of Manhattan distance.
pub const FARE_PER_DISTANCE: i64 = 100;

//--------------------------------------        Fare        ----------------------------------------------------------
/// A monetary amount in the smallest currency unit.
///
/// Fares, discounts and sales totals are all `Fare` values. The type is deliberately thin: construction from raw
/// integers is ubiquitous at the storage boundary.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Fare(i64);

op!(binary Fare, Add, add);
op!(binary Fare, Sub, sub);

impl Mul<i64> for Fare {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Fare {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a fare: {0}")]
pub struct FareConversionError(String);

impl From<i64> for Fare {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Fare {
    type Error = FareConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(FareConversionError(format!("Value {} is too large to convert to a fare", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl PartialEq for Fare {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Fare {}

impl Display for Fare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Fare {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }
}

/// The metered portion of a fare: rate times Manhattan distance, before any discount.
pub fn metered_fare(pickup: &Coordinate, destination: &Coordinate) -> Fare {
    Fare(FARE_PER_DISTANCE * pickup.manhattan_distance(destination))
}

/// The undiscounted fare for a trip between the two coordinates.
pub fn calculate_fare(pickup: &Coordinate, destination: &Coordinate) -> Fare {
    INITIAL_FARE + metered_fare(pickup, destination)
}

/// The fare for a trip after applying a discount. The discount only ever reduces the metered portion; the initial
/// fare is always charged in full.
pub fn discounted_fare(pickup: &Coordinate, destination: &Coordinate, discount: Fare) -> Fare {
    let metered = metered_fare(pickup, destination);
    INITIAL_FARE + (metered - discount).max(Fare::from(0))
}
