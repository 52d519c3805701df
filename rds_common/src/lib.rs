mod coordinate;

pub mod fare;
pub mod helpers;
pub mod op;

pub use coordinate::Coordinate;
pub use fare::{Fare, FARE_PER_DISTANCE, INITIAL_FARE};
