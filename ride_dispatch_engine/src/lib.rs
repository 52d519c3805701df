//! Ride Dispatch Engine
//!
//! The dispatch engine is the storage-backed core of the ride dispatch service: it matches ride requests with
//! mobile chairs, tracks each ride through its delivery lifecycle, computes fares net of coupon discounts, and
//! feeds the two long-polling notification channels. The library is divided into two main sections:
//!
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly; use the public API instead. The exception is the data types used in the
//!    database, which are defined in the [`db_types`] module and are public.
//! 2. The engine public API ([`mod@dispatch_api`]). This provides the public-facing functionality: accounts, the
//!    ride flow, notifications, matching and owner reporting. Backends need to implement the traits in
//!    [`mod@traits`] in order to act as a backend for the dispatch server.
//!
//! Two in-memory components sit next to the database: the [`StatusCache`] accelerating current-status lookups,
//! and the [`CoordinateBatcher`] coalescing high-frequency position reports into periodic batched writes.
pub mod coordinate_batcher;
pub mod db_types;
pub mod dispatch_api;
pub mod status_cache;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use coordinate_batcher::{CoordinateBatcher, PositionUpdate};
pub use dispatch_api::{
    accounts_api::AccountApi,
    dispatch_objects,
    matcher_api::MatcherApi,
    notification_api::NotificationApi,
    owner_api::OwnerApi,
    retry::RetryAfterPolicy,
    ride_flow_api::RideFlowApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use status_cache::StatusCache;
pub use traits::{
    AccountApiError,
    AccountManagement,
    DispatchApiError,
    DispatchDatabase,
    PaymentGateway,
    PaymentGatewayError,
};
