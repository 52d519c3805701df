//! The public API of the dispatch engine.
//!
//! Each API struct wraps a backend implementing the traits in [`crate::traits`] and exposes one slice of the
//! engine's behaviour: accounts, the ride flow, notifications, matching and owner reporting. Specific backends
//! (currently SQLite) plug in underneath without the callers changing.
pub mod accounts_api;
pub mod dispatch_objects;
pub mod matcher_api;
pub mod notification_api;
pub mod owner_api;
pub mod retry;
pub mod ride_flow_api;
