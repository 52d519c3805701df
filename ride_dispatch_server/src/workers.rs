//! Timer-driven background tasks: the coordinate batch flush and the matching cadence.
use std::time::Duration;

use log::*;
use ride_dispatch_engine::{CoordinateBatcher, MatcherApi, RideFlowApi, SqliteDatabase};
use tokio::task::JoinHandle;

/// Starts the coordinate flush worker. Do not await the returned JoinHandle, as it runs indefinitely.
pub fn start_flush_worker(db: SqliteDatabase, batcher: CoordinateBatcher, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let api = RideFlowApi::new(db, batcher);
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Coordinate flush worker started ({} ms)", interval.as_millis());
        loop {
            timer.tick().await;
            match api.flush_positions().await {
                Ok(0) => {},
                Ok(count) => debug!("🕰️ Flushed positions for {count} chairs"),
                // The drained batch is dropped on failure; the next reports rebuild it from the persisted state.
                Err(e) => error!("🕰️ Error flushing chair positions: {e}"),
            }
        }
    })
}

/// Starts the matching cadence worker. Passes are single-flight, so a slow pass simply causes the next ticks to
/// be skipped.
pub fn start_matcher_worker(matcher: MatcherApi<SqliteDatabase>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Matching worker started ({} ms)", interval.as_millis());
        loop {
            timer.tick().await;
            if let Err(e) = matcher.run_pass().await {
                error!("🕰️ Error running matching pass: {e}");
            }
        }
    })
}
