//! Coalesces high-frequency chair position reports so that each report does not incur a synchronous write.
//!
//! Reports merge into an in-memory map keyed by chair id; a timer-driven flush task periodically swaps the map out
//! and persists the accumulated updates in a single batch. Only the latest coordinate and the accumulated Manhattan
//! distance delta survive a window; ordering matters per chair, never across chairs.
use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use rds_common::Coordinate;

use crate::db_types::ChairId;

/// The pending state for one chair between flushes.
#[derive(Debug, Clone, Copy)]
struct PendingPosition {
    coordinate: Coordinate,
    distance_delta: i64,
}

/// One row of a batched flush: the chair's latest coordinate and the distance accumulated since the last flush.
#[derive(Debug, Clone)]
pub struct PositionUpdate {
    pub chair_id: ChairId,
    pub coordinate: Coordinate,
    pub distance_delta: i64,
}

/// A clonable handle to the shared batch map. The map lock covers both the per-report merge and the flush swap;
/// the flush itself happens after the lock is released so ingestion never waits on storage.
#[derive(Clone, Default)]
pub struct CoordinateBatcher {
    pending: Arc<Mutex<HashMap<ChairId, PendingPosition>>>,
}

impl CoordinateBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a position report into the batch.
    ///
    /// The distance delta is computed against the previous known coordinate: the pending entry if the chair was
    /// already touched in this window, otherwise `persisted` (the last flushed coordinate, or `None` for a chair
    /// that has never reported). Returns the delta that was added.
    pub fn merge(&self, chair_id: &ChairId, coordinate: Coordinate, persisted: Option<Coordinate>) -> i64 {
        let mut pending = self.pending.lock();
        match pending.get_mut(chair_id) {
            Some(entry) => {
                let delta = entry.coordinate.manhattan_distance(&coordinate);
                entry.coordinate = coordinate;
                entry.distance_delta += delta;
                delta
            },
            None => {
                let delta = persisted.map(|prev| prev.manhattan_distance(&coordinate)).unwrap_or(0);
                pending.insert(chair_id.clone(), PendingPosition { coordinate, distance_delta: delta });
                delta
            },
        }
    }

    /// The coordinate the batch currently holds for a chair, if any.
    pub fn pending_coordinate(&self, chair_id: &ChairId) -> Option<Coordinate> {
        self.pending.lock().get(chair_id).map(|p| p.coordinate)
    }

    /// Swaps the batch out under the lock and returns its contents. The caller persists the updates; the map is
    /// immediately empty for new reports.
    pub fn drain(&self) -> Vec<PositionUpdate> {
        let drained = {
            let mut pending = self.pending.lock();
            std::mem::take(&mut *pending)
        };
        drained
            .into_iter()
            .map(|(chair_id, p)| PositionUpdate { chair_id, coordinate: p.coordinate, distance_delta: p.distance_delta })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
