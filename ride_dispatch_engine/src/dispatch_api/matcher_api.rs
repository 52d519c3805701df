use std::sync::Arc;

use log::{debug, trace};
use rds_common::Coordinate;
use tokio::sync::Mutex;

use crate::{
    db_types::Chair,
    dispatch_api::dispatch_objects::MatchOutcome,
    traits::{DispatchApiError, DispatchDatabase},
};

/// `MatcherApi` runs the greedy nearest-chair matching pass.
///
/// Pending rides are served oldest first (the earliest-waiting rider wins); each ride takes the available chair
/// with the smallest Manhattan distance to its pickup, and a chair claimed for ride N is never reconsidered for
/// ride N+1 in the same pass. Passes are single-flight: a pass that finds another one running does nothing, since
/// two concurrent passes could select the same chair for different rides.
#[derive(Clone)]
pub struct MatcherApi<B> {
    db: B,
    gate: Arc<Mutex<()>>,
}

impl<B> MatcherApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, gate: Arc::new(Mutex::new(())) }
    }
}

impl<B> MatcherApi<B>
where B: DispatchDatabase
{
    /// One matching pass over the current snapshot of pending rides and available chairs.
    pub async fn run_pass(&self) -> Result<MatchOutcome, DispatchApiError> {
        let Ok(_guard) = self.gate.try_lock() else {
            trace!("🪑️ A matching pass is already running, skipping");
            return Ok(MatchOutcome::Skipped);
        };
        let (rides, mut pool) = self.db.matching_snapshot().await?;
        if rides.is_empty() {
            return Ok(MatchOutcome::Completed { assigned: 0, unassigned: 0 });
        }
        let total = rides.len();
        let mut assigned = 0;
        for ride in &rides {
            let pickup = ride.pickup_coordinate();
            let Some(index) = select_nearest(&pool, &pickup) else {
                // No available chair remains; stop the pass rather than scanning rides that cannot be served.
                // Matching resumes on the next invocation.
                break;
            };
            if self.db.assign_chair_to_ride(&ride.id, &pool[index].id).await? {
                let chair = pool.remove(index);
                debug!("🪑️ Ride [{}] matched with chair [{}]", ride.id, chair.id);
                assigned += 1;
            }
            // If the conditional assignment lost, the ride was claimed concurrently; the chair stays in the
            // pool for the next ride.
        }
        debug!("🪑️ Matching pass complete: {assigned}/{total} rides assigned");
        Ok(MatchOutcome::Completed { assigned, unassigned: total - assigned })
    }
}

fn chair_distance(chair: &Chair, pickup: &Coordinate) -> i64 {
    chair.coordinate().map(|pos| pos.manhattan_distance(pickup)).unwrap_or(i64::MAX)
}

/// The index of the chair nearest to the pickup. Ties break on chair id so a pass is deterministic for a given
/// snapshot.
fn select_nearest(pool: &[Chair], pickup: &Coordinate) -> Option<usize> {
    pool.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            chair_distance(a, pickup)
                .cmp(&chair_distance(b, pickup))
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        })
        .map(|(index, _)| index)
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;
    use crate::db_types::{ChairId, OwnerId};

    fn chair(id: &str, lat: i64, lon: i64) -> Chair {
        Chair {
            id: ChairId::from(id),
            owner_id: OwnerId::from("owner"),
            name: id.to_string(),
            model: "test".to_string(),
            is_active: true,
            access_token: String::new(),
            latitude: Some(lat),
            longitude: Some(lon),
            total_distance: 0,
            total_distance_updated_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn selects_the_nearest_chair() {
        let pool = vec![chair("far", 0, 7), chair("near", 0, 3)];
        let index = select_nearest(&pool, &Coordinate::new(0, 0)).unwrap();
        assert_eq!(pool[index].id.as_str(), "near");
    }

    #[test]
    fn selection_is_deterministic_per_snapshot() {
        let pool = vec![chair("c", 2, 2), chair("a", 1, 3), chair("b", 0, 4)];
        let pickup = Coordinate::new(0, 0);
        // All three chairs are at distance 4; the tie breaks on chair id, every time.
        let first = select_nearest(&pool, &pickup).unwrap();
        let second = select_nearest(&pool, &pickup).unwrap();
        assert_eq!(first, second);
        assert_eq!(pool[first].id.as_str(), "a");
    }

    #[test]
    fn empty_pool_selects_nothing() {
        assert_eq!(select_nearest(&[], &Coordinate::new(0, 0)), None);
    }

    #[test]
    fn greedy_pass_removes_claimed_chairs_from_the_pool() {
        // Ride A's pickup sees chairs at distances 3 and 7; ride B's pickup sees the same chairs at distances
        // 1 and 9. Serving A first must leave B choosing among the remaining chairs only.
        let mut pool = vec![chair("x", 0, 3), chair("y", 0, -7)];
        let a = Coordinate::new(0, 0);
        let b = Coordinate::new(0, 2);
        let first = select_nearest(&pool, &a).unwrap();
        assert_eq!(pool[first].id.as_str(), "x");
        pool.remove(first);
        let second = select_nearest(&pool, &b).unwrap();
        assert_eq!(pool[second].id.as_str(), "y");
    }
}
