//! The notification protocol: per-channel unsent queues, in-order at-least-once delivery, and the
//! current-status fallback when the queue is empty.
mod support;

use rds_common::Coordinate;
use ride_dispatch_engine::{db_types::RideStatusType, MatcherApi, NotificationApi};
use support::{new_test_db, place_chair, register_chair, register_user, ride_flow};

#[tokio::test]
async fn app_poll_drains_the_unsent_queue_in_order() {
    let db = new_test_db().await;
    let flow = ride_flow(&db);
    let matcher = MatcherApi::new(db.clone());
    let notifications = NotificationApi::new(db.clone());

    let user = register_user(&db, "rider").await;

    // No ride yet: nothing to report.
    assert!(notifications.app_notification(&user).await.unwrap().is_none());

    let (_owner, chair) = register_chair(&db, "chair").await;
    place_chair(&db, &flow, &chair, Coordinate::new(1, 1)).await;
    let (ride, fare) = flow.create_ride(&user, Coordinate::new(0, 0), Coordinate::new(0, 4)).await.unwrap();

    let first = notifications.app_notification(&user).await.unwrap().unwrap();
    assert_eq!(first.ride_id, ride.id);
    assert_eq!(first.status, RideStatusType::Matching);
    assert_eq!(first.fare, fare);
    assert!(first.chair.is_none());

    // Queue is drained; the poll falls back to the current status. Not a contract violation.
    let second = notifications.app_notification(&user).await.unwrap().unwrap();
    assert_eq!(second.status, RideStatusType::Matching);

    matcher.run_pass().await.unwrap();
    flow.acknowledge_ride(&chair, &ride.id).await.unwrap();
    flow.update_coordinate(&chair, Coordinate::new(0, 0)).await.unwrap();

    // ENROUTE and PICKUP were both queued; polls deliver them oldest-first, one per poll.
    let third = notifications.app_notification(&user).await.unwrap().unwrap();
    assert_eq!(third.status, RideStatusType::Enroute);
    let chair_info = third.chair.expect("chair is assigned by now");
    assert_eq!(chair_info.id, chair.id);
    assert_eq!(chair_info.stats.total_rides_count, 0);

    let fourth = notifications.app_notification(&user).await.unwrap().unwrap();
    assert_eq!(fourth.status, RideStatusType::Pickup);
}

#[tokio::test]
async fn channels_are_independent() {
    let db = new_test_db().await;
    let flow = ride_flow(&db);
    let matcher = MatcherApi::new(db.clone());
    let notifications = NotificationApi::new(db.clone());

    let user = register_user(&db, "rider").await;
    let (_owner, chair) = register_chair(&db, "chair").await;
    place_chair(&db, &flow, &chair, Coordinate::new(1, 1)).await;

    // The chair has no ride yet.
    assert!(notifications.chair_notification(&chair).await.unwrap().is_none());

    let (ride, _) = flow.create_ride(&user, Coordinate::new(0, 0), Coordinate::new(0, 4)).await.unwrap();
    matcher.run_pass().await.unwrap();

    // Draining the app channel must not consume the chair channel's queue.
    notifications.app_notification(&user).await.unwrap().unwrap();
    let chair_first = notifications.chair_notification(&chair).await.unwrap().unwrap();
    assert_eq!(chair_first.ride_id, ride.id);
    assert_eq!(chair_first.status, RideStatusType::Matching);
    assert_eq!(chair_first.user.name, "Ada Lovelace");

    flow.acknowledge_ride(&chair, &ride.id).await.unwrap();
    let chair_second = notifications.chair_notification(&chair).await.unwrap().unwrap();
    assert_eq!(chair_second.status, RideStatusType::Enroute);
}

#[tokio::test]
async fn every_transition_is_delivered_at_least_once() {
    let db = new_test_db().await;
    let flow = ride_flow(&db);
    let matcher = MatcherApi::new(db.clone());
    let notifications = NotificationApi::new(db.clone());

    let user = register_user(&db, "rider").await;
    let (_owner, chair) = register_chair(&db, "chair").await;
    place_chair(&db, &flow, &chair, Coordinate::new(1, 1)).await;
    let (ride, _) = flow.create_ride(&user, Coordinate::new(0, 0), Coordinate::new(0, 4)).await.unwrap();
    matcher.run_pass().await.unwrap();
    flow.acknowledge_ride(&chair, &ride.id).await.unwrap();
    flow.update_coordinate(&chair, Coordinate::new(0, 0)).await.unwrap();
    flow.start_carrying(&chair, &ride.id).await.unwrap();
    flow.update_coordinate(&chair, Coordinate::new(0, 4)).await.unwrap();

    // Five transitions queued; five polls observe them all without skipping, in causal order.
    let mut observed = Vec::new();
    for _ in 0..5 {
        observed.push(notifications.app_notification(&user).await.unwrap().unwrap().status);
    }
    assert_eq!(
        observed,
        vec![
            RideStatusType::Matching,
            RideStatusType::Enroute,
            RideStatusType::Pickup,
            RideStatusType::Carrying,
            RideStatusType::Arrived,
        ]
    );
}
