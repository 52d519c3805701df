//! End-to-end exercises of the ride lifecycle against a real SQLite backend: creation with coupon consumption,
//! matching, chair acknowledgement, position-triggered transitions, and completion with the payment charge.
mod support;

use rds_common::{Coordinate, Fare};
use ride_dispatch_engine::{
    db_types::RideStatusType,
    sqlite::db::ride_statuses,
    AccountApi,
    AccountManagement,
    DispatchApiError,
    DispatchDatabase,
    MatcherApi,
    PaymentGatewayError,
};
use support::{new_test_db, place_chair, register_chair, register_user, ride_flow, RecordingGateway, RejectingGateway};

#[tokio::test]
async fn full_ride_lifecycle() {
    let db = new_test_db().await;
    let accounts = AccountApi::new(db.clone());
    let flow = ride_flow(&db);
    let matcher = MatcherApi::new(db.clone());

    let user = register_user(&db, "rider1").await;
    accounts.register_payment_token(&user, "tok-12345").await.unwrap();
    accounts.set_payment_gateway_url("http://gateway.test").await.unwrap();

    let (_owner, chair) = register_chair(&db, "chair1").await;
    place_chair(&db, &flow, &chair, Coordinate::new(10, 10)).await;

    // The registration campaign coupon (3000) swallows the whole metered fare of 1000.
    let (ride, fare) = flow.create_ride(&user, Coordinate::new(0, 0), Coordinate::new(0, 10)).await.unwrap();
    assert_eq!(fare, Fare::from(500));
    assert_eq!(db.current_ride_status(&ride.id).await.unwrap(), RideStatusType::Matching);

    // A second ride while this one is open is rejected.
    let err = flow.create_ride(&user, Coordinate::new(1, 1), Coordinate::new(2, 2)).await.unwrap_err();
    assert!(matches!(err, DispatchApiError::RideInProgress));

    // With the campaign coupon consumed, a new estimate sees no discount.
    let (estimate, discount) = flow.estimate_fare(&user, Coordinate::new(0, 0), Coordinate::new(0, 10)).await.unwrap();
    assert_eq!(estimate, Fare::from(1500));
    assert_eq!(discount, Fare::from(0));

    matcher.run_pass().await.unwrap();
    let ride = db.fetch_ride(&ride.id).await.unwrap().unwrap();
    assert_eq!(ride.chair_id.as_ref(), Some(&chair.id));

    // Only the assigned chair may acknowledge.
    let (_other_owner, other_chair) = register_chair(&db, "impostor").await;
    let err = flow.acknowledge_ride(&other_chair, &ride.id).await.unwrap_err();
    assert!(matches!(err, DispatchApiError::AssignmentMismatch(_, _)));

    flow.acknowledge_ride(&chair, &ride.id).await.unwrap();
    assert_eq!(db.current_ride_status(&ride.id).await.unwrap(), RideStatusType::Enroute);

    // CARRYING is only accepted from PICKUP.
    let err = flow.start_carrying(&chair, &ride.id).await.unwrap_err();
    assert!(matches!(err, DispatchApiError::InvalidTransition(_)));

    // Reporting the pickup coordinate while ENROUTE auto-appends PICKUP.
    let (_, transition) = flow.update_coordinate(&chair, Coordinate::new(0, 0)).await.unwrap();
    assert_eq!(transition.unwrap().status, RideStatusType::Pickup);

    flow.start_carrying(&chair, &ride.id).await.unwrap();

    // Evaluation is refused until the chair arrives.
    let gateway = RecordingGateway::default();
    let err = flow.evaluate_ride(&user, &ride.id, 5, &gateway).await.unwrap_err();
    assert!(matches!(err, DispatchApiError::InvalidTransition(_)));

    // Reporting the destination while CARRYING auto-appends ARRIVED, exactly once.
    let (_, transition) = flow.update_coordinate(&chair, Coordinate::new(0, 10)).await.unwrap();
    assert_eq!(transition.unwrap().status, RideStatusType::Arrived);
    let (_, transition) = flow.update_coordinate(&chair, Coordinate::new(0, 10)).await.unwrap();
    assert!(transition.is_none());

    flow.evaluate_ride(&user, &ride.id, 5, &gateway).await.unwrap();
    assert_eq!(db.current_ride_status(&ride.id).await.unwrap(), RideStatusType::Completed);

    // The gateway was charged exactly once, with the discounted fare.
    let charges = gateway.charges.lock().unwrap();
    assert_eq!(charges.len(), 1);
    assert_eq!(charges[0], ("http://gateway.test".to_string(), "tok-12345".to_string(), Fare::from(500)));
}

#[tokio::test]
async fn status_log_is_append_only_and_ordered() {
    let db = new_test_db().await;
    let accounts = AccountApi::new(db.clone());
    let flow = ride_flow(&db);
    let matcher = MatcherApi::new(db.clone());

    let user = register_user(&db, "rider1").await;
    accounts.register_payment_token(&user, "tok").await.unwrap();
    accounts.set_payment_gateway_url("http://gateway.test").await.unwrap();
    let (_owner, chair) = register_chair(&db, "chair1").await;
    place_chair(&db, &flow, &chair, Coordinate::new(3, 3)).await;

    let (ride, _) = flow.create_ride(&user, Coordinate::new(0, 0), Coordinate::new(5, 5)).await.unwrap();
    matcher.run_pass().await.unwrap();
    flow.acknowledge_ride(&chair, &ride.id).await.unwrap();
    flow.update_coordinate(&chair, Coordinate::new(0, 0)).await.unwrap();
    flow.start_carrying(&chair, &ride.id).await.unwrap();
    flow.update_coordinate(&chair, Coordinate::new(5, 5)).await.unwrap();
    flow.evaluate_ride(&user, &ride.id, 4, &RecordingGateway::default()).await.unwrap();

    let mut conn = db.pool().acquire().await.unwrap();
    let log = ride_statuses::fetch_statuses_for_ride(&ride.id, &mut conn).await.unwrap();
    let observed: Vec<_> = log.iter().map(|s| s.status).collect();
    assert_eq!(
        observed,
        vec![
            RideStatusType::Matching,
            RideStatusType::Enroute,
            RideStatusType::Pickup,
            RideStatusType::Carrying,
            RideStatusType::Arrived,
            RideStatusType::Completed,
        ]
    );
    // Creation order is strict; timestamps never go backwards.
    for pair in log.windows(2) {
        assert!(pair[1].id > pair[0].id);
        assert!(pair[1].created_at >= pair[0].created_at);
    }
}

#[tokio::test]
async fn evaluation_must_be_in_range() {
    let db = new_test_db().await;
    let flow = ride_flow(&db);
    let user = register_user(&db, "rider1").await;
    let (ride, _) = flow.create_ride(&user, Coordinate::new(0, 0), Coordinate::new(1, 1)).await.unwrap();
    let err = flow.evaluate_ride(&user, &ride.id, 0, &RecordingGateway::default()).await.unwrap_err();
    assert!(matches!(err, DispatchApiError::EvaluationOutOfRange));
    let err = flow.evaluate_ride(&user, &ride.id, 6, &RecordingGateway::default()).await.unwrap_err();
    assert!(matches!(err, DispatchApiError::EvaluationOutOfRange));
}

#[tokio::test]
async fn gateway_rejection_surfaces_distinctly() {
    let db = new_test_db().await;
    let accounts = AccountApi::new(db.clone());
    let flow = ride_flow(&db);
    let matcher = MatcherApi::new(db.clone());

    let user = register_user(&db, "rider1").await;
    accounts.register_payment_token(&user, "tok").await.unwrap();
    accounts.set_payment_gateway_url("http://gateway.test").await.unwrap();
    let (_owner, chair) = register_chair(&db, "chair1").await;
    place_chair(&db, &flow, &chair, Coordinate::new(0, 0)).await;

    let (ride, _) = flow.create_ride(&user, Coordinate::new(0, 0), Coordinate::new(0, 3)).await.unwrap();
    matcher.run_pass().await.unwrap();
    flow.acknowledge_ride(&chair, &ride.id).await.unwrap();
    flow.update_coordinate(&chair, Coordinate::new(0, 0)).await.unwrap();
    flow.start_carrying(&chair, &ride.id).await.unwrap();
    flow.update_coordinate(&chair, Coordinate::new(0, 3)).await.unwrap();

    let err = flow.evaluate_ride(&user, &ride.id, 3, &RejectingGateway).await.unwrap_err();
    assert!(matches!(err, DispatchApiError::Gateway(PaymentGatewayError::ChargeRejected(_))));
}

#[tokio::test]
async fn fare_calculation_is_idempotent_for_a_completed_ride() {
    let db = new_test_db().await;
    let flow = ride_flow(&db);

    let user = register_user(&db, "rider1").await;
    let (ride, fare) = flow.create_ride(&user, Coordinate::new(0, 0), Coordinate::new(0, 10)).await.unwrap();
    assert_eq!(fare, Fare::from(500));

    // Unrelated coupon state changes must not affect the ride's billed fare.
    let mut conn = db.pool().acquire().await.unwrap();
    ride_dispatch_engine::sqlite::db::coupons::grant_coupon(&user.id, "PROMO_LATER", 9999, &mut conn).await.unwrap();
    drop(conn);

    let ride = db.fetch_ride(&ride.id).await.unwrap().unwrap();
    assert_eq!(flow.fare_for_ride(&ride).await.unwrap(), Fare::from(500));
    assert_eq!(flow.fare_for_ride(&ride).await.unwrap(), Fare::from(500));
    // But a fresh estimate (quote mode) happily previews the new coupon.
    let (estimate, _) = flow.estimate_fare(&user, Coordinate::new(0, 0), Coordinate::new(0, 10)).await.unwrap();
    assert_eq!(estimate, Fare::from(500));
}

#[tokio::test]
async fn position_batches_accumulate_distance() {
    let db = new_test_db().await;
    let flow = ride_flow(&db);
    let (_owner, chair) = register_chair(&db, "chair1").await;
    place_chair(&db, &flow, &chair, Coordinate::new(0, 0)).await;

    // Three reports in one window: only the net coordinate and the summed deltas hit storage.
    flow.update_coordinate(&chair, Coordinate::new(0, 5)).await.unwrap();
    flow.update_coordinate(&chair, Coordinate::new(5, 5)).await.unwrap();
    flow.update_coordinate(&chair, Coordinate::new(5, 8)).await.unwrap();
    let flushed = flow.flush_positions().await.unwrap();
    assert_eq!(flushed, 1);
    // Nothing left behind.
    assert_eq!(flow.flush_positions().await.unwrap(), 0);

    let chair = db.fetch_chair(&chair.id).await.unwrap().unwrap();
    assert_eq!(chair.coordinate(), Some(Coordinate::new(5, 8)));
    assert_eq!(chair.total_distance, 13);
}
