use actix_web::{http::StatusCode, test};
use ride_dispatch_engine::CoordinateBatcher;
use serde_json::json;

use super::{session_cookie, test_app, test_db};

#[actix_web::test]
async fn chair_registration_requires_a_valid_register_token() {
    let _ = env_logger::try_init();
    let app = test_app!(test_db().await);

    let req = test::TestRequest::post()
        .uri("/api/chair/chairs")
        .set_json(json!({"name": "c1", "model": "m1", "chair_register_token": "bogus"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn chair_assignment_flow_over_http() {
    let _ = env_logger::try_init();
    let db = test_db().await;
    let batcher = CoordinateBatcher::new();
    let app = test_app!(db.clone(), batcher.clone());

    // Owner registers, then a chair under the owner's register token.
    let res = test::call_service(
        &app,
        test::TestRequest::post().uri("/api/owner/owners").set_json(json!({"name": "fleet-1"})).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let owner_body: serde_json::Value = test::read_body_json(res).await;
    let register_token = owner_body["chair_register_token"].as_str().unwrap().to_string();

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/chair/chairs")
            .set_json(json!({"name": "c1", "model": "m1", "chair_register_token": register_token}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let chair_session = session_cookie(&res, "chair_session");

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/chair/activity")
            .cookie(chair_session.clone())
            .set_json(json!({"is_active": true}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/chair/coordinate")
            .cookie(chair_session.clone())
            .set_json(json!({"latitude": 5, "longitude": 5}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert!(body["recorded_at"].as_i64().unwrap() > 0);

    // The batched position only becomes visible to the matcher after a flush.
    let flow = ride_dispatch_engine::RideFlowApi::new(db.clone(), batcher);
    flow.flush_positions().await.unwrap();

    // A rider requests a ride; the internal matching trigger assigns the chair.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/app/users")
            .set_json(json!({
                "username": "rider1",
                "firstname": "Ada",
                "lastname": "Lovelace",
                "date_of_birth": "1815-12-10"
            }))
            .to_request(),
    )
    .await;
    let app_session = session_cookie(&res, "app_session");
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/app/rides")
            .cookie(app_session)
            .set_json(json!({
                "pickup_coordinate": {"latitude": 0, "longitude": 0},
                "destination_coordinate": {"latitude": 0, "longitude": 10}
            }))
            .to_request(),
    )
    .await;
    let body: serde_json::Value = test::read_body_json(res).await;
    let ride_id = body["ride_id"].as_str().unwrap().to_string();

    let res = test::call_service(&app, test::TestRequest::get().uri("/api/internal/matching").to_request()).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // The chair's poll announces the assignment; acknowledging moves the ride to ENROUTE.
    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/chair/notification").cookie(chair_session.clone()).to_request(),
    )
    .await;
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["data"]["ride_id"], ride_id.as_str());
    assert_eq!(body["data"]["status"], "MATCHING");
    assert_eq!(body["data"]["user"]["name"], "Ada Lovelace");

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/chair/rides/{ride_id}/status"))
            .cookie(chair_session.clone())
            .set_json(json!({"status": "ENROUTE"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // CARRYING before reaching the pickup is an invalid transition.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/chair/rides/{ride_id}/status"))
            .cookie(chair_session.clone())
            .set_json(json!({"status": "CARRYING"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Reporting the pickup coordinate auto-advances to PICKUP, after which CARRYING is accepted.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/chair/coordinate")
            .cookie(chair_session.clone())
            .set_json(json!({"latitude": 0, "longitude": 0}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/chair/rides/{ride_id}/status"))
            .cookie(chair_session)
            .set_json(json!({"status": "CARRYING"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}
