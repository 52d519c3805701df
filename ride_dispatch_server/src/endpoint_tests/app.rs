use actix_web::{http::StatusCode, test};
use serde_json::json;

use super::{session_cookie, test_app, test_db};

#[actix_web::test]
async fn register_user_sets_session_cookie() {
    let _ = env_logger::try_init();
    let app = test_app!(test_db().await);

    let req = test::TestRequest::post()
        .uri("/api/app/users")
        .set_json(json!({
            "username": "rider1",
            "firstname": "Ada",
            "lastname": "Lovelace",
            "date_of_birth": "1815-12-10"
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let _cookie = session_cookie(&res, "app_session");
    let body: serde_json::Value = test::read_body_json(res).await;
    assert!(body["id"].is_string());
    assert!(body["invitation_code"].is_string());
}

#[actix_web::test]
async fn register_user_requires_all_fields() {
    let _ = env_logger::try_init();
    let app = test_app!(test_db().await);

    let req = test::TestRequest::post()
        .uri("/api/app/users")
        .set_json(json!({"username": "rider1", "firstname": "Ada"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["message"], "required fields(username, firstname, lastname, date_of_birth) are empty");
}

#[actix_web::test]
async fn notification_requires_a_session() {
    let _ = env_logger::try_init();
    let app = test_app!(test_db().await);

    let req = test::TestRequest::get().uri("/api/app/notification").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn ride_creation_and_notification_flow() {
    let _ = env_logger::try_init();
    let app = test_app!(test_db().await);

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
    let session = session_cookie(&res, "app_session");

    // No ride yet: the poll returns a null payload and a retry hint.
    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/app/notification").cookie(session.clone()).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert!(body["data"].is_null());
    assert!(body["retry_after_ms"].as_u64().unwrap() >= 60);

    // The campaign coupon (3000) swallows the metered fare of 1000.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/app/rides")
            .cookie(session.clone())
            .set_json(json!({
                "pickup_coordinate": {"latitude": 0, "longitude": 0},
                "destination_coordinate": {"latitude": 0, "longitude": 10}
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["fare"], 500);
    let ride_id = body["ride_id"].as_str().unwrap().to_string();

    // A second request while the first ride is open conflicts.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/app/rides")
            .cookie(session.clone())
            .set_json(json!({
                "pickup_coordinate": {"latitude": 1, "longitude": 1},
                "destination_coordinate": {"latitude": 2, "longitude": 2}
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // The poll reports the new ride in MATCHING, with the wire-format status string.
    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/app/notification").cookie(session.clone()).to_request(),
    )
    .await;
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["data"]["ride_id"], ride_id.as_str());
    assert_eq!(body["data"]["status"], "MATCHING");
    assert_eq!(body["data"]["fare"], 500);
    assert_eq!(body["data"]["pickup_coordinate"], json!({"latitude": 0, "longitude": 0}));
}

#[actix_web::test]
async fn estimated_fare_previews_the_discount() {
    let _ = env_logger::try_init();
    let app = test_app!(test_db().await);

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
    let session = session_cookie(&res, "app_session");

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/app/rides/estimated-fare")
            .cookie(session.clone())
            .set_json(json!({
                "pickup_coordinate": {"latitude": 0, "longitude": 0},
                "destination_coordinate": {"latitude": 0, "longitude": 10}
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["fare"], 500);
    assert_eq!(body["discount"], 1000);

    // Estimates never consume the coupon: the same quote comes back again.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/app/rides/estimated-fare")
            .cookie(session)
            .set_json(json!({
                "pickup_coordinate": {"latitude": 0, "longitude": 0},
                "destination_coordinate": {"latitude": 0, "longitude": 10}
            }))
            .to_request(),
    )
    .await;
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["fare"], 500);
}
