//! HTTP-level tests: routing, session authentication, validation and wire formats, against a real SQLite
//! backend prepared per test.
use actix_web::cookie::Cookie;
use ride_dispatch_engine::{
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    SqliteDatabase,
};

mod app;
mod chair;

pub async fn test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database")
}

/// Builds the full service under test. Pass a batcher to share the ingestion path's batch map with the test;
/// omit it when the test never flushes.
macro_rules! test_app {
    ($db:expr, $batcher:expr) => {{
        let db: ride_dispatch_engine::SqliteDatabase = $db;
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(ride_dispatch_engine::AccountApi::new(db.clone())))
                .app_data(actix_web::web::Data::new(ride_dispatch_engine::RideFlowApi::new(db.clone(), $batcher)))
                .app_data(actix_web::web::Data::new(ride_dispatch_engine::NotificationApi::new(db.clone())))
                .app_data(actix_web::web::Data::new(ride_dispatch_engine::OwnerApi::new(db.clone())))
                .app_data(actix_web::web::Data::new(ride_dispatch_engine::MatcherApi::new(db.clone())))
                .app_data(actix_web::web::Data::new($crate::payment_gateway::HttpPaymentGateway::new()))
                .app_data(actix_web::web::Data::new(ride_dispatch_engine::RetryAfterPolicy::new()))
                .service($crate::routes::internal_get_matching)
                .service($crate::routes::PostInitializeRoute::<ride_dispatch_engine::SqliteDatabase>::new())
                .service($crate::app_routes::AppPostUsersRoute::<ride_dispatch_engine::SqliteDatabase>::new())
                .service($crate::app_routes::AppPostPaymentMethodsRoute::<ride_dispatch_engine::SqliteDatabase>::new())
                .service($crate::app_routes::AppGetRidesRoute::<ride_dispatch_engine::SqliteDatabase>::new())
                .service($crate::app_routes::AppPostRidesRoute::<ride_dispatch_engine::SqliteDatabase>::new())
                .service($crate::app_routes::AppPostRidesEstimatedFareRoute::<ride_dispatch_engine::SqliteDatabase>::new())
                .service($crate::app_routes::AppPostRideEvaluationRoute::<ride_dispatch_engine::SqliteDatabase>::new())
                .service($crate::app_routes::AppGetNotificationRoute::<ride_dispatch_engine::SqliteDatabase>::new())
                .service($crate::app_routes::AppGetNearbyChairsRoute::<ride_dispatch_engine::SqliteDatabase>::new())
                .service($crate::chair_routes::ChairPostChairsRoute::<ride_dispatch_engine::SqliteDatabase>::new())
                .service($crate::chair_routes::ChairPostActivityRoute::<ride_dispatch_engine::SqliteDatabase>::new())
                .service($crate::chair_routes::ChairPostCoordinateRoute::<ride_dispatch_engine::SqliteDatabase>::new())
                .service($crate::chair_routes::ChairGetNotificationRoute::<ride_dispatch_engine::SqliteDatabase>::new())
                .service($crate::chair_routes::ChairPostRideStatusRoute::<ride_dispatch_engine::SqliteDatabase>::new())
                .service($crate::owner_routes::OwnerPostOwnersRoute::<ride_dispatch_engine::SqliteDatabase>::new())
                .service($crate::owner_routes::OwnerGetSalesRoute::<ride_dispatch_engine::SqliteDatabase>::new())
                .service($crate::owner_routes::OwnerGetChairsRoute::<ride_dispatch_engine::SqliteDatabase>::new()),
        )
        .await
    }};
    ($db:expr) => {
        test_app!($db, ride_dispatch_engine::CoordinateBatcher::new())
    };
}
pub(crate) use test_app;

/// Extracts a session cookie from a registration response.
pub fn session_cookie(response: &actix_web::dev::ServiceResponse, name: &str) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|c| c.name() == name)
        .unwrap_or_else(|| panic!("expected {name} cookie"))
        .into_owned()
}
