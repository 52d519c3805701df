use std::time::Duration;

use actix_web::{http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use ride_dispatch_engine::{
    sqlite::db::run_migrations,
    AccountApi,
    CoordinateBatcher,
    MatcherApi,
    NotificationApi,
    OwnerApi,
    RetryAfterPolicy,
    RideFlowApi,
    SqliteDatabase,
};

use crate::{
    app_routes::{
        AppGetNearbyChairsRoute,
        AppGetNotificationRoute,
        AppGetRidesRoute,
        AppPostPaymentMethodsRoute,
        AppPostRideEvaluationRoute,
        AppPostRidesEstimatedFareRoute,
        AppPostRidesRoute,
        AppPostUsersRoute,
    },
    chair_routes::{
        ChairGetNotificationRoute,
        ChairPostActivityRoute,
        ChairPostChairsRoute,
        ChairPostCoordinateRoute,
        ChairPostRideStatusRoute,
    },
    config::ServerConfig,
    errors::ServerError,
    owner_routes::{OwnerGetChairsRoute, OwnerGetSalesRoute, OwnerPostOwnersRoute},
    payment_gateway::HttpPaymentGateway,
    routes::{health, internal_get_matching, PostInitializeRoute},
    workers::{start_flush_worker, start_matcher_worker},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    run_migrations(db.pool()).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if let Some(url) = &config.payment_gateway_url {
        let accounts = AccountApi::new(db.clone());
        if accounts.payment_gateway_url().await.map_err(ServerError::from)?.is_none() {
            accounts.set_payment_gateway_url(url).await?;
        }
    }
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::BackendError(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<actix_web::dev::Server, ServerError> {
    // The coordinate batch map and the matcher gate are process-wide; the per-worker API instances share them
    // through these clonable handles.
    let batcher = CoordinateBatcher::new();
    let matcher = MatcherApi::new(db.clone());
    let retry_policy = web::Data::new(RetryAfterPolicy::new());
    start_flush_worker(db.clone(), batcher.clone(), config.flush_interval);
    start_matcher_worker(matcher.clone(), config.match_interval);
    let matcher = web::Data::new(matcher);
    info!("🚀️ Workers started, binding {}:{}", config.host, config.port);
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let accounts_api = AccountApi::new(db.clone());
        let ride_flow_api = RideFlowApi::new(db.clone(), batcher.clone());
        let notification_api = NotificationApi::new(db.clone());
        let owner_api = OwnerApi::new(db.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("rds::access_log"))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(ride_flow_api))
            .app_data(web::Data::new(notification_api))
            .app_data(web::Data::new(owner_api))
            .app_data(web::Data::new(HttpPaymentGateway::new()))
            .app_data(retry_policy.clone())
            .app_data(matcher.clone())
            .service(health)
            .service(internal_get_matching)
            .service(PostInitializeRoute::<SqliteDatabase>::new())
            .service(AppPostUsersRoute::<SqliteDatabase>::new())
            .service(AppPostPaymentMethodsRoute::<SqliteDatabase>::new())
            .service(AppGetRidesRoute::<SqliteDatabase>::new())
            .service(AppPostRidesRoute::<SqliteDatabase>::new())
            .service(AppPostRidesEstimatedFareRoute::<SqliteDatabase>::new())
            .service(AppPostRideEvaluationRoute::<SqliteDatabase>::new())
            .service(AppGetNotificationRoute::<SqliteDatabase>::new())
            .service(AppGetNearbyChairsRoute::<SqliteDatabase>::new())
            .service(ChairPostChairsRoute::<SqliteDatabase>::new())
            .service(ChairPostActivityRoute::<SqliteDatabase>::new())
            .service(ChairPostCoordinateRoute::<SqliteDatabase>::new())
            .service(ChairGetNotificationRoute::<SqliteDatabase>::new())
            .service(ChairPostRideStatusRoute::<SqliteDatabase>::new())
            .service(OwnerPostOwnersRoute::<SqliteDatabase>::new())
            .service(OwnerGetSalesRoute::<SqliteDatabase>::new())
            .service(OwnerGetChairsRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
