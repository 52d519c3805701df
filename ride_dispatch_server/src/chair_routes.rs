//! Chair-facing handlers under `/api/chair`.
use actix_web::{cookie::Cookie, web, HttpResponse};
use log::*;
use rds_common::Coordinate;
use ride_dispatch_engine::{
    db_types::RideId,
    AccountApi,
    DispatchDatabase,
    NotificationApi,
    RetryAfterPolicy,
    RideFlowApi,
};

use crate::{
    auth::{ChairSession, CHAIR_SESSION_COOKIE},
    data_objects::{
        ChairPostActivityRequest,
        ChairPostChairsRequest,
        ChairPostChairsResponse,
        ChairPostCoordinateResponse,
        ChairPostRideStatusRequest,
        NotificationResponse,
    },
    errors::ServerError,
    route,
};

route!(chair_post_chairs => Post "/api/chair/chairs" impl DispatchDatabase);
/// Registers a chair under the owner holding the supplied chair-register token.
pub async fn chair_post_chairs<A>(
    body: web::Json<ChairPostChairsRequest>,
    accounts: web::Data<AccountApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    let req = body.into_inner();
    if req.name.is_empty() || req.model.is_empty() || req.chair_register_token.is_empty() {
        return Err(ServerError::InvalidRequestBody(
            "some of required fields(name, model, chair_register_token) are empty".to_string(),
        ));
    }
    let chair = accounts.register_chair(&req.chair_register_token, &req.name, &req.model).await?;
    let cookie = Cookie::build(CHAIR_SESSION_COOKIE, chair.access_token.clone()).path("/").finish();
    let response = ChairPostChairsResponse { id: chair.id, owner_id: chair.owner_id };
    Ok(HttpResponse::Created().cookie(cookie).json(response))
}

route!(chair_post_activity => Post "/api/chair/activity" impl DispatchDatabase);
pub async fn chair_post_activity<A>(
    session: ChairSession<A>,
    body: web::Json<ChairPostActivityRequest>,
    accounts: web::Data<AccountApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    accounts.set_chair_activity(&session.chair, body.is_active).await?;
    Ok(HttpResponse::NoContent().finish())
}

route!(chair_post_coordinate => Post "/api/chair/coordinate" impl DispatchDatabase);
/// Ingests one position report. The write is batched; the PICKUP/ARRIVED auto-transitions run synchronously
/// against the reported coordinate.
pub async fn chair_post_coordinate<A>(
    session: ChairSession<A>,
    body: web::Json<Coordinate>,
    rides: web::Data<RideFlowApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    let (recorded_at, transition) = rides.update_coordinate(&session.chair, body.into_inner()).await?;
    if let Some(status) = transition {
        debug!("💻️ Chair [{}] position moved ride [{}] to {}", session.chair.id, status.ride_id, status.status);
    }
    Ok(HttpResponse::Ok().json(ChairPostCoordinateResponse { recorded_at: recorded_at.timestamp_millis() }))
}

route!(chair_get_notification => Get "/api/chair/notification" impl DispatchDatabase);
/// The chair's long-poll, mirroring the rider's but on the chair delivery channel.
pub async fn chair_get_notification<A>(
    session: ChairSession<A>,
    notifications: web::Data<NotificationApi<A>>,
    retry_policy: web::Data<RetryAfterPolicy>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    let data = notifications.chair_notification(&session.chair).await?;
    Ok(HttpResponse::Ok().json(NotificationResponse { data, retry_after_ms: retry_policy.retry_after_ms() }))
}

route!(chair_post_ride_status => Post "/api/chair/rides/{ride_id}/status" impl DispatchDatabase);
/// Chair-driven status transitions: `ENROUTE` acknowledges the assignment, `CARRYING` reports the rider on
/// board. The automatic transitions (PICKUP, ARRIVED) come from coordinate reports, never from here.
pub async fn chair_post_ride_status<A>(
    session: ChairSession<A>,
    path: web::Path<String>,
    body: web::Json<ChairPostRideStatusRequest>,
    rides: web::Data<RideFlowApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    let ride_id = RideId::from(path.into_inner());
    match body.status.as_str() {
        "ENROUTE" => {
            rides.acknowledge_ride(&session.chair, &ride_id).await?;
        },
        "CARRYING" => {
            rides.start_carrying(&session.chair, &ride_id).await?;
        },
        other => {
            return Err(ServerError::InvalidRequestBody(format!("invalid status: {other}")));
        },
    }
    Ok(HttpResponse::NoContent().finish())
}
