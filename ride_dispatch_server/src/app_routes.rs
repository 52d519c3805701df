//! Rider-facing handlers under `/api/app`.
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
    auth::{AppSession, APP_SESSION_COOKIE},
    data_objects::{
        AppPostPaymentMethodsRequest,
        AppPostRideEvaluationRequest,
        AppPostRideEvaluationResponse,
        AppPostRidesEstimatedFareResponse,
        AppPostRidesRequest,
        AppPostRidesResponse,
        AppPostUsersRequest,
        AppPostUsersResponse,
        GetAppRidesResponse,
        NearbyChairsQuery,
        NearbyChairsResponse,
        NotificationResponse,
    },
    errors::ServerError,
    payment_gateway::HttpPaymentGateway,
    route,
};

route!(app_post_users => Post "/api/app/users" impl DispatchDatabase);
/// Registers a rider account. Grants the first-use campaign coupon, and processes the optional invitation code
/// (invite coupon for the new rider, uniquified reward coupon for the inviter, capped at three redemptions).
pub async fn app_post_users<A>(
    body: web::Json<AppPostUsersRequest>,
    accounts: web::Data<AccountApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    let req = body.into_inner();
    if req.username.is_empty() || req.firstname.is_empty() || req.lastname.is_empty() || req.date_of_birth.is_empty() {
        return Err(ServerError::InvalidRequestBody(
            "required fields(username, firstname, lastname, date_of_birth) are empty".to_string(),
        ));
    }
    let user = accounts
        .register_user(&req.username, &req.firstname, &req.lastname, &req.date_of_birth, req.invitation_code)
        .await?;
    let cookie = Cookie::build(APP_SESSION_COOKIE, user.access_token.clone()).path("/").finish();
    let response = AppPostUsersResponse { id: user.id, invitation_code: user.invitation_code };
    Ok(HttpResponse::Created().cookie(cookie).json(response))
}

route!(app_post_payment_methods => Post "/api/app/payment-methods" impl DispatchDatabase);
pub async fn app_post_payment_methods<A>(
    session: AppSession<A>,
    body: web::Json<AppPostPaymentMethodsRequest>,
    accounts: web::Data<AccountApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    if body.token.is_empty() {
        return Err(ServerError::InvalidRequestBody("token is required but was empty".to_string()));
    }
    accounts.register_payment_token(&session.user, &body.token).await?;
    Ok(HttpResponse::NoContent().finish())
}

route!(app_get_rides => Get "/api/app/rides" impl DispatchDatabase);
/// The rider's completed rides with the fares they were billed at.
pub async fn app_get_rides<A>(
    session: AppSession<A>,
    rides: web::Data<RideFlowApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    let history = rides.ride_history(&session.user).await?;
    Ok(HttpResponse::Ok().json(GetAppRidesResponse { rides: history }))
}

route!(app_post_rides => Post "/api/app/rides" impl DispatchDatabase);
/// Requests a ride. One open ride per rider; the fare in the response reflects the coupon consumed by this
/// creation.
pub async fn app_post_rides<A>(
    session: AppSession<A>,
    body: web::Json<AppPostRidesRequest>,
    rides: web::Data<RideFlowApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    let (pickup, destination) = require_coordinates(&body)?;
    let (ride, fare) = rides.create_ride(&session.user, pickup, destination).await?;
    debug!("💻️ User [{}] requested ride [{}]", session.user.id, ride.id);
    Ok(HttpResponse::Accepted().json(AppPostRidesResponse { ride_id: ride.id, fare }))
}

route!(app_post_rides_estimated_fare => Post "/api/app/rides/estimated-fare" impl DispatchDatabase);
/// Quotes a fare. Previews the discount a subsequent creation would apply without consuming any coupon.
pub async fn app_post_rides_estimated_fare<A>(
    session: AppSession<A>,
    body: web::Json<AppPostRidesRequest>,
    rides: web::Data<RideFlowApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    let (pickup, destination) = require_coordinates(&body)?;
    let (fare, discount) = rides.estimate_fare(&session.user, pickup, destination).await?;
    Ok(HttpResponse::Ok().json(AppPostRidesEstimatedFareResponse { fare, discount }))
}

route!(app_post_ride_evaluation => Post "/api/app/rides/{ride_id}/evaluation" impl DispatchDatabase);
/// Evaluates (and completes) an arrived ride, then charges the final fare against the rider's payment token.
pub async fn app_post_ride_evaluation<A>(
    session: AppSession<A>,
    path: web::Path<String>,
    body: web::Json<AppPostRideEvaluationRequest>,
    rides: web::Data<RideFlowApi<A>>,
    gateway: web::Data<HttpPaymentGateway>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    let ride_id = RideId::from(path.into_inner());
    let ride = rides.evaluate_ride(&session.user, &ride_id, body.evaluation, gateway.get_ref()).await?;
    Ok(HttpResponse::Ok().json(AppPostRideEvaluationResponse { completed_at: ride.updated_at.timestamp_millis() }))
}

route!(app_get_notification => Get "/api/app/notification" impl DispatchDatabase);
/// The rider's long-poll. Returns the oldest undelivered status for the rider's latest ride (or the current
/// status when the queue is empty) plus the retry-after hint.
pub async fn app_get_notification<A>(
    session: AppSession<A>,
    notifications: web::Data<NotificationApi<A>>,
    retry_policy: web::Data<RetryAfterPolicy>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    let data = notifications.app_notification(&session.user).await?;
    Ok(HttpResponse::Ok().json(NotificationResponse { data, retry_after_ms: retry_policy.retry_after_ms() }))
}

route!(app_get_nearby_chairs => Get "/api/app/nearby-chairs" impl DispatchDatabase);
pub async fn app_get_nearby_chairs<A>(
    _session: AppSession<A>,
    query: web::Query<NearbyChairsQuery>,
    rides: web::Data<RideFlowApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    let (Some(latitude), Some(longitude)) = (query.latitude, query.longitude) else {
        return Err(ServerError::InvalidRequestBody("latitude or longitude is empty".to_string()));
    };
    let distance = query.distance.unwrap_or(50);
    let (chairs, retrieved_at) = rides.nearby_chairs(Coordinate::new(latitude, longitude), distance).await?;
    Ok(HttpResponse::Ok().json(NearbyChairsResponse { chairs, retrieved_at: retrieved_at.timestamp_millis() }))
}

fn require_coordinates(body: &AppPostRidesRequest) -> Result<(Coordinate, Coordinate), ServerError> {
    match (body.pickup_coordinate, body.destination_coordinate) {
        (Some(pickup), Some(destination)) => Ok((pickup, destination)),
        _ => Err(ServerError::InvalidRequestBody(
            "required fields(pickup_coordinate, destination_coordinate) are empty".to_string(),
        )),
    }
}
