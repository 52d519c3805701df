//! Owner-facing handlers under `/api/owner`.
use actix_web::{cookie::Cookie, web, HttpResponse};
use chrono::{DateTime, Utc};
use ride_dispatch_engine::{AccountApi, DispatchDatabase, OwnerApi};

use crate::{
    auth::{OwnerSession, OWNER_SESSION_COOKIE},
    data_objects::{OwnerGetChairsResponse, OwnerPostOwnersRequest, OwnerPostOwnersResponse, OwnerSalesQuery},
    errors::ServerError,
    route,
};

route!(owner_post_owners => Post "/api/owner/owners" impl DispatchDatabase);
pub async fn owner_post_owners<A>(
    body: web::Json<OwnerPostOwnersRequest>,
    accounts: web::Data<AccountApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    if body.name.is_empty() {
        return Err(ServerError::InvalidRequestBody("some of required fields(name) are empty".to_string()));
    }
    let owner = accounts.register_owner(&body.name).await?;
    let cookie = Cookie::build(OWNER_SESSION_COOKIE, owner.access_token.clone()).path("/").finish();
    let response = OwnerPostOwnersResponse { id: owner.id, chair_register_token: owner.chair_register_token };
    Ok(HttpResponse::Created().cookie(cookie).json(response))
}

route!(owner_get_sales => Get "/api/owner/sales" impl DispatchDatabase);
/// Sales over the owner's completed rides in the requested window, aggregated per chair and per model.
pub async fn owner_get_sales<A>(
    session: OwnerSession<A>,
    query: web::Query<OwnerSalesQuery>,
    owners: web::Data<OwnerApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    let since = millis_bound(query.since, 0)?;
    let until = millis_bound(query.until, 32_503_680_000_000)?;
    let report = owners.sales_report(&session.owner, since, until).await?;
    Ok(HttpResponse::Ok().json(report))
}

route!(owner_get_chairs => Get "/api/owner/chairs" impl DispatchDatabase);
pub async fn owner_get_chairs<A>(
    session: OwnerSession<A>,
    owners: web::Data<OwnerApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    let chairs = owners.owned_chairs(&session.owner).await?;
    Ok(HttpResponse::Ok().json(OwnerGetChairsResponse { chairs }))
}

fn millis_bound(value: Option<i64>, default: i64) -> Result<DateTime<Utc>, ServerError> {
    let millis = value.unwrap_or(default);
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| ServerError::InvalidRequestBody(format!("invalid timestamp: {millis}")))
}
