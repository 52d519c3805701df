//! Session extractors for the three client roles.
//!
//! Each role authenticates with the access token issued at registration, carried in a role-specific session
//! cookie. The extractor resolves the token to the account row and hands it to the handler; token mechanics
//! beyond the lookup are deliberately out of scope.
use std::marker::PhantomData;

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::{future::LocalBoxFuture, FutureExt};
use ride_dispatch_engine::{
    db_types::{Chair, Owner, User},
    AccountApi,
    AccountManagement,
};

use crate::errors::ServerError;

pub const APP_SESSION_COOKIE: &str = "app_session";
pub const CHAIR_SESSION_COOKIE: &str = "chair_session";
pub const OWNER_SESSION_COOKIE: &str = "owner_session";

fn session_token(req: &HttpRequest, cookie_name: &str) -> Result<String, ServerError> {
    req.cookie(cookie_name).map(|c| c.value().to_string()).ok_or(ServerError::Unauthenticated)
}

fn account_api<A: AccountManagement + 'static>(req: &HttpRequest) -> Result<AccountApi<A>, ServerError> {
    req.app_data::<web::Data<AccountApi<A>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| ServerError::BackendError("AccountApi is not configured".to_string()))
}

//----------------------------------------------   AppSession   ------------------------------------------------------
/// The authenticated rider behind an `/api/app` request.
pub struct AppSession<A> {
    pub user: User,
    _backend: PhantomData<fn() -> A>,
}

impl<A: AccountManagement + 'static> FromRequest for AppSession<A> {
    type Error = ServerError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        async move {
            let token = session_token(&req, APP_SESSION_COOKIE)?;
            let api = account_api::<A>(&req)?;
            let user = api.user_by_token(&token).await?.ok_or(ServerError::Unauthenticated)?;
            Ok(Self { user, _backend: PhantomData })
        }
        .boxed_local()
    }
}

//----------------------------------------------  ChairSession   -----------------------------------------------------
/// The authenticated chair behind an `/api/chair` request.
pub struct ChairSession<A> {
    pub chair: Chair,
    _backend: PhantomData<fn() -> A>,
}

impl<A: AccountManagement + 'static> FromRequest for ChairSession<A> {
    type Error = ServerError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        async move {
            let token = session_token(&req, CHAIR_SESSION_COOKIE)?;
            let api = account_api::<A>(&req)?;
            let chair = api.chair_by_token(&token).await?.ok_or(ServerError::Unauthenticated)?;
            Ok(Self { chair, _backend: PhantomData })
        }
        .boxed_local()
    }
}

//----------------------------------------------  OwnerSession   -----------------------------------------------------
/// The authenticated owner behind an `/api/owner` request.
pub struct OwnerSession<A> {
    pub owner: Owner,
    _backend: PhantomData<fn() -> A>,
}

impl<A: AccountManagement + 'static> FromRequest for OwnerSession<A> {
    type Error = ServerError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        async move {
            let token = session_token(&req, OWNER_SESSION_COOKIE)?;
            let api = account_api::<A>(&req)?;
            let owner = api.owner_by_token(&token).await?.ok_or(ServerError::Unauthenticated)?;
            Ok(Self { owner, _backend: PhantomData })
        }
        .boxed_local()
    }
}
