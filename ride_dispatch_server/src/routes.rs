//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause
//! the current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (I/O,
//! database calls, the payment gateway) is expressed as an async function so worker threads keep serving other
//! requests while it is in flight.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use ride_dispatch_engine::{AccountApi, DispatchDatabase, MatcherApi, RetryAfterPolicy, SqliteDatabase};

use crate::{
    data_objects::{PostInitializeRequest, PostInitializeResponse},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------  Initialize  ---------------------------------------------------
route!(post_initialize => Post "/api/initialize" impl DispatchDatabase);
/// Bootstraps the service for a fresh run: stores the payment gateway URL and restarts the notification
/// retry-after ramp. Schema provisioning is handled by migrations at startup, not here.
pub async fn post_initialize<A>(
    body: web::Json<PostInitializeRequest>,
    accounts: web::Data<AccountApi<A>>,
    retry_policy: web::Data<RetryAfterPolicy>,
) -> Result<HttpResponse, ServerError>
where
    A: DispatchDatabase,
{
    if body.payment_server.is_empty() {
        return Err(ServerError::InvalidRequestBody("payment_server is required but was empty".to_string()));
    }
    accounts.set_payment_gateway_url(&body.payment_server).await?;
    retry_policy.reset();
    info!("💻️ Service initialized");
    Ok(HttpResponse::Ok().json(PostInitializeResponse { language: "rust" }))
}

//----------------------------------------------   Matching   ---------------------------------------------------
/// Triggers one matching pass. The cadence is driven externally (the internal timer worker, or an operator
/// hitting this endpoint); passes are single-flight, so overlapping triggers are harmless.
#[get("/api/internal/matching")]
pub async fn internal_get_matching(matcher: web::Data<MatcherApi<SqliteDatabase>>) -> Result<HttpResponse, ServerError> {
    let outcome = matcher.run_pass().await?;
    trace!("💻️ Matching pass triggered via internal endpoint: {outcome:?}");
    Ok(HttpResponse::NoContent().finish())
}
