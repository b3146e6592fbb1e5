//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Since each worker thread processes its requests sequentially, handlers must never block the thread. Every store or
//! gateway call is awaited, so other requests are served while a settlement is waiting on the gateway or on the
//! store's write lock.
use actix_web::{get, web, HttpResponse, Responder};
use amp_settlement_engine::{
    traits::{PaymentGateway, ProjectManagement, SettlementDatabase, TierPolicies},
    ProjectsApi,
    SettlementApi,
};
use gateway_tools::helpers::is_valid_object_id;
use log::*;
use serde::Deserialize;

use crate::errors::ServerError;

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

//----------------------------------------------   Settlement  ----------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct VerifySettlementParams {
    pub transaction: Option<String>,
}

route!(verify_settlement => Get "/settlement/verify" impl SettlementDatabase, PaymentGateway);
/// Route handler for the settlement verification endpoint
///
/// Called by the artist's confirmation page after checkout, and by the gateway's server callback. Both may arrive in
/// any order and any number of times. The response is the same every time once the payment has been settled:
///
/// ```json
/// { "status": "paid", "requestId": 42, "projectId": 7, "isNewlyProcessed": false }
/// ```
///
/// A `pending` status straight after checkout is normal. The page should keep polling.
pub async fn verify_settlement<B, G>(
    query: web::Query<VerifySettlementParams>,
    api: web::Data<SettlementApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: SettlementDatabase,
    G: PaymentGateway,
{
    let txid = query.transaction.as_deref().map(str::trim).unwrap_or_default();
    trace!("💻️ Received settlement verification request for '{txid}'");
    if txid.is_empty() {
        return Err(ServerError::InvalidQuery("The 'transaction' query parameter is required".into()));
    }
    if !is_valid_object_id(txid) {
        return Err(ServerError::InvalidQuery(format!("'{txid}' is not a valid transaction id")));
    }
    let result = api.settle(txid).await?;
    debug!("💻️ Settlement of {txid}: {result:?}");
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Projects  ----------------------------------------------------
route!(project_for_request => Get "/requests/{id}/project" impl ProjectManagement);
pub async fn project_for_request<B: ProjectManagement>(
    path: web::Path<i64>,
    api: web::Data<ProjectsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request_id = path.into_inner();
    trace!("💻️ Fetching project for service request #{request_id}");
    let detail = api
        .project_for_request(request_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Service request #{request_id} has not been settled")))?;
    Ok(HttpResponse::Ok().json(detail))
}

route!(payment_for_request => Get "/requests/{id}/payment" impl ProjectManagement);
pub async fn payment_for_request<B: ProjectManagement>(
    path: web::Path<i64>,
    api: web::Data<ProjectsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request_id = path.into_inner();
    trace!("💻️ Fetching ledger entry for service request #{request_id}");
    let entry = api
        .ledger_entry_for_request(request_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No payment recorded for service request #{request_id}")))?;
    Ok(HttpResponse::Ok().json(entry))
}

//----------------------------------------------   Tiers  ----------------------------------------------------
route!(tiers => Get "/tiers" impl TierPolicies);
pub async fn tiers<B: TierPolicies>(api: web::Data<ProjectsApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Fetching tier policies");
    let policies = api.tier_policies().await?;
    Ok(HttpResponse::Ok().json(policies))
}
