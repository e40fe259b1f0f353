//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every database or payment provider call below is awaited, never
//! blocked on.
//!
//! Handlers never change an order directly. Payment outcomes arrive only through [`webhook`], which verifies the
//! provider's signature before anything is touched.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use game_store_engine::{
    db_types::{GameId, NewReview, OrderId, Role},
    order_objects::{NewOrderRequest, OrderQueryFilter},
    payments::SimulatedGateway,
    traits::{PaymentGatewayDatabase, ReviewDatabase},
    OrderFlowApi,
    PaymentGateway,
    ReviewApi,
    WebhookApi,
};
use log::*;

use crate::{
    auth::JwtClaims,
    config::ServerOptions,
    data_objects::{
        AdminOrderQuery,
        JsonResponse,
        PageParams,
        PublicKeyResponse,
        SimulatePaymentParams,
        SimulatedCallbackResponse,
        SimulatedOutcome,
        UpdateOrderStatusParams,
        WebhookReceipt,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// Each bound becomes one type parameter of the route struct, in order, and is passed to the handler in the same order.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+ where requires [$($roles:expr),*]) => {
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
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),*]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+) => {
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

//----------------------------------------------   Webhooks  ----------------------------------------------------
route!(webhook => Post "/webhooks/payments" impl PaymentGatewayDatabase, PaymentGateway);
/// Route handler for payment provider notifications.
///
/// The raw body is handed to the engine untouched, since provider signatures are computed over the exact bytes sent.
/// The signature is read from the header named in the configuration, or else the active gateway's own header.
///
/// Every notification that passes verification is acknowledged with `{"received": true}`, including duplicates and
/// events we do not act on, so the provider stops retrying. Malformed or unverifiable notifications get a 400 and
/// change nothing. Database failures return a 500 so that the provider retries later.
pub async fn webhook<B: PaymentGatewayDatabase, G: PaymentGateway>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<WebhookApi<B, G>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let header = options.signature_header(api.gateway().signature_header());
    trace!("💻️ Received payment notification ({} bytes). Signature header is {header}", body.len());
    let signature = req.headers().get(header).and_then(|v| v.to_str().ok());
    let outcome = api.process(&body, signature).await?;
    debug!("💻️ Payment notification processed: {outcome:?}");
    Ok(HttpResponse::Ok().json(WebhookReceipt { received: true }))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(public_key => Get "/payments/key" impl PaymentGatewayDatabase, PaymentGateway);
pub async fn public_key<B: PaymentGatewayDatabase, G: PaymentGateway>(
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET public key");
    Ok(HttpResponse::Ok().json(PublicKeyResponse { key: api.gateway().public_key() }))
}

route!(simulate_payment => Post "/payments/simulate/{order_id}" impl PaymentGatewayDatabase);
/// Produces the signed notification the payment simulator would send for one of the caller's orders.
///
/// Nothing is changed here. The client forwards the returned payload and signature to the webhook endpoint, exactly
/// as the real provider would. Only registered when the simulator is the active gateway.
pub async fn simulate_payment<B: PaymentGatewayDatabase>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    params: Option<web::Json<SimulatePaymentParams>>,
    api: web::Data<OrderFlowApi<B, SimulatedGateway>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let outcome = params.map(|p| p.outcome).unwrap_or_default();
    debug!("💻️ POST simulate {outcome:?} payment for {order_id} by {}", claims.sub);
    // Simulated payments are only for the order's owner, even for admins.
    let order = api.order_for_user(&order_id, &claims.sub, Role::User).await?;
    if order.payment_status.is_final() {
        return Err(ServerError::Conflict(format!("Order {order_id} is already {}", order.payment_status)));
    }
    let provider_order_id = order.payment_intent_id.ok_or_else(|| {
        ServerError::ValidationError(format!("Order {order_id} has no payment intent. Create a new order."))
    })?;
    let gateway = api.gateway();
    let callback = match outcome {
        SimulatedOutcome::Success => gateway.simulate_success(&provider_order_id, &order_id),
        SimulatedOutcome::Failure => gateway.simulate_failure(&provider_order_id, &order_id),
    };
    let header = options.signature_header(gateway.signature_header()).to_string();
    Ok(HttpResponse::Ok().json(SimulatedCallbackResponse {
        payload: callback.payload,
        signature: callback.signature,
        header,
    }))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl PaymentGatewayDatabase, PaymentGateway);
/// Route handler for checkout.
///
/// Prices come from the catalog, never from the request. On success the order is `PENDING` and the response carries
/// what the client needs to pay for it: the order id, the amount, and the provider's client secret or order id.
pub async fn create_order<B: PaymentGatewayDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST new order for {} with {} cart lines", claims.sub, body.items.len());
    let checkout = api.create_order(&claims.sub, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(checkout))
}

route!(my_orders => Get "/orders/me" impl PaymentGatewayDatabase, PaymentGateway);
pub async fn my_orders<B: PaymentGatewayDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    query: web::Query<PageParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my orders for {}", claims.sub);
    let page = api.orders_for_user(&claims.sub, query.pagination()).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(order_by_id => Get "/orders/{order_id}" impl PaymentGatewayDatabase, PaymentGateway);
/// Fetches a single order. Users can only see their own orders; admins can see any of them.
pub async fn order_by_id<B: PaymentGatewayDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order {order_id} for {}", claims.sub);
    let order = api.order_for_user(&order_id, &claims.sub, claims.role).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(admin_orders => Get "/admin/orders" impl PaymentGatewayDatabase, PaymentGateway where requires [Role::Admin]);
pub async fn admin_orders<B: PaymentGatewayDatabase, G: PaymentGateway>(
    query: web::Query<AdminOrderQuery>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let mut filter = OrderQueryFilter::default();
    if let Some(status) = query.payment_status()? {
        filter = filter.with_payment_status(status);
    }
    debug!("💻️ GET admin order search: {filter:?}");
    let page = api.search_orders(filter, query.pagination()).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(update_order_status => Patch "/admin/orders/{order_id}/status" impl PaymentGatewayDatabase, PaymentGateway where requires [Role::Admin]);
/// Admin override of an order's fulfilment status. The payment status cannot be changed through the API.
pub async fn update_order_status<B: PaymentGatewayDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    path: web::Path<OrderId>,
    body: web::Json<UpdateOrderStatusParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let status = body.status()?;
    info!("💻️ PATCH order {order_id} status to {status} by {}", claims.sub);
    let order = api.update_order_status(&order_id, status).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Reviews  ----------------------------------------------------
route!(game_reviews => Get "/games/{id}/reviews" impl ReviewDatabase);
pub async fn game_reviews<B: ReviewDatabase>(
    path: web::Path<GameId>,
    query: web::Query<PageParams>,
    api: web::Data<ReviewApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let game_id = path.into_inner();
    trace!("💻️ GET reviews for game #{game_id}");
    let reviews = api.reviews_for_game(game_id, query.pagination()).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

route!(add_review => Post "/games/{id}/reviews" impl ReviewDatabase);
pub async fn add_review<B: ReviewDatabase>(
    claims: JwtClaims,
    path: web::Path<GameId>,
    body: web::Json<NewReview>,
    api: web::Data<ReviewApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let game_id = path.into_inner();
    debug!("💻️ POST review of game #{game_id} by {}", claims.sub);
    let review = api.add_review(game_id, &claims.sub, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(review))
}

route!(delete_review => Delete "/games/{id}/reviews" impl ReviewDatabase);
pub async fn delete_review<B: ReviewDatabase>(
    claims: JwtClaims,
    path: web::Path<GameId>,
    api: web::Data<ReviewApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let game_id = path.into_inner();
    debug!("💻️ DELETE review of game #{game_id} by {}", claims.sub);
    api.delete_review(game_id, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Review of game {game_id} deleted"))))
}
