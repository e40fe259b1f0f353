use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use game_store_engine::{
    payments::{SimulatedGateway, StripeGateway},
    OrderFlowApi,
    PaymentGateway,
    ReviewApi,
    SqliteDatabase,
    WebhookApi,
};
use log::*;

use crate::{
    auth::TokenVerifier,
    config::{PaymentProvider, ServerConfig, ServerOptions},
    errors::ServerError,
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        AddReviewRoute,
        AdminOrdersRoute,
        CreateOrderRoute,
        DeleteReviewRoute,
        GameReviewsRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        PublicKeyRoute,
        SimulatePaymentRoute,
        UpdateOrderStatusRoute,
        WebhookRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not migrate the database. {e}")))?;
    info!("🚀️ Using the {} payment gateway", config.payment_provider);
    let srv = match config.payment_provider {
        PaymentProvider::Simulator => {
            let gateway = SimulatedGateway::new(config.simulator.key_id.clone(), config.simulator.secret.clone());
            create_server_instance(config, db, gateway)?
        },
        PaymentProvider::Stripe => {
            let gateway = StripeGateway::new(config.stripe.stripe_config())?;
            create_server_instance(config, db, gateway)?
        },
    };
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Request bodies, query strings and paths that fail to deserialize are reported as `{"error": ...}` with a 400, like
/// every other validation failure.
pub(crate) fn extractor_configs() -> (web::JsonConfig, web::QueryConfig, web::PathConfig) {
    let json = web::JsonConfig::default()
        .error_handler(|e, _| ServerError::ValidationError(format!("Invalid request body. {e}")).into());
    let query = web::QueryConfig::default()
        .error_handler(|e, _| ServerError::ValidationError(format!("Invalid query string. {e}")).into());
    let path =
        web::PathConfig::default().error_handler(|e, _| ServerError::ValidationError(format!("Invalid path. {e}")).into());
    (json, query, path)
}

/// Builds the HTTP server around a payment gateway chosen at startup.
///
/// The simulator-only routes are registered when the configuration selects the simulator, which is also when `G` is
/// [`SimulatedGateway`].
pub fn create_server_instance<G>(config: ServerConfig, db: SqliteDatabase, gateway: G) -> Result<Server, ServerError>
where G: PaymentGateway + Clone + Send + 'static {
    let options = ServerOptions::from_config(&config);
    let verifier = TokenVerifier::new(&config.auth);
    let default_currency = config.default_currency.clone();
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), gateway.clone()).with_default_currency(&default_currency);
        let webhook_api = WebhookApi::new(db.clone(), gateway.clone());
        let review_api = ReviewApi::new(db.clone());
        let (json_config, query_config, path_config) = extractor_configs();
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("gss::access_log"))
            .app_data(json_config)
            .app_data(query_config)
            .app_data(path_config)
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(webhook_api))
            .app_data(web::Data::new(review_api))
            .app_data(web::Data::new(options.clone()));
        // Routes that require authentication. `/orders/me` must come before `/orders/{order_id}`.
        let mut auth_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(verifier.clone()))
            .service(CreateOrderRoute::<SqliteDatabase, G>::new())
            .service(MyOrdersRoute::<SqliteDatabase, G>::new())
            .service(OrderByIdRoute::<SqliteDatabase, G>::new())
            .service(AddReviewRoute::<SqliteDatabase>::new())
            .service(DeleteReviewRoute::<SqliteDatabase>::new())
            .service(AdminOrdersRoute::<SqliteDatabase, G>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase, G>::new());
        if options.payment_provider == PaymentProvider::Simulator {
            auth_scope = auth_scope.service(SimulatePaymentRoute::<SqliteDatabase>::new());
        }
        app.service(health)
            .service(WebhookRoute::<SqliteDatabase, G>::new())
            .service(PublicKeyRoute::<SqliteDatabase, G>::new())
            .service(GameReviewsRoute::<SqliteDatabase>::new())
            .service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
