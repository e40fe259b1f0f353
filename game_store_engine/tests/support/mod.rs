#![allow(dead_code)]

use std::ops::Deref;

use game_store_engine::{
    db_types::{Game, NewGame, OrderId},
    order_objects::{CartItem, CheckoutResponse, NewOrderRequest},
    payments::{ClientHandle, SimulatedGateway},
    OrderFlowApi,
    SqliteDatabase,
    WebhookApi,
    WebhookOutcome,
};
use gs_common::MinorUnits;
use log::*;
use tempfile::TempDir;

/// A migrated database in its own temporary directory. The directory, along with the database and its WAL files, is
/// removed when this is dropped.
pub struct TestDb {
    db: SqliteDatabase,
    dir: TempDir,
}

impl TestDb {
    pub fn dir(&self) -> &std::path::Path {
        self.dir.path()
    }
}

impl Deref for TestDb {
    type Target = SqliteDatabase;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

pub async fn prepare_test_env() -> TestDb {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let dir = tempfile::Builder::new().prefix("gs_test_").tempdir().expect("Error creating temporary directory");
    let url = format!("sqlite://{}", dir.path().join("game_store.db").display());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    debug!("🚀️ Test database ready at {url}");
    TestDb { db, dir }
}

pub async fn seed_game(db: &SqliteDatabase, title: &str, price: i64, stock: i64) -> Game {
    let game = NewGame::new(title, MinorUnits::from(price), stock).with_cover_image(format!("/covers/{title}.png"));
    db.insert_game(game).await.expect("Error seeding game")
}

pub struct Store {
    pub db: TestDb,
    pub gateway: SimulatedGateway,
    pub orders: OrderFlowApi<SqliteDatabase, SimulatedGateway>,
    pub webhooks: WebhookApi<SqliteDatabase, SimulatedGateway>,
}

impl Store {
    pub async fn new() -> Self {
        let db = prepare_test_env().await;
        let gateway = SimulatedGateway::default();
        let orders = OrderFlowApi::new(db.clone(), gateway.clone());
        let webhooks = WebhookApi::new(db.clone(), gateway.clone());
        Self { db, gateway, orders, webhooks }
    }

    pub async fn checkout(&self, user: &str, items: &[(i64, i64)]) -> CheckoutResponse {
        let cart = items.iter().map(|&(id, qty)| CartItem::new(id, qty)).collect();
        self.orders.create_order(user, NewOrderRequest::new(cart)).await.expect("Checkout failed")
    }

    /// Delivers a correctly signed success notification for a checkout.
    pub async fn pay(&self, checkout: &CheckoutResponse) -> WebhookOutcome {
        let callback = self.gateway.simulate_success(provider_order_id(checkout), &checkout.order_id);
        self.webhooks.process(callback.payload.as_bytes(), Some(&callback.signature)).await.expect("Webhook failed")
    }

    pub async fn decline(&self, checkout: &CheckoutResponse) -> WebhookOutcome {
        let callback = self.gateway.simulate_failure(provider_order_id(checkout), &checkout.order_id);
        self.webhooks.process(callback.payload.as_bytes(), Some(&callback.signature)).await.expect("Webhook failed")
    }
}

pub fn provider_order_id(checkout: &CheckoutResponse) -> &str {
    match &checkout.client_handle {
        ClientHandle::ProviderOrderId(id) => id,
        ClientHandle::ClientSecret(_) => panic!("The simulator hands out provider order ids"),
    }
}

pub fn order_id(s: &str) -> OrderId {
    OrderId::from(s)
}
