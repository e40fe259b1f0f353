use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use game_store_engine::{
    db_types::{GameId, OrderId, OrderStatusType, PaymentStatus, Role},
    order_objects::{CartItem, NewOrderRequest},
    payments::SimulatedGateway,
    traits::{InventoryManagement, OrderManagement},
    OrderFlowApi,
    SqliteDatabase,
    WebhookApi,
};
use serde_json::{json, Value};

use super::helpers::{bearer, call, call_public, issue_token, json, prepare_test_db, seed_game};
use crate::{
    config::ServerOptions,
    routes::{PublicKeyRoute, SimulatePaymentRoute, WebhookRoute},
};

fn payments_app(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let gateway = SimulatedGateway::default();
        cfg.service(SimulatePaymentRoute::<SqliteDatabase>::new())
            .service(WebhookRoute::<SqliteDatabase, SimulatedGateway>::new())
            .service(PublicKeyRoute::<SqliteDatabase, SimulatedGateway>::new())
            .app_data(web::Data::new(OrderFlowApi::new(db.clone(), gateway.clone())))
            .app_data(web::Data::new(WebhookApi::new(db, gateway)))
            .app_data(web::Data::new(ServerOptions::default()));
    }
}

async fn place_order(db: &SqliteDatabase, user: &str, game_id: GameId, qty: i64) -> OrderId {
    let api = OrderFlowApi::new(db.clone(), SimulatedGateway::default());
    let request = NewOrderRequest::new(vec![CartItem::new(game_id.value(), qty)]);
    api.create_order(user, request).await.expect("Could not place order").order_id
}

async fn simulate(db: &SqliteDatabase, user: &str, order_id: &OrderId, outcome: &str) -> (StatusCode, Value) {
    let token = issue_token(user, Role::User);
    let req = TestRequest::post()
        .uri(&format!("/payments/simulate/{order_id}"))
        .insert_header(bearer(&token))
        .set_json(json!({ "outcome": outcome }));
    let (status, body) = call(req, payments_app(db.clone())).await;
    (status, json(&body))
}

async fn deliver(db: &SqliteDatabase, callback: &Value) -> (StatusCode, String) {
    let header = callback["header"].as_str().unwrap().to_string();
    let signature = callback["signature"].as_str().unwrap().to_string();
    let payload = callback["payload"].as_str().unwrap().to_string();
    let req = TestRequest::post().uri("/webhooks/payments").insert_header((header, signature)).set_payload(payload);
    call_public(req, payments_app(db.clone())).await
}

async fn stock_of(db: &SqliteDatabase, id: GameId) -> i64 {
    db.fetch_game(id).await.unwrap().expect("game should exist").stock
}

async fn order(db: &SqliteDatabase, order_id: &OrderId) -> (PaymentStatus, OrderStatusType) {
    let order = db.fetch_order(order_id).await.unwrap().expect("order should exist");
    (order.payment_status, order.order_status)
}

#[actix_web::test]
async fn successful_payment() {
    let _ = env_logger::try_init().ok();
    let db = prepare_test_db().await;
    let game = seed_game(&db, "Hades", 2500, 3).await;
    let order_id = place_order(&db, "alice", game.id, 2).await;
    assert_eq!(order(&db, &order_id).await, (PaymentStatus::Pending, OrderStatusType::Processing));
    assert_eq!(stock_of(&db, game.id).await, 3);

    let (status, callback) = simulate(&db, "alice", &order_id, "success").await;
    assert_eq!(status, StatusCode::OK, "{callback}");
    assert_eq!(callback["header"], "X-Payment-Signature");
    // Simulating changes nothing until the notification is delivered
    assert_eq!(order(&db, &order_id).await.0, PaymentStatus::Pending);

    let (status, body) = deliver(&db, &callback).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body), json!({"received": true}));
    assert_eq!(order(&db, &order_id).await, (PaymentStatus::Paid, OrderStatusType::Confirmed));
    assert_eq!(stock_of(&db, game.id).await, 1);

    // Redelivery is acknowledged and changes nothing
    let (status, body) = deliver(&db, &callback).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(stock_of(&db, game.id).await, 1);

    let (status, body) = simulate(&db, "alice", &order_id, "success").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already PAID"), "{body}");
}

#[actix_web::test]
async fn failed_payment() {
    let _ = env_logger::try_init().ok();
    let db = prepare_test_db().await;
    let game = seed_game(&db, "Celeste", 1999, 5).await;
    let order_id = place_order(&db, "alice", game.id, 1).await;

    let (status, callback) = simulate(&db, "alice", &order_id, "failure").await;
    assert_eq!(status, StatusCode::OK, "{callback}");
    let (status, body) = deliver(&db, &callback).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(order(&db, &order_id).await, (PaymentStatus::Failed, OrderStatusType::Processing));
    assert_eq!(stock_of(&db, game.id).await, 5);

    // A late success notification cannot revive a failed order
    let success = SimulatedGateway::default();
    let intent = db.fetch_order(&order_id).await.unwrap().unwrap().payment_intent_id.unwrap();
    let late = success.simulate_success(&intent, &order_id);
    let callback = json!({"header": "X-Payment-Signature", "signature": late.signature, "payload": late.payload});
    let (status, _) = deliver(&db, &callback).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order(&db, &order_id).await.0, PaymentStatus::Failed);
    assert_eq!(stock_of(&db, game.id).await, 5);
}

#[actix_web::test]
async fn oversold_orders_are_cancelled() {
    let _ = env_logger::try_init().ok();
    let db = prepare_test_db().await;
    let game = seed_game(&db, "Hades", 2500, 3).await;
    let first = place_order(&db, "alice", game.id, 2).await;
    let second = place_order(&db, "bob", game.id, 2).await;

    let (_, callback) = simulate(&db, "alice", &first, "success").await;
    let (status, _) = deliver(&db, &callback).await;
    assert_eq!(status, StatusCode::OK);
    let (_, callback) = simulate(&db, "bob", &second, "success").await;
    let (status, body) = deliver(&db, &callback).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    assert_eq!(order(&db, &first).await, (PaymentStatus::Paid, OrderStatusType::Confirmed));
    assert_eq!(order(&db, &second).await, (PaymentStatus::Failed, OrderStatusType::Cancelled));
    assert_eq!(stock_of(&db, game.id).await, 1);
}

#[actix_web::test]
async fn unverifiable_notifications_change_nothing() {
    let _ = env_logger::try_init().ok();
    let db = prepare_test_db().await;
    let game = seed_game(&db, "Hades", 2500, 3).await;
    let order_id = place_order(&db, "alice", game.id, 1).await;
    let (_, mut callback) = simulate(&db, "alice", &order_id, "success").await;

    callback["signature"] = json!("00".repeat(32));
    let (status, body) = deliver(&db, &callback).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Invalid payment notification"), "{body}");

    let req = TestRequest::post().uri("/webhooks/payments").set_payload(callback["payload"].as_str().unwrap().to_string());
    let (status, _) = call_public(req, payments_app(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/webhooks/payments")
        .insert_header(("X-Payment-Signature", "abcd"))
        .set_payload("this is not json");
    let (status, _) = call_public(req, payments_app(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(order(&db, &order_id).await, (PaymentStatus::Pending, OrderStatusType::Processing));
    assert_eq!(stock_of(&db, game.id).await, 3);
}

#[actix_web::test]
async fn only_the_owner_can_simulate() {
    let _ = env_logger::try_init().ok();
    let db = prepare_test_db().await;
    let game = seed_game(&db, "Hades", 2500, 3).await;
    let order_id = place_order(&db, "alice", game.id, 1).await;
    let (status, _) = simulate(&db, "bob", &order_id, "success").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let token = issue_token("root", Role::Admin);
    let req = TestRequest::post().uri(&format!("/payments/simulate/{order_id}")).insert_header(bearer(&token));
    let (status, _) = call(req, payments_app(db.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = simulate(&db, "alice", &OrderId::from("ord_missing"), "success").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn public_key() {
    let _ = env_logger::try_init().ok();
    let db = prepare_test_db().await;
    let req = TestRequest::get().uri("/payments/key");
    let (status, body) = call_public(req, payments_app(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), json!({"key": "rzp_test_dummy_key"}));
}
