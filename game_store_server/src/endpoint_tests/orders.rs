use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{DateTime, Duration, TimeZone, Utc};
use game_store_engine::{
    db_types::{Game, GameId, NewOrder, Order, OrderId, OrderItem, OrderStatusType, PaymentStatus, Role},
    payments::SimulatedGateway,
    OrderFlowApi,
    PaymentGateway,
};
use gs_common::MinorUnits;
use log::*;
use serde_json::json;

use super::{
    helpers::{bearer, call, issue_token, issue_token_with_secret, json},
    mocks::{MockGameStore, UnreachableGateway},
};
use crate::routes::{AdminOrdersRoute, CreateOrderRoute, MyOrdersRoute, OrderByIdRoute, UpdateOrderStatusRoute};

fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn game(id: i64, title: &str, price: i64, stock: i64) -> Game {
    Game {
        id: GameId(id),
        title: title.to_string(),
        price: MinorUnits::from(price),
        currency: "inr".to_string(),
        stock,
        rating_avg: 0.0,
        rating_count: 0,
        cover_image: Some(format!("https://cdn.example.com/{id}.png")),
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

fn order_from(new_order: &NewOrder) -> Order {
    Order {
        id: 1,
        order_id: new_order.order_id.clone(),
        user_id: new_order.user_id.clone(),
        items: new_order.items().to_vec(),
        subtotal: new_order.subtotal(),
        total: new_order.total(),
        currency: new_order.currency.clone(),
        payment_status: PaymentStatus::Pending,
        order_status: OrderStatusType::Processing,
        payment_intent_id: None,
        created_at: new_order.created_at,
        updated_at: new_order.created_at,
    }
}

fn stored_order(order_id: &str, user_id: &str) -> Order {
    let item =
        OrderItem { game_id: GameId(1), title: "Hades".to_string(), unit_price: MinorUnits::from(2500), quantity: 2 };
    Order {
        id: 7,
        order_id: OrderId::from(order_id),
        user_id: user_id.to_string(),
        items: vec![item],
        subtotal: MinorUnits::from(5000),
        total: MinorUnits::from(5000),
        currency: "inr".to_string(),
        payment_status: PaymentStatus::Pending,
        order_status: OrderStatusType::Processing,
        payment_intent_id: Some("order_abc".to_string()),
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

fn configure<G: PaymentGateway + 'static>(db: MockGameStore, gateway: G) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderFlowApi::new(db, gateway);
        cfg.service(CreateOrderRoute::<MockGameStore, G>::new())
            .service(MyOrdersRoute::<MockGameStore, G>::new())
            .service(OrderByIdRoute::<MockGameStore, G>::new())
            .service(AdminOrdersRoute::<MockGameStore, G>::new())
            .service(UpdateOrderStatusRoute::<MockGameStore, G>::new())
            .app_data(web::Data::new(api));
    }
}

fn orders_app(db: MockGameStore) -> impl FnOnce(&mut ServiceConfig) {
    configure(db, SimulatedGateway::default())
}

#[actix_web::test]
async fn requests_without_a_token_are_rejected() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/orders/me");
    let (status, body) = call(req, orders_app(MockGameStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body), json!({"error": "Authentication Error. No access token was provided."}));
}

#[actix_web::test]
async fn forged_and_expired_tokens_are_rejected() {
    let _ = env_logger::try_init().ok();
    let forged = issue_token_with_secret("not-the-server-secret", "alice", Role::Admin, Utc::now() + Duration::hours(1));
    let req = TestRequest::get().uri("/orders/me").insert_header(bearer(&forged));
    let (status, body) = call(req, orders_app(MockGameStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("The access token is invalid"), "{body}");

    let expired = issue_token_with_secret(
        super::helpers::TEST_JWT_SECRET,
        "alice",
        Role::User,
        Utc::now() - Duration::hours(2),
    );
    let req = TestRequest::get().uri("/orders/me").insert_header(bearer(&expired));
    let (status, _) = call(req, orders_app(MockGameStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = TestRequest::get().uri("/orders/me").insert_header(("Authorization", "Token abc"));
    let (status, _) = call(req, orders_app(MockGameStore::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn create_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockGameStore::new();
    db.expect_fetch_games()
        .withf(|ids| ids.len() == 1 && ids[0] == GameId(1))
        .times(1)
        .returning(|_| Ok(vec![game(1, "Hades", 2500, 3)]));
    db.expect_insert_order()
        .withf(|o| o.user_id == "alice" && o.total() == MinorUnits::from(5000) && o.currency == "inr")
        .times(1)
        .returning(|o| Ok(order_from(&o)));
    db.expect_attach_payment_intent().times(1).returning(|id, intent| {
        let mut order = stored_order(id.as_str(), "alice");
        order.payment_intent_id = Some(intent.to_string());
        Ok(order)
    });
    let token = issue_token("alice", Role::User);
    // Client-supplied prices are ignored
    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(bearer(&token))
        .set_json(json!({"items": [{"gameId": 1, "qty": 2, "price": 1}]}));
    let (status, body) = call(req, orders_app(db)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let checkout = json(&body);
    debug!("Checkout response: {checkout}");
    assert_eq!(checkout["amount"], 5000);
    assert_eq!(checkout["currency"], "inr");
    assert!(checkout["orderId"].as_str().unwrap().starts_with("ord_"));
    assert!(checkout["providerOrderId"].as_str().unwrap().starts_with("order_"));
}

#[actix_web::test]
async fn insufficient_stock_creates_nothing() {
    let _ = env_logger::try_init().ok();
    let mut db = MockGameStore::new();
    db.expect_fetch_games().returning(|_| Ok(vec![game(1, "Hades", 2500, 1)]));
    db.expect_insert_order().never();
    db.expect_attach_payment_intent().never();
    let token = issue_token("alice", Role::User);
    let req =
        TestRequest::post().uri("/orders").insert_header(bearer(&token)).set_json(json!({"items": [{"gameId": 1, "qty": 2}]}));
    let (status, body) = call(req, orders_app(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body), json!({"error": "Not enough stock for 'Hades': 1 available, 2 requested"}));
}

#[actix_web::test]
async fn unknown_games_and_bad_carts() {
    let _ = env_logger::try_init().ok();
    let mut db = MockGameStore::new();
    db.expect_fetch_games().returning(|_| Ok(vec![]));
    db.expect_insert_order().never();
    let token = issue_token("alice", Role::User);
    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(bearer(&token))
        .set_json(json!({"items": [{"gameId": 42, "qty": 1}]}));
    let (status, body) = call(req, orders_app(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body), json!({"error": "Game 42 does not exist"}));

    let req = TestRequest::post().uri("/orders").insert_header(bearer(&token)).set_json(json!({"items": []}));
    let (status, body) = call(req, orders_app(MockGameStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body), json!({"error": "Invalid order: The cart is empty"}));

    let req = TestRequest::post()
        .uri("/orders")
        .insert_header(bearer(&token))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(r#"{"items": 5}"#);
    let (status, body) = call(req, orders_app(MockGameStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Invalid request body"), "{body}");
}

#[actix_web::test]
async fn provider_outage_is_a_bad_gateway() {
    let _ = env_logger::try_init().ok();
    let mut db = MockGameStore::new();
    db.expect_fetch_games().returning(|_| Ok(vec![game(1, "Hades", 2500, 3)]));
    db.expect_insert_order().times(1).returning(|o| Ok(order_from(&o)));
    db.expect_attach_payment_intent().never();
    let token = issue_token("alice", Role::User);
    let req =
        TestRequest::post().uri("/orders").insert_header(bearer(&token)).set_json(json!({"items": [{"gameId": 1, "qty": 1}]}));
    let (status, body) = call(req, configure(db, UnreachableGateway)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("payment provider"), "{body}");
}

#[actix_web::test]
async fn orders_are_private_to_their_owner() {
    let _ = env_logger::try_init().ok();
    let mock = || {
        let mut db = MockGameStore::new();
        db.expect_fetch_order()
            .withf(|id| id.as_str() == "ord_1")
            .returning(|_| Ok(Some(stored_order("ord_1", "alice"))));
        db.expect_fetch_games().returning(|_| Ok(vec![game(1, "Hades II", 3000, 3)]));
        db
    };

    let token = issue_token("bob", Role::User);
    let req = TestRequest::get().uri("/orders/ord_1").insert_header(bearer(&token));
    let (status, body) = call(req, orders_app(mock())).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let token = issue_token("alice", Role::User);
    let req = TestRequest::get().uri("/orders/ord_1").insert_header(bearer(&token));
    let (status, body) = call(req, orders_app(mock())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order = json(&body);
    assert_eq!(order["orderId"], "ord_1");
    assert_eq!(order["paymentStatus"], "PENDING");
    assert_eq!(order["items"][0]["title"], "Hades");
    assert_eq!(order["items"][0]["unitPrice"], 2500);
    assert_eq!(order["items"][0]["currentTitle"], "Hades II");

    let token = issue_token("root", Role::Admin);
    let req = TestRequest::get().uri("/orders/ord_1").insert_header(bearer(&token));
    let (status, _) = call(req, orders_app(mock())).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn missing_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockGameStore::new();
    db.expect_fetch_order().returning(|_| Ok(None));
    let token = issue_token("alice", Role::User);
    let req = TestRequest::get().uri("/orders/ord_nope").insert_header(bearer(&token));
    let (status, body) = call(req, orders_app(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body), json!({"error": "Order ord_nope does not exist"}));
}

#[actix_web::test]
async fn my_orders() {
    let _ = env_logger::try_init().ok();
    let mut db = MockGameStore::new();
    db.expect_search_orders()
        .withf(|filter, page| {
            filter.user_id.as_deref() == Some("alice") && filter.payment_status.is_none() && page.page == 1
        })
        .times(1)
        .returning(|_, _| Ok((vec![stored_order("ord_1", "alice")], 1)));
    let token = issue_token("alice", Role::User);
    let req = TestRequest::get().uri("/orders/me").insert_header(bearer(&token));
    let (status, body) = call(req, orders_app(db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let page = json(&body);
    assert_eq!(page["orders"].as_array().unwrap().len(), 1);
    assert_eq!(page["pagination"], json!({"current": 1, "pages": 1, "total": 1, "limit": 10}));
}

#[actix_web::test]
async fn admin_order_search() {
    let _ = env_logger::try_init().ok();
    let token = issue_token("alice", Role::User);
    let req = TestRequest::get().uri("/admin/orders").insert_header(bearer(&token));
    let (status, body) = call(req, orders_app(MockGameStore::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let mut db = MockGameStore::new();
    db.expect_search_orders()
        .withf(|filter, page| {
            filter.user_id.is_none() &&
                filter.payment_status == Some(PaymentStatus::Paid) &&
                page.page == 2 &&
                page.limit == 5
        })
        .times(1)
        .returning(|_, _| Ok((vec![stored_order("ord_6", "bob")], 6)));
    let token = issue_token("root", Role::Admin);
    let req = TestRequest::get().uri("/admin/orders?status=paid&page=2&limit=5").insert_header(bearer(&token));
    let (status, body) = call(req, orders_app(db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["pagination"], json!({"current": 2, "pages": 2, "total": 6, "limit": 5}));

    let req = TestRequest::get().uri("/admin/orders?status=refunded").insert_header(bearer(&token));
    let (status, body) = call(req, orders_app(MockGameStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().contains("Invalid payment status: refunded"), "{body}");
}

#[actix_web::test]
async fn admin_status_override() {
    let _ = env_logger::try_init().ok();
    let mut db = MockGameStore::new();
    db.expect_update_order_status()
        .withf(|id, status| id.as_str() == "ord_1" && *status == OrderStatusType::Shipped)
        .times(1)
        .returning(|id, status| {
            let mut order = stored_order(id.as_str(), "alice");
            order.payment_status = PaymentStatus::Paid;
            order.order_status = status;
            Ok(order)
        });
    let token = issue_token("root", Role::Admin);
    let req = TestRequest::patch()
        .uri("/admin/orders/ord_1/status")
        .insert_header(bearer(&token))
        .set_json(json!({"orderStatus": "SHIPPED"}));
    let (status, body) = call(req, orders_app(db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order = json(&body);
    assert_eq!(order["orderStatus"], "SHIPPED");
    assert_eq!(order["paymentStatus"], "PAID");

    let req = TestRequest::patch()
        .uri("/admin/orders/ord_1/status")
        .insert_header(bearer(&token))
        .set_json(json!({"orderStatus": "LOST"}));
    let (status, _) = call(req, orders_app(MockGameStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let token = issue_token("alice", Role::User);
    let req = TestRequest::patch()
        .uri("/admin/orders/ord_1/status")
        .insert_header(bearer(&token))
        .set_json(json!({"orderStatus": "DELIVERED"}));
    let (status, _) = call(req, orders_app(MockGameStore::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
