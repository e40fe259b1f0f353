use chrono::{DateTime, Utc};
use gs_common::MinorUnits;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{GameId, Order, OrderId, OrderItem, OrderStatusType, PaymentStatus},
    payments::ClientHandle,
    traits::PageInfo,
};
pub use crate::traits::OrderQueryFilter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub game_id: GameId,
    pub qty: i64,
}

impl CartItem {
    pub fn new(game_id: i64, qty: i64) -> Self {
        Self { game_id: GameId(game_id), qty }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl NewOrderRequest {
    pub fn new(items: Vec<CartItem>) -> Self {
        Self { items, currency: None }
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = Some(currency.into());
        self
    }
}

/// What the client needs to pay for a freshly created order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order_id: OrderId,
    #[serde(flatten)]
    pub client_handle: ClientHandle,
    pub amount: MinorUnits,
    pub currency: String,
}

/// A line item decorated with the game's current catalog details. Prices remain the checkout snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayItem {
    #[serde(flatten)]
    pub item: OrderItem,
    pub current_title: Option<String>,
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDisplay {
    pub order_id: OrderId,
    pub user_id: String,
    pub items: Vec<DisplayItem>,
    pub subtotal: MinorUnits,
    pub total: MinorUnits,
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatusType,
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderDisplay {
    pub fn new(order: Order, items: Vec<DisplayItem>) -> Self {
        Self {
            order_id: order.order_id,
            user_id: order.user_id,
            items,
            subtotal: order.subtotal,
            total: order.total,
            currency: order.currency,
            payment_status: order.payment_status,
            order_status: order.order_status,
            payment_intent_id: order.payment_intent_id,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub pagination: PageInfo,
}
