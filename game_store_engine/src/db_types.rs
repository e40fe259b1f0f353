use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use gs_common::MinorUnits;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::helpers::random_hex;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------        GameId         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct GameId(pub i64);

impl From<i64> for GameId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for GameId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self).map_err(|_| ConversionError(format!("{s} is not a valid game id")))
    }
}

impl Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl GameId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Generates a fresh order id of the form `ord_<24 hex chars>`.
    pub fn random() -> Self {
        Self(format!("ord_{}", random_hex(12)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConversionError("Order id cannot be empty".into()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------    PaymentStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    /// The order exists, but the payment provider has not reported an outcome yet.
    Pending,
    /// The provider confirmed the payment and stock has been decremented.
    Paid,
    /// The provider reported a failure, or the order could not be fulfilled after payment.
    Failed,
}

impl PaymentStatus {
    pub fn is_final(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Paid => write!(f, "PAID"),
            PaymentStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            _ => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// Newly created, awaiting payment or fulfilment.
    Processing,
    /// Payment has been captured and stock allocated.
    Confirmed,
    Shipped,
    Delivered,
    /// The order will not be fulfilled.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Processing => write!(f, "PROCESSING"),
            OrderStatusType::Confirmed => write!(f, "CONFIRMED"),
            OrderStatusType::Shipped => write!(f, "SHIPPED"),
            OrderStatusType::Delivered => write!(f, "DELIVERED"),
            OrderStatusType::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PROCESSING" => Ok(Self::Processing),
            "CONFIRMED" => Ok(Self::Confirmed),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------         Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------         Game          ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub title: String,
    pub price: MinorUnits,
    pub currency: String,
    pub stock: i64,
    pub rating_avg: f64,
    pub rating_count: i64,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Catalog entry used by seeding and tests. Catalog management proper lives outside this crate.
#[derive(Debug, Clone)]
pub struct NewGame {
    pub title: String,
    pub price: MinorUnits,
    pub currency: String,
    pub stock: i64,
    pub cover_image: Option<String>,
}

impl NewGame {
    pub fn new<S: Into<String>>(title: S, price: MinorUnits, stock: i64) -> Self {
        Self {
            title: title.into(),
            price,
            currency: gs_common::DEFAULT_CURRENCY_CODE.to_string(),
            stock,
            cover_image: None,
        }
    }

    pub fn with_cover_image<S: Into<String>>(mut self, url: S) -> Self {
        self.cover_image = Some(url.into());
        self
    }
}

//--------------------------------------       OrderItem       ---------------------------------------------------------
/// A line item as it was at checkout. `title` and `unit_price` are snapshots and never follow later catalog edits.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub game_id: GameId,
    pub title: String,
    pub unit_price: MinorUnits,
    pub quantity: i64,
}

impl OrderItem {
    /// `unit_price × quantity`, or `None` if it overflows.
    pub fn line_total(&self) -> Option<MinorUnits> {
        self.unit_price.checked_mul(self.quantity)
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("The order total is too large to represent (at game {0})")]
pub struct OrderTotalOverflow(pub GameId);

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub user_id: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    items: Vec<OrderItem>,
    subtotal: MinorUnits,
}

impl NewOrder {
    /// Builds a new order. The subtotal is always derived from the line items, so it cannot drift from the
    /// snapshot prices. Fails if any line total or the subtotal cannot be represented.
    pub fn new<S: Into<String>>(
        order_id: OrderId,
        user_id: S,
        items: Vec<OrderItem>,
        currency: S,
    ) -> Result<Self, OrderTotalOverflow> {
        let mut subtotal = MinorUnits::default();
        for item in &items {
            subtotal = item
                .line_total()
                .and_then(|line| subtotal.checked_add(line))
                .ok_or(OrderTotalOverflow(item.game_id))?;
        }
        Ok(Self { order_id, user_id: user_id.into(), currency: currency.into(), created_at: Utc::now(), items, subtotal })
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn subtotal(&self) -> MinorUnits {
        self.subtotal
    }

    /// No tax or shipping is charged, so the total equals the subtotal.
    pub fn total(&self) -> MinorUnits {
        self.subtotal
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub(crate) struct OrderRow {
    pub id: i64,
    pub order_id: OrderId,
    pub user_id: String,
    pub subtotal: MinorUnits,
    pub total: MinorUnits,
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatusType,
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub subtotal: MinorUnits,
    pub total: MinorUnits,
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatusType,
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub(crate) fn from_row(row: OrderRow, items: Vec<OrderItem>) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            user_id: row.user_id,
            items,
            subtotal: row.subtotal,
            total: row.total,
            currency: row.currency,
            payment_status: row.payment_status,
            order_status: row.order_status,
            payment_intent_id: row.payment_intent_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

//--------------------------------------        Review         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub game_id: GameId,
    pub user_id: String,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const MAX_REVIEW_COMMENT_LENGTH: usize = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

impl NewReview {
    pub fn new(rating: i64, comment: Option<&str>) -> Self {
        Self { rating, comment: comment.map(String::from) }
    }

    /// Checks the rating range and comment length, trimming the comment and dropping it if blank.
    pub fn validated(self) -> Result<Self, String> {
        if !(1..=5).contains(&self.rating) {
            return Err(format!("Rating must be between 1 and 5, got {}", self.rating));
        }
        let comment = self.comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        if let Some(c) = &comment {
            if c.chars().count() > MAX_REVIEW_COMMENT_LENGTH {
                return Err(format!("Comment cannot exceed {MAX_REVIEW_COMMENT_LENGTH} characters"));
            }
        }
        Ok(Self { rating: self.rating, comment })
    }
}

//--------------------------------------        Rating         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rating {
    pub avg: f64,
    pub count: i64,
}
