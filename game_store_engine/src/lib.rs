//! Game Store Engine
//!
//! The order lifecycle and payment reconciliation core of the game store. It validates carts against live inventory,
//! issues payment requests, applies asynchronous payment outcomes, adjusts stock atomically and keeps game ratings in
//! line with their reviews.
//!
//! The library is divided into three main sections:
//! 1. Storage ([`traits`] and [`SqliteDatabase`]). Backends implement the traits; the data types they exchange live in
//!    [`db_types`]. You should not need to talk to the database directly. Use the public APIs instead.
//! 2. Payment providers ([`payments`]). Business logic depends only on the [`PaymentGateway`] trait. A Stripe client
//!    and a deterministic simulator implement it.
//! 3. The public APIs:
//!    * [`OrderFlowApi`] creates orders from carts and answers order queries.
//!    * [`WebhookApi`] verifies payment notifications and moves orders through their payment states.
//!    * [`InventoryApi`] is the stock ledger.
//!    * [`RatingApi`] and [`ReviewApi`] maintain reviews and the derived rating aggregate.
mod db;

pub mod db_types;
pub mod helpers;
pub mod payments;
mod gs_api;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{self, SqliteDatabase};
pub use db::traits;
pub use gs_api::{
    errors::{InventoryError, OrderFlowError, ReviewError, WebhookError},
    inventory_api::{InventoryApi, StockAdjustment},
    order_flow_api::OrderFlowApi,
    order_objects,
    rating_api::RatingApi,
    review_api::{GameReviews, ReviewApi},
    webhook_api::{WebhookApi, WebhookOutcome},
};
pub use payments::PaymentGateway;
pub use traits::{
    InventoryManagement,
    OrderManagement,
    PaymentGatewayDatabase,
    PaymentTransition,
    ReviewDatabase,
    ReviewManagement,
    StoreError,
};
