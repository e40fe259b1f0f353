//! # Backend contracts
//!
//! The traits in this module are everything the engine APIs need from a storage backend. Business logic is written
//! against these traits only; [`crate::SqliteDatabase`] is the shipped implementation.
//!
//! * [`InventoryManagement`] reads games and applies the atomic conditional stock decrement.
//! * [`OrderManagement`] persists orders with their snapshotted line items and queries them.
//! * [`PaymentGatewayDatabase`] applies payment outcomes to an order and its inventory in a single transaction.
//! * [`ReviewManagement`] stores reviews and the rating aggregate derived from them.
mod data_objects;
mod errors;
mod inventory_management;
mod order_management;
mod payment_gateway_database;
mod review_management;

pub use data_objects::{OrderQueryFilter, PageInfo, Pagination, PaymentTransition, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub(crate) use errors::is_unique_violation;
pub use errors::StoreError;
pub use inventory_management::InventoryManagement;
pub use order_management::OrderManagement;
pub use payment_gateway_database::PaymentGatewayDatabase;
pub use review_management::{ReviewDatabase, ReviewManagement};
