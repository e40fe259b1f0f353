use crate::{
    db_types::OrderId,
    traits::{InventoryManagement, OrderManagement, PaymentTransition, StoreError},
};

/// The highest level of behaviour for backends: applying verified payment outcomes.
///
/// Both methods only act on orders whose payment status is still `PENDING`, which makes them safe to call again for a
/// redelivered provider notification.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: OrderManagement + InventoryManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// In a single transaction, marks the order `PAID` / `CONFIRMED` and decrements stock for every line item.
    ///
    /// If any line item cannot be covered, the whole transaction is rolled back and the order is marked
    /// `FAILED` / `CANCELLED` instead ([`PaymentTransition::Oversold`]).
    async fn confirm_payment(&self, order_id: &OrderId) -> Result<PaymentTransition, StoreError>;

    /// Marks a pending order `FAILED`. Inventory is not touched.
    async fn fail_payment(&self, order_id: &OrderId) -> Result<PaymentTransition, StoreError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}
