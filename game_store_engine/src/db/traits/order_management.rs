use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    traits::{OrderQueryFilter, Pagination, StoreError},
};

#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order and its line items atomically. The order starts as `PENDING` / `PROCESSING`.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Records the payment provider's intent id against the order.
    async fn attach_payment_intent(&self, order_id: &OrderId, intent_id: &str) -> Result<Order, StoreError>;

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    async fn fetch_order_by_intent_id(&self, intent_id: &str) -> Result<Option<Order>, StoreError>;

    /// Returns one page of orders matching the filter, newest first, and the total number of matches.
    async fn search_orders(
        &self,
        filter: OrderQueryFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Order>, i64), StoreError>;

    /// Overrides the fulfilment status of an order. Payment status is left untouched.
    async fn update_order_status(&self, order_id: &OrderId, status: OrderStatusType) -> Result<Order, StoreError>;
}
