use std::{collections::HashMap, fmt::Debug};

use gs_common::{helpers::normalize_currency, DEFAULT_CURRENCY_CODE};
use log::*;

use crate::{
    db_types::{Game, GameId, NewOrder, Order, OrderId, OrderItem, OrderStatusType, Role},
    gs_api::{
        errors::OrderFlowError,
        order_objects::{CartItem, CheckoutResponse, DisplayItem, NewOrderRequest, OrderDisplay, OrderPage},
    },
    payments::{IntentMetadata, IntentRequest, PaymentGateway},
    traits::{InventoryManagement, OrderManagement, OrderQueryFilter, PageInfo, Pagination, PaymentGatewayDatabase},
};

/// `OrderFlowApi` turns a customer's cart into a priced order and a payment intent, and answers order queries.
///
/// Stock is checked at checkout only to reject carts that obviously cannot be filled. No stock is reserved; the
/// conditional decrement applied when the payment is confirmed is the authority on whether an order can be filled.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    default_currency: String,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({})", self.default_currency)
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G) -> Self {
        Self { db, gateway, default_currency: DEFAULT_CURRENCY_CODE.to_string() }
    }

    pub fn with_default_currency(mut self, currency: &str) -> Self {
        self.default_currency = normalize_currency(Some(currency), DEFAULT_CURRENCY_CODE);
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

/// Rejects empty carts and non-positive quantities, and merges repeated games into one line.
fn normalize_cart(items: &[CartItem]) -> Result<Vec<CartItem>, OrderFlowError> {
    if items.is_empty() {
        return Err(OrderFlowError::ValidationError("The cart is empty".into()));
    }
    let mut merged: Vec<CartItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.qty < 1 {
            return Err(OrderFlowError::ValidationError(format!(
                "Quantity for game {} must be at least 1, got {}",
                item.game_id, item.qty
            )));
        }
        match merged.iter_mut().find(|m| m.game_id == item.game_id) {
            Some(existing) => {
                existing.qty = existing.qty.checked_add(item.qty).ok_or_else(|| {
                    OrderFlowError::ValidationError(format!("Quantity for game {} is too large", item.game_id))
                })?
            },
            None => merged.push(item.clone()),
        }
    }
    Ok(merged)
}

impl<B, G> OrderFlowApi<B, G>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    /// Validates the cart against live inventory, snapshots prices into a new `PENDING` order and requests a payment
    /// intent for it.
    ///
    /// All referenced games are fetched in one query. Nothing is persisted if any game is missing or short of stock.
    /// If the provider call fails, the order remains `PENDING` without an intent id and
    /// [`OrderFlowError::PaymentProvider`] is returned.
    pub async fn create_order(
        &self,
        user_id: &str,
        request: NewOrderRequest,
    ) -> Result<CheckoutResponse, OrderFlowError> {
        let cart = normalize_cart(&request.items)?;
        let ids = cart.iter().map(|i| i.game_id).collect::<Vec<GameId>>();
        let games = self.games_by_id(&ids).await?;
        let mut items = Vec::with_capacity(cart.len());
        for CartItem { game_id, qty } in cart {
            let game = games.get(&game_id).ok_or(OrderFlowError::GameNotFound(game_id))?;
            if game.stock < qty {
                debug!("🔄️ Rejecting cart for {user_id}: '{}' has {} in stock, {qty} requested", game.title, game.stock);
                return Err(OrderFlowError::InsufficientStock {
                    title: game.title.clone(),
                    available: game.stock,
                    requested: qty,
                });
            }
            items.push(OrderItem { game_id, title: game.title.clone(), unit_price: game.price, quantity: qty });
        }
        let currency = normalize_currency(request.currency.as_deref(), &self.default_currency);
        let new_order = NewOrder::new(OrderId::random(), user_id.to_string(), items, currency)
            .map_err(|e| OrderFlowError::ValidationError(e.to_string()))?;
        let order = self.db.insert_order(new_order).await?;
        info!("🔄️ Order {} created for {user_id}: {} {}", order.order_id, order.total, order.currency);

        let intent_request = IntentRequest {
            amount: order.total,
            currency: order.currency.clone(),
            metadata: IntentMetadata { order_id: order.order_id.clone(), user_id: user_id.to_string() },
        };
        let intent = self.gateway.create_intent(intent_request).await.map_err(|e| {
            error!("🔄️ Could not create a payment intent for order {}. It stays PENDING. {e}", order.order_id);
            OrderFlowError::PaymentProvider(e)
        })?;
        self.db.attach_payment_intent(&order.order_id, &intent.id).await?;
        debug!("🔄️ Order {} is awaiting payment on intent {}", order.order_id, intent.id);
        Ok(CheckoutResponse {
            order_id: order.order_id,
            client_handle: intent.client_handle,
            amount: order.total,
            currency: order.currency,
        })
    }

    async fn games_by_id(&self, ids: &[GameId]) -> Result<HashMap<GameId, Game>, OrderFlowError> {
        let games = self.db.fetch_games(ids).await?;
        Ok(games.into_iter().map(|g| (g.id, g)).collect())
    }

    /// Fetches an order for its owner or an admin, with line items decorated with the games' current catalog details.
    pub async fn order_for_user(
        &self,
        order_id: &OrderId,
        user_id: &str,
        role: Role,
    ) -> Result<OrderDisplay, OrderFlowError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        if role != Role::Admin && !order.is_owned_by(user_id) {
            warn!("🔄️ {user_id} tried to read order {order_id}, which belongs to someone else");
            return Err(OrderFlowError::Forbidden(order_id.clone()));
        }
        let ids = order.items.iter().map(|i| i.game_id).collect::<Vec<GameId>>();
        let games = self.games_by_id(&ids).await?;
        let items = order
            .items
            .iter()
            .map(|item| {
                let game = games.get(&item.game_id);
                DisplayItem {
                    item: item.clone(),
                    current_title: game.map(|g| g.title.clone()),
                    cover_image: game.and_then(|g| g.cover_image.clone()),
                }
            })
            .collect();
        Ok(OrderDisplay::new(order, items))
    }

    pub async fn orders_for_user(&self, user_id: &str, pagination: Pagination) -> Result<OrderPage, OrderFlowError> {
        self.search_orders(OrderQueryFilter::default().with_user_id(user_id), pagination).await
    }

    pub async fn search_orders(
        &self,
        filter: OrderQueryFilter,
        pagination: Pagination,
    ) -> Result<OrderPage, OrderFlowError> {
        let (orders, total) = self.db.search_orders(filter, pagination).await?;
        Ok(OrderPage { orders, pagination: PageInfo::new(pagination, total) })
    }

    /// Admin override of the fulfilment status. Payment status is never changed here.
    pub async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
    ) -> Result<Order, OrderFlowError> {
        let order = self.db.update_order_status(order_id, status).await?;
        info!("🔄️ Order {order_id} status set to {status} (payment is {})", order.payment_status);
        Ok(order)
    }
}
