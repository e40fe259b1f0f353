//! `SqliteDatabase` is the concrete storage backend of the game store engine.
//!
//! It implements all the traits defined in the [`crate::traits`] module on top of the plain query functions in
//! [`super::games`], [`super::orders`] and [`super::reviews`].
use std::fmt::Debug;

use gs_common::MinorUnits;
use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::{db_url, games, new_pool, orders, reviews, TransactionInventory};
use crate::{
    db_types::{
        Game,
        GameId,
        NewGame,
        NewOrder,
        NewReview,
        Order,
        OrderId,
        OrderStatusType,
        PaymentStatus,
        Rating,
        Review,
    },
    gs_api::inventory_api::InventoryApi,
    traits::{
        is_unique_violation,
        InventoryManagement,
        OrderManagement,
        OrderQueryFilter,
        Pagination,
        PaymentGatewayDatabase,
        PaymentTransition,
        ReviewManagement,
        StoreError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `GSS_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date with the migrations embedded in this crate.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Adds a game to the catalog. Catalog management lives outside the engine; this is used for seeding and tests.
    pub async fn insert_game(&self, game: NewGame) -> Result<Game, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let game = games::insert_game(game, &mut conn).await?;
        debug!("🗃️ Game #{} ({}) added to the catalog", game.id, game.title);
        Ok(game)
    }

    /// Re-prices a game. Orders already placed keep their snapshot prices.
    pub async fn set_game_price(&self, id: GameId, price: MinorUnits) -> Result<Game, StoreError> {
        let mut conn = self.pool.acquire().await?;
        games::update_price(id, price, &mut conn).await?.ok_or(StoreError::GameNotFound(id))
    }

    /// Marks a pending order as failed and cancelled after a captured payment could not be fulfilled.
    async fn cancel_oversold(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let changed =
            orders::transition_pending(order_id, PaymentStatus::Failed, Some(OrderStatusType::Cancelled), &mut tx)
                .await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(if changed { order } else { None })
    }

    async fn already_final(&self, order_id: &OrderId) -> Result<PaymentTransition, StoreError> {
        let order = self.fetch_order(order_id).await?.ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        trace!("🗃️ Order {order_id} is already {}; nothing to do", order.payment_status);
        Ok(PaymentTransition::AlreadyFinal(order))
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn fetch_games(&self, ids: &[GameId]) -> Result<Vec<Game>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let games = games::fetch_games(ids, &mut conn).await?;
        Ok(games)
    }

    async fn fetch_game(&self, id: GameId) -> Result<Option<Game>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let game = games::fetch_game(id, &mut conn).await?;
        Ok(game)
    }

    async fn decrement_stock(&self, id: GameId, quantity: i64) -> Result<Option<i64>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let remaining = games::decrement_stock(id, quantity, &mut conn).await?;
        Ok(remaining)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn attach_payment_intent(&self, order_id: &OrderId, intent_id: &str) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::set_payment_intent(order_id, intent_id, &mut conn)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_intent_id(&self, intent_id: &str) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_intent_id(intent_id, &mut conn).await?;
        Ok(order)
    }

    async fn search_orders(
        &self,
        filter: OrderQueryFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Order>, i64), StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::search_orders(filter, pagination, &mut conn).await?;
        Ok(result)
    }

    async fn update_order_status(&self, order_id: &OrderId, status: OrderStatusType) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order_status(order_id, status, &mut conn)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// The transaction opens with the conditional status update, so it takes SQLite's write lock before reading
    /// anything. Concurrent confirmations queue on the busy timeout rather than failing on a lock upgrade.
    async fn confirm_payment(&self, order_id: &OrderId) -> Result<PaymentTransition, StoreError> {
        let mut tx = self.pool.begin().await?;
        let claimed =
            orders::transition_pending(order_id, PaymentStatus::Paid, Some(OrderStatusType::Confirmed), &mut tx)
                .await?;
        if !claimed {
            tx.rollback().await?;
            return self.already_final(order_id).await;
        }
        let items = orders::fetch_items(order_id, &mut tx).await?;
        let shortfall = InventoryApi::new(TransactionInventory::new(&mut tx)).allocate(&items).await?;
        if let Some(game_id) = shortfall {
            tx.rollback().await?;
            warn!("🗃️ Game #{game_id} cannot cover order {order_id}. Rolling back the confirmation.");
            return match self.cancel_oversold(order_id).await? {
                Some(order) => Ok(PaymentTransition::Oversold { order, game_id }),
                None => self.already_final(order_id).await,
            };
        }
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} is paid and {} line items have been allocated", items.len());
        Ok(PaymentTransition::Applied(order))
    }

    async fn fail_payment(&self, order_id: &OrderId) -> Result<PaymentTransition, StoreError> {
        let mut tx = self.pool.begin().await?;
        let changed = orders::transition_pending(order_id, PaymentStatus::Failed, None, &mut tx).await?;
        if !changed {
            tx.rollback().await?;
            return self.already_final(order_id).await;
        }
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} payment marked as failed");
        Ok(PaymentTransition::Applied(order))
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl ReviewManagement for SqliteDatabase {
    async fn insert_review(&self, game_id: GameId, user_id: &str, review: NewReview) -> Result<Review, StoreError> {
        let mut conn = self.pool.acquire().await?;
        reviews::insert_review(game_id, user_id, review, &mut conn).await.map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateReview(game_id)
            } else {
                StoreError::from(e)
            }
        })
    }

    async fn delete_review(&self, game_id: GameId, user_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = reviews::delete_review(game_id, user_id, &mut conn).await?;
        Ok(deleted)
    }

    async fn fetch_reviews_for_game(
        &self,
        game_id: GameId,
        pagination: Pagination,
    ) -> Result<(Vec<Review>, i64), StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = reviews::fetch_reviews_for_game(game_id, pagination, &mut conn).await?;
        Ok(result)
    }

    async fn recompute_game_rating(&self, game_id: GameId) -> Result<Rating, StoreError> {
        let mut conn = self.pool.acquire().await?;
        games::recompute_rating(game_id, &mut conn).await?.ok_or(StoreError::GameNotFound(game_id))
    }
}
