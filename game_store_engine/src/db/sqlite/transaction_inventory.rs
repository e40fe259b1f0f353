//! [`InventoryManagement`] over a connection that is already inside a transaction.
//!
//! The payment confirmation runs the inventory ledger through this type, so every stock decrement for an order
//! commits or rolls back together with the order's status change.
use sqlx::SqliteConnection;
use tokio::sync::Mutex;

use super::games;
use crate::{
    db_types::{Game, GameId},
    traits::{InventoryManagement, StoreError},
};

pub struct TransactionInventory<'c> {
    conn: Mutex<&'c mut SqliteConnection>,
}

impl<'c> TransactionInventory<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn: Mutex::new(conn) }
    }
}

impl InventoryManagement for TransactionInventory<'_> {
    async fn fetch_games(&self, ids: &[GameId]) -> Result<Vec<Game>, StoreError> {
        let mut conn = self.conn.lock().await;
        let games = games::fetch_games(ids, &mut **conn).await?;
        Ok(games)
    }

    async fn fetch_game(&self, id: GameId) -> Result<Option<Game>, StoreError> {
        let mut conn = self.conn.lock().await;
        let game = games::fetch_game(id, &mut **conn).await?;
        Ok(game)
    }

    async fn decrement_stock(&self, id: GameId, quantity: i64) -> Result<Option<i64>, StoreError> {
        let mut conn = self.conn.lock().await;
        let remaining = games::decrement_stock(id, quantity, &mut **conn).await?;
        Ok(remaining)
    }
}
