use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{GameId, OrderItem},
    gs_api::errors::InventoryError,
    traits::InventoryManagement,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAdjustment {
    Applied { remaining: i64 },
    Insufficient,
}

/// The inventory ledger. Stock only ever moves through a single conditional decrement, so it can never go negative
/// and concurrent callers cannot both take the last unit.
pub struct InventoryApi<B> {
    db: B,
}

impl<B> Debug for InventoryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InventoryApi")
    }
}

impl<B> InventoryApi<B>
where B: InventoryManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Takes `quantity` units of a game out of stock, if that many are available.
    pub async fn decrement(&self, game_id: GameId, quantity: i64) -> Result<StockAdjustment, InventoryError> {
        if quantity < 1 {
            return Err(InventoryError::ValidationError(format!("Quantity must be at least 1, got {quantity}")));
        }
        match self.db.decrement_stock(game_id, quantity).await? {
            Some(remaining) => {
                debug!("📦️ Game #{game_id}: {quantity} units taken, {remaining} left");
                Ok(StockAdjustment::Applied { remaining })
            },
            None => {
                // The conditional update cannot tell a missing game from an empty shelf.
                if self.db.fetch_game(game_id).await?.is_none() {
                    return Err(InventoryError::GameNotFound(game_id));
                }
                debug!("📦️ Game #{game_id}: not enough stock for {quantity} units");
                Ok(StockAdjustment::Insufficient)
            },
        }
    }

    /// Takes stock for each line of an order, in order, stopping at the first line that cannot be covered.
    ///
    /// Returns the game that fell short, if any. Lines taken before the shortfall stay taken; callers run this on a
    /// transactional backend and roll back when a shortfall is reported.
    pub async fn allocate(&self, items: &[OrderItem]) -> Result<Option<GameId>, InventoryError> {
        for item in items {
            match self.decrement(item.game_id, item.quantity).await {
                Ok(StockAdjustment::Applied { .. }) => {},
                Ok(StockAdjustment::Insufficient) | Err(InventoryError::GameNotFound(_)) => {
                    return Ok(Some(item.game_id))
                },
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    pub async fn stock(&self, game_id: GameId) -> Result<i64, InventoryError> {
        let game = self.db.fetch_game(game_id).await?.ok_or(InventoryError::GameNotFound(game_id))?;
        Ok(game.stock)
    }
}
