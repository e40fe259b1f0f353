use crate::{
    db_types::{Game, GameId},
    traits::StoreError,
};

#[allow(async_fn_in_trait)]
pub trait InventoryManagement {
    /// Fetches every game in `ids` with a single query. Unknown ids are simply absent from the result.
    async fn fetch_games(&self, ids: &[GameId]) -> Result<Vec<Game>, StoreError>;

    async fn fetch_game(&self, id: GameId) -> Result<Option<Game>, StoreError>;

    /// Atomically decrements the stock of a game by `quantity`, provided at least that much is available.
    ///
    /// Returns the remaining stock if the decrement was applied, or `None` if the game has too little stock (or does
    /// not exist). Stock is never read and written in separate steps.
    async fn decrement_stock(&self, id: GameId, quantity: i64) -> Result<Option<i64>, StoreError>;
}
