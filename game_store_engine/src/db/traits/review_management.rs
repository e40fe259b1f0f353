use crate::{
    db_types::{GameId, NewReview, Rating, Review},
    traits::{InventoryManagement, Pagination, StoreError},
};

#[allow(async_fn_in_trait)]
pub trait ReviewManagement {
    /// Stores a review. A second review by the same user for the same game yields [`StoreError::DuplicateReview`].
    async fn insert_review(&self, game_id: GameId, user_id: &str, review: NewReview) -> Result<Review, StoreError>;

    /// Deletes the user's review of the game, returning `false` if there was none.
    async fn delete_review(&self, game_id: GameId, user_id: &str) -> Result<bool, StoreError>;

    /// Returns one page of reviews for the game, newest first, and the total number of reviews.
    async fn fetch_reviews_for_game(
        &self,
        game_id: GameId,
        pagination: Pagination,
    ) -> Result<(Vec<Review>, i64), StoreError>;

    /// Derives the game's rating aggregate from its current reviews and stores it, as one atomic step. The average is
    /// rounded to one decimal place; a game without reviews gets `0.0` / `0`.
    async fn recompute_game_rating(&self, game_id: GameId) -> Result<Rating, StoreError>;
}

/// Everything the review write path needs from a backend: reviews, the game catalog, and a cheap handle to share with
/// the rating aggregator.
pub trait ReviewDatabase: ReviewManagement + InventoryManagement + Clone {}

impl<T> ReviewDatabase for T where T: ReviewManagement + InventoryManagement + Clone {}
