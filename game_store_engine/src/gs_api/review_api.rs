use std::fmt::Debug;

use log::*;
use serde::Serialize;

use crate::{
    db_types::{GameId, NewReview, Rating, Review},
    gs_api::{errors::ReviewError, rating_api::RatingApi},
    traits::{InventoryManagement, PageInfo, Pagination, ReviewDatabase, ReviewManagement},
};

#[derive(Debug, Clone, Serialize)]
pub struct GameReviews {
    pub rating: Rating,
    pub reviews: Vec<Review>,
    pub pagination: PageInfo,
}

/// The review write path. Every successful write is followed by a rating recompute; a failed recompute is logged and
/// does not undo or fail the write.
pub struct ReviewApi<B> {
    db: B,
    ratings: RatingApi<B>,
}

impl<B> Debug for ReviewApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReviewApi")
    }
}

impl<B> ReviewApi<B>
where B: ReviewDatabase
{
    pub fn new(db: B) -> Self {
        let ratings = RatingApi::new(db.clone());
        Self { db, ratings }
    }

    async fn ensure_game_exists(&self, game_id: GameId) -> Result<Rating, ReviewError> {
        let game = self.db.fetch_game(game_id).await?.ok_or(ReviewError::GameNotFound(game_id))?;
        Ok(Rating { avg: game.rating_avg, count: game.rating_count })
    }

    async fn refresh_rating(&self, game_id: GameId) {
        if let Err(e) = self.ratings.recompute(game_id).await {
            warn!("⭐️ Could not recompute the rating for game #{game_id}. It will be corrected on the next review. {e}");
        }
    }

    pub async fn add_review(&self, game_id: GameId, user_id: &str, review: NewReview) -> Result<Review, ReviewError> {
        let review = review.validated().map_err(ReviewError::ValidationError)?;
        self.ensure_game_exists(game_id).await?;
        let review = self.db.insert_review(game_id, user_id, review).await?;
        info!("⭐️ {user_id} rated game #{game_id} {}/5", review.rating);
        self.refresh_rating(game_id).await;
        Ok(review)
    }

    pub async fn delete_review(&self, game_id: GameId, user_id: &str) -> Result<(), ReviewError> {
        if !self.db.delete_review(game_id, user_id).await? {
            return Err(ReviewError::ReviewNotFound(game_id));
        }
        info!("⭐️ {user_id} deleted their review of game #{game_id}");
        self.refresh_rating(game_id).await;
        Ok(())
    }

    /// One page of reviews, newest first, along with the game's stored rating.
    pub async fn reviews_for_game(&self, game_id: GameId, pagination: Pagination) -> Result<GameReviews, ReviewError> {
        let rating = self.ensure_game_exists(game_id).await?;
        let (reviews, total) = self.db.fetch_reviews_for_game(game_id, pagination).await?;
        Ok(GameReviews { rating, reviews, pagination: PageInfo::new(pagination, total) })
    }
}
