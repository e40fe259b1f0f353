use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{GameId, Rating},
    traits::{ReviewManagement, StoreError},
};

/// Keeps a game's `rating_avg` / `rating_count` in line with its reviews. The review write path calls
/// [`RatingApi::recompute`] after every insert or delete.
pub struct RatingApi<B> {
    db: B,
}

impl<B> Debug for RatingApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RatingApi")
    }
}

impl<B> RatingApi<B>
where B: ReviewManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Recalculates the rating aggregate from every review of the game and stores it.
    pub async fn recompute(&self, game_id: GameId) -> Result<Rating, StoreError> {
        let rating = self.db.recompute_game_rating(game_id).await?;
        debug!("⭐️ Game #{game_id} rating is now {:.1} from {} reviews", rating.avg, rating.count);
        Ok(rating)
    }
}
