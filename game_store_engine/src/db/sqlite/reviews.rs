use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db_types::{GameId, NewReview, Review},
    traits::Pagination,
};

pub async fn insert_review(
    game_id: GameId,
    user_id: &str,
    review: NewReview,
    conn: &mut SqliteConnection,
) -> Result<Review, sqlx::Error> {
    let now = Utc::now();
    let review = sqlx::query_as(
        r#"
            INSERT INTO reviews (game_id, user_id, rating, comment, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *;
        "#,
    )
    .bind(game_id)
    .bind(user_id)
    .bind(review.rating)
    .bind(review.comment)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(review)
}

pub async fn delete_review(game_id: GameId, user_id: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reviews WHERE game_id = $1 AND user_id = $2")
        .bind(game_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_reviews_for_game(
    game_id: GameId,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Review>, i64), sqlx::Error> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE game_id = $1")
        .bind(game_id)
        .fetch_one(&mut *conn)
        .await?;
    let reviews = sqlx::query_as(
        "SELECT * FROM reviews WHERE game_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
    )
    .bind(game_id)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&mut *conn)
    .await?;
    Ok((reviews, total))
}
