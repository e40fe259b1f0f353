use chrono::Utc;
use gs_common::MinorUnits;
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{Game, GameId, NewGame, Rating};

pub async fn insert_game(game: NewGame, conn: &mut SqliteConnection) -> Result<Game, sqlx::Error> {
    let now = Utc::now();
    let game = sqlx::query_as(
        r#"
            INSERT INTO games (title, price, currency, stock, cover_image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *;
        "#,
    )
    .bind(game.title)
    .bind(game.price)
    .bind(game.currency)
    .bind(game.stock)
    .bind(game.cover_image)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(game)
}

pub async fn fetch_game(id: GameId, conn: &mut SqliteConnection) -> Result<Option<Game>, sqlx::Error> {
    let game = sqlx::query_as("SELECT * FROM games WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(game)
}

/// Fetches all the given games in one `WHERE id IN (...)` query.
pub async fn fetch_games(ids: &[GameId], conn: &mut SqliteConnection) -> Result<Vec<Game>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM games WHERE id IN (");
    let mut list = builder.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
    list.push_unseparated(")");
    trace!("🗃️ Executing query: {}", builder.sql());
    let games = builder.build_query_as::<Game>().fetch_all(conn).await?;
    Ok(games)
}

/// The single conditional decrement that guards stock. Returns the remaining stock, or `None` if the row did not
/// have `quantity` units available (or does not exist).
pub async fn decrement_stock(
    id: GameId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    let remaining: Option<(i64,)> = sqlx::query_as(
        "UPDATE games SET stock = stock - $1, updated_at = $2 WHERE id = $3 AND stock >= $1 RETURNING stock",
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(remaining.map(|(stock,)| stock))
}

pub async fn update_price(id: GameId, price: MinorUnits, conn: &mut SqliteConnection) -> Result<Option<Game>, sqlx::Error> {
    let game = sqlx::query_as("UPDATE games SET price = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(price)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(game)
}

/// Rewrites the game's rating aggregate from its reviews in a single statement, so the stored aggregate always
/// reflects the reviews as they were when the statement ran. Returns `None` if the game does not exist.
pub async fn recompute_rating(id: GameId, conn: &mut SqliteConnection) -> Result<Option<Rating>, sqlx::Error> {
    let rating: Option<(f64, i64)> = sqlx::query_as(
        r#"
            UPDATE games SET
                rating_avg = COALESCE((SELECT ROUND(AVG(rating), 1) FROM reviews WHERE game_id = $1), 0.0),
                rating_count = (SELECT COUNT(*) FROM reviews WHERE game_id = $1),
                updated_at = $2
            WHERE id = $1
            RETURNING rating_avg, rating_count
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;
    Ok(rating.map(|(avg, count)| Rating { avg, count }))
}
