use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use game_store_engine::{db_types::Role, ReviewApi, SqliteDatabase};
use serde_json::json;

use super::helpers::{bearer, call, call_public, issue_token, json, prepare_test_db, seed_game};
use crate::routes::{AddReviewRoute, DeleteReviewRoute, GameReviewsRoute};

fn reviews_app(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(GameReviewsRoute::<SqliteDatabase>::new())
            .service(AddReviewRoute::<SqliteDatabase>::new())
            .service(DeleteReviewRoute::<SqliteDatabase>::new())
            .app_data(web::Data::new(ReviewApi::new(db)));
    }
}

#[actix_web::test]
async fn review_lifecycle() {
    let _ = env_logger::try_init().ok();
    let db = prepare_test_db().await;
    let game = seed_game(&db, "Celeste", 1999, 10).await;
    let uri = format!("/games/{}/reviews", game.id);
    let alice = issue_token("alice", Role::User);
    let bob = issue_token("bob", Role::User);

    let req = TestRequest::post().uri(&uri).insert_header(bearer(&alice)).set_json(json!({"rating": 4, "comment": " Tough "}));
    let (status, body) = call(req, reviews_app(db.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let review = json(&body);
    assert_eq!(review["rating"], 4);
    assert_eq!(review["comment"], "Tough");
    assert_eq!(review["userId"], "alice");

    let req = TestRequest::post().uri(&uri).insert_header(bearer(&alice)).set_json(json!({"rating": 2}));
    let (status, body) = call(req, reviews_app(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("already reviewed"), "{body}");

    let req = TestRequest::post().uri(&uri).insert_header(bearer(&bob)).set_json(json!({"rating": 5}));
    let (status, _) = call(req, reviews_app(db.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let req = TestRequest::get().uri(&uri);
    let (status, body) = call_public(req, reviews_app(db.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let page = json(&body);
    assert_eq!(page["rating"], json!({"avg": 4.5, "count": 2}));
    assert_eq!(page["reviews"].as_array().unwrap().len(), 2);
    assert_eq!(page["pagination"]["total"], 2);

    let req = TestRequest::delete().uri(&uri).insert_header(bearer(&bob));
    let (status, body) = call(req, reviews_app(db.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["success"], true);

    let req = TestRequest::delete().uri(&uri).insert_header(bearer(&bob));
    let (status, body) = call(req, reviews_app(db.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body), json!({"error": format!("You have not reviewed game {}", game.id)}));

    let req = TestRequest::get().uri(&uri);
    let (_, body) = call_public(req, reviews_app(db.clone())).await;
    assert_eq!(json(&body)["rating"], json!({"avg": 4.0, "count": 1}));
}

#[actix_web::test]
async fn invalid_reviews() {
    let _ = env_logger::try_init().ok();
    let db = prepare_test_db().await;
    let game = seed_game(&db, "Hollow Knight", 1499, 10).await;
    let uri = format!("/games/{}/reviews", game.id);
    let token = issue_token("alice", Role::User);

    let req = TestRequest::post().uri(&uri).insert_header(bearer(&token)).set_json(json!({"rating": 7}));
    let (status, body) = call(req, reviews_app(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body), json!({"error": "Invalid review: Rating must be between 1 and 5, got 7"}));

    let req = TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&token))
        .set_json(json!({"rating": 3, "comment": "x".repeat(501)}));
    let (status, _) = call(req, reviews_app(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri("/games/9999/reviews").insert_header(bearer(&token)).set_json(json!({"rating": 3}));
    let (status, body) = call(req, reviews_app(db.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body), json!({"error": "Game 9999 does not exist"}));

    let req = TestRequest::get().uri("/games/abc/reviews");
    let (status, body) = call_public(req, reviews_app(db.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Invalid path"), "{body}");

    let req = TestRequest::get().uri(&uri);
    let (_, body) = call_public(req, reviews_app(db.clone())).await;
    assert_eq!(json(&body)["rating"], json!({"avg": 0.0, "count": 0}));
}
