use std::ops::Deref;

use actix_web::{
    body::{to_bytes, MessageBody},
    dev::ServiceResponse,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use chrono::{DateTime, Duration, Utc};
use game_store_engine::{
    db_types::{Game, NewGame, Role},
    SqliteDatabase,
};
use gs_common::MinorUnits;
use jsonwebtoken::{encode, EncodingKey, Header};
use log::debug;
use tempfile::TempDir;

use crate::{
    auth::{JwtClaims, TokenVerifier},
    config::AuthConfig,
    middleware::JwtMiddlewareFactory,
    server::extractor_configs,
};

// The HS256 secret test tokens are signed with. DO NOT re-use it anywhere.
pub const TEST_JWT_SECRET: &str = "c0ffee-test-secret-for-endpoint-tests";

pub fn issue_token_with_secret(secret: &str, sub: &str, role: Role, expiry: DateTime<Utc>) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let claims = JwtClaims { sub: sub.to_string(), role, exp: expiry.timestamp() as usize };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).expect("Failed to sign token")
}

pub fn issue_token(sub: &str, role: Role) -> String {
    issue_token_with_secret(TEST_JWT_SECRET, sub, role, Utc::now() + Duration::hours(1))
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

fn with_extractors(cfg: &mut ServiceConfig) {
    let (json, query, path) = extractor_configs();
    cfg.app_data(json).app_data(query).app_data(path);
}

async fn into_parts<B: MessageBody>(result: Result<ServiceResponse<B>, actix_web::Error>) -> (StatusCode, String) {
    match result {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = to_bytes(res.into_body()).await.unwrap_or_default();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}

/// Calls a route that sits behind the JWT middleware.
pub async fn call(req: TestRequest, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, String) {
    let verifier = TokenVerifier::new(&AuthConfig::new(TEST_JWT_SECRET));
    let app = App::new().wrap(JwtMiddlewareFactory::new(verifier)).configure(with_extractors).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making authenticated request");
    into_parts(test::try_call_service(&service, req.to_request()).await).await
}

/// Calls a public route.
pub async fn call_public(req: TestRequest, configure: impl FnOnce(&mut ServiceConfig)) -> (StatusCode, String) {
    let app = App::new().configure(with_extractors).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making public request");
    into_parts(test::try_call_service(&service, req.to_request()).await).await
}

pub fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {body}"))
}

/// A migrated database that lives, and dies, with its temporary directory.
pub struct TestDb {
    db: SqliteDatabase,
    _dir: TempDir,
}

impl Deref for TestDb {
    type Target = SqliteDatabase;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

pub async fn prepare_test_db() -> TestDb {
    let dir = tempfile::Builder::new().prefix("gss_endpoint_test_").tempdir().expect("Could not create a temp dir");
    let url = format!("sqlite://{}", dir.path().join("game_store.db").display());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Could not open test database");
    db.migrate().await.expect("Could not migrate test database");
    TestDb { db, _dir: dir }
}

pub async fn seed_game(db: &SqliteDatabase, title: &str, price: i64, stock: i64) -> Game {
    db.insert_game(NewGame::new(title, MinorUnits::from(price), stock)).await.expect("Could not seed game")
}
