//! # Game store server
//! This crate hosts the HTTP server for the game store. It is responsible for:
//! * Turning authenticated customers' carts into orders and payment requests.
//! * Receiving payment provider notifications and handing them to the engine, which verifies them and moves orders
//!   through their payment states.
//! * Serving order history, admin order management and game reviews.
//!
//! All business rules live in `game_store_engine`; this crate only maps HTTP onto the engine's APIs.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following public routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhooks/payments`: Payment provider notifications.
//! * `/payments/key`: The payment provider's publishable key.
//! * `/games/{id}/reviews`: Reviews and rating for a game.
//!
//! Everything under `/api` requires a bearer token. See [routes](routes/index.html) for the details.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
