pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub webhook: Arc<dyn services::webhook_client::WebhookBackend>,
    pub token_decoder: Arc<auth::token::TokenDecoder>,
}
