pub mod webhook_client;

pub use webhook_client::{
    CreateUserRequest, HttpWebhookClient, VerifiedLogin, WebhookBackend, WebhookError,
};
